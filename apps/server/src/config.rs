//! Server configuration from environment variables (with `.env` support).

use nestfund_core::constants::DEFAULT_ETA_WINDOW_DAYS;

pub struct Config {
    pub listen_addr: String,
    pub db_path: String,
    pub eta_window_days: i64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let listen_addr = std::env::var("NESTFUND_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let db_path = std::env::var("NESTFUND_DB_PATH")
            .unwrap_or_else(|_| "data/nestfund.db".to_string());
        let eta_window_days = std::env::var("NESTFUND_ETA_WINDOW_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_ETA_WINDOW_DAYS);
        Self {
            listen_addr,
            db_path,
            eta_window_days,
        }
    }
}
