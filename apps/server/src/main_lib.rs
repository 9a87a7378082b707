use std::sync::Arc;

use tokio::sync::broadcast;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use nestfund_core::events::DomainEvent;
use nestfund_core::goals::{GoalService, GoalServiceTrait};
use nestfund_core::progress::{EtaConfig, ProgressService, ProgressServiceTrait};
use nestfund_storage_sqlite::goals::GoalRepository;
use nestfund_storage_sqlite::ledger::LedgerRepository;
use nestfund_storage_sqlite::{create_pool, init, run_migrations, spawn_writer};

use crate::config::Config;
use crate::events::{start_notification_bridge, ServerDomainEventSink};

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct AppState {
    pub goal_service: Arc<dyn GoalServiceTrait + Send + Sync>,
    pub progress_service: Arc<dyn ProgressServiceTrait + Send + Sync>,
    /// Fan-out channel behind the domain event sink; the SSE endpoint
    /// subscribes here.
    pub event_tx: broadcast::Sender<DomainEvent>,
}

pub fn init_tracing() {
    let log_format = std::env::var("NESTFUND_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = create_pool(&db_path)?;
    run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());

    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let event_sink = Arc::new(ServerDomainEventSink::new(event_tx.clone()));
    start_notification_bridge(event_tx.subscribe());

    let goal_repository = Arc::new(GoalRepository::new(pool.clone(), writer.clone()));
    let ledger_repository = Arc::new(LedgerRepository::new(pool, writer));

    let goal_service = Arc::new(GoalService::new(goal_repository.clone(), event_sink.clone()));
    let progress_service = Arc::new(ProgressService::with_eta_config(
        ledger_repository,
        goal_repository,
        event_sink,
        EtaConfig {
            window_days: config.eta_window_days,
        },
    ));

    Ok(Arc::new(AppState {
        goal_service,
        progress_service,
        event_tx,
    }))
}
