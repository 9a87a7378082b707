use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::main_lib::AppState;

mod events;
mod goals;
mod health;

pub fn app_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(goals::router())
        .merge(events::router())
        .merge(health::router());

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}
