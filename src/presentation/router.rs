// Route table for the dashboard server
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{dashboard, health_check, index, list_alerts, push_channel};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    // Compression only wraps the page and JSON routes, not the WebSocket upgrade
    Router::new()
        .route("/", get(index))
        .route("/dashboard", get(dashboard))
        .route("/api/alerts", get(list_alerts))
        .route("/healthz", get(health_check))
        .layer(CompressionLayer::new())
        .route("/ws", get(push_channel))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
