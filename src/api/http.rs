//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::rest::{events, stats};
use super::sse::sse_handler;
use super::websocket::{handler::ws_handler, state::AppState};
use crate::config::ClientOrigin;

/// CORS policy for browser clients of the given origin
pub fn cors_layer(origin: &ClientOrigin) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    match origin {
        ClientOrigin::Any => cors.allow_origin(Any),
        ClientOrigin::Exact(value) => cors.allow_origin(value.clone()),
    }
}

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        // Live transports
        .route("/ws", get(ws_handler))
        .route("/events", get(sse_handler))
        // Health check
        .route("/health", get(health_check))
        // REST API endpoints
        .route("/api/events", post(events::publish_event))
        .route("/api/stats", get(stats::get_stats))
        .route("/api/rooms/:room", get(stats::get_room))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
