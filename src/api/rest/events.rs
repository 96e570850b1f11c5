//! Publish endpoint for CRUD handlers running in another process

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::debug;

use crate::api::websocket::state::AppState;
use crate::error::{RelayError, RelayResult};
use crate::relay;
use crate::types::{PublishRequest, PublishResponse};

/// POST /api/events - Relay an event to connected clients
///
/// Responds `202 Accepted` once the event has been queued; delivery itself
/// is best effort. Unreadable bodies, unknown and socket-only events are
/// rejected with 400.
pub async fn publish_event(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PublishRequest>, JsonRejection>,
) -> RelayResult<impl IntoResponse> {
    let Json(request) = payload.map_err(|e| RelayError::InvalidBody(e.body_text()))?;
    let (event, origin) = request.into_event()?;
    let name = event.name();
    let delivered = relay::publish(&state.registry, event, origin.as_ref());

    debug!(event = name, delivered, "published over http");
    Ok((StatusCode::ACCEPTED, Json(PublishResponse { delivered })))
}
