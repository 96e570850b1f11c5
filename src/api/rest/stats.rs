use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use super::ApiResponse;
use crate::api::websocket::state::AppState;

/// GET /api/stats - Relay counters
pub async fn get_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.registry.stats())
}

/// Response for GET /api/rooms/:room
#[derive(Debug, Serialize)]
pub struct RoomInfo {
    pub room: String,
    pub members: usize,
}

/// GET /api/rooms/:room - Member count of one room (0 when it does not exist)
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> impl IntoResponse {
    let members = state.registry.room_size(&room);
    Json(ApiResponse::new(
        RoomInfo { room, members },
        state.registry.current_sequence_id(),
    ))
}
