//! Shared application state for HTTP, WebSocket and SSE handlers

use std::sync::Arc;

use crate::relay::RoomRegistry;

pub struct AppState {
    /// Room membership and fan-out
    pub registry: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }
}
