//! SSE subscription handler

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use serde::Deserialize;
use tracing::info;

use crate::api::websocket::state::AppState;
use crate::relay::RoomRegistry;
use crate::types::{ConnectionId, ControlFrame};

/// Query parameters for SSE subscription
#[derive(Debug, Default, Deserialize)]
pub struct SseParams {
    /// Comma-separated rooms to join, e.g. `conv-1,conv-2`
    #[serde(default)]
    pub rooms: Option<String>,
}

impl SseParams {
    pub fn room_list(&self) -> Vec<&str> {
        self.rooms
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|room| !room.is_empty())
            .collect()
    }
}

/// Removes the subscriber from the registry when the stream is dropped
struct Subscription {
    registry: Arc<RoomRegistry>,
    connection_id: ConnectionId,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.disconnect(&self.connection_id);
        info!(connection = %self.connection_id, "sse subscriber disconnected");
    }
}

/// GET /events - Stream relay events as SSE
pub async fn sse_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SseParams>,
) -> impl IntoResponse {
    let registry = Arc::clone(&state.registry);
    let (connection_id, mut rx) = registry.register();

    for room in params.room_list() {
        registry.join(&connection_id, room);
    }

    let welcome = ControlFrame::Connected {
        connection_id: connection_id.clone(),
        current_sequence_id: registry.current_sequence_id(),
    };
    let subscription = Subscription {
        registry,
        connection_id,
    };

    let stream = async_stream::stream! {
        let _subscription = subscription;

        yield Ok::<_, Infallible>(Event::default()
            .event("connected")
            .data(serde_json::to_string(&welcome).unwrap_or_default()));

        while let Some(envelope) = rx.recv().await {
            yield Ok(Event::default()
                .event(envelope.event.name())
                .data(serde_json::to_string(envelope.as_ref()).unwrap_or_default()));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default().interval(Duration::from_secs(30)))
}
