//! WebSocket connection handler

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::state::AppState;
use crate::relay::{self, RoomRegistry};
use crate::types::{ClientEvent, ConnectionId, ControlFrame};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let registry = Arc::clone(&state.registry);
    let (connection_id, mut rx) = registry.register();

    let welcome = ControlFrame::Connected {
        connection_id: connection_id.clone(),
        current_sequence_id: registry.current_sequence_id(),
    };
    if send_json(&mut socket, &welcome).await.is_err() {
        registry.disconnect(&connection_id);
        return; // Client disconnected immediately
    }

    loop {
        tokio::select! {
            // Relay events to client
            envelope = rx.recv() => {
                match envelope {
                    Some(envelope) => {
                        if send_json(&mut socket, envelope.as_ref()).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // Handle client messages
            result = socket.recv() => {
                match result {
                    Some(Ok(msg)) => {
                        if !handle_client_message(msg, &mut socket, &registry, &connection_id).await {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(connection = %connection_id, error = %e, "websocket error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    registry.disconnect(&connection_id);
    info!(connection = %connection_id, "client disconnected");
}

/// Handle a message from the client
/// Returns false if the connection should be closed
async fn handle_client_message(
    msg: Message,
    socket: &mut WebSocket,
    registry: &RoomRegistry,
    connection_id: &ConnectionId,
) -> bool {
    match msg {
        Message::Text(text) => {
            match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    if let Some(reply) = relay::handle_client_event(registry, connection_id, event)
                    {
                        return send_json(socket, &reply).await.is_ok();
                    }
                }
                Err(e) => {
                    debug!(connection = %connection_id, error = %e, "undecodable client frame dropped");
                }
            }
            true
        }
        Message::Binary(_) => true,
        Message::Ping(data) => socket.send(Message::Pong(data)).await.is_ok(),
        Message::Pong(_) => true,
        Message::Close(_) => false,
    }
}

async fn send_json<T: Serialize>(socket: &mut WebSocket, frame: &T) -> Result<(), axum::Error> {
    match serde_json::to_string(frame) {
        Ok(json) => socket.send(Message::Text(json)).await,
        Err(e) => {
            warn!(error = %e, "failed to encode frame");
            Ok(())
        }
    }
}
