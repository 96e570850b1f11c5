//! WebSocket module for live chat and feed updates
//!
//! Clients connect to `/ws`, receive a `connected` frame carrying their
//! connection id, then send `{"event": ..., "data": ...}` frames:
//! `join_conversation`, `leave_conversation`, `new_message`, `new_post`,
//! `new_like`, `new_comment` and `ping`.

pub mod handler;
pub mod state;

pub use handler::ws_handler;
pub use state::AppState;
