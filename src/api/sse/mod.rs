//! SSE (Server-Sent Events) transport
//!
//! Read-only alternative to the WebSocket for clients that only consume
//! events. `GET /events?rooms=conv-1,conv-2` joins the listed rooms and
//! streams every envelope as an SSE event named after the relay event.

pub mod handler;

pub use handler::sse_handler;
