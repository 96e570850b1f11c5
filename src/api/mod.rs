//! API module for HTTP, WebSocket and SSE endpoints
//!
//! Browser clients use the WebSocket (or SSE) endpoints; CRUD handlers in
//! other processes publish through the REST endpoint.

pub mod http;
pub mod rest;
pub mod sse;
pub mod websocket;

pub use http::{cors_layer, create_router};
pub use websocket::AppState;
