//! REST API module for HTTP endpoints
//!
//! - `POST /api/events` - Publish an event after a database write
//! - `GET /api/stats` - Relay counters
//! - `GET /api/rooms/:room` - Member count of one room

pub mod events;
pub mod stats;

use serde::Serialize;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Current sequence ID, lets clients compare against received frames
    pub sequence_id: u64,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, sequence_id: u64) -> Self {
        Self { data, sequence_id }
    }
}
