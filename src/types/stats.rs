use serde::{Deserialize, Serialize};

/// Point-in-time counters of the relay
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayStats {
    /// Live connections
    pub connections: usize,

    /// Rooms with at least one member
    pub rooms: usize,

    /// Frames queued for delivery since start
    pub events_sent: u64,

    /// Frames dropped because a connection's queue was full
    pub events_dropped: u64,

    pub current_sequence_id: u64,
}

/// Response of `POST /api/events`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublishResponse {
    pub delivered: usize,
}
