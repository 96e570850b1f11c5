//! Data types for the relay
//!
//! Everything here is transient: connections, rooms and events live only in
//! memory and are lost on restart.

mod connection;
mod event;
mod stats;

pub use connection::{ConnectionId, RoomId};
pub use event::{
    ClientEvent, ControlFrame, Envelope, NewMessage, PublishRequest, PublishedEvent, RelayEvent,
};
pub use stats::{PublishResponse, RelayStats};
