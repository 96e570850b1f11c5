//! Room-based fan-out of relay events
//!
//! - `registry`: owned connection and room membership table
//! - `dispatch`: maps inbound events to room or global broadcasts

pub mod dispatch;
pub mod registry;

pub use dispatch::{handle_client_event, publish};
pub use registry::{EnvelopeReceiver, RoomRegistry};
