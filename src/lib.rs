//! Tribe Relay
//!
//! A room-based real-time relay for a social feed and direct messaging.
//! CRUD handlers publish events after their database write commits; the
//! relay fans them out to connected browser clients.
//!
//! # Delivery model
//!
//! - **Rooms**: chat messages go to every member of the conversation room,
//!   sender included
//! - **Global**: posts, likes and comments go to every connection except the
//!   one that triggered them
//! - **Best effort**: no replay, no acknowledgements; a client that misses an
//!   event re-fetches through the CRUD APIs
//!
//! # Modules
//!
//! - `types`: Connection ids, events and envelopes
//! - `relay`: Room registry and event routing
//! - `notify`: Fire-and-forget publishers for CRUD handlers
//! - `api`: WebSocket, SSE and REST endpoints
//! - `config`: Environment configuration
//! - `server`: Process lifecycle
//!
//! # Example
//!
//! ```no_run
//! use tribe_relay::{server, RelayConfig, RelayResult};
//!
//! #[tokio::main]
//! async fn main() -> RelayResult<()> {
//!     let config = RelayConfig::from_env()?;
//!     server::run(config).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod relay;
pub mod server;
pub mod types;

// Re-export commonly used items at crate root
pub use config::{ClientOrigin, RelayConfig};
pub use error::{RelayError, RelayResult};
pub use notify::{HttpNotifier, LocalNotifier, NoopNotifier, Notifier};
pub use relay::RoomRegistry;
pub use types::{ConnectionId, Envelope, PublishedEvent, RelayEvent, RoomId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
