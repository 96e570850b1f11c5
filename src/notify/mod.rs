//! Best-effort event publishing for CRUD handlers
//!
//! A handler calls a [`Notifier`] after its database write has committed.
//! The contract is deliberately weak: `notify` may silently do nothing, it
//! never blocks on the network and it never reports an error. The write is
//! already durable; a missed live update is recovered on the next fetch.

mod http;

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::relay::{self, RoomRegistry};
use crate::types::{ConnectionId, NewMessage, PublishedEvent};

pub use http::HttpNotifier;

/// Fire-and-forget publisher of relay events
pub trait Notifier: Send + Sync {
    /// Publish an event. May silently no-op.
    fn notify(&self, event: PublishedEvent, origin: Option<ConnectionId>);

    /// A chat message was stored in `conversation_id`
    fn new_message(&self, conversation_id: &str, message: Value) {
        self.notify(
            PublishedEvent::NewMessage(NewMessage {
                message,
                conversation_id: conversation_id.to_string(),
            }),
            None,
        );
    }

    /// A post was created by the user behind `origin`
    fn new_post(&self, post: Value, origin: Option<ConnectionId>) {
        self.notify(PublishedEvent::NewPost(post), origin);
    }

    /// A post was liked or unliked
    fn new_like(&self, post_id: &str, origin: Option<ConnectionId>) {
        self.notify(PublishedEvent::NewLike(json!({ "postId": post_id })), origin);
    }

    fn new_comment(&self, comment: Value, origin: Option<ConnectionId>) {
        self.notify(PublishedEvent::NewComment(comment), origin);
    }
}

/// Publishes straight into a registry living in the same process
#[derive(Clone)]
pub struct LocalNotifier {
    registry: Arc<RoomRegistry>,
}

impl LocalNotifier {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }
}

impl Notifier for LocalNotifier {
    fn notify(&self, event: PublishedEvent, origin: Option<ConnectionId>) {
        let name = event.name();
        let delivered = relay::publish(&self.registry, event, origin.as_ref());
        debug!(event = name, delivered, "local notify");
    }
}

/// Notifier used when real-time delivery is disabled
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, event: PublishedEvent, _origin: Option<ConnectionId>) {
        debug!(event = event.name(), "relay disabled, event discarded");
    }
}
