//! Routing of inbound events onto the registry

use tracing::debug;

use super::registry::RoomRegistry;
use crate::types::{ClientEvent, ConnectionId, ControlFrame, NewMessage, PublishedEvent, RelayEvent};

/// Route a published event to its audience.
///
/// Chat messages go to the conversation room, sender included. Posts, likes
/// and comments go to everyone except `origin`. Returns the delivery count.
pub fn publish(
    registry: &RoomRegistry,
    event: PublishedEvent,
    origin: Option<&ConnectionId>,
) -> usize {
    match event {
        PublishedEvent::NewMessage(NewMessage {
            message,
            conversation_id,
        }) => registry.broadcast(&conversation_id, RelayEvent::MessageReceived(message)),
        PublishedEvent::NewPost(post) => {
            registry.broadcast_global(RelayEvent::PostReceived(post), origin)
        }
        PublishedEvent::NewLike(like) => {
            registry.broadcast_global(RelayEvent::LikeReceived(like), origin)
        }
        PublishedEvent::NewComment(comment) => {
            registry.broadcast_global(RelayEvent::CommentReceived(comment), origin)
        }
    }
}

/// Apply an event received from a socket.
///
/// Returns a control frame to write back to that socket, if any.
pub fn handle_client_event(
    registry: &RoomRegistry,
    connection: &ConnectionId,
    event: ClientEvent,
) -> Option<ControlFrame> {
    match event {
        ClientEvent::JoinConversation(room) => {
            registry.join(connection, &room);
            None
        }
        ClientEvent::LeaveConversation(room) => {
            registry.leave(connection, &room);
            None
        }
        ClientEvent::Ping => Some(ControlFrame::Pong),
        ClientEvent::NewMessage(message) => {
            publish(registry, PublishedEvent::NewMessage(message), Some(connection));
            None
        }
        ClientEvent::NewPost(post) => {
            publish(registry, PublishedEvent::NewPost(post), Some(connection));
            None
        }
        ClientEvent::NewLike(like) => {
            publish(registry, PublishedEvent::NewLike(like), Some(connection));
            None
        }
        ClientEvent::NewComment(comment) => {
            debug!(connection = %connection, "comment relayed from socket");
            publish(registry, PublishedEvent::NewComment(comment), Some(connection));
            None
        }
    }
}
