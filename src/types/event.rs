//! Event types flowing through the relay
//!
//! Inbound events arrive from browser sockets or from publishers
//! (`POST /api/events`). Outbound events are wrapped in an [`Envelope`] and
//! pushed to subscribers. Payloads are opaque JSON and are never validated;
//! only the routing key of `new_message` is inspected.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::connection::{ConnectionId, RoomId};
use crate::error::{RelayError, RelayResult};

/// Events delivered to subscribers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RelayEvent {
    /// A chat message, delivered to members of its conversation room
    MessageReceived(Value),

    /// A new post, delivered to everyone except the author
    PostReceived(Value),

    /// A post was liked, payload is `{ "postId": ... }`
    LikeReceived(Value),

    /// A new comment on a post
    CommentReceived(Value),
}

impl RelayEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Self::MessageReceived(_) => "message_received",
            Self::PostReceived(_) => "post_received",
            Self::LikeReceived(_) => "like_received",
            Self::CommentReceived(_) => "comment_received",
        }
    }

    pub fn payload(&self) -> &Value {
        match self {
            Self::MessageReceived(data)
            | Self::PostReceived(data)
            | Self::LikeReceived(data)
            | Self::CommentReceived(data) => data,
        }
    }
}

/// Outbound frame with delivery metadata
#[derive(Clone, Debug, Serialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub event: RelayEvent,

    /// Monotonically increasing across the whole relay
    pub sequence_id: u64,

    /// Unix timestamp when the event was broadcast
    pub timestamp: i64,
}

/// Control frames written directly by a connection task
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ControlFrame {
    /// First frame on every connection
    Connected {
        connection_id: ConnectionId,
        current_sequence_id: u64,
    },

    /// Reply to a client `ping`
    Pong,
}

/// Payload of `new_message`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub message: Value,
    #[serde(rename = "conversationId")]
    pub conversation_id: RoomId,
}

/// Events sent by a browser socket
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinConversation(RoomId),
    LeaveConversation(RoomId),
    NewMessage(NewMessage),
    NewPost(Value),
    NewLike(Value),
    NewComment(Value),
    Ping,
}

impl ClientEvent {
    pub const NAMES: [&'static str; 7] = [
        "join_conversation",
        "leave_conversation",
        "new_message",
        "new_post",
        "new_like",
        "new_comment",
        "ping",
    ];

    pub fn is_known(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }
}

/// Events a publisher may push into the relay after a database write
#[derive(Clone, Debug, PartialEq)]
pub enum PublishedEvent {
    NewMessage(NewMessage),
    NewPost(Value),
    NewLike(Value),
    NewComment(Value),
}

impl PublishedEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewMessage(_) => "new_message",
            Self::NewPost(_) => "new_post",
            Self::NewLike(_) => "new_like",
            Self::NewComment(_) => "new_comment",
        }
    }

    /// Split into the wire name and its `data` payload
    pub fn into_parts(self) -> (&'static str, Value) {
        let name = self.name();
        let data = match self {
            Self::NewMessage(NewMessage {
                message,
                conversation_id,
            }) => json!({ "message": message, "conversationId": conversation_id }),
            Self::NewPost(data) | Self::NewLike(data) | Self::NewComment(data) => data,
        };
        (name, data)
    }
}

impl TryFrom<ClientEvent> for PublishedEvent {
    type Error = RelayError;

    fn try_from(event: ClientEvent) -> Result<Self, Self::Error> {
        match event {
            ClientEvent::NewMessage(message) => Ok(Self::NewMessage(message)),
            ClientEvent::NewPost(post) => Ok(Self::NewPost(post)),
            ClientEvent::NewLike(like) => Ok(Self::NewLike(like)),
            ClientEvent::NewComment(comment) => Ok(Self::NewComment(comment)),
            ClientEvent::JoinConversation(_) => Err(RelayError::SocketOnly("join_conversation")),
            ClientEvent::LeaveConversation(_) => Err(RelayError::SocketOnly("leave_conversation")),
            ClientEvent::Ping => Err(RelayError::SocketOnly("ping")),
        }
    }
}

/// Body of `POST /api/events`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublishRequest {
    pub event: String,

    #[serde(default)]
    pub data: Value,

    /// Connection that triggered the write; excluded from global broadcasts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<ConnectionId>,
}

impl PublishRequest {
    pub fn new(event: PublishedEvent, origin: Option<ConnectionId>) -> Self {
        let (name, data) = event.into_parts();
        Self {
            event: name.to_string(),
            data,
            origin,
        }
    }

    /// Decode into a routable event
    pub fn into_event(self) -> RelayResult<(PublishedEvent, Option<ConnectionId>)> {
        let Self {
            event: name,
            data,
            origin,
        } = self;

        if !ClientEvent::is_known(&name) {
            return Err(RelayError::UnknownEvent(name));
        }

        let client_event: ClientEvent = serde_json::from_value(json!({
            "event": name,
            "data": data,
        }))
        .map_err(|e| RelayError::MalformedEvent {
            event: name.clone(),
            reason: e.to_string(),
        })?;

        Ok((PublishedEvent::try_from(client_event)?, origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_serialization() {
        let envelope = Envelope {
            event: RelayEvent::LikeReceived(json!({ "postId": "p1" })),
            sequence_id: 7,
            timestamp: 1234567890,
        };

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["event"], "like_received");
        assert_eq!(value["data"]["postId"], "p1");
        assert_eq!(value["sequence_id"], 7);
        assert_eq!(value["timestamp"], 1234567890);
    }

    #[test]
    fn test_control_frame_serialization() {
        let frame = ControlFrame::Connected {
            connection_id: ConnectionId::from("conn_1"),
            current_sequence_id: 3,
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["event"], "connected");
        assert_eq!(value["connection_id"], "conn_1");

        let pong = serde_json::to_value(&ControlFrame::Pong).unwrap();
        assert_eq!(pong, json!({ "event": "pong" }));
    }

    #[test]
    fn test_client_event_parsing() {
        let join: ClientEvent =
            serde_json::from_str(r#"{"event":"join_conversation","data":"conv-1"}"#).unwrap();
        assert_eq!(join, ClientEvent::JoinConversation("conv-1".to_string()));

        let ping: ClientEvent = serde_json::from_str(r#"{"event":"ping"}"#).unwrap();
        assert_eq!(ping, ClientEvent::Ping);

        let message: ClientEvent = serde_json::from_str(
            r#"{"event":"new_message","data":{"message":{"body":"hi"},"conversationId":"conv-1"}}"#,
        )
        .unwrap();
        assert!(matches!(
            message,
            ClientEvent::NewMessage(NewMessage { ref conversation_id, .. }) if conversation_id == "conv-1"
        ));
    }

    #[test]
    fn test_new_message_requires_conversation_id() {
        let result = serde_json::from_str::<ClientEvent>(
            r#"{"event":"new_message","data":{"message":{"body":"hi"}}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_publish_request_unknown_event() {
        let request = PublishRequest {
            event: "new_story".to_string(),
            data: Value::Null,
            origin: None,
        };
        assert!(matches!(
            request.into_event(),
            Err(RelayError::UnknownEvent(name)) if name == "new_story"
        ));
    }

    #[test]
    fn test_publish_request_rejects_socket_only_events() {
        let request = PublishRequest {
            event: "join_conversation".to_string(),
            data: json!("conv-1"),
            origin: None,
        };
        assert!(matches!(
            request.into_event(),
            Err(RelayError::SocketOnly("join_conversation"))
        ));
    }

    #[test]
    fn test_publish_request_keeps_origin_and_payload() {
        let request = PublishRequest::new(
            PublishedEvent::NewMessage(NewMessage {
                message: json!({ "body": "hi" }),
                conversation_id: "conv-1".to_string(),
            }),
            Some(ConnectionId::from("conn_a")),
        );
        assert_eq!(request.event, "new_message");
        assert_eq!(request.data["conversationId"], "conv-1");

        let (event, origin) = request.into_event().unwrap();
        assert_eq!(origin, Some(ConnectionId::from("conn_a")));
        assert!(matches!(event, PublishedEvent::NewMessage(_)));
    }

    #[test]
    fn test_malformed_payload_is_forwarded_as_is() {
        let request = PublishRequest {
            event: "new_post".to_string(),
            data: json!(["not", "an", "object"]),
            origin: None,
        };
        let (event, _) = request.into_event().unwrap();
        assert_eq!(event, PublishedEvent::NewPost(json!(["not", "an", "object"])));
    }
}
