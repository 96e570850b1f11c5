//! Room membership registry
//!
//! The registry owns every live connection's outbound queue and the
//! room → members table. Callers only ever see `register`, `join`, `leave`,
//! `disconnect` and the two broadcast operations; the table itself never
//! leaves this module.
//!
//! Broadcasts hold the write lock while enqueueing so that two sequential
//! broadcasts reach every member in call order. Enqueueing uses `try_send`,
//! so the lock is never held across an await point.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::types::{ConnectionId, Envelope, RelayEvent, RelayStats, RoomId};

/// Receiving half of a connection's outbound queue
pub type EnvelopeReceiver = mpsc::Receiver<Arc<Envelope>>;

struct Member {
    sender: mpsc::Sender<Arc<Envelope>>,
    rooms: HashSet<RoomId>,
}

#[derive(Default)]
struct Membership {
    connections: HashMap<ConnectionId, Member>,
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
}

pub struct RoomRegistry {
    membership: RwLock<Membership>,
    queue_capacity: usize,
    sequence_counter: AtomicU64,
    events_sent: AtomicU64,
    events_dropped: AtomicU64,
}

impl RoomRegistry {
    /// Create an empty registry. `queue_capacity` must be non-zero.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            membership: RwLock::new(Membership::default()),
            queue_capacity: queue_capacity.max(1),
            sequence_counter: AtomicU64::new(0),
            events_sent: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
        }
    }

    /// Register a new connection with no rooms joined
    pub fn register(&self) -> (ConnectionId, EnvelopeReceiver) {
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        let id = ConnectionId::generate();

        self.membership.write().connections.insert(
            id.clone(),
            Member {
                sender,
                rooms: HashSet::new(),
            },
        );

        info!(connection = %id, "connection registered");
        (id, receiver)
    }

    /// Add a connection to a room.
    ///
    /// Returns `false` if the connection was already a member, is not
    /// registered, or `room` is blank. Membership is not authorized here.
    pub fn join(&self, connection: &ConnectionId, room: &str) -> bool {
        if room.trim().is_empty() {
            debug!(connection = %connection, "join with blank room name ignored");
            return false;
        }

        let mut guard = self.membership.write();
        let membership = &mut *guard;

        let Some(member) = membership.connections.get_mut(connection) else {
            debug!(connection = %connection, room, "join from unknown connection ignored");
            return false;
        };

        if !member.rooms.insert(room.to_string()) {
            return false;
        }

        membership
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(connection.clone());

        info!(connection = %connection, room, "joined room");
        true
    }

    /// Remove a connection from one room. Returns `false` if it was not a member.
    pub fn leave(&self, connection: &ConnectionId, room: &str) -> bool {
        let mut guard = self.membership.write();
        let membership = &mut *guard;

        let removed = membership
            .connections
            .get_mut(connection)
            .map(|member| member.rooms.remove(room))
            .unwrap_or(false);

        if removed {
            remove_from_room(&mut membership.rooms, room, connection);
            info!(connection = %connection, room, "left room");
        }
        removed
    }

    /// Drop a connection and its memberships. Safe to call more than once.
    pub fn disconnect(&self, connection: &ConnectionId) {
        let mut guard = self.membership.write();
        let membership = &mut *guard;

        let Some(member) = membership.connections.remove(connection) else {
            return;
        };

        for room in &member.rooms {
            remove_from_room(&mut membership.rooms, room, connection);
        }

        info!(
            connection = %connection,
            rooms = member.rooms.len(),
            "connection removed"
        );
    }

    /// Drop every connection and room.
    ///
    /// Releases all outbound queues, so every connection task and SSE stream
    /// sees its receiver close and finishes. Returns the number dropped.
    pub fn disconnect_all(&self) -> usize {
        let mut membership = self.membership.write();
        let dropped = membership.connections.len();
        membership.connections.clear();
        membership.rooms.clear();

        info!(connections = dropped, "all connections removed");
        dropped
    }

    /// Send an event to every current member of `room`, originator included.
    ///
    /// Returns the number of connections the event was queued for. An
    /// unknown or empty room is a no-op.
    pub fn broadcast(&self, room: &str, event: RelayEvent) -> usize {
        let guard = self.membership.write();
        let envelope = self.seal(event);

        let Some(members) = guard.rooms.get(room) else {
            debug!(room, event = envelope.event.name(), "broadcast to empty room");
            return 0;
        };

        let delivered = members
            .iter()
            .filter_map(|id| guard.connections.get(id).map(|member| (id, member)))
            .filter(|(id, member)| self.deliver(id, member, &envelope))
            .count();

        debug!(
            room,
            event = envelope.event.name(),
            sequence_id = envelope.sequence_id,
            delivered,
            "room broadcast"
        );
        delivered
    }

    /// Send an event to every connection except `origin`
    pub fn broadcast_global(&self, event: RelayEvent, origin: Option<&ConnectionId>) -> usize {
        let guard = self.membership.write();
        let envelope = self.seal(event);

        let delivered = guard
            .connections
            .iter()
            .filter(|(id, _)| Some(*id) != origin)
            .filter(|(id, member)| self.deliver(id, member, &envelope))
            .count();

        debug!(
            event = envelope.event.name(),
            sequence_id = envelope.sequence_id,
            delivered,
            "global broadcast"
        );
        delivered
    }

    pub fn is_member(&self, connection: &ConnectionId, room: &str) -> bool {
        self.membership
            .read()
            .rooms
            .get(room)
            .map(|members| members.contains(connection))
            .unwrap_or(false)
    }

    /// Rooms a connection has joined
    pub fn rooms_of(&self, connection: &ConnectionId) -> Vec<RoomId> {
        let mut rooms: Vec<RoomId> = self
            .membership
            .read()
            .connections
            .get(connection)
            .map(|member| member.rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    pub fn room_size(&self, room: &str) -> usize {
        self.membership
            .read()
            .rooms
            .get(room)
            .map(HashSet::len)
            .unwrap_or(0)
    }

    pub fn connection_count(&self) -> usize {
        self.membership.read().connections.len()
    }

    pub fn room_count(&self) -> usize {
        self.membership.read().rooms.len()
    }

    pub fn current_sequence_id(&self) -> u64 {
        self.sequence_counter.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> RelayStats {
        let membership = self.membership.read();
        RelayStats {
            connections: membership.connections.len(),
            rooms: membership.rooms.len(),
            events_sent: self.events_sent.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            current_sequence_id: self.current_sequence_id(),
        }
    }

    fn seal(&self, event: RelayEvent) -> Arc<Envelope> {
        Arc::new(Envelope {
            event,
            sequence_id: self.sequence_counter.fetch_add(1, Ordering::SeqCst),
            timestamp: chrono::Utc::now().timestamp(),
        })
    }

    fn deliver(&self, id: &ConnectionId, member: &Member, envelope: &Arc<Envelope>) -> bool {
        match member.sender.try_send(Arc::clone(envelope)) {
            Ok(()) => {
                self.events_sent.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_)) => {
                self.events_dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    connection = %id,
                    event = envelope.event.name(),
                    sequence_id = envelope.sequence_id,
                    "outbound queue full, dropping event"
                );
                false
            }
            // Receiver is gone; disconnect will clean up shortly
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_QUEUE_CAPACITY)
    }
}

fn remove_from_room(
    rooms: &mut HashMap<RoomId, HashSet<ConnectionId>>,
    room: &str,
    connection: &ConnectionId,
) {
    if let Some(members) = rooms.get_mut(room) {
        members.remove(connection);
        if members.is_empty() {
            rooms.remove(room);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(body: &str) -> RelayEvent {
        RelayEvent::MessageReceived(json!({ "body": body }))
    }

    #[test]
    fn test_room_broadcast_reaches_only_members() {
        let registry = RoomRegistry::new(8);
        let (a, mut rx_a) = registry.register();
        let (b, mut rx_b) = registry.register();

        assert!(registry.join(&a, "conv-1"));
        assert!(registry.join(&b, "conv-2"));

        assert_eq!(registry.broadcast("conv-1", message("hi")), 1);

        let envelope = rx_a.try_recv().unwrap();
        assert_eq!(envelope.event, message("hi"));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_join_is_idempotent() {
        let registry = RoomRegistry::new(8);
        let (a, mut rx_a) = registry.register();

        assert!(registry.join(&a, "conv-1"));
        assert!(!registry.join(&a, "conv-1"));
        assert_eq!(registry.room_size("conv-1"), 1);

        assert_eq!(registry.broadcast("conv-1", message("once")), 1);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_a.try_recv().is_err());
    }

    #[test]
    fn test_join_from_unknown_connection_is_ignored() {
        let registry = RoomRegistry::new(8);
        assert!(!registry.join(&ConnectionId::from("conn_ghost"), "conv-1"));
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn test_blank_room_name_is_rejected() {
        let registry = RoomRegistry::new(8);
        let (a, _rx_a) = registry.register();

        assert!(!registry.join(&a, ""));
        assert!(!registry.join(&a, "   "));
        assert_eq!(registry.room_count(), 0);
        assert!(registry.rooms_of(&a).is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_all_closes_every_queue() {
        let registry = RoomRegistry::new(8);
        let (a, mut rx_a) = registry.register();
        let (_b, mut rx_b) = registry.register();
        registry.join(&a, "conv-1");

        assert_eq!(registry.disconnect_all(), 2);
        assert_eq!(registry.connection_count(), 0);
        assert_eq!(registry.room_count(), 0);

        assert!(rx_a.recv().await.is_none());
        assert!(rx_b.recv().await.is_none());
        assert_eq!(registry.broadcast("conv-1", message("late")), 0);
    }

    #[test]
    fn test_leave_drops_empty_room() {
        let registry = RoomRegistry::new(8);
        let (a, mut rx_a) = registry.register();
        registry.join(&a, "conv-1");

        assert!(registry.leave(&a, "conv-1"));
        assert!(!registry.leave(&a, "conv-1"));
        assert_eq!(registry.room_count(), 0);

        assert_eq!(registry.broadcast("conv-1", message("late")), 0);
        assert!(rx_a.try_recv().is_err());
    }

    #[test]
    fn test_disconnect_removes_all_memberships() {
        let registry = RoomRegistry::new(8);
        let (a, _rx_a) = registry.register();
        let (b, _rx_b) = registry.register();
        registry.join(&a, "conv-1");
        registry.join(&a, "conv-2");
        registry.join(&b, "conv-2");

        registry.disconnect(&a);
        registry.disconnect(&a);

        assert_eq!(registry.connection_count(), 1);
        assert_eq!(registry.room_count(), 1);
        assert!(!registry.is_member(&a, "conv-2"));
        assert!(registry.is_member(&b, "conv-2"));
        assert!(registry.rooms_of(&a).is_empty());
    }

    #[test]
    fn test_global_broadcast_skips_origin() {
        let registry = RoomRegistry::new(8);
        let (a, mut rx_a) = registry.register();
        let (_b, mut rx_b) = registry.register();

        let post = RelayEvent::PostReceived(json!({ "id": "p1" }));
        assert_eq!(registry.broadcast_global(post.clone(), Some(&a)), 1);

        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap().event, post);
    }

    #[test]
    fn test_global_broadcast_without_origin_reaches_everyone() {
        let registry = RoomRegistry::new(8);
        let (_a, mut rx_a) = registry.register();
        let (_b, mut rx_b) = registry.register();

        let like = RelayEvent::LikeReceived(json!({ "postId": "p1" }));
        assert_eq!(registry.broadcast_global(like, None), 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_sequential_broadcasts_keep_order() {
        let registry = RoomRegistry::new(8);
        let (a, mut rx_a) = registry.register();
        registry.join(&a, "conv-1");

        registry.broadcast("conv-1", message("first"));
        registry.broadcast("conv-1", message("second"));

        let first = rx_a.try_recv().unwrap();
        let second = rx_a.try_recv().unwrap();
        assert_eq!(first.event, message("first"));
        assert_eq!(second.event, message("second"));
        assert!(first.sequence_id < second.sequence_id);
    }

    #[test]
    fn test_full_queue_drops_for_that_connection_only() {
        let registry = RoomRegistry::new(1);
        let (slow, _rx_slow) = registry.register();
        let (fast, mut rx_fast) = registry.register();
        registry.join(&slow, "conv-1");
        registry.join(&fast, "conv-1");

        assert_eq!(registry.broadcast("conv-1", message("one")), 2);
        rx_fast.try_recv().unwrap();
        assert_eq!(registry.broadcast("conv-1", message("two")), 1);
        assert_eq!(rx_fast.try_recv().unwrap().event, message("two"));

        let stats = registry.stats();
        assert_eq!(stats.events_sent, 3);
        assert_eq!(stats.events_dropped, 1);
        assert_eq!(stats.current_sequence_id, 2);
    }

    #[test]
    fn test_closed_receiver_does_not_count_as_delivery() {
        let registry = RoomRegistry::new(8);
        let (a, rx_a) = registry.register();
        registry.join(&a, "conv-1");
        drop(rx_a);

        assert_eq!(registry.broadcast("conv-1", message("gone")), 0);
    }
}
