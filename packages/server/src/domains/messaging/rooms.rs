//! Room keys and the room-subscription registry.
//!
//! A room key is derived from the two participant identities sorted into
//! canonical order, so both sides compute the same key without coordination.
//! The registry multicasts events to every connection currently joined to a
//! room; publishing to an empty room is a no-op, never an error.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::common::UserId;

/// The canonical (sorted) participant pair behind a conversation and its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey {
    low: UserId,
    high: UserId,
}

impl PairKey {
    /// Build the canonical pair: identities sorted lexicographically by their
    /// string form, so `new(a, b) == new(b, a)`.
    pub fn new(a: UserId, b: UserId) -> Self {
        if a.to_string() <= b.to_string() {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> UserId {
        self.low
    }

    pub fn high(&self) -> UserId {
        self.high
    }

    /// The room channel name for this pair.
    pub fn channel(&self) -> String {
        format!("{}:{}", self.low, self.high)
    }
}

/// Derive the shared room key for two participants, independent of order.
pub fn room_key(a: UserId, b: UserId) -> String {
    PairKey::new(a, b).channel()
}

/// In-process registry of room channels.
///
/// Thread-safe, cloneable. One broadcast channel per active room; a
/// connection may hold receivers for several rooms at once. Payloads are
/// `serde_json::Value` carrying a `"type"` field.
#[derive(Clone)]
pub struct RoomRouter {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<serde_json::Value>>>>,
    capacity: usize,
}

impl RoomRouter {
    /// Create a new router with default capacity (256 events per room).
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a new router with the given per-room channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Join a room. Creates the channel if it doesn't exist.
    pub async fn subscribe(&self, room: &str) -> broadcast::Receiver<serde_json::Value> {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        tx.subscribe()
    }

    /// Publish an event to a room. No-op if nobody has joined.
    pub async fn publish(&self, room: &str, value: serde_json::Value) {
        let channels = self.channels.read().await;
        if let Some(tx) = channels.get(room) {
            // Ignore send errors (no active receivers)
            let _ = tx.send(value);
        }
    }

    /// Drop rooms with zero joined connections (housekeeping).
    pub async fn cleanup(&self) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, tx| tx.receiver_count() > 0);
    }

    /// Number of rooms currently registered.
    pub async fn room_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl Default for RoomRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_room_key_symmetry() {
        for _ in 0..32 {
            let a = UserId::new();
            let b = UserId::new();
            assert_eq!(room_key(a, b), room_key(b, a));
        }
    }

    #[test]
    fn test_room_key_shape() {
        let a = UserId::new();
        let b = UserId::new();
        let key = room_key(a, b);

        let (low, high) = key.split_once(':').unwrap();
        assert!(low <= high);

        let mut derived = vec![low.to_string(), high.to_string()];
        derived.sort();
        let mut expected = vec![a.to_string(), b.to_string()];
        expected.sort();
        assert_eq!(derived, expected);
    }

    #[test]
    fn test_pair_key_orders_participants() {
        let a = UserId::new();
        let b = UserId::new();
        let pair = PairKey::new(a, b);
        assert!(pair.low().to_string() <= pair.high().to_string());
        assert_eq!(pair, PairKey::new(b, a));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let router = RoomRouter::new();
        // Should not panic and should not register the room
        router.publish("nobody:here", json!({"type": "test"})).await;
        assert_eq!(router.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_publish_reaches_all_joined_connections() {
        let router = RoomRouter::new();
        let mut rx1 = router.subscribe("room").await;
        let mut rx2 = router.subscribe("room").await;

        let event = json!({"type": "receive_private_message", "content": "hi"});
        router.publish("room", event.clone()).await;

        assert_eq!(rx1.recv().await.unwrap(), event);
        assert_eq!(rx2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_connection_can_join_multiple_rooms() {
        let router = RoomRouter::new();
        let mut chat = router.subscribe("chat").await;
        let mut user = router.subscribe("user").await;

        router.publish("chat", json!({"type": "a"})).await;
        router.publish("user", json!({"type": "b"})).await;

        assert_eq!(chat.recv().await.unwrap(), json!({"type": "a"}));
        assert_eq!(user.recv().await.unwrap(), json!({"type": "b"}));
    }

    #[tokio::test]
    async fn test_cleanup_drops_empty_rooms() {
        let router = RoomRouter::new();
        let rx = router.subscribe("ephemeral").await;
        assert_eq!(router.room_count().await, 1);

        drop(rx);
        router.cleanup().await;
        assert_eq!(router.room_count().await, 0);
    }
}
