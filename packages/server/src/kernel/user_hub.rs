//! Per-user fan-out hub for real-time notifications.
//!
//! Maintains the live index {user identity -> open output streams} and
//! multicasts named events to every stream a user currently has open
//! (multiple tabs/devices each hold their own receiver). Delivery is
//! at-most-once, best-effort while connected: no queue, no retry, no
//! persistence of missed notifications.
//!
//! # Usage
//!
//! Producers (coordinator, dispatcher):
//!   hub.publish(user_id, json!({"type": "new_message", ...})).await;
//!
//! Consumers (SSE endpoint, chat sessions):
//!   let rx = hub.subscribe(user_id).await;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::common::UserId;

/// In-process per-user event hub.
///
/// Thread-safe, cloneable. Keys are the canonical string form of the user
/// identity; payloads are `serde_json::Value` with a `"type"` field.
#[derive(Clone)]
pub struct UserHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<serde_json::Value>>>>,
    capacity: usize,
}

impl UserHub {
    /// Create a new hub with default capacity (256 events per user).
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a new hub with the given per-user channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Canonical key for a user identity.
    fn canonical(user_id: UserId) -> String {
        user_id.to_string()
    }

    /// Open a stream for a user. Creates the entry if absent; a user may hold
    /// any number of concurrent streams.
    pub async fn subscribe(&self, user_id: UserId) -> broadcast::Receiver<serde_json::Value> {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(Self::canonical(user_id))
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        tx.subscribe()
    }

    /// Push an event to every open stream of a user. Safe no-op when the user
    /// has none - never an error, nothing queued.
    pub async fn publish(&self, user_id: UserId, value: serde_json::Value) {
        let channels = self.channels.read().await;
        if let Some(tx) = channels.get(&Self::canonical(user_id)) {
            // Ignore send errors (no active receivers)
            let _ = tx.send(value);
        }
    }

    /// Drop entries with zero open streams so memory stays bounded by active
    /// connections (housekeeping).
    pub async fn cleanup(&self) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, tx| tx.receiver_count() > 0);
    }

    /// Number of users with a registered channel.
    pub async fn user_count(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Number of open streams for a user.
    pub async fn stream_count(&self, user_id: UserId) -> usize {
        self.channels
            .read()
            .await
            .get(&Self::canonical(user_id))
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for UserHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_without_streams_is_noop() {
        let hub = UserHub::new();
        let offline_user = UserId::new();

        // Must not panic...
        hub.publish(offline_user, json!({"type": "new_message"})).await;

        // ...and must not retain state afterward
        assert_eq!(hub.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_event_reaches_every_device() {
        let hub = UserHub::new();
        let user = UserId::new();

        let mut tab = hub.subscribe(user).await;
        let mut phone = hub.subscribe(user).await;

        let event = json!({"type": "saved_search_match", "listing_id": "x"});
        hub.publish(user, event.clone()).await;

        assert_eq!(tab.recv().await.unwrap(), event);
        assert_eq!(phone.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_events_are_user_scoped() {
        let hub = UserHub::new();
        let alice = UserId::new();
        let bob = UserId::new();

        let mut alice_rx = hub.subscribe(alice).await;
        let mut bob_rx = hub.subscribe(bob).await;

        hub.publish(alice, json!({"type": "for_alice"})).await;

        assert_eq!(alice_rx.recv().await.unwrap(), json!({"type": "for_alice"}));
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cleanup_bounds_memory_to_live_streams() {
        let hub = UserHub::new();
        let user = UserId::new();

        let rx = hub.subscribe(user).await;
        assert_eq!(hub.user_count().await, 1);
        assert_eq!(hub.stream_count(user).await, 1);

        drop(rx);
        hub.cleanup().await;
        assert_eq!(hub.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_no_replay_for_late_subscribers() {
        let hub = UserHub::new();
        let user = UserId::new();

        // Keep the channel alive with one stream, publish, then connect late
        let _existing = hub.subscribe(user).await;
        hub.publish(user, json!({"type": "missed"})).await;

        let mut late = hub.subscribe(user).await;
        assert!(late.try_recv().is_err());
    }
}
