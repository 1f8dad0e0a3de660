//! Per-connection chat session state machine.
//!
//! The transport hands every inbound frame to `handle_command` and pumps
//! `next_event` back out; the session owns the connection's room
//! subscriptions. Keeping the state machine off the socket makes
//! join -> active -> disconnected testable without a WebSocket.

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{StreamExt, StreamMap};
use tracing::debug;

use crate::common::{ListingId, UserId};
use crate::domains::messaging::coordinator::ConversationCoordinator;
use crate::domains::messaging::error::MessagingError;
use crate::domains::messaging::rooms::{room_key, RoomRouter};
use crate::kernel::UserHub;

/// Commands a connected client may submit on the chat channel.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Join the two-party room shared with `peer_id`
    Join { peer_id: UserId },
    /// Join the connection's own user channel for `new_message` alerts
    JoinUserChannel,
    /// Submit a plain-text message
    SendMessage {
        recipient_id: UserId,
        listing_id: ListingId,
        content: String,
    },
    /// Submit a file message; `data` is the base64-encoded payload
    SendFile {
        recipient_id: UserId,
        listing_id: ListingId,
        file_name: String,
        data: String,
    },
}

pub struct ChatSession {
    user_id: UserId,
    coordinator: Arc<ConversationCoordinator>,
    rooms: RoomRouter,
    hub: UserHub,
    subscriptions: StreamMap<String, BroadcastStream<Value>>,
}

impl ChatSession {
    pub fn new(
        user_id: UserId,
        coordinator: Arc<ConversationCoordinator>,
        rooms: RoomRouter,
        hub: UserHub,
    ) -> Self {
        Self {
            user_id,
            coordinator,
            rooms,
            hub,
            subscriptions: StreamMap::new(),
        }
    }

    /// Rooms this connection currently belongs to.
    pub fn joined(&self) -> Vec<&str> {
        self.subscriptions.keys().map(String::as_str).collect()
    }

    /// Dispatch one client command; returns the reply frame for this client,
    /// if any. Broadcasts to other participants travel through the router and
    /// hub, not through the return value.
    pub async fn handle_command(&mut self, command: ClientCommand) -> Option<Value> {
        match command {
            ClientCommand::Join { peer_id } => {
                let room = room_key(self.user_id, peer_id);
                if !self.subscriptions.contains_key(&room) {
                    let rx = self.rooms.subscribe(&room).await;
                    self.subscriptions
                        .insert(room.clone(), BroadcastStream::new(rx));
                }
                debug!(user = %self.user_id, room = %room, "Joined room");
                Some(json!({"type": "joined", "room": room}))
            }

            ClientCommand::JoinUserChannel => {
                let channel = format!("user:{}", self.user_id);
                if !self.subscriptions.contains_key(&channel) {
                    let rx = self.hub.subscribe(self.user_id).await;
                    self.subscriptions
                        .insert(channel.clone(), BroadcastStream::new(rx));
                }
                Some(json!({"type": "joined", "room": channel}))
            }

            ClientCommand::SendMessage {
                recipient_id,
                listing_id,
                content,
            } => {
                let result = self
                    .coordinator
                    .send_message(self.user_id, recipient_id, listing_id, content)
                    .await;
                Some(Self::send_reply(result))
            }

            ClientCommand::SendFile {
                recipient_id,
                listing_id,
                file_name,
                data,
            } => {
                use base64::Engine;
                let bytes = match base64::engine::general_purpose::STANDARD.decode(&data) {
                    Ok(bytes) => bytes,
                    Err(_) => return Some(error_frame("bad_payload", "Invalid base64 payload")),
                };

                let result = self
                    .coordinator
                    .send_file_message(self.user_id, recipient_id, listing_id, &file_name, &bytes)
                    .await;
                Some(Self::send_reply(result))
            }
        }
    }

    /// Local confirmation of the sender's own send, independent of recipient
    /// delivery outcome.
    fn send_reply(result: Result<crate::domains::messaging::models::Message, MessagingError>) -> Value {
        match result {
            Ok(message) => json!({
                "type": "message_sent",
                "message_id": message.id,
                "conversation_id": message.conversation_id,
            }),
            Err(e) => error_frame(error_code(&e), &e.to_string()),
        }
    }

    /// Next event fanned in from this connection's subscriptions. Pending
    /// (not `None`) while nothing is joined, so transport select loops don't
    /// spin.
    pub async fn next_event(&mut self) -> Option<Value> {
        if self.subscriptions.is_empty() {
            std::future::pending::<()>().await;
        }

        match self.subscriptions.next().await {
            Some((_, Ok(value))) => Some(value),
            Some((room, Err(BroadcastStreamRecvError::Lagged(missed)))) => {
                Some(json!({"type": "lagged", "room": room, "missed": missed}))
            }
            None => None,
        }
    }
}

/// Error frame sent back to the submitting client only.
pub fn error_frame(code: &str, message: &str) -> Value {
    json!({"type": "error", "code": code, "message": message})
}

fn error_code(error: &MessagingError) -> &'static str {
    match error {
        MessagingError::UserNotFound => "user_not_found",
        MessagingError::ListingNotFound => "listing_not_found",
        MessagingError::ConversationNotFound => "conversation_not_found",
        MessagingError::MessageNotFound => "message_not_found",
        MessagingError::SelfMessage => "self_message",
        MessagingError::NotParticipant => "not_participant",
        MessagingError::DuplicateReport => "duplicate_report",
        MessagingError::CreationRace => "retry",
        MessagingError::Database(_) | MessagingError::Internal(_) => "internal",
    }
}
