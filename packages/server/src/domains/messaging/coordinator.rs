//! Conversation coordinator - owns the message send path.
//!
//! Send order: validate participants, resolve-or-create the conversation
//! (atomic insert-if-absent with a bounded retry), persist the message,
//! advance the last-message pointer, then publish to the pair's room and the
//! recipient's user channel. The email side-channel runs last and its failure
//! never rolls anything back.

use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::common::{ConversationId, ListingId, MessageId, UserId};
use crate::domains::messaging::error::MessagingError;
use crate::domains::messaging::models::{Message, MessageKind, MessageReport};
use crate::domains::messaging::rooms::{PairKey, RoomRouter};
use crate::domains::messaging::store::{ConversationStore, UserRef};
use crate::kernel::traits::{BlobStore, EmailNotifier};
use crate::kernel::UserHub;

/// Attempts to converge resolve-or-create before giving up. Losing the insert
/// race means the row exists, so the retried lookup succeeds on the next pass;
/// the bound only guards against a pathological store.
const CREATE_RETRY_LIMIT: usize = 3;

pub struct ConversationCoordinator {
    store: Arc<dyn ConversationStore>,
    rooms: RoomRouter,
    hub: UserHub,
    email: Arc<dyn EmailNotifier>,
    blobs: Arc<dyn BlobStore>,
}

impl ConversationCoordinator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        rooms: RoomRouter,
        hub: UserHub,
        email: Arc<dyn EmailNotifier>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            store,
            rooms,
            hub,
            email,
            blobs,
        }
    }

    /// Send a plain-text message from `sender_id` to `recipient_id` about a listing.
    #[instrument(skip(self, content), fields(sender = %sender_id, recipient = %recipient_id))]
    pub async fn send_message(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        listing_id: ListingId,
        content: String,
    ) -> Result<Message, MessagingError> {
        self.deliver(sender_id, recipient_id, listing_id, MessageKind::Text, content)
            .await
    }

    /// Send a file message: the payload goes to the blob store first and the
    /// persisted message carries the stored path as its content.
    #[instrument(skip(self, bytes), fields(sender = %sender_id, recipient = %recipient_id, file = %file_name))]
    pub async fn send_file_message(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        listing_id: ListingId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Message, MessagingError> {
        // Validate before the upload so a bad recipient leaves no side effects
        let (sender, recipient) = self
            .validate_participants(sender_id, recipient_id, listing_id)
            .await?;

        let url = self.blobs.store(file_name, bytes).await?;
        self.deliver_validated(sender, recipient, listing_id, MessageKind::File, url)
            .await
    }

    /// Messages of a conversation in send order, restricted to participants.
    pub async fn conversation_messages(
        &self,
        conversation_id: ConversationId,
        requester: UserId,
    ) -> Result<Vec<Message>, MessagingError> {
        let conversation = self
            .store
            .find_conversation_by_id(conversation_id)
            .await?
            .ok_or(MessagingError::ConversationNotFound)?;

        if !conversation.has_participant(requester) {
            return Err(MessagingError::NotParticipant);
        }

        self.store.messages(conversation_id).await
    }

    /// File a moderation report; at most one per (message, reporter).
    pub async fn report_message(
        &self,
        message_id: MessageId,
        reporter_id: UserId,
        reason: String,
    ) -> Result<MessageReport, MessagingError> {
        self.store.report_message(message_id, reporter_id, reason).await
    }

    async fn deliver(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        listing_id: ListingId,
        kind: MessageKind,
        content: String,
    ) -> Result<Message, MessagingError> {
        let (sender, recipient) = self
            .validate_participants(sender_id, recipient_id, listing_id)
            .await?;
        self.deliver_validated(sender, recipient, listing_id, kind, content)
            .await
    }

    async fn validate_participants(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        listing_id: ListingId,
    ) -> Result<(UserRef, UserRef), MessagingError> {
        if sender_id == recipient_id {
            return Err(MessagingError::SelfMessage);
        }

        let sender = self
            .store
            .find_user(sender_id)
            .await?
            .ok_or(MessagingError::UserNotFound)?;
        let recipient = self
            .store
            .find_user(recipient_id)
            .await?
            .ok_or(MessagingError::UserNotFound)?;

        if !self.store.listing_exists(listing_id).await? {
            return Err(MessagingError::ListingNotFound);
        }

        Ok((sender, recipient))
    }

    async fn deliver_validated(
        &self,
        sender: UserRef,
        recipient: UserRef,
        listing_id: ListingId,
        kind: MessageKind,
        content: String,
    ) -> Result<Message, MessagingError> {
        let pair = PairKey::new(sender.id, recipient.id);
        let conversation = self.resolve_conversation(&pair, listing_id).await?;

        let message = self
            .store
            .append_message(conversation.id, sender.id, kind, content)
            .await?;
        self.store
            .set_last_message(conversation.id, message.id)
            .await?;

        // Room broadcast: everyone currently viewing the conversation,
        // including the sender's own echo
        self.rooms
            .publish(
                &pair.channel(),
                json!({
                    "type": "receive_private_message",
                    "message_id": message.id,
                    "conversation_id": message.conversation_id,
                    "sender_id": sender.id,
                    "sender_name": sender.display_name,
                    "kind": message.kind,
                    "content": message.content,
                    "timestamp": message.created_at,
                }),
            )
            .await;

        // User-channel alert: reaches the recipient even when they are not
        // viewing the conversation
        self.hub
            .publish(
                recipient.id,
                json!({
                    "type": "new_message",
                    "conversation_id": message.conversation_id,
                    "sender_id": sender.id,
                    "sender_name": sender.display_name,
                    "message": {
                        "id": message.id,
                        "kind": message.kind,
                        "content": message.content,
                        "created_at": message.created_at,
                    },
                }),
            )
            .await;

        if let Err(e) = self
            .email
            .notify_new_message(&recipient.email, &sender.display_name)
            .await
        {
            warn!(error = %e, recipient = %recipient.id, "Email notification failed, continuing");
        }

        info!(
            message_id = %message.id,
            conversation_id = %message.conversation_id,
            "Message delivered"
        );
        Ok(message)
    }

    /// Resolve-or-create with the bounded retry-on-conflict loop.
    async fn resolve_conversation(
        &self,
        pair: &PairKey,
        listing_id: ListingId,
    ) -> Result<crate::domains::messaging::models::Conversation, MessagingError> {
        for _ in 0..CREATE_RETRY_LIMIT {
            if let Some(existing) = self.store.find_conversation(pair, listing_id).await? {
                return Ok(existing);
            }
            if let Some(created) = self
                .store
                .insert_conversation_if_absent(pair, listing_id)
                .await?
            {
                return Ok(created);
            }
            // Lost the creation race - the winner's row shows up on retry
        }
        Err(MessagingError::CreationRace)
    }
}
