//! The Persistence Gateway contract consumed by the coordinator.
//!
//! Only the read/write surface the delivery core needs is specified here; the
//! Postgres implementation delegates to the sqlx models, and the tests drive
//! the coordinator through an in-memory implementation instead.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::{ConversationId, ListingId, MessageId, UserId};
use crate::domains::listings::Listing;
use crate::domains::messaging::error::MessagingError;
use crate::domains::messaging::models::{Conversation, Message, MessageKind, MessageReport};
use crate::domains::messaging::rooms::PairKey;
use crate::domains::users::User;

/// The slice of a user record the messaging path needs.
#[derive(Debug, Clone)]
pub struct UserRef {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
}

impl From<User> for UserRef {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            email: user.email,
        }
    }
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<UserRef>, MessagingError>;

    async fn listing_exists(&self, id: ListingId) -> Result<bool, MessagingError>;

    async fn find_conversation(
        &self,
        pair: &PairKey,
        listing_id: ListingId,
    ) -> Result<Option<Conversation>, MessagingError>;

    /// Atomic insert-if-absent; `None` means another writer holds the key and
    /// the caller should retry the lookup.
    async fn insert_conversation_if_absent(
        &self,
        pair: &PairKey,
        listing_id: ListingId,
    ) -> Result<Option<Conversation>, MessagingError>;

    async fn find_conversation_by_id(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, MessagingError>;

    /// Persist a message with a server-assigned timestamp and sequence number.
    async fn append_message(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        kind: MessageKind,
        content: String,
    ) -> Result<Message, MessagingError>;

    async fn set_last_message(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
    ) -> Result<(), MessagingError>;

    /// Non-deleted messages in send order.
    async fn messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, MessagingError>;

    /// File a report; fails with `DuplicateReport` when the reporter already
    /// reported this message, `MessageNotFound` for an unknown message.
    async fn report_message(
        &self,
        message_id: MessageId,
        reporter_id: UserId,
        reason: String,
    ) -> Result<MessageReport, MessagingError>;
}

/// Postgres-backed gateway used in production.
#[derive(Clone)]
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn find_user(&self, id: UserId) -> Result<Option<UserRef>, MessagingError> {
        let user = User::find_by_id(id, &self.pool).await?;
        Ok(user.map(UserRef::from))
    }

    async fn listing_exists(&self, id: ListingId) -> Result<bool, MessagingError> {
        Ok(Listing::find_by_id(id, &self.pool).await?.is_some())
    }

    async fn find_conversation(
        &self,
        pair: &PairKey,
        listing_id: ListingId,
    ) -> Result<Option<Conversation>, MessagingError> {
        Ok(Conversation::find_by_key(pair, listing_id, &self.pool).await?)
    }

    async fn insert_conversation_if_absent(
        &self,
        pair: &PairKey,
        listing_id: ListingId,
    ) -> Result<Option<Conversation>, MessagingError> {
        Ok(Conversation::insert_if_absent(pair, listing_id, &self.pool).await?)
    }

    async fn find_conversation_by_id(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, MessagingError> {
        Ok(Conversation::find_by_id(id, &self.pool).await?)
    }

    async fn append_message(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        kind: MessageKind,
        content: String,
    ) -> Result<Message, MessagingError> {
        let sequence = Message::next_sequence_number(conversation_id, &self.pool).await?;
        let message =
            Message::create(conversation_id, sender_id, kind, content, sequence, &self.pool)
                .await?;
        Ok(message)
    }

    async fn set_last_message(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
    ) -> Result<(), MessagingError> {
        Conversation::set_last_message(conversation_id, message_id, &self.pool).await?;
        Ok(())
    }

    async fn messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, MessagingError> {
        Ok(Message::find_by_conversation(conversation_id, &self.pool).await?)
    }

    async fn report_message(
        &self,
        message_id: MessageId,
        reporter_id: UserId,
        reason: String,
    ) -> Result<MessageReport, MessagingError> {
        if Message::find_by_id(message_id, &self.pool).await?.is_none() {
            return Err(MessagingError::MessageNotFound);
        }

        MessageReport::create(message_id, reporter_id, reason, &self.pool)
            .await?
            .ok_or(MessagingError::DuplicateReport)
    }
}
