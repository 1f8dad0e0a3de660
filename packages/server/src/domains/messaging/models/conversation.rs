use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{ConversationId, ListingId, MessageId, UserId};
use crate::domains::messaging::rooms::PairKey;

/// Conversation - at most one per (participant pair, listing).
///
/// The pair is stored pre-sorted (`participant_low` / `participant_high`) so
/// the composite unique index enforces the invariant no matter which side
/// creates the row first.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: ConversationId,
    pub participant_low: UserId,
    pub participant_high: UserId,
    pub listing_id: ListingId,
    pub last_message_id: Option<MessageId>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Whether the given user is one of the two participants
    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.participant_low == user_id || self.participant_high == user_id
    }

    /// The canonical pair behind this conversation
    pub fn pair(&self) -> PairKey {
        PairKey::new(self.participant_low, self.participant_high)
    }

    /// Find a conversation by ID
    pub async fn find_by_id(id: ConversationId, pool: &PgPool) -> Result<Option<Self>> {
        let conversation =
            sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(conversation)
    }

    /// Find the conversation for a (pair, listing) key
    pub async fn find_by_key(
        pair: &PairKey,
        listing_id: ListingId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations
             WHERE participant_low = $1 AND participant_high = $2 AND listing_id = $3",
        )
        .bind(pair.low())
        .bind(pair.high())
        .bind(listing_id)
        .fetch_optional(pool)
        .await?;
        Ok(conversation)
    }

    /// Atomic insert-if-absent for a (pair, listing) key.
    ///
    /// Returns `None` when another writer won the race - callers retry the
    /// lookup instead of failing the send.
    pub async fn insert_if_absent(
        pair: &PairKey,
        listing_id: ListingId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (id, participant_low, participant_high, listing_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (participant_low, participant_high, listing_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(ConversationId::new())
        .bind(pair.low())
        .bind(pair.high())
        .bind(listing_id)
        .fetch_optional(pool)
        .await?;
        Ok(conversation)
    }

    /// Update the "last message" pointer
    pub async fn set_last_message(
        id: ConversationId,
        message_id: MessageId,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query("UPDATE conversations SET last_message_id = $2 WHERE id = $1")
            .bind(id)
            .bind(message_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
