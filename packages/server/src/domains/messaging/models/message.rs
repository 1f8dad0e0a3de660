use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{ConversationId, MessageId, UserId};

/// Message - belongs to exactly one conversation.
///
/// Never physically deleted; moderation flips the soft-delete flag. For file
/// messages `content` holds the stored attachment path.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub kind: String, // 'text', 'file'
    pub content: String,
    pub sequence_number: i32,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Message kind enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    File,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Text => write!(f, "text"),
            MessageKind::File => write!(f, "file"),
        }
    }
}

impl std::str::FromStr for MessageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(MessageKind::Text),
            "file" => Ok(MessageKind::File),
            _ => Err(anyhow::anyhow!("Invalid message kind: {}", s)),
        }
    }
}

impl Message {
    /// Find a message by ID
    pub async fn find_by_id(id: MessageId, pool: &PgPool) -> Result<Option<Self>> {
        let message = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(message)
    }

    /// Next sequence number within a conversation
    pub async fn next_sequence_number(
        conversation_id: ConversationId,
        pool: &PgPool,
    ) -> Result<i32> {
        let (next,): (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(sequence_number), 0) + 1 FROM messages WHERE conversation_id = $1",
        )
        .bind(conversation_id)
        .fetch_one(pool)
        .await?;
        Ok(next)
    }

    /// Append a message to a conversation
    pub async fn create(
        conversation_id: ConversationId,
        sender_id: UserId,
        kind: MessageKind,
        content: String,
        sequence_number: i32,
        pool: &PgPool,
    ) -> Result<Self> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, kind, content, sequence_number)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(MessageId::new())
        .bind(conversation_id)
        .bind(sender_id)
        .bind(kind.to_string())
        .bind(content)
        .bind(sequence_number)
        .fetch_one(pool)
        .await?;
        Ok(message)
    }

    /// Non-deleted messages of a conversation in send order
    pub async fn find_by_conversation(
        conversation_id: ConversationId,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages
             WHERE conversation_id = $1 AND deleted = FALSE
             ORDER BY sequence_number ASC",
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await?;
        Ok(messages)
    }

    /// Moderation: hide a message without removing the record
    pub async fn soft_delete(id: MessageId, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE messages SET deleted = TRUE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
