use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{MessageId, ReportId, UserId};

/// MessageReport - a user flagging a message for moderation.
///
/// `UNIQUE (message_id, reporter_id)` backs the at-most-one-report-per-user
/// invariant; the insert swallows the conflict and returns `None` so callers
/// can reject the duplicate without parsing database errors.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageReport {
    pub id: ReportId,
    pub message_id: MessageId,
    pub reporter_id: UserId,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl MessageReport {
    /// Insert a report; returns `None` when this user already reported the message
    pub async fn create(
        message_id: MessageId,
        reporter_id: UserId,
        reason: String,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let report = sqlx::query_as::<_, MessageReport>(
            r#"
            INSERT INTO message_reports (id, message_id, reporter_id, reason)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (message_id, reporter_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(ReportId::new())
        .bind(message_id)
        .bind(reporter_id)
        .bind(reason)
        .fetch_optional(pool)
        .await?;
        Ok(report)
    }

    /// All reports filed against a message
    pub async fn find_by_message(message_id: MessageId, pool: &PgPool) -> Result<Vec<Self>> {
        let reports = sqlx::query_as::<_, MessageReport>(
            "SELECT * FROM message_reports WHERE message_id = $1 ORDER BY created_at ASC",
        )
        .bind(message_id)
        .fetch_all(pool)
        .await?;
        Ok(reports)
    }
}
