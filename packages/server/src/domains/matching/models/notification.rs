use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{FilterId, ListingId, UserId};

/// Notification record - durable trace of a dispatched saved-search alert
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub listing_id: ListingId,
    pub user_id: UserId,
    pub filter_id: FilterId,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Record an alert for (listing, user).
    ///
    /// Uses ON CONFLICT DO NOTHING so a listing alerts a user at most once
    /// even when several of their filters match. Returns `true` when a row
    /// was inserted, `false` when the pair was already recorded.
    pub async fn record(
        listing_id: ListingId,
        user_id: UserId,
        filter_id: FilterId,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO notifications (listing_id, user_id, filter_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (listing_id, user_id) DO NOTHING",
        )
        .bind(listing_id)
        .bind(user_id)
        .bind(filter_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Find all notifications for a user, newest first
    pub async fn find_by_user(user_id: UserId, pool: &PgPool) -> Result<Vec<Self>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }
}
