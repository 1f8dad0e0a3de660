use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{ListingId, UserId};

/// Listing - a skill offer or request published on the marketplace.
///
/// Budget bounds and coordinates are optional; the matching engine treats a
/// missing value per clause (a listing without a budget fails a bounded budget
/// filter, a listing without coordinates fails a geo filter).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: ListingId,
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub skill_offered: String,
    pub skill_wanted: String,
    pub tags: Vec<String>,
    pub is_service: bool,
    pub status: String, // 'active', 'paused', 'closed'
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Listing status enum
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Paused,
    Closed,
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingStatus::Active => write!(f, "active"),
            ListingStatus::Paused => write!(f, "paused"),
            ListingStatus::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(ListingStatus::Active),
            "paused" => Ok(ListingStatus::Paused),
            "closed" => Ok(ListingStatus::Closed),
            _ => Err(anyhow::anyhow!("Invalid listing status: {}", s)),
        }
    }
}

/// Input payload for creating a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub skill_offered: String,
    #[serde(default)]
    pub skill_wanted: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_service: bool,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Listing {
    /// Find a listing by ID
    pub async fn find_by_id(id: ListingId, pool: &PgPool) -> Result<Option<Self>> {
        let listing = sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(listing)
    }

    /// Create a new listing owned by `owner_id`, active by default
    pub async fn create(owner_id: UserId, input: NewListing, pool: &PgPool) -> Result<Self> {
        let listing = sqlx::query_as::<_, Listing>(
            r#"
            INSERT INTO listings (
                id, owner_id, title, description, category,
                skill_offered, skill_wanted, tags, is_service, status,
                budget_min, budget_max, latitude, longitude
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(ListingId::new())
        .bind(owner_id)
        .bind(input.title)
        .bind(input.description)
        .bind(input.category)
        .bind(input.skill_offered)
        .bind(input.skill_wanted)
        .bind(input.tags)
        .bind(input.is_service)
        .bind(ListingStatus::Active.to_string())
        .bind(input.budget_min)
        .bind(input.budget_max)
        .bind(input.latitude)
        .bind(input.longitude)
        .fetch_one(pool)
        .await?;
        Ok(listing)
    }

    /// Whether the listing is visible to matching
    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ListingStatus::Active,
            ListingStatus::Paused,
            ListingStatus::Closed,
        ] {
            let parsed = ListingStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_invalid_status_rejected() {
        assert!(ListingStatus::from_str("archived").is_err());
    }
}
