use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{FilterId, UserId};

/// SavedFilter - a user-owned saved-search predicate.
///
/// Mutated by external CRUD; the core only enumerates enabled filters and
/// evaluates them as immutable snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SavedFilter {
    pub id: FilterId,
    pub owner_id: UserId,
    pub enabled: bool,
    pub status: Option<String>,
    pub category: Option<String>,
    pub is_service: Option<bool>,
    pub text: Option<String>,
    pub tags: Vec<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl SavedFilter {
    /// Enumerate all enabled filters for an evaluation cycle
    pub async fn find_enabled(pool: &PgPool) -> Result<Vec<Self>> {
        let filters =
            sqlx::query_as::<_, SavedFilter>("SELECT * FROM saved_filters WHERE enabled = TRUE")
                .fetch_all(pool)
                .await?;
        Ok(filters)
    }

    /// Structural sanity check.
    ///
    /// A malformed filter is skipped for the evaluation cycle rather than
    /// aborting evaluation of the others: inverted budget bounds, a latitude
    /// or longitude outside its valid range, a non-finite coordinate, or a
    /// non-positive radius.
    pub fn is_well_formed(&self) -> bool {
        if let (Some(min), Some(max)) = (self.budget_min, self.budget_max) {
            if !min.is_finite() || !max.is_finite() || min > max {
                return false;
            }
        }
        if let Some(lat) = self.latitude {
            if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
                return false;
            }
        }
        if let Some(lng) = self.longitude {
            if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
                return false;
            }
        }
        if let Some(radius) = self.radius_km {
            if !radius.is_finite() || radius <= 0.0 {
                return false;
            }
        }
        true
    }
}
