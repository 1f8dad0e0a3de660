//! Notification dispatcher - the producer side of saved-search alerts.
//!
//! Invoked when a listing is created. Enumerates enabled filters, evaluates
//! the matching engine, records a durable Notification per alerted user and
//! pushes a `saved_search_match` event through the fan-out hub. Per-filter
//! failures are logged and never abort the cycle.

use anyhow::Result;
use serde_json::json;
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

use crate::common::{FilterId, UserId};
use crate::domains::listings::Listing;
use crate::domains::matching::engine::matches;
use crate::domains::matching::models::{Notification, SavedFilter};
use crate::kernel::UserHub;

#[derive(Clone)]
pub struct NotificationDispatcher {
    pool: PgPool,
    hub: UserHub,
}

impl NotificationDispatcher {
    pub fn new(pool: PgPool, hub: UserHub) -> Self {
        Self { pool, hub }
    }

    /// Evaluate a newly created listing against all enabled saved filters and
    /// alert interested owners. Returns the number of users alerted.
    #[instrument(skip(self, listing), fields(listing_id = %listing.id))]
    pub async fn listing_created(&self, listing: &Listing) -> Result<usize> {
        let filters = SavedFilter::find_enabled(&self.pool).await?;
        let interested = interested_owners(listing, &filters);

        let mut alerted = 0;
        for (owner_id, filter_id) in interested {
            // ON CONFLICT dedupe: a listing alerts each user at most once
            match Notification::record(listing.id, owner_id, filter_id, &self.pool).await {
                Ok(true) => {
                    self.hub
                        .publish(owner_id, saved_search_match_event(listing, filter_id))
                        .await;
                    alerted += 1;
                }
                Ok(false) => {
                    debug!(user_id = %owner_id, "User already alerted for this listing");
                }
                Err(e) => {
                    warn!(user_id = %owner_id, error = %e, "Failed to record alert, skipping user");
                }
            }
        }

        info!(
            filter_count = filters.len(),
            alerted, "Saved-search dispatch complete"
        );
        Ok(alerted)
    }
}

/// Select the owners whose filters match the listing.
///
/// Pure selection step, kept out of the I/O path so it is testable without a
/// database. Skips the listing's own owner, skips malformed filters, and
/// returns each owner once (first matching filter wins).
pub fn interested_owners(listing: &Listing, filters: &[SavedFilter]) -> Vec<(UserId, FilterId)> {
    let mut seen: HashSet<UserId> = HashSet::new();
    let mut interested = Vec::new();

    for filter in filters {
        if filter.owner_id == listing.owner_id {
            continue;
        }
        if !filter.is_well_formed() {
            warn!(filter_id = %filter.id, "Skipping malformed saved filter");
            continue;
        }
        if !matches(listing, filter) {
            continue;
        }
        if seen.insert(filter.owner_id) {
            interested.push((filter.owner_id, filter.id));
        }
    }

    interested
}

fn saved_search_match_event(listing: &Listing, filter_id: FilterId) -> serde_json::Value {
    json!({
        "type": "saved_search_match",
        "listing_id": listing.id,
        "title": listing.title,
        "category": listing.category,
        "filter_id": filter_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ListingId;
    use chrono::Utc;

    fn listing(owner_id: UserId) -> Listing {
        Listing {
            id: ListingId::new(),
            owner_id,
            title: "Bike repair".to_string(),
            description: "Tune-ups and flat fixes".to_string(),
            category: "repair".to_string(),
            skill_offered: "bike repair".to_string(),
            skill_wanted: String::new(),
            tags: vec![],
            is_service: true,
            status: "active".to_string(),
            budget_min: Some(40.0),
            budget_max: None,
            latitude: None,
            longitude: None,
            created_at: Utc::now(),
        }
    }

    fn filter_owned_by(owner_id: UserId) -> SavedFilter {
        SavedFilter {
            id: FilterId::new(),
            owner_id,
            enabled: true,
            status: None,
            category: None,
            is_service: None,
            text: None,
            tags: vec![],
            budget_min: None,
            budget_max: None,
            latitude: None,
            longitude: None,
            radius_km: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_skips_listing_owner() {
        let owner = UserId::new();
        let l = listing(owner);
        let filters = vec![filter_owned_by(owner)];

        assert!(interested_owners(&l, &filters).is_empty());
    }

    #[test]
    fn test_skips_malformed_filters_without_aborting() {
        let l = listing(UserId::new());

        let mut malformed = filter_owned_by(UserId::new());
        malformed.budget_min = Some(500.0);
        malformed.budget_max = Some(100.0);

        let healthy = filter_owned_by(UserId::new());
        let healthy_owner = healthy.owner_id;

        let interested = interested_owners(&l, &[malformed, healthy]);
        assert_eq!(interested.len(), 1);
        assert_eq!(interested[0].0, healthy_owner);
    }

    #[test]
    fn test_one_alert_per_owner_across_filters() {
        let l = listing(UserId::new());
        let owner = UserId::new();

        let first = filter_owned_by(owner);
        let first_id = first.id;
        let second = filter_owned_by(owner);

        let interested = interested_owners(&l, &[first, second]);
        assert_eq!(interested, vec![(owner, first_id)]);
    }

    #[test]
    fn test_non_matching_filter_excluded() {
        let l = listing(UserId::new());

        let mut non_matching = filter_owned_by(UserId::new());
        non_matching.category = Some("music".to_string());

        assert!(interested_owners(&l, &[non_matching]).is_empty());
    }
}
