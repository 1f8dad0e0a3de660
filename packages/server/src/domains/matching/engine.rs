//! Saved-search predicate evaluation.
//!
//! Pure function over (listing, filter) - no state, no I/O, safe to call
//! concurrently. Clauses are a short-circuiting conjunction; the first failing
//! clause rejects.

use crate::common::utils::geo::distance_km;
use crate::domains::listings::Listing;
use crate::domains::matching::SavedFilter;

/// Evaluate a saved filter against a listing.
///
/// A disabled filter never matches. Every other clause is optional: a filter
/// with all fields unset matches any listing whose status survives clause 2.
pub fn matches(listing: &Listing, filter: &SavedFilter) -> bool {
    filter.enabled
        && status_clause(listing, filter)
        && category_clause(listing, filter)
        && service_clause(listing, filter)
        && text_clause(listing, filter)
        && tag_clause(listing, filter)
        && budget_clause(listing, filter)
        && geo_clause(listing, filter)
}

fn status_clause(listing: &Listing, filter: &SavedFilter) -> bool {
    match &filter.status {
        Some(status) => listing.status == *status,
        None => true,
    }
}

fn category_clause(listing: &Listing, filter: &SavedFilter) -> bool {
    match &filter.category {
        Some(category) => listing.category == *category,
        None => true,
    }
}

fn service_clause(listing: &Listing, filter: &SavedFilter) -> bool {
    match filter.is_service {
        Some(is_service) => listing.is_service == is_service,
        None => true,
    }
}

/// Case-insensitive substring over the listing's searchable text: title,
/// description, offered/wanted skill, and tags.
fn text_clause(listing: &Listing, filter: &SavedFilter) -> bool {
    let needle = match &filter.text {
        Some(text) if !text.trim().is_empty() => text.to_lowercase(),
        _ => return true,
    };

    let haystack = format!(
        "{} {} {} {} {}",
        listing.title,
        listing.description,
        listing.skill_offered,
        listing.skill_wanted,
        listing.tags.join(" "),
    )
    .to_lowercase();

    haystack.contains(&needle)
}

/// Case-insensitive tag intersection; an empty filter tag set passes.
fn tag_clause(listing: &Listing, filter: &SavedFilter) -> bool {
    if filter.tags.is_empty() {
        return true;
    }

    listing.tags.iter().any(|listing_tag| {
        filter
            .tags
            .iter()
            .any(|filter_tag| listing_tag.eq_ignore_ascii_case(filter_tag))
    })
}

/// Budget window check.
///
/// With no bounds the clause passes. Otherwise the listing must expose a
/// representative value (min, falling back to max) inside the window; a
/// listing without any budget fails as soon as either bound is set.
fn budget_clause(listing: &Listing, filter: &SavedFilter) -> bool {
    if filter.budget_min.is_none() && filter.budget_max.is_none() {
        return true;
    }

    let value = match listing.budget_min.or(listing.budget_max) {
        Some(value) => value,
        None => return false,
    };

    if let Some(min) = filter.budget_min {
        if value < min {
            return false;
        }
    }
    if let Some(max) = filter.budget_max {
        if value > max {
            return false;
        }
    }
    true
}

/// Great-circle radius check.
///
/// Requires the full (point, radius) triple on the filter to activate; a
/// listing without coordinates then fails.
fn geo_clause(listing: &Listing, filter: &SavedFilter) -> bool {
    let (filter_lat, filter_lng, radius) =
        match (filter.latitude, filter.longitude, filter.radius_km) {
            (Some(lat), Some(lng), Some(radius)) => (lat, lng, radius),
            _ => return true,
        };

    let (listing_lat, listing_lng) = match (listing.latitude, listing.longitude) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => return false,
    };

    distance_km(filter_lat, filter_lng, listing_lat, listing_lng) <= radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{FilterId, ListingId, UserId};
    use chrono::Utc;

    fn listing() -> Listing {
        Listing {
            id: ListingId::new(),
            owner_id: UserId::new(),
            title: "Guitar lessons for beginners".to_string(),
            description: "Weekly one-hour sessions, acoustic or electric".to_string(),
            category: "music".to_string(),
            skill_offered: "guitar".to_string(),
            skill_wanted: "photography".to_string(),
            tags: vec!["Music".to_string(), "lessons".to_string()],
            is_service: true,
            status: "active".to_string(),
            budget_min: None,
            budget_max: None,
            latitude: None,
            longitude: None,
            created_at: Utc::now(),
        }
    }

    fn filter() -> SavedFilter {
        SavedFilter {
            id: FilterId::new(),
            owner_id: UserId::new(),
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
    fn test_disabled_filter_never_matches() {
        let mut f = filter();
        f.enabled = false;
        assert!(!matches(&listing(), &f));

        // Even when every other clause would pass trivially
        f.category = Some("music".to_string());
        assert!(!matches(&listing(), &f));
    }

    #[test]
    fn test_all_unset_filter_matches_everything() {
        assert!(matches(&listing(), &filter()));
    }

    #[test]
    fn test_status_clause() {
        let mut f = filter();
        f.status = Some("active".to_string());
        assert!(matches(&listing(), &f));

        f.status = Some("closed".to_string());
        assert!(!matches(&listing(), &f));
    }

    #[test]
    fn test_category_exact_match() {
        let mut f = filter();
        f.category = Some("music".to_string());
        assert!(matches(&listing(), &f));

        f.category = Some("mus".to_string());
        assert!(!matches(&listing(), &f));
    }

    #[test]
    fn test_service_flag() {
        let mut f = filter();
        f.is_service = Some(true);
        assert!(matches(&listing(), &f));

        f.is_service = Some(false);
        assert!(!matches(&listing(), &f));
    }

    #[test]
    fn test_text_is_case_insensitive() {
        let mut f = filter();
        f.text = Some("GUITAR".to_string());
        assert!(matches(&listing(), &f));
    }

    #[test]
    fn test_text_searches_all_fields() {
        // description
        let mut f = filter();
        f.text = Some("acoustic".to_string());
        assert!(matches(&listing(), &f));

        // wanted skill
        f.text = Some("photography".to_string());
        assert!(matches(&listing(), &f));

        // tags
        f.text = Some("lessons".to_string());
        assert!(matches(&listing(), &f));

        f.text = Some("woodworking".to_string());
        assert!(!matches(&listing(), &f));
    }

    #[test]
    fn test_blank_text_passes() {
        let mut f = filter();
        f.text = Some("   ".to_string());
        assert!(matches(&listing(), &f));
    }

    #[test]
    fn test_tag_intersection_case_insensitive() {
        let mut f = filter();
        f.tags = vec!["MUSIC".to_string()];
        assert!(matches(&listing(), &f));

        f.tags = vec!["cooking".to_string(), "LESSONS".to_string()];
        assert!(matches(&listing(), &f));

        f.tags = vec!["cooking".to_string()];
        assert!(!matches(&listing(), &f));
    }

    #[test]
    fn test_budget_window() {
        let mut f = filter();
        f.budget_min = Some(100.0);
        f.budget_max = Some(500.0);

        let mut l = listing();
        l.budget_min = Some(200.0);
        assert!(matches(&l, &f));

        l.budget_min = Some(50.0);
        assert!(!matches(&l, &f));
    }

    #[test]
    fn test_budget_falls_back_to_max() {
        let mut f = filter();
        f.budget_min = Some(100.0);

        let mut l = listing();
        l.budget_min = None;
        l.budget_max = Some(150.0);
        assert!(matches(&l, &f));
    }

    #[test]
    fn test_budget_open_bounds() {
        let mut l = listing();
        l.budget_min = Some(750.0);

        let mut f = filter();
        f.budget_min = Some(500.0);
        assert!(matches(&l, &f));

        f = filter();
        f.budget_max = Some(700.0);
        assert!(!matches(&l, &f));
    }

    #[test]
    fn test_listing_without_budget_fails_bounded_filter() {
        let mut f = filter();
        f.budget_max = Some(500.0);
        assert!(!matches(&listing(), &f));
    }

    #[test]
    fn test_budget_bounds_are_inclusive() {
        let mut f = filter();
        f.budget_min = Some(100.0);
        f.budget_max = Some(500.0);

        let mut l = listing();
        l.budget_min = Some(100.0);
        assert!(matches(&l, &f));

        l.budget_min = Some(500.0);
        assert!(matches(&l, &f));
    }

    #[test]
    fn test_geo_boundary() {
        let mut l = listing();
        l.latitude = Some(1.0);
        l.longitude = Some(0.0);

        let mut f = filter();
        f.latitude = Some(0.0);
        f.longitude = Some(0.0);

        let exact = distance_km(0.0, 0.0, 1.0, 0.0);

        // Exactly radius_km apart matches
        f.radius_km = Some(exact);
        assert!(matches(&l, &f));

        // radius_km + epsilon short of the distance does not
        f.radius_km = Some(exact - 0.001);
        assert!(!matches(&l, &f));
    }

    #[test]
    fn test_geo_requires_listing_coordinates() {
        let mut f = filter();
        f.latitude = Some(0.0);
        f.longitude = Some(0.0);
        f.radius_km = Some(50.0);

        // Listing without coordinates fails an active geo clause
        assert!(!matches(&listing(), &f));
    }

    #[test]
    fn test_partial_geo_filter_passes() {
        // Radius without a point never activates the clause
        let mut f = filter();
        f.radius_km = Some(50.0);
        assert!(matches(&listing(), &f));
    }

    #[test]
    fn test_conjunction_requires_all_clauses() {
        let mut f = filter();
        f.category = Some("music".to_string());
        f.is_service = Some(true);
        f.text = Some("guitar".to_string());
        f.tags = vec!["music".to_string()];
        assert!(matches(&listing(), &f));

        // One failing clause rejects the whole filter
        f.category = Some("cooking".to_string());
        assert!(!matches(&listing(), &f));
    }
}
