//! Listing creation - the producer side of saved-search alerts.
//!
//! POST /api/listings
//!
//! Listing CRUD proper is out of scope; this endpoint exists because the
//! notification dispatcher's one trigger is "a new qualifying listing
//! exists". Dispatch failures are logged and never fail the request.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::{error, warn};

use crate::domains::listings::{Listing, NewListing};
use crate::server::app::AppState;
use crate::server::routes::extract_bearer_token;

pub async fn create_listing_handler(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Json(input): Json<NewListing>,
) -> Result<(StatusCode, Json<Listing>), StatusCode> {
    let token = extract_bearer_token(&headers).ok_or(StatusCode::UNAUTHORIZED)?;
    let claims = state
        .jwt_service
        .verify_token(&token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let listing = Listing::create(claims.user_id(), input, &state.db_pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create listing");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if let Err(e) = state.dispatcher.listing_created(&listing).await {
        warn!(listing_id = %listing.id, error = %e, "Saved-search dispatch failed");
    }

    Ok((StatusCode::CREATED, Json(listing)))
}
