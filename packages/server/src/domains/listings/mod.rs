// Listings domain - the matched resource.
//
// Listing CRUD (forms, pagination, moderation) is external; the core persists
// enough of the record to evaluate saved filters and to anchor conversations.

pub mod models;

pub use models::{Listing, ListingStatus, NewListing};
