//! Typed ID definitions for all domain entities.
//!
//! This module defines type aliases for each domain entity, providing
//! compile-time type safety for ID usage throughout the application.
//!
//! # Example
//!
//! ```rust
//! use skillswap_core::common::{ListingId, UserId};
//!
//! // These are incompatible types - compiler prevents mixing them up
//! let user_id: UserId = UserId::new();
//! let listing_id: ListingId = ListingId::new();
//!
//! // This would be a compile error:
//! // let wrong: ListingId = user_id;
//! ```

// Re-export the core Id type and version markers
pub use super::id::{Id, V4, V7};

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for User entities (marketplace members).
pub struct User;

/// Marker type for Listing entities (skill offers/requests).
pub struct Listing;

/// Marker type for Conversation entities (one per participant-pair + listing).
pub struct Conversation;

/// Marker type for Message entities.
pub struct Message;

/// Marker type for SavedFilter entities (saved-search predicates).
pub struct SavedFilter;

/// Marker type for MessageReport entities.
pub struct MessageReport;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for User entities.
pub type UserId = Id<User>;

/// Typed ID for Listing entities.
pub type ListingId = Id<Listing>;

/// Typed ID for Conversation entities.
pub type ConversationId = Id<Conversation>;

/// Typed ID for Message entities.
pub type MessageId = Id<Message>;

/// Typed ID for SavedFilter entities.
pub type FilterId = Id<SavedFilter>;

/// Typed ID for MessageReport entities.
pub type ReportId = Id<MessageReport>;
