// Matching domain - saved-search evaluation and alert dispatch.
//
// The engine is a pure predicate over (listing, filter); the dispatcher is the
// only producer-side trigger, invoked when a listing is created.

pub mod dispatcher;
pub mod engine;
pub mod models;

pub use dispatcher::NotificationDispatcher;
pub use engine::matches;
pub use models::{Notification, SavedFilter};
