// Users domain - the minimal member directory the delivery core consumes.
//
// Profile CRUD is external; the core needs existence checks, display names for
// delivery events, and email addresses for the out-of-band notifier.

pub mod models;

pub use models::User;
