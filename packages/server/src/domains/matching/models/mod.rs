pub mod notification;
pub mod saved_filter;

pub use notification::Notification;
pub use saved_filter::SavedFilter;
