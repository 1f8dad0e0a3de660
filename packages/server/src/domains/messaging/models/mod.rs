pub mod conversation;
pub mod message;
pub mod report;

pub use conversation::Conversation;
pub use message::{Message, MessageKind};
pub use report::MessageReport;
