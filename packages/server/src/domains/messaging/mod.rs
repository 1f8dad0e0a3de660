// Messaging domain - the two-party private channel.
//
// A conversation is pinned to (participant pair, listing); the room key is the
// derived in-memory twin of that pair. The coordinator owns the send path;
// persistence goes through the ConversationStore contract.

pub mod coordinator;
pub mod error;
pub mod models;
pub mod rooms;
pub mod session;
pub mod store;

pub use coordinator::ConversationCoordinator;
pub use error::MessagingError;
pub use models::{Conversation, Message, MessageKind, MessageReport};
pub use rooms::{room_key, PairKey, RoomRouter};
pub use session::{ChatSession, ClientCommand};
pub use store::{ConversationStore, PgConversationStore, UserRef};
