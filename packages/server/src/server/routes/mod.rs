// HTTP routes

pub mod chat;
pub mod health;
pub mod listings;
pub mod messages;
pub mod stream;

pub use chat::chat_handler;
pub use health::health_handler;
pub use listings::create_listing_handler;
pub use messages::{conversation_messages_handler, report_message_handler};
pub use stream::stream_handler;

use axum::http::{HeaderMap, StatusCode};

use crate::domains::messaging::MessagingError;

/// Extract Bearer token from Authorization header.
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get("authorization")?.to_str().ok()?;
    auth.strip_prefix("Bearer ").map(|t| t.to_string())
}

/// Map a messaging error onto the HTTP surface.
pub(crate) fn status_for(error: &MessagingError) -> StatusCode {
    match error {
        MessagingError::UserNotFound
        | MessagingError::ListingNotFound
        | MessagingError::ConversationNotFound
        | MessagingError::MessageNotFound => StatusCode::NOT_FOUND,
        MessagingError::SelfMessage => StatusCode::BAD_REQUEST,
        MessagingError::NotParticipant => StatusCode::FORBIDDEN,
        MessagingError::DuplicateReport => StatusCode::CONFLICT,
        MessagingError::CreationRace => StatusCode::CONFLICT,
        MessagingError::Database(_) | MessagingError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
