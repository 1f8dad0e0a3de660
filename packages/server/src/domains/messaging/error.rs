use thiserror::Error;

/// Errors surfaced by the messaging core
#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("User not found")]
    UserNotFound,

    #[error("Listing not found")]
    ListingNotFound,

    #[error("Conversation not found")]
    ConversationNotFound,

    #[error("Message not found")]
    MessageNotFound,

    #[error("Sender and recipient are the same user")]
    SelfMessage,

    #[error("Not a participant of this conversation")]
    NotParticipant,

    #[error("Message already reported by this user")]
    DuplicateReport,

    #[error("Conversation lookup did not converge after retries")]
    CreationRace,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
