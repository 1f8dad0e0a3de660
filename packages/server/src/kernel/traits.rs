// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. The messaging
// coordinator consumes them for its out-of-band side effects; test doubles
// live in kernel/test_dependencies.rs.

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Email Notifier Trait (Infrastructure - out-of-band notifications)
// =============================================================================

/// Best-effort email side-channel. Failures are logged and swallowed by the
/// caller; a send must never roll back the message path.
#[async_trait]
pub trait EmailNotifier: Send + Sync {
    /// Notify `to` that `sender_name` sent them a new private message
    async fn notify_new_message(&self, to: &str, sender_name: &str) -> Result<()>;
}

// =============================================================================
// Blob Store Trait (Infrastructure - file-message attachments)
// =============================================================================

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a binary payload under a filename; returns a retrievable path/URL
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String>;
}
