// Test doubles for the external collaborators.
//
// The in-memory conversation store keeps every gateway operation under one
// mutex, so insert-if-absent is atomic exactly like the SQL upsert it stands
// in for. Mocks record their calls for assertions.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::common::{ConversationId, ListingId, MessageId, ReportId, UserId};
use crate::domains::messaging::error::MessagingError;
use crate::domains::messaging::models::{Conversation, Message, MessageKind, MessageReport};
use crate::domains::messaging::rooms::{PairKey, RoomRouter};
use crate::domains::messaging::store::{ConversationStore, UserRef};
use crate::domains::messaging::ConversationCoordinator;
use crate::kernel::traits::{BlobStore, EmailNotifier};
use crate::kernel::UserHub;

// =============================================================================
// In-memory Persistence Gateway
// =============================================================================

#[derive(Default)]
struct MemoryState {
    users: HashMap<UserId, UserRef>,
    listings: HashSet<ListingId>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    reports: Vec<MessageReport>,
}

#[derive(Clone, Default)]
pub struct MemoryConversationStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user the gateway knows about
    pub fn add_user(&self, id: UserId, display_name: &str, email: &str) {
        self.state.lock().unwrap().users.insert(
            id,
            UserRef {
                id,
                display_name: display_name.to_string(),
                email: email.to_string(),
            },
        );
    }

    /// Register a listing the gateway knows about
    pub fn add_listing(&self, id: ListingId) {
        self.state.lock().unwrap().listings.insert(id);
    }

    pub fn conversation_count(&self) -> usize {
        self.state.lock().unwrap().conversations.len()
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.state.lock().unwrap().conversations.clone()
    }

    pub fn message_count(&self) -> usize {
        self.state.lock().unwrap().messages.len()
    }

    pub fn report_count(&self) -> usize {
        self.state.lock().unwrap().reports.len()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn find_user(&self, id: UserId) -> Result<Option<UserRef>, MessagingError> {
        Ok(self.state.lock().unwrap().users.get(&id).cloned())
    }

    async fn listing_exists(&self, id: ListingId) -> Result<bool, MessagingError> {
        Ok(self.state.lock().unwrap().listings.contains(&id))
    }

    async fn find_conversation(
        &self,
        pair: &PairKey,
        listing_id: ListingId,
    ) -> Result<Option<Conversation>, MessagingError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .conversations
            .iter()
            .find(|c| c.pair() == *pair && c.listing_id == listing_id)
            .cloned())
    }

    async fn insert_conversation_if_absent(
        &self,
        pair: &PairKey,
        listing_id: ListingId,
    ) -> Result<Option<Conversation>, MessagingError> {
        let mut state = self.state.lock().unwrap();
        if state
            .conversations
            .iter()
            .any(|c| c.pair() == *pair && c.listing_id == listing_id)
        {
            return Ok(None);
        }

        let conversation = Conversation {
            id: ConversationId::new(),
            participant_low: pair.low(),
            participant_high: pair.high(),
            listing_id,
            last_message_id: None,
            created_at: Utc::now(),
        };
        state.conversations.push(conversation.clone());
        Ok(Some(conversation))
    }

    async fn find_conversation_by_id(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, MessagingError> {
        let state = self.state.lock().unwrap();
        Ok(state.conversations.iter().find(|c| c.id == id).cloned())
    }

    async fn append_message(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        kind: MessageKind,
        content: String,
    ) -> Result<Message, MessagingError> {
        let mut state = self.state.lock().unwrap();
        let sequence = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .count() as i32
            + 1;

        let message = Message {
            id: MessageId::new(),
            conversation_id,
            sender_id,
            kind: kind.to_string(),
            content,
            sequence_number: sequence,
            deleted: false,
            created_at: Utc::now(),
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn set_last_message(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
    ) -> Result<(), MessagingError> {
        let mut state = self.state.lock().unwrap();
        match state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            Some(conversation) => {
                conversation.last_message_id = Some(message_id);
                Ok(())
            }
            None => Err(MessagingError::ConversationNotFound),
        }
    }

    async fn messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, MessagingError> {
        let state = self.state.lock().unwrap();
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id && !m.deleted)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.sequence_number);
        Ok(messages)
    }

    async fn report_message(
        &self,
        message_id: MessageId,
        reporter_id: UserId,
        reason: String,
    ) -> Result<MessageReport, MessagingError> {
        let mut state = self.state.lock().unwrap();
        if !state.messages.iter().any(|m| m.id == message_id) {
            return Err(MessagingError::MessageNotFound);
        }
        if state
            .reports
            .iter()
            .any(|r| r.message_id == message_id && r.reporter_id == reporter_id)
        {
            return Err(MessagingError::DuplicateReport);
        }

        let report = MessageReport {
            id: ReportId::new(),
            message_id,
            reporter_id,
            reason,
            created_at: Utc::now(),
        };
        state.reports.push(report.clone());
        Ok(report)
    }
}

// =============================================================================
// Mock Email Notifier
// =============================================================================

pub struct MockEmailNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

impl MockEmailNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    /// A notifier whose every send fails - for the swallow-and-log path
    pub fn failing() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    /// All (recipient, sender_name) pairs that were sent
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Default for MockEmailNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailNotifier for MockEmailNotifier {
    async fn notify_new_message(&self, to: &str, sender_name: &str) -> Result<()> {
        if self.fail {
            return Err(anyhow!("email provider unavailable"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), sender_name.to_string()));
        Ok(())
    }
}

// =============================================================================
// Mock Blob Store
// =============================================================================

pub struct MockBlobStore {
    stored: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self {
            stored: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// All (filename, byte length) pairs that were stored
    pub fn stored(&self) -> Vec<(String, usize)> {
        self.stored.lock().unwrap().clone()
    }
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        self.stored
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes.len()));
        Ok(format!("/uploads/{}", filename))
    }
}

// =============================================================================
// TestDependencies - harness for coordinator/session tests
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub store: Arc<MemoryConversationStore>,
    pub email: Arc<MockEmailNotifier>,
    pub blobs: Arc<MockBlobStore>,
    pub rooms: RoomRouter,
    pub hub: UserHub,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryConversationStore::new()),
            email: Arc::new(MockEmailNotifier::new()),
            blobs: Arc::new(MockBlobStore::new()),
            rooms: RoomRouter::new(),
            hub: UserHub::new(),
        }
    }

    /// Swap in a failing email notifier
    pub fn failing_email(mut self) -> Self {
        self.email = Arc::new(MockEmailNotifier::failing());
        self
    }

    /// Register a user and return its ID
    pub fn user(&self, display_name: &str) -> UserId {
        let id = UserId::new();
        self.store
            .add_user(id, display_name, &format!("{}@example.org", display_name));
        id
    }

    /// Register a listing and return its ID
    pub fn listing(&self) -> ListingId {
        let id = ListingId::new();
        self.store.add_listing(id);
        id
    }

    /// Build a coordinator wired to these dependencies
    pub fn coordinator(&self) -> ConversationCoordinator {
        ConversationCoordinator::new(
            self.store.clone(),
            self.rooms.clone(),
            self.hub.clone(),
            self.email.clone(),
            self.blobs.clone(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
