// Conversation history storage
//
// Handlers only see the `ConversationStore` trait, so a persistent backend
// (Redis, a database) can replace the in-memory map without touching routes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::Result;
use crate::providers::Message;

mod memory;

pub use memory::InMemoryConversationStore;

/// Append-only message history keyed by session id
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// All messages appended under `session_id`, in append order
    ///
    /// Unknown ids yield an empty history, not an error.
    async fn get(&self, session_id: &str) -> Result<Vec<Message>>;

    /// Append `messages` in order, creating the session if needed
    ///
    /// The whole batch is applied as one step; concurrent appends to the same
    /// session never interleave within a batch.
    async fn append(&self, session_id: &str, messages: &[Message]) -> Result<()>;

    /// Remove the session and its history (no-op for unknown ids)
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Number of live sessions, for stores that can count cheaply
    async fn session_count(&self) -> Option<usize> {
        None
    }
}

/// Fresh opaque session id
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}
