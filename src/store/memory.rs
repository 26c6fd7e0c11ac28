// In-memory conversation store
//
// History lives for the lifetime of the process and is never evicted.

use async_trait::async_trait;
use dashmap::DashMap;

use super::ConversationStore;
use crate::errors::Result;
use crate::providers::Message;

/// Concurrent session map backed by DashMap
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    sessions: DashMap<String, Vec<Message>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, session_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .sessions
            .get(session_id)
            .map(|history| history.value().clone())
            .unwrap_or_default())
    }

    async fn append(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        // The entry guard holds the shard lock for the whole extend
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .extend_from_slice(messages);

        tracing::debug!(session_id, appended = messages.len(), "Appended to session");
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        if self.sessions.remove(session_id).is_some() {
            tracing::debug!(session_id, "Deleted session");
        }
        Ok(())
    }

    async fn session_count(&self) -> Option<usize> {
        Some(self.sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::new_session_id;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_unknown_session_is_empty() {
        let store = InMemoryConversationStore::new();
        assert!(store.get("never-used").await.unwrap().is_empty());
        assert_eq!(store.session_count().await, Some(0));
    }

    #[tokio::test]
    async fn test_appends_accumulate_in_order() {
        let store = InMemoryConversationStore::new();
        let m1 = Message::user("one");
        let m2 = Message::assistant("two");
        let m3 = Message::user("one");

        store.append("s", &[m1.clone(), m2.clone()]).await.unwrap();
        store.append("s", &[m3.clone()]).await.unwrap();

        // Duplicates are kept; nothing is reordered
        assert_eq!(store.get("s").await.unwrap(), vec![m1, m2, m3]);
        assert_eq!(store.session_count().await, Some(1));
    }

    #[tokio::test]
    async fn test_get_returns_snapshot() {
        let store = InMemoryConversationStore::new();
        store.append("s", &[Message::user("a")]).await.unwrap();

        let mut snapshot = store.get("s").await.unwrap();
        snapshot.push(Message::user("local only"));

        assert_eq!(store.get("s").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryConversationStore::new();
        store.append("s", &[Message::user("a")]).await.unwrap();

        store.delete("s").await.unwrap();
        assert!(store.get("s").await.unwrap().is_empty());

        store.delete("s").await.unwrap();
        store.delete("never-used").await.unwrap();
        assert!(store.get("never-used").await.unwrap().is_empty());
        assert_eq!(store.session_count().await, Some(0));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemoryConversationStore::new();
        store.append("a", &[Message::user("for a")]).await.unwrap();
        store.append("b", &[Message::user("for b")]).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), vec![Message::user("for a")]);
        assert_eq!(store.get("b").await.unwrap(), vec![Message::user("for b")]);
    }

    #[tokio::test]
    async fn test_concurrent_batches_stay_contiguous() {
        let store = Arc::new(InMemoryConversationStore::new());
        let mut handles = Vec::new();

        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let batch = [
                    Message::user(format!("q{}", i)),
                    Message::assistant(format!("a{}", i)),
                ];
                store.append("shared", &batch).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let history = store.get("shared").await.unwrap();
        assert_eq!(history.len(), 32);
        for pair in history.chunks(2) {
            let q = pair[0].content.trim_start_matches('q');
            let a = pair[1].content.trim_start_matches('a');
            assert_eq!(q, a);
        }
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
