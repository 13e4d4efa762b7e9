//! In-memory registry of event sessions.
//!
//! Every session shares one mail backend. Sessions are handed out as `Arc`s
//! so a request keeps working on its session even if the event is dropped
//! concurrently.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::Duration,
};

use wichtel_core::EventId;
use wichtel_mail::{BatchSender, EventSession, MailBackend};

/// Thread-safe registry of active events.
#[derive(Debug)]
pub struct EventPool<B> {
    sessions: RwLock<HashMap<EventId, Arc<EventSession<B>>>>,
    sender: BatchSender<B>,
}

impl<B: MailBackend> EventPool<B> {
    /// Create an empty pool whose sessions send through `backend`.
    #[must_use]
    pub fn new(backend: Arc<B>, send_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            sender: BatchSender::with_timeout(backend, send_timeout),
        }
    }

    /// The sender shared by every session.
    #[must_use]
    pub fn sender(&self) -> &BatchSender<B> {
        &self.sender
    }

    /// Register a new event and return its session.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned (a previous thread panicked
    /// while holding the write lock).
    pub fn create(&self) -> Arc<EventSession<B>> {
        let session = Arc::new(EventSession::new(EventId::new(), self.sender.clone()));
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        self.sessions
            .write()
            .expect("event pool write lock poisoned")
            .insert(session.id(), Arc::clone(&session));
        session
    }

    /// Look up an event by ID.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn get(&self, id: EventId) -> Option<Arc<EventSession<B>>> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        self.sessions
            .read()
            .expect("event pool read lock poisoned")
            .get(&id)
            .cloned()
    }

    /// Remove an event by ID. Returns `true` if it existed.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn remove(&self, id: EventId) -> bool {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        self.sessions
            .write()
            .expect("event pool write lock poisoned")
            .remove(&id)
            .is_some()
    }

    /// Number of registered events.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        self.sessions.read().expect("event pool read lock poisoned").len()
    }

    /// Whether no events are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use wichtel_mail::testing::RecordingBackend;

    use super::*;

    fn pool() -> EventPool<RecordingBackend> {
        EventPool::new(Arc::new(RecordingBackend::new()), Duration::from_secs(1))
    }

    #[test]
    fn event_pool_create_and_remove_lifecycle() {
        let pool = pool();
        let id = pool.create().id();
        assert!(pool.get(id).is_some(), "event should exist after create");
        assert_eq!(pool.len(), 1);
        assert!(pool.remove(id), "remove should return true for existing event");
        assert!(pool.get(id).is_none(), "event should not exist after remove");
        assert!(pool.is_empty());
    }

    #[test]
    fn event_pool_unknown_id_is_absent() {
        let pool = pool();
        let unknown = EventId::new();
        assert!(pool.get(unknown).is_none());
        assert!(!pool.remove(unknown), "removing unknown ID should return false");
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let pool = pool();
        let first = pool.create();
        let second = pool.create();
        if let Err(e) = first.add_participant("Alice", "alice@example.com", wichtel_core::HumanCheck::Verified).await {
            panic!("add failed: {e}");
        }
        assert_eq!(first.participants().await.len(), 1);
        assert!(second.participants().await.is_empty());
    }
}
