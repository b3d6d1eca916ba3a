use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use super::events::Event;
use super::session::Session;

/// Thread-safe set of live sessions, keyed by session ID. A session is
/// present here exactly while its reader/writer loops run; delivery is only
/// attempted to registered sessions.
pub struct Registry {
    sessions: DashMap<String, Arc<Session>>,
    dropped: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Idempotent: adding an already-registered session is a no-op.
    pub fn add(&self, session: Arc<Session>) {
        self.sessions.entry(session.id.clone()).or_insert(session);
    }

    /// Idempotent: removing an absent session is a no-op.
    pub fn remove(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.remove(session_id).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Deliver one event to every currently registered session. Sessions
    /// registered after the iteration snapshot do not receive it. A full
    /// outbox never blocks delivery to other sessions; refused events are
    /// counted. Returns how many sessions accepted the event.
    pub fn broadcast(&self, event: &Event) -> usize {
        let mut delivered = 0;
        for entry in self.sessions.iter() {
            if entry.value().send(event.clone()) {
                delivered += 1;
            } else {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
        delivered
    }

    /// Broadcast deliveries refused by a full outbox since startup.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
