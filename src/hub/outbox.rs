use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;

use super::events::Event;

/// What to do when a session's outbox is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Refuse the incoming event, keeping what is already queued.
    #[default]
    DropNew,
    /// Evict the oldest queued event to make room.
    DropOldest,
}

/// Bounded outbound queue for one session. Any task may push; only the
/// session's writer pops. Overflow never blocks the pusher: it drops per the
/// configured policy and counts the loss.
#[derive(Debug)]
pub struct Outbox {
    queue: Mutex<VecDeque<Event>>,
    capacity: usize,
    policy: OverflowPolicy,
    notify: Notify,
    dropped: AtomicU64,
}

impl Outbox {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
            policy,
            notify: Notify::new(),
            dropped: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Event>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Enqueue an event. Returns `false` when the event was refused under
    /// `DropNew`; eviction under `DropOldest` still returns `true`.
    pub fn push(&self, event: Event) -> bool {
        {
            let mut queue = self.lock();
            if queue.len() >= self.capacity {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                match self.policy {
                    OverflowPolicy::DropNew => return false,
                    OverflowPolicy::DropOldest => {
                        queue.pop_front();
                    }
                }
            }
            queue.push_back(event);
        }
        self.notify.notify_one();
        true
    }

    /// Wait for the next queued event. Cancellation-safe: an event is only
    /// removed from the queue when this future resolves.
    pub async fn pop(&self) -> Event {
        loop {
            if let Some(event) = self.lock().pop_front() {
                return event;
            }
            self.notify.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of events lost to overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
