use std::net::SocketAddr;

use super::events::Event;
use super::outbox::{Outbox, OverflowPolicy};

/// One client connection: its identity, remote address, and outbound queue.
/// Created on accept, registered immediately, discarded on disconnect; never
/// reused. The reader/writer loops live in `hub::handle_socket`.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub addr: SocketAddr,
    pub outbox: Outbox,
}

impl Session {
    pub fn new(addr: SocketAddr, capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            addr,
            outbox: Outbox::new(capacity, policy),
        }
    }

    /// Enqueue an event for this session's writer. Overflow is a recorded,
    /// non-fatal delivery loss.
    pub fn send(&self, event: Event) -> bool {
        let name = event.event.clone();
        let delivered = self.outbox.push(event);
        if !delivered {
            tracing::warn!(session = %self.id, event = %name, "outbox full, event dropped");
        }
        delivered
    }
}
