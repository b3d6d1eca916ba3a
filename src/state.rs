use std::sync::Arc;

use crate::bbb::Bbb;
use crate::hub::outbox::OverflowPolicy;
use crate::hub::registry::Registry;
use crate::hub::router::EventRouter;

#[derive(Clone)]
pub struct AppState {
    pub bbb: Arc<Bbb>,
    pub registry: Arc<Registry>,
    pub router: Arc<EventRouter>,
    /// Outbox settings applied to each new session.
    pub outbox_capacity: usize,
    pub overflow: OverflowPolicy,
}
