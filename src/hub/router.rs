use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::bbb::BbbError;
use crate::state::AppState;

use super::events::Event;
use super::session::Session;

pub type HandlerResult = Result<(), DispatchError>;

type BoxFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;
type Handler = Box<dyn Fn(AppState, Arc<Session>, Event) -> BoxFuture + Send + Sync>;

#[derive(Debug)]
pub enum DispatchError {
    /// No handler registered for the inbound event name.
    HandlerNotFound(String),
    /// A handler's required payload field was absent or not a string.
    MissingField {
        event: &'static str,
        field: &'static str,
    },
    Gateway(BbbError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::HandlerNotFound(name) => {
                write!(f, "event handler '{name}' not found")
            }
            DispatchError::MissingField { event, field } => {
                write!(f, "event '{event}' missing required field '{field}'")
            }
            DispatchError::Gateway(e) => write!(f, "gateway: {e}"),
        }
    }
}

impl From<BbbError> for DispatchError {
    fn from(e: BbbError) -> Self {
        DispatchError::Gateway(e)
    }
}

/// Immutable table mapping event names to handlers. Built once at startup and
/// injected through `AppState`; there is no runtime registration.
pub struct EventRouter {
    handlers: HashMap<&'static str, Handler>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for an event name, builder-style.
    pub fn on<F, Fut>(mut self, name: &'static str, handler: F) -> Self
    where
        F: Fn(AppState, Arc<Session>, Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handlers.insert(
            name,
            Box::new(move |state, session, event| Box::pin(handler(state, session, event))),
        );
        self
    }

    /// Single lookup of the event name; unknown names fail without side
    /// effects, handler errors propagate to the caller.
    pub async fn dispatch(
        &self,
        state: AppState,
        session: Arc<Session>,
        event: Event,
    ) -> HandlerResult {
        match self.handlers.get(event.event.as_str()) {
            Some(handler) => handler(state, session, event).await,
            None => Err(DispatchError::HandlerNotFound(event.event)),
        }
    }

    pub fn handles(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}
