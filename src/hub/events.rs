use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire message exchanged with clients, identical in both directions: a name
/// plus a JSON object payload, one message per websocket text frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub event: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Event {
    pub fn new(event: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Build an event from a `serde_json::json!` object literal. Non-object
    /// values become an empty payload.
    pub fn with(event: impl Into<String>, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(event, data)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}
