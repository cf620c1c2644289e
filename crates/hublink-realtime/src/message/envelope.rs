//! Event envelope exchanged with the hub.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One event on the wire: a name plus positional JSON arguments.
///
/// Serialized as `{"event": "BookDevice", "args": [{...}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Event name.
    pub event: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl WireMessage {
    /// Create a new message.
    pub fn new(event: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            event: event.into(),
            args,
        }
    }

    /// Create a message carrying a single argument.
    pub fn single(event: impl Into<String>, arg: Value) -> Self {
        Self::new(event, vec![arg])
    }
}
