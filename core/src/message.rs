use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{ActionName, EventType};

/// Argument maps on the wire are plain JSON objects.
pub type ArgMap = serde_json::Map<String, Value>;

/// Messages the dashboard sends to the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ClientMessage {
    #[serde(rename = "request")]
    Request(ActionRequest),
}

/// One named action invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: ActionName,
    #[serde(default)]
    pub args: ArgMap,
}

impl ActionRequest {
    pub fn new(action: impl Into<ActionName>, args: ArgMap) -> Self {
        Self {
            action: action.into(),
            args,
        }
    }
}

/// Reply to an action invocation. Exactly one of success (`errors` empty)
/// or failure (`errors` non-empty) holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ActionResponse {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Collapse into a single result shape so callers never branch on the
    /// two-field reply themselves.
    pub fn into_result(self) -> Result<Value, ActionError> {
        if self.errors.is_empty() {
            Ok(self.output)
        } else {
            Err(ActionError {
                messages: self.errors,
            })
        }
    }
}

/// The hub executed the action and it failed. Backend messages are carried
/// verbatim.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", .messages.join("; "))]
pub struct ActionError {
    pub messages: Vec<String>,
}

/// Unsolicited event pushed by the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub args: ArgMap,
}
