// Alert domain model
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One alert line shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertItem {
    pub timestamp: String,
    pub message: String,
}

impl AlertItem {
    pub fn new(timestamp: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            message: message.into(),
        }
    }

    /// Build an item from an untrusted JSON entry.
    /// Returns `None` unless both `timestamp` and `message` are strings.
    pub fn from_value(value: &Value) -> Option<Self> {
        let timestamp = value.get("timestamp")?.as_str()?;
        let message = value.get("message")?.as_str()?;
        Some(Self::new(timestamp, message))
    }
}
