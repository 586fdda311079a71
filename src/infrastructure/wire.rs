// JSON event envelope carried in push-channel text frames
use crate::application::renderer::{ChannelEvent, UpdatePayload};
use crate::domain::alert::AlertItem;
use crate::infrastructure::push_channel::ChannelError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UPDATE_EVENT: &str = "update_data";
pub const GREETING_EVENT: &str = "response";
pub const GREETING_TEXT: &str = "Connected to the server!";

/// `{"event": "<name>", "data": <json>}`
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

pub fn encode_update(items: &[AlertItem]) -> serde_json::Result<String> {
    serde_json::to_string(&serde_json::json!({
        "event": UPDATE_EVENT,
        "data": items,
    }))
}

pub fn encode_greeting() -> serde_json::Result<String> {
    serde_json::to_string(&serde_json::json!({
        "event": GREETING_EVENT,
        "data": { "data": GREETING_TEXT },
    }))
}

/// Decode one text frame into the event the renderer consumes
pub fn decode_frame(text: &str) -> Result<ChannelEvent, ChannelError> {
    let envelope: Envelope = serde_json::from_str(text)?;

    if envelope.event != UPDATE_EVENT {
        return Ok(ChannelEvent::Other {
            event: envelope.event,
        });
    }

    Ok(ChannelEvent::Update(decode_update(envelope.data)))
}

/// Entries that are not `{timestamp, message}` strings are dropped and counted
pub fn decode_update(data: Value) -> UpdatePayload {
    match data {
        Value::Array(entries) => {
            let total = entries.len();
            let items: Vec<AlertItem> = entries.iter().filter_map(AlertItem::from_value).collect();
            let rejected = total - items.len();
            UpdatePayload::Items { items, rejected }
        }
        other => UpdatePayload::Malformed {
            found: json_kind(&other),
        },
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
