// Suricata eve event models and their mapping to dashboard alerts
use super::alert::AlertItem;
use serde::Deserialize;
use serde_json::Value;

/// A single record from Suricata's eve log. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EveEvent {
    pub timestamp: Option<String>,
    pub event_type: Option<String>,
    pub src_ip: Option<String>,
    pub src_port: Option<u16>,
    pub dest_ip: Option<String>,
    pub dest_port: Option<u16>,
    pub alert: Option<EveAlert>,
    pub message: Option<String>,
    pub level: Option<String>,
    pub engine: Option<EveEngine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EveAlert {
    pub signature: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EveEngine {
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAlert {
    pub timestamp: Option<String>,
    pub alert_type: Option<String>,
    pub signature: Option<String>,
    pub source_ip: Option<String>,
    pub destination_ip: Option<String>,
    pub source_port: Option<u16>,
    pub destination_port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLog {
    pub timestamp: Option<String>,
    pub message: String,
    pub level: Option<String>,
}

/// What an eve record means for the dashboard
#[derive(Debug, Clone, PartialEq)]
pub enum EveRecord {
    Alert(ParsedAlert),
    Log(ParsedLog),
}

impl EveEvent {
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    /// Classify the record. Flow, dns, stats and other telemetry yield `None`.
    pub fn classify(self) -> Option<EveRecord> {
        if self.event_type.as_deref() == Some("alert") || self.alert.is_some() {
            let alert = self.alert.unwrap_or_default();
            return Some(EveRecord::Alert(ParsedAlert {
                timestamp: self.timestamp,
                alert_type: alert.category,
                signature: alert.signature,
                source_ip: self.src_ip,
                destination_ip: self.dest_ip,
                source_port: self.src_port,
                destination_port: self.dest_port,
            }));
        }

        let message = self
            .message
            .or_else(|| self.engine.and_then(|e| e.message))?;

        Some(EveRecord::Log(ParsedLog {
            timestamp: self.timestamp,
            message,
            level: self.level,
        }))
    }
}

impl ParsedAlert {
    /// "[category] signature src:port -> dst:port", skipping missing parts
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();

        if let Some(category) = self.alert_type.as_deref().filter(|c| !c.is_empty()) {
            parts.push(format!("[{}]", category));
        }
        parts.push(
            self.signature
                .clone()
                .unwrap_or_else(|| "unknown signature".to_string()),
        );

        let source = endpoint(self.source_ip.as_deref(), self.source_port);
        let destination = endpoint(self.destination_ip.as_deref(), self.destination_port);
        match (source, destination) {
            (Some(s), Some(d)) => parts.push(format!("{} -> {}", s, d)),
            (Some(s), None) => parts.push(format!("from {}", s)),
            (None, Some(d)) => parts.push(format!("to {}", d)),
            (None, None) => {}
        }

        parts.join(" ")
    }
}

impl ParsedLog {
    pub fn describe(&self) -> String {
        match self.level.as_deref().filter(|l| !l.is_empty()) {
            Some(level) => format!("{}: {}", level.to_uppercase(), self.message),
            None => self.message.clone(),
        }
    }
}

fn endpoint(ip: Option<&str>, port: Option<u16>) -> Option<String> {
    match (ip, port) {
        (Some(ip), Some(port)) => Some(format!("{}:{}", ip, port)),
        (Some(ip), None) => Some(ip.to_string()),
        _ => None,
    }
}

impl From<EveRecord> for AlertItem {
    fn from(record: EveRecord) -> Self {
        let (timestamp, message) = match record {
            EveRecord::Alert(alert) => {
                let message = alert.describe();
                (alert.timestamp, message)
            }
            EveRecord::Log(log) => {
                let message = log.describe();
                (log.timestamp, message)
            }
        };
        let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
        AlertItem::new(timestamp, message)
    }
}

/// Map a raw eve JSON value to a dashboard item, if it is one we show
pub fn alert_item_from_eve(value: Value) -> Option<AlertItem> {
    EveEvent::from_value(value)?.classify().map(AlertItem::from)
}
