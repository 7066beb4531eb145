// File: labsrelay-common/src/models/envelope.rs

use std::fmt;
use serde_json::Value;

use crate::models::platform::Platform;

/// One notification as delivered by the socket feed:
/// `{ "event_id": ..., "type": "...", "for": "...", "message": {...} | [...] }`
///
/// Fields are read leniently; a missing or non-string `type` becomes the
/// empty string and a non-string `for` is treated as absent. The original
/// JSON is kept untouched for the raw passthrough.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEnvelope {
    pub event_id: Option<Value>,
    pub event_type: String,
    pub platform_hint: Option<String>,
    pub message: Value,
    raw: Value,
}

impl RawEnvelope {
    pub fn from_value(raw: Value) -> Self {
        let event_id = raw.get("event_id").filter(|v| !v.is_null()).cloned();
        let event_type = raw
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let platform_hint = raw.get("for").and_then(Value::as_str).map(String::from);
        let message = raw.get("message").cloned().unwrap_or(Value::Null);

        Self {
            event_id,
            event_type,
            platform_hint,
            message,
            raw,
        }
    }

    /// The envelope exactly as received.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn kind(&self) -> EventKind {
        EventKind::classify(&self.event_type)
    }

    pub fn platform(&self) -> Option<Platform> {
        Platform::from_hint(self.platform_hint.as_deref())
    }

    /// Printable event id for log lines.
    pub fn event_id_display(&self) -> String {
        match &self.event_id {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "<none>".to_string(),
        }
    }
}

/// Closed set of feed event types the relay understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Donation,
    CharityDonation,
    Follow,
    Subscription,
    Host,
    Bits,
    Superchat,
    Raid,
    Streamlabels,
    Unknown(String),
}

impl EventKind {
    pub fn classify(event_type: &str) -> EventKind {
        match event_type {
            "donation" => EventKind::Donation,
            "streamlabscharitydonation" => EventKind::CharityDonation,
            "follow" => EventKind::Follow,
            "subscription" => EventKind::Subscription,
            "host" => EventKind::Host,
            "bits" => EventKind::Bits,
            "superchat" => EventKind::Superchat,
            "raid" => EventKind::Raid,
            "streamlabels" => EventKind::Streamlabels,
            other => EventKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Donation => "donation",
            EventKind::CharityDonation => "streamlabscharitydonation",
            EventKind::Follow => "follow",
            EventKind::Subscription => "subscription",
            EventKind::Host => "host",
            EventKind::Bits => "bits",
            EventKind::Superchat => "superchat",
            EventKind::Raid => "raid",
            EventKind::Streamlabels => "streamlabels",
            EventKind::Unknown(other) => other,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
