// File: labsrelay-common/src/models/canonical.rs
//
// Canonical message shapes published to overlay consumers. Every field a
// shape declares is always serialized (as `null` when the feed did not
// supply it), except the two YouTube-only superchat extras.

use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Money value attached to donations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Amount {
    pub amount: Option<Number>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Donation {
    pub id: Value,
    pub name: Option<String>,
    pub amount: Amount,
    pub formatted_amount: Option<String>,
    pub message: Option<String>,
}

/// Streamlabs Charity donation; `name` comes from the feed's `from` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharityDonation {
    pub id: Value,
    pub name: Option<String>,
    pub amount: Amount,
    pub formatted_amount: Option<String>,
    pub message: Option<String>,
}

/// Twitch follow, or YouTube channel subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Follow {
    pub id: Value,
    pub name: Option<String>,
    pub when: Option<String>,
}

/// Twitch subscription, or YouTube sponsor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subscription {
    pub id: Value,
    pub name: Option<String>,
    pub message: Option<String>,
    pub months: Number,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Host {
    pub id: Value,
    pub name: Option<String>,
    pub viewers: Option<Number>,
    #[serde(rename = "type")]
    pub host_type: Option<String>,
}

/// Twitch bits, or YouTube superchat. `currency` and `display_string` are
/// only filled for YouTube.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BitsOrSuperchat {
    pub id: Value,
    pub name: Option<String>,
    pub amount: Option<Number>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_string: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Raid {
    pub id: Value,
    pub name: Option<String>,
    pub viewers: Option<Number>,
}

/// Label update: every original field, with `id` normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Streamlabels {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A normalized event. Serializes as the bare inner shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CanonicalMessage {
    Donation(Donation),
    CharityDonation(CharityDonation),
    Follow(Follow),
    Subscription(Subscription),
    Host(Host),
    BitsOrSuperchat(BitsOrSuperchat),
    Raid(Raid),
    Streamlabels(Streamlabels),
}

/// Wrapper carried on the platform-generic channels (`twitch-event`,
/// `youtube-event`, `streamlabs-event`, `streamlabscharity-event`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub message: CanonicalMessage,
}

impl TypeEnvelope {
    pub fn new(event_type: impl Into<String>, message: CanonicalMessage) -> Self {
        Self {
            event_type: event_type.into(),
            message,
        }
    }
}
