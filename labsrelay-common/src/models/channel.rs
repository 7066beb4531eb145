// File: labsrelay-common/src/models/channel.rs

use std::fmt;
use std::str::FromStr;
use serde::Serialize;
use serde_json::Value;

use crate::models::canonical::{CanonicalMessage, TypeEnvelope};
use crate::models::platform::Platform;

/// Every channel name the relay publishes on. Consumers subscribe by the
/// string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    RawEvent,
    Donation,
    StreamlabsEvent,
    CharityDonation,
    CharityEvent,
    TwitchFollow,
    TwitchSubscription,
    TwitchHost,
    TwitchBits,
    TwitchRaid,
    TwitchEvent,
    YoutubeSubscription,
    YoutubeSponsor,
    YoutubeSuperchat,
    YoutubeEvent,
    Streamlabels,
}

impl Channel {
    pub const ALL: [Channel; 16] = [
        Channel::RawEvent,
        Channel::Donation,
        Channel::StreamlabsEvent,
        Channel::CharityDonation,
        Channel::CharityEvent,
        Channel::TwitchFollow,
        Channel::TwitchSubscription,
        Channel::TwitchHost,
        Channel::TwitchBits,
        Channel::TwitchRaid,
        Channel::TwitchEvent,
        Channel::YoutubeSubscription,
        Channel::YoutubeSponsor,
        Channel::YoutubeSuperchat,
        Channel::YoutubeEvent,
        Channel::Streamlabels,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::RawEvent => "rawEvent",
            Channel::Donation => "donation",
            Channel::StreamlabsEvent => "streamlabs-event",
            Channel::CharityDonation => "streamlabscharitydonation",
            Channel::CharityEvent => "streamlabscharity-event",
            Channel::TwitchFollow => "twitch-follow",
            Channel::TwitchSubscription => "twitch-subscription",
            Channel::TwitchHost => "twitch-host",
            Channel::TwitchBits => "twitch-bits",
            Channel::TwitchRaid => "twitch-raid",
            Channel::TwitchEvent => "twitch-event",
            Channel::YoutubeSubscription => "youtube-subscription",
            Channel::YoutubeSponsor => "youtube-sponsor",
            Channel::YoutubeSuperchat => "youtube-superchat",
            Channel::YoutubeEvent => "youtube-event",
            Channel::Streamlabels => "streamlabels",
        }
    }

    /// The platform-generic channel (`twitch-event` / `youtube-event`).
    pub fn platform_event(platform: Platform) -> Channel {
        match platform {
            Platform::Twitch => Channel::TwitchEvent,
            Platform::YouTube => Channel::YoutubeEvent,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.as_str().to_string()
    }
}

impl FromStr for Channel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown channel: {}", s))
    }
}

/// What gets published on a channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// The original envelope, untouched.
    Raw(Value),
    Message(CanonicalMessage),
    Typed(TypeEnvelope),
}

impl Payload {
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// One `(channel, payload)` pair produced by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishInstruction {
    pub channel: Channel,
    pub payload: Payload,
}

impl PublishInstruction {
    pub fn new(channel: Channel, payload: Payload) -> Self {
        Self { channel, payload }
    }

    pub fn raw(envelope: Value) -> Self {
        Self::new(Channel::RawEvent, Payload::Raw(envelope))
    }
}
