// File: labsrelay-core/src/normalizer/mod.rs
//
// Classifies one feed envelope and turns it into the ordered list of
// publish instructions: `rawEvent` first, then the type/platform specific
// channel, then the generic channel carrying a `TypeEnvelope`.

pub mod fields;

use serde_json::{Map, Number, Value};
use tracing::{debug, error};

use labsrelay_common::models::{
    Amount, BitsOrSuperchat, CanonicalMessage, Channel, CharityDonation, Donation, EventKind,
    Follow, Host, Payload, Platform, PublishInstruction, Raid, RawEnvelope, Streamlabels,
    Subscription, TypeEnvelope,
};

use fields::{
    cast_number, first_truthy, number, number_field, resolve_id, text_fallback, text_field,
    unwrap_message,
};

type Fields = Map<String, Value>;

/// Stateless envelope classifier. Normalizing the same envelope twice
/// yields identical output.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventNormalizer;

impl EventNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, envelope: &RawEnvelope) -> Vec<PublishInstruction> {
        let mut out = vec![PublishInstruction::raw(envelope.raw().clone())];

        let Some(fields) = unwrap_message(&envelope.message) else {
            error!(
                "Event {} had no items in its message property, skipping.",
                envelope.event_id_display()
            );
            return out;
        };

        debug!("New streamlabs event: {}", envelope.event_type);

        out.extend(classify(&envelope.kind(), envelope.platform(), fields));
        out
    }
}

fn classify(
    kind: &EventKind,
    platform: Option<Platform>,
    fields: &Fields,
) -> Vec<PublishInstruction> {
    match (kind, platform) {
        (EventKind::Donation, _) => with_generic(
            Channel::Donation,
            Channel::StreamlabsEvent,
            "donation",
            CanonicalMessage::Donation(donation(fields)),
        ),
        (EventKind::CharityDonation, _) => with_generic(
            Channel::CharityDonation,
            Channel::CharityEvent,
            "streamlabscharitydonation",
            CanonicalMessage::CharityDonation(charity_donation(fields)),
        ),

        (EventKind::Follow, Some(Platform::Twitch)) => with_generic(
            Channel::TwitchFollow,
            Channel::platform_event(Platform::Twitch),
            "follow",
            CanonicalMessage::Follow(follow(fields)),
        ),
        (EventKind::Follow, Some(Platform::YouTube)) => with_generic(
            Channel::YoutubeSubscription,
            Channel::platform_event(Platform::YouTube),
            "follow",
            CanonicalMessage::Follow(follow(fields)),
        ),

        (EventKind::Subscription, Some(Platform::Twitch)) => with_generic(
            Channel::TwitchSubscription,
            Channel::platform_event(Platform::Twitch),
            "subscription",
            CanonicalMessage::Subscription(subscription(fields)),
        ),
        (EventKind::Subscription, Some(Platform::YouTube)) => with_generic(
            Channel::YoutubeSponsor,
            Channel::platform_event(Platform::YouTube),
            "sponsor",
            CanonicalMessage::Subscription(subscription(fields)),
        ),

        (EventKind::Host, Some(Platform::Twitch)) => with_generic(
            Channel::TwitchHost,
            Channel::platform_event(Platform::Twitch),
            "host",
            CanonicalMessage::Host(host(fields)),
        ),

        (EventKind::Bits | EventKind::Superchat, Some(Platform::Twitch)) => with_generic(
            Channel::TwitchBits,
            Channel::platform_event(Platform::Twitch),
            "bits",
            CanonicalMessage::BitsOrSuperchat(bits_or_superchat(fields, Platform::Twitch)),
        ),
        (EventKind::Bits | EventKind::Superchat, Some(Platform::YouTube)) => with_generic(
            Channel::YoutubeSuperchat,
            Channel::platform_event(Platform::YouTube),
            "superchat",
            CanonicalMessage::BitsOrSuperchat(bits_or_superchat(fields, Platform::YouTube)),
        ),

        // Raids carry no platform hint worth checking; the feed only sends them for Twitch.
        (EventKind::Raid, _) => with_generic(
            Channel::TwitchRaid,
            Channel::platform_event(Platform::Twitch),
            "raid",
            CanonicalMessage::Raid(raid(fields)),
        ),

        (EventKind::Streamlabels, _) => vec![PublishInstruction::new(
            Channel::Streamlabels,
            Payload::Message(CanonicalMessage::Streamlabels(streamlabels(fields))),
        )],

        // Platformed types without a known platform, YouTube hosts, and unknown
        // types are only visible on rawEvent.
        (EventKind::Follow | EventKind::Subscription | EventKind::Host, _)
        | (EventKind::Bits | EventKind::Superchat, None)
        | (EventKind::Unknown(_), _) => Vec::new(),
    }
}

fn with_generic(
    specific: Channel,
    generic: Channel,
    event_type: &str,
    message: CanonicalMessage,
) -> Vec<PublishInstruction> {
    let envelope = TypeEnvelope::new(event_type, message.clone());
    vec![
        PublishInstruction::new(specific, Payload::Message(message)),
        PublishInstruction::new(generic, Payload::Typed(envelope)),
    ]
}

fn amount(fields: &Fields) -> Amount {
    Amount {
        amount: number_field(fields, "amount"),
        currency: text_field(fields, "currency"),
    }
}

fn donation(fields: &Fields) -> Donation {
    Donation {
        id: resolve_id(fields),
        name: text_field(fields, "name"),
        amount: amount(fields),
        formatted_amount: text_field(fields, "formatted_amount"),
        message: text_field(fields, "message"),
    }
}

fn charity_donation(fields: &Fields) -> CharityDonation {
    CharityDonation {
        id: resolve_id(fields),
        name: text_field(fields, "from"),
        amount: amount(fields),
        formatted_amount: text_field(fields, "formatted_amount"),
        message: text_field(fields, "message"),
    }
}

fn follow(fields: &Fields) -> Follow {
    Follow {
        id: resolve_id(fields),
        name: text_field(fields, "name"),
        when: text_fallback(fields, &["created_at", "publishedAt"]),
    }
}

fn subscription(fields: &Fields) -> Subscription {
    Subscription {
        id: resolve_id(fields),
        name: text_field(fields, "name"),
        message: text_fallback(fields, &["message"]),
        months: number(first_truthy(fields, &["months"])).unwrap_or_else(|| Number::from(1)),
    }
}

fn host(fields: &Fields) -> Host {
    Host {
        id: resolve_id(fields),
        name: text_field(fields, "name"),
        viewers: cast_number(fields.get("viewers")),
        host_type: text_field(fields, "type"),
    }
}

fn bits_or_superchat(fields: &Fields, platform: Platform) -> BitsOrSuperchat {
    let mut message = BitsOrSuperchat {
        id: resolve_id(fields),
        name: text_field(fields, "name"),
        amount: number_field(fields, "amount"),
        message: text_fallback(fields, &["message", "comment"]),
        currency: None,
        display_string: None,
    };
    if platform == Platform::YouTube {
        message.currency = text_field(fields, "currency");
        message.display_string = text_field(fields, "displayString");
    }
    message
}

fn raid(fields: &Fields) -> Raid {
    Raid {
        id: resolve_id(fields),
        name: text_field(fields, "name"),
        viewers: number_field(fields, "raiders"),
    }
}

fn streamlabels(fields: &Fields) -> Streamlabels {
    let mut copy = fields.clone();
    copy.insert("id".to_string(), resolve_id(fields));
    Streamlabels { fields: copy }
}
