// File: labsrelay-common/src/models/mod.rs
pub mod platform;
pub mod envelope;
pub mod canonical;
pub mod channel;

pub use platform::Platform;
pub use envelope::{EventKind, RawEnvelope};
pub use canonical::{
    Amount, BitsOrSuperchat, CanonicalMessage, CharityDonation, Donation, Follow, Host, Raid,
    Streamlabels, Subscription, TypeEnvelope,
};
pub use channel::{Channel, Payload, PublishInstruction};
