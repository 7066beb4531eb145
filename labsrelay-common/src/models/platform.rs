// File: labsrelay-common/src/models/platform.rs

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// Streaming service an event originated from, as reported by the `for`
/// field of a feed envelope.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitch,
    #[serde(rename = "youtube")]
    YouTube,
}

impl Platform {
    /// Maps the envelope's `for` hint onto a platform. Anything other than
    /// the two account hints (including a missing hint) is `None`.
    pub fn from_hint(hint: Option<&str>) -> Option<Platform> {
        match hint? {
            "twitch_account" => Some(Platform::Twitch),
            "youtube_account" => Some(Platform::YouTube),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Twitch => write!(f, "twitch"),
            Platform::YouTube => write!(f, "youtube"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "twitch" | "twitch_account" => Ok(Platform::Twitch),
            "youtube" | "youtube_account" => Ok(Platform::YouTube),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_map_to_platforms() {
        assert_eq!(Platform::from_hint(Some("twitch_account")), Some(Platform::Twitch));
        assert_eq!(Platform::from_hint(Some("youtube_account")), Some(Platform::YouTube));
        assert_eq!(Platform::from_hint(Some("mixer_account")), None);
        assert_eq!(Platform::from_hint(Some("twitch")), None);
        assert_eq!(Platform::from_hint(None), None);
    }

    #[test]
    fn display_and_parse_agree() {
        for p in [Platform::Twitch, Platform::YouTube] {
            assert_eq!(p.to_string().parse::<Platform>(), Ok(p));
        }
    }
}
