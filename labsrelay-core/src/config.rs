// File: labsrelay-core/src/config.rs
//
// Relay configuration: the socket token plus socket options, read from a
// JSON file shaped like
//
//     { "socket_token": "...", "socketio": { "reconnect": true, ... } }

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::Error;

pub const DEFAULT_SOCKET_URL: &str = "https://sockets.streamlabs.com";
pub const CONFIG_FILE_NAME: &str = "labsrelay.json";

/// Effective socket options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketOptions {
    /// Reconnect after the connection drops. Default `true`.
    pub reconnect: bool,
    /// Consecutive failed attempts before giving up. `None` retries forever.
    pub reconnection_attempts: Option<u32>,
    /// First reconnect delay; doubles per failed attempt. Default 1000.
    pub reconnection_delay_ms: u64,
    /// Upper bound for the reconnect delay. Default 5000.
    pub reconnection_delay_max_ms: u64,
    /// Connect and handshake timeout. Default 20000.
    pub timeout_ms: u64,
    /// Socket server base URL.
    pub url: String,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            reconnect: true,
            reconnection_attempts: None,
            reconnection_delay_ms: 1000,
            reconnection_delay_max_ms: 5000,
            timeout_ms: 20_000,
            url: DEFAULT_SOCKET_URL.to_string(),
        }
    }
}

/// User-supplied option overrides. Socket.IO client spellings are accepted
/// as aliases.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SocketOptionOverrides {
    #[serde(default, alias = "reconnection")]
    pub reconnect: Option<bool>,
    #[serde(default, alias = "reconnectionAttempts")]
    pub reconnection_attempts: Option<u32>,
    #[serde(default, alias = "reconnectionDelay", alias = "reconnection_delay")]
    pub reconnection_delay_ms: Option<u64>,
    #[serde(default, alias = "reconnectionDelayMax", alias = "reconnection_delay_max")]
    pub reconnection_delay_max_ms: Option<u64>,
    #[serde(default, alias = "timeout")]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub unknown: Map<String, Value>,
}

impl SocketOptions {
    /// Applies every override that is present; everything else keeps its
    /// current value.
    pub fn merge(&self, overrides: &SocketOptionOverrides) -> SocketOptions {
        for key in overrides.unknown.keys() {
            debug!("Ignoring unrecognized socket option '{}'", key);
        }

        SocketOptions {
            reconnect: overrides.reconnect.unwrap_or(self.reconnect),
            reconnection_attempts: overrides
                .reconnection_attempts
                .or(self.reconnection_attempts),
            reconnection_delay_ms: overrides
                .reconnection_delay_ms
                .unwrap_or(self.reconnection_delay_ms),
            reconnection_delay_max_ms: overrides
                .reconnection_delay_max_ms
                .unwrap_or(self.reconnection_delay_max_ms),
            timeout_ms: overrides.timeout_ms.unwrap_or(self.timeout_ms),
            url: overrides.url.clone().unwrap_or_else(|| self.url.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub socket_token: String,
    pub socket: SocketOptions,
}

impl RelayConfig {
    /// Validates a parsed config document. `socket_token` must be a string;
    /// `socketio` is only honored when it is an object.
    pub fn from_value(doc: Value, token_override: Option<String>) -> Result<Self, Error> {
        let socket_token = match token_override {
            Some(token) => token,
            None => match doc.get("socket_token") {
                Some(Value::String(token)) => token.clone(),
                Some(_) => {
                    return Err(Error::Config(
                        "socket_token must be a string".to_string(),
                    ));
                }
                None => {
                    return Err(Error::Config(
                        "no socket_token value present in configuration".to_string(),
                    ));
                }
            },
        };
        if socket_token.trim().is_empty() {
            return Err(Error::Config("socket_token is empty".to_string()));
        }

        let socket = match doc.get("socketio") {
            Some(obj @ Value::Object(_)) => {
                let overrides: SocketOptionOverrides = serde_json::from_value(obj.clone())
                    .map_err(|e| Error::Config(format!("invalid socketio options: {e}")))?;
                SocketOptions::default().merge(&overrides)
            }
            _ => SocketOptions::default(),
        };

        Ok(Self { socket_token, socket })
    }

    pub fn load(path: &Path, token_override: Option<String>) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)?;
        let doc: Value = serde_json::from_str(&raw)?;
        Self::from_value(doc, token_override)
    }

    /// Explicit path if given, else the first default location that exists.
    /// With no file at all a token override alone is enough.
    pub fn resolve(path: Option<&Path>, token_override: Option<String>) -> Result<Self, Error> {
        if let Some(path) = path {
            return Self::load(path, token_override);
        }
        match default_paths().into_iter().find(|p| p.is_file()) {
            Some(found) => {
                debug!("Loading configuration from {}", found.display());
                Self::load(&found, token_override)
            }
            None => Self::from_value(Value::Object(Map::new()), token_override),
        }
    }
}

/// `./labsrelay.json`, then `<config dir>/labsrelay/config.json`.
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("labsrelay").join("config.json"));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn defaults_reconnect() {
        let opts = SocketOptions::default();
        assert!(opts.reconnect);
        assert_eq!(opts.reconnection_attempts, None);
        assert_eq!(opts.url, DEFAULT_SOCKET_URL);
    }

    #[test]
    fn merge_applies_only_present_fields() {
        let overrides: SocketOptionOverrides = serde_json::from_value(json!({
            "reconnection": false,
            "reconnectionDelay": 250,
            "transports": ["websocket"]
        }))
        .unwrap();
        let merged = SocketOptions::default().merge(&overrides);

        assert!(!merged.reconnect);
        assert_eq!(merged.reconnection_delay_ms, 250);
        assert_eq!(merged.reconnection_delay_max_ms, 5000);
        assert_eq!(merged.timeout_ms, 20_000);
        assert!(overrides.unknown.contains_key("transports"));

        let untouched = SocketOptions::default().merge(&SocketOptionOverrides::default());
        assert_eq!(untouched, SocketOptions::default());
    }

    #[test]
    fn config_requires_string_token() {
        let err = RelayConfig::from_value(json!({}), None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = RelayConfig::from_value(json!({ "socket_token": 1234 }), None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = RelayConfig::from_value(json!({ "socket_token": "  " }), None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn token_override_wins() {
        let cfg = RelayConfig::from_value(json!({ "socket_token": "file" }), Some("cli".into()))
            .unwrap();
        assert_eq!(cfg.socket_token, "cli");

        let cfg = RelayConfig::from_value(json!({ "socket_token": 5 }), Some("cli".into()))
            .unwrap();
        assert_eq!(cfg.socket_token, "cli");
    }

    #[test]
    fn non_object_socketio_is_ignored() {
        let cfg = RelayConfig::from_value(
            json!({ "socket_token": "t", "socketio": "reconnect=false" }),
            None,
        )
        .unwrap();
        assert_eq!(cfg.socket, SocketOptions::default());
    }

    #[test]
    fn bad_socketio_types_are_config_errors() {
        let err = RelayConfig::from_value(
            json!({ "socket_token": "t", "socketio": { "reconnect": "yes" } }),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn load_reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "socket_token": "abc", "socketio": {{ "reconnect": false, "timeout": 500 }} }}"#
        )
        .unwrap();

        let cfg = RelayConfig::resolve(Some(file.path()), None).unwrap();
        assert_eq!(cfg.socket_token, "abc");
        assert!(!cfg.socket.reconnect);
        assert_eq!(cfg.socket.timeout_ms, 500);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RelayConfig::load(&dir.path().join("nope.json"), None).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
