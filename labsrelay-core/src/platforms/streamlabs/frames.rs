// File: labsrelay-core/src/platforms/streamlabs/frames.rs
//
// Engine.IO v3 / Socket.IO v2 framing as spoken by the Streamlabs socket.
// A text frame starts with one Engine.IO packet-type digit; type 4 carries a
// Socket.IO packet: type digit, optional `/namespace,`, optional ack id,
// then a JSON body.

use serde::Deserialize;
use serde_json::Value;

use crate::Error;

pub const PING: &str = "2";
pub const PONG: &str = "3";

/// Handshake carried by the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpenHandshake {
    pub sid: String,
    #[serde(rename = "pingInterval")]
    pub ping_interval: u64,
    #[serde(rename = "pingTimeout")]
    pub ping_timeout: u64,
    #[serde(default)]
    pub upgrades: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenHandshake),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect { namespace: Option<String> },
    Disconnect { namespace: Option<String> },
    Event { name: String, data: Value },
    Error(Value),
    /// Acks and binary packets; the feed does not use them.
    Other(char),
}

pub fn decode(frame: &str) -> Result<EnginePacket, Error> {
    let mut chars = frame.chars();
    let kind = chars
        .next()
        .ok_or_else(|| Error::Platform("empty engine.io frame".into()))?;
    let body = chars.as_str();

    match kind {
        '0' => {
            let handshake: OpenHandshake = serde_json::from_str(body)?;
            Ok(EnginePacket::Open(handshake))
        }
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping(body.to_string())),
        '3' => Ok(EnginePacket::Pong(body.to_string())),
        '4' => decode_socket(body).map(EnginePacket::Message),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(Error::Platform(format!(
            "unknown engine.io packet type '{other}'"
        ))),
    }
}

fn decode_socket(packet: &str) -> Result<SocketPacket, Error> {
    let mut chars = packet.chars();
    let kind = chars
        .next()
        .ok_or_else(|| Error::Platform("empty socket.io packet".into()))?;
    let rest = chars.as_str();

    let (namespace, rest) = split_namespace(rest);
    // Event packets may carry an ack id between the namespace and the body.
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());

    match kind {
        '0' => Ok(SocketPacket::Connect { namespace }),
        '1' => Ok(SocketPacket::Disconnect { namespace }),
        '2' => {
            let body: Value = serde_json::from_str(rest)?;
            let Value::Array(mut parts) = body else {
                return Err(Error::Platform("socket.io event body is not an array".into()));
            };
            if parts.is_empty() {
                return Err(Error::Platform("socket.io event without a name".into()));
            }
            let name = match parts.remove(0) {
                Value::String(name) => name,
                other => {
                    return Err(Error::Platform(format!(
                        "socket.io event name is not a string: {other}"
                    )));
                }
            };
            let data = if parts.is_empty() {
                Value::Null
            } else {
                parts.remove(0)
            };
            Ok(SocketPacket::Event { name, data })
        }
        '4' => {
            let body = if rest.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(rest).unwrap_or_else(|_| Value::String(rest.to_string()))
            };
            Ok(SocketPacket::Error(body))
        }
        other => Ok(SocketPacket::Other(other)),
    }
}

fn split_namespace(rest: &str) -> (Option<String>, &str) {
    if !rest.starts_with('/') {
        return (None, rest);
    }
    match rest.find(',') {
        Some(idx) => (Some(rest[..idx].to_string()), &rest[idx + 1..]),
        None => (Some(rest.to_string()), ""),
    }
}
