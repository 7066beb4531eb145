// ================================================================
// File: labsrelay-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// A sink refused a message for the named channel.
    #[error("Publish error on channel '{channel}': {reason}")]
    Publish { channel: String, reason: String },

    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),
}

impl Error {
    pub fn publish(channel: &str, reason: impl Into<String>) -> Self {
        Error::Publish {
            channel: channel.to_string(),
            reason: reason.into(),
        }
    }
}
