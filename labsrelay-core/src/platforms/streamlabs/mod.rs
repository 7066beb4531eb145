// File: labsrelay-core/src/platforms/streamlabs/mod.rs

pub mod frames;
pub mod runtime;

pub use runtime::{StreamlabsSocket, reconnect_delay, socket_url};
