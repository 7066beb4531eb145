// src/lib.rs

pub mod normalizer;
pub mod dispatcher;
pub mod relay;
pub mod eventbus;
pub mod observers;
pub mod config;
pub mod platforms;

pub use labsrelay_common::error::Error;
pub use normalizer::EventNormalizer;
pub use dispatcher::Dispatcher;
pub use relay::EventRelay;
pub use eventbus::{BusMessage, MessageBus};
pub use observers::LocalObservers;
pub use config::{RelayConfig, SocketOptionOverrides, SocketOptions};
