// File: labsrelay-core/src/relay.rs

use std::sync::Arc;
use serde_json::Value;

use labsrelay_common::models::RawEnvelope;
use labsrelay_common::traits::{BusPublisher, ObserverRegistry};
use crate::dispatcher::Dispatcher;
use crate::normalizer::EventNormalizer;
use crate::Error;

/// Normalizer and dispatcher glued together: the callback the socket
/// runtime invokes once per envelope.
#[derive(Clone)]
pub struct EventRelay {
    normalizer: EventNormalizer,
    dispatcher: Dispatcher,
}

impl EventRelay {
    pub fn new(bus: Arc<dyn BusPublisher>, observers: Arc<dyn ObserverRegistry>) -> Self {
        Self {
            normalizer: EventNormalizer::new(),
            dispatcher: Dispatcher::new(bus, observers),
        }
    }

    /// Returns how many instructions were published.
    pub fn handle(&self, raw: Value) -> Result<usize, Error> {
        let envelope = RawEnvelope::from_value(raw);
        let instructions = self.normalizer.normalize(&envelope);
        self.dispatcher.dispatch(&instructions)?;
        Ok(instructions.len())
    }
}
