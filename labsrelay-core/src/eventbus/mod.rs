//! src/eventbus/mod.rs
//!
//! In-process message bus. Every subscriber gets its own unbounded MPSC
//! queue, so publishing from the synchronous relay never blocks or drops.

use std::sync::Arc;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::trace;

use labsrelay_common::models::Payload;
use labsrelay_common::traits::BusPublisher;
use crate::Error;

/// What consumers receive from the bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusMessage {
    pub channel: String,
    pub payload: Value,
    pub received_at: DateTime<Utc>,
}

/// Subscribers whose receiver was dropped are pruned on the next publish.
#[derive(Clone)]
pub struct MessageBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<BusMessage>>>>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    pub shutdown_rx: watch::Receiver<bool>,
}

impl MessageBus {
    /// Create a new, empty message bus.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: Arc::new(tx),
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Returns a receiver on which every later message will be delivered.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<BusMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Publish an already-serialized payload to all subscribers.
    pub fn publish_value(&self, channel: &str, payload: Value) -> Result<(), Error> {
        if self.is_shutdown() {
            return Err(Error::publish(channel, "message bus is shut down"));
        }

        let message = BusMessage {
            channel: channel.to_string(),
            payload,
            received_at: Utc::now(),
        };

        let mut subs = self.subscribers.lock();
        subs.retain(|s| s.send(message.clone()).is_ok());
        trace!("bus: {} delivered to {} subscriber(s)", channel, subs.len());
        Ok(())
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BusPublisher for MessageBus {
    fn publish(&self, channel: &str, payload: &Payload) -> Result<(), Error> {
        let value = payload
            .to_value()
            .map_err(|e| Error::publish(channel, e.to_string()))?;
        self.publish_value(channel, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscribers_receive_messages() {
        let bus = MessageBus::new();

        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish("rawEvent", &Payload::Raw(json!({ "type": "foo" }))).unwrap();

        let msg1 = rx1.recv().await.expect("rx1 should get message");
        let msg2 = rx2.recv().await.expect("rx2 should get message");

        assert_eq!(msg1.channel, "rawEvent");
        assert_eq!(msg1.payload, json!({ "type": "foo" }));
        assert_eq!(msg1, msg2);
    }

    #[tokio::test]
    async fn test_order_is_preserved() {
        let bus = MessageBus::new();
        let mut rx = bus.subscribe();

        for i in 0..5 {
            bus.publish_value("streamlabels", json!({ "n": i })).unwrap();
        }
        for i in 0..5 {
            let msg = rx.recv().await.unwrap();
            assert_eq!(msg.payload, json!({ "n": i }));
        }
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let bus = MessageBus::new();
        let rx = bus.subscribe();
        let _keep = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(rx);
        bus.publish_value("donation", json!({})).unwrap();
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let bus = MessageBus::new();
        assert!(bus.publish_value("twitch-event", json!({ "type": "raid" })).is_ok());
    }

    #[test]
    fn test_publish_after_shutdown_fails() {
        let bus = MessageBus::new();
        bus.shutdown();
        assert!(bus.is_shutdown());
        let err = bus.publish_value("donation", json!({})).unwrap_err();
        assert!(matches!(err, Error::Publish { .. }));
    }
}
