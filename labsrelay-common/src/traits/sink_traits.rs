// File: labsrelay-common/src/traits/sink_traits.rs

use crate::error::Error;
use crate::models::channel::Payload;

/// Cross-process delivery (the message bus consumers subscribe to).
#[cfg_attr(test, mockall::automock)]
pub trait BusPublisher: Send + Sync {
    fn publish(&self, channel: &str, payload: &Payload) -> Result<(), Error>;
}

/// In-process delivery to locally registered listeners.
#[cfg_attr(test, mockall::automock)]
pub trait ObserverRegistry: Send + Sync {
    fn emit(&self, channel: &str, payload: &Payload) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn sinks_are_shareable_across_threads() {
        let mut bus = MockBusPublisher::new();
        bus.expect_publish()
            .with(eq("rawEvent"), eq(Payload::Raw(json!({ "type": "raid" }))))
            .times(1)
            .returning(|_, _| Ok(()));
        let bus: Arc<dyn BusPublisher> = Arc::new(bus);

        let worker = {
            let bus = bus.clone();
            let payload = Payload::Raw(json!({ "type": "raid" }));
            std::thread::spawn(move || bus.publish("rawEvent", &payload))
        };
        assert!(worker.join().unwrap().is_ok());
    }

    #[test]
    fn observer_errors_surface_to_the_caller() {
        let mut observers = MockObserverRegistry::new();
        observers
            .expect_emit()
            .returning(|channel, _| Err(Error::publish(channel, "listener panicked")));
        let observers: Arc<dyn ObserverRegistry> = Arc::new(observers);

        let err = observers
            .emit("donation", &Payload::Raw(json!(null)))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Publish error on channel 'donation': listener panicked"
        );
    }
}
