// File: labsrelay-core/src/dispatcher.rs

use std::sync::Arc;
use tracing::trace;

use labsrelay_common::models::PublishInstruction;
use labsrelay_common::traits::{BusPublisher, ObserverRegistry};
use crate::Error;

/// Fans every instruction out to the message bus and then to the local
/// observers, under the same channel name, in the order given.
#[derive(Clone)]
pub struct Dispatcher {
    bus: Arc<dyn BusPublisher>,
    observers: Arc<dyn ObserverRegistry>,
}

impl Dispatcher {
    pub fn new(bus: Arc<dyn BusPublisher>, observers: Arc<dyn ObserverRegistry>) -> Self {
        Self { bus, observers }
    }

    /// Stops at the first sink error; instructions after it are not published.
    pub fn dispatch(&self, instructions: &[PublishInstruction]) -> Result<(), Error> {
        for instruction in instructions {
            let channel = instruction.channel.as_str();
            trace!("dispatching on {}", channel);
            self.bus.publish(channel, &instruction.payload)?;
            self.observers.emit(channel, &instruction.payload)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labsrelay_common::models::{Channel, Payload};
    use mockall::{mock, predicate, Sequence};
    use serde_json::json;

    mock! {
        Bus {}
        impl BusPublisher for Bus {
            fn publish(&self, channel: &str, payload: &Payload) -> Result<(), Error>;
        }
    }

    mock! {
        Observers {}
        impl ObserverRegistry for Observers {
            fn emit(&self, channel: &str, payload: &Payload) -> Result<(), Error>;
        }
    }

    fn instructions() -> Vec<PublishInstruction> {
        vec![
            PublishInstruction::raw(json!({ "type": "foo" })),
            PublishInstruction::new(Channel::Streamlabels, Payload::Raw(json!({ "id": null }))),
        ]
    }

    #[test]
    fn publishes_bus_then_observers_in_order() {
        let mut seq = Sequence::new();
        let mut bus = MockBus::new();
        let mut observers = MockObservers::new();

        for name in ["rawEvent", "streamlabels"] {
            bus.expect_publish()
                .with(predicate::eq(name), predicate::always())
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
            observers
                .expect_emit()
                .with(predicate::eq(name), predicate::always())
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }

        let dispatcher = Dispatcher::new(Arc::new(bus), Arc::new(observers));
        dispatcher.dispatch(&instructions()).unwrap();
    }

    #[test]
    fn bus_failure_stops_dispatch() {
        let mut bus = MockBus::new();
        let mut observers = MockObservers::new();

        bus.expect_publish()
            .times(1)
            .returning(|channel, _| Err(Error::publish(channel, "bus down")));
        observers.expect_emit().times(0);

        let dispatcher = Dispatcher::new(Arc::new(bus), Arc::new(observers));
        let err = dispatcher.dispatch(&instructions()).unwrap_err();
        assert!(matches!(err, Error::Publish { ref channel, .. } if channel == "rawEvent"));
    }

    #[test]
    fn empty_instruction_list_publishes_nothing() {
        let mut bus = MockBus::new();
        let mut observers = MockObservers::new();
        bus.expect_publish().times(0);
        observers.expect_emit().times(0);

        let dispatcher = Dispatcher::new(Arc::new(bus), Arc::new(observers));
        assert!(dispatcher.dispatch(&[]).is_ok());
    }
}
