// File: labsrelay-core/src/observers.rs

use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use tracing::debug;

use labsrelay_common::models::Payload;
use labsrelay_common::traits::ObserverRegistry;
use crate::Error;

pub type Listener = Arc<dyn Fn(&Payload) + Send + Sync>;
pub type AnyListener = Arc<dyn Fn(&str, &Payload) + Send + Sync>;

/// Local observer registry, keyed by channel name. Registration only ever
/// appends; `emit` reads a snapshot of the listener list, so a listener may
/// register further listeners without deadlocking.
#[derive(Default)]
pub struct LocalObservers {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
    any_listeners: RwLock<Vec<AnyListener>>,
}

impl LocalObservers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen on one channel (`"twitch-follow"`, `Channel::Donation`, ...).
    pub fn on<F>(&self, channel: impl Into<String>, listener: F)
    where
        F: Fn(&Payload) + Send + Sync + 'static,
    {
        let channel = channel.into();
        debug!("Registering observer for channel '{}'", channel);
        self.listeners
            .write()
            .entry(channel)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Listen on every channel. Called after the channel's own listeners.
    pub fn on_any<F>(&self, listener: F)
    where
        F: Fn(&str, &Payload) + Send + Sync + 'static,
    {
        self.any_listeners.write().push(Arc::new(listener));
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.listeners.read().get(channel).map_or(0, Vec::len)
    }
}

impl ObserverRegistry for LocalObservers {
    fn emit(&self, channel: &str, payload: &Payload) -> Result<(), Error> {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .get(channel)
            .cloned()
            .unwrap_or_default();
        let any_listeners: Vec<AnyListener> = self.any_listeners.read().clone();

        for listener in &listeners {
            listener(payload);
        }
        for listener in &any_listeners {
            listener(channel, payload);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labsrelay_common::models::Channel;
    use parking_lot::Mutex;
    use serde_json::json;

    #[test]
    fn listeners_only_see_their_channel() {
        let observers = LocalObservers::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        observers.on(Channel::TwitchFollow.as_str(), move |p| s.lock().push(p.clone()));

        observers.emit("twitch-follow", &Payload::Raw(json!(1))).unwrap();
        observers.emit("youtube-subscription", &Payload::Raw(json!(2))).unwrap();

        assert_eq!(*seen.lock(), vec![Payload::Raw(json!(1))]);
        assert_eq!(observers.listener_count("twitch-follow"), 1);
        assert_eq!(observers.listener_count("youtube-subscription"), 0);
    }

    #[test]
    fn channel_listeners_run_in_order_then_wildcards() {
        let observers = LocalObservers::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o = order.clone();
        observers.on_any(move |channel, _| o.lock().push(format!("any:{channel}")));
        let o = order.clone();
        observers.on("donation", move |_| o.lock().push("first".to_string()));
        let o = order.clone();
        observers.on("donation", move |_| o.lock().push("second".to_string()));

        observers.emit("donation", &Payload::Raw(json!({}))).unwrap();

        assert_eq!(*order.lock(), vec!["first", "second", "any:donation"]);
    }

    #[test]
    fn listener_may_register_during_emit() {
        let observers = Arc::new(LocalObservers::new());
        let inner = observers.clone();
        observers.on("rawEvent", move |_| inner.on("rawEvent", |_| {}));

        observers.emit("rawEvent", &Payload::Raw(json!(null))).unwrap();
        assert_eq!(observers.listener_count("rawEvent"), 2);
    }
}
