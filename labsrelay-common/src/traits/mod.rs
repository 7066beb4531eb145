// File: labsrelay-common/src/traits/mod.rs
pub mod sink_traits;

pub use sink_traits::{BusPublisher, ObserverRegistry};
