//! The Deep Tree Echo cognitive event bus.
//!
//! Typed publish/subscribe with bounded, per-subscriber fan-out. This is
//! the sole cross-module coupling in the system: no module holds a direct
//! reference to another module's internals.

pub mod bus;
pub mod event;

pub use bus::{EventBus, EventHandler, SubscriptionToken};
pub use event::{Event, EventPayload, EventType};
