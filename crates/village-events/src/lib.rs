//! The Event Bus: a process-wide pub/sub hub with bounded history.
//!
//! One [`EventBus`] instance is shared by the tick scheduler, the action
//! executor's callers, and any number of subscribers. `publish` is
//! serialized against itself, so every subscriber observes the same
//! total order; fan-out to each subscriber's queue never blocks the
//! publisher, so one slow or dead subscriber cannot stall the tick loop.

mod bus;

pub use bus::{EventBus, Subscription, SubscriptionId};
