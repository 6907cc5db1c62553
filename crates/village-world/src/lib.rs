//! The World State Store for the village simulation core.
//!
//! This crate owns every entity the simulation mutates in place: agents,
//! locations, relationships, and the world clock. It exposes the
//! mutators named in the component design (`move_agent`, `set_state`,
//! `adjust_need`, `upsert_relationship`, `add_item`, `remove_item`,
//! `advance_time`) behind a single read/write lock, and the wake/sleep
//! transition sweeps the tick scheduler drives once per tick.
//!
//! # Modules
//!
//! - [`clock`] -- Time advancement and the wake/sleep window predicates.
//! - [`error`] -- Error types for world-state operations.
//! - [`store`] -- [`WorldState`] (the aggregate) and [`WorldStore`] (the
//!   lock-guarded handle every other component depends on).

pub mod clock;
pub mod error;
pub mod store;

pub use clock::{advance_time, in_sleep_window, in_wake_window, DAYS_PER_SEASON};
pub use error::WorldError;
pub use store::{NeedKind, WorldState, WorldStore, DEFAULT_NEED_DELTA};
