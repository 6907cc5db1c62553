//! The three-tier Memory Store for the village simulation core.
//!
//! Every agent owns one [`MemoryStore`]. Writes route to a tier by
//! `kind`; each tier is capped and evicts lowest-significance-then-oldest
//! on overflow; an end-of-day [`MemoryStore::compress`] pass folds the
//! working tier into a `recent` summary and a handful of `longterm`
//! facts, using an injected [`Summarizer`] when one is available and a
//! deterministic fallback otherwise.

pub mod significance;
pub mod store;

pub use significance::{compute_significance, decay_significance, MemoryEventCategory, SignificanceInput};
pub use store::{CompressionRecord, MemoryCaps, MemoryStore, Summarizer};
