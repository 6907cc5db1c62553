//! Error types for the `village-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use village_types::{AgentId, LocationId};

/// Errors that can occur during world-state operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// An agent id was not found in the world state.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// A location was not found in the world graph.
    #[error("location not found: {0}")]
    LocationNotFound(LocationId),

    /// No connection exists between the specified locations.
    #[error("no connection from {from} to {to}")]
    NoConnection {
        /// Origin location.
        from: LocationId,
        /// Destination location.
        to: LocationId,
    },

    /// The location has reached its maximum occupant capacity.
    #[error("location {location} is at capacity ({capacity})")]
    LocationAtCapacity {
        /// The full location.
        location: LocationId,
        /// Maximum capacity.
        capacity: u32,
    },

    /// A duplicate entity was inserted where uniqueness is required.
    #[error("duplicate agent id: {0}")]
    DuplicateAgent(AgentId),

    /// A duplicate location was inserted where uniqueness is required.
    #[error("duplicate location id: {0}")]
    DuplicateLocation(LocationId),

    /// Arithmetic overflow during a checked clock calculation.
    #[error("arithmetic overflow advancing the world clock")]
    ClockOverflow,
}
