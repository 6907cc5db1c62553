//! Error types for the `village-actions` crate.

use village_types::AgentId;

/// Errors the executor cannot express as an [`village_types::ActionResult::Rejected`]
/// because they indicate the world store itself is in an inconsistent
/// state (an invariant violation, per spec.md §7 kind 4), not an
/// ordinary precondition failure.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The acting agent vanished from the world mid-tick.
    #[error("actor {0} not found in world state")]
    ActorMissing(AgentId),

    /// A world-store operation failed unexpectedly during effect application.
    #[error("world store error: {0}")]
    World(#[from] village_world::WorldError),
}
