//! Action request/result types exchanged between the Decider, the
//! executor, and the tick scheduler.

use serde::{Deserialize, Serialize};

use crate::enums::{ActionType, RejectionReason};
use crate::ids::AgentId;

/// Free-form arguments attached to an [`ActionRequest`].
///
/// Most actions need at most one target token (a location name, an
/// object name, or another agent's display name); a few (`give`) need a
/// second. Unused fields are simply left `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionParameters {
    /// Primary target: a location, object, or agent name.
    pub target: Option<String>,
    /// Secondary target, e.g. the item name in `give <agent> <item>`.
    pub secondary: Option<String>,
    /// Free-text content for dialogue actions (`talk`, `tell`, `gossip`, ...).
    pub message: Option<String>,
}

/// A request, produced by the Action Decider, for one agent to perform
/// one action this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// The acting agent.
    pub agent_id: AgentId,
    /// The requested action.
    pub action_type: ActionType,
    /// The action's arguments.
    pub parameters: ActionParameters,
}

impl ActionRequest {
    /// Build the always-legal fallback request: `wait`.
    #[must_use]
    pub fn wait(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            action_type: ActionType::Wait,
            parameters: ActionParameters::default(),
        }
    }
}

/// The outcome of executing one [`ActionRequest`] against the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionResult {
    /// The action's preconditions held and its effects were applied.
    Success {
        /// One-line human-readable narration of what happened.
        narration: String,
    },
    /// The action's preconditions failed; the world is unchanged.
    Rejected {
        /// Why the action could not be performed.
        reason: RejectionReason,
    },
}

impl ActionResult {
    /// Whether this result represents a successful action.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
