//! Closed enumerations shared across the simulation.
//!
//! Every enum here is a closed set: (de)serialization rejects unknown
//! variants rather than coercing them to a default, per the serialization
//! boundary policy in the design notes.

use serde::{Deserialize, Serialize};

/// The full catalog of actions an agent may request.
///
/// `category()` derives the action's category rather than storing it
/// redundantly on each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Move to an adjacent location.
    Move,
    /// Inspect an object or the surroundings.
    Examine,
    /// Pick up an object into inventory.
    Take,
    /// Remove an object from inventory into the location.
    Drop,
    /// Consume or apply an item from inventory.
    Use,
    /// Do nothing this tick.
    Wait,
    /// Enter the sleeping state.
    Sleep,
    /// Perform a bout of productive labor.
    Work,
    /// Open a friendly greeting with another agent.
    Greet,
    /// Speak to another agent.
    Talk,
    /// Ask another agent a question.
    Ask,
    /// Tell another agent a piece of information.
    Tell,
    /// Transfer an item to another agent.
    Give,
    /// Assist another agent with a task.
    Help,
    /// Challenge another agent over a grievance.
    Confront,
    /// Withdraw from another agent.
    Avoid,
    /// Look into a rumor or unexplained event.
    Investigate,
    /// Share information about a third party.
    Gossip,
    /// Plot against another agent.
    Scheme,
    /// Admit wrongdoing to another agent.
    Confess,
    /// Watch events unfold without participating.
    Observe,
}

impl ActionType {
    /// Derive the action's category from its identity.
    #[must_use]
    pub const fn category(self) -> ActionCategory {
        match self {
            Self::Move
            | Self::Examine
            | Self::Take
            | Self::Drop
            | Self::Use
            | Self::Wait
            | Self::Sleep
            | Self::Work
            | Self::Observe => ActionCategory::Solo,
            Self::Greet | Self::Talk | Self::Ask | Self::Tell | Self::Give | Self::Help => {
                ActionCategory::Social
            }
            Self::Confront
            | Self::Avoid
            | Self::Investigate
            | Self::Gossip
            | Self::Scheme
            | Self::Confess => ActionCategory::Special,
        }
    }

    /// Whether this action targets another agent by name.
    #[must_use]
    pub const fn is_agent_directed(self) -> bool {
        matches!(
            self.category(),
            ActionCategory::Social | ActionCategory::Special
        )
    }

    /// Whether this action's event should be routed as `dialogue` rather
    /// than `action` on the event bus (design notes open question d).
    #[must_use]
    pub const fn is_dialogue(self) -> bool {
        matches!(
            self,
            Self::Talk | Self::Ask | Self::Tell | Self::Greet | Self::Gossip
        )
    }
}

/// Derived grouping of [`ActionType`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    /// Acts on the agent or world only, no other agent involved.
    Solo,
    /// Ordinary agent-to-agent interaction.
    Social,
    /// Agent-to-agent interaction with a narrative edge (conflict, intrigue).
    Special,
}

/// Reasons an action may fail precondition validation.
///
/// These never escalate to an `Err` outside the action pipeline; a
/// rejected action simply yields an [`crate::actions::ActionResult`] that
/// carries one of these reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// The agent is asleep and the action is not `Sleep`.
    AgentAsleep,
    /// The destination is not reachable from the agent's current location.
    NoSuchConnection,
    /// The referenced object is not present where required.
    ObjectNotFound,
    /// The referenced agent does not exist or is not co-located.
    AgentNotFound,
    /// The action targets the acting agent itself where that is invalid.
    CannotTargetSelf,
    /// The location has no remaining capacity for the acting agent.
    LocationFull,
    /// The agent does not hold the item required by the action.
    ItemNotHeld,
    /// The action's arguments were missing or malformed.
    MalformedArguments,
}

/// The three memory tiers of the [`crate::Memory`] store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// Most recent, uncompressed memories.
    Working,
    /// Compressed end-of-day summaries, retained for a handful of days.
    Recent,
    /// Long-lived extracted facts.
    Longterm,
}

/// Lifecycle state of a [`crate::Goal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// Currently pursued.
    Active,
    /// Finished successfully.
    Completed,
    /// Finished unsuccessfully, including expiry (reactive goals after 2h,
    /// desire goals after 24h) and failed completion checks.
    Failed,
    /// Dropped for any other reason (e.g. explicit cancellation).
    Abandoned,
}

/// Derived grouping of [`GoalType`] variants, used for prioritization and
/// the one-need-goal-of-each-type conflict rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalCategory {
    /// Arises from an unmet physiological need.
    Need,
    /// Arises from a personality trait above the neutral value.
    Desire,
    /// Arises in direct response to a witnessed event.
    Reactive,
}

/// The closed set of goal types an agent may pursue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    /// Need: reduce hunger by eating.
    Eat,
    /// Need: restore energy by sleeping.
    Sleep,
    /// Need: reduce loneliness by socializing.
    Socialize,
    /// Desire: retaliate against a specific agent.
    SeekRevenge,
    /// Desire: make amends with a specific agent.
    ApologizeTo,
    /// Desire: assist a specific agent.
    HelpFriend,
    /// Desire: pursue a romantic relationship with a specific agent.
    PursueRomance,
    /// Desire: acquire new information.
    SeekKnowledge,
    /// Desire: raise standing among peers.
    GainStatus,
    /// Desire: accumulate possessions.
    BuildWealth,
    /// Desire: produce something of value.
    Create,
    /// Desire: visit unvisited locations.
    Explore,
    /// Reactive: confront a specific agent over a grievance.
    Confront,
    /// Reactive: respond to a specific witnessed event.
    RespondToEvent,
}

impl GoalType {
    /// The fixed category a goal type always belongs to.
    #[must_use]
    pub const fn category(self) -> GoalCategory {
        match self {
            Self::Eat | Self::Sleep | Self::Socialize => GoalCategory::Need,
            Self::Confront | Self::RespondToEvent => GoalCategory::Reactive,
            Self::SeekRevenge
            | Self::ApologizeTo
            | Self::HelpFriend
            | Self::PursueRomance
            | Self::SeekKnowledge
            | Self::GainStatus
            | Self::BuildWealth
            | Self::Create
            | Self::Explore => GoalCategory::Desire,
        }
    }
}

/// Coarse activity state of an agent, gating which actions are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentActivityState {
    /// Available to act.
    Idle,
    /// Mid-action (reserved for future multi-tick actions).
    Busy,
    /// Asleep; only `Sleep` (to wake) is a legal action.
    Sleeping,
}

/// Directed relationship type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// Default tag for a lazily-created relationship with no history.
    Stranger,
    /// Positive, cooperative relationship.
    Friend,
    /// Negative, antagonistic relationship.
    Rival,
    /// Family tie.
    Family,
    /// Romantic interest.
    Romantic,
}

/// The four recurring seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// First season of the year.
    Spring,
    /// Second season of the year.
    Summer,
    /// Third season of the year.
    Autumn,
    /// Fourth season of the year.
    Winter,
}

impl Season {
    /// Cycle through the four seasons in order, `day`-indexed.
    #[must_use]
    pub const fn from_day(day: u64, days_per_season: u64) -> Self {
        let cycle = if days_per_season == 0 {
            0
        } else {
            (day / days_per_season) % 4
        };
        match cycle {
            0 => Self::Spring,
            1 => Self::Summer,
            2 => Self::Autumn,
            _ => Self::Winter,
        }
    }
}

/// The closed set of event types streamed on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// An agent changed location.
    Movement,
    /// Agent-to-agent speech (`talk`, `ask`, `tell`, `greet`, `gossip`).
    Dialogue,
    /// Any other successfully executed action.
    Action,
    /// A relationship score changed.
    Relationship,
    /// A new piece of information entered the world.
    Discovery,
    /// Scheduler/engine lifecycle notice.
    System,
    /// Per-tick heartbeat.
    Tick,
    /// Batched agent position update.
    Positions,
    /// Scheduler health snapshot.
    Health,
    /// LLM usage snapshot.
    LlmUsage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_category_partition_is_exhaustive_and_disjoint() {
        let solo = [
            ActionType::Move,
            ActionType::Examine,
            ActionType::Take,
            ActionType::Drop,
            ActionType::Use,
            ActionType::Wait,
            ActionType::Sleep,
            ActionType::Work,
            ActionType::Observe,
        ];
        let social = [
            ActionType::Greet,
            ActionType::Talk,
            ActionType::Ask,
            ActionType::Tell,
            ActionType::Give,
            ActionType::Help,
        ];
        let special = [
            ActionType::Confront,
            ActionType::Avoid,
            ActionType::Investigate,
            ActionType::Gossip,
            ActionType::Scheme,
            ActionType::Confess,
        ];
        assert_eq!(solo.len() + social.len() + special.len(), 21);
        for a in solo {
            assert_eq!(a.category(), ActionCategory::Solo);
        }
        for a in social {
            assert_eq!(a.category(), ActionCategory::Social);
        }
        for a in special {
            assert_eq!(a.category(), ActionCategory::Special);
        }
    }

    #[test]
    fn dialogue_routing_matches_open_question_d() {
        assert!(ActionType::Talk.is_dialogue());
        assert!(ActionType::Ask.is_dialogue());
        assert!(ActionType::Tell.is_dialogue());
        assert!(ActionType::Greet.is_dialogue());
        assert!(ActionType::Gossip.is_dialogue());
        assert!(!ActionType::Give.is_dialogue());
        assert!(!ActionType::Confront.is_dialogue());
    }

    #[test]
    fn goal_type_category_is_fixed() {
        assert_eq!(GoalType::Eat.category(), GoalCategory::Need);
        assert_eq!(GoalType::SeekRevenge.category(), GoalCategory::Desire);
        assert_eq!(GoalType::Confront.category(), GoalCategory::Reactive);
        assert_eq!(GoalType::RespondToEvent.category(), GoalCategory::Reactive);
    }

    #[test]
    fn season_cycles_every_four_periods() {
        assert_eq!(Season::from_day(0, 30), Season::Spring);
        assert_eq!(Season::from_day(30, 30), Season::Summer);
        assert_eq!(Season::from_day(90, 30), Season::Winter);
        assert_eq!(Season::from_day(120, 30), Season::Spring);
    }

    #[test]
    fn enum_serde_round_trips() {
        let json = serde_json::to_string(&ActionType::Gossip).expect("serialize");
        assert_eq!(json, "\"gossip\"");
        let back: ActionType = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, ActionType::Gossip);
    }
}
