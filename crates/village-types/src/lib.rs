//! Shared type definitions for the village simulation core.
//!
//! This crate has no behavior of its own: it defines the identifiers,
//! closed enumerations, and data structures every other crate in the
//! workspace depends on, so that `village-world`, `village-memory`,
//! `village-goals`, `village-actions`, `village-events`, `village-llm`,
//! and `village-core` all speak the same vocabulary.

pub mod actions;
pub mod enums;
pub mod ids;
pub mod perception;
pub mod structs;

pub use actions::{ActionParameters, ActionRequest, ActionResult};
pub use enums::{
    ActionCategory, ActionType, AgentActivityState, EventType, GoalCategory, GoalStatus, GoalType,
    MemoryKind, RejectionReason, RelationshipType, Season,
};
pub use ids::{AgentId, EventId, GoalId, LocationId};
pub use perception::Perception;
pub use structs::{
    clamp_f64, clamp_i32, Agent, Clock, Event, Goal, Location, Memory, Mood, Needs, Personality,
    Relationship, RELATIONSHIP_HISTORY_CAP,
};
