//! Core data structures: the entities the World State Store owns.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::enums::{AgentActivityState, GoalCategory, GoalStatus, GoalType, RelationshipType};
use crate::ids::{AgentId, GoalId, LocationId};

/// Clamp an `i32` into `[lo, hi]`.
#[must_use]
pub const fn clamp_i32(value: i32, lo: i32, hi: i32) -> i32 {
    if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

/// The eight named personality traits, each an integer in `[1, 10]`,
/// per spec.md §3 and `original_source/backend/src/hamlet/schemas/agent.py`'s
/// `TraitsSchema` (the source this spec distills from).
///
/// Unlike the fractional `[0, 1]` trait scale used elsewhere in this
/// stack, this simulation's agents carry whole-number traits per the
/// data model, so each field is a plain `u8` rather than a
/// `rust_decimal::Decimal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personality {
    /// Drive to explore and learn.
    pub curiosity: u8,
    /// Capacity to understand and share others' feelings.
    pub empathy: u8,
    /// Drive to accumulate standing and possessions.
    pub ambition: u8,
    /// Tendency to hold one's tongue and keep confidences.
    pub discretion: u8,
    /// Baseline vigor independent of the `needs.energy` depletion track.
    pub energy: u8,
    /// Willingness to face danger or conflict.
    pub courage: u8,
    /// Social magnetism; ease at winning others over.
    pub charm: u8,
    /// Acuity at noticing detail and subtext.
    pub perception: u8,
}

impl Personality {
    /// The trait's "desire weight" per spec.md §4.6: `w = (trait - 4) / 6`,
    /// only meaningful for traits above the neutral value of 5.
    #[must_use]
    pub fn desire_weight(trait_value: u8) -> f64 {
        if trait_value <= 5 {
            0.0
        } else {
            (f64::from(trait_value) - 4.0) / 6.0
        }
    }
}

/// Mood: two integers in `[0, 10]`, distinct from the continuous needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mood {
    /// General contentment.
    pub happiness: i32,
    /// Felt vigor, separate from the `needs.energy` depletion track.
    pub energy: i32,
}

impl Mood {
    /// A neutral starting mood.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            happiness: 5,
            energy: 5,
        }
    }

    /// Clamp both fields into `[0, 10]`.
    pub fn clamp(&mut self) {
        self.happiness = clamp_i32(self.happiness, 0, 10);
        self.energy = clamp_i32(self.energy, 0, 10);
    }
}

/// Clamp an `f64` into `[lo, hi]`.
#[must_use]
pub fn clamp_f64(value: f64, lo: f64, hi: f64) -> f64 {
    value.clamp(lo, hi)
}

/// The three continuous physiological needs, each clamped to `[0.0, 10.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Needs {
    /// Hunger level; 10 is famished, 0 is fully fed.
    pub hunger: f64,
    /// Energy level; 0 is exhausted, 10 is fully rested.
    pub energy: f64,
    /// Social fulfillment; 0 is lonely, 10 is fully socialized.
    pub social: f64,
}

impl Needs {
    /// Starting needs for a freshly seeded agent.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            hunger: 2.0,
            energy: 8.0,
            social: 5.0,
        }
    }

    /// Clamp every field into `[0.0, 10.0]`.
    pub fn clamp(&mut self) {
        self.hunger = clamp_f64(self.hunger, 0.0, 10.0);
        self.energy = clamp_f64(self.energy, 0.0, 10.0);
        self.social = clamp_f64(self.social, 0.0, 10.0);
    }
}

/// An agent: the unit of simulated life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Stable identifier, also used as the display handle in prompts.
    pub id: AgentId,
    /// Human-readable display name (may differ from `id` in casing/spacing).
    pub display_name: String,
    /// The eight named traits driving desire-goal generation and decisions.
    pub personality: Personality,
    /// Free-text narrative seed injected into every decision prompt.
    pub narrative_prompt: String,
    /// Current location.
    pub location_id: LocationId,
    /// Items the agent is carrying, by name.
    pub inventory: BTreeSet<String>,
    /// Subjective mood.
    pub mood: Mood,
    /// Physiological needs.
    pub needs: Needs,
    /// Coarse activity state.
    pub state: AgentActivityState,
}

impl Agent {
    /// Whether the agent is currently asleep.
    #[must_use]
    pub const fn is_sleeping(&self) -> bool {
        matches!(self.state, AgentActivityState::Sleeping)
    }
}

/// A location: a node in the world graph. Immutable after seeding, aside
/// from the transient `objects` set that actions mutate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Stable identifier.
    pub id: LocationId,
    /// Display name.
    pub name: String,
    /// Short narrative description shown in perception.
    pub description: String,
    /// Locations directly reachable by `move`.
    pub connections: BTreeSet<LocationId>,
    /// Objects currently present (world items, not agent inventory).
    pub objects: BTreeSet<String>,
    /// Maximum number of agents that may be present at once.
    pub capacity: u32,
}

/// A directed relationship edge from one agent toward another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// The agent who holds this view of the other.
    pub agent_id: AgentId,
    /// The agent being regarded.
    pub target_id: AgentId,
    /// The relationship's type tag.
    pub relationship_type: RelationshipType,
    /// Score in `[-10, 10]`, clamped on every write.
    pub score: i32,
    /// Bounded history of short strings describing notable interactions.
    pub history: VecDeque<String>,
}

/// Cap on the length of a [`Relationship`]'s history list.
pub const RELATIONSHIP_HISTORY_CAP: usize = 20;

impl Relationship {
    /// Create a freshly, lazily-created relationship with the default
    /// "stranger" tag and zero score.
    #[must_use]
    pub fn stranger(agent_id: AgentId, target_id: AgentId) -> Self {
        Self {
            agent_id,
            target_id,
            relationship_type: RelationshipType::Stranger,
            score: 0,
            history: VecDeque::new(),
        }
    }

    /// Apply a score delta, clamping the result into `[-10, 10]`.
    pub fn apply_delta(&mut self, delta: i32) {
        self.score = clamp_i32(self.score.saturating_add(delta), -10, 10);
    }

    /// Append a history entry, dropping the oldest once the cap is exceeded.
    pub fn record(&mut self, entry: impl Into<String>) {
        self.history.push_back(entry.into());
        while self.history.len() > RELATIONSHIP_HISTORY_CAP {
            self.history.pop_front();
        }
    }
}

/// A single memory entry belonging to one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    /// Which tier this memory currently occupies.
    pub kind: crate::enums::MemoryKind,
    /// Free-text memory content.
    pub content: String,
    /// Significance score in `[1, 10]`.
    pub significance: i32,
    /// Simulation tick the memory was recorded at.
    pub timestamp: u64,
    /// Whether this entry is the product of end-of-day compression.
    pub compressed: bool,
}

/// A goal an agent is pursuing or has pursued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// Unique id for this goal instance.
    pub id: GoalId,
    /// The closed goal type.
    pub goal_type: GoalType,
    /// Optional agent this goal concerns (revenge target, friend to help, ...).
    pub target_id: Option<AgentId>,
    /// Priority in `[1, 10]`; higher is more urgent.
    pub priority: i32,
    /// Free-text description injected into decision prompts.
    pub description: String,
    /// Current lifecycle status.
    pub status: GoalStatus,
    /// Tick the goal was created.
    pub created_at: u64,
}

impl Goal {
    /// Derive the goal's category from its type.
    #[must_use]
    pub const fn category(&self) -> GoalCategory {
        self.goal_type.category()
    }

    /// The `(type, target_id)` dedup key per design notes open question b.
    #[must_use]
    pub fn dedup_key(&self) -> (GoalType, Option<AgentId>) {
        (self.goal_type, self.target_id.clone())
    }
}

/// A snapshot of the world clock: tick, day, hour, season, weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    /// Monotonically increasing tick counter, starting at 0.
    pub current_tick: u64,
    /// Day number, starting at 1.
    pub current_day: u64,
    /// Hour of day in `[0.0, 24.0)`.
    pub current_hour: f64,
    /// Derived season.
    pub season: crate::enums::Season,
    /// Freeform weather descriptor (e.g. `"clear"`, `"storm"`).
    pub weather: String,
}

impl Clock {
    /// The initial clock state at the start of a simulation.
    #[must_use]
    pub fn seed() -> Self {
        Self {
            current_tick: 0,
            current_day: 1,
            current_hour: 6.0,
            season: crate::enums::Season::Spring,
            weather: String::from("clear"),
        }
    }
}

/// An entry on the event bus's history ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The closed event type.
    pub event_type: crate::enums::EventType,
    /// One-line human-readable summary.
    pub summary: String,
    /// Tick the event was published at.
    pub timestamp: u64,
    /// Agents involved.
    pub actors: Vec<AgentId>,
    /// Location the event occurred at, if any.
    pub location_id: Option<LocationId>,
    /// Free-text detail.
    pub detail: Option<String>,
    /// Significance in `[1, 10]`.
    pub significance: i32,
    /// Structured payload data.
    pub data: serde_json::Map<String, serde_json::Value>,
}
