//! Significance scoring and decay for memory entries.
//!
//! Every memory is scored once at creation time and may decay slowly
//! afterward; both calculations live here so the store itself stays a
//! thin container.

use village_types::clamp_i32;

/// The event category a memory was recorded under, fixing its base
/// significance before situational modifiers apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryEventCategory {
    /// Ordinary, unremarkable happenings.
    Routine,
    /// A conversation.
    Dialogue,
    /// Learning something new about the world.
    Discovery,
    /// An argument or confrontation.
    Conflict,
    /// A broken trust or betrayal.
    Betrayal,
    /// A death witnessed or learned of.
    Death,
}

impl MemoryEventCategory {
    /// The category's base significance before modifiers.
    #[must_use]
    pub const fn base_significance(self) -> i32 {
        match self {
            Self::Routine => 1,
            Self::Dialogue => 3,
            Self::Discovery => 6,
            Self::Conflict => 7,
            Self::Betrayal => 9,
            Self::Death => 10,
        }
    }
}

/// The situational modifiers applied on top of a category's base
/// significance.
#[derive(Debug, Clone, Copy)]
pub struct SignificanceInput {
    /// The memory's event category.
    pub category: MemoryEventCategory,
    /// Whether the remembering agent was a direct participant.
    pub involves_self: bool,
    /// Whether the other party is a friend or rival (a known relationship).
    pub involves_friend_or_rival: bool,
    /// Whether this is the first time this kind of event happened to the agent.
    pub first_time: bool,
    /// Emotional weight of the event, in `[-3, 3]`.
    pub emotional_impact: i32,
}

/// Compute a memory's significance, clamped to `[1, 10]`.
#[must_use]
pub fn compute_significance(input: SignificanceInput) -> i32 {
    let mut score = input.category.base_significance();
    if input.involves_self {
        score += 1;
    }
    if input.involves_friend_or_rival {
        score += 2;
    }
    if input.first_time {
        score += 2;
    }
    score += clamp_i32(input.emotional_impact, -3, 3);
    clamp_i32(score, 1, 10)
}

/// Decay a memory's significance by the number of days elapsed since it
/// was recorded.
///
/// Significance `>= 8` never decays. Otherwise the significance drops by
/// `floor(days_elapsed / 2)`, halved again while the current significance
/// is `5` or above, and never falls under `1`.
#[must_use]
pub fn decay_significance(current: i32, days_elapsed: u64) -> i32 {
    if current >= 8 {
        return current;
    }
    let mut score = current;
    let base_drop = i32::try_from(days_elapsed / 2).unwrap_or(i32::MAX);
    if base_drop == 0 {
        return score;
    }
    let drop = if score >= 5 { base_drop / 2 } else { base_drop };
    score -= drop;
    clamp_i32(score, 1, 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_significance_matches_category_table() {
        assert_eq!(MemoryEventCategory::Dialogue.base_significance(), 3);
        assert_eq!(MemoryEventCategory::Discovery.base_significance(), 6);
        assert_eq!(MemoryEventCategory::Conflict.base_significance(), 7);
        assert_eq!(MemoryEventCategory::Betrayal.base_significance(), 9);
        assert_eq!(MemoryEventCategory::Death.base_significance(), 10);
    }

    #[test]
    fn significance_clamps_at_ten_even_with_every_modifier() {
        let score = compute_significance(SignificanceInput {
            category: MemoryEventCategory::Death,
            involves_self: true,
            involves_friend_or_rival: true,
            first_time: true,
            emotional_impact: 3,
        });
        assert_eq!(score, 10);
    }

    #[test]
    fn significance_never_drops_below_one() {
        let score = compute_significance(SignificanceInput {
            category: MemoryEventCategory::Routine,
            involves_self: false,
            involves_friend_or_rival: false,
            first_time: false,
            emotional_impact: -3,
        });
        assert_eq!(score, 1);
    }

    #[test]
    fn high_significance_memories_never_decay() {
        assert_eq!(decay_significance(9, 100), 9);
        assert_eq!(decay_significance(8, 365), 8);
    }

    #[test]
    fn low_significance_memories_decay_toward_the_floor() {
        // 6 >= 5, so the drop is halved: floor(10/2)=5, then 5/2=2 -> 6-2=4.
        assert_eq!(decay_significance(6, 10), 4);
    }

    #[test]
    fn decay_never_crosses_the_floor() {
        let decayed = decay_significance(2, 1000);
        assert_eq!(decayed, 1);
    }
}
