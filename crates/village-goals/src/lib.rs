//! The Goal Engine for the village simulation core.
//!
//! Each agent owns a small goal list, refreshed once per tick by
//! [`engine::refresh`]: need-driven goals are derived from the agent's
//! [`village_types::Needs`], desire-driven goals from the top two
//! above-neutral [`village_types::Personality`] traits, and reactive
//! goals from witnessed events. The refreshed set is deduplicated,
//! conflict-resolved, checked for completion/failure/expiry, and sorted
//! by prioritization score before being handed back to the scheduler.

pub mod engine;

pub use engine::{
    dedup_goals, evaluate_lifecycle, generate_desire_goals, generate_need_goals, generate_reactive_goals,
    prioritization_score, refresh, resolve_conflicts, sort_by_priority, ReactiveTrigger, TICKS_PER_HOUR,
};
