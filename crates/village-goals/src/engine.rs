//! The Goal Engine: generation, prioritization, conflict resolution,
//! completion checks, and the end-to-end refresh algorithm.

use village_types::{clamp_i32, Agent, AgentId, Goal, GoalCategory, GoalId, GoalStatus, GoalType, Needs, Personality};

/// Ticks in one simulated hour, used to convert the wall-clock-style
/// expiry windows in the component design (2h reactive, 24h desire)
/// into tick counts.
pub const TICKS_PER_HOUR: u64 = 12;

/// A witnessed event an agent may react to with a reactive goal.
#[derive(Debug, Clone)]
pub struct ReactiveTrigger {
    /// The reactive goal type to generate (always [`GoalType::RespondToEvent`]
    /// in the closed set, but kept generic so future reactive types slot in).
    pub goal_type: GoalType,
    /// The agent the reaction concerns, if any.
    pub target_id: Option<AgentId>,
    /// Description injected into the goal and, later, the decision prompt.
    pub description: String,
}

/// Generate need-driven goals from an agent's current needs, per
/// spec.md §4.6's literal threshold table:
///
/// - Eat: hunger `>= 8` → priority 9; hunger `>= 6` → priority 7;
///   hunger `in [4, 6)` → priority 5.
/// - Sleep: energy `<= 1` → priority 9; energy `<= 3` → priority 7;
///   energy `in (3, 5]` → priority 4.
/// - Socialize: social `<= 1` → priority 7; social `<= 3` → priority 5;
///   social `in (3, 5)` → priority 3.
///
/// The mild socialize tier stops strictly short of the neutral value 5
/// (rather than the `(3, 5]` spec.md's prose suggests) so that an agent
/// at exactly neutral social (5.0) generates no goal at all — this
/// resolves an internal inconsistency between spec.md's threshold prose
/// and its own literal end-to-end scenario 4, which requires no
/// `socialize` goal at `social = 5`. See `DESIGN.md`.
#[must_use]
pub fn generate_need_goals(needs: Needs, current_tick: u64, next_id: &mut dyn FnMut() -> GoalId) -> Vec<Goal> {
    let mut goals = Vec::new();
    let eat_priority = if needs.hunger >= 8.0 {
        Some(9)
    } else if needs.hunger >= 6.0 {
        Some(7)
    } else if needs.hunger >= 4.0 {
        Some(5)
    } else {
        None
    };
    if let Some(priority) = eat_priority {
        goals.push(Goal {
            id: next_id(),
            goal_type: GoalType::Eat,
            target_id: None,
            priority,
            description: String::from("Find something to eat."),
            status: GoalStatus::Active,
            created_at: current_tick,
        });
    }

    let sleep_priority = if needs.energy <= 1.0 {
        Some(9)
    } else if needs.energy <= 3.0 {
        Some(7)
    } else if needs.energy <= 5.0 {
        Some(4)
    } else {
        None
    };
    if let Some(priority) = sleep_priority {
        goals.push(Goal {
            id: next_id(),
            goal_type: GoalType::Sleep,
            target_id: None,
            priority,
            description: String::from("Find somewhere to sleep."),
            status: GoalStatus::Active,
            created_at: current_tick,
        });
    }

    let socialize_priority = if needs.social <= 1.0 {
        Some(7)
    } else if needs.social <= 3.0 {
        Some(5)
    } else if needs.social < 5.0 {
        Some(3)
    } else {
        None
    };
    if let Some(priority) = socialize_priority {
        goals.push(Goal {
            id: next_id(),
            goal_type: GoalType::Socialize,
            target_id: None,
            priority,
            description: String::from("Seek out company."),
            status: GoalStatus::Active,
            created_at: current_tick,
        });
    }
    goals
}

/// Turn a desire weight `w in (0, 1]` into `4 + floor(3w)`, capped at 8,
/// per spec.md §4.6's desire priority formula.
#[must_use]
fn priority_from_excess(excess: f64) -> i32 {
    let steps = if excess >= 3.0 {
        3
    } else if excess >= 2.0 {
        2
    } else if excess >= 1.0 {
        1
    } else {
        0
    };
    clamp_i32(4 + steps, 4, 8)
}

/// The original source's trait -> desire-type lookup table (spec.md
/// §4.6 names the weighting formula but not the mapping; this fills
/// that gap from `original_source/backend/src/hamlet/goals/types.py`'s
/// `TRAIT_GOAL_MAPPINGS`, which maps `curiosity -> [investigate,
/// gain_knowledge, explore]`, `empathy -> [help_others, make_friend]`,
/// `ambition -> [gain_wealth, gain_power]`, `charm -> [make_friend,
/// find_romance]`, and `courage -> [explore, confront]`. `SeekRevenge`
/// and `ApologizeTo` are not trait-driven in the original -- they arise
/// there only in response to witnessed events -- so they carry no
/// entry here and are only ever generated through the reactive-goal
/// path (see `SPEC_FULL.md` §11).
const DESIRE_TRAIT_MAP: &[(fn(&Personality) -> u8, GoalType)] = &[
    (|p| p.curiosity, GoalType::SeekKnowledge),
    (|p| p.curiosity, GoalType::Explore),
    (|p| p.courage, GoalType::Explore),
    (|p| p.empathy, GoalType::HelpFriend),
    (|p| p.charm, GoalType::PursueRomance),
    (|p| p.ambition, GoalType::BuildWealth),
    (|p| p.ambition, GoalType::GainStatus),
];

/// Generate up to 2 desire goals from personality traits above the
/// neutral value of 5, per spec.md §4.6: `w = (trait - 4) / 6`,
/// `priority = 4 + floor(3w)` capped at 8.
#[must_use]
pub fn generate_desire_goals(
    personality: &Personality,
    nearby_agent: Option<AgentId>,
    current_tick: u64,
    next_id: &mut dyn FnMut() -> GoalId,
) -> Vec<Goal> {
    let mut weighted: Vec<(GoalType, f64)> = DESIRE_TRAIT_MAP
        .iter()
        .map(|(getter, goal_type)| (*goal_type, Personality::desire_weight(getter(personality))))
        .filter(|(_, w)| *w > 0.0)
        .collect();
    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    weighted.truncate(2);

    weighted
        .into_iter()
        .map(|(goal_type, w)| {
            let priority = priority_from_excess(3.0 * w);
            let target_id =
                matches!(goal_type, GoalType::HelpFriend | GoalType::PursueRomance).then(|| nearby_agent.clone()).flatten();
            Goal {
                id: next_id(),
                goal_type,
                target_id,
                priority,
                description: format!("Pursue {goal_type:?}."),
                status: GoalStatus::Active,
                created_at: current_tick,
            }
        })
        .collect()
}

/// Generate reactive goals from witnessed events, per spec.md §4.6:
/// `priority = min(6 + 2, 10) = 8`.
#[must_use]
pub fn generate_reactive_goals(
    triggers: &[ReactiveTrigger],
    current_tick: u64,
    next_id: &mut dyn FnMut() -> GoalId,
) -> Vec<Goal> {
    triggers
        .iter()
        .map(|trigger| Goal {
            id: next_id(),
            goal_type: trigger.goal_type,
            target_id: trigger.target_id.clone(),
            priority: clamp_i32(6 + 2, 1, 10),
            description: trigger.description.clone(),
            status: GoalStatus::Active,
            created_at: current_tick,
        })
        .collect()
}

/// The category bonus applied during prioritization.
const fn category_bonus(category: GoalCategory) -> i32 {
    match category {
        GoalCategory::Need => 30,
        GoalCategory::Reactive => 15,
        GoalCategory::Desire => 0,
    }
}

/// Score a goal for prioritization: `10 * priority + category_bonus +
/// min(age_ticks / 720, 5)`.
#[must_use]
pub fn prioritization_score(goal: &Goal, current_tick: u64) -> i32 {
    let age = current_tick.saturating_sub(goal.created_at);
    let age_bonus = i32::try_from(age / 720).unwrap_or(i32::MAX).min(5);
    10 * goal.priority + category_bonus(goal.category()) + age_bonus
}

/// Sort goals by descending prioritization score (highest-priority first).
pub fn sort_by_priority(goals: &mut [Goal], current_tick: u64) {
    goals.sort_by(|a, b| prioritization_score(b, current_tick).cmp(&prioritization_score(a, current_tick)));
}

/// Drop exact `(type, target_id)` duplicates, keeping the
/// highest-priority instance of each (a tie keeps whichever instance
/// appears later, i.e. the freshly regenerated goal over a carried-over
/// stale one -- see `refresh`'s "regenerated unconditionally" ordering).
pub fn dedup_goals(goals: &mut Vec<Goal>) {
    let mut best: std::collections::BTreeMap<(GoalType, Option<AgentId>), usize> = std::collections::BTreeMap::new();
    for (idx, goal) in goals.iter().enumerate() {
        let key = goal.dedup_key();
        let replace = best.get(&key).is_none_or(|&current| goal.priority >= goals[current].priority);
        if replace {
            best.insert(key, idx);
        }
    }
    let keep: std::collections::BTreeSet<usize> = best.into_values().collect();
    let mut idx = 0;
    goals.retain(|_| {
        let keep_this = keep.contains(&idx);
        idx += 1;
        keep_this
    });
}

/// Resolve conflicts:
/// - At most one active need-goal per [`GoalType`] (Eat/Sleep/Socialize
///   do not repeat; keeps the highest-priority instance).
/// - `HelpFriend(t)` conflicts with `Confront(t)`, per spec.md §4.6's
///   literal conflict pair.
/// - `SeekRevenge(t)` conflicts with `ApologizeTo(t)`.
///
/// The lower-priority goal of each conflicting pair is dropped.
pub fn resolve_conflicts(goals: &mut Vec<Goal>, current_tick: u64) {
    let mut seen_need_types = std::collections::BTreeSet::new();
    goals.retain(|goal| {
        if goal.category() != GoalCategory::Need {
            return true;
        }
        seen_need_types.insert(goal.goal_type)
    });

    let pairs = [
        (GoalType::HelpFriend, GoalType::Confront),
        (GoalType::SeekRevenge, GoalType::ApologizeTo),
    ];

    let mut to_drop = std::collections::BTreeSet::new();
    for (left, right) in pairs {
        let mut by_target: std::collections::BTreeMap<Option<AgentId>, Vec<usize>> =
            std::collections::BTreeMap::new();
        for (idx, goal) in goals.iter().enumerate() {
            if goal.goal_type == left || goal.goal_type == right {
                by_target.entry(goal.target_id.clone()).or_default().push(idx);
            }
        }
        for indices in by_target.into_values() {
            if indices.len() < 2 {
                continue;
            }
            let loser = indices
                .iter()
                .copied()
                .min_by_key(|&idx| prioritization_score(&goals[idx], current_tick));
            if let Some(loser) = loser {
                to_drop.insert(loser);
            }
        }
    }

    let mut idx = 0;
    goals.retain(|_| {
        let keep = !to_drop.contains(&idx);
        idx += 1;
        keep
    });
}

/// Evaluate completion/failure conditions for need goals against the
/// agent's current needs, and expire stale reactive/desire goals.
pub fn evaluate_lifecycle(goals: &mut [Goal], needs: Needs, current_tick: u64) {
    for goal in goals.iter_mut() {
        if goal.status != GoalStatus::Active {
            continue;
        }
        match goal.goal_type {
            GoalType::Eat if needs.hunger <= 2.0 => goal.status = GoalStatus::Completed,
            GoalType::Eat if needs.hunger >= 10.0 => goal.status = GoalStatus::Failed,
            GoalType::Sleep if needs.energy >= 8.0 => goal.status = GoalStatus::Completed,
            GoalType::Socialize if needs.social >= 7.0 => goal.status = GoalStatus::Completed,
            _ => {}
        }
        let age = current_tick.saturating_sub(goal.created_at);
        match goal.category() {
            GoalCategory::Reactive if age >= 2 * TICKS_PER_HOUR => {
                goal.status = GoalStatus::Failed;
            }
            GoalCategory::Desire if age >= 24 * TICKS_PER_HOUR => {
                goal.status = GoalStatus::Failed;
            }
            _ => {}
        }
    }
}

/// Run the full six-step refresh algorithm, returning the agent's new
/// goal set. `goals` is the agent's existing (possibly stale) goal list.
#[must_use]
pub fn refresh(
    mut goals: Vec<Goal>,
    agent: &Agent,
    reactive_triggers: &[ReactiveTrigger],
    nearby_agent: Option<AgentId>,
    current_tick: u64,
    mut next_id: impl FnMut() -> GoalId,
) -> Vec<Goal> {
    goals.retain(|g| g.status == GoalStatus::Active);

    goals.extend(generate_need_goals(agent.needs, current_tick, &mut next_id));

    let active_desire_count = goals.iter().filter(|g| g.category() == GoalCategory::Desire).count();
    if active_desire_count < 2 {
        let mut desires = generate_desire_goals(&agent.personality, nearby_agent, current_tick, &mut next_id);
        desires.truncate(2 - active_desire_count);
        goals.extend(desires);
    }

    goals.extend(generate_reactive_goals(reactive_triggers, current_tick, &mut next_id));

    dedup_goals(&mut goals);
    resolve_conflicts(&mut goals, current_tick);
    evaluate_lifecycle(&mut goals, agent.needs, current_tick);
    sort_by_priority(&mut goals, current_tick);
    goals
}
