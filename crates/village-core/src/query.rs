//! Read-side query surface for external collaborators (spec.md §6).
//!
//! Every function here is a pure, read-only projection of world state,
//! the event bus's history, or the scheduler's goal/health snapshots --
//! the shape an HTTP handler would serialize, without building the
//! handler itself. No mutation happens anywhere in this module.

use std::collections::BTreeMap;

use serde::Serialize;
use village_events::EventBus;
use village_goals::prioritization_score;
use village_types::{Agent, AgentId, Event, Goal, GoalStatus, LocationId, Relationship};
use village_world::WorldStore;

/// `{tick, day, hour, season, weather, agent_count, location_count}`
/// per spec.md §6's world snapshot getter.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    /// Current tick number.
    pub tick: u64,
    /// Current in-world day.
    pub day: u64,
    /// Current hour of day, `[0.0, 24.0)`.
    pub hour: f64,
    /// Derived season.
    pub season: village_types::Season,
    /// Freeform weather descriptor.
    pub weather: String,
    /// Total seeded agents.
    pub agent_count: usize,
    /// Total seeded locations.
    pub location_count: usize,
}

/// Assemble the world snapshot getter.
pub async fn world_snapshot(world: &WorldStore) -> WorldSnapshot {
    let state = world.read().await;
    WorldSnapshot {
        tick: state.clock.current_tick,
        day: state.clock.current_day,
        hour: state.clock.current_hour,
        season: state.clock.season,
        weather: state.clock.weather.clone(),
        agent_count: state.agents.len(),
        location_count: state.locations.len(),
    }
}

/// Per-agent detail: the agent record, with nothing added or redacted.
/// Spec.md §6 asks for "per-agent detail"; the [`Agent`] struct already
/// is that detail, so this is a thin, documented passthrough rather than
/// a parallel DTO.
pub async fn agent_detail(world: &WorldStore, agent_id: &AgentId) -> Option<Agent> {
    world.agent(agent_id).await.ok()
}

/// One node in the relationships graph: `{id, name}`.
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipNode {
    /// Agent id.
    pub id: AgentId,
    /// Agent display name.
    pub name: String,
}

/// One edge in the relationships graph: `{source, target, type, score}`.
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipEdge {
    /// Source agent id.
    pub source: AgentId,
    /// Target agent id.
    pub target: AgentId,
    /// Relationship type tag.
    #[serde(rename = "type")]
    pub relationship_type: village_types::RelationshipType,
    /// Current score, `[-10, 10]`.
    pub score: i32,
}

/// `{nodes, edges}` per spec.md §6's relationships-graph getter.
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipsGraph {
    /// One node per seeded agent.
    pub nodes: Vec<RelationshipNode>,
    /// One edge per relationship that has been written at least once.
    pub edges: Vec<RelationshipEdge>,
}

/// Build the full relationships graph: every agent as a node, every
/// recorded relationship (not every possible pair -- relationships are
/// created lazily, per spec.md §3) as a directed edge.
pub async fn relationships_graph(world: &WorldStore) -> RelationshipsGraph {
    let state = world.read().await;
    let nodes = state
        .agents
        .values()
        .map(|a| RelationshipNode {
            id: a.id.clone(),
            name: a.display_name.clone(),
        })
        .collect();
    let edges = state
        .relationships
        .values()
        .map(relationship_edge)
        .collect();
    RelationshipsGraph { nodes, edges }
}

fn relationship_edge(rel: &Relationship) -> RelationshipEdge {
    RelationshipEdge {
        source: rel.agent_id.clone(),
        target: rel.target_id.clone(),
        relationship_type: rel.relationship_type,
        score: rel.score,
    }
}

/// Filter a goal list by optional agent id (the caller already knows
/// which agent's goals it has, this is a plain status filter) and
/// optional [`GoalStatus`].
#[must_use]
pub fn filter_goals(goals: &[Goal], status: Option<GoalStatus>) -> Vec<Goal> {
    goals
        .iter()
        .filter(|g| status.is_none_or(|s| g.status == s))
        .cloned()
        .collect()
}

/// Rank a goal list by descending prioritization score, without
/// mutating the caller's copy.
#[must_use]
pub fn ranked_goals(goals: &[Goal], current_tick: u64) -> Vec<Goal> {
    let mut ranked = goals.to_vec();
    ranked.sort_by(|a, b| prioritization_score(b, current_tick).cmp(&prioritization_score(a, current_tick)));
    ranked
}

/// Agent ids grouped by their current location, per spec.md §6's
/// "positions grouped by location" getter.
pub async fn positions_by_location(world: &WorldStore) -> BTreeMap<LocationId, Vec<AgentId>> {
    let state = world.read().await;
    let mut grouped: BTreeMap<LocationId, Vec<AgentId>> = BTreeMap::new();
    for agent in state.agents.values() {
        grouped.entry(agent.location_id.clone()).or_default().push(agent.id.clone());
    }
    grouped
}

/// One bucket of the event-rate histogram: a tick-aligned window and
/// the count of events whose timestamp falls inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventRateBucket {
    /// The first tick in this bucket's window (inclusive).
    pub bucket_start_tick: u64,
    /// Number of events with `bucket_start_tick <= timestamp < bucket_start_tick + bucket_size`.
    pub count: usize,
}

/// Aggregate the bus's history into fixed-size tick buckets, covering
/// the trailing `window_ticks` ticks ending at `now`, per spec.md §6's
/// "event-rate buckets aggregated from event history within a requested
/// minute window at a requested bucket size" getter. Tick count stands
/// in for "minute window" here since this core's clock is tick-indexed,
/// not wall-clock-indexed (spec.md's own non-goal: no real-time
/// sub-second tick rates, so minutes and ticks are the same unit of
/// account at the scheduler's configured cadence).
pub async fn event_rate_buckets(events: &EventBus, now: u64, window_ticks: u64, bucket_size: u64) -> Vec<EventRateBucket> {
    if bucket_size == 0 || window_ticks == 0 {
        return Vec::new();
    }
    let window_start = now.saturating_sub(window_ticks);
    let history = events.history(usize::MAX).await;
    bucket_counts(&history, window_start, now, bucket_size)
}

fn bucket_counts(history: &[Event], window_start: u64, now: u64, bucket_size: u64) -> Vec<EventRateBucket> {
    let bucket_count = (now.saturating_sub(window_start)) / bucket_size + 1;
    let mut buckets: Vec<EventRateBucket> = (0..bucket_count)
        .map(|i| EventRateBucket {
            bucket_start_tick: window_start + i * bucket_size,
            count: 0,
        })
        .collect();

    for event in history {
        if event.timestamp < window_start || event.timestamp > now {
            continue;
        }
        let offset = (event.timestamp - window_start) / bucket_size;
        if let Some(bucket) = usize::try_from(offset).ok().and_then(|idx| buckets.get_mut(idx)) {
            bucket.count += 1;
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use village_types::{AgentActivityState, EventType, Location, Mood, Needs, Personality};
    use village_world::WorldState;

    use super::*;

    const NEUTRAL_PERSONALITY: Personality = Personality {
        curiosity: 5,
        empathy: 5,
        ambition: 5,
        discretion: 5,
        energy: 5,
        courage: 5,
        charm: 5,
        perception: 5,
    };

    fn make_agent(id: &str, name: &str, location: &str) -> Agent {
        Agent {
            id: AgentId::from(id),
            display_name: name.to_owned(),
            personality: NEUTRAL_PERSONALITY,
            narrative_prompt: String::new(),
            location_id: LocationId::from(location),
            inventory: BTreeSet::new(),
            mood: Mood::neutral(),
            needs: Needs::neutral(),
            state: AgentActivityState::Idle,
        }
    }

    fn make_location(id: &str) -> Location {
        Location {
            id: LocationId::from(id),
            name: id.to_owned(),
            description: "a quiet place".to_owned(),
            connections: BTreeSet::new(),
            objects: BTreeSet::new(),
            capacity: 10,
        }
    }

    async fn seeded_world() -> WorldStore {
        let world = WorldStore::new(WorldState::default());
        world.seed_location(make_location("bakery")).await.expect("seed");
        world.seed_location(make_location("town_square")).await.expect("seed");
        world.seed_agent(make_agent("agnes", "Agnes", "bakery")).await.expect("seed");
        world.seed_agent(make_agent("bob", "Bob", "town_square")).await.expect("seed");
        world
    }

    #[tokio::test]
    async fn world_snapshot_reports_counts() {
        let world = seeded_world().await;
        let snapshot = world_snapshot(&world).await;
        assert_eq!(snapshot.agent_count, 2);
        assert_eq!(snapshot.location_count, 2);
        assert_eq!(snapshot.tick, 0);
    }

    #[tokio::test]
    async fn relationships_graph_has_every_agent_as_a_node() {
        let world = seeded_world().await;
        let graph = relationships_graph(&world).await;
        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.edges.is_empty());
    }

    #[tokio::test]
    async fn relationships_graph_includes_written_edges() {
        let world = seeded_world().await;
        world
            .upsert_relationship(&AgentId::from("agnes"), &AgentId::from("bob"), 3, None)
            .await
            .expect("upsert");
        let graph = relationships_graph(&world).await;
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].score, 3);
    }

    #[tokio::test]
    async fn positions_group_agents_by_location() {
        let world = seeded_world().await;
        let positions = positions_by_location(&world).await;
        assert_eq!(positions.get(&LocationId::from("bakery")).map(Vec::len), Some(1));
        assert_eq!(positions.get(&LocationId::from("town_square")).map(Vec::len), Some(1));
    }

    #[test]
    fn filter_goals_by_status_keeps_only_matching() {
        let goals = vec![
            Goal {
                id: village_types::GoalId::new("g1"),
                goal_type: village_types::GoalType::Eat,
                target_id: None,
                priority: 7,
                description: String::new(),
                status: GoalStatus::Active,
                created_at: 0,
            },
            Goal {
                id: village_types::GoalId::new("g2"),
                goal_type: village_types::GoalType::Sleep,
                target_id: None,
                priority: 9,
                description: String::new(),
                status: GoalStatus::Completed,
                created_at: 0,
            },
        ];
        let active = filter_goals(&goals, Some(GoalStatus::Active));
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].goal_type, village_types::GoalType::Eat);
    }

    fn sample_event(tick: u64) -> Event {
        Event {
            event_type: EventType::Tick,
            summary: format!("tick {tick}"),
            timestamp: tick,
            actors: Vec::new(),
            location_id: None,
            detail: None,
            significance: 1,
            data: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn event_rate_buckets_partition_by_bucket_size() {
        let bus = EventBus::new();
        for tick in 0..10 {
            bus.publish(sample_event(tick)).await;
        }
        let buckets = event_rate_buckets(&bus, 9, 10, 5).await;
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].bucket_start_tick, 0);
        assert_eq!(buckets[1].bucket_start_tick, 5);
        let total: usize = buckets.iter().map(|b| b.count).sum();
        assert_eq!(total, 10);
    }

    #[tokio::test]
    async fn event_rate_buckets_empty_for_zero_bucket_size() {
        let bus = EventBus::new();
        bus.publish(sample_event(0)).await;
        let buckets = event_rate_buckets(&bus, 0, 10, 0).await;
        assert!(buckets.is_empty());
    }
}
