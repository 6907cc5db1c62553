//! The World State Store: the single owner of agents, locations,
//! relationships, and the world clock.
//!
//! A single `tokio::sync::RwLock` guards the aggregate state. Readers
//! (perception, the external read-side getters) take the read lock and
//! may run concurrently with each other; every mutator takes the write
//! lock for the duration of its update, giving the store's single
//! logical writer / cooperative readers model.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use village_types::{Agent, AgentActivityState, AgentId, Clock, Location, LocationId, Relationship};

use crate::clock::{advance_time as advance_clock, in_sleep_window, in_wake_window};
use crate::error::WorldError;

/// Which of an agent's three continuous needs to adjust.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeedKind {
    /// Hunger; rises over time, falls when eating.
    Hunger,
    /// Energy; falls over time, rises when sleeping.
    Energy,
    /// Social deprivation; rises in isolation, falls in company.
    Social,
}

/// The default per-tick need delta per spec.md §9 open question (a):
/// 0.5 is treated as the one constant this store ever applies.
pub const DEFAULT_NEED_DELTA: f64 = 0.5;

/// The full, in-process world state: every agent, every location, every
/// relationship, and the clock.
#[derive(Debug, Clone)]
pub struct WorldState {
    /// The world clock.
    pub clock: Clock,
    /// All agents, keyed by id.
    pub agents: BTreeMap<AgentId, Agent>,
    /// All locations, keyed by id. Immutable after seeding except `objects`.
    pub locations: BTreeMap<LocationId, Location>,
    /// All relationships, keyed by `(agent_id, target_id)`.
    pub relationships: BTreeMap<(AgentId, AgentId), Relationship>,
}

impl WorldState {
    /// Build an empty world state with a freshly-seeded clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: Clock::seed(),
            agents: BTreeMap::new(),
            locations: BTreeMap::new(),
            relationships: BTreeMap::new(),
        }
    }
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new()
    }
}

/// A cheaply-clonable handle to the shared [`WorldState`].
#[derive(Debug, Clone)]
pub struct WorldStore {
    inner: Arc<RwLock<WorldState>>,
}

impl WorldStore {
    /// Wrap a [`WorldState`] for shared, lock-guarded access.
    #[must_use]
    pub fn new(state: WorldState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Take a read lock on the full state.
    pub async fn read(&self) -> RwLockReadGuard<'_, WorldState> {
        self.inner.read().await
    }

    /// Clone a single agent by id.
    pub async fn agent(&self, agent_id: &AgentId) -> Result<Agent, WorldError> {
        self.inner
            .read()
            .await
            .agents
            .get(agent_id)
            .cloned()
            .ok_or_else(|| WorldError::AgentNotFound(agent_id.clone()))
    }

    /// Clone a single location by id.
    pub async fn location(&self, location_id: &LocationId) -> Result<Location, WorldError> {
        self.inner
            .read()
            .await
            .locations
            .get(location_id)
            .cloned()
            .ok_or_else(|| WorldError::LocationNotFound(location_id.clone()))
    }

    /// Read a relationship edge, if one has been created yet.
    pub async fn relationship(
        &self,
        agent_id: &AgentId,
        target_id: &AgentId,
    ) -> Option<Relationship> {
        self.inner
            .read()
            .await
            .relationships
            .get(&(agent_id.clone(), target_id.clone()))
            .cloned()
    }

    /// Agent ids currently co-located with `agent_id`, excluding itself.
    pub async fn co_located(&self, agent_id: &AgentId) -> Result<Vec<AgentId>, WorldError> {
        let guard = self.inner.read().await;
        let location_id = guard
            .agents
            .get(agent_id)
            .map(|a| a.location_id.clone())
            .ok_or_else(|| WorldError::AgentNotFound(agent_id.clone()))?;
        Ok(guard
            .agents
            .values()
            .filter(|a| a.id != *agent_id && a.location_id == location_id)
            .map(|a| a.id.clone())
            .collect())
    }

    /// Insert a freshly-seeded location. Errors on duplicate id.
    pub async fn seed_location(&self, location: Location) -> Result<(), WorldError> {
        let mut guard = self.inner.write().await;
        if guard.locations.contains_key(&location.id) {
            return Err(WorldError::DuplicateLocation(location.id));
        }
        guard.locations.insert(location.id.clone(), location);
        Ok(())
    }

    /// Insert a freshly-seeded agent. Errors on duplicate id.
    pub async fn seed_agent(&self, agent: Agent) -> Result<(), WorldError> {
        let mut guard = self.inner.write().await;
        if guard.agents.contains_key(&agent.id) {
            return Err(WorldError::DuplicateAgent(agent.id));
        }
        guard.agents.insert(agent.id.clone(), agent);
        Ok(())
    }

    /// Move an agent to `destination`, validated against the current
    /// location's `connections` and the destination's `capacity`.
    pub async fn move_agent(
        &self,
        agent_id: &AgentId,
        destination: &LocationId,
    ) -> Result<(), WorldError> {
        let mut guard = self.inner.write().await;
        let current_location = guard
            .agents
            .get(agent_id)
            .map(|a| a.location_id.clone())
            .ok_or_else(|| WorldError::AgentNotFound(agent_id.clone()))?;

        let connections = guard
            .locations
            .get(&current_location)
            .map(|l| l.connections.clone())
            .ok_or_else(|| WorldError::LocationNotFound(current_location.clone()))?;

        if !connections.contains(destination) {
            return Err(WorldError::NoConnection {
                from: current_location,
                to: destination.clone(),
            });
        }

        let capacity = guard
            .locations
            .get(destination)
            .map(|l| l.capacity)
            .ok_or_else(|| WorldError::LocationNotFound(destination.clone()))?;
        let occupants = guard
            .agents
            .values()
            .filter(|a| a.location_id == *destination)
            .count();
        let occupants = u64::try_from(occupants).unwrap_or(u64::MAX);
        if u64::from(capacity) <= occupants {
            return Err(WorldError::LocationAtCapacity {
                location: destination.clone(),
                capacity,
            });
        }

        if let Some(agent) = guard.agents.get_mut(agent_id) {
            agent.location_id = destination.clone();
        }
        Ok(())
    }

    /// Set an agent's coarse activity state.
    pub async fn set_state(
        &self,
        agent_id: &AgentId,
        state: AgentActivityState,
    ) -> Result<(), WorldError> {
        let mut guard = self.inner.write().await;
        let agent = guard
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| WorldError::AgentNotFound(agent_id.clone()))?;
        agent.state = state;
        Ok(())
    }

    /// Adjust one of an agent's continuous needs by `delta`, clamped to
    /// `[0.0, 10.0]`.
    pub async fn adjust_need(
        &self,
        agent_id: &AgentId,
        need: NeedKind,
        delta: f64,
    ) -> Result<(), WorldError> {
        let mut guard = self.inner.write().await;
        let agent = guard
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| WorldError::AgentNotFound(agent_id.clone()))?;
        match need {
            NeedKind::Hunger => agent.needs.hunger += delta,
            NeedKind::Energy => agent.needs.energy += delta,
            NeedKind::Social => agent.needs.social += delta,
        }
        agent.needs.clamp();
        Ok(())
    }

    /// Apply one fractional-hour's worth of need drift to `agent_id`,
    /// per spec.md §4.2's per-Δ formula:
    ///
    /// - `hunger += 0.5·Δ` always.
    /// - `energy += 2.0·Δ` while sleeping, else `energy -= 0.3·Δ`.
    /// - `social += 0.5·Δ` when co-located with another agent (location
    ///   occupancy `> 1`), else `social -= 0.2·Δ`.
    ///
    /// The scheduler calls this once per agent per tick with `Δ = 0.5`
    /// (`DEFAULT_NEED_DELTA`), matching the 30-in-world-minute tick.
    pub async fn update_needs(&self, agent_id: &AgentId, delta: f64) -> Result<(), WorldError> {
        let mut guard = self.inner.write().await;
        let location_id = guard
            .agents
            .get(agent_id)
            .map(|a| a.location_id.clone())
            .ok_or_else(|| WorldError::AgentNotFound(agent_id.clone()))?;
        let occupancy = guard
            .agents
            .values()
            .filter(|a| a.location_id == location_id)
            .count();

        let agent = guard
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| WorldError::AgentNotFound(agent_id.clone()))?;

        agent.needs.hunger += 0.5 * delta;
        agent.needs.energy += if agent.is_sleeping() {
            2.0 * delta
        } else {
            -0.3 * delta
        };
        agent.needs.social += if occupancy > 1 { 0.5 * delta } else { -0.2 * delta };
        agent.needs.clamp();
        Ok(())
    }

    /// Add an item to an agent's inventory.
    pub async fn add_item(&self, agent_id: &AgentId, item: impl Into<String>) -> Result<(), WorldError> {
        let mut guard = self.inner.write().await;
        let agent = guard
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| WorldError::AgentNotFound(agent_id.clone()))?;
        agent.inventory.insert(item.into());
        Ok(())
    }

    /// Remove an item from an agent's inventory. Returns whether it was present.
    pub async fn remove_item(&self, agent_id: &AgentId, item: &str) -> Result<bool, WorldError> {
        let mut guard = self.inner.write().await;
        let agent = guard
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| WorldError::AgentNotFound(agent_id.clone()))?;
        Ok(agent.inventory.remove(item))
    }

    /// Remove an object from a location, e.g. when an agent takes it.
    /// Returns whether it was present.
    pub async fn remove_location_object(
        &self,
        location_id: &LocationId,
        object: &str,
    ) -> Result<bool, WorldError> {
        let mut guard = self.inner.write().await;
        let location = guard
            .locations
            .get_mut(location_id)
            .ok_or_else(|| WorldError::LocationNotFound(location_id.clone()))?;
        Ok(location.objects.remove(object))
    }

    /// Add an object to a location, e.g. when an agent drops it.
    pub async fn add_location_object(
        &self,
        location_id: &LocationId,
        object: impl Into<String>,
    ) -> Result<(), WorldError> {
        let mut guard = self.inner.write().await;
        let location = guard
            .locations
            .get_mut(location_id)
            .ok_or_else(|| WorldError::LocationNotFound(location_id.clone()))?;
        location.objects.insert(object.into());
        Ok(())
    }

    /// Apply (or reverse, with a negative `delta`) a relationship score
    /// change from `agent_id` toward `target_id`, creating the
    /// relationship lazily as `stranger` if it does not yet exist.
    ///
    /// Returns `(old_score, new_score)`.
    pub async fn upsert_relationship(
        &self,
        agent_id: &AgentId,
        target_id: &AgentId,
        delta: i32,
        note: Option<&str>,
    ) -> Result<(i32, i32), WorldError> {
        let mut guard = self.inner.write().await;
        let key = (agent_id.clone(), target_id.clone());
        let relationship = guard
            .relationships
            .entry(key)
            .or_insert_with(|| Relationship::stranger(agent_id.clone(), target_id.clone()));
        let old_score = relationship.score;
        relationship.apply_delta(delta);
        if let Some(note) = note {
            relationship.record(note);
        }
        Ok((old_score, relationship.score))
    }

    /// Advance the world clock by one tick (`minutes` simulated minutes).
    pub async fn advance_time(&self, minutes: f64) -> Result<(), WorldError> {
        let mut guard = self.inner.write().await;
        advance_clock(&mut guard.clock, minutes)
    }

    /// Wake every sleeping agent whose hour falls in the wake window.
    /// Idempotent: calling twice within the same tick wakes nobody twice.
    pub async fn wake_sleeping_agents(&self) -> Vec<AgentId> {
        let mut guard = self.inner.write().await;
        let hour = guard.clock.current_hour;
        if !in_wake_window(hour) {
            return Vec::new();
        }
        let mut woken = Vec::new();
        for agent in guard.agents.values_mut() {
            if agent.is_sleeping() {
                agent.state = AgentActivityState::Idle;
                woken.push(agent.id.clone());
            }
        }
        woken
    }

    /// Put to sleep every non-sleeping agent whose hour falls in the
    /// sleep window. Idempotent within a tick for the same reason.
    pub async fn put_agents_to_sleep(&self) -> Vec<AgentId> {
        let mut guard = self.inner.write().await;
        let hour = guard.clock.current_hour;
        if !in_sleep_window(hour) {
            return Vec::new();
        }
        let mut put_to_sleep = Vec::new();
        for agent in guard.agents.values_mut() {
            if !agent.is_sleeping() {
                agent.state = AgentActivityState::Sleeping;
                put_to_sleep.push(agent.id.clone());
            }
        }
        put_to_sleep
    }

    /// All agent ids in stable ascending order, for the scheduler's
    /// deterministic per-tick processing order.
    pub async fn agent_ids_ascending(&self) -> Vec<AgentId> {
        self.inner.read().await.agents.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use village_types::{Location, Needs};

    use super::*;

    fn make_location(id: &str, connections: &[&str], capacity: u32) -> Location {
        Location {
            id: LocationId::new(id),
            name: id.to_owned(),
            description: String::new(),
            connections: connections.iter().map(|c| LocationId::new(*c)).collect(),
            objects: std::collections::BTreeSet::new(),
            capacity,
        }
    }

    fn make_agent(id: &str, location: &str) -> Agent {
        Agent {
            id: AgentId::new(id),
            display_name: id.to_owned(),
            personality: village_types::Personality {
                curiosity: 5,
                empathy: 5,
                ambition: 5,
                discretion: 5,
                energy: 5,
                courage: 5,
                charm: 5,
                perception: 5,
            },
            narrative_prompt: String::new(),
            location_id: LocationId::new(location),
            inventory: std::collections::BTreeSet::new(),
            mood: village_types::Mood::neutral(),
            needs: Needs::neutral(),
            state: AgentActivityState::Idle,
        }
    }

    async fn seeded_store() -> WorldStore {
        let store = WorldStore::new(WorldState::new());
        store
            .seed_location(make_location("bakery", &["town_square"], 5))
            .await
            .expect("seed");
        store
            .seed_location(make_location("town_square", &["bakery", "tavern"], 10))
            .await
            .expect("seed");
        store
            .seed_location(make_location("tavern", &["town_square"], 5))
            .await
            .expect("seed");
        store
            .seed_agent(make_agent("agnes", "bakery"))
            .await
            .expect("seed");
        store
            .seed_agent(make_agent("bob", "town_square"))
            .await
            .expect("seed");
        store
    }

    #[tokio::test]
    async fn move_to_connected_location_succeeds() {
        let store = seeded_store().await;
        let agnes = AgentId::new("agnes");
        store
            .move_agent(&agnes, &LocationId::new("town_square"))
            .await
            .expect("move");
        let updated = store.agent(&agnes).await.expect("agent");
        assert_eq!(updated.location_id, LocationId::new("town_square"));
    }

    #[tokio::test]
    async fn move_to_unconnected_location_fails_unchanged() {
        let store = seeded_store().await;
        let agnes = AgentId::new("agnes");
        let before = store.agent(&agnes).await.expect("agent");
        let result = store.move_agent(&agnes, &LocationId::new("tavern")).await;
        assert!(result.is_err());
        let after = store.agent(&agnes).await.expect("agent");
        assert_eq!(before.location_id, after.location_id);
    }

    #[tokio::test]
    async fn relationship_is_created_lazily_as_stranger() {
        let store = seeded_store().await;
        let agnes = AgentId::new("agnes");
        let bob = AgentId::new("bob");
        let (old, new) = store
            .upsert_relationship(&agnes, &bob, 2, Some("shared a loaf of bread"))
            .await
            .expect("upsert");
        assert_eq!(old, 0);
        assert_eq!(new, 2);
    }

    #[tokio::test]
    async fn relationship_score_clamps_on_repeated_deltas() {
        let store = seeded_store().await;
        let agnes = AgentId::new("agnes");
        let bob = AgentId::new("bob");
        for _ in 0..20 {
            store.upsert_relationship(&agnes, &bob, 2, None).await.expect("upsert");
        }
        let guard = store.read().await;
        let rel = guard
            .relationships
            .get(&(agnes, bob))
            .expect("relationship exists");
        assert_eq!(rel.score, 10);
    }

    #[tokio::test]
    async fn update_needs_applies_awake_solitary_formula() {
        let store = seeded_store().await;
        let agnes = AgentId::new("agnes");
        let before = store.agent(&agnes).await.expect("agent");
        store.update_needs(&agnes, DEFAULT_NEED_DELTA).await.expect("tick");
        let after = store.agent(&agnes).await.expect("agent");
        assert!((after.needs.hunger - before.needs.hunger - 0.25).abs() < 1e-9);
        assert!((after.needs.energy - before.needs.energy + 0.15).abs() < 1e-9);
        assert!((after.needs.social - before.needs.social + 0.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn update_needs_restores_energy_while_sleeping() {
        let store = seeded_store().await;
        let agnes = AgentId::new("agnes");
        store.set_state(&agnes, AgentActivityState::Sleeping).await.expect("sleep");
        let before = store.agent(&agnes).await.expect("agent");
        store.update_needs(&agnes, DEFAULT_NEED_DELTA).await.expect("tick");
        let after = store.agent(&agnes).await.expect("agent");
        assert!((after.needs.energy - before.needs.energy - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn update_needs_raises_social_when_co_located() {
        let store = seeded_store().await;
        let agnes = AgentId::new("agnes");
        store.move_agent(&agnes, &LocationId::new("town_square")).await.expect("move");
        let before = store.agent(&agnes).await.expect("agent");
        store.update_needs(&agnes, DEFAULT_NEED_DELTA).await.expect("tick");
        let after = store.agent(&agnes).await.expect("agent");
        assert!((after.needs.social - before.needs.social - 0.25).abs() < 1e-9);
    }

    #[tokio::test]
    async fn wake_window_is_idempotent_within_a_tick() {
        let store = seeded_store().await;
        let agnes = AgentId::new("agnes");
        store.set_state(&agnes, AgentActivityState::Sleeping).await.expect("sleep");
        {
            let mut guard = store.inner.write().await;
            guard.clock.current_hour = 6.1;
        }
        let first = store.wake_sleeping_agents().await;
        let second = store.wake_sleeping_agents().await;
        assert_eq!(first, vec![agnes]);
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn wake_outside_window_is_a_no_op() {
        let store = seeded_store().await;
        let agnes = AgentId::new("agnes");
        store.set_state(&agnes, AgentActivityState::Sleeping).await.expect("sleep");
        {
            let mut guard = store.inner.write().await;
            guard.clock.current_hour = 12.0;
        }
        let woken = store.wake_sleeping_agents().await;
        assert!(woken.is_empty());
        let agent = store.agent(&agnes).await.expect("agent");
        assert!(agent.is_sleeping());
    }
}
