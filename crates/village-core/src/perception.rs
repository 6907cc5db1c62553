//! Per-agent perception assembly from world state.
//!
//! Builds the [`Perception`] an agent's Action Decider reasons over: the
//! agent's current location, who else is there, and what is around to
//! interact with. Perception is read-only; it never mutates the world.

use village_types::{AgentId, Perception};
use village_world::{WorldError, WorldStore};

/// Assemble an agent's perception of its immediate surroundings.
///
/// # Errors
///
/// Returns [`WorldError::AgentNotFound`] if `agent_id` does not exist, or
/// [`WorldError::LocationNotFound`] if the agent's location has been
/// removed from under it (should not happen in practice, since agents
/// and locations are seeded together and never independently deleted).
pub async fn perceive(agent_id: &AgentId, world: &WorldStore) -> Result<Perception, WorldError> {
    let agent = world.agent(agent_id).await?;
    let location = world.location(&agent.location_id).await?;

    let co_located_ids = world.co_located(agent_id).await?;
    let mut co_located_agents = Vec::with_capacity(co_located_ids.len());
    for id in &co_located_ids {
        let other = world.agent(id).await?;
        co_located_agents.push(other.display_name);
    }
    co_located_agents.sort();

    let objects = location.objects.iter().cloned().collect();

    Ok(Perception {
        location_id: location.id,
        location_name: location.name,
        co_located_agents,
        objects,
    })
}
