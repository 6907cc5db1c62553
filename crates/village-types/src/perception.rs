//! The Perception contract: what an agent can observe about its
//! immediate surroundings.

use serde::{Deserialize, Serialize};

use crate::ids::LocationId;

/// A pure snapshot of what one agent currently observes.
///
/// Built by `perceive(agent) -> Perception`; carries no world-mutating
/// capability and is cheap to construct fresh every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perception {
    /// The agent's current location.
    pub location_id: LocationId,
    /// The current location's display name.
    pub location_name: String,
    /// Display names of other agents co-located with the perceiving agent
    /// (the perceiving agent itself is always excluded).
    pub co_located_agents: Vec<String>,
    /// Objects currently present at the location.
    pub objects: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perception_excludes_self_by_construction() {
        let perception = Perception {
            location_id: LocationId::new("bakery"),
            location_name: String::from("Bakery"),
            co_located_agents: vec![String::from("Bob")],
            objects: vec![String::from("oven")],
        };
        assert!(!perception.co_located_agents.contains(&String::from("Agnes")));
    }
}
