//! Starting-world construction: the handful of locations and seed
//! agents the engine binary populates a fresh [`WorldState`] with.
//!
//! Uses a fixed name pool, a `rand`-driven personality roll per agent,
//! and even distribution of agents across the starting locations.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use village_types::{Agent, AgentActivityState, AgentId, Location, LocationId, Mood, Needs, Personality};
use village_world::WorldState;

/// Built-in pool of agent names. Names are assigned in order, so runs
/// with the same `seed_count` always produce the same cast.
const NAME_POOL: &[&str] = &[
    "Agnes", "Bram", "Clara", "Dorian", "Elin", "Finn", "Greta", "Hale",
    "Iris", "Jory", "Kestra", "Lum", "Mira", "Nox", "Orin", "Petra",
];

/// One starting location: its name, description, capacity, and the
/// names of the locations it connects to.
struct LocationSeed {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    capacity: u32,
    connections: &'static [&'static str],
}

/// The starting village map: a town square hub with five surrounding
/// locations, each reachable from the square and from at least one
/// neighbor.
const LOCATION_SEEDS: &[LocationSeed] = &[
    LocationSeed {
        id: "town_square",
        name: "Town Square",
        description: "The open center of the village, where every path meets.",
        capacity: 12,
        connections: &["bakery", "tavern", "fields", "workshop", "riverside"],
    },
    LocationSeed {
        id: "bakery",
        name: "Bakery",
        description: "Warm, flour-dusted, and smelling of the morning's first loaves.",
        capacity: 4,
        connections: &["town_square"],
    },
    LocationSeed {
        id: "tavern",
        name: "Tavern",
        description: "A low-ceilinged common room full of benches and gossip.",
        capacity: 8,
        connections: &["town_square"],
    },
    LocationSeed {
        id: "fields",
        name: "Fields",
        description: "Rows of crops stretching toward the tree line.",
        capacity: 6,
        connections: &["town_square", "riverside"],
    },
    LocationSeed {
        id: "workshop",
        name: "Workshop",
        description: "Sawdust, half-finished furniture, and the smell of varnish.",
        capacity: 4,
        connections: &["town_square"],
    },
    LocationSeed {
        id: "riverside",
        name: "Riverside",
        description: "The riverbank, quiet except for the water.",
        capacity: 6,
        connections: &["town_square", "fields"],
    },
];

/// Build the starting locations, with every connection listed in both
/// directions regardless of which side `LOCATION_SEEDS` names it from.
fn build_locations() -> BTreeMap<LocationId, Location> {
    let mut locations = BTreeMap::new();
    for seed in LOCATION_SEEDS {
        locations.insert(
            LocationId::new(seed.id),
            Location {
                id: LocationId::new(seed.id),
                name: seed.name.to_owned(),
                description: seed.description.to_owned(),
                connections: seed.connections.iter().map(|c| LocationId::new(*c)).collect(),
                objects: BTreeSet::new(),
                capacity: seed.capacity,
            },
        );
    }
    for seed in LOCATION_SEEDS {
        for &target in seed.connections {
            if let Some(location) = locations.get_mut(&LocationId::new(target)) {
                location.connections.insert(LocationId::new(seed.id));
            }
        }
    }
    locations
}

/// Roll a random personality: every trait uniform in `[1, 10]`.
fn random_personality(rng: &mut impl Rng) -> Personality {
    Personality {
        curiosity: rng.random_range(1..=10),
        empathy: rng.random_range(1..=10),
        ambition: rng.random_range(1..=10),
        discretion: rng.random_range(1..=10),
        energy: rng.random_range(1..=10),
        courage: rng.random_range(1..=10),
        charm: rng.random_range(1..=10),
        perception: rng.random_range(1..=10),
    }
}

/// Build `seed_count` agents with random personalities, distributed
/// round-robin across the starting locations, and the locations
/// themselves.
///
/// `seed_count` is clamped to [`NAME_POOL`]'s length: this is a fixed
/// starting cast, not an open-ended population generator.
pub fn build_world(seed_count: usize) -> WorldState {
    let mut rng = rand::rng();
    let locations = build_locations();
    let location_ids: Vec<LocationId> = locations.keys().cloned().collect();
    let mut location_cycle = location_ids.iter().cycle();

    let mut agents = BTreeMap::new();
    let count = seed_count.min(NAME_POOL.len());
    for name in NAME_POOL.iter().take(count) {
        let agent_id = AgentId::new(name.to_lowercase());
        let location_id = location_cycle
            .next()
            .cloned()
            .unwrap_or_else(|| LocationId::new("town_square"));
        agents.insert(
            agent_id.clone(),
            Agent {
                id: agent_id,
                display_name: (*name).to_owned(),
                personality: random_personality(&mut rng),
                narrative_prompt: format!("{name} lives in the village and goes about daily life."),
                location_id,
                inventory: BTreeSet::new(),
                mood: Mood::neutral(),
                needs: Needs::neutral(),
                state: AgentActivityState::Idle,
            },
        );
    }

    WorldState {
        clock: village_types::Clock::seed(),
        agents,
        locations,
        relationships: BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_location_connection_is_bidirectional() {
        let locations = build_locations();
        for location in locations.values() {
            for target in &location.connections {
                let reciprocal = locations
                    .get(target)
                    .expect("connection target exists");
                assert!(reciprocal.connections.contains(&location.id));
            }
        }
    }

    #[test]
    fn build_world_seeds_requested_agent_count() {
        let world = build_world(4);
        assert_eq!(world.agents.len(), 4);
        assert_eq!(world.locations.len(), LOCATION_SEEDS.len());
    }

    #[test]
    fn build_world_clamps_to_name_pool_size() {
        let world = build_world(1000);
        assert_eq!(world.agents.len(), NAME_POOL.len());
    }

    #[test]
    fn seeded_agents_are_distributed_across_locations() {
        let world = build_world(NAME_POOL.len());
        let occupied: BTreeSet<LocationId> = world.agents.values().map(|a| a.location_id.clone()).collect();
        assert_eq!(occupied.len(), LOCATION_SEEDS.len());
    }
}
