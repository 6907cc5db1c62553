//! Type-safe identifier wrappers around caller-assigned [`String`]s.
//!
//! Every entity in the simulation carries a stable, human-assigned id
//! (`"agnes"`, `"bakery"`) rather than a server-generated one: the
//! simulation is seeded from a fixed cast of agents and locations, and
//! those names are the ids callers already use when writing scenarios
//! and tests. Each id is still its own newtype so the compiler rejects
//! mixing an `AgentId` where a `LocationId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Create an id from any string-like value.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Borrow the id as a plain string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper, returning the inner [`String`].
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Stable identifier for an agent ("agnes", "bob").
    AgentId
}

define_id! {
    /// Stable identifier for a location ("bakery", "town_square").
    LocationId
}

define_id! {
    /// Stable identifier for an event recorded on the event bus.
    EventId
}

define_id! {
    /// Stable identifier for a goal instance belonging to one agent.
    GoalId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let agent = AgentId::new("agnes");
        let location = LocationId::new("bakery");
        assert_eq!(agent.as_str(), "agnes");
        assert_eq!(location.as_str(), "bakery");
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = AgentId::new("agnes");
        let json = serde_json::to_string(&original).expect("serialize");
        let restored: AgentId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(original, restored);
    }

    #[test]
    fn id_display_matches_raw_string() {
        let id = AgentId::new("bob");
        assert_eq!(id.to_string(), "bob");
    }

    #[test]
    fn id_from_str_and_string_agree() {
        let from_str: LocationId = "tavern".into();
        let from_string: LocationId = String::from("tavern").into();
        assert_eq!(from_str, from_string);
    }
}
