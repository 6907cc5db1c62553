//! Configuration, perception, decision, and tick orchestration for the
//! village simulation core.
//!
//! This crate wires the other seven crates (`village-world`,
//! `village-memory`, `village-goals`, `village-actions`,
//! `village-events`, `village-llm`) together into one running
//! simulation: a [`config::VillageConfig`] loaded from YAML, a
//! [`decision::ActionDecider`] that turns a perceived moment into a
//! requested action, and a [`tick::TickScheduler`] that drives the
//! whole thing forward at a fixed cadence.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from YAML into strongly-typed
//!   structs.
//! - [`perception`] -- Per-agent perception assembly from world state.
//! - [`decision`] -- The Action Decider: prompt, LLM call, parse, resolve.
//! - [`tick`] -- The fixed-cadence [`tick::TickScheduler`] loop.
//! - [`query`] -- Read-side getters for external collaborators (spec.md §6).
//! - [`persistence`] -- The persistence-layer contract (spec.md §6), no
//!   concrete backend.

pub mod config;
pub mod decision;
pub mod perception;
pub mod persistence;
pub mod query;
pub mod tick;
