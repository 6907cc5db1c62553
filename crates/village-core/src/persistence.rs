//! The persistence-layer contract (spec.md §6): `session() -> Transaction`
//! with commit/rollback and typed accessors matching the entities of
//! §3. This core assumes at-least snapshot isolation and that a
//! transaction failure raises, so the tick scheduler can roll back.
//!
//! No concrete implementation lives here -- database schema, migrations,
//! and seeding data content are explicitly out of scope (spec.md §1).
//! This trait exists so [`crate::tick::TickScheduler`] has a real seam
//! to depend on if a caller wires one in.
//!
//! Both traits use an associated type rather than `Box<dyn Trait>`:
//! async trait methods aren't dyn-compatible without pulling in
//! `async-trait`'s boxing shim (the same problem `village-llm`'s
//! `LlmBackend` sidesteps with enum dispatch instead, see `DESIGN.md`),
//! and with no concrete backend implemented here there is nothing that
//! needs dynamic dispatch in the first place.

use village_types::{Agent, Event, Goal, Location, Memory, Relationship};

/// Errors a [`PersistenceBackend`] implementation may raise. The
/// scheduler treats any error here as a spec.md §7 kind-3 transient
/// store failure: the current tick is rolled back and counted, the
/// scheduler continues.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The backend could not be reached or the operation otherwise failed.
    #[error("persistence backend error: {0}")]
    Backend(String),
    /// A commit was attempted on a transaction already committed or
    /// rolled back.
    #[error("transaction already closed")]
    AlreadyClosed,
}

/// One durable unit of work against the persistence layer.
///
/// Implementations are expected to offer at-least snapshot isolation:
/// reads inside an open transaction must not observe a concurrent
/// writer's partial effects.
pub trait Transaction: Send {
    /// Persist an agent's current state.
    fn put_agent(&mut self, agent: &Agent) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Persist a location's current state.
    fn put_location(&mut self, location: &Location) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Persist a relationship edge's current state.
    fn put_relationship(&mut self, relationship: &Relationship) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Append a memory entry.
    fn put_memory(&mut self, agent_id: &str, memory: &Memory) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Persist a goal's current state.
    fn put_goal(&mut self, agent_id: &str, goal: &Goal) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Append an event to durable storage (distinct from the in-memory
    /// event bus history ring -- this is the backing store an HTTP
    /// handler's historical queries would read from).
    fn put_event(&mut self, event: &Event) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Commit every write staged in this transaction.
    fn commit(self) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Discard every write staged in this transaction.
    fn rollback(self) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}

/// The persistence layer's entry point: opens a new [`Transaction`].
pub trait PersistenceBackend: Send + Sync {
    /// The concrete transaction type this backend opens.
    type Txn: Transaction;

    /// Open a new transaction against this backend.
    fn session(&self) -> impl Future<Output = Result<Self::Txn, PersistenceError>> + Send;
}
