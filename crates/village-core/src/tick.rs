//! The Tick Scheduler: the fixed-cadence loop that drives the whole
//! simulation forward one tick at a time.
//!
//! Each tick (spec.md §4.9): advance the clock, run the wake/sleep
//! sweeps, then for every agent in ascending id order apply need drift
//! and -- if awake -- perceive, decide, execute, remember, and refresh
//! goals. A `TICK` event closes out the tick, and health metrics are
//! updated whether or not the tick succeeded. A failure isolates to the
//! offending agent or, for a tick-setup failure, to the tick itself --
//! never to the process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use village_actions::{execute, ActionError};
use village_events::EventBus;
use village_goals::{refresh as refresh_goals, ReactiveTrigger};
use village_memory::MemoryStore;
use village_types::{Agent, AgentId, Event, EventType, Goal, GoalId, GoalType, Memory, MemoryKind};
use village_world::{WorldError, WorldStore, DEFAULT_NEED_DELTA};

use crate::config::VillageConfig;
use crate::decision::{ActionDecider, DecisionError};

/// Errors that can abort a tick before the agent loop runs.
///
/// All three are spec.md §7 kind-3/4 failures: they isolate to the
/// current tick (counted as an error, no `TICK` event published) rather
/// than propagating out of the scheduler loop.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The world store's clock failed to advance.
    #[error("world error advancing the tick: {0}")]
    World(#[from] WorldError),
    /// An action's effects could not be applied.
    #[error("action execution error: {0}")]
    Action(#[from] ActionError),
    /// The Action Decider could not produce a request.
    #[error("decision error: {0}")]
    Decision(#[from] DecisionError),
}

/// Coarse scheduler health, derived from [`HealthMetrics::error_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// No tick has recorded an error since the scheduler started.
    Healthy,
    /// At least one tick has recorded an error.
    Degraded,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
        })
    }
}

/// A point-in-time snapshot of the scheduler's running health, suitable
/// for logging or exposing to an external caller.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthMetrics {
    /// Seconds since [`TickScheduler::start`] was called.
    pub uptime_seconds: u64,
    /// Total ticks completed (successful or isolated-error) since start.
    pub total_ticks: u64,
    /// Ticks completed per minute of uptime.
    pub ticks_per_minute: f64,
    /// Cumulative count of ticks that recorded an error.
    pub error_count: u64,
    /// Wall-clock duration of the most recent tick, in milliseconds.
    pub last_tick_duration_ms: u64,
    /// Exponential moving average of tick duration, in milliseconds.
    pub avg_tick_duration_ms: f64,
    /// Number of agents whose action phase ran to completion last tick.
    pub agents_processed_last_tick: usize,
    /// Reserved for a future multi-queue backend. This scheduler runs
    /// ticks strictly one at a time, so nothing is ever queued.
    pub queue_depth: usize,
}

impl HealthMetrics {
    /// Derive [`HealthStatus`] from the running error count.
    #[must_use]
    pub const fn status(&self) -> HealthStatus {
        if self.error_count == 0 {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        }
    }
}

const HEALTH_EMA_ALPHA: f64 = 0.2;

/// Outcome of one successful tick, used only to update health metrics.
struct TickSummary {
    agents_processed: usize,
    /// Number of agents whose processing was caught and isolated this
    /// tick (spec.md §8 scenario 6: an isolated per-agent failure still
    /// counts toward `health.error_count`).
    agent_errors: u64,
}

/// The fixed-cadence driver of the whole simulation.
///
/// Cloning a [`TickScheduler`] shares the same world, event bus, memory
/// stores, goal lists, and health metrics -- every clone is a handle to
/// the same running (or stopped) scheduler, mirroring [`WorldStore`]'s
/// and [`EventBus`]'s own cheaply-clonable-handle shape.
#[derive(Clone)]
pub struct TickScheduler {
    world: WorldStore,
    events: EventBus,
    decider: Arc<ActionDecider>,
    config: VillageConfig,
    memories: Arc<Mutex<HashMap<AgentId, MemoryStore>>>,
    goals: Arc<Mutex<HashMap<AgentId, Vec<Goal>>>>,
    pending_reactive: Arc<Mutex<HashMap<AgentId, Vec<ReactiveTrigger>>>>,
    goal_seq: Arc<AtomicU64>,
    health: Arc<Mutex<HealthMetrics>>,
    started_at: Arc<Mutex<Option<Instant>>>,
    running: Arc<AtomicBool>,
    stop_requested: Arc<AtomicBool>,
    handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl TickScheduler {
    /// Build a scheduler over an already-seeded world. The scheduler is
    /// `stopped` until [`Self::start`] is called.
    #[must_use]
    pub fn new(world: WorldStore, events: EventBus, decider: ActionDecider, config: VillageConfig) -> Self {
        Self {
            world,
            events,
            decider: Arc::new(decider),
            config,
            memories: Arc::new(Mutex::new(HashMap::new())),
            goals: Arc::new(Mutex::new(HashMap::new())),
            pending_reactive: Arc::new(Mutex::new(HashMap::new())),
            goal_seq: Arc::new(AtomicU64::new(0)),
            health: Arc::new(Mutex::new(HealthMetrics::default())),
            started_at: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            stop_requested: Arc::new(AtomicBool::new(false)),
            handle: Arc::new(Mutex::new(None)),
        }
    }

    /// The world this scheduler drives, for callers (e.g. a binary's
    /// seeding step) that need direct access before the loop starts.
    #[must_use]
    pub const fn world(&self) -> &WorldStore {
        &self.world
    }

    /// The event bus this scheduler publishes to.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Whether the scheduler's background loop is currently running
    /// (including while a [`Self::stop`] is cooperatively draining it).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// A snapshot of the scheduler's current health metrics.
    pub async fn health(&self) -> HealthMetrics {
        self.health.lock().await.clone()
    }

    /// An agent's current memory entries, for an external status surface.
    pub async fn agent_memories(&self, agent_id: &AgentId) -> Vec<Memory> {
        self.memories
            .lock()
            .await
            .get(agent_id)
            .map(|store| store.entries().to_vec())
            .unwrap_or_default()
    }

    /// An agent's current goal list, for an external status surface.
    pub async fn agent_goals(&self, agent_id: &AgentId) -> Vec<Goal> {
        self.goals.lock().await.get(agent_id).cloned().unwrap_or_default()
    }

    /// Start the tick loop in the background. A no-op (with a warning)
    /// if the scheduler is already running: `stopped -> running`.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("scheduler start() called while already running; ignoring");
            return;
        }
        self.stop_requested.store(false, Ordering::SeqCst);
        *self.started_at.lock().await = Some(Instant::now());

        let scheduler = self.clone();
        let handle = tokio::spawn(async move { scheduler.run_loop().await });
        *self.handle.lock().await = Some(handle);
        info!("tick scheduler started");
    }

    /// Request a cooperative stop and wait for the in-flight tick (if
    /// any) to reach its next agent boundary: `running -> stopping ->
    /// stopped`. A no-op if the scheduler is not running.
    pub async fn stop(&self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        self.stop_requested.store(true, Ordering::SeqCst);
        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.running.store(false, Ordering::SeqCst);
        info!("tick scheduler stopped");
    }

    async fn run_loop(self) {
        loop {
            if self.stop_requested.load(Ordering::SeqCst) {
                break;
            }

            let tick_started = Instant::now();
            match self.run_one_tick().await {
                Ok(summary) => {
                    self.record_health(tick_started.elapsed(), summary.agents_processed, summary.agent_errors)
                        .await;
                }
                Err(err) => {
                    error!(error = %err, "tick isolated to an error, continuing to the next tick");
                    self.record_health(tick_started.elapsed(), 0, 1).await;
                }
            }

            if self.stop_requested.load(Ordering::SeqCst) {
                break;
            }
            let budget = Duration::from_secs(self.config.tick_interval_seconds);
            let sleep_for = budget.saturating_sub(tick_started.elapsed());
            tokio::time::sleep(sleep_for).await;
        }
    }

    /// Run exactly one tick's worth of work. Per-agent errors are caught
    /// and isolated inside the loop below; only a failure advancing the
    /// clock itself aborts the whole tick (spec.md §7 kinds 3-4).
    async fn run_one_tick(&self) -> Result<TickSummary, TickError> {
        let day_before = self.world.read().await.clock.current_day;

        self.world.advance_time(self.config.tick_minutes()).await?;
        let _woken = self.world.wake_sleeping_agents().await;
        let _slept = self.world.put_agents_to_sleep().await;

        let agent_ids = self.world.agent_ids_ascending().await;
        let mut processed = 0usize;
        let mut agent_errors = 0u64;
        let mut aborted = false;

        for agent_id in &agent_ids {
            if self.stop_requested.load(Ordering::SeqCst) {
                aborted = true;
                break;
            }
            match self.process_agent(agent_id).await {
                Ok(()) => processed += 1,
                Err(err) => {
                    agent_errors = agent_errors.saturating_add(1);
                    warn!(
                        agent = %agent_id.as_str(),
                        error = %err,
                        "agent processing failed, isolating to the next agent"
                    );
                }
            }
        }

        if aborted {
            debug!("tick aborted partway through by a stop request");
            return Ok(TickSummary { agents_processed: processed, agent_errors });
        }

        let tick = self.world.read().await.clock.current_tick;
        let day_after = self.world.read().await.clock.current_day;
        if day_after != day_before {
            self.compress_all_memories(tick).await;
        }

        let tick_event = Event {
            event_type: EventType::Tick,
            summary: format!("tick {tick} processed {processed} of {} agents", agent_ids.len()),
            timestamp: tick,
            actors: Vec::new(),
            location_id: None,
            detail: None,
            significance: 1,
            data: serde_json::Map::new(),
        };
        self.events.publish(tick_event).await;

        Ok(TickSummary { agents_processed: processed, agent_errors })
    }

    /// Drive one agent through need drift and, if awake, the full
    /// perceive/decide/execute/remember/refresh sequence.
    async fn process_agent(&self, agent_id: &AgentId) -> Result<(), TickError> {
        self.world.update_needs(agent_id, DEFAULT_NEED_DELTA).await?;

        let agent = self.world.agent(agent_id).await?;
        if agent.is_sleeping() {
            return Ok(());
        }

        let (memory_snapshot, goal_snapshot) = {
            let memories = self.memories.lock().await;
            let goals = self.goals.lock().await;
            // spec.md §4.8 step 3: the prompt draws on working + recent
            // memories only, never longterm -- longterm facts are
            // distilled summaries, not moment-to-moment context.
            let memory_snapshot = memories.get(agent_id).map_or_else(Vec::new, |store| {
                let mut snapshot: Vec<Memory> = store.get_working(5).into_iter().cloned().collect();
                snapshot.extend(store.get_recent(3).into_iter().cloned());
                snapshot
            });
            let goal_snapshot = goals.get(agent_id).cloned().unwrap_or_default();
            (memory_snapshot, goal_snapshot)
        };

        let request = self.decider.decide(agent_id, &self.world, &memory_snapshot, &goal_snapshot).await?;
        let (result, event) = execute(&request, &self.world).await?;

        if result.is_success() {
            if let Some(event) = event {
                self.record_success(agent_id, &event).await;
                self.events.publish(event).await;
            }
        }

        Ok(())
    }

    /// On a successful action: append a working memory for the acting
    /// agent, queue a reactive-goal trigger for every other named actor,
    /// then refresh the acting agent's own goal set (draining any
    /// reactive triggers queued for it by an earlier agent this tick or
    /// a prior one).
    async fn record_success(&self, agent_id: &AgentId, event: &Event) {
        let tick = event.timestamp;

        {
            let mut memories = self.memories.lock().await;
            let store = memories
                .entry(agent_id.clone())
                .or_insert_with(|| MemoryStore::new(self.config.memory_caps.to_memory_caps()));
            store.add(Memory {
                kind: MemoryKind::Working,
                content: event.summary.clone(),
                significance: event.significance,
                timestamp: tick,
                compressed: false,
            });
        }

        for other in event.actors.iter().filter(|actor| *actor != agent_id) {
            self.pending_reactive.lock().await.entry(other.clone()).or_default().push(ReactiveTrigger {
                goal_type: GoalType::RespondToEvent,
                target_id: Some(agent_id.clone()),
                description: event.summary.clone(),
            });
        }

        let Ok(agent) = self.world.agent(agent_id).await else {
            return;
        };
        let nearby_agent = self.world.co_located(agent_id).await.ok().and_then(|ids| ids.into_iter().next());
        let triggers = self.pending_reactive.lock().await.remove(agent_id).unwrap_or_default();

        let goal_seq = Arc::clone(&self.goal_seq);
        let mut goals = self.goals.lock().await;
        let current = goals.remove(agent_id).unwrap_or_default();
        let refreshed = refresh_goals(current, &agent, &triggers, nearby_agent, tick, move || next_goal_id(&goal_seq));
        goals.insert(agent_id.clone(), refreshed);
    }

    /// End-of-day compression for every agent with a non-empty working
    /// tier, using an LLM-backed summary when configured and the
    /// deterministic fallback otherwise.
    async fn compress_all_memories(&self, tick: u64) {
        let agent_ids: Vec<AgentId> = self.memories.lock().await.keys().cloned().collect();

        for agent_id in agent_ids {
            let working = {
                let memories = self.memories.lock().await;
                memories.get(&agent_id).map(MemoryStore::working_snapshot).unwrap_or_default()
            };
            if working.is_empty() {
                continue;
            }

            let (summary, facts) = if self.config.use_llm {
                let prompt = build_summary_prompt(&working);
                let response = self
                    .decider
                    .llm()
                    .complete_for(&prompt, None, 200, 0.3, true, tick, Some(agent_id.to_string()), Some("compress".to_owned()))
                    .await;
                parse_summary_response(&response.content, &working)
            } else {
                (MemoryStore::fallback_summary(&working), MemoryStore::fallback_facts(&working))
            };

            let mut memories = self.memories.lock().await;
            if let Some(store) = memories.get_mut(&agent_id) {
                let record = store.compress_with(tick, summary, facts);
                debug!(
                    agent = %agent_id.as_str(),
                    working = record.working_count,
                    facts = record.facts_extracted,
                    "end-of-day memory compression"
                );
            }
        }
    }

    async fn record_health(&self, elapsed: Duration, agents_processed: usize, error_increment: u64) {
        let mut health = self.health.lock().await;
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        health.total_ticks = health.total_ticks.saturating_add(1);
        health.last_tick_duration_ms = elapsed_ms;
        #[allow(clippy::cast_precision_loss)]
        let elapsed_f = elapsed_ms as f64;
        health.avg_tick_duration_ms = if health.total_ticks <= 1 {
            elapsed_f
        } else {
            HEALTH_EMA_ALPHA.mul_add(elapsed_f, (1.0 - HEALTH_EMA_ALPHA) * health.avg_tick_duration_ms)
        };
        health.agents_processed_last_tick = agents_processed;
        if error_increment > 0 {
            health.error_count = health.error_count.saturating_add(error_increment);
        }

        if let Some(started) = *self.started_at.lock().await {
            health.uptime_seconds = started.elapsed().as_secs();
            #[allow(clippy::cast_precision_loss)]
            let minutes = (health.uptime_seconds as f64 / 60.0).max(1.0 / 60.0);
            #[allow(clippy::cast_precision_loss)]
            let total_ticks_f = health.total_ticks as f64;
            health.ticks_per_minute = total_ticks_f / minutes;
        }
    }
}

fn next_goal_id(seq: &AtomicU64) -> GoalId {
    let n = seq.fetch_add(1, Ordering::Relaxed);
    GoalId::new(format!("goal-{n}"))
}

fn build_summary_prompt(working: &[Memory]) -> String {
    let mut prompt = String::from(
        "Summarize the day below in one sentence, then list up to five standalone facts \
         worth remembering long-term, each on its own line prefixed with \"FACT:\".\n\n",
    );
    for memory in working {
        prompt.push_str("- ");
        prompt.push_str(&memory.content);
        prompt.push('\n');
    }
    prompt
}

fn parse_summary_response(content: &str, working: &[Memory]) -> (String, Vec<String>) {
    if content.trim().is_empty() {
        return (MemoryStore::fallback_summary(working), MemoryStore::fallback_facts(working));
    }

    let mut summary_lines = Vec::new();
    let mut facts = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(fact) = trimmed.strip_prefix("FACT:").or_else(|| trimmed.strip_prefix("fact:")) {
            facts.push(fact.trim().to_owned());
        } else {
            summary_lines.push(trimmed.to_owned());
        }
    }

    let summary = if summary_lines.is_empty() {
        MemoryStore::fallback_summary(working)
    } else {
        summary_lines.join(" ")
    };
    (summary, facts)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use village_types::{AgentActivityState, LocationId, Mood, Needs, Personality};
    use village_world::{WorldState, WorldStore};

    use super::*;
    use crate::decision::ActionDecider;

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

    fn make_location(id: &str, connections: &[&str]) -> village_types::Location {
        village_types::Location {
            id: LocationId::from(id),
            name: id.to_owned(),
            description: "a quiet place".to_owned(),
            connections: connections.iter().map(|c| LocationId::from(*c)).collect(),
            objects: BTreeSet::new(),
            capacity: 10,
        }
    }

    async fn seeded_scheduler(responses: Vec<String>) -> TickScheduler {
        let world = WorldStore::new(WorldState::default());
        world.seed_location(make_location("bakery", &["town_square"])).await.expect("seed");
        world.seed_location(make_location("town_square", &["bakery"])).await.expect("seed");
        world.seed_agent(make_agent("agnes", "Agnes", "bakery")).await.expect("seed");
        world.seed_agent(make_agent("bob", "Bob", "town_square")).await.expect("seed");

        let decider = ActionDecider::new(village_llm::LlmClient::mock(responses), true);
        let config = VillageConfig {
            tick_interval_seconds: 1,
            ..VillageConfig::default()
        };
        TickScheduler::new(world, EventBus::new(), decider, config)
    }

    #[tokio::test]
    async fn single_tick_advances_clock_and_publishes_tick_event() {
        let scheduler = seeded_scheduler(vec!["ACTION: wait".to_owned()]).await;
        let mut sub = scheduler.events().subscribe().await;

        let before_tick = scheduler.world().read().await.clock.current_tick;
        scheduler.run_one_tick().await.expect("tick runs");
        let after_tick = scheduler.world().read().await.clock.current_tick;
        assert!(after_tick > before_tick);

        let mut saw_tick_event = false;
        while let Some(event) = sub.try_recv() {
            if event.event_type == EventType::Tick {
                saw_tick_event = true;
            }
        }
        assert!(saw_tick_event);
    }

    #[tokio::test]
    async fn successful_move_records_working_memory_and_refreshes_goals() {
        let scheduler = seeded_scheduler(vec!["ACTION: move town_square".to_owned(), "ACTION: wait".to_owned()]).await;
        scheduler.run_one_tick().await.expect("tick runs");

        let memories = scheduler.agent_memories(&AgentId::from("agnes")).await;
        assert!(memories.iter().any(|m| m.content.contains("moves to")));
    }

    #[tokio::test]
    async fn sleeping_agent_is_skipped_without_error() {
        let scheduler = seeded_scheduler(vec!["ACTION: wait".to_owned()]).await;
        scheduler
            .world()
            .set_state(&AgentId::from("agnes"), AgentActivityState::Sleeping)
            .await
            .expect("set state");
        let result = scheduler.run_one_tick().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn start_and_stop_round_trip_cleanly() {
        let scheduler = seeded_scheduler(vec!["ACTION: wait".to_owned()]).await;
        scheduler.start().await;
        assert!(scheduler.is_running());
        scheduler.stop().await;
        assert!(!scheduler.is_running());
        let health = scheduler.health().await;
        assert!(health.total_ticks >= 1);
    }

    #[tokio::test]
    async fn health_status_degrades_after_a_recorded_error() {
        let scheduler = seeded_scheduler(vec!["ACTION: wait".to_owned()]).await;
        scheduler.record_health(Duration::from_millis(5), 2, 1).await;
        let health = scheduler.health().await;
        assert_eq!(health.status(), HealthStatus::Degraded);
        assert_eq!(health.error_count, 1);
    }

    #[tokio::test]
    async fn isolated_agent_error_is_counted_and_does_not_block_other_agents() {
        // spec.md §8 scenario 6: the Decider raises for one agent; the
        // others must still be processed, and the error must register in
        // health metrics (status flips to degraded).
        let world = WorldStore::new(WorldState::default());
        world.seed_location(make_location("bakery", &["town_square"])).await.expect("seed");
        world.seed_location(make_location("town_square", &["bakery"])).await.expect("seed");
        world.seed_agent(make_agent("agnes", "Agnes", "bakery")).await.expect("seed");
        // "ben" is seeded pointing at a location that was never seeded,
        // so the Decider's `world.location()` lookup fails for this one
        // agent and `process_agent` returns `Err` -- isolated to "ben"
        // without aborting the tick.
        world.seed_agent(make_agent("ben", "Ben", "nowhere")).await.expect("seed");
        world.seed_agent(make_agent("carlos", "Carlos", "town_square")).await.expect("seed");

        let decider = ActionDecider::new(village_llm::LlmClient::mock(vec!["ACTION: wait".to_owned()]), true);
        let config = VillageConfig { tick_interval_seconds: 1, ..VillageConfig::default() };
        let scheduler = TickScheduler::new(world, EventBus::new(), decider, config);

        let summary = scheduler.run_one_tick().await.expect("tick isolates the one agent's error");
        assert_eq!(summary.agents_processed, 2, "agnes and carlos are still processed");
        assert_eq!(summary.agent_errors, 1, "ben's decision error is counted exactly once");

        scheduler.record_health(Duration::from_millis(1), summary.agents_processed, summary.agent_errors).await;
        let health = scheduler.health().await;
        assert_eq!(health.error_count, 1);
        assert_eq!(health.status(), HealthStatus::Degraded);
    }
}
