//! Engine binary for the village simulation.
//!
//! Wires the seven library crates together into one running process:
//! load configuration, seed a starting world, build an LLM client (real
//! backend or mock, depending on configuration and environment), build
//! the Action Decider and tick scheduler, start the tick loop, and run
//! until interrupted.
//!
//! This binary owns no HTTP surface, no message bus client, and no
//! persistence backend: those remain the responsibility of an external
//! collaborator that embeds `village-core`'s types directly.
//!
//! # Startup sequence
//!
//! 1. Initialize structured logging (tracing).
//! 2. Load configuration from `village-config.yaml`, or defaults if absent.
//! 3. Seed a starting world (locations and agents).
//! 4. Build an LLM client: a real backend if `VILLAGE_LLM_*` environment
//!    variables are set, otherwise a deterministic mock.
//! 5. Build the Action Decider and tick scheduler.
//! 6. Start the tick loop and run until Ctrl-C.
//! 7. Stop the scheduler and log final health metrics.

mod seed;

use std::path::Path;

use anyhow::Context;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;
use village_core::config::VillageConfig;
use village_core::decision::ActionDecider;
use village_core::tick::TickScheduler;
use village_events::EventBus;
use village_llm::llm::create_backend;
use village_llm::usage::ModelRate;
use village_llm::{config::LlmBackendConfig, LlmClient};
use village_world::WorldStore;

/// Default starting cast size; see [`seed::build_world`].
const DEFAULT_SEED_COUNT: usize = 8;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration file exists but cannot be
/// parsed.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("village-engine starting");

    let config = load_config()?;
    info!(
        tick_interval_seconds = config.tick_interval_seconds,
        use_llm = config.use_llm,
        llm_model = %config.llm_model,
        "configuration loaded"
    );

    let world = WorldStore::new(seed::build_world(DEFAULT_SEED_COUNT));
    let agent_count = world.read().await.agents.len();
    let location_count = world.read().await.locations.len();
    info!(agent_count, location_count, "starting world seeded");

    let events = EventBus::with_capacity(config.event_history_cap, 1024);

    let llm = build_llm_client(&config);
    let decider = ActionDecider::new(llm, config.use_llm);
    let scheduler = TickScheduler::new(world, events, decider, config);

    scheduler.start().await;
    info!("tick scheduler started; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("shutdown signal received, stopping scheduler");

    scheduler.stop().await;

    let health = scheduler.health().await;
    info!(
        total_ticks = health.total_ticks,
        error_count = health.error_count,
        status = %health.status(),
        "village-engine shutdown complete"
    );

    Ok(())
}

/// Load configuration from `village-config.yaml` relative to the
/// current working directory, falling back to defaults when the file
/// does not exist.
fn load_config() -> anyhow::Result<VillageConfig> {
    let path = Path::new("village-config.yaml");
    if path.exists() {
        VillageConfig::from_file(path).context("failed to load village-config.yaml")
    } else {
        info!("config file not found, using defaults");
        Ok(VillageConfig::default())
    }
}

/// Build an LLM client: a real backend if `VILLAGE_LLM_*` environment
/// variables are all present, otherwise a deterministic mock that never
/// touches the network.
fn build_llm_client(_config: &VillageConfig) -> LlmClient {
    match LlmBackendConfig::from_env("VILLAGE_LLM") {
        Ok(backend_config) => {
            info!(backend = ?backend_config.backend_type, model = %backend_config.model, "LLM backend configured");
            let backend = create_backend(&backend_config);
            LlmClient::new(backend, default_rate())
        }
        Err(_) => {
            info!("no VILLAGE_LLM_* environment configured, using mock LLM client");
            LlmClient::mock(vec![String::from("ACTION: wait"), String::from("ACTION: observe")])
        }
    }
}

/// A flat zero-cost rate used until a deployment supplies a
/// model-specific rate table via environment-driven backend
/// configuration.
const fn default_rate() -> ModelRate {
    ModelRate {
        input_rate: Decimal::ZERO,
        output_rate: Decimal::ZERO,
    }
}
