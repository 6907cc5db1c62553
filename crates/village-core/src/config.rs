//! Configuration loading and typed config structures for the village
//! simulation.
//!
//! The canonical configuration lives in a YAML file. This module defines
//! strongly-typed structs mirroring that structure, with defaults for
//! every field so a missing or partial file still produces a runnable
//! configuration.

use std::path::Path;

use serde::Deserialize;

use village_memory::MemoryCaps;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// All fields have sensible defaults, so `VillageConfig::parse("")`
/// succeeds and produces a runnable configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VillageConfig {
    /// Real-world seconds per tick; mapped 1:1 onto in-world minutes
    /// advanced per tick.
    #[serde(default = "default_tick_interval_seconds")]
    pub tick_interval_seconds: u64,

    /// In-world hour at which sleeping agents wake (start of the wake
    /// window).
    #[serde(default = "default_day_start_hour")]
    pub day_start_hour: f64,

    /// In-world hour at which agents still awake are put to sleep.
    #[serde(default = "default_day_end_hour")]
    pub day_end_hour: f64,

    /// Model identifier passed to the LLM backend.
    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// Maximum number of cached LLM responses.
    #[serde(default = "default_llm_cache_size")]
    pub llm_cache_size: usize,

    /// Cache entry time-to-live, in seconds.
    #[serde(default = "default_llm_cache_ttl_seconds")]
    pub llm_cache_ttl_seconds: u64,

    /// Per-tier memory retention caps.
    #[serde(default)]
    pub memory_caps: MemoryCapsConfig,

    /// Maximum number of events retained in the event bus history ring.
    #[serde(default = "default_event_history_cap")]
    pub event_history_cap: usize,

    /// If false, the Action Decider always returns `wait` without
    /// calling the LLM client.
    #[serde(default = "default_true")]
    pub use_llm: bool,
}

impl Default for VillageConfig {
    fn default() -> Self {
        Self {
            tick_interval_seconds: default_tick_interval_seconds(),
            day_start_hour: default_day_start_hour(),
            day_end_hour: default_day_end_hour(),
            llm_model: default_llm_model(),
            llm_cache_size: default_llm_cache_size(),
            llm_cache_ttl_seconds: default_llm_cache_ttl_seconds(),
            memory_caps: MemoryCapsConfig::default(),
            event_history_cap: default_event_history_cap(),
            use_llm: true,
        }
    }
}

impl VillageConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// The in-world minutes a single tick advances the clock by.
    ///
    /// Per the design's open question, the scheduler maps
    /// `tick_interval_seconds` 1:1 onto in-world minutes; 30 real
    /// seconds is 30 in-world minutes by default.
    #[must_use]
    pub fn tick_minutes(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let seconds = self.tick_interval_seconds as f64;
        seconds
    }
}

/// Per-tier memory retention caps, mirrored from
/// [`village_memory::MemoryCaps`] so the config layer does not require
/// that type to implement `Deserialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MemoryCapsConfig {
    /// Maximum working-tier entries kept.
    #[serde(default = "default_working_cap")]
    pub working: usize,
    /// Maximum recent-tier entries kept.
    #[serde(default = "default_recent_cap")]
    pub recent: usize,
    /// Maximum longterm-tier entries kept.
    #[serde(default = "default_longterm_cap")]
    pub longterm: usize,
}

impl Default for MemoryCapsConfig {
    fn default() -> Self {
        Self {
            working: default_working_cap(),
            recent: default_recent_cap(),
            longterm: default_longterm_cap(),
        }
    }
}

impl MemoryCapsConfig {
    /// Convert to the runtime [`MemoryCaps`] value `village-memory`
    /// actually consumes.
    #[must_use]
    pub const fn to_memory_caps(self) -> MemoryCaps {
        MemoryCaps {
            working: self.working,
            recent: self.recent,
            longterm: self.longterm,
        }
    }
}

const fn default_tick_interval_seconds() -> u64 {
    30
}

const fn default_day_start_hour() -> f64 {
    6.0
}

const fn default_day_end_hour() -> f64 {
    22.0
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_owned()
}

const fn default_llm_cache_size() -> usize {
    1000
}

const fn default_llm_cache_ttl_seconds() -> u64 {
    3600
}

const fn default_event_history_cap() -> usize {
    1000
}

const fn default_working_cap() -> usize {
    10
}

const fn default_recent_cap() -> usize {
    7
}

const fn default_longterm_cap() -> usize {
    50
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_uses_every_default() {
        let config = VillageConfig::parse("").unwrap_or_else(|_| VillageConfig::default());
        assert_eq!(config, VillageConfig::default());
        assert_eq!(config.tick_interval_seconds, 30);
        assert_eq!(config.memory_caps.working, 10);
        assert!(config.use_llm);
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let yaml = "tick_interval_seconds: 60\nuse_llm: false\n";
        let config = VillageConfig::parse(yaml).unwrap_or_else(|_| VillageConfig::default());
        assert_eq!(config.tick_interval_seconds, 60);
        assert!(!config.use_llm);
        assert_eq!(config.llm_model, default_llm_model());
        assert_eq!(config.memory_caps.longterm, 50);
    }

    #[test]
    fn nested_memory_caps_override() {
        let yaml = "memory_caps:\n  working: 20\n  recent: 7\n  longterm: 100\n";
        let config = VillageConfig::parse(yaml).unwrap_or_else(|_| VillageConfig::default());
        assert_eq!(config.memory_caps.working, 20);
        assert_eq!(config.memory_caps.longterm, 100);
        assert_eq!(config.memory_caps.to_memory_caps().recent, 7);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let result = VillageConfig::parse("tick_interval_seconds: [not, a, number]\n");
        assert!(result.is_err());
    }

    #[test]
    fn tick_minutes_matches_tick_interval_seconds() {
        let config = VillageConfig {
            tick_interval_seconds: 45,
            ..VillageConfig::default()
        };
        assert!((config.tick_minutes() - 45.0).abs() < f64::EPSILON);
    }
}
