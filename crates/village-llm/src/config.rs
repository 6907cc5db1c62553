//! Configuration types for the LLM client.
//!
//! Backend secrets (API URLs, keys, model names) are infrastructure-adjacent
//! values and so are loaded from the environment rather than the YAML
//! config file; everything else about the client (cache size/TTL, usage
//! ring capacity) lives on `VillageConfig` in `village-core` instead,
//! since those are simulation parameters, not secrets.

use crate::error::LlmError;

/// Configuration for a single LLM backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// The backend type (`openai`-compatible or `anthropic`).
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier (e.g. `gpt-5-nano-2025-08-07`).
    pub model: String,
}

/// Supported LLM backend types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible chat completions API (works with `OpenAI`,
    /// `DeepSeek`, Ollama).
    OpenAi,
    /// Anthropic Messages API (different request/response shape).
    Anthropic,
}

impl LlmBackendConfig {
    /// Load a backend config from a set of prefixed environment variables:
    /// `{prefix}_BACKEND`, `{prefix}_API_URL`, `{prefix}_API_KEY`, `{prefix}_MODEL`.
    pub fn from_env(prefix: &str) -> Result<Self, LlmError> {
        let backend_str = env_var(&format!("{prefix}_BACKEND"))?;
        let api_url = env_var(&format!("{prefix}_API_URL"))?;
        let api_key = env_var(&format!("{prefix}_API_KEY"))?;
        let model = env_var(&format!("{prefix}_MODEL"))?;

        let backend_type = match backend_str.to_lowercase().as_str() {
            "openai" | "deepseek" | "ollama" => BackendType::OpenAi,
            "anthropic" | "claude" => BackendType::Anthropic,
            other => return Err(LlmError::Config(format!("unknown backend type: {other}"))),
        };

        Ok(Self {
            backend_type,
            api_url,
            api_key,
            model,
        })
    }
}

fn env_var(name: &str) -> Result<String, LlmError> {
    std::env::var(name).map_err(|e| LlmError::Config(format!("missing required env var {name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_type_parsing() {
        let config = LlmBackendConfig {
            backend_type: BackendType::OpenAi,
            api_url: "https://api.openai.com/v1".to_owned(),
            api_key: "test-key".to_owned(),
            model: "gpt-5-nano".to_owned(),
        };
        assert_eq!(config.backend_type, BackendType::OpenAi);

        let anthropic = LlmBackendConfig {
            backend_type: BackendType::Anthropic,
            api_url: "https://api.anthropic.com/v1".to_owned(),
            api_key: "test-key".to_owned(),
            model: "claude-haiku-4-5".to_owned(),
        };
        assert_eq!(anthropic.backend_type, BackendType::Anthropic);
    }

    #[test]
    fn missing_env_var_is_a_config_error() {
        let result = LlmBackendConfig::from_env("VILLAGE_LLM_TEST_MISSING_PREFIX");
        assert!(result.is_err());
    }
}
