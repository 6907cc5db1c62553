//! LLM backend abstraction and implementations.
//!
//! Defines an enum-based dispatch for LLM backends, avoiding the
//! dyn-compatibility issues with async trait methods. Concrete
//! implementations exist for OpenAI-compatible APIs and the Anthropic
//! Messages API. All backends communicate over HTTP via `reqwest`.
//!
//! A backend sends a rendered prompt and returns the raw response text;
//! it has no opinion on the text's shape. [`crate::parse`] is responsible
//! for recovering an action from whatever text comes back.

use crate::config::{BackendType, LlmBackendConfig};
use crate::error::LlmError;
use crate::prompt::RenderedPrompt;

/// One completed backend call's raw outcome: text plus the token counts
/// the provider reported (needed for [`crate::usage::UsageTracker`]).
#[derive(Debug, Clone)]
pub struct BackendCompletion {
    /// The raw response text.
    pub text: String,
    /// Prompt tokens, if the provider reported them.
    pub tokens_in: u32,
    /// Completion tokens, if the provider reported them.
    pub tokens_out: u32,
}

// ---------------------------------------------------------------------------
// Unified backend enum (dyn-compatible alternative to async trait)
// ---------------------------------------------------------------------------

/// An LLM backend that can process a prompt and return a response.
///
/// Uses enum dispatch instead of trait objects because async methods
/// are not dyn-compatible in Rust.
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
}

impl LlmBackend {
    /// Send a prompt to the LLM and return the response.
    ///
    /// Dispatches to the concrete backend implementation.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Backend`] if the HTTP call fails or the
    /// response cannot be extracted. Callers (`LlmClient::complete`) catch
    /// this and fall back per spec.md §4.7 rather than propagating it.
    pub async fn complete(
        &self,
        prompt: &RenderedPrompt,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<BackendCompletion, LlmError> {
        match self {
            Self::OpenAi(backend) => backend.complete(prompt, max_tokens, temperature).await,
            Self::Anthropic(backend) => backend.complete(prompt, max_tokens, temperature).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }

    /// The configured model identifier, for usage records.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi(backend) => &backend.model,
            Self::Anthropic(backend) => &backend.model,
        }
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Works with `OpenAI`, `DeepSeek`, and Ollama endpoints.
/// Sends requests to `{api_url}/chat/completions`.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(config: &LlmBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Send a prompt and return the response.
    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<BackendCompletion, LlmError> {
        let url = format!("{}/chat/completions", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Backend(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(LlmError::Backend(format!(
                "OpenAI returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Backend(format!("OpenAI response parse failed: {e}")))?;

        extract_openai_completion(&json)
    }
}

/// Extract the text content and token usage from an `OpenAI` chat
/// completions response.
fn extract_openai_completion(json: &serde_json::Value) -> Result<BackendCompletion, LlmError> {
    let text = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            LlmError::Backend("OpenAI response missing choices[0].message.content".to_owned())
        })?;

    let tokens_in = u32::try_from(
        json.get("usage")
            .and_then(|u| u.get("prompt_tokens"))
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0),
    )
    .unwrap_or(u32::MAX);
    let tokens_out = u32::try_from(
        json.get("usage")
            .and_then(|u| u.get("completion_tokens"))
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0),
    )
    .unwrap_or(u32::MAX);

    Ok(BackendCompletion {
        text,
        tokens_in,
        tokens_out,
    })
}

// ---------------------------------------------------------------------------
// Anthropic Messages API backend
// ---------------------------------------------------------------------------

/// Backend for the Anthropic Messages API.
///
/// Anthropic uses a different request format from `OpenAI`:
/// - Uses `x-api-key` header instead of `Authorization: Bearer`
/// - Messages array does not include system (system is a top-level field)
/// - Response structure differs: `content[0].text`
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl AnthropicBackend {
    /// Create a new Anthropic Messages API backend.
    pub fn new(config: &LlmBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Send a prompt and return the response.
    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<BackendCompletion, LlmError> {
        let url = format!("{}/messages", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "temperature": temperature,
            "system": prompt.system,
            "messages": [
                {"role": "user", "content": prompt.user}
            ]
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Backend(format!("Anthropic request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(LlmError::Backend(format!(
                "Anthropic returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Backend(format!("Anthropic response parse failed: {e}")))?;

        extract_anthropic_completion(&json)
    }
}

/// Extract the text content and token usage from an Anthropic Messages
/// API response.
fn extract_anthropic_completion(json: &serde_json::Value) -> Result<BackendCompletion, LlmError> {
    let text = json
        .get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| LlmError::Backend("Anthropic response missing content[0].text".to_owned()))?;

    let tokens_in = u32::try_from(
        json.get("usage")
            .and_then(|u| u.get("input_tokens"))
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0),
    )
    .unwrap_or(u32::MAX);
    let tokens_out = u32::try_from(
        json.get("usage")
            .and_then(|u| u.get("output_tokens"))
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0),
    )
    .unwrap_or(u32::MAX);

    Ok(BackendCompletion {
        text,
        tokens_in,
        tokens_out,
    })
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create an LLM backend from configuration.
///
/// Dispatches to [`OpenAiBackend`] or [`AnthropicBackend`] based on the
/// configured [`BackendType`].
pub fn create_backend(config: &LlmBackendConfig) -> LlmBackend {
    match config.backend_type {
        BackendType::OpenAi => LlmBackend::OpenAi(OpenAiBackend::new(config)),
        BackendType::Anthropic => LlmBackend::Anthropic(AnthropicBackend::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_openai_completion_valid() {
        let json = serde_json::json!({
            "choices": [{"message": {"content": "ACTION: wait"}}],
            "usage": {"prompt_tokens": 42, "completion_tokens": 3}
        });
        let result = extract_openai_completion(&json).expect("extract");
        assert_eq!(result.text, "ACTION: wait");
        assert_eq!(result.tokens_in, 42);
        assert_eq!(result.tokens_out, 3);
    }

    #[test]
    fn extract_openai_completion_missing_choices() {
        let json = serde_json::json!({"error": "rate_limit"});
        assert!(extract_openai_completion(&json).is_err());
    }

    #[test]
    fn extract_anthropic_completion_valid() {
        let json = serde_json::json!({
            "content": [{"type": "text", "text": "ACTION: rest"}],
            "usage": {"input_tokens": 10, "output_tokens": 2}
        });
        let result = extract_anthropic_completion(&json).expect("extract");
        assert_eq!(result.text, "ACTION: rest");
        assert_eq!(result.tokens_in, 10);
        assert_eq!(result.tokens_out, 2);
    }

    #[test]
    fn extract_anthropic_completion_missing() {
        let json = serde_json::json!({"content": []});
        assert!(extract_anthropic_completion(&json).is_err());
    }

    #[test]
    fn create_backend_dispatches_correctly() {
        let openai_config = LlmBackendConfig {
            backend_type: BackendType::OpenAi,
            api_url: "https://api.openai.com/v1".to_owned(),
            api_key: "test".to_owned(),
            model: "test-model".to_owned(),
        };
        let backend = create_backend(&openai_config);
        assert_eq!(backend.name(), "openai-compatible");

        let anthropic_config = LlmBackendConfig {
            backend_type: BackendType::Anthropic,
            api_url: "https://api.anthropic.com/v1".to_owned(),
            api_key: "test".to_owned(),
            model: "test-model".to_owned(),
        };
        let backend = create_backend(&anthropic_config);
        assert_eq!(backend.name(), "anthropic");
    }
}
