//! The public LLM client: backend-or-mock dispatch wrapped with the
//! cache and usage tracker, behind the single `complete()` contract from
//! spec.md §4.7.

use std::time::{Duration, Instant};

use tracing::warn;

use crate::cache::{CachedResponse, ResponseCache};
use crate::llm::LlmBackend;
use crate::mock::MockEngine;
use crate::usage::{ModelRate, UsageTracker};

/// The fallback content returned on any upstream failure or precondition
/// violation (spec.md §4.7).
pub const FALLBACK_CONTENT: &str = "I'll wait and observe.";

/// One completed (or gracefully-failed-over) call's result.
#[derive(Debug, Clone)]
pub struct Response {
    /// The response text.
    pub content: String,
    /// The model identifier that served this response (`"mock"` for
    /// [`LlmClient::mock`]).
    pub model: String,
    /// Prompt tokens consumed.
    pub tokens_in: u32,
    /// Completion tokens consumed.
    pub tokens_out: u32,
    /// Whether this response was served from the response cache.
    pub cached: bool,
    /// Round-trip latency in milliseconds.
    pub latency_ms: u64,
}

enum Engine {
    Backend(LlmBackend),
    Mock(MockEngine),
}

/// The client every caller in this workspace talks to: a real backend or
/// a [`MockEngine`], wrapped with a [`ResponseCache`] and a
/// [`UsageTracker`]. Both variants are constructed behind the same type,
/// so `village-core`'s Action Decider never has to match on which one it
/// holds.
pub struct LlmClient {
    engine: Engine,
    model: String,
    cache: ResponseCache,
    usage: UsageTracker,
}

impl LlmClient {
    /// Build a client backed by a real LLM backend.
    #[must_use]
    pub fn new(backend: LlmBackend, rate: ModelRate) -> Self {
        let model = backend.model().to_owned();
        Self {
            engine: Engine::Backend(backend),
            model,
            cache: ResponseCache::new(),
            usage: UsageTracker::new(rate, std::collections::HashMap::new()),
        }
    }

    /// Build a client backed by a deterministic [`MockEngine`] over
    /// `responses`, returned round-robin. Never touches the network.
    #[must_use]
    pub fn mock(responses: Vec<String>) -> Self {
        Self {
            engine: Engine::Mock(MockEngine::new(responses)),
            model: "mock".to_owned(),
            cache: ResponseCache::new(),
            usage: UsageTracker::new(
                ModelRate {
                    input_rate: rust_decimal::Decimal::ZERO,
                    output_rate: rust_decimal::Decimal::ZERO,
                },
                std::collections::HashMap::new(),
            ),
        }
    }

    /// The usage tracker backing this client, for callers that want to
    /// inspect or reset the running aggregate.
    #[must_use]
    pub const fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Complete one prompt.
    ///
    /// Never fails: on an invalid precondition (`max_tokens == 0`,
    /// `temperature` outside `[0, 2]`) or an upstream backend error, this
    /// returns the fallback response per spec.md §4.7 rather than
    /// raising.
    pub async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
        max_tokens: u32,
        temperature: f64,
        use_cache: bool,
    ) -> Response {
        self.complete_for(prompt, system, max_tokens, temperature, use_cache, 0, None, None)
            .await
    }

    /// Full form of [`Self::complete`] that also stamps a usage record
    /// with the caller's tick timestamp, acting agent, and call-type
    /// label.
    #[allow(clippy::too_many_arguments)]
    pub async fn complete_for(
        &self,
        prompt: &str,
        system: Option<&str>,
        max_tokens: u32,
        temperature: f64,
        use_cache: bool,
        timestamp: u64,
        agent_id: Option<String>,
        call_type: Option<String>,
    ) -> Response {
        if max_tokens == 0 || !(0.0..=2.0).contains(&temperature) {
            warn!(max_tokens, temperature, "invalid LLM request precondition, returning fallback");
            return self.fallback_response(0);
        }

        let cache_key_prompt = combined_prompt(system, prompt);

        if use_cache {
            if let Some(cached) = self.cache.get(&self.model, &cache_key_prompt) {
                self.usage.record(
                    timestamp,
                    &self.model,
                    cached.tokens_in,
                    cached.tokens_out,
                    0,
                    true,
                    agent_id,
                    call_type,
                );
                return Response {
                    content: cached.content,
                    model: self.model.clone(),
                    tokens_in: cached.tokens_in,
                    tokens_out: cached.tokens_out,
                    cached: true,
                    latency_ms: 0,
                };
            }
        }

        let started = Instant::now();
        let outcome = match &self.engine {
            Engine::Backend(backend) => {
                backend
                    .complete(
                        &crate::prompt::RenderedPrompt {
                            system: system.unwrap_or_default().to_owned(),
                            user: prompt.to_owned(),
                        },
                        max_tokens,
                        temperature,
                    )
                    .await
            }
            Engine::Mock(mock) => Ok(crate::llm::BackendCompletion {
                text: mock.next(),
                tokens_in: 0,
                tokens_out: 0,
            }),
        };
        let latency_ms = elapsed_ms(started);

        let completion = match outcome {
            Ok(completion) => completion,
            Err(err) => {
                warn!(error = %err, "LLM backend call failed, returning fallback");
                return self.fallback_response(latency_ms);
            }
        };

        if use_cache {
            self.cache.insert(
                &self.model,
                &cache_key_prompt,
                CachedResponse {
                    content: completion.text.clone(),
                    tokens_in: completion.tokens_in,
                    tokens_out: completion.tokens_out,
                },
            );
        }

        self.usage.record(
            timestamp,
            &self.model,
            completion.tokens_in,
            completion.tokens_out,
            latency_ms,
            false,
            agent_id,
            call_type,
        );

        Response {
            content: completion.text,
            model: self.model.clone(),
            tokens_in: completion.tokens_in,
            tokens_out: completion.tokens_out,
            cached: false,
            latency_ms,
        }
    }

    fn fallback_response(&self, latency_ms: u64) -> Response {
        Response {
            content: FALLBACK_CONTENT.to_owned(),
            model: self.model.clone(),
            tokens_in: 0,
            tokens_out: 0,
            cached: false,
            latency_ms: latency_ms.max(1),
        }
    }
}

fn combined_prompt(system: Option<&str>, prompt: &str) -> String {
    match system {
        Some(system) => format!("{system}\u{0}{prompt}"),
        None => prompt.to_owned(),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    let elapsed: Duration = started.elapsed();
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_client_round_robins_and_never_touches_network() {
        let client = LlmClient::mock(vec!["ACTION: wait".to_owned(), "ACTION: rest".to_owned()]);
        let first = client.complete("hello", None, 100, 0.7, false).await;
        let second = client.complete("hello", None, 100, 0.7, false).await;
        assert_eq!(first.content, "ACTION: wait");
        assert_eq!(second.content, "ACTION: rest");
        assert_eq!(first.model, "mock");
    }

    #[tokio::test]
    async fn invalid_max_tokens_returns_fallback() {
        let client = LlmClient::mock(vec!["ACTION: wait".to_owned()]);
        let response = client.complete("hello", None, 0, 0.7, false).await;
        assert_eq!(response.content, FALLBACK_CONTENT);
        assert_eq!(response.tokens_in, 0);
        assert!(!response.cached);
    }

    #[tokio::test]
    async fn invalid_temperature_returns_fallback() {
        let client = LlmClient::mock(vec!["ACTION: wait".to_owned()]);
        let response = client.complete("hello", None, 100, 2.5, false).await;
        assert_eq!(response.content, FALLBACK_CONTENT);
    }

    #[tokio::test]
    async fn cache_hit_is_flagged_and_skips_the_engine() {
        let client = LlmClient::mock(vec!["ACTION: wait".to_owned(), "ACTION: rest".to_owned()]);
        let first = client.complete("hello", None, 100, 0.7, true).await;
        let second = client.complete("hello", None, 100, 0.7, true).await;
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.content, first.content);
    }

    #[tokio::test]
    async fn use_cache_false_always_calls_through() {
        let client = LlmClient::mock(vec!["ACTION: wait".to_owned(), "ACTION: rest".to_owned()]);
        let first = client.complete("hello", None, 100, 0.7, false).await;
        let second = client.complete("hello", None, 100, 0.7, false).await;
        assert!(!first.cached);
        assert!(!second.cached);
        assert_ne!(first.content, second.content);
    }

    #[tokio::test]
    async fn usage_tracker_accumulates_across_calls() {
        let client = LlmClient::mock(vec!["ACTION: wait".to_owned()]);
        client.complete("hello", None, 100, 0.7, false).await;
        client.complete("hello again", None, 100, 0.7, false).await;
        assert_eq!(client.usage().aggregate().total_calls, 2);
    }
}
