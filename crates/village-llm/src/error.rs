//! Error types for the LLM client.

/// Errors surfaced while building or validating an LLM client call.
///
/// Upstream backend failures do not appear here: per spec.md §4.7 the
/// client never raises on an upstream error, it returns a fallback
/// [`crate::client::Response`] instead. These variants are for
/// programmer-visible misuse (bad config, malformed preconditions).
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// A precondition on `complete()`'s inputs was violated
    /// (`max_tokens == 0`, `temperature` outside `[0, 2]`).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An LLM backend returned an error or was unreachable.
    ///
    /// Caught internally by [`crate::client::LlmClient::complete`] and
    /// converted into a fallback [`crate::client::Response`]; it never
    /// escapes the client.
    #[error("LLM backend error: {0}")]
    Backend(String),
}
