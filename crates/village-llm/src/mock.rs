//! Deterministic mock backend for tests and dry runs.
//!
//! Per spec.md §4.7: "takes a pre-supplied ordered sequence of response
//! strings and returns them round-robin; it never touches the network
//! and must be interchangeable with the real client via the same
//! interface." [`crate::client::LlmClient::mock`] wraps this the same
//! way it wraps [`crate::llm::LlmBackend`], so callers never need to
//! know which one they hold.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Round-robins a fixed, pre-supplied sequence of response strings.
pub struct MockEngine {
    responses: Vec<String>,
    next_index: AtomicUsize,
}

impl MockEngine {
    /// Build a mock engine over a non-empty ordered response sequence.
    ///
    /// An empty sequence falls back to a single `"ACTION: wait"` response
    /// so the mock is never left with nothing to return.
    #[must_use]
    pub fn new(responses: Vec<String>) -> Self {
        let responses = if responses.is_empty() {
            vec!["ACTION: wait".to_owned()]
        } else {
            responses
        };
        Self {
            responses,
            next_index: AtomicUsize::new(0),
        }
    }

    /// Return the next response in the sequence, wrapping back to the
    /// start once exhausted.
    pub fn next(&self) -> String {
        let index = self.next_index.fetch_add(1, Ordering::Relaxed) % self.responses.len();
        self.responses[index].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robins_through_the_sequence() {
        let mock = MockEngine::new(vec!["ACTION: wait".to_owned(), "ACTION: rest".to_owned()]);
        assert_eq!(mock.next(), "ACTION: wait");
        assert_eq!(mock.next(), "ACTION: rest");
        assert_eq!(mock.next(), "ACTION: wait");
    }

    #[test]
    fn empty_sequence_falls_back_to_wait() {
        let mock = MockEngine::new(Vec::new());
        assert_eq!(mock.next(), "ACTION: wait");
    }

    #[test]
    fn single_response_repeats() {
        let mock = MockEngine::new(vec!["ACTION: sleep".to_owned()]);
        assert_eq!(mock.next(), "ACTION: sleep");
        assert_eq!(mock.next(), "ACTION: sleep");
    }
}
