//! Response cache for the LLM client.
//!
//! Keyed by `hash(model || prompt)` per spec.md §4.7. A `Mutex`-guarded
//! `HashMap` plays the same role as `village-events`'s subscriber map:
//! single-lock, short critical sections, no async needed since nothing
//! here suspends.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default cache capacity (spec.md §4.7: "capacity default 1000 entries").
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default cache entry TTL (spec.md §4.7: "TTL default 3600 s").
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// A cached LLM response, independent of whether this particular lookup
/// was a hit or miss.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    /// The response text.
    pub content: String,
    /// Prompt tokens reported by the original call.
    pub tokens_in: u32,
    /// Completion tokens reported by the original call.
    pub tokens_out: u32,
}

struct Entry {
    response: CachedResponse,
    inserted_at: Instant,
    sequence: u64,
}

/// A bounded, TTL-expiring cache of LLM responses.
pub struct ResponseCache {
    capacity: usize,
    ttl: Duration,
    next_sequence: Mutex<u64>,
    entries: Mutex<HashMap<u64, Entry>>,
}

impl ResponseCache {
    /// Build a cache with the default capacity and TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    /// Build a cache with explicit capacity and TTL.
    #[must_use]
    pub fn with_capacity_and_ttl(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            next_sequence: Mutex::new(0),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The cache key for a `(model, prompt)` pair: `hash(model || prompt)`.
    fn key(model: &str, prompt: &str) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        model.hash(&mut hasher);
        prompt.hash(&mut hasher);
        hasher.finish()
    }

    /// Look up a cached response. Returns `None` on a miss or on an
    /// expired entry (which is also evicted as a side effect).
    pub fn get(&self, model: &str, prompt: &str) -> Option<CachedResponse> {
        let key = Self::key(model, prompt);
        let mut entries = self.entries.lock().ok()?;
        let is_expired = entries
            .get(&key)
            .is_some_and(|e| e.inserted_at.elapsed() >= self.ttl);
        if is_expired {
            entries.remove(&key);
            return None;
        }
        entries.get(&key).map(|e| e.response.clone())
    }

    /// Insert a response, evicting the oldest 25% by insertion time if
    /// the cache is already at capacity.
    pub fn insert(&self, model: &str, prompt: &str, response: CachedResponse) {
        let key = Self::key(model, prompt);
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            evict_oldest_quarter(&mut entries);
        }
        let sequence = {
            let Ok(mut seq) = self.next_sequence.lock() else {
                return;
            };
            let current = *seq;
            *seq = seq.wrapping_add(1);
            current
        };
        entries.insert(
            key,
            Entry {
                response,
                inserted_at: Instant::now(),
                sequence,
            },
        );
    }

    /// Current number of live entries, including any not yet lazily
    /// expired.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the cache currently holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop the oldest 25% of entries by insertion sequence.
fn evict_oldest_quarter(entries: &mut HashMap<u64, Entry>) {
    let evict_count = (entries.len() / 4).max(1);
    let mut by_age: Vec<(u64, u64)> = entries.iter().map(|(k, e)| (*k, e.sequence)).collect();
    by_age.sort_by_key(|(_, sequence)| *sequence);
    for (key, _) in by_age.into_iter().take(evict_count) {
        entries.remove(&key);
    }
}
