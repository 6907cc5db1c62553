//! The three-tier [`MemoryStore`]: working, recent, and longterm.

use village_types::{Memory, MemoryKind};

/// Retention caps per tier, per spec.md §3: working 10, recent 7,
/// longterm 50.
#[derive(Debug, Clone, Copy)]
pub struct MemoryCaps {
    /// Maximum working-tier entries kept.
    pub working: usize,
    /// Maximum recent-tier entries kept.
    pub recent: usize,
    /// Maximum longterm-tier entries kept.
    pub longterm: usize,
}

impl Default for MemoryCaps {
    fn default() -> Self {
        Self {
            working: 10,
            recent: 7,
            longterm: 50,
        }
    }
}

/// Injected end-of-day summarization. A concrete LLM-backed
/// implementation lives in `village-core`, which depends on both this
/// crate and `village-llm`; keeping the dependency direction here
/// pointing the other way (trait, not concrete client) avoids a cycle.
pub trait Summarizer {
    /// Produce a one-paragraph summary of a day's working memories.
    /// Returning `None` falls back to the top-3-significance summary.
    fn summarize(&self, working: &[Memory]) -> Option<String>;

    /// Extract up to five standalone facts worth retaining long-term.
    /// Returning `None` falls back to entries with significance `>= 6`.
    fn extract_facts(&self, working: &[Memory]) -> Option<Vec<String>>;
}

/// The record of one end-of-day compression pass, useful for logging
/// and for the health/status surface.
#[derive(Debug, Clone)]
pub struct CompressionRecord {
    /// Tick the compression ran at.
    pub tick: u64,
    /// Number of working memories compressed away.
    pub working_count: usize,
    /// Number of facts extracted to longterm.
    pub facts_extracted: usize,
}

/// An agent's three-tier memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Vec<Memory>,
    caps: MemoryCaps,
}

impl MemoryStore {
    /// Build an empty store with the given caps.
    #[must_use]
    pub fn new(caps: MemoryCaps) -> Self {
        Self {
            entries: Vec::new(),
            caps,
        }
    }

    /// All entries, in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[Memory] {
        &self.entries
    }

    /// Entries in the working tier.
    #[must_use]
    pub fn working(&self) -> Vec<&Memory> {
        self.by_kind(MemoryKind::Working)
    }

    /// Entries in the recent tier.
    #[must_use]
    pub fn recent(&self) -> Vec<&Memory> {
        self.by_kind(MemoryKind::Recent)
    }

    /// Entries in the longterm tier.
    #[must_use]
    pub fn longterm(&self) -> Vec<&Memory> {
        self.by_kind(MemoryKind::Longterm)
    }

    fn by_kind(&self, kind: MemoryKind) -> Vec<&Memory> {
        self.entries.iter().filter(|m| m.kind == kind).collect()
    }

    /// The `n` most recent working memories, newest first, per spec.md
    /// §4.5's retrieval contract.
    #[must_use]
    pub fn get_working(&self, n: usize) -> Vec<&Memory> {
        newest_first(self.working(), n)
    }

    /// The `n` most recent recent-tier memories, newest first.
    #[must_use]
    pub fn get_recent(&self, n: usize) -> Vec<&Memory> {
        newest_first(self.recent(), n)
    }

    /// The `n` most significant longterm memories, highest significance
    /// first.
    #[must_use]
    pub fn get_longterm(&self, n: usize) -> Vec<&Memory> {
        let mut tier = self.longterm();
        tier.sort_by(|a, b| b.significance.cmp(&a.significance).then(b.timestamp.cmp(&a.timestamp)));
        tier.truncate(n);
        tier
    }

    /// Write a memory, routing it by its `kind`, then evict down to cap
    /// if the tier it landed in is now over capacity.
    pub fn add(&mut self, memory: Memory) {
        let kind = memory.kind;
        self.entries.push(memory);
        self.evict_overflow(kind);
    }

    fn cap_for(&self, kind: MemoryKind) -> usize {
        match kind {
            MemoryKind::Working => self.caps.working,
            MemoryKind::Recent => self.caps.recent,
            MemoryKind::Longterm => self.caps.longterm,
        }
    }

    /// Evict from `kind`'s tier, lowest-significance-then-oldest, until
    /// it is back at or under its cap (design notes open question c).
    fn evict_overflow(&mut self, kind: MemoryKind) {
        let cap = self.cap_for(kind);
        loop {
            let count = self.entries.iter().filter(|m| m.kind == kind).count();
            if count <= cap {
                break;
            }
            let victim_index = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, m)| m.kind == kind)
                .min_by_key(|(idx, m)| (m.significance, m.timestamp, *idx))
                .map(|(idx, _)| idx);
            match victim_index {
                Some(idx) => {
                    self.entries.remove(idx);
                }
                None => break,
            }
        }
    }

    /// Apply significance decay to every working/recent memory whose age
    /// (in days) has advanced since it was written. Optional: the
    /// scheduler need not call this every tick.
    pub fn decay_all(&mut self, current_tick: u64, ticks_per_day: u64) {
        if ticks_per_day == 0 {
            return;
        }
        for memory in &mut self.entries {
            let age_ticks = current_tick.saturating_sub(memory.timestamp);
            let days = age_ticks / ticks_per_day;
            memory.significance = crate::significance::decay_significance(memory.significance, days);
        }
    }

    /// Run the end-of-day compression algorithm:
    /// 1. Pull all working memories.
    /// 2. Build a summary (injected summarizer, or the top-3-significance fallback).
    /// 3. Extract up to 5 facts (injected summarizer, or the significance->=6 fallback).
    /// 4. Write the summary as one `recent` memory at significance 5.
    /// 5. Write each fact as a `longterm` memory at significance 7.
    /// 6. Delete the working memories (atomic: nothing is removed until the
    ///    new entries are ready to be written).
    pub fn compress(&mut self, tick: u64, summarizer: Option<&dyn Summarizer>) -> CompressionRecord {
        let working = self.working_snapshot();

        let summary = summarizer
            .and_then(|s| s.summarize(&working))
            .unwrap_or_else(|| default_summary(&working));

        let facts = summarizer
            .and_then(|s| s.extract_facts(&working))
            .unwrap_or_else(|| default_facts(&working));

        self.compress_with(tick, summary, facts)
    }

    /// A clone of the current working tier, oldest entries first, for
    /// callers (e.g. `village-core`'s LLM-backed compression path) that
    /// need to build a summary/facts asynchronously before calling
    /// [`Self::compress_with`].
    #[must_use]
    pub fn working_snapshot(&self) -> Vec<Memory> {
        self.entries.iter().filter(|m| m.kind == MemoryKind::Working).cloned().collect()
    }

    /// The same fallback summary [`Self::compress`] uses when no
    /// summarizer is supplied: the three highest-significance entries,
    /// joined.
    #[must_use]
    pub fn fallback_summary(working: &[Memory]) -> String {
        default_summary(working)
    }

    /// The same fallback fact extraction [`Self::compress`] uses when no
    /// summarizer is supplied: entries at or above the longterm
    /// significance threshold (6).
    #[must_use]
    pub fn fallback_facts(working: &[Memory]) -> Vec<String> {
        default_facts(working)
    }

    /// Apply steps 4-6 of the end-of-day compression algorithm given an
    /// already-computed `summary` and `facts` (at most 5 are kept): write
    /// the summary as one `recent` memory at significance 5, each fact as
    /// a `longterm` memory at significance 7, then delete the working
    /// tier. Nothing is removed until the new entries are ready to be
    /// written, so a crash mid-call leaves either the pre- or post-state.
    pub fn compress_with(&mut self, tick: u64, summary: String, mut facts: Vec<String>) -> CompressionRecord {
        facts.truncate(5);
        let working_count = self.entries.iter().filter(|m| m.kind == MemoryKind::Working).count();
        self.entries.retain(|m| m.kind != MemoryKind::Working);

        let facts_extracted = facts.len();
        self.add(Memory {
            kind: MemoryKind::Recent,
            content: summary,
            significance: 5,
            timestamp: tick,
            compressed: true,
        });
        for fact in facts {
            self.add(Memory {
                kind: MemoryKind::Longterm,
                content: fact,
                significance: 7,
                timestamp: tick,
                compressed: true,
            });
        }

        CompressionRecord {
            tick,
            working_count,
            facts_extracted,
        }
    }
}

/// Sort `tier` newest-first by timestamp and keep at most `n` entries.
fn newest_first(mut tier: Vec<&Memory>, n: usize) -> Vec<&Memory> {
    tier.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    tier.truncate(n);
    tier
}

fn default_summary(working: &[Memory]) -> String {
    let mut sorted: Vec<&Memory> = working.iter().collect();
    sorted.sort_by(|a, b| b.significance.cmp(&a.significance));
    sorted
        .into_iter()
        .take(3)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn default_facts(working: &[Memory]) -> Vec<String> {
    working
        .iter()
        .filter(|m| m.significance >= 6)
        .map(|m| m.content.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_memory(kind: MemoryKind, significance: i32, timestamp: u64, content: &str) -> Memory {
        Memory {
            kind,
            content: content.to_owned(),
            significance,
            timestamp,
            compressed: false,
        }
    }

    #[test]
    fn working_tier_evicts_lowest_significance_then_oldest() {
        let mut store = MemoryStore::new(MemoryCaps {
            working: 2,
            recent: 7,
            longterm: 50,
        });
        store.add(make_memory(MemoryKind::Working, 5, 1, "a"));
        store.add(make_memory(MemoryKind::Working, 2, 2, "b"));
        store.add(make_memory(MemoryKind::Working, 5, 3, "c"));
        assert_eq!(store.working().len(), 2);
        assert!(store.working().iter().all(|m| m.content != "b"));
    }

    #[test]
    fn eviction_prefers_oldest_on_significance_tie() {
        let mut store = MemoryStore::new(MemoryCaps {
            working: 1,
            recent: 7,
            longterm: 50,
        });
        store.add(make_memory(MemoryKind::Working, 5, 1, "first"));
        store.add(make_memory(MemoryKind::Working, 5, 2, "second"));
        let remaining = store.working();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].content, "second");
    }

    #[test]
    fn compression_moves_working_into_recent_and_longterm() {
        let mut store = MemoryStore::default();
        store.add(make_memory(MemoryKind::Working, 7, 1, "a big argument"));
        store.add(make_memory(MemoryKind::Working, 2, 2, "ate breakfast"));
        store.add(make_memory(MemoryKind::Working, 8, 3, "learned a secret"));

        let record = store.compress(100, None);
        assert_eq!(record.working_count, 3);
        assert!(store.working().is_empty());
        assert_eq!(store.recent().len(), 1);
        assert_eq!(store.recent()[0].significance, 5);
        assert!(!store.longterm().is_empty());
        assert!(store.longterm().iter().all(|m| m.significance == 7));
    }

    #[test]
    fn decay_leaves_high_significance_memories_untouched() {
        let mut store = MemoryStore::default();
        store.add(make_memory(MemoryKind::Longterm, 9, 0, "a death"));
        store.decay_all(1000, 24);
        assert_eq!(store.longterm()[0].significance, 9);
    }

    #[test]
    fn get_working_orders_newest_first_and_respects_limit() {
        let mut store = MemoryStore::new(MemoryCaps {
            working: 10,
            recent: 7,
            longterm: 50,
        });
        store.add(make_memory(MemoryKind::Working, 3, 1, "oldest"));
        store.add(make_memory(MemoryKind::Working, 3, 2, "middle"));
        store.add(make_memory(MemoryKind::Working, 3, 3, "newest"));
        let top_two = store.get_working(2);
        assert_eq!(top_two.len(), 2);
        assert_eq!(top_two[0].content, "newest");
        assert_eq!(top_two[1].content, "middle");
    }

    #[test]
    fn get_longterm_orders_by_significance_descending() {
        let mut store = MemoryStore::default();
        store.add(make_memory(MemoryKind::Longterm, 6, 1, "minor fact"));
        store.add(make_memory(MemoryKind::Longterm, 9, 2, "major fact"));
        let ranked = store.get_longterm(10);
        assert_eq!(ranked[0].content, "major fact");
        assert_eq!(ranked[1].content, "minor fact");
    }
}
