//! LLM usage and cost tracking.
//!
//! A thread-safe accumulator using [`rust_decimal::Decimal`] for
//! financial precision, no floating-point cost arithmetic. Generalized
//! per spec.md §4.7 to a per-model breakdown plus a bounded history
//! ring of individual call records.

use std::collections::HashMap;
use std::sync::Mutex;

use rust_decimal::Decimal;

/// Denominator for per-million-token pricing.
const ONE_MILLION: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Default cap on the in-memory usage ring (spec.md §4.7: "recommend
/// N=1000 for in-memory").
pub const DEFAULT_RING_CAP: usize = 1000;

/// One completed LLM call's usage record.
#[derive(Debug, Clone)]
pub struct UsageRecord {
    /// Tick or wall-clock marker supplied by the caller (this crate does
    /// not read the clock itself; `village-core` stamps it from the
    /// world tick).
    pub timestamp: u64,
    /// The model identifier the call was routed to.
    pub model: String,
    /// Prompt tokens.
    pub tokens_in: u32,
    /// Completion tokens.
    pub tokens_out: u32,
    /// Estimated cost in USD for this call.
    pub cost_usd: Decimal,
    /// Round-trip latency in milliseconds.
    pub latency_ms: u64,
    /// Whether this call was served from the response cache.
    pub cached: bool,
    /// The acting agent, if known.
    pub agent_id: Option<String>,
    /// Caller-supplied label for the kind of call (e.g. `"decision"`).
    pub call_type: Option<String>,
}

/// Per-model running totals.
#[derive(Debug, Clone, Default)]
pub struct ModelBreakdown {
    /// Number of calls routed to this model.
    pub calls: u64,
    /// Total prompt tokens for this model.
    pub tokens_in: u64,
    /// Total completion tokens for this model.
    pub tokens_out: u64,
    /// Total estimated cost for this model.
    pub total_cost_usd: Decimal,
}

/// Snapshot of the running aggregate, returned by [`UsageTracker::aggregate`].
#[derive(Debug, Clone)]
pub struct UsageAggregate {
    /// Total calls recorded since the last `reset()`.
    pub total_calls: u64,
    /// Total prompt tokens since the last `reset()`.
    pub tokens_in: u64,
    /// Total completion tokens since the last `reset()`.
    pub tokens_out: u64,
    /// Total estimated cost since the last `reset()`.
    pub total_cost_usd: Decimal,
    /// Per-model breakdown since the last `reset()`.
    pub per_model: HashMap<String, ModelBreakdown>,
}

/// Per-million-token pricing for one model.
#[derive(Debug, Clone, Copy)]
pub struct ModelRate {
    /// Price per million input tokens.
    pub input_rate: Decimal,
    /// Price per million output tokens.
    pub output_rate: Decimal,
}

struct Inner {
    ring: std::collections::VecDeque<UsageRecord>,
    ring_cap: usize,
    aggregate: UsageAggregateInner,
}

#[derive(Default)]
struct UsageAggregateInner {
    total_calls: u64,
    tokens_in: u64,
    tokens_out: u64,
    total_cost_usd: Decimal,
    per_model: HashMap<String, ModelBreakdown>,
}

/// Thread-safe LLM usage and cost tracker.
///
/// Holds a bounded ring of individual call records plus a running
/// aggregate with a per-model breakdown, matching spec.md §4.7's usage
/// tracker contract. Safe to share via `Arc<UsageTracker>`.
pub struct UsageTracker {
    default_rate: ModelRate,
    rates: HashMap<String, ModelRate>,
    inner: Mutex<Inner>,
}

impl UsageTracker {
    /// Build a tracker with a fallback rate used for any model not
    /// present in `rates`, and the default ring capacity.
    #[must_use]
    pub fn new(default_rate: ModelRate, rates: HashMap<String, ModelRate>) -> Self {
        Self::with_capacity(default_rate, rates, DEFAULT_RING_CAP)
    }

    /// Build a tracker with an explicit ring capacity.
    #[must_use]
    pub fn with_capacity(
        default_rate: ModelRate,
        rates: HashMap<String, ModelRate>,
        ring_cap: usize,
    ) -> Self {
        Self {
            default_rate,
            rates,
            inner: Mutex::new(Inner {
                ring: std::collections::VecDeque::with_capacity(ring_cap.min(4096)),
                ring_cap,
                aggregate: UsageAggregateInner::default(),
            }),
        }
    }

    fn rate_for(&self, model: &str) -> ModelRate {
        self.rates.get(model).copied().unwrap_or(self.default_rate)
    }

    /// Record one completed call: compute its cost, push it onto the
    /// ring (evicting the oldest entry past capacity), and fold it into
    /// the running aggregate.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        timestamp: u64,
        model: &str,
        tokens_in: u32,
        tokens_out: u32,
        latency_ms: u64,
        cached: bool,
        agent_id: Option<String>,
        call_type: Option<String>,
    ) -> Decimal {
        let rate = self.rate_for(model);
        let cost = cost_for(rate, tokens_in, tokens_out);

        let record = UsageRecord {
            timestamp,
            model: model.to_owned(),
            tokens_in,
            tokens_out,
            cost_usd: cost,
            latency_ms,
            cached,
            agent_id,
            call_type,
        };

        let Ok(mut inner) = self.inner.lock() else {
            return cost;
        };

        inner.ring.push_back(record);
        while inner.ring.len() > inner.ring_cap {
            inner.ring.pop_front();
        }

        inner.aggregate.total_calls = inner.aggregate.total_calls.saturating_add(1);
        inner.aggregate.tokens_in = inner.aggregate.tokens_in.saturating_add(u64::from(tokens_in));
        inner.aggregate.tokens_out = inner.aggregate.tokens_out.saturating_add(u64::from(tokens_out));
        inner.aggregate.total_cost_usd = inner
            .aggregate
            .total_cost_usd
            .checked_add(cost)
            .unwrap_or(inner.aggregate.total_cost_usd);

        let entry = inner.aggregate.per_model.entry(model.to_owned()).or_default();
        entry.calls = entry.calls.saturating_add(1);
        entry.tokens_in = entry.tokens_in.saturating_add(u64::from(tokens_in));
        entry.tokens_out = entry.tokens_out.saturating_add(u64::from(tokens_out));
        entry.total_cost_usd = entry.total_cost_usd.checked_add(cost).unwrap_or(entry.total_cost_usd);

        cost
    }

    /// Snapshot of the running aggregate.
    #[must_use]
    pub fn aggregate(&self) -> UsageAggregate {
        let Ok(inner) = self.inner.lock() else {
            return UsageAggregate {
                total_calls: 0,
                tokens_in: 0,
                tokens_out: 0,
                total_cost_usd: Decimal::ZERO,
                per_model: HashMap::new(),
            };
        };
        UsageAggregate {
            total_calls: inner.aggregate.total_calls,
            tokens_in: inner.aggregate.tokens_in,
            tokens_out: inner.aggregate.tokens_out,
            total_cost_usd: inner.aggregate.total_cost_usd,
            per_model: inner.aggregate.per_model.clone(),
        }
    }

    /// The most recent `limit` usage records, oldest first. The ring
    /// itself is not cleared by [`Self::reset`].
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<UsageRecord> {
        let Ok(inner) = self.inner.lock() else {
            return Vec::new();
        };
        let skip = inner.ring.len().saturating_sub(limit);
        inner.ring.iter().skip(skip).cloned().collect()
    }

    /// Clear the running aggregate. The ring is left untouched -- it is
    /// an independent bounded log, not part of the aggregate being reset.
    pub fn reset(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.aggregate = UsageAggregateInner::default();
        }
    }
}

impl Clone for UsageRecord {
    fn clone(&self) -> Self {
        Self {
            timestamp: self.timestamp,
            model: self.model.clone(),
            tokens_in: self.tokens_in,
            tokens_out: self.tokens_out,
            cost_usd: self.cost_usd,
            latency_ms: self.latency_ms,
            cached: self.cached,
            agent_id: self.agent_id.clone(),
            call_type: self.call_type.clone(),
        }
    }
}

fn cost_for(rate: ModelRate, tokens_in: u32, tokens_out: u32) -> Decimal {
    let input_cost = Decimal::from(tokens_in)
        .checked_div(ONE_MILLION)
        .unwrap_or(Decimal::ZERO)
        .checked_mul(rate.input_rate)
        .unwrap_or(Decimal::ZERO);
    let output_cost = Decimal::from(tokens_out)
        .checked_div(ONE_MILLION)
        .unwrap_or(Decimal::ZERO)
        .checked_mul(rate.output_rate)
        .unwrap_or(Decimal::ZERO);
    input_cost.checked_add(output_cost).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> UsageTracker {
        let mut rates = HashMap::new();
        rates.insert(
            "gpt-5-nano".to_owned(),
            ModelRate {
                input_rate: Decimal::new(30, 2),
                output_rate: Decimal::new(88, 2),
            },
        );
        UsageTracker::new(
            ModelRate {
                input_rate: Decimal::new(300, 2),
                output_rate: Decimal::new(1500, 2),
            },
            rates,
        )
    }

    #[test]
    fn records_accumulate_into_aggregate() {
        let t = tracker();
        t.record(1, "gpt-5-nano", 1_000_000, 1_000_000, 120, false, None, None);
        let agg = t.aggregate();
        assert_eq!(agg.total_calls, 1);
        assert_eq!(agg.tokens_in, 1_000_000);
        assert_eq!(agg.total_cost_usd, Decimal::new(118, 2));
    }

    #[test]
    fn unknown_model_uses_default_rate() {
        let t = tracker();
        t.record(1, "mystery-model", 1_000_000, 0, 10, false, None, None);
        let agg = t.aggregate();
        assert_eq!(agg.total_cost_usd, Decimal::new(300, 2));
    }

    #[test]
    fn per_model_breakdown_tracks_each_model_separately() {
        let t = tracker();
        t.record(1, "gpt-5-nano", 1000, 200, 10, false, None, None);
        t.record(2, "gpt-5-nano", 1000, 200, 10, false, None, None);
        t.record(3, "mystery-model", 500, 100, 10, false, None, None);
        let agg = t.aggregate();
        assert_eq!(agg.per_model.get("gpt-5-nano").unwrap().calls, 2);
        assert_eq!(agg.per_model.get("mystery-model").unwrap().calls, 1);
    }

    #[test]
    fn reset_clears_aggregate_but_not_ring() {
        let t = tracker();
        t.record(1, "gpt-5-nano", 1000, 200, 10, false, None, None);
        t.reset();
        let agg = t.aggregate();
        assert_eq!(agg.total_calls, 0);
        assert_eq!(t.recent(10).len(), 1);
    }

    #[test]
    fn ring_evicts_oldest_past_capacity() {
        let t = UsageTracker::with_capacity(
            ModelRate {
                input_rate: Decimal::ZERO,
                output_rate: Decimal::ZERO,
            },
            HashMap::new(),
            2,
        );
        for i in 0..5u64 {
            t.record(i, "m", 0, 0, 1, false, None, None);
        }
        let recent = t.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp, 3);
        assert_eq!(recent[1].timestamp, 4);
    }

    #[test]
    fn zero_tokens_records_zero_cost() {
        let t = tracker();
        t.record(1, "gpt-5-nano", 0, 0, 5, false, None, None);
        assert_eq!(t.aggregate().total_cost_usd, Decimal::ZERO);
    }
}
