//! The hub itself: a `Mutex`-guarded history ring plus a `Mutex`-guarded
//! map of subscriber channels.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::trace;
use village_types::Event;

/// Default cap on the in-memory history ring (spec.md §4.1, §5: "event
/// history ring (default 1000)").
pub const DEFAULT_HISTORY_CAP: usize = 1000;

/// Per-subscriber channel capacity. The bus's subscription queue is
/// described in spec.md as "unbounded FIFO", but non-blocking,
/// drop-if-full delivery is only expressible with a bounded channel;
/// a generously sized bounded `mpsc` gives the same at-most-once,
/// no-retry behavior without the unbounded-memory-growth risk of a
/// literal unbounded queue against a dead subscriber.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 1024;

/// Opaque handle identifying one live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A live subscription: a receiving half of the subscriber's queue plus
/// the id needed to unsubscribe it later.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<Event>,
}

impl Subscription {
    /// This subscription's id, for passing to [`EventBus::unsubscribe`].
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Await the next event delivered to this subscriber. Returns `None`
    /// once the bus has dropped its sending half (the bus itself was
    /// dropped).
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Non-blocking poll for the next event, if one is already queued.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }
}

struct Inner {
    history: VecDeque<Event>,
    history_cap: usize,
    subscribers: HashMap<SubscriptionId, mpsc::Sender<Event>>,
}

/// A process-wide pub/sub hub for [`Event`]s.
///
/// Cloning an [`EventBus`] shares the same underlying hub: all clones
/// observe the same history and subscriber set.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Mutex<Inner>>,
    next_id: Arc<AtomicU64>,
    subscriber_capacity: usize,
}

impl EventBus {
    /// Build a bus with the default history cap and subscriber queue
    /// capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAP, DEFAULT_SUBSCRIBER_CAPACITY)
    }

    /// Build a bus with explicit history and per-subscriber capacities.
    #[must_use]
    pub fn with_capacity(history_cap: usize, subscriber_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                history: VecDeque::with_capacity(history_cap.min(4096)),
                history_cap,
                subscribers: HashMap::new(),
            })),
            next_id: Arc::new(AtomicU64::new(0)),
            subscriber_capacity,
        }
    }

    /// Register a new subscriber and return its [`Subscription`].
    pub async fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.subscriber_capacity);
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.lock().await.subscribers.insert(id, tx);
        Subscription { id, receiver: rx }
    }

    /// Drop a subscriber's channel. Its queue, if any events remain
    /// unread, is simply orphaned and dropped with it.
    pub async fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.lock().await.subscribers.remove(&id);
    }

    /// Append `event` to history and fan it out to every live
    /// subscriber, without blocking on any one of them.
    ///
    /// Holds the lock for the whole fan-out pass: two concurrent
    /// `publish` calls are serialized, so every subscriber observes
    /// events in the same total order.
    pub async fn publish(&self, event: Event) {
        let mut guard = self.inner.lock().await;
        guard.history.push_back(event.clone());
        while guard.history.len() > guard.history_cap {
            guard.history.pop_front();
        }

        let mut dead = Vec::new();
        for (id, sender) in &guard.subscribers {
            match sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    trace!(subscriber = ?id, "event dropped: subscriber queue full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    dead.push(*id);
                }
            }
        }
        for id in dead {
            guard.subscribers.remove(&id);
        }
    }

    /// Return the most recent `limit` events, oldest first.
    pub async fn history(&self, limit: usize) -> Vec<Event> {
        let guard = self.inner.lock().await;
        let skip = guard.history.len().saturating_sub(limit);
        guard.history.iter().skip(skip).cloned().collect()
    }

    /// Current number of live subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.inner.lock().await.subscribers.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use village_types::{AgentId, EventType};

    use super::*;

    fn sample_event(tick: u64, summary: &str) -> Event {
        Event {
            event_type: EventType::Tick,
            summary: summary.to_owned(),
            timestamp: tick,
            actors: vec![AgentId::new("agnes")],
            location_id: None,
            detail: None,
            significance: 1,
            data: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_events_in_order() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe().await;
        bus.publish(sample_event(0, "first")).await;
        bus.publish(sample_event(1, "second")).await;

        let first = sub.recv().await.expect("first event");
        let second = sub.recv().await.expect("second event");
        assert_eq!(first.summary, "first");
        assert_eq!(second.summary, "second");
    }

    #[tokio::test]
    async fn multiple_subscribers_see_the_same_order() {
        let bus = EventBus::new();
        let mut a = bus.subscribe().await;
        let mut b = bus.subscribe().await;
        bus.publish(sample_event(0, "one")).await;
        bus.publish(sample_event(1, "two")).await;

        assert_eq!(a.recv().await.unwrap().summary, "one");
        assert_eq!(a.recv().await.unwrap().summary, "two");
        assert_eq!(b.recv().await.unwrap().summary, "one");
        assert_eq!(b.recv().await.unwrap().summary, "two");
    }

    #[tokio::test]
    async fn unsubscribe_orphans_the_queue_without_affecting_others() {
        let bus = EventBus::new();
        let sub = bus.subscribe().await;
        let mut still_listening = bus.subscribe().await;
        bus.unsubscribe(sub.id()).await;

        bus.publish(sample_event(0, "after unsubscribe")).await;
        assert_eq!(bus.subscriber_count().await, 1);
        assert_eq!(
            still_listening.recv().await.unwrap().summary,
            "after unsubscribe"
        );
    }

    #[tokio::test]
    async fn history_returns_most_recent_limit_oldest_first() {
        let bus = EventBus::new();
        for i in 0..5 {
            bus.publish(sample_event(i, &format!("event-{i}"))).await;
        }
        let recent = bus.history(3).await;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].summary, "event-2");
        assert_eq!(recent[2].summary, "event-4");
    }

    #[tokio::test]
    async fn history_ring_evicts_oldest_past_cap() {
        let bus = EventBus::with_capacity(3, DEFAULT_SUBSCRIBER_CAPACITY);
        for i in 0..5 {
            bus.publish(sample_event(i, &format!("event-{i}"))).await;
        }
        let all = bus.history(10).await;
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].summary, "event-2");
    }

    #[tokio::test]
    async fn full_subscriber_queue_drops_without_blocking_publisher() {
        let bus = EventBus::with_capacity(DEFAULT_HISTORY_CAP, 1);
        let mut sub = bus.subscribe().await;
        bus.publish(sample_event(0, "kept")).await;
        // Queue capacity is 1 and nothing has been read yet, so this
        // publish must drop rather than block.
        bus.publish(sample_event(1, "dropped")).await;

        let received = sub.recv().await.expect("first event still queued");
        assert_eq!(received.summary, "kept");
    }
}
