//! Cross-stream event correlation
//!
//! Two events correlate when they come from different streams, share a type,
//! and their timestamps differ by no more than the correlation window.
//!
//! The default strategy compares every event of every stream pair, which is
//! O(streams² × events²). That is fine for a handful of streams with tens of
//! events each; past that, [`CorrelationStrategy::SortedSweep`] produces the
//! same set with a windowed sweep over time-sorted sequences.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Event, EventStore, EventType, StreamId, CORRELATION_WINDOW};

/// Pair enumeration strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrelationStrategy {
    /// Full cross-product per stream pair
    #[default]
    CrossProduct,
    /// Two-pointer window sweep per stream pair
    SortedSweep,
}

/// Two same-typed events from different streams, close in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelatedEvent {
    /// Derived from both source streams and event ids
    pub id: String,
    /// Mean of the two source timestamps
    pub timestamp: f64,
    /// Lower stream id first
    pub streams: [StreamId; 2],
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub description: String,
    /// Absolute difference of the two source timestamps
    pub time_diff: f64,
}

impl CorrelatedEvent {
    fn from_pair(s1: StreamId, e1: &Event, s2: StreamId, e2: &Event) -> Self {
        Self {
            id: format!("corr-{s1}-{}-{s2}-{}", escape_id(&e1.id), escape_id(&e2.id)),
            timestamp: f64::midpoint(e1.timestamp, e2.timestamp),
            streams: [s1, s2],
            event_type: e1.event_type.clone(),
            description: format!("{} detected in multiple streams", e1.event_type),
            time_diff: (e1.timestamp - e2.timestamp).abs(),
        }
    }

    /// Whether `stream` participates in this correlation
    #[must_use]
    pub fn involves(&self, stream: StreamId) -> bool {
        self.streams.contains(&stream)
    }
}

/// Percent-escape `%` and `-` so ids can't blur the separators
fn escape_id(id: &str) -> Cow<'_, str> {
    if id.contains(['-', '%']) {
        Cow::Owned(id.replace('%', "%25").replace('-', "%2D"))
    } else {
        Cow::Borrowed(id)
    }
}

/// Correlation engine
#[derive(Debug, Clone)]
pub struct Correlator {
    /// Maximum timestamp difference (seconds), inclusive
    window: f64,
    strategy: CorrelationStrategy,
}

impl Correlator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            window: CORRELATION_WINDOW,
            strategy: CorrelationStrategy::default(),
        }
    }

    #[must_use]
    pub fn with_window(window: f64) -> Self {
        Self {
            window,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn strategy(mut self, strategy: CorrelationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn window(&self) -> f64 {
        self.window
    }

    /// Correlate every unordered pair of distinct streams.
    ///
    /// Pairs are visited in stream-id order, so the lower id always comes
    /// first in [`CorrelatedEvent::streams`] whatever order the input had.
    /// The result is unordered; consumers sort it for display. Fewer than two
    /// streams yield an empty list.
    pub fn correlate<'a, I>(&self, streams: I) -> Vec<CorrelatedEvent>
    where
        I: IntoIterator<Item = (StreamId, &'a [Event])>,
    {
        let mut streams: Vec<(StreamId, &[Event])> = streams.into_iter().collect();
        streams.sort_by_key(|(id, _)| *id);

        let mut correlations = Vec::new();
        for (i, (s1, events1)) in streams.iter().enumerate() {
            for (s2, events2) in &streams[i + 1..] {
                if s1 == s2 {
                    continue;
                }
                match self.strategy {
                    CorrelationStrategy::CrossProduct => {
                        self.cross_product(*s1, events1, *s2, events2, &mut correlations);
                    }
                    CorrelationStrategy::SortedSweep => {
                        self.sorted_sweep(*s1, events1, *s2, events2, &mut correlations);
                    }
                }
            }
        }

        debug!(
            "Correlated {} streams into {} cross-stream events",
            streams.len(),
            correlations.len()
        );
        correlations
    }

    /// Correlate the current contents of an event store
    pub fn correlate_store(&self, store: &EventStore) -> Vec<CorrelatedEvent> {
        self.correlate(store.iter())
    }

    fn matches(&self, e1: &Event, e2: &Event) -> bool {
        (e1.timestamp - e2.timestamp).abs() <= self.window && e1.event_type == e2.event_type
    }

    fn cross_product(
        &self,
        s1: StreamId,
        events1: &[Event],
        s2: StreamId,
        events2: &[Event],
        out: &mut Vec<CorrelatedEvent>,
    ) {
        for e1 in events1 {
            for e2 in events2 {
                if self.matches(e1, e2) {
                    out.push(CorrelatedEvent::from_pair(s1, e1, s2, e2));
                }
            }
        }
    }

    fn sorted_sweep(
        &self,
        s1: StreamId,
        events1: &[Event],
        s2: StreamId,
        events2: &[Event],
        out: &mut Vec<CorrelatedEvent>,
    ) {
        let mut a: Vec<&Event> = events1.iter().collect();
        let mut b: Vec<&Event> = events2.iter().collect();
        a.sort_by(|x, y| x.timestamp.total_cmp(&y.timestamp));
        b.sort_by(|x, y| x.timestamp.total_cmp(&y.timestamp));

        // Same subtraction as `matches`, so the window edge behaves identically.
        let mut lo = 0;
        for e1 in a {
            while lo < b.len() && e1.timestamp - b[lo].timestamp > self.window {
                lo += 1;
            }
            for e2 in &b[lo..] {
                if e2.timestamp - e1.timestamp > self.window {
                    break;
                }
                if self.matches(e1, e2) {
                    out.push(CorrelatedEvent::from_pair(s1, e1, s2, e2));
                }
            }
        }
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort correlated events by timestamp, ascending
pub fn sort_by_time(events: &mut [CorrelatedEvent]) {
    events.sort_by(|a, b| {
        a.timestamp
            .total_cmp(&b.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
}
