//! Per-stream event storage
//!
//! Holds one time-ordered event sequence per stream. Every mutation bumps a
//! revision counter so derived data (correlations) can be cached against it.

use std::collections::BTreeMap;

use super::{CompareError, Event, Result, StreamId};

/// Event sequences keyed by stream
#[derive(Debug, Default, Clone)]
pub struct EventStore {
    streams: BTreeMap<StreamId, Vec<Event>>,
    revision: u64,
}

impl EventStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all events of a stream, registering the stream if needed.
    ///
    /// Events are kept sorted by timestamp; the whole batch is rejected if any
    /// timestamp is negative or not finite. Timestamps beyond the media
    /// duration are accepted as-is.
    pub fn set_events(&mut self, stream: StreamId, mut events: Vec<Event>) -> Result<()> {
        if let Some(bad) = events.iter().find(|e| !e.has_valid_timestamp()) {
            return Err(CompareError::InvalidTimestamp {
                stream,
                id: bad.id.clone(),
                timestamp: bad.timestamp,
            });
        }

        events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        self.streams.insert(stream, events);
        self.revision += 1;
        Ok(())
    }

    /// Drop a stream together with its events. Returns whether it existed.
    pub fn remove_stream(&mut self, stream: StreamId) -> bool {
        let removed = self.streams.remove(&stream).is_some();
        if removed {
            self.revision += 1;
        }
        removed
    }

    /// Events of one stream in timestamp order (empty if unknown)
    #[must_use]
    pub fn events(&self, stream: StreamId) -> &[Event] {
        self.streams
            .get(&stream)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All events across all streams, stream by stream in id order
    pub fn all_events(&self) -> impl Iterator<Item = (StreamId, &Event)> {
        self.streams
            .iter()
            .flat_map(|(id, events)| events.iter().map(move |e| (*id, e)))
    }

    /// Streams with their sequences, ascending by id
    pub fn iter(&self) -> impl Iterator<Item = (StreamId, &[Event])> {
        self.streams
            .iter()
            .map(|(id, events)| (*id, events.as_slice()))
    }

    pub fn stream_ids(&self) -> impl Iterator<Item = StreamId> + '_ {
        self.streams.keys().copied()
    }

    #[must_use]
    pub fn contains(&self, stream: StreamId) -> bool {
        self.streams.contains_key(&stream)
    }

    /// Number of streams
    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Total number of events
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.streams.values().map(Vec::len).sum()
    }

    /// Monotonic mutation counter
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
