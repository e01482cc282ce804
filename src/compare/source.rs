//! Event sources for compared streams.
//!
//! A [`EventSource`] supplies the detected events of one stream. The analysis
//! backend is the real source; [`MockEventSource`] is a development stand-in
//! and [`JsonFileEventSource`] reads exported detections from disk.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use super::{parse_events_lenient, Event, Result, StreamId};

/// Trait for per-stream event providers.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Short lowercase source name (e.g., `"mock"`, `"json"`).
    fn name(&self) -> &'static str;

    /// Events for the stream at position `index` of the current selection.
    ///
    /// An empty vec is a legitimate "nothing detected" answer.
    async fn events_for(&self, index: usize, stream: StreamId) -> Result<Vec<Event>>;
}

/// Deterministic placeholder detections, staggered per selection index
#[derive(Debug, Clone, Copy, Default)]
pub struct MockEventSource;

impl MockEventSource {
    /// Motion, person and vehicle events shifted by the selection index
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn generate(index: usize) -> Vec<Event> {
        let k = index as f64;
        vec![
            Event::new(
                format!("event-{index}-1"),
                5.0 + k * 2.0,
                "motion",
                "Motion detected",
                0.85,
            ),
            Event::new(
                format!("event-{index}-2"),
                15.0 + k * 3.0,
                "person",
                "Person detected",
                0.92,
            ),
            Event::new(
                format!("event-{index}-3"),
                30.0 + k * 2.0,
                "vehicle",
                "Vehicle detected",
                0.78,
            ),
        ]
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn events_for(&self, index: usize, _stream: StreamId) -> Result<Vec<Event>> {
        Ok(Self::generate(index))
    }
}

/// Events read from one JSON array file per stream
#[derive(Debug, Clone, Default)]
pub struct JsonFileEventSource {
    files: HashMap<StreamId, PathBuf>,
}

impl JsonFileEventSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, stream: StreamId, path: impl Into<PathBuf>) -> Self {
        self.files.insert(stream, path.into());
        self
    }

    pub fn insert(&mut self, stream: StreamId, path: impl Into<PathBuf>) {
        self.files.insert(stream, path.into());
    }
}

#[async_trait]
impl EventSource for JsonFileEventSource {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn events_for(&self, _index: usize, stream: StreamId) -> Result<Vec<Event>> {
        let Some(path) = self.files.get(&stream) else {
            return Ok(Vec::new());
        };

        let content = tokio::fs::read_to_string(path).await?;
        let events = parse_events_lenient(&content)?;
        debug!(
            "Loaded {} events for stream {stream} from {}",
            events.len(),
            path.display()
        );
        Ok(events)
    }
}
