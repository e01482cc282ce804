//! Cross-stream comparison engine
//!
//! Correlates detected events across simultaneously compared video streams
//! and keeps N players on one shared playback clock:
//! - Event store (per-stream, time-ordered event sequences)
//! - Correlator (same type within a fixed time window, different streams)
//! - Playback clock (play/pause/seek/skip/rate, reference-player reports)
//! - Timeline (time ↔ axis mapping, markers, active-event highlighting)
//! - Comparison session (owns all of the above plus the player handles)

pub mod clock;
pub mod controller;
pub mod correlate;
pub mod event;
pub mod player;
pub mod report;
pub mod source;
pub mod store;
pub mod timeline;

use thiserror::Error;

pub use clock::{PlaybackClock, PlaybackState};
pub use controller::{ComparisonSession, Layout, SessionOptions, Stream, StreamInput};
pub use correlate::{CorrelatedEvent, CorrelationStrategy, Correlator};
pub use event::{parse_events_lenient, Event, EventType, StreamId};
pub use player::{PlayerCommand, PlayerHandle, SimulatedPlayer};
pub use report::{CrossStreamReport, ReportFormat};
pub use source::{EventSource, JsonFileEventSource, MockEventSource};
pub use store::EventStore;
pub use timeline::{Marker, MarkerKind, Severity, Timeline};

/// Fixed pool of stream slots an operator can attach videos to.
pub const MAX_SLOTS: u32 = 8;

/// Maximum timestamp difference (seconds) admitting two events as correlated.
pub const CORRELATION_WINDOW: f64 = 3.0;

/// Distance (seconds) from the current time within which an event is highlighted.
pub const ACTIVE_WINDOW: f64 = 2.0;

/// Comparison errors
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("not enough videos: select at least 2 videos to compare ({found} selected)")]
    NotEnoughStreams { found: usize },

    #[error("stream slot {0} is outside the slot pool 1..={MAX_SLOTS}")]
    InvalidSlot(u32),

    #[error("stream {0} is not part of this comparison")]
    UnknownStream(StreamId),

    #[error("stream {0} selected more than once")]
    DuplicateStream(StreamId),

    #[error("event {id} in stream {stream} has invalid timestamp {timestamp}")]
    InvalidTimestamp {
        stream: StreamId,
        id: String,
        timestamp: f64,
    },

    #[error("player slot {index} is not playable with {active} active players")]
    InactivePlayerSlot { index: usize, active: usize },

    #[error("unknown layout: {0} (expected 2-up, 3-up or 4-up)")]
    UnknownLayout(String),

    #[error("expected a JSON array of events")]
    NotAnArray,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Format error: {0}")]
    Format(#[from] std::fmt::Error),
}

pub type Result<T> = std::result::Result<T, CompareError>;
