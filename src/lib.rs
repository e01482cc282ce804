//! `vscompare` - Cross-stream event correlation for multi-video comparison
//!
//! # Features
//!
//! - **Correlation**: same-typed events from different streams within a time window
//! - **Synchronized playback**: one shared clock driving N players, reference-player reports
//! - **Timeline**: time ↔ axis mapping, event/cross-stream markers, active highlighting
//! - **Backend client**: upload, chat, streamed (cancellable) summaries, alerts
//!
//! # Example
//!
//! ```rust
//! use vscompare::{ComparisonSession, Event, SessionOptions, StreamInput};
//!
//! fn main() -> vscompare::compare::Result<()> {
//!     let inputs = vec![
//!         StreamInput::new(1, "gate.mp4")
//!             .with_events(vec![Event::new("a", 12.0, "person", "Person at gate", 0.9)]),
//!         StreamInput::new(4, "yard.mp4")
//!             .with_events(vec![Event::new("b", 13.5, "person", "Person in yard", 0.8)]),
//!     ];
//!     let mut session = ComparisonSession::load(inputs, SessionOptions::default())?;
//!
//!     let correlated = session.correlated_events();
//!     assert_eq!(correlated.len(), 1);
//!     let at = correlated[0].timestamp;
//!     session.jump_to_event(at);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod compare;
pub mod config;
pub mod slots;

pub use api::{ApiError, BackendClient, SummaryTracker};
pub use compare::{
    CompareError, ComparisonSession, CorrelatedEvent, CorrelationStrategy, Correlator,
    CrossStreamReport, Event, EventStore, EventType, Layout, PlaybackClock, PlaybackState,
    ReportFormat, SessionOptions, SimulatedPlayer, StreamId, StreamInput, Timeline,
};
pub use config::Config;
pub use slots::{SlotRegistry, VideoState, VideoStatus};

/// Version of vscompare
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
