//! Detected events and stream identifiers
//!
//! Events arrive from the analysis backend as JSON. Malformed entries are
//! dropped here, at the deserialization boundary, so everything past this
//! module can assume schema-valid events.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{CompareError, Result};

/// Slot identifier of a stream (1..=`MAX_SLOTS`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StreamId(pub u32);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Detection category. Open set: unknown categories are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Motion,
    Person,
    Vehicle,
    Alert,
    Other(String),
}

impl EventType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Motion => "motion",
            Self::Person => "person",
            Self::Vehicle => "vehicle",
            Self::Alert => "alert",
            Self::Other(s) => s,
        }
    }

    /// Marker colour class used by timeline and player overlays
    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            Self::Motion => "blue",
            Self::Person => "green",
            Self::Vehicle => "orange",
            Self::Alert => "red",
            Self::Other(_) => "gray",
        }
    }

    /// Single-character glyph for the text timeline
    #[must_use]
    pub fn glyph(&self) -> char {
        match self {
            Self::Motion => 'm',
            Self::Person => 'p',
            Self::Vehicle => 'v',
            Self::Alert => '!',
            Self::Other(_) => '.',
        }
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "motion" => Self::Motion,
            "person" => Self::Person,
            "vehicle" => Self::Vehicle,
            "alert" => Self::Alert,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<EventType> for String {
    fn from(t: EventType) -> Self {
        match t {
            EventType::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detected occurrence within one stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique within its stream
    pub id: String,
    /// Seconds from stream start
    pub timestamp: f64,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub description: String,
    /// 0.0-1.0
    pub confidence: f32,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        timestamp: f64,
        event_type: impl Into<EventType>,
        description: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            event_type: event_type.into(),
            description: description.into(),
            confidence,
        }
    }

    /// Whether the event is within `window` seconds of `current_time` (exclusive)
    #[must_use]
    pub fn is_active_at(&self, current_time: f64, window: f64) -> bool {
        (self.timestamp - current_time).abs() < window
    }

    pub(crate) fn has_valid_timestamp(&self) -> bool {
        self.timestamp.is_finite() && self.timestamp >= 0.0
    }
}

/// Parse a JSON array of events, skipping entries that don't deserialize or
/// carry a negative / non-finite timestamp.
pub fn parse_events_lenient(json: &str) -> Result<Vec<Event>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let serde_json::Value::Array(items) = value else {
        return Err(CompareError::NotAnArray);
    };

    let mut events = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Event>(item) {
            Ok(event) if event.has_valid_timestamp() => events.push(event),
            Ok(event) => {
                warn!(
                    "Skipping event {} with invalid timestamp {}",
                    event.id, event.timestamp
                );
            }
            Err(e) => warn!("Skipping malformed event at index {index}: {e}"),
        }
    }

    Ok(events)
}
