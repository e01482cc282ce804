//! Timeline mapping and rendering
//!
//! Maps playback time onto a 1-D axis (fractions in `[0, 1]`) and back, places
//! per-stream and cross-stream markers, and renders a terminal-friendly bar.

use std::fmt::Write as FmtWrite;

use serde::Serialize;

use super::{CorrelatedEvent, Event, EventType, PlaybackState, Result, StreamId, ACTIVE_WINDOW};

/// Slider upper bound used while the duration is still unknown
pub const SLIDER_FALLBACK_MAX: f64 = 100.0;

/// Playback rates offered to the operator
pub const ALLOWED_RATES: [f64; 4] = [0.5, 1.0, 1.5, 2.0];

/// Axis fractions that get a time label
pub const TICK_FRACTIONS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

const CROSS_STREAM_GLYPH: char = '#';
const CURSOR_GLYPH: char = '|';
const PLAYED_GLYPH: char = '=';
const UNPLAYED_GLYPH: char = '-';

/// Fraction along the axis for `timestamp`, clamped to `[0, 1]`; 0 while the
/// duration is unknown
#[must_use]
pub fn position_for(timestamp: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        (timestamp / duration).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Seek target for a pointer at `fraction` along the axis
#[must_use]
pub fn time_for(fraction: f64, duration: f64) -> f64 {
    fraction.clamp(0.0, 1.0) * duration
}

/// `MM:SS`, minutes uncapped
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Slider upper bound for the given duration
#[must_use]
pub fn slider_max(duration: f64) -> f64 {
    if duration > 0.0 {
        duration
    } else {
        SLIDER_FALLBACK_MAX
    }
}

/// Whether a rate is one of the offered menu entries
#[must_use]
pub fn is_allowed_rate(rate: f64) -> bool {
    ALLOWED_RATES.contains(&rate)
}

/// How closely a correlated pair lines up in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Under 1 s apart
    Simultaneous,
    /// 1 s to under 2 s apart
    NearSync,
    /// Everything else the correlator admits
    Related,
}

impl Severity {
    #[must_use]
    pub fn from_time_diff(time_diff: f64) -> Self {
        if time_diff < 1.0 {
            Self::Simultaneous
        } else if time_diff < 2.0 {
            Self::NearSync
        } else {
            Self::Related
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Simultaneous => "Simultaneous",
            Self::NearSync => "Near-sync",
            Self::Related => "Related",
        }
    }

    /// Badge style, strongest first
    #[must_use]
    pub fn style(self) -> &'static str {
        match self {
            Self::Simultaneous => "destructive",
            Self::NearSync => "default",
            Self::Related => "secondary",
        }
    }
}

/// Marker class
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerKind {
    /// Regular per-stream event: thin, coloured by type
    Event {
        stream: StreamId,
        event_type: EventType,
    },
    /// Correlated event: wide, one shared treatment regardless of type
    CrossStream { streams: [StreamId; 2] },
}

/// A marker placed on the timeline axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    #[serde(flatten)]
    pub kind: MarkerKind,
    /// Fraction along the axis
    pub position: f64,
    pub timestamp: f64,
    /// Hover text
    pub title: String,
    pub active: bool,
}

impl Marker {
    #[must_use]
    pub fn is_cross_stream(&self) -> bool {
        matches!(self.kind, MarkerKind::CrossStream { .. })
    }
}

/// One frame of the timeline view
#[derive(Debug, Clone)]
pub struct Timeline<'a> {
    state: PlaybackState,
    events: Vec<(StreamId, &'a Event)>,
    correlated: &'a [CorrelatedEvent],
    active_window: f64,
}

impl<'a> Timeline<'a> {
    pub fn new<I>(state: PlaybackState, events: I, correlated: &'a [CorrelatedEvent]) -> Self
    where
        I: IntoIterator<Item = (StreamId, &'a Event)>,
    {
        Self {
            state,
            events: events.into_iter().collect(),
            correlated,
            active_window: ACTIVE_WINDOW,
        }
    }

    #[must_use]
    pub fn with_active_window(mut self, window: f64) -> Self {
        self.active_window = window;
        self
    }

    /// Fraction of the axis already played
    #[must_use]
    pub fn progress(&self) -> f64 {
        position_for(self.state.current_time, self.state.duration)
    }

    fn is_active(&self, timestamp: f64) -> bool {
        (timestamp - self.state.current_time).abs() < self.active_window
    }

    /// Regular markers first, then cross-stream markers drawn on top
    #[must_use]
    pub fn markers(&self) -> Vec<Marker> {
        let duration = self.state.duration;
        let regular = self.events.iter().map(|(stream, event)| Marker {
            kind: MarkerKind::Event {
                stream: *stream,
                event_type: event.event_type.clone(),
            },
            position: position_for(event.timestamp, duration),
            timestamp: event.timestamp,
            title: format!("{} at {}", event.event_type, format_time(event.timestamp)),
            active: self.is_active(event.timestamp),
        });

        let cross = self.correlated.iter().map(|c| Marker {
            kind: MarkerKind::CrossStream { streams: c.streams },
            position: position_for(c.timestamp, duration),
            timestamp: c.timestamp,
            title: format!(
                "Cross-stream: {} (streams {}, {})",
                c.description, c.streams[0], c.streams[1]
            ),
            active: self.is_active(c.timestamp),
        });

        regular.chain(cross).collect()
    }

    /// Per-stream events near the current time
    #[must_use]
    pub fn active_events(&self) -> Vec<(StreamId, &'a Event)> {
        self.events
            .iter()
            .filter(|(_, e)| self.is_active(e.timestamp))
            .copied()
            .collect()
    }

    /// Correlated events near the current time
    #[must_use]
    pub fn active_correlated(&self) -> Vec<&'a CorrelatedEvent> {
        self.correlated
            .iter()
            .filter(|c| self.is_active(c.timestamp))
            .collect()
    }

    /// Labels at [`TICK_FRACTIONS`] of the duration
    #[must_use]
    pub fn tick_labels(&self) -> Vec<(f64, String)> {
        TICK_FRACTIONS
            .iter()
            .map(|f| (*f, format_time(self.state.duration * f)))
            .collect()
    }

    /// "Timeline" caption plus cross-stream count when there is any
    #[must_use]
    pub fn header(&self) -> String {
        if self.correlated.is_empty() {
            "Timeline".to_string()
        } else {
            format!("Timeline  {} cross-stream events", self.correlated.len())
        }
    }

    /// Seek target for a click on text column `col` of a `width`-column bar
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn time_at_column(&self, col: usize, width: usize) -> f64 {
        if width <= 1 {
            return 0.0;
        }
        time_for(col as f64 / (width - 1) as f64, self.state.duration)
    }

    /// Render header, bar and tick labels as three lines of text
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn render_text(&self, width: usize) -> Result<String> {
        let width = width.max(TICK_FRACTIONS.len() * 6);
        let column = |fraction: f64| (fraction * (width - 1) as f64).round() as usize;

        let played = column(self.progress());
        let mut bar = vec![UNPLAYED_GLYPH; width];
        bar[..played.min(width)].fill(PLAYED_GLYPH);

        for marker in self.markers() {
            let glyph = match &marker.kind {
                MarkerKind::Event { event_type, .. } => event_type.glyph(),
                MarkerKind::CrossStream { .. } => CROSS_STREAM_GLYPH,
            };
            bar[column(marker.position)] = glyph;
        }
        bar[played.min(width - 1)] = CURSOR_GLYPH;

        let mut labels = vec![' '; width];
        for (fraction, label) in self.tick_labels() {
            let len = label.len();
            let start = column(fraction).saturating_sub(len / 2).min(width - len);
            for (offset, ch) in label.chars().enumerate() {
                labels[start + offset] = ch;
            }
        }

        let mut out = String::new();
        writeln!(
            out,
            "{}  [{} / {}]",
            self.header(),
            format_time(self.state.current_time),
            format_time(self.state.duration)
        )?;
        writeln!(out, "{}", bar.into_iter().collect::<String>())?;
        write!(out, "{}", labels.into_iter().collect::<String>().trim_end())?;
        Ok(out)
    }
}
