//! Comparison session
//!
//! Owns everything a side-by-side comparison needs: the selected streams, the
//! event store, the shared playback clock, the attached player handles, and
//! the cached correlation result. All side effects go through here.
//!
//! Player handles are indexed by selection position (0..K), not by stream id,
//! so a selection of streams 2, 5 and 7 uses handles 0, 1 and 2. Position 0 is
//! the reference player: only its time and duration reports move the clock.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::correlate::sort_by_time;
use super::player::PlayerHandle;
use super::{
    CompareError, CorrelatedEvent, CorrelationStrategy, Correlator, CrossStreamReport, Event,
    EventSource, EventStore, MockEventSource, PlaybackClock, PlaybackState, Result, StreamId,
    Timeline, ACTIVE_WINDOW, CORRELATION_WINDOW, MAX_SLOTS,
};

/// Selection position whose player drives the clock
pub const REFERENCE_INDEX: usize = 0;

/// How many players are shown (and synced) at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Layout {
    #[default]
    #[serde(rename = "2-up")]
    TwoUp,
    #[serde(rename = "3-up")]
    ThreeUp,
    #[serde(rename = "4-up")]
    FourUp,
}

impl Layout {
    #[must_use]
    pub fn visible_count(self) -> usize {
        match self {
            Self::TwoUp => 2,
            Self::ThreeUp => 3,
            Self::FourUp => 4,
        }
    }

    /// Grid columns; 4-up is a 2×2 grid
    #[must_use]
    pub fn grid_columns(self) -> usize {
        match self {
            Self::TwoUp | Self::FourUp => 2,
            Self::ThreeUp => 3,
        }
    }
}

impl FromStr for Layout {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "2-up" | "2" => Ok(Self::TwoUp),
            "3-up" | "3" => Ok(Self::ThreeUp),
            "4-up" | "4" => Ok(Self::FourUp),
            other => Err(CompareError::UnknownLayout(other.to_string())),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-up", self.visible_count())
    }
}

/// One selected stream as handed over by the file-selection layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInput {
    pub stream_slot: u32,
    /// Opaque media reference (path or URL); never opened by the session
    pub media_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_file_id: Option<String>,
    /// Events already supplied by the backend, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Event>>,
}

impl StreamInput {
    pub fn new(stream_slot: u32, media_file: impl Into<String>) -> Self {
        Self {
            stream_slot,
            media_file: media_file.into(),
            backend_file_id: None,
            events: None,
        }
    }

    #[must_use]
    pub fn with_file_id(mut self, file_id: impl Into<String>) -> Self {
        self.backend_file_id = Some(file_id.into());
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = Some(events);
        self
    }
}

/// A stream loaded into the session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stream {
    pub id: StreamId,
    pub media_file: String,
    pub backend_file_id: Option<String>,
}

/// Session tuning
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub correlation_window: f64,
    pub active_window: f64,
    pub strategy: CorrelationStrategy,
    pub layout: Layout,
    /// Fill streams without events with placeholder detections
    pub mock_events: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            correlation_window: CORRELATION_WINDOW,
            active_window: ACTIVE_WINDOW,
            strategy: CorrelationStrategy::default(),
            layout: Layout::default(),
            mock_events: false,
        }
    }
}

/// Cached correlation result, valid for one store revision
struct CorrelationCache {
    revision: u64,
    events: Vec<CorrelatedEvent>,
}

/// Side-by-side comparison of two or more streams
pub struct ComparisonSession {
    streams: Vec<Stream>,
    store: EventStore,
    clock: PlaybackClock,
    players: Vec<Option<Box<dyn PlayerHandle>>>,
    correlator: Correlator,
    cache: Option<CorrelationCache>,
    correlation_runs: usize,
    options: SessionOptions,
}

impl fmt::Debug for ComparisonSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparisonSession")
            .field("streams", &self.streams)
            .field("state", &self.clock.state())
            .field("attached_players", &self.attached_players())
            .field("layout", &self.options.layout)
            .finish_non_exhaustive()
    }
}

impl ComparisonSession {
    /// Load a session from the selected streams.
    ///
    /// Needs at least two streams. Streams without events get placeholder
    /// detections when `mock_events` is set, otherwise an empty sequence.
    pub fn load(inputs: Vec<StreamInput>, options: SessionOptions) -> Result<Self> {
        let mut session = Self::validate(&inputs, options)?;
        for (index, input) in inputs.into_iter().enumerate() {
            let id = StreamId(input.stream_slot);
            let events = match input.events {
                Some(events) => events,
                None if session.options.mock_events => MockEventSource::generate(index),
                None => Vec::new(),
            };
            session.store.set_events(id, events)?;
        }
        session.finish_load();
        Ok(session)
    }

    /// Load a session, asking `source` for the events of every stream that
    /// arrived without any.
    ///
    /// When the source has nothing for a stream and `mock_events` is set, the
    /// stream gets the same placeholder detections [`load`](Self::load) uses.
    pub async fn load_with_source(
        inputs: Vec<StreamInput>,
        options: SessionOptions,
        source: &dyn EventSource,
    ) -> Result<Self> {
        let mut session = Self::validate(&inputs, options)?;
        for (index, input) in inputs.into_iter().enumerate() {
            let id = StreamId(input.stream_slot);
            let events = match input.events {
                Some(events) => events,
                None => {
                    let events = source.events_for(index, id).await?;
                    if events.is_empty() && session.options.mock_events {
                        debug!(
                            "No events for stream {id} from {}, using placeholders",
                            source.name()
                        );
                        MockEventSource::generate(index)
                    } else {
                        events
                    }
                }
            };
            session.store.set_events(id, events)?;
        }
        session.finish_load();
        Ok(session)
    }

    fn validate(inputs: &[StreamInput], options: SessionOptions) -> Result<Self> {
        if inputs.len() < 2 {
            return Err(CompareError::NotEnoughStreams {
                found: inputs.len(),
            });
        }

        let mut streams: Vec<Stream> = Vec::with_capacity(inputs.len());
        for input in inputs {
            if !(1..=MAX_SLOTS).contains(&input.stream_slot) {
                return Err(CompareError::InvalidSlot(input.stream_slot));
            }
            let id = StreamId(input.stream_slot);
            if streams.iter().any(|s| s.id == id) {
                return Err(CompareError::DuplicateStream(id));
            }
            streams.push(Stream {
                id,
                media_file: input.media_file.clone(),
                backend_file_id: input.backend_file_id.clone(),
            });
        }

        let correlator =
            Correlator::with_window(options.correlation_window).strategy(options.strategy);
        let active = options.layout.visible_count().min(streams.len());

        Ok(Self {
            streams,
            store: EventStore::new(),
            clock: PlaybackClock::new(),
            players: (0..active).map(|_| None).collect(),
            correlator,
            cache: None,
            correlation_runs: 0,
            options,
        })
    }

    fn finish_load(&mut self) {
        self.refresh_correlations();
        info!(
            "Loaded comparison of {} streams ({} events, {} cross-stream)",
            self.streams.len(),
            self.store.event_count(),
            self.cache.as_ref().map_or(0, |c| c.events.len())
        );
    }

    // ─── Streams & events ────────────────────────────────────────────────────

    /// Selected streams in selection order
    #[must_use]
    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    /// Streams that get a player under the current layout
    #[must_use]
    pub fn active_streams(&self) -> &[Stream] {
        &self.streams[..self.players.len()]
    }

    #[must_use]
    pub fn store(&self) -> &EventStore {
        &self.store
    }

    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Replace the events of a loaded stream
    pub fn set_stream_events(&mut self, stream: StreamId, events: Vec<Event>) -> Result<()> {
        if !self.streams.iter().any(|s| s.id == stream) {
            return Err(CompareError::UnknownStream(stream));
        }
        self.store.set_events(stream, events)
    }

    /// Detach a stream: its events go, its player (if any) is dropped, and
    /// later selection positions shift down by one.
    pub fn remove_stream(&mut self, stream: StreamId) -> bool {
        let Some(index) = self.streams.iter().position(|s| s.id == stream) else {
            return false;
        };
        self.streams.remove(index);
        self.store.remove_stream(stream);
        if index < self.players.len() {
            self.players.remove(index);
            if self.players.len() < self.options.layout.visible_count().min(self.streams.len()) {
                self.players.push(None);
            }
        }
        debug!("Removed stream {stream}");
        true
    }

    // ─── Players ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn layout(&self) -> Layout {
        self.options.layout
    }

    /// Switch layout. Handles beyond the new visible count are dropped.
    pub fn set_layout(&mut self, layout: Layout) {
        self.options.layout = layout;
        let active = layout.visible_count().min(self.streams.len());
        self.players.truncate(active);
        while self.players.len() < active {
            self.players.push(None);
        }
    }

    /// Attach a player at selection position `index` and bring it in line
    /// with the shared clock.
    pub fn attach_player(&mut self, index: usize, mut player: Box<dyn PlayerHandle>) -> Result<()> {
        let active = self.players.len();
        let Some(slot) = self.players.get_mut(index) else {
            return Err(CompareError::InactivePlayerSlot { index, active });
        };

        let state = self.clock.state();
        player.set_rate(state.rate);
        player.seek(state.current_time);
        if state.is_playing {
            player.play();
        }
        *slot = Some(player);
        debug!("Attached player {index}");
        Ok(())
    }

    /// Remove and return the player at `index`
    pub fn detach_player(&mut self, index: usize) -> Option<Box<dyn PlayerHandle>> {
        self.players.get_mut(index).and_then(Option::take)
    }

    #[must_use]
    pub fn attached_players(&self) -> usize {
        self.players.iter().filter(|p| p.is_some()).count()
    }

    fn each_player(&mut self, mut f: impl FnMut(&mut dyn PlayerHandle)) {
        for player in self.players.iter_mut().flatten() {
            f(player.as_mut());
        }
    }

    // ─── Playback control ────────────────────────────────────────────────────

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.clock.state()
    }

    pub fn play(&mut self) {
        if self.clock.play() {
            self.each_player(|p| p.play());
        }
    }

    pub fn pause(&mut self) {
        if self.clock.pause() {
            self.each_player(|p| p.pause());
        }
    }

    /// Play/pause button
    pub fn toggle_play(&mut self) {
        if self.clock.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Seek every player to the clamped target; returns it
    pub fn seek(&mut self, time: f64) -> f64 {
        let target = self.clock.seek(time);
        self.each_player(|p| p.seek(target));
        target
    }

    pub fn skip(&mut self, delta: f64) -> f64 {
        let target = self.clock.skip(delta);
        self.each_player(|p| p.seek(target));
        target
    }

    pub fn set_rate(&mut self, rate: f64) {
        self.clock.set_rate(rate);
        self.each_player(|p| p.set_rate(rate));
    }

    /// Seek to a correlated (or any) event's timestamp
    pub fn jump_to_event(&mut self, timestamp: f64) -> f64 {
        self.seek(timestamp)
    }

    /// Timeline click at `fraction` along the axis
    pub fn seek_fraction(&mut self, fraction: f64) -> f64 {
        let target = super::timeline::time_for(fraction, self.clock.duration());
        self.seek(target)
    }

    /// Native time update from the player at `index`
    pub fn on_player_time(&mut self, index: usize, time: f64) {
        if index == REFERENCE_INDEX {
            self.clock.on_time_report(time);
        } else {
            trace!("Ignoring time report {time:.2}s from player {index}");
        }
    }

    /// Metadata duration from the player at `index`
    pub fn on_player_duration(&mut self, index: usize, duration: f64) {
        if index == REFERENCE_INDEX {
            self.clock.on_duration_report(duration);
        } else {
            trace!("Ignoring duration report {duration:.2}s from player {index}");
        }
    }

    // ─── Derived views ───────────────────────────────────────────────────────

    fn refresh_correlations(&mut self) {
        let revision = self.store.revision();
        if self.cache.as_ref().is_some_and(|c| c.revision == revision) {
            return;
        }

        let mut events = self.correlator.correlate_store(&self.store);
        sort_by_time(&mut events);
        self.correlation_runs += 1;
        debug!(
            "Recomputed correlations at revision {revision}: {} cross-stream events",
            events.len()
        );
        self.cache = Some(CorrelationCache { revision, events });
    }

    /// Correlated events, sorted by timestamp. Recomputed only when the
    /// stream or event sets changed since the last call.
    pub fn correlated_events(&mut self) -> &[CorrelatedEvent] {
        self.refresh_correlations();
        self.cache
            .as_ref()
            .map(|c| c.events.as_slice())
            .unwrap_or_default()
    }

    /// How many times correlation actually ran
    #[must_use]
    pub fn correlation_runs(&self) -> usize {
        self.correlation_runs
    }

    /// Timeline frame at the current clock position
    pub fn timeline(&mut self) -> Timeline<'_> {
        self.refresh_correlations();
        let correlated = self
            .cache
            .as_ref()
            .map(|c| c.events.as_slice())
            .unwrap_or_default();
        Timeline::new(self.clock.state(), self.store.all_events(), correlated)
            .with_active_window(self.options.active_window)
    }

    /// Cross-stream panel at the current clock position
    pub fn cross_stream_report(&mut self) -> CrossStreamReport {
        let current_time = self.clock.current_time();
        let window = self.options.active_window;
        CrossStreamReport::new(self.correlated_events(), current_time, window)
    }

    /// Events of the stream at `index` shown over its player right now
    #[must_use]
    pub fn player_overlay(&self, index: usize) -> Vec<&Event> {
        let Some(stream) = self.streams.get(index) else {
            return Vec::new();
        };
        let now = self.clock.current_time();
        self.store
            .events(stream.id)
            .iter()
            .filter(|e| e.is_active_at(now, self.options.active_window))
            .collect()
    }
}
