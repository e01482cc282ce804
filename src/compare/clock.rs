//! Shared playback clock
//!
//! One logical time value for every compared player. The clock only holds
//! state; the session pushes each change out to the players after updating
//! it, so no player ever gets ahead of the authoritative time.

use serde::Serialize;
use tracing::{debug, warn};

/// Snapshot of the shared playback state
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Seconds
    pub current_time: f64,
    /// Seconds, 0 until the reference player reports metadata
    pub duration: f64,
    pub is_playing: bool,
    /// Playback speed multiplier
    pub rate: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            is_playing: false,
            rate: 1.0,
        }
    }
}

/// Authoritative playback position across all attached players
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    state: PlaybackState,
}

impl PlaybackClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.state.duration
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    #[must_use]
    pub fn rate(&self) -> f64 {
        self.state.rate
    }

    /// Start playback. Returns `true` if the state changed.
    pub fn play(&mut self) -> bool {
        let changed = !self.state.is_playing;
        self.state.is_playing = true;
        if changed {
            debug!("Playback started at {:.2}s", self.state.current_time);
        }
        changed
    }

    /// Pause playback. Returns `true` if the state changed.
    pub fn pause(&mut self) -> bool {
        let changed = self.state.is_playing;
        self.state.is_playing = false;
        if changed {
            debug!("Playback paused at {:.2}s", self.state.current_time);
        }
        changed
    }

    /// Flip between playing and paused, returning the new playing flag
    pub fn toggle(&mut self) -> bool {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play();
        }
        self.state.is_playing
    }

    /// Move to `time`, clamped to `[0, duration]`. Returns the clamped time.
    ///
    /// With an unknown duration every seek lands on 0. NaN seeks to 0.
    pub fn seek(&mut self, time: f64) -> f64 {
        let clamped = clamp_time(time, self.state.duration);
        self.state.current_time = clamped;
        debug!("Seek to {time:.2}s -> {clamped:.2}s");
        clamped
    }

    /// Seek relative to the current time; `delta` may be negative.
    pub fn skip(&mut self, delta: f64) -> f64 {
        self.seek(self.state.current_time + delta)
    }

    /// Store a new playback rate. Bounds are the caller's business.
    pub fn set_rate(&mut self, rate: f64) {
        self.state.rate = rate;
    }

    /// Time advanced by the reference player
    pub fn on_time_report(&mut self, time: f64) {
        if time.is_finite() {
            self.state.current_time = time;
        } else {
            warn!("Ignoring non-finite time report: {time}");
        }
    }

    /// Duration from the reference player's metadata. Later reports overwrite
    /// earlier ones; the current time is left as it is.
    pub fn on_duration_report(&mut self, duration: f64) {
        if duration.is_finite() && duration >= 0.0 {
            debug!("Duration set to {duration:.2}s");
            self.state.duration = duration;
        } else {
            warn!("Ignoring invalid duration report: {duration}");
        }
    }
}

fn clamp_time(time: f64, duration: f64) -> f64 {
    if time.is_nan() {
        return 0.0;
    }
    time.clamp(0.0, duration.max(0.0))
}
