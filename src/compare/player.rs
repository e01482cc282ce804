//! Player control handles
//!
//! The session never touches media directly. Each compared stream is driven
//! through a [`PlayerHandle`]; [`SimulatedPlayer`] stands in for a real media
//! element in the CLI and in tests.

use std::cell::RefCell;
use std::rc::Rc;

/// Control surface of one attached media player
pub trait PlayerHandle {
    fn seek(&mut self, time: f64);
    fn set_rate(&mut self, rate: f64);
    fn play(&mut self);
    fn pause(&mut self);
}

/// A command received by a player, in arrival order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    Seek(f64),
    SetRate(f64),
    Play,
    Pause,
}

/// Internal state of a [`SimulatedPlayer`]
#[derive(Debug, Clone, Default)]
pub struct SimulatedState {
    pub position: f64,
    pub rate: f64,
    pub playing: bool,
    /// Media length; playback stops here
    pub duration: f64,
    pub commands: Vec<PlayerCommand>,
}

/// Player that advances its own clock when ticked.
///
/// Clones share state, so a caller can keep one clone to tick and inspect
/// while the session owns another as its handle.
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    state: Rc<RefCell<SimulatedState>>,
}

impl SimulatedPlayer {
    #[must_use]
    pub fn new(duration: f64) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimulatedState {
                rate: 1.0,
                duration,
                ..SimulatedState::default()
            })),
        }
    }

    /// Advance by `dt` wall-clock seconds; returns the new position
    pub fn tick(&self, dt: f64) -> f64 {
        let mut s = self.state.borrow_mut();
        if s.playing {
            s.position = (s.position + dt * s.rate).min(s.duration);
            if s.position >= s.duration {
                s.playing = false;
            }
        }
        s.position
    }

    #[must_use]
    pub fn position(&self) -> f64 {
        self.state.borrow().position
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.state.borrow().duration
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    #[must_use]
    pub fn rate(&self) -> f64 {
        self.state.borrow().rate
    }

    #[must_use]
    pub fn commands(&self) -> Vec<PlayerCommand> {
        self.state.borrow().commands.clone()
    }
}

impl PlayerHandle for SimulatedPlayer {
    fn seek(&mut self, time: f64) {
        let mut s = self.state.borrow_mut();
        s.commands.push(PlayerCommand::Seek(time));
        s.position = time.clamp(0.0, s.duration.max(0.0));
    }

    fn set_rate(&mut self, rate: f64) {
        let mut s = self.state.borrow_mut();
        s.commands.push(PlayerCommand::SetRate(rate));
        s.rate = rate;
    }

    fn play(&mut self) {
        let mut s = self.state.borrow_mut();
        s.commands.push(PlayerCommand::Play);
        s.playing = true;
    }

    fn pause(&mut self) {
        let mut s = self.state.borrow_mut();
        s.commands.push(PlayerCommand::Pause);
        s.playing = false;
    }
}
