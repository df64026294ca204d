//! Boundaries to the outside world: where landmarks come from, where frames
//! and engine tones go, and what the player can ask for.

use std::collections::VecDeque;
use std::time::Instant;

use racer_tone::EngineTone;

use crate::car::CarState;
use crate::error::{CoreError, Result};
use crate::geometry::RoadBounds;
use crate::gesture::ControlSignal;
use crate::landmark::HandLandmarks;
use crate::obstacle::Obstacle;
use crate::score::Scoreboard;

// ════════════════════════════════════════════════════════════════════════════
// Landmark source
// ════════════════════════════════════════════════════════════════════════════

/// One observation from the hand tracker.
#[derive(Clone, Debug, PartialEq)]
pub enum LandmarkSample {
    Hand(HandLandmarks),
    NoHand,
}

impl LandmarkSample {
    pub fn hand(&self) -> Option<&HandLandmarks> {
        match self {
            LandmarkSample::Hand(h) => Some(h),
            LandmarkSample::NoHand  => None,
        }
    }
}

pub trait LandmarkSource {
    /// Acquire the device.  A failure here is fatal for the session.
    fn open(&mut self) -> Result<()>;

    /// Latest sample, waiting no later than `deadline`.  A source that has
    /// nothing by then reports [`LandmarkSample::NoHand`].
    fn next_sample(&mut self, deadline: Instant) -> LandmarkSample;

    /// Release the device.  Safe to call more than once.
    fn close(&mut self);
}

/// Replays a fixed list of samples, then reports no hand forever.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    samples:     VecDeque<LandmarkSample>,
    open_error:  Option<String>,
    open:        bool,
    close_calls: usize,
}

impl ScriptedSource {
    pub fn new<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = LandmarkSample>,
    {
        ScriptedSource { samples: samples.into_iter().collect(), ..Default::default() }
    }

    /// The same hand for `frames` frames.
    pub fn repeat(hand: HandLandmarks, frames: usize) -> Self {
        Self::new(std::iter::repeat(LandmarkSample::Hand(hand)).take(frames))
    }

    /// A source whose `open` always fails.
    pub fn unavailable(reason: &str) -> Self {
        ScriptedSource { open_error: Some(reason.to_string()), ..Default::default() }
    }

    pub fn is_open(&self) -> bool { self.open }

    pub fn close_calls(&self) -> usize { self.close_calls }

    pub fn remaining(&self) -> usize { self.samples.len() }
}

impl LandmarkSource for ScriptedSource {
    fn open(&mut self) -> Result<()> {
        if let Some(why) = &self.open_error {
            return Err(CoreError::SensorUnavailable(why.clone()));
        }
        self.open = true;
        Ok(())
    }

    fn next_sample(&mut self, _deadline: Instant) -> LandmarkSample {
        if !self.open {
            return LandmarkSample::NoHand;
        }
        self.samples.pop_front().unwrap_or(LandmarkSample::NoHand)
    }

    fn close(&mut self) {
        self.open = false;
        self.close_calls += 1;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Audio sink
// ════════════════════════════════════════════════════════════════════════════

pub trait AudioSink {
    /// This frame's engine tone.
    fn emit(&mut self, tone: EngineTone);
    /// One-shot collision sound.
    fn crash(&mut self);
    /// Stop the engine until the next `emit`.
    fn silence(&mut self);
    fn set_muted(&mut self, _muted: bool) {}
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn emit(&mut self, _tone: EngineTone) {}
    fn crash(&mut self) {}
    fn silence(&mut self) {}
}

// ════════════════════════════════════════════════════════════════════════════
// Render sink + control surface
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCommand {
    Quit,
    Pause,
    Resume,
    TogglePause,
    ToggleMute,
}

/// Everything the frontend needs to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderFrame {
    pub road:            RoadBounds,
    pub car:             CarState,
    pub obstacles:       Vec<Obstacle>,
    pub scoreboard:      Scoreboard,
    pub signal:          ControlSignal,
    pub tone:            EngineTone,
    /// True for a short while after a collision.
    pub collision_flash: bool,
    pub paused:          bool,
    pub muted:           bool,
    /// No hand for long enough that the car is being slowed down.
    pub fail_safe:       bool,
    pub elapsed:         f32,
    pub time_remaining:  Option<f32>,
}

pub trait Frontend {
    fn present(&mut self, frame: &RenderFrame);
    /// Commands issued since the last poll, oldest first.
    fn poll_commands(&mut self) -> Vec<ControlCommand>;
}
