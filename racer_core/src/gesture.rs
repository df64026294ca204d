//! Gesture interpretation: hand landmarks to a normalized control signal.
//!
//! Per frame the interpreter reads three keypoints:
//!
//! | Keypoint | Drives | Mapping |
//! |---|---|---|
//! | Thumb tip height | speed | linear over the calibrated band, clamped to 0–1 |
//! | Index tip vs pinky tip height | steering | tilt / hand span, dead-zoned, clamped to ±1 |
//!
//! Before that the hand's shape is classified ([`GestureInterpreter::pose`]).
//! A fist or a splayed open palm brakes and a V of index and middle fingers
//! boosts; both hold the wheel straight, and the car applies the timed
//! brake or boost itself.
//!
//! Both outputs are exponentially smoothed against the previous frame's
//! signal.  When the hand disappears the previous signal is held; after
//! [`InterpreterConfig::dropout_threshold`] seconds without a hand both
//! values ramp down to zero (the fail-safe).
//!
//! The interpreter itself is stateless: the smoothing memory is the
//! `previous` signal and the dropout accumulator is a [`DropoutClock`], both
//! owned by the caller.

use crate::landmark::{HandLandmarks, HandPose, Landmark};

// ════════════════════════════════════════════════════════════════════════════
// ControlSignal
// ════════════════════════════════════════════════════════════════════════════

/// The normalized `(speed, steering)` pair driving the car for one frame,
/// plus the brake/boost pose it was read with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlSignal {
    speed:        f32,
    steering:     f32,
    hand_present: bool,
    pose:         HandPose,
}

impl ControlSignal {
    /// Build a signal, clamping `speed` to `[0, 1]` and `steering` to
    /// `[-1, 1]`.  NaN inputs collapse to zero.
    pub fn new(speed: f32, steering: f32, hand_present: bool) -> Self {
        let speed    = if speed.is_nan()    { 0.0 } else { speed.clamp(0.0, 1.0) };
        let steering = if steering.is_nan() { 0.0 } else { steering.clamp(-1.0, 1.0) };
        ControlSignal { speed, steering, hand_present, pose: HandPose::Drive }
    }

    pub fn with_pose(mut self, pose: HandPose) -> Self {
        self.pose = pose;
        self
    }

    /// Stopped, wheel centred, no hand.
    pub fn neutral() -> Self {
        ControlSignal { speed: 0.0, steering: 0.0, hand_present: false, pose: HandPose::Drive }
    }

    pub fn speed(&self)        -> f32  { self.speed }
    pub fn steering(&self)     -> f32  { self.steering }
    pub fn hand_present(&self) -> bool { self.hand_present }
    pub fn pose(&self)         -> HandPose { self.pose }
    pub fn braking(&self)      -> bool { self.pose.brakes() }
    pub fn boosting(&self)     -> bool { self.pose.boosts() }
}

impl Default for ControlSignal {
    fn default() -> Self { ControlSignal::neutral() }
}

// ════════════════════════════════════════════════════════════════════════════
// DropoutClock — time since the last frame with a hand
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DropoutClock {
    elapsed: f32,
}

impl DropoutClock {
    pub fn new() -> Self { DropoutClock { elapsed: 0.0 } }

    /// Seconds since a hand was last seen.
    pub fn elapsed(&self) -> f32 { self.elapsed }

    pub fn tick(&mut self, dt: f32) { self.elapsed += sanitize_dt(dt); }

    pub fn reset(&mut self) { self.elapsed = 0.0; }

    pub fn has_expired(&self, threshold: f32) -> bool { self.elapsed >= threshold }
}

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

/// Thumb-tip heights (normalized image y) that map to full and zero speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedCalibration {
    /// Thumb at or above this height → speed 1.0.
    pub top_y:    f32,
    /// Thumb at or below this height → speed 0.0.
    pub bottom_y: f32,
}

impl Default for SpeedCalibration {
    fn default() -> Self {
        SpeedCalibration { top_y: 0.25, bottom_y: 0.75 }
    }
}

/// Finger-shape limits for [`GestureInterpreter::pose`], in palm widths.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseThresholds {
    /// Tip-to-knuckle reach below which a finger counts as curled.
    pub curled_reach:   f32,
    /// Reach above which a finger counts as extended.
    pub extended_reach: f32,
    /// Smallest gap between neighbouring fingertips of an open palm.
    pub palm_spread:    f32,
    /// Smallest gap between index and middle tips of the boost V.
    pub v_spread:       f32,
}

impl Default for PoseThresholds {
    fn default() -> Self {
        PoseThresholds { curled_reach: 0.45, extended_reach: 0.6, palm_spread: 0.5, v_spread: 0.3 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterpreterConfig {
    pub calibration: SpeedCalibration,
    /// Multiplier applied to the normalized tilt before clamping.
    pub steering_gain: f32,
    /// Normalized tilt below which steering reads as exactly zero.
    pub dead_zone: f32,
    /// Weight kept from the previous frame, in `[0, 1)`.  0 disables
    /// smoothing; values near 1 make the signal sluggish.
    pub smoothing: f32,
    /// Seconds without a hand before the fail-safe engages.
    pub dropout_threshold: f32,
    /// Fail-safe speed ramp, in speed units per second.
    pub speed_decay_per_sec: f32,
    /// Fail-safe steering ramp toward centre, per second.
    pub steering_decay_per_sec: f32,
    pub poses: PoseThresholds,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            calibration:            SpeedCalibration::default(),
            steering_gain:          2.5,
            dead_zone:              0.06,
            smoothing:              0.2,
            dropout_threshold:      3.0,
            speed_decay_per_sec:    0.5,
            steering_decay_per_sec: 1.0,
            poses:                  PoseThresholds::default(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureInterpreter
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct GestureInterpreter {
    config: InterpreterConfig,
}

impl GestureInterpreter {
    pub fn new(config: InterpreterConfig) -> Self {
        GestureInterpreter { config }
    }

    pub fn config(&self) -> &InterpreterConfig { &self.config }

    /// Unsmoothed speed for one hand.
    pub fn raw_speed(&self, hand: &HandLandmarks) -> f32 {
        let cal  = &self.config.calibration;
        let band = cal.bottom_y - cal.top_y;
        if band.abs() < f32::EPSILON { return 0.0; }
        let y = hand.get(Landmark::ThumbTip).y;
        ((cal.bottom_y - y) / band).clamp(0.0, 1.0)
    }

    /// Unsmoothed steering for one hand.  Negative = left.
    pub fn raw_steering(&self, hand: &HandLandmarks) -> f32 {
        let span = hand.span();
        if span < 1e-6 { return 0.0; }

        // Image y grows downward: index above pinky gives a negative tilt.
        let tilt = (hand.get(Landmark::IndexTip).y - hand.get(Landmark::PinkyTip).y) / span;
        let dz   = self.config.dead_zone.max(0.0);
        if tilt.abs() <= dz { return 0.0; }

        let magnitude = (tilt.abs() - dz) * self.config.steering_gain;
        (tilt.signum() * magnitude).clamp(-1.0, 1.0)
    }

    /// Classify the hand's shape.  Checked in order fist, open palm, boost;
    /// anything else drives.
    pub fn pose(&self, hand: &HandLandmarks) -> HandPose {
        let t    = &self.config.poses;
        let palm = hand.palm_width();
        if palm < 1e-6 { return HandPose::Drive; }

        let reach    = |f: usize| hand.finger_reach(f) / palm;
        let curled   = |f: usize| reach(f) < t.curled_reach;
        let extended = |f: usize| reach(f) > t.extended_reach;
        let gap = |a: Landmark, b: Landmark| hand.get(a).planar_distance(&hand.get(b)) / palm;

        if (1..=4).all(|f| curled(f)) {
            return HandPose::Fist;
        }
        let tips = [Landmark::IndexTip, Landmark::MiddleTip, Landmark::RingTip, Landmark::PinkyTip];
        if (1..=4).all(|f| extended(f)) && tips.windows(2).all(|w| gap(w[0], w[1]) > t.palm_spread) {
            return HandPose::OpenPalm;
        }
        if extended(1) && extended(2) && curled(3) && curled(4)
            && gap(Landmark::IndexTip, Landmark::MiddleTip) > t.v_spread
        {
            return HandPose::Boost;
        }
        HandPose::Drive
    }

    /// Produce this frame's control signal.
    ///
    /// `clock` is advanced on frames without a hand and reset on frames
    /// with one.  A brake pose survives a dropout; a boost does not.
    pub fn interpret(
        &self,
        hand:     Option<&HandLandmarks>,
        previous: &ControlSignal,
        clock:    &mut DropoutClock,
        dt:       f32,
    ) -> ControlSignal {
        let dt = sanitize_dt(dt);

        match hand {
            Some(hand) => {
                clock.reset();
                let pose = self.pose(hand);
                let (raw_speed, raw_steering) = match pose {
                    HandPose::Drive => (self.raw_speed(hand), self.raw_steering(hand)),
                    HandPose::Boost => (1.0, 0.0),
                    HandPose::Fist | HandPose::OpenPalm => (0.0, 0.0),
                };
                let speed    = self.smooth(raw_speed,    previous.speed());
                let steering = self.smooth(raw_steering, previous.steering());
                ControlSignal::new(speed, steering, true).with_pose(pose)
            }
            None => {
                clock.tick(dt);
                let pose = if previous.braking() { previous.pose() } else { HandPose::Drive };
                if !clock.has_expired(self.config.dropout_threshold) {
                    return ControlSignal::new(previous.speed(), previous.steering(), false).with_pose(pose);
                }
                let speed    = approach_zero(previous.speed(),    self.config.speed_decay_per_sec    * dt);
                let steering = approach_zero(previous.steering(), self.config.steering_decay_per_sec * dt);
                ControlSignal::new(speed, steering, false).with_pose(pose)
            }
        }
    }

    /// True once the no-hand fail-safe is forcing the signal down.
    pub fn fail_safe_active(&self, clock: &DropoutClock) -> bool {
        clock.has_expired(self.config.dropout_threshold)
    }

    fn smooth(&self, raw: f32, previous: f32) -> f32 {
        let keep = self.config.smoothing.clamp(0.0, 0.999);
        raw + keep * (previous - raw)
    }
}

/// Move `value` toward zero by at most `step`, never overshooting.
fn approach_zero(value: f32, step: f32) -> f32 {
    let step = step.max(0.0);
    if value > 0.0 {
        (value - step).max(0.0)
    } else {
        (value + step).min(0.0)
    }
}

fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
