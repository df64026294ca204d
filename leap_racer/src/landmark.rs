//! Landmark sources: LeapMotion hardware and a keyboard/mouse simulated hand.
//!
//! Both produce [`LandmarkSample`]s in normalized image coordinates, so the
//! game loop cannot tell them apart.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;

use racer_core::{HandLandmarks, HandPose, LandmarkSample, LandmarkSource, Result};

// ════════════════════════════════════════════════════════════════════════════
// InputKind — which source the player picked
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Simulated,
    #[cfg(feature = "leap")]
    Leap,
}

impl InputKind {
    pub fn name(self) -> &'static str {
        match self {
            InputKind::Simulated => "keyboard / mouse simulation",
            #[cfg(feature = "leap")]
            InputKind::Leap      => "LeapMotion controller",
        }
    }
}

impl Default for InputKind {
    #[cfg(feature = "leap")]
    fn default() -> Self { InputKind::Leap }
    #[cfg(not(feature = "leap"))]
    fn default() -> Self { InputKind::Simulated }
}

/// The concrete source the app runs with.
pub enum AppSource {
    Sim(SimLandmarkSource),
    #[cfg(feature = "leap")]
    Leap(LeapLandmarkSource),
}

impl LandmarkSource for AppSource {
    fn open(&mut self) -> Result<()> {
        match self {
            AppSource::Sim(s)  => s.open(),
            #[cfg(feature = "leap")]
            AppSource::Leap(s) => s.open(),
        }
    }

    fn next_sample(&mut self, deadline: Instant) -> LandmarkSample {
        match self {
            AppSource::Sim(s)  => s.next_sample(deadline),
            #[cfg(feature = "leap")]
            AppSource::Leap(s) => s.next_sample(deadline),
        }
    }

    fn close(&mut self) {
        match self {
            AppSource::Sim(s)  => s.close(),
            #[cfg(feature = "leap")]
            AppSource::Leap(s) => s.close(),
        }
    }
}

/// Build the source for `kind`.  The simulated source reads `sim_rx`; the
/// hardware source ignores it.
pub fn make_source(kind: InputKind, sim_rx: Receiver<SimInput>) -> AppSource {
    match kind {
        InputKind::Simulated => AppSource::Sim(SimLandmarkSource::new(sim_rx)),
        #[cfg(feature = "leap")]
        InputKind::Leap      => {
            drop(sim_rx);
            AppSource::Leap(LeapLandmarkSource::new())
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapLandmarkSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// # Mapping
///
/// LeapMotion reports joints in millimetres above the device, `y` up.  The
/// interaction box below is stretched onto the unit square with `y` flipped,
/// which makes a hand held over the device look like a hand seen by a camera
/// facing the player.  Per finger the four joints are the bases of the
/// proximal, intermediate and distal bones plus the distal tip.
#[cfg(feature = "leap")]
pub struct LeapLandmarkSource {
    connection: Option<leaprs::Connection>,
}

#[cfg(feature = "leap")]
impl LeapLandmarkSource {
    // Interaction box, millimetres.
    const X_RANGE: (f32, f32) = (-200.0, 200.0);
    const Y_RANGE: (f32, f32) = (100.0, 500.0);

    pub fn new() -> Self { LeapLandmarkSource { connection: None } }

    fn normalize(x: f32, y: f32, z: f32) -> racer_core::Point3 {
        let (x0, x1) = Self::X_RANGE;
        let (y0, y1) = Self::Y_RANGE;
        racer_core::Point3::new(
            ((x - x0) / (x1 - x0)).clamp(0.0, 1.0),
            (1.0 - (y - y0) / (y1 - y0)).clamp(0.0, 1.0),
            z / (x1 - x0),
        )
    }

    fn convert(hand: &leaprs::Hand) -> Option<HandLandmarks> {
        let digits: Vec<_> = hand.digits().collect();
        if digits.len() < 5 { return None; }

        let mut points = Vec::with_capacity(racer_core::Landmark::COUNT);
        // Wrist: base of the middle metacarpal.
        let w = digits[2].metacarpal().prev_joint();
        points.push(Self::normalize(w.x, w.y, w.z));
        for d in &digits {
            let joints = [
                d.proximal().prev_joint(),
                d.intermediate().prev_joint(),
                d.distal().prev_joint(),
                d.distal().next_joint(),
            ];
            for j in &joints {
                points.push(Self::normalize(j.x, j.y, j.z));
            }
        }
        HandLandmarks::from_slice(&points).ok()
    }
}

#[cfg(feature = "leap")]
impl LandmarkSource for LeapLandmarkSource {
    fn open(&mut self) -> Result<()> {
        use leaprs::{Connection, ConnectionConfig};
        use racer_core::CoreError;

        let mut connection = Connection::create(ConnectionConfig::default())
            .map_err(|e| CoreError::SensorUnavailable(format!("LeapC connection: {:?}", e)))?;
        connection
            .open()
            .map_err(|e| CoreError::SensorUnavailable(format!("LeapMotion device: {:?}", e)))?;
        log::info!("LeapMotion connection open");
        self.connection = Some(connection);
        Ok(())
    }

    fn next_sample(&mut self, deadline: Instant) -> LandmarkSample {
        use leaprs::{Event, HandType};

        let Some(connection) = self.connection.as_mut() else {
            return LandmarkSample::NoHand;
        };

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let timeout   = remaining.as_millis().min(100) as u32;
            let msg = match connection.poll(timeout) {
                Ok(m)  => m,
                Err(_) => return LandmarkSample::NoHand,
            };

            if let Event::Tracking(frame) = msg.event() {
                let hands: Vec<_> = frame.hands().collect();
                // Prefer the right hand; any hand will do.
                let hand = hands.iter()
                    .find(|h| h.hand_type() == HandType::Right)
                    .or_else(|| hands.first());
                return match hand.and_then(Self::convert) {
                    Some(h) => LandmarkSample::Hand(h),
                    None    => LandmarkSample::NoHand,
                };
            }

            if Instant::now() >= deadline {
                return LandmarkSample::NoHand;
            }
        }
    }

    fn close(&mut self) {
        if self.connection.take().is_some() {
            log::info!("LeapMotion connection closed");
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource — keyboard/mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    KeyDown(SimKey),
    KeyUp(SimKey),
    /// Pointer position in the window, normalized to `[0, 1]²`.  Sets the
    /// thumb height from `y` and the tilt from `x`.
    Pointer { x: f32, y: f32 },
}

/// Simulated key codes (mapped from minifb Key).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    ThumbUp,    // W / Up
    ThumbDown,  // S / Down
    TiltLeft,   // A / Left
    TiltRight,  // D / Right
    Brake,      // B (fist)
    Boost,      // V (V sign)
    ToggleHand, // H
}

/// Rates for held keys, per second.
const THUMB_RATE:  f32 = 0.6;
const TILT_RATE:   f32 = 0.12;
/// Tilt springs back to level at this rate when no steering key is held.
const TILT_RETURN: f32 = 0.2;
/// Largest simulated tilt, in normalized image units.
const TILT_MAX:    f32 = 0.08;

/// The hand the simulator is currently "holding up".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimHand {
    pub visible: bool,
    pub thumb_y: f32,
    /// `index_tip.y - pinky_tip.y`.  Negative steers left.
    pub tilt:    f32,
    pub pose:    HandPose,
}

impl Default for SimHand {
    fn default() -> Self {
        SimHand { visible: true, thumb_y: 0.75, tilt: 0.0, pose: HandPose::Drive }
    }
}

impl SimHand {
    pub fn landmarks(&self) -> Option<HandLandmarks> {
        self.visible.then(|| HandLandmarks::synthetic_pose(0.5, self.thumb_y, self.tilt, self.pose))
    }
}

/// Landmark source driven by [`SimInput`] events from the game window.
pub struct SimLandmarkSource {
    rx:        Receiver<SimInput>,
    hand:      SimHand,
    held:      Vec<SimKey>,
    last_poll: Option<Instant>,
    open:      bool,
}

impl SimLandmarkSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimLandmarkSource { rx, hand: SimHand::default(), held: Vec::new(), last_poll: None, open: false }
    }

    pub fn hand(&self) -> SimHand { self.hand }

    fn apply(&mut self, input: SimInput) {
        match input {
            SimInput::KeyDown(SimKey::ToggleHand) => {
                self.hand.visible = !self.hand.visible;
                log::debug!("simulated hand {}", if self.hand.visible { "shown" } else { "hidden" });
            }
            SimInput::KeyDown(k) => {
                if !self.held.contains(&k) { self.held.push(k); }
            }
            SimInput::KeyUp(k) => self.held.retain(|h| *h != k),
            SimInput::Pointer { x, y } => {
                self.hand.thumb_y = y.clamp(0.0, 1.0);
                self.hand.tilt    = ((x.clamp(0.0, 1.0) - 0.5) * 2.0 * TILT_MAX).clamp(-TILT_MAX, TILT_MAX);
            }
        }
    }

    /// Integrate held keys over `dt` seconds.
    fn advance(&mut self, dt: f32) {
        let held = |k: SimKey| self.held.contains(&k);
        let mut thumb = self.hand.thumb_y;
        let mut tilt  = self.hand.tilt;

        if held(SimKey::ThumbUp)   { thumb -= THUMB_RATE * dt; }
        if held(SimKey::ThumbDown) { thumb += THUMB_RATE * dt; }

        let steering = held(SimKey::TiltLeft) || held(SimKey::TiltRight);
        if held(SimKey::TiltLeft)  { tilt -= TILT_RATE * dt; }
        if held(SimKey::TiltRight) { tilt += TILT_RATE * dt; }
        if !steering {
            let step = TILT_RETURN * dt;
            tilt = if tilt > 0.0 { (tilt - step).max(0.0) } else { (tilt + step).min(0.0) };
        }

        self.hand.thumb_y = thumb.clamp(0.0, 1.0);
        self.hand.tilt    = tilt.clamp(-TILT_MAX, TILT_MAX);
        self.hand.pose    = if held(SimKey::Brake) {
            HandPose::Fist
        } else if held(SimKey::Boost) {
            HandPose::Boost
        } else {
            HandPose::Drive
        };
    }
}

impl LandmarkSource for SimLandmarkSource {
    fn open(&mut self) -> Result<()> {
        self.open = true;
        self.last_poll = None;
        log::info!("simulated hand ready");
        Ok(())
    }

    fn next_sample(&mut self, _deadline: Instant) -> LandmarkSample {
        if !self.open { return LandmarkSample::NoHand; }

        loop {
            match self.rx.try_recv() {
                Ok(input) => self.apply(input),
                Err(TryRecvError::Empty) => break,
                // Window gone; keep reporting the last hand until the loop stops.
                Err(TryRecvError::Disconnected) => break,
            }
        }

        let now = Instant::now();
        let dt  = self.last_poll.map(|t| now.duration_since(t).as_secs_f32()).unwrap_or(0.0);
        self.last_poll = Some(now);
        self.advance(dt.min(0.1));

        match self.hand.landmarks() {
            Some(h) => LandmarkSample::Hand(h),
            None    => LandmarkSample::NoHand,
        }
    }

    fn close(&mut self) {
        self.open = false;
        self.held.clear();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use racer_core::{GestureInterpreter, InterpreterConfig, Landmark};

    fn sim() -> (mpsc::Sender<SimInput>, SimLandmarkSource) {
        let (tx, rx) = mpsc::channel();
        let mut src = SimLandmarkSource::new(rx);
        src.open().unwrap();
        (tx, src)
    }

    #[test]
    fn default_hand_is_visible_and_stopped() {
        let (_tx, mut src) = sim();
        let sample = src.next_sample(Instant::now());
        let hand = sample.hand().expect("hand");
        let interp = GestureInterpreter::new(InterpreterConfig::default());
        assert_eq!(interp.raw_speed(hand), 0.0);
        assert_eq!(interp.raw_steering(hand), 0.0);
    }

    #[test]
    fn toggle_hides_hand() {
        let (tx, mut src) = sim();
        tx.send(SimInput::KeyDown(SimKey::ToggleHand)).unwrap();
        assert_eq!(src.next_sample(Instant::now()), LandmarkSample::NoHand);
        tx.send(SimInput::KeyDown(SimKey::ToggleHand)).unwrap();
        assert!(src.next_sample(Instant::now()).hand().is_some());
    }

    #[test]
    fn pointer_sets_thumb_and_tilt() {
        let (tx, mut src) = sim();
        tx.send(SimInput::Pointer { x: 1.0, y: 0.2 }).unwrap();
        let sample = src.next_sample(Instant::now());
        let hand = sample.hand().unwrap();
        assert!((hand.get(Landmark::ThumbTip).y - 0.2).abs() < 1e-6);
        let interp = GestureInterpreter::new(InterpreterConfig::default());
        assert!(interp.raw_steering(hand) > 0.0);
        assert!(interp.raw_speed(hand) > 0.9);
    }

    #[test]
    fn held_keys_move_the_hand() {
        let (_tx, mut src) = sim();
        src.apply(SimInput::KeyDown(SimKey::ThumbUp));
        src.apply(SimInput::KeyDown(SimKey::TiltLeft));
        src.advance(0.5);
        assert!((src.hand().thumb_y - 0.45).abs() < 1e-5);
        assert!(src.hand().tilt < 0.0);

        src.apply(SimInput::KeyUp(SimKey::TiltLeft));
        src.advance(1.0);
        assert_eq!(src.hand().tilt, 0.0);
    }

    #[test]
    fn brake_and_boost_keys_shape_the_hand() {
        let (tx, mut src) = sim();
        let interp = GestureInterpreter::new(InterpreterConfig::default());

        tx.send(SimInput::KeyDown(SimKey::Boost)).unwrap();
        let sample = src.next_sample(Instant::now());
        assert_eq!(interp.pose(sample.hand().unwrap()), HandPose::Boost);

        // Brake wins while both are held.
        tx.send(SimInput::KeyDown(SimKey::Brake)).unwrap();
        let sample = src.next_sample(Instant::now());
        assert_eq!(interp.pose(sample.hand().unwrap()), HandPose::Fist);

        tx.send(SimInput::KeyUp(SimKey::Brake)).unwrap();
        tx.send(SimInput::KeyUp(SimKey::Boost)).unwrap();
        let sample = src.next_sample(Instant::now());
        assert_eq!(interp.pose(sample.hand().unwrap()), HandPose::Drive);
    }

    #[test]
    fn closed_source_reports_no_hand() {
        let (_tx, mut src) = sim();
        src.close();
        assert_eq!(src.next_sample(Instant::now()), LandmarkSample::NoHand);
    }
}
