//! The per-frame pipeline and the session state machine.
//!
//! ```text
//!   Idle ──start──▶ Running ◀──resume── Paused
//!     │                │ ──pause──────────▲
//!     │ quit           │ quit / time up    │ quit
//!     ▼                ▼                   │
//!  Stopped ◀───────────┴───────────────────┘
//! ```
//!
//! One tick is one strictly ordered pass: commands, landmark sample,
//! interpreter, car, spawner, collision, score, tone, render.

use std::time::{Duration, Instant};

use racer_tone::{EngineTone, ToneMap};

use crate::car::{CarController, CarState, Maneuver};
use crate::collision;
use crate::config::GameConfig;
use crate::error::{CoreError, Result};
use crate::gesture::{ControlSignal, DropoutClock, GestureInterpreter};
use crate::io::{AudioSink, ControlCommand, Frontend, LandmarkSource, RenderFrame};
use crate::obstacle::{Obstacle, ObstacleSpawner};
use crate::score::{resolve_obstacles, ScoreTracker, Scoreboard};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopPhase {
    Idle,
    Running,
    Paused,
    Stopped,
}

// ════════════════════════════════════════════════════════════════════════════
// GameState
// ════════════════════════════════════════════════════════════════════════════

/// Everything that changes from frame to frame.  Owned by the loop.
#[derive(Clone, Debug)]
pub struct GameState {
    pub car:             CarState,
    pub obstacles:       Vec<Obstacle>,
    pub scoreboard:      Scoreboard,
    /// Last frame's signal; the interpreter smooths against it.
    pub signal:          ControlSignal,
    pub dropout:         DropoutClock,
    pub tone:            EngineTone,
    /// Session time in seconds, paused time excluded.
    pub elapsed:         f32,
    /// Seconds left on the collision highlight.
    pub flash_remaining: f32,
    pub muted:           bool,
    rng:                 fastrand::Rng,
}

impl GameState {
    fn new(config: &GameConfig) -> Self {
        GameState {
            car:             CarState::at_start(&config.car),
            obstacles:       Vec::new(),
            scoreboard:      Scoreboard::default(),
            signal:          ControlSignal::neutral(),
            dropout:         DropoutClock::new(),
            tone:            EngineTone::SILENT,
            elapsed:         0.0,
            flash_remaining: 0.0,
            muted:           false,
            rng:             fastrand::Rng::with_seed(config.seed),
        }
    }

    pub fn score(&self) -> i64 { self.scoreboard.score }
}

/// End-of-session totals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GameSummary {
    pub score:      i64,
    pub passed:     u32,
    pub collisions: u32,
    pub elapsed:    f32,
    pub distance:   f32,
}

impl std::fmt::Display for GameSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "score {}  passed {}  collisions {}  distance {:.0}  time {:.1}s",
            self.score, self.passed, self.collisions, self.distance, self.elapsed
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GameLoop
// ════════════════════════════════════════════════════════════════════════════

pub struct GameLoop<S, F, A> {
    config:      GameConfig,
    interpreter: GestureInterpreter,
    controller:  CarController,
    spawner:     ObstacleSpawner,
    tracker:     ScoreTracker,
    tone_map:    ToneMap,

    state:       GameState,
    phase:       LoopPhase,

    source:      S,
    frontend:    F,
    audio:       A,
}

impl<S, F, A> GameLoop<S, F, A>
where
    S: LandmarkSource,
    F: Frontend,
    A: AudioSink,
{
    /// Build an idle loop.  Fails if `config` does not validate.
    pub fn new(config: GameConfig, source: S, frontend: F, audio: A) -> Result<Self> {
        config.validate()?;
        let mut state = GameState::new(&config);
        let spawner   = ObstacleSpawner::new(config.spawner, &mut state.rng);
        Ok(GameLoop {
            interpreter: GestureInterpreter::new(config.interpreter),
            controller:  CarController::new(config.car),
            spawner,
            tracker:     ScoreTracker::new(config.score),
            tone_map:    config.tone,
            config,
            state,
            phase:       LoopPhase::Idle,
            source,
            frontend,
            audio,
        })
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn phase(&self)    -> LoopPhase   { self.phase }
    pub fn config(&self)   -> &GameConfig { &self.config }
    pub fn state(&self)    -> &GameState  { &self.state }
    pub fn source(&self)   -> &S          { &self.source }
    pub fn frontend(&self) -> &F          { &self.frontend }
    pub fn audio(&self)    -> &A          { &self.audio }

    /// Direct access for scripted setups (placing obstacles by hand).
    pub fn state_mut(&mut self) -> &mut GameState { &mut self.state }

    pub fn is_running(&self) -> bool { self.phase == LoopPhase::Running }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            score:      self.state.scoreboard.score,
            passed:     self.state.scoreboard.passed,
            collisions: self.state.scoreboard.collisions,
            elapsed:    self.state.elapsed,
            distance:   self.state.car.y,
        }
    }

    // ── transitions ───────────────────────────────────────────────────────

    /// Acquire the landmark source and enter `Running`.
    ///
    /// If the source cannot be opened the loop stays `Idle` and the error is
    /// returned.
    pub fn start(&mut self) -> Result<()> {
        match self.phase {
            LoopPhase::Running | LoopPhase::Paused => return Ok(()),
            LoopPhase::Stopped => return Err(CoreError::NotRunning),
            LoopPhase::Idle => {}
        }
        if let Err(e) = self.source.open() {
            log::error!("cannot start: {}", e);
            return Err(e);
        }
        self.phase = LoopPhase::Running;
        log::info!("session started (seed {:#x})", self.config.seed);
        Ok(())
    }

    /// Apply one control command.  Takes effect immediately; a quit
    /// issued mid-frame is honoured before the next simulation step.
    pub fn command(&mut self, cmd: ControlCommand) {
        match cmd {
            ControlCommand::Quit        => self.stop(),
            ControlCommand::Pause       => self.pause(),
            ControlCommand::Resume      => self.resume(),
            ControlCommand::TogglePause => match self.phase {
                LoopPhase::Running => self.pause(),
                LoopPhase::Paused  => self.resume(),
                _ => {}
            },
            ControlCommand::ToggleMute  => {
                self.state.muted = !self.state.muted;
                self.audio.set_muted(self.state.muted);
                log::info!("audio {}", if self.state.muted { "muted" } else { "unmuted" });
            }
        }
    }

    fn pause(&mut self) {
        if self.phase == LoopPhase::Running {
            self.phase = LoopPhase::Paused;
            self.audio.silence();
            log::info!("paused at {:.1}s", self.state.elapsed);
        }
    }

    fn resume(&mut self) {
        if self.phase == LoopPhase::Paused {
            self.phase = LoopPhase::Running;
            log::info!("resumed");
        }
    }

    /// Enter `Stopped`, releasing the source and silencing the engine.
    pub fn stop(&mut self) {
        match self.phase {
            LoopPhase::Stopped => return,
            LoopPhase::Idle    => {}
            LoopPhase::Running | LoopPhase::Paused => {
                self.source.close();
                self.audio.silence();
            }
        }
        self.phase = LoopPhase::Stopped;
        log::info!("session stopped: {}", self.summary());
    }

    // ── per-frame ─────────────────────────────────────────────────────────

    /// One frame without waiting on the source.
    pub fn tick(&mut self, dt: f32) -> Result<()> {
        self.tick_until(dt, Instant::now())
    }

    /// One frame; the landmark wait is bounded by `deadline`.
    pub fn tick_until(&mut self, dt: f32, deadline: Instant) -> Result<()> {
        if !matches!(self.phase, LoopPhase::Running | LoopPhase::Paused) {
            return Err(CoreError::NotRunning);
        }

        for cmd in self.frontend.poll_commands() {
            self.command(cmd);
            if self.phase == LoopPhase::Stopped {
                return Ok(());
            }
        }

        if self.phase == LoopPhase::Paused {
            let frame = self.frame();
            self.frontend.present(&frame);
            return Ok(());
        }

        let dt = if dt.is_finite() && dt > 0.0 { dt.min(self.config.max_step) } else { 0.0 };
        self.step(dt, deadline);

        let frame = self.frame();
        self.frontend.present(&frame);

        if let Some(limit) = self.config.time_limit {
            if self.state.elapsed >= limit {
                log::info!("time limit of {:.0}s reached", limit);
                self.stop();
            }
        }
        Ok(())
    }

    fn step(&mut self, dt: f32, deadline: Instant) {
        let st = &mut self.state;

        // 1. sensor
        let sample = self.source.next_sample(deadline);

        // 2. gesture → signal
        let was_failsafe = self.interpreter.fail_safe_active(&st.dropout);
        st.signal = self.interpreter.interpret(sample.hand(), &st.signal, &mut st.dropout, dt);
        if !was_failsafe && self.interpreter.fail_safe_active(&st.dropout) {
            log::warn!("no hand for {:.1}s, slowing the car", st.dropout.elapsed());
        }

        // 3. car
        let before = st.car.maneuver;
        st.car = self.controller.advance(&st.car, &st.signal, dt);
        if std::mem::discriminant(&before) != std::mem::discriminant(&st.car.maneuver) {
            log::debug!("car manoeuvre {:?} -> {:?}", before, st.car.maneuver);
        }

        // 4. obstacles
        self.spawner.tick(&mut st.obstacles, &self.config.car.road, st.car.y, &mut st.rng, dt);

        // 5. collisions + 6. score
        let hits     = collision::check(&st.car.bbox, &st.obstacles);
        let resolved = resolve_obstacles(&mut st.obstacles, &hits, &st.car.bbox);
        st.scoreboard.record(&self.tracker, &resolved);

        st.flash_remaining = (st.flash_remaining - dt).max(0.0);
        if !resolved.collided.is_empty() {
            st.flash_remaining = self.config.flash_secs;
            self.audio.crash();
        }

        // 7. engine tone (a boost always sounds flat out)
        let speed = match st.car.maneuver {
            Maneuver::Boosting { .. } => 1.0,
            _ => st.signal.speed(),
        };
        st.tone = self.tone_map.tone_for(speed);
        self.audio.emit(st.tone);

        st.elapsed += dt;
    }

    /// Snapshot for the render sink.
    pub fn frame(&self) -> RenderFrame {
        let st = &self.state;
        RenderFrame {
            road:            self.config.car.road,
            car:             st.car,
            obstacles:       st.obstacles.clone(),
            scoreboard:      st.scoreboard,
            signal:          st.signal,
            tone:            st.tone,
            collision_flash: st.flash_remaining > 0.0,
            paused:          self.phase == LoopPhase::Paused,
            muted:           st.muted,
            fail_safe:       self.interpreter.fail_safe_active(&st.dropout),
            elapsed:         st.elapsed,
            time_remaining:  self.config.time_limit.map(|t| (t - st.elapsed).max(0.0)),
        }
    }

    /// Start, then tick at `frame_interval` until stopped.
    ///
    /// Slow frames are clamped to the configured maximum step.
    pub fn run(&mut self, frame_interval: Duration) -> Result<GameSummary> {
        self.start()?;
        let mut last = Instant::now();
        while self.phase != LoopPhase::Stopped {
            let frame_start = Instant::now();
            let dt = frame_start.duration_since(last).as_secs_f32();
            last = frame_start;

            self.tick_until(dt, frame_start + frame_interval)?;

            let spent = frame_start.elapsed();
            if spent < frame_interval {
                std::thread::sleep(frame_interval - spent);
            }
        }
        Ok(self.summary())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::geometry::Aabb;
    use crate::io::{LandmarkSample, ScriptedSource};
    use crate::landmark::{HandLandmarks, HandPose};
    use crate::obstacle::ObstacleStatus;
    use crate::config::GameMode;

    // ── recording sinks ───────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingFrontend {
        frames:   Vec<RenderFrame>,
        /// Commands returned by successive polls.
        script:   VecDeque<Vec<ControlCommand>>,
    }

    impl RecordingFrontend {
        fn with_script(script: Vec<Vec<ControlCommand>>) -> Self {
            RecordingFrontend { frames: Vec::new(), script: script.into() }
        }
    }

    impl Frontend for RecordingFrontend {
        fn present(&mut self, frame: &RenderFrame) { self.frames.push(frame.clone()); }
        fn poll_commands(&mut self) -> Vec<ControlCommand> {
            self.script.pop_front().unwrap_or_default()
        }
    }

    #[derive(Default)]
    struct RecordingAudio {
        tones:    Vec<EngineTone>,
        crashes:  usize,
        silences: usize,
        muted:    bool,
    }

    impl AudioSink for RecordingAudio {
        fn emit(&mut self, tone: EngineTone) { self.tones.push(tone); }
        fn crash(&mut self)                  { self.crashes += 1; }
        fn silence(&mut self)                { self.silences += 1; }
        fn set_muted(&mut self, muted: bool) { self.muted = muted; }
    }

    type TestLoop = GameLoop<ScriptedSource, RecordingFrontend, RecordingAudio>;

    fn quiet_config() -> GameConfig {
        GameConfig::for_mode(GameMode::Practice)
    }

    fn make(config: GameConfig, source: ScriptedSource) -> TestLoop {
        GameLoop::new(config, source, RecordingFrontend::default(), RecordingAudio::default()).unwrap()
    }

    fn stopped_hand() -> HandLandmarks { HandLandmarks::synthetic(0.5, 0.9, 0.0) }
    fn flat_out_hand() -> HandLandmarks { HandLandmarks::synthetic(0.5, 0.1, 0.0) }

    // ── scenarios ─────────────────────────────────────────────────────────

    #[test]
    fn obstacle_in_path_is_penalized_once() {
        let mut game = make(quiet_config(), ScriptedSource::repeat(stopped_hand(), 60));
        game.start().unwrap();
        let car = game.state().car;
        game.state_mut().obstacles.push(Obstacle::new(99, Aabb::centered(car.x, car.y + 10.0, 20.0, 20.0)));

        for _ in 0..30 {
            game.tick(1.0 / 30.0).unwrap();
        }

        let penalty = game.config().score.collision_penalty;
        assert_eq!(game.state().score(), -penalty);
        assert_eq!(game.state().scoreboard.collisions, 1);
        assert_eq!(game.state().obstacles[0].status, ObstacleStatus::Collided);
        assert_eq!(game.audio().crashes, 1);

        let frames = &game.frontend().frames;
        assert!(frames[0].collision_flash);
        assert!(!frames.last().unwrap().collision_flash);
    }

    #[test]
    fn unavailable_source_never_runs() {
        let mut game = make(quiet_config(), ScriptedSource::unavailable("no camera"));
        assert!(matches!(game.start(), Err(CoreError::SensorUnavailable(_))));
        assert_eq!(game.phase(), LoopPhase::Idle);
        assert_eq!(game.tick(0.1), Err(CoreError::NotRunning));
        assert!(game.run(Duration::ZERO).is_err());
        assert!(game.frontend().frames.is_empty());
    }

    #[test]
    fn quit_stops_and_closes_source() {
        let frontend = RecordingFrontend::with_script(vec![
            vec![], vec![], vec![ControlCommand::Quit],
        ]);
        let mut game = GameLoop::new(
            quiet_config(),
            ScriptedSource::repeat(flat_out_hand(), 100),
            frontend,
            RecordingAudio::default(),
        ).unwrap();

        let summary = game.run(Duration::ZERO).unwrap();
        assert_eq!(game.phase(), LoopPhase::Stopped);
        assert_eq!(game.source().close_calls(), 1);
        assert!(!game.source().is_open());
        assert!(game.audio().silences >= 1);
        assert_eq!(game.frontend().frames.len(), 2);
        assert_eq!(summary.collisions, 0);
        assert_eq!(game.tick(0.1), Err(CoreError::NotRunning));
    }

    #[test]
    fn losing_the_hand_does_not_stop_the_loop() {
        let mut samples = vec![LandmarkSample::Hand(flat_out_hand()); 30];
        samples.extend(std::iter::repeat(LandmarkSample::NoHand).take(300));
        let mut game = make(quiet_config(), ScriptedSource::new(samples));
        game.start().unwrap();
        for _ in 0..330 {
            game.tick(1.0 / 30.0).unwrap();
        }
        assert!(game.is_running());
        assert_eq!(game.state().signal.speed(), 0.0);
        assert!(game.frontend().frames.last().unwrap().fail_safe);
    }

    #[test]
    fn pause_freezes_simulation() {
        let frontend = RecordingFrontend::with_script(vec![
            vec![], vec![ControlCommand::TogglePause], vec![], vec![], vec![ControlCommand::Resume],
        ]);
        let mut game = GameLoop::new(
            quiet_config(),
            ScriptedSource::repeat(flat_out_hand(), 100),
            frontend,
            RecordingAudio::default(),
        ).unwrap();
        game.start().unwrap();

        game.tick(0.1).unwrap();
        let y_before = game.state().car.y;
        let t_before = game.state().elapsed;

        for _ in 0..3 { game.tick(0.1).unwrap(); }
        assert_eq!(game.phase(), LoopPhase::Paused);
        assert_eq!(game.state().car.y, y_before);
        assert_eq!(game.state().elapsed, t_before);
        assert!(game.frontend().frames.last().unwrap().paused);
        assert_eq!(game.audio().silences, 1);

        game.tick(0.1).unwrap();
        assert!(game.is_running());
        assert!(game.state().car.y > y_before);
    }

    #[test]
    fn time_limit_stops_the_session() {
        let config = GameConfig { time_limit: Some(1.0), ..quiet_config() };
        let mut game = make(config, ScriptedSource::repeat(flat_out_hand(), 100));
        game.start().unwrap();
        let mut ticks = 0;
        while game.tick(0.1).is_ok() && game.phase() != LoopPhase::Stopped {
            ticks += 1;
            assert!(ticks < 20, "time limit never reached");
        }
        assert_eq!(game.phase(), LoopPhase::Stopped);
        assert!(game.state().elapsed >= 1.0);
        assert_eq!(game.frontend().frames.last().unwrap().time_remaining, Some(0.0));
    }

    #[test]
    fn slow_frames_are_clamped() {
        let mut game = make(quiet_config(), ScriptedSource::repeat(flat_out_hand(), 10));
        game.start().unwrap();
        game.tick(5.0).unwrap();
        assert!((game.state().elapsed - game.config().max_step).abs() < 1e-6);
    }

    #[test]
    fn mute_toggles_reach_the_sink() {
        let frontend = RecordingFrontend::with_script(vec![vec![ControlCommand::ToggleMute]]);
        let mut game = GameLoop::new(
            quiet_config(),
            ScriptedSource::repeat(flat_out_hand(), 10),
            frontend,
            RecordingAudio::default(),
        ).unwrap();
        game.start().unwrap();
        game.tick(0.1).unwrap();
        assert!(game.audio().muted);
        assert!(game.frontend().frames[0].muted);
    }

    #[test]
    fn engine_tone_follows_speed() {
        let mut game = make(quiet_config(), ScriptedSource::repeat(flat_out_hand(), 60));
        game.start().unwrap();
        for _ in 0..60 { game.tick(1.0 / 30.0).unwrap(); }
        let tones = &game.audio().tones;
        assert_eq!(tones.len(), 60);
        assert!(tones.windows(2).all(|w| w[1].frequency >= w[0].frequency));
        assert!((tones[59].frequency - 440.0).abs() < 1.0);
    }

    #[test]
    fn v_sign_boosts_then_fist_brakes_to_a_stop() {
        let boost = HandLandmarks::synthetic_pose(0.5, 0.9, 0.0, HandPose::Boost);
        let fist  = HandLandmarks::synthetic_pose(0.5, 0.9, 0.0, HandPose::Fist);
        let mut samples = vec![LandmarkSample::Hand(boost); 4];
        samples.extend(std::iter::repeat(LandmarkSample::Hand(fist)).take(20));
        let mut game = make(quiet_config(), ScriptedSource::new(samples));
        game.start().unwrap();

        let max = game.config().car.max_speed;
        for _ in 0..4 { game.tick(0.1).unwrap(); }
        assert_eq!(game.state().car.velocity, max);
        assert!((game.audio().tones[0].frequency - 440.0).abs() < 1e-3);

        // Just over the 1.5 s brake time.
        for _ in 0..16 { game.tick(0.1).unwrap(); }
        assert_eq!(game.state().car.velocity, 0.0);
        assert!(game.frontend().frames.last().unwrap().signal.braking());
    }

    #[test]
    fn each_obstacle_scores_once_over_a_long_drive() {
        let config = GameConfig::for_mode(GameMode::Hard).with_seed(1234);
        let mut game = make(config, ScriptedSource::repeat(flat_out_hand(), 2_000));
        game.start().unwrap();
        for _ in 0..2_000 { game.tick(1.0 / 30.0).unwrap(); }

        let sb = game.state().scoreboard;
        let cfg = game.config().score;
        assert!(sb.passed + sb.collisions > 0);
        assert_eq!(
            sb.score,
            sb.passed as i64 * cfg.pass_reward - sb.collisions as i64 * cfg.collision_penalty
        );
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut config = quiet_config();
        config.interpreter.smoothing = 2.0;
        let made = GameLoop::new(config, ScriptedSource::default(), RecordingFrontend::default(), RecordingAudio::default());
        assert!(matches!(made, Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn quit_before_start_stops_without_opening() {
        let mut game = make(quiet_config(), ScriptedSource::default());
        game.command(ControlCommand::Quit);
        assert_eq!(game.phase(), LoopPhase::Stopped);
        assert_eq!(game.source().close_calls(), 0);
        assert_eq!(game.start(), Err(CoreError::NotRunning));
    }
}
