//! # racer_core
//!
//! Simulation core of a hand-gesture driving game.  A noisy, intermittent
//! stream of hand landmarks becomes a smooth control signal that drives a car
//! down a road full of procedurally spawned obstacles.
//!
//! ## Gesture → control mapping
//!
//! | Gesture | Effect |
//! |---|---|
//! | Thumb raised high in the frame | Faster (speed → 1.0) |
//! | Thumb lowered | Slower (speed → 0.0) |
//! | Index fingertip higher than pinky tip | Steer left |
//! | Pinky tip higher than index fingertip | Steer right |
//! | Fingertips level (within the dead zone) | Straight ahead |
//! | Fist, or open palm with fingers splayed | Brake to a stop over 1.5 s |
//! | Index and middle fingers in a V, others curled | Boost: full speed for 1 s |
//! | No hand | Hold the last signal; after 3 s ramp down to a stop |
//!
//! ## Frame pipeline
//!
//! ```text
//!  LandmarkSource ─▶ GestureInterpreter ─▶ CarController ─▶ ObstacleSpawner
//!        ─▶ collision::check ─▶ ScoreTracker ─▶ ToneMap ─▶ AudioSink / Frontend
//! ```
//!
//! [`game::GameLoop`] owns the single [`game::GameState`] and runs the
//! pipeline once per frame.  The outside world plugs in through the traits
//! in [`io`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use racer_core::{GameConfig, GameLoop, GameMode, HandLandmarks, NullAudio, ScriptedSource};
//! # struct Headless;
//! # impl racer_core::Frontend for Headless {
//! #     fn present(&mut self, _f: &racer_core::RenderFrame) {}
//! #     fn poll_commands(&mut self) -> Vec<racer_core::ControlCommand> { vec![] }
//! # }
//!
//! let hand   = HandLandmarks::synthetic(0.5, 0.2, 0.0);
//! let source = ScriptedSource::repeat(hand, 300);
//! let config = GameConfig::for_mode(GameMode::TimeTrial).with_seed(7);
//! let mut game = GameLoop::new(config, source, Headless, NullAudio).unwrap();
//! let summary  = game.run(Duration::from_millis(16)).unwrap();
//! println!("{}", summary);
//! ```

pub mod error;
pub mod geometry;
pub mod landmark;
pub mod gesture;
pub mod car;
pub mod obstacle;
pub mod collision;
pub mod score;
pub mod config;
pub mod io;
pub mod game;

pub use error::{CoreError, Result};
pub use geometry::{Aabb, RoadBounds};
pub use landmark::{HandLandmarks, HandPose, Landmark, Point3};
pub use gesture::{
    ControlSignal, DropoutClock, GestureInterpreter, InterpreterConfig, PoseThresholds, SpeedCalibration,
};
pub use car::{CarConfig, CarController, CarState, Maneuver};
pub use obstacle::{Obstacle, ObstacleId, ObstacleSpawner, ObstacleStatus, SpawnOutcome, SpawnerConfig};
pub use score::{resolve_obstacles, Resolutions, ScoreConfig, ScoreTracker, Scoreboard};
pub use config::{GameConfig, GameMode, ModeSettings};
pub use io::{
    AudioSink, ControlCommand, Frontend, LandmarkSample, LandmarkSource, NullAudio, RenderFrame,
    ScriptedSource,
};
pub use game::{GameLoop, GameState, GameSummary, LoopPhase};
