//! Startup configuration and game modes.
//!
//! Every tunable is fixed when the session starts; nothing here is
//! adjustable from the control surface at runtime.

use racer_tone::ToneMap;

use crate::car::CarConfig;
use crate::error::{CoreError, Result};
use crate::gesture::InterpreterConfig;
use crate::obstacle::SpawnerConfig;
use crate::score::ScoreConfig;

/// Frame rate the per-frame obstacle probabilities below were tuned at.
const REFERENCE_FPS: f32 = 30.0;

const BASE_PASS_REWARD:       f64 = 10.0;
const BASE_COLLISION_PENALTY: f64 = 20.0;

// ════════════════════════════════════════════════════════════════════════════
// GameMode
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GameMode {
    /// No obstacles, no clock.  For learning the gestures.
    Practice,
    Easy,
    #[default]
    Normal,
    Hard,
    /// Two minutes on the clock.
    TimeTrial,
}

/// The knobs a mode turns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModeSettings {
    /// Chance of an obstacle appearing per reference frame.  0 disables.
    pub obstacle_frequency:  f32,
    /// Scales how fast the road moves under the car.
    pub speed_multiplier:    f32,
    pub score_multiplier:    f32,
    pub time_limit:          Option<f32>,
}

impl GameMode {
    pub fn all() -> &'static [GameMode] {
        &[GameMode::Practice, GameMode::Easy, GameMode::Normal, GameMode::Hard, GameMode::TimeTrial]
    }

    pub fn name(self) -> &'static str {
        match self {
            GameMode::Practice  => "Practice",
            GameMode::Easy      => "Easy",
            GameMode::Normal    => "Normal",
            GameMode::Hard      => "Hard",
            GameMode::TimeTrial => "Time Trial",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GameMode::Practice  => "no obstacles, get a feel for the controls",
            GameMode::Easy      => "fewer, slower obstacles",
            GameMode::Normal    => "standard traffic",
            GameMode::Hard      => "dense, fast obstacles",
            GameMode::TimeTrial => "score as much as you can in two minutes",
        }
    }

    pub fn settings(self) -> ModeSettings {
        let (obstacle_frequency, speed_multiplier, score_multiplier, time_limit) = match self {
            GameMode::Practice  => (0.0,   1.0, 0.5, None),
            GameMode::Easy      => (0.01,  0.8, 1.0, None),
            GameMode::Normal    => (0.02,  1.0, 1.5, None),
            GameMode::Hard      => (0.03,  1.3, 2.0, None),
            GameMode::TimeTrial => (0.015, 1.1, 2.5, Some(120.0)),
        };
        ModeSettings { obstacle_frequency, speed_multiplier, score_multiplier, time_limit }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GameConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GameConfig {
    pub interpreter: InterpreterConfig,
    pub car:         CarConfig,
    pub spawner:     SpawnerConfig,
    pub score:       ScoreConfig,
    pub tone:        ToneMap,
    /// Session length in seconds; `None` runs until quit.
    pub time_limit:  Option<f32>,
    /// Seed for the spawner's random source.
    pub seed:        u64,
    /// Longest simulation step accepted from a slow frame, seconds.
    pub max_step:    f32,
    /// How long a collision stays highlighted, seconds.
    pub flash_secs:  f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            interpreter: InterpreterConfig::default(),
            car:         CarConfig::default(),
            spawner:     SpawnerConfig::default(),
            score:       ScoreConfig::default(),
            tone:        ToneMap::default(),
            time_limit:  None,
            seed:        0x5EED,
            max_step:    0.1,
            flash_secs:  0.3,
        }
    }
}

impl GameConfig {
    /// Defaults adjusted for `mode`.
    pub fn for_mode(mode: GameMode) -> Self {
        let s = mode.settings();
        let mut cfg = GameConfig::default();

        cfg.car.max_speed    *= s.speed_multiplier;
        cfg.car.acceleration *= s.speed_multiplier;
        cfg.car.deceleration *= s.speed_multiplier;

        if s.obstacle_frequency > 0.0 {
            let mean = 1.0 / (s.obstacle_frequency * REFERENCE_FPS);
            cfg.spawner.interval_min = mean * 0.6;
            cfg.spawner.interval_max = mean * 1.4;
        } else {
            cfg.spawner.enabled = false;
        }

        let m = s.score_multiplier as f64;
        cfg.score.pass_reward       = (BASE_PASS_REWARD * m).round() as i64;
        cfg.score.collision_penalty = (BASE_COLLISION_PENALTY * m).round() as i64;
        cfg.time_limit = s.time_limit;
        cfg
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject tunables that would make the simulation misbehave.
    pub fn validate(&self) -> Result<()> {
        let bad = |why: &str| Err(CoreError::InvalidConfig(why.to_string()));
        let (i, c, s, t) = (&self.interpreter, &self.car, &self.spawner, &self.tone);

        let numbers = [
            i.calibration.top_y, i.calibration.bottom_y, i.steering_gain, i.dead_zone,
            i.smoothing, i.dropout_threshold, i.speed_decay_per_sec, i.steering_decay_per_sec,
            i.poses.curled_reach, i.poses.extended_reach, i.poses.palm_spread, i.poses.v_spread,
            c.max_speed, c.acceleration, c.deceleration, c.max_lateral_speed, c.width, c.length,
            c.road.left, c.road.right, c.brake_secs, c.boost_secs,
            s.interval_min, s.interval_max, s.spawn_distance, s.size_min, s.size_max,
            s.spacing_margin, s.despawn_distance,
            t.base_freq, t.max_freq, t.min_amplitude, t.max_amplitude,
            self.time_limit.unwrap_or(0.0), self.max_step, self.flash_secs,
        ];
        if numbers.iter().any(|v| !v.is_finite()) {
            return bad("tunables must be finite numbers");
        }

        if !(0.0..1.0).contains(&i.smoothing) {
            return bad("smoothing must be in [0, 1)");
        }
        if i.calibration.bottom_y <= i.calibration.top_y {
            return bad("speed calibration bottom must lie below top");
        }
        if i.dead_zone < 0.0 || i.steering_gain <= 0.0 {
            return bad("steering gain must be positive and dead zone non-negative");
        }
        if i.dropout_threshold < 0.0 || i.speed_decay_per_sec <= 0.0 || i.steering_decay_per_sec <= 0.0 {
            return bad("fail-safe threshold and decay rates must be positive");
        }
        let p = &i.poses;
        if p.curled_reach <= 0.0 || p.extended_reach <= p.curled_reach
            || p.palm_spread < 0.0 || p.v_spread < 0.0
        {
            return bad("curled reach must be positive and below extended reach");
        }

        if c.max_speed <= 0.0 || c.acceleration <= 0.0 || c.max_lateral_speed <= 0.0 {
            return bad("car speeds and acceleration must be positive");
        }
        if c.deceleration < c.acceleration {
            return bad("car deceleration must be at least its acceleration");
        }
        if c.width <= 0.0 || c.length <= 0.0 || c.width > c.road.width() {
            return bad("car must have positive size and fit on the road");
        }
        if c.brake_secs <= 0.0 || c.boost_secs <= 0.0 {
            return bad("brake and boost durations must be positive");
        }

        if s.enabled {
            if s.interval_min < 0.0 || s.interval_max < s.interval_min {
                return bad("spawn interval bounds are inverted");
            }
            if s.size_min <= 0.0 || s.size_max < s.size_min || s.size_max > c.road.width() {
                return bad("obstacle size range is invalid");
            }
            if s.spacing_margin < 0.0 || s.max_retries == 0 || s.max_live == 0 {
                return bad("spawner margin, retries and capacity must be usable");
            }
        }

        if self.score.pass_reward < 0 || self.score.collision_penalty < 0 {
            return bad("score reward and penalty must be non-negative");
        }
        if !self.tone.is_consistent() {
            return bad("tone map is inconsistent");
        }
        if matches!(self.time_limit, Some(t) if t <= 0.0) {
            return bad("time limit must be positive");
        }
        if self.max_step <= 0.0 || self.flash_secs < 0.0 {
            return bad("step and flash durations must be positive");
        }
        // One full-speed step must not carry the car clean over the smallest
        // obstacle.
        if self.max_step * c.max_speed >= c.length + s.size_min {
            return bad("max step is too long for the car's top speed");
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
        for mode in GameMode::all() {
            assert_eq!(GameConfig::for_mode(*mode).validate(), Ok(()), "{:?}", mode);
        }
    }

    #[test]
    fn practice_has_no_obstacles_and_no_clock() {
        let cfg = GameConfig::for_mode(GameMode::Practice);
        assert!(!cfg.spawner.enabled);
        assert_eq!(cfg.time_limit, None);
        assert_eq!(cfg.score.pass_reward, 5);
    }

    #[test]
    fn time_trial_has_two_minutes() {
        let cfg = GameConfig::for_mode(GameMode::TimeTrial);
        assert_eq!(cfg.time_limit, Some(120.0));
        assert_eq!(cfg.score.pass_reward, 25);
        assert_eq!(cfg.score.collision_penalty, 50);
    }

    #[test]
    fn harder_modes_spawn_more_often() {
        let easy = GameConfig::for_mode(GameMode::Easy).spawner;
        let hard = GameConfig::for_mode(GameMode::Hard).spawner;
        assert!(hard.interval_max < easy.interval_max);
        assert!(GameConfig::for_mode(GameMode::Hard).car.max_speed
              > GameConfig::for_mode(GameMode::Easy).car.max_speed);
    }

    #[test]
    fn invalid_tunables_are_rejected() {
        let mut cfg = GameConfig::default();
        cfg.interpreter.smoothing = 1.0;
        assert!(matches!(cfg.validate(), Err(CoreError::InvalidConfig(_))));

        let mut cfg = GameConfig::default();
        cfg.car.deceleration = cfg.car.acceleration * 0.5;
        assert!(cfg.validate().is_err());

        let mut cfg = GameConfig::default();
        cfg.spawner.interval_max = cfg.spawner.interval_min - 0.1;
        assert!(cfg.validate().is_err());

        let cfg = GameConfig { time_limit: Some(0.0), ..GameConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_finite_tunables_are_rejected() {
        let mut cfg = GameConfig::default();
        cfg.interpreter.calibration.bottom_y = f32::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = GameConfig::default();
        cfg.car.max_speed = f32::INFINITY;
        assert!(cfg.validate().is_err());

        let mut cfg = GameConfig::default();
        cfg.interpreter.steering_gain = f32::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = GameConfig::default();
        cfg.spawner.size_max = f32::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = GameConfig::default();
        cfg.tone.max_freq = f32::NAN;
        assert!(cfg.validate().is_err());

        let cfg = GameConfig { time_limit: Some(f32::INFINITY), ..GameConfig::default() };
        assert!(cfg.validate().is_err());

        let cfg = GameConfig { max_step: f32::NAN, ..GameConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn long_steps_at_top_speed_are_rejected() {
        let mut cfg = GameConfig::default();
        let gap = cfg.car.length + cfg.spawner.size_min;
        cfg.max_step = 1.01 * gap / cfg.car.max_speed;
        assert!(cfg.validate().is_err());
        cfg.max_step = 0.9 * gap / cfg.car.max_speed;
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn maneuver_timings_must_be_positive() {
        let mut cfg = GameConfig::default();
        cfg.car.brake_secs = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = GameConfig::default();
        cfg.interpreter.poses.extended_reach = cfg.interpreter.poses.curled_reach;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn seed_is_overridable() {
        assert_eq!(GameConfig::for_mode(GameMode::Easy).with_seed(9).seed, 9);
    }
}
