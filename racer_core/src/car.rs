//! Car kinematics: integrates the control signal into the car state.
//!
//! Besides the regular approach to the target speed the car runs two timed
//! manoeuvres.  A brake ramps velocity linearly from its value at the start
//! of the brake to zero over [`CarConfig::brake_secs`].  A boost pins
//! velocity at `max_speed` for [`CarConfig::boost_secs`], after which the
//! gesture has to be released before it boosts again.

use crate::geometry::{Aabb, RoadBounds};
use crate::gesture::ControlSignal;

// ════════════════════════════════════════════════════════════════════════════
// CarConfig
// ════════════════════════════════════════════════════════════════════════════

/// Handling limits and body size.  Distances are world units, times are
/// seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarConfig {
    /// Forward velocity at `speed == 1.0`.
    pub max_speed:         f32,
    /// Rate at which velocity may rise toward the target (units/s²).
    pub acceleration:      f32,
    /// Rate at which velocity may fall toward the target (units/s²).
    pub deceleration:      f32,
    /// Lateral velocity at full steering lock.
    pub max_lateral_speed: f32,
    pub width:             f32,
    pub length:            f32,
    pub road:              RoadBounds,
    /// Time a held brake takes to bring the car to a stop.
    pub brake_secs:        f32,
    /// Time a boost holds the car at `max_speed`.
    pub boost_secs:        f32,
}

impl Default for CarConfig {
    fn default() -> Self {
        CarConfig {
            max_speed:         300.0,
            acceleration:      180.0,
            deceleration:      360.0,
            max_lateral_speed: 220.0,
            width:             30.0,
            length:            50.0,
            road:              RoadBounds::new(-100.0, 100.0),
            brake_secs:        1.5,
            boost_secs:        1.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CarState
// ════════════════════════════════════════════════════════════════════════════

/// Timed manoeuvre in progress.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Maneuver {
    #[default]
    Cruise,
    /// `elapsed` seconds into a brake that started at velocity `from`.
    Braking { elapsed: f32, from: f32 },
    Boosting { elapsed: f32 },
    /// Boost used up while the gesture is still held.
    BoostSpent,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarState {
    /// Lateral position (box centre).
    pub x:        f32,
    /// Forward progress (box centre).
    pub y:        f32,
    /// Current forward velocity, world units per second.
    pub velocity: f32,
    /// Steering applied on the last step, `[-1, 1]`.
    pub heading:  f32,
    pub bbox:     Aabb,
    pub maneuver: Maneuver,
}

impl CarState {
    /// A stationary car in the middle of the road at `y = 0`.
    pub fn at_start(config: &CarConfig) -> Self {
        let x = config.road.center();
        CarState {
            x,
            y:        0.0,
            velocity: 0.0,
            heading:  0.0,
            bbox:     Aabb::centered(x, 0.0, config.width, config.length),
            maneuver: Maneuver::Cruise,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CarController
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct CarController {
    config: CarConfig,
}

impl CarController {
    pub fn new(config: CarConfig) -> Self {
        CarController { config }
    }

    pub fn config(&self) -> &CarConfig { &self.config }

    /// One integration step.  Pure: the input state is left untouched.
    pub fn advance(&self, state: &CarState, signal: &ControlSignal, dt: f32) -> CarState {
        let cfg = &self.config;
        let dt  = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        // ── longitudinal ─────────────────────────────────────────────────
        let maneuver = self.next_maneuver(state, signal, dt);
        let velocity = match maneuver {
            Maneuver::Braking { elapsed, from } => {
                let left = if cfg.brake_secs > 0.0 { 1.0 - elapsed / cfg.brake_secs } else { 0.0 };
                from * left.max(0.0)
            }
            Maneuver::Boosting { .. } => cfg.max_speed,
            Maneuver::Cruise | Maneuver::BoostSpent => {
                let target = signal.speed() * cfg.max_speed;
                if target > state.velocity {
                    (state.velocity + cfg.acceleration * dt).min(target)
                } else {
                    (state.velocity - cfg.deceleration * dt).max(target)
                }
            }
        };
        let velocity = velocity.clamp(0.0, cfg.max_speed.max(0.0));

        // ── lateral ──────────────────────────────────────────────────────
        let heading = signal.steering();
        let x = cfg.road.clamp_center(state.x + heading * cfg.max_lateral_speed * dt, cfg.width);

        let y = state.y + velocity * dt;

        CarState {
            x,
            y,
            velocity,
            heading,
            bbox: Aabb::centered(x, y, cfg.width, cfg.length),
            maneuver,
        }
    }

    /// Brake wins over boost.  Releasing the gesture ends either one.
    fn next_maneuver(&self, state: &CarState, signal: &ControlSignal, dt: f32) -> Maneuver {
        if signal.braking() {
            return match state.maneuver {
                Maneuver::Braking { elapsed, from } => Maneuver::Braking { elapsed: elapsed + dt, from },
                _ => Maneuver::Braking { elapsed: dt, from: state.velocity },
            };
        }
        if !signal.boosting() {
            return Maneuver::Cruise;
        }
        let elapsed = match state.maneuver {
            Maneuver::Boosting { elapsed } => elapsed + dt,
            Maneuver::BoostSpent => return Maneuver::BoostSpent,
            _ => dt,
        };
        if elapsed <= self.config.boost_secs {
            Maneuver::Boosting { elapsed }
        } else {
            log::debug!("boost spent after {:.2}s", elapsed - dt);
            Maneuver::BoostSpent
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::HandPose;

    fn controller() -> CarController { CarController::new(CarConfig::default()) }

    #[test]
    fn accelerates_toward_target_with_bounded_rate() {
        let cc = controller();
        let mut car = CarState::at_start(cc.config());
        let full = ControlSignal::new(1.0, 0.0, true);
        car = cc.advance(&car, &full, 0.1);
        assert!((car.velocity - 18.0).abs() < 1e-3);
        for _ in 0..100 { car = cc.advance(&car, &full, 0.1); }
        assert_eq!(car.velocity, cc.config().max_speed);
    }

    #[test]
    fn braking_is_faster_than_acceleration() {
        let cc = controller();
        let mut car = CarState::at_start(cc.config());
        car.velocity = 200.0;
        let stop = ControlSignal::new(0.0, 0.0, true);
        let slowed = cc.advance(&car, &stop, 0.1);
        assert!((200.0 - slowed.velocity - 36.0).abs() < 1e-3);
        assert!(cc.config().deceleration > cc.config().acceleration);
    }

    #[test]
    fn forward_progress_follows_velocity() {
        let cc = controller();
        let mut car = CarState::at_start(cc.config());
        car.velocity = 100.0;
        let hold = ControlSignal::new(100.0 / 300.0, 0.0, true);
        let next = cc.advance(&car, &hold, 0.5);
        assert!((next.y - 50.0).abs() < 1e-3);
        assert_eq!(next.bbox.center().1, next.y);
    }

    #[test]
    fn full_right_moves_until_clamped() {
        let cc = controller();
        let mut car = CarState::at_start(cc.config());
        let right = ControlSignal::new(0.0, 1.0, true);
        let limit = cc.config().road.right - cc.config().width / 2.0;
        let mut clamped_frames = 0;
        for _ in 0..120 {
            let next = cc.advance(&car, &right, 1.0 / 60.0);
            if car.x < limit {
                assert!(next.x > car.x, "x did not increase: {} -> {}", car.x, next.x);
            } else {
                assert_eq!(next.x, car.x);
                clamped_frames += 1;
            }
            assert!(next.x <= limit);
            car = next;
        }
        assert_eq!(car.x, limit);
        assert!(clamped_frames > 0);
        assert!(car.bbox.max_x <= cc.config().road.right + 1e-4);
    }

    #[test]
    fn full_left_clamps_at_left_edge() {
        let cc = controller();
        let mut car = CarState::at_start(cc.config());
        let left = ControlSignal::new(0.0, -1.0, true);
        for _ in 0..200 { car = cc.advance(&car, &left, 1.0 / 60.0); }
        assert_eq!(car.x, cc.config().road.left + cc.config().width / 2.0);
        assert_eq!(car.heading, -1.0);
    }

    fn with(pose: HandPose, speed: f32) -> ControlSignal {
        ControlSignal::new(speed, 0.0, true).with_pose(pose)
    }

    #[test]
    fn held_brake_stops_linearly_over_brake_time() {
        let cc = controller();
        let mut car = CarState::at_start(cc.config());
        car.velocity = 300.0;
        let brake = with(HandPose::Fist, 0.0);
        let dt = 0.125;

        let mut last = car.velocity;
        for frame in 1..=12 {
            car = cc.advance(&car, &brake, dt);
            let expected = 300.0 * (1.0 - frame as f32 * dt / 1.5);
            assert!((car.velocity - expected).abs() < 1e-3, "frame {}: {}", frame, car.velocity);
            assert!(car.velocity < last);
            last = car.velocity;
        }
        assert_eq!(car.velocity, 0.0);
        // Holding the brake keeps the car stopped.
        car = cc.advance(&car, &brake, dt);
        assert_eq!(car.velocity, 0.0);
    }

    #[test]
    fn brake_ramp_is_from_speed_at_brake_start() {
        let cc = controller();
        let mut car = CarState::at_start(cc.config());
        car.velocity = 150.0;
        car = cc.advance(&car, &with(HandPose::OpenPalm, 0.0), 0.75);
        assert!((car.velocity - 75.0).abs() < 1e-3);
        assert!(matches!(car.maneuver, Maneuver::Braking { from, .. } if from == 150.0));
    }

    #[test]
    fn releasing_brake_returns_to_normal_control() {
        let cc = controller();
        let mut car = CarState::at_start(cc.config());
        car.velocity = 300.0;
        for _ in 0..4 { car = cc.advance(&car, &with(HandPose::Fist, 0.0), 0.125); }
        let slowed = car.velocity;
        car = cc.advance(&car, &ControlSignal::new(1.0, 0.0, true), 0.125);
        assert_eq!(car.maneuver, Maneuver::Cruise);
        assert!((car.velocity - (slowed + 180.0 * 0.125)).abs() < 1e-3);
    }

    #[test]
    fn boost_holds_max_speed_for_boost_time_then_lapses() {
        let cc = controller();
        let mut car = CarState::at_start(cc.config());
        // A low speed request shows when the boost stops pinning velocity.
        let boost = with(HandPose::Boost, 0.0);
        let dt = 0.125;
        for frame in 1..=8 {
            car = cc.advance(&car, &boost, dt);
            assert_eq!(car.velocity, 300.0, "frame {}", frame);
        }
        car = cc.advance(&car, &boost, dt);
        assert_eq!(car.maneuver, Maneuver::BoostSpent);
        assert!((car.velocity - (300.0 - 360.0 * dt)).abs() < 1e-3);

        // Still held: no second boost until released.
        car = cc.advance(&car, &boost, dt);
        assert_eq!(car.maneuver, Maneuver::BoostSpent);
        car = cc.advance(&car, &with(HandPose::Drive, 0.0), dt);
        assert_eq!(car.maneuver, Maneuver::Cruise);
        car = cc.advance(&car, &boost, dt);
        assert_eq!(car.velocity, 300.0);
    }

    #[test]
    fn brake_overrides_running_boost() {
        let cc = controller();
        let mut car = CarState::at_start(cc.config());
        car = cc.advance(&car, &with(HandPose::Boost, 1.0), 0.25);
        assert_eq!(car.velocity, 300.0);
        car = cc.advance(&car, &with(HandPose::Fist, 0.0), 0.75);
        assert!((car.velocity - 150.0).abs() < 1e-3);
    }

    #[test]
    fn zero_dt_is_a_no_op_on_position() {
        let cc = controller();
        let car = CarState::at_start(cc.config());
        let next = cc.advance(&car, &ControlSignal::new(1.0, 1.0, true), 0.0);
        assert_eq!(next.x, car.x);
        assert_eq!(next.y, car.y);
        assert_eq!(next.velocity, 0.0);
    }
}
