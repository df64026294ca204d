//! Obstacle resolution and scoring.
//!
//! An obstacle is worth something exactly once: the first frame it is seen
//! overlapping the car it becomes `Collided`, the first frame the car is
//! entirely past it it becomes `Passed`.  Only `Active` obstacles transition.

use crate::geometry::Aabb;
use crate::obstacle::{Obstacle, ObstacleId, ObstacleStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreConfig {
    pub pass_reward:       i64,
    pub collision_penalty: i64,
    /// Lowest score allowed.  `None` lets the score go negative.
    pub floor:             Option<i64>,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        ScoreConfig { pass_reward: 10, collision_penalty: 20, floor: None }
    }
}

/// Obstacles resolved on one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolutions {
    pub collided: Vec<ObstacleId>,
    pub passed:   Vec<ObstacleId>,
}

impl Resolutions {
    pub fn is_empty(&self) -> bool { self.collided.is_empty() && self.passed.is_empty() }
}

/// Apply this frame's transitions.
///
/// `collided` comes from the collision check; an obstacle whose `max_y` is
/// behind the car's `min_y` counts as passed.  Collision wins when both hold.
pub fn resolve_obstacles(obstacles: &mut [Obstacle], collided: &[ObstacleId], car: &Aabb) -> Resolutions {
    let mut out = Resolutions::default();
    for o in obstacles.iter_mut().filter(|o| o.is_active()) {
        if collided.contains(&o.id) {
            o.status = ObstacleStatus::Collided;
            log::debug!("collision with obstacle {}", o.id);
            out.collided.push(o.id);
        } else if o.bbox.max_y < car.min_y {
            o.status = ObstacleStatus::Passed;
            log::debug!("passed obstacle {}", o.id);
            out.passed.push(o.id);
        }
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// ScoreTracker
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct ScoreTracker {
    config: ScoreConfig,
}

impl ScoreTracker {
    pub fn new(config: ScoreConfig) -> Self {
        ScoreTracker { config }
    }

    pub fn config(&self) -> &ScoreConfig { &self.config }

    /// New score after this frame's resolutions.  Saturates instead of
    /// wrapping and honours the configured floor.
    pub fn update(&self, score: i64, resolved: &Resolutions) -> i64 {
        let gain    = self.config.pass_reward.saturating_mul(resolved.passed.len() as i64);
        let penalty = self.config.collision_penalty.saturating_mul(resolved.collided.len() as i64);
        let next    = score.saturating_add(gain).saturating_sub(penalty);
        match self.config.floor {
            Some(floor) => next.max(floor),
            None        => next,
        }
    }
}

/// Running totals for a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Scoreboard {
    pub score:      i64,
    pub passed:     u32,
    pub collisions: u32,
}

impl Scoreboard {
    pub fn record(&mut self, tracker: &ScoreTracker, resolved: &Resolutions) {
        self.score       = tracker.update(self.score, resolved);
        self.passed     += resolved.passed.len() as u32;
        self.collisions += resolved.collided.len() as u32;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
