//! Procedural obstacle generation.
//!
//! Obstacles live in world coordinates and never move; they are placed a
//! fixed distance ahead of the car and dropped once they fall far enough
//! behind it.

use crate::geometry::{Aabb, RoadBounds};

pub type ObstacleId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObstacleStatus {
    Active,
    Passed,
    Collided,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    pub id:     ObstacleId,
    pub bbox:   Aabb,
    pub status: ObstacleStatus,
}

impl Obstacle {
    pub fn new(id: ObstacleId, bbox: Aabb) -> Self {
        Obstacle { id, bbox, status: ObstacleStatus::Active }
    }

    pub fn is_active(&self) -> bool { self.status == ObstacleStatus::Active }
    pub fn is_passed(&self) -> bool { self.status == ObstacleStatus::Passed }
}

// ════════════════════════════════════════════════════════════════════════════
// SpawnerConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnerConfig {
    /// When false the spawner only culls.
    pub enabled:          bool,
    /// Bounds of the random countdown between spawn attempts, seconds.
    pub interval_min:     f32,
    pub interval_max:     f32,
    /// Forward distance from the car at which new obstacles appear.
    pub spawn_distance:   f32,
    /// Side length range of a (square) obstacle.
    pub size_min:         f32,
    pub size_max:         f32,
    /// Clearance required around every live obstacle.
    pub spacing_margin:   f32,
    /// Placement attempts per spawn cycle before giving up.
    pub max_retries:      u32,
    /// Resolved obstacles this far behind the car are removed.
    pub despawn_distance: f32,
    pub max_live:         usize,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        SpawnerConfig {
            enabled:          true,
            interval_min:     0.6,
            interval_max:     1.4,
            spawn_distance:   600.0,
            size_min:         15.0,
            size_max:         25.0,
            spacing_margin:   10.0,
            max_retries:      8,
            despawn_distance: 200.0,
            max_live:         10,
        }
    }
}

/// What happened on one spawner tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// Countdown still running, spawning disabled, or at capacity.
    Waiting,
    Spawned(ObstacleId),
    /// Every placement attempt conflicted with an existing obstacle.
    Skipped,
}

// ════════════════════════════════════════════════════════════════════════════
// ObstacleSpawner
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct ObstacleSpawner {
    config:    SpawnerConfig,
    countdown: f32,
    next_id:   ObstacleId,
}

impl ObstacleSpawner {
    /// The first countdown is drawn from `rng` so replays with the same seed
    /// line up from frame one.
    pub fn new(config: SpawnerConfig, rng: &mut fastrand::Rng) -> Self {
        let mut spawner = ObstacleSpawner { config, countdown: 0.0, next_id: 0 };
        spawner.countdown = spawner.draw_interval(rng);
        spawner
    }

    pub fn config(&self) -> &SpawnerConfig { &self.config }

    /// Advance the countdown, cull obstacles behind the car and spawn at most
    /// one new obstacle.
    pub fn tick(
        &mut self,
        obstacles: &mut Vec<Obstacle>,
        road:      &RoadBounds,
        car_y:     f32,
        rng:       &mut fastrand::Rng,
        dt:        f32,
    ) -> SpawnOutcome {
        self.cull(obstacles, car_y);

        if !self.config.enabled {
            return SpawnOutcome::Waiting;
        }

        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.countdown -= dt;
        if self.countdown > 0.0 {
            return SpawnOutcome::Waiting;
        }
        self.countdown = self.draw_interval(rng);

        if obstacles.len() >= self.config.max_live {
            return SpawnOutcome::Waiting;
        }

        let y = car_y + self.config.spawn_distance;
        for _ in 0..self.config.max_retries.max(1) {
            let candidate = self.candidate(road, y, rng);
            let clear = candidate.expanded(self.config.spacing_margin);
            if obstacles.iter().any(|o| o.bbox.overlaps(&clear)) {
                continue;
            }
            let id = self.next_id;
            self.next_id += 1;
            log::debug!("spawned obstacle {} at ({:.1}, {:.1})", id, candidate.center().0, y);
            obstacles.push(Obstacle::new(id, candidate));
            return SpawnOutcome::Spawned(id);
        }

        log::trace!("spawn skipped: no clear position after {} tries", self.config.max_retries);
        SpawnOutcome::Skipped
    }

    fn cull(&self, obstacles: &mut Vec<Obstacle>, car_y: f32) {
        let horizon = car_y - self.config.despawn_distance;
        let before  = obstacles.len();
        obstacles.retain(|o| o.is_active() || o.bbox.max_y >= horizon);
        let removed = before - obstacles.len();
        if removed > 0 {
            log::trace!("culled {} obstacle(s) behind y={:.1}", removed, horizon);
        }
    }

    fn candidate(&self, road: &RoadBounds, y: f32, rng: &mut fastrand::Rng) -> Aabb {
        let cfg  = &self.config;
        let lo   = cfg.size_min.min(cfg.size_max);
        let hi   = cfg.size_min.max(cfg.size_max);
        let size = lo + rng.f32() * (hi - lo);
        let x    = road.left + rng.f32() * road.width();
        let x    = road.clamp_center(x, size);
        Aabb::centered(x, y, size, size)
    }

    fn draw_interval(&self, rng: &mut fastrand::Rng) -> f32 {
        let lo = self.config.interval_min.min(self.config.interval_max);
        let hi = self.config.interval_min.max(self.config.interval_max);
        lo + rng.f32() * (hi - lo)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawned_obstacles_never_overlap_for_any_seed() {
        let road = RoadBounds::default();
        for seed in 0..200u64 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let cfg = SpawnerConfig { interval_min: 0.0, interval_max: 0.05, ..Default::default() };
            let mut spawner = ObstacleSpawner::new(cfg, &mut rng);
            let mut live: Vec<Obstacle> = Vec::new();
            let mut car_y = 0.0;
            for _ in 0..300 {
                let before = live.clone();
                if let SpawnOutcome::Spawned(id) = spawner.tick(&mut live, &road, car_y, &mut rng, 0.05) {
                    let fresh = live.iter().find(|o| o.id == id).unwrap();
                    for other in before.iter() {
                        assert!(
                            !fresh.bbox.overlaps(&other.bbox),
                            "seed {}: obstacle {} overlaps {}", seed, fresh.id, other.id
                        );
                    }
                }
                car_y += 2.0;
            }
        }
    }

    #[test]
    fn spawn_positions_stay_on_road() {
        let road = RoadBounds::new(-60.0, 60.0);
        let mut rng = fastrand::Rng::with_seed(7);
        let cfg = SpawnerConfig { interval_min: 0.0, interval_max: 0.0, ..Default::default() };
        let mut spawner = ObstacleSpawner::new(cfg, &mut rng);
        let mut live = Vec::new();
        for _ in 0..50 {
            spawner.tick(&mut live, &road, 0.0, &mut rng, 0.1);
        }
        assert!(!live.is_empty());
        for o in &live {
            assert!(o.bbox.min_x >= road.left - 1e-4 && o.bbox.max_x <= road.right + 1e-4);
            assert!(o.bbox.width() >= 15.0 - 1e-4 && o.bbox.width() <= 25.0 + 1e-4);
        }
    }

    #[test]
    fn crowded_row_skips_instead_of_overlapping() {
        // A road barely wider than one obstacle leaves no room for a second
        // one in the same row.
        let road = RoadBounds::new(-15.0, 15.0);
        let mut rng = fastrand::Rng::with_seed(3);
        let cfg = SpawnerConfig { interval_min: 0.0, interval_max: 0.0, ..Default::default() };
        let mut spawner = ObstacleSpawner::new(cfg, &mut rng);
        let mut live = Vec::new();
        assert!(matches!(spawner.tick(&mut live, &road, 0.0, &mut rng, 0.1), SpawnOutcome::Spawned(_)));
        assert_eq!(spawner.tick(&mut live, &road, 0.0, &mut rng, 0.1), SpawnOutcome::Skipped);
        assert_eq!(live.len(), 1);
    }

    #[test]
    fn same_seed_same_obstacles() {
        let road = RoadBounds::default();
        let run = |seed| {
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut spawner = ObstacleSpawner::new(SpawnerConfig::default(), &mut rng);
            let mut live = Vec::new();
            for i in 0..200 {
                spawner.tick(&mut live, &road, i as f32 * 3.0, &mut rng, 1.0 / 30.0);
            }
            live
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let road = RoadBounds::default();
        let mut rng = fastrand::Rng::with_seed(11);
        let cfg = SpawnerConfig { interval_min: 0.0, interval_max: 0.0, ..Default::default() };
        let mut spawner = ObstacleSpawner::new(cfg, &mut rng);
        let mut live = Vec::new();
        for i in 0..40 {
            spawner.tick(&mut live, &road, i as f32 * 50.0, &mut rng, 0.1);
        }
        let ids: Vec<_> = live.iter().map(|o| o.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn resolved_obstacles_behind_car_are_removed() {
        let road = RoadBounds::default();
        let mut rng = fastrand::Rng::with_seed(1);
        let cfg = SpawnerConfig { enabled: false, ..Default::default() };
        let mut spawner = ObstacleSpawner::new(cfg, &mut rng);
        let mut passed = Obstacle::new(0, Aabb::centered(0.0, 0.0, 20.0, 20.0));
        passed.status = ObstacleStatus::Passed;
        let still_active = Obstacle::new(1, Aabb::centered(50.0, 0.0, 20.0, 20.0));
        let mut live = vec![passed, still_active];
        assert_eq!(spawner.tick(&mut live, &road, 1000.0, &mut rng, 0.1), SpawnOutcome::Waiting);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, 1);
    }

    #[test]
    fn capacity_limits_live_set() {
        let road = RoadBounds::new(-1000.0, 1000.0);
        let mut rng = fastrand::Rng::with_seed(5);
        let cfg = SpawnerConfig { interval_min: 0.0, interval_max: 0.0, max_live: 3, ..Default::default() };
        let mut spawner = ObstacleSpawner::new(cfg, &mut rng);
        let mut live = Vec::new();
        for _ in 0..20 {
            spawner.tick(&mut live, &road, 0.0, &mut rng, 0.1);
        }
        assert_eq!(live.len(), 3);
    }
}
