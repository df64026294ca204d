//! Car ↔ obstacle overlap tests.

use crate::geometry::Aabb;
use crate::obstacle::{Obstacle, ObstacleId};

/// Symmetric AABB overlap.  Boxes that merely touch do not collide.
pub fn collides(a: &Aabb, b: &Aabb) -> bool {
    a.overlaps(b)
}

/// Ids of every obstacle whose box overlaps the car's, in input order.
///
/// Resolution state is ignored here; deciding whether a hit counts is the
/// score tracker's job.
pub fn check(car: &Aabb, obstacles: &[Obstacle]) -> Vec<ObstacleId> {
    obstacles
        .iter()
        .filter(|o| collides(car, &o.bbox))
        .map(|o| o.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_is_symmetric() {
        let boxes = [
            Aabb::centered(0.0, 0.0, 10.0, 10.0),
            Aabb::centered(4.0, 4.0, 10.0, 10.0),
            Aabb::centered(10.0, 0.0, 10.0, 10.0),
            Aabb::centered(30.0, 30.0, 5.0, 5.0),
            Aabb::centered(0.0, 0.0, 1.0, 1.0),
        ];
        for a in &boxes {
            for b in &boxes {
                assert_eq!(collides(a, b), collides(b, a));
            }
        }
    }

    #[test]
    fn touching_edges_and_corners_do_not_collide() {
        let a = Aabb::centered(0.0, 0.0, 10.0, 10.0);
        assert!(!collides(&a, &Aabb::centered(10.0, 0.0, 10.0, 10.0)));
        assert!(!collides(&a, &Aabb::centered(0.0, -10.0, 10.0, 10.0)));
        assert!(!collides(&a, &Aabb::centered(10.0, 10.0, 10.0, 10.0)));
        assert!(collides(&a, &Aabb::centered(9.9, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn contained_box_collides() {
        let outer = Aabb::centered(0.0, 0.0, 50.0, 50.0);
        let inner = Aabb::centered(1.0, 1.0, 2.0, 2.0);
        assert!(collides(&outer, &inner));
        assert!(collides(&inner, &outer));
    }

    #[test]
    fn check_reports_only_overlapping_ids() {
        let car = Aabb::centered(0.0, 0.0, 30.0, 50.0);
        let obstacles = vec![
            Obstacle::new(3, Aabb::centered(0.0, 30.0, 20.0, 20.0)),
            Obstacle::new(4, Aabb::centered(0.0, 200.0, 20.0, 20.0)),
            Obstacle::new(5, Aabb::centered(-20.0, 0.0, 20.0, 20.0)),
        ];
        assert_eq!(check(&car, &obstacles), vec![3, 5]);
        assert!(check(&car, &[]).is_empty());
    }
}
