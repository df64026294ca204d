//! Axis-aligned boxes and road bounds in world coordinates.
//!
//! World frame: `x` is the lateral position across the road, `y` is forward
//! distance travelled.  Larger `y` is further ahead.

// ════════════════════════════════════════════════════════════════════════════
// Aabb
// ════════════════════════════════════════════════════════════════════════════

/// Axis-aligned bounding box.  `min_* <= max_*` always holds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Aabb {
    /// Box of size `width × height` centred on `(cx, cy)`.
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        let hw = width.abs()  * 0.5;
        let hh = height.abs() * 0.5;
        Aabb { min_x: cx - hw, min_y: cy - hh, max_x: cx + hw, max_y: cy + hh }
    }

    pub fn width(&self)  -> f32 { self.max_x - self.min_x }
    pub fn height(&self) -> f32 { self.max_y - self.min_y }

    pub fn center(&self) -> (f32, f32) {
        ((self.min_x + self.max_x) * 0.5, (self.min_y + self.max_y) * 0.5)
    }

    /// True iff both axis intervals overlap with positive length.
    ///
    /// Boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min_x < other.max_x && other.min_x < self.max_x
            && self.min_y < other.max_y && other.min_y < self.max_y
    }

    /// Grow the box by `margin` on every side.
    pub fn expanded(&self, margin: f32) -> Aabb {
        Aabb {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RoadBounds
// ════════════════════════════════════════════════════════════════════════════

/// Lateral extent of the drivable surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoadBounds {
    pub left:  f32,
    pub right: f32,
}

impl RoadBounds {
    pub fn new(left: f32, right: f32) -> Self {
        RoadBounds { left: left.min(right), right: left.max(right) }
    }

    pub fn width(&self)  -> f32 { self.right - self.left }
    pub fn center(&self) -> f32 { (self.left + self.right) * 0.5 }

    /// Clamp the centre of an object of `width` so it stays on the road.
    /// Objects wider than the road are pinned to the centre.
    pub fn clamp_center(&self, x: f32, width: f32) -> f32 {
        let lo = self.left  + width * 0.5;
        let hi = self.right - width * 0.5;
        if lo > hi { return self.center(); }
        x.clamp(lo, hi)
    }
}

impl Default for RoadBounds {
    fn default() -> Self {
        RoadBounds::new(-100.0, 100.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_box_extents() {
        let b = Aabb::centered(10.0, 20.0, 4.0, 6.0);
        assert_eq!(b.min_x, 8.0);
        assert_eq!(b.max_x, 12.0);
        assert_eq!(b.min_y, 17.0);
        assert_eq!(b.max_y, 23.0);
        assert_eq!(b.center(), (10.0, 20.0));
    }

    #[test]
    fn edge_sharing_boxes_do_not_overlap() {
        let a = Aabb::centered(0.0, 0.0, 2.0, 2.0);
        let b = Aabb::centered(2.0, 0.0, 2.0, 2.0);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn expanded_box_catches_near_miss() {
        let a = Aabb::centered(0.0, 0.0, 2.0, 2.0);
        let b = Aabb::centered(2.5, 0.0, 2.0, 2.0);
        assert!(!a.overlaps(&b));
        assert!(a.expanded(1.0).overlaps(&b));
    }

    #[test]
    fn road_clamps_center() {
        let road = RoadBounds::new(-50.0, 50.0);
        assert_eq!(road.clamp_center(100.0, 20.0), 40.0);
        assert_eq!(road.clamp_center(-100.0, 20.0), -40.0);
        assert_eq!(road.clamp_center(5.0, 20.0), 5.0);
        assert_eq!(road.clamp_center(5.0, 200.0), 0.0);
    }
}
