//! Scene mapping for the road view.
//!
//! Converts world coordinates to window pixels with a chase camera pinned
//! to the car, picks obstacle colors, and animates the lane stripes and
//! the collision flash.

use racer_core::{Aabb, ObstacleId, RoadBounds};

// ════════════════════════════════════════════════════════════════════════════
// Color palette — obstacle id → ARGB
// ════════════════════════════════════════════════════════════════════════════

/// Golden-angle hue stepping keeps consecutive obstacles visually distinct.
pub fn obstacle_color(id: ObstacleId) -> u32 {
    let hue = (id as f32 * 137.508) % 360.0;
    hsv_to_argb(hue, 0.70, 0.95)
}

/// Convert HSV → packed ARGB (0xAARRGGBB, A=0xFF).
pub fn hsv_to_argb(h: f32, s: f32, v: f32) -> u32 {
    let h  = h.rem_euclid(360.0);
    let hi = (h / 60.0) as u32;
    let f  = h / 60.0 - hi as f32;
    let p  = v * (1.0 - s);
    let q  = v * (1.0 - s * f);
    let t  = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match hi {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let ri = (r * 255.0) as u32;
    let gi = (g * 255.0) as u32;
    let bi = (b * 255.0) as u32;
    0xFF000000 | (ri << 16) | (gi << 8) | bi
}

// ════════════════════════════════════════════════════════════════════════════
// Camera — world → screen
// ════════════════════════════════════════════════════════════════════════════

/// Rectangle in window pixels.  May extend past the window; callers clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenRect {
    pub x: isize,
    pub y: isize,
    pub w: usize,
    pub h: usize,
}

/// Chase camera: the road fills a fixed pixel column and the car sits on a
/// fixed row, so the world scrolls down past it as it advances.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    road:      RoadBounds,
    road_x0:   f32,
    /// Pixels per world unit.
    scale:     f32,
    car_row:   f32,
    car_y:     f32,
}

impl Camera {
    /// `road_x0`/`road_px` place the road horizontally; `car_row` is the
    /// screen row of the car's centre.
    pub fn new(road: RoadBounds, road_x0: usize, road_px: usize, car_row: usize) -> Self {
        let width = road.width().max(f32::EPSILON);
        Camera {
            road,
            road_x0: road_x0 as f32,
            scale:   road_px as f32 / width,
            car_row: car_row as f32,
            car_y:   0.0,
        }
    }

    pub fn follow(&mut self, car_y: f32) { self.car_y = car_y; }

    pub fn to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        let sx = self.road_x0 + (x - self.road.left) * self.scale;
        let sy = self.car_row - (y - self.car_y) * self.scale;
        (sx, sy)
    }

    pub fn rect(&self, bbox: &Aabb) -> ScreenRect {
        let (x0, y0) = self.to_screen(bbox.min_x, bbox.max_y);
        let (x1, y1) = self.to_screen(bbox.max_x, bbox.min_y);
        ScreenRect {
            x: x0.round() as isize,
            y: y0.round() as isize,
            w: (x1 - x0).round().max(1.0) as usize,
            h: (y1 - y0).round().max(1.0) as usize,
        }
    }

    /// Screen rows of lane-stripe dashes currently in view, top to bottom.
    ///
    /// Dashes sit every `period` world units along the road; the returned
    /// rows move down the screen as the car advances.
    pub fn stripe_rows(&self, period: f32, screen_h: usize) -> Vec<isize> {
        if period <= 0.0 { return Vec::new(); }
        let top_y    = self.car_y + self.car_row / self.scale;
        let bottom_y = self.car_y - (screen_h as f32 - self.car_row) / self.scale;
        let first    = (bottom_y / period).floor() as i64;
        let last     = (top_y / period).ceil() as i64;
        (first..=last).rev()
            .map(|k| self.to_screen(0.0, k as f32 * period).1.round() as isize)
            .collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FlashFade — collision flash overlay
// ════════════════════════════════════════════════════════════════════════════

/// Overlay intensity: jumps to 1 while the flash is active, then fades.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlashFade {
    level: f32,
}

const FLASH_FADE_SECS: f32 = 0.25;

impl FlashFade {
    pub fn update(&mut self, active: bool, dt: f32) {
        if active {
            self.level = 1.0;
        } else {
            self.level = (self.level - dt.max(0.0) / FLASH_FADE_SECS).max(0.0);
        }
    }

    pub fn level(&self) -> f32 { self.level }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        // 200 world units over 400 px → 2 px per unit.
        Camera::new(RoadBounds::new(-100.0, 100.0), 50, 400, 300)
    }

    #[test]
    fn road_edges_map_to_road_column() {
        let cam = camera();
        assert_eq!(cam.to_screen(-100.0, 0.0), (50.0, 300.0));
        assert_eq!(cam.to_screen(100.0, 0.0).0, 450.0);
    }

    #[test]
    fn objects_ahead_are_drawn_above_the_car() {
        let mut cam = camera();
        cam.follow(1000.0);
        let (_, car_row) = cam.to_screen(0.0, 1000.0);
        let (_, ahead)   = cam.to_screen(0.0, 1050.0);
        assert_eq!(car_row, 300.0);
        assert_eq!(ahead, 200.0);
    }

    #[test]
    fn rect_spans_box_in_pixels() {
        let cam = camera();
        let r = cam.rect(&Aabb::centered(0.0, 10.0, 20.0, 10.0));
        assert_eq!(r, ScreenRect { x: 230, y: 270, w: 40, h: 20 });
    }

    #[test]
    fn stripes_scroll_down_as_car_advances() {
        let mut cam = camera();
        let before = cam.stripe_rows(40.0, 500);
        cam.follow(10.0);
        let after = cam.stripe_rows(40.0, 500);
        assert!(!before.is_empty());
        // The stripe at world y = 0 moved down by 10 units = 20 px.
        let zero_before = cam_row_of(&camera(), 0.0);
        assert!(before.contains(&zero_before));
        assert!(after.contains(&(zero_before + 20)));
    }

    fn cam_row_of(cam: &Camera, y: f32) -> isize { cam.to_screen(0.0, y).1.round() as isize }

    #[test]
    fn flash_fades_after_release() {
        let mut f = FlashFade::default();
        f.update(true, 0.016);
        assert_eq!(f.level(), 1.0);
        f.update(false, 0.125);
        assert!((f.level() - 0.5).abs() < 1e-6);
        f.update(false, 1.0);
        assert_eq!(f.level(), 0.0);
    }

    #[test]
    fn palette_is_opaque_and_varies() {
        let a = obstacle_color(1);
        let b = obstacle_color(2);
        assert_eq!(a >> 24, 0xFF);
        assert_ne!(a, b);
        assert_eq!(hsv_to_argb(0.0, 1.0, 1.0), 0xFFFF0000);
    }
}
