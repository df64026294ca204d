//! Software-rendered game window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┬──────────────┐
//! │ grass │  road  ┆  with lane stripes  │ grass │  HUD         │
//! │       │  [obstacles scroll down]     │       │  score       │
//! │       │                              │       │  passed      │
//! │       │            [car]             │       │  speed bar   │
//! │       │                              │       │  steering    │
//! │ key legend                                   │  timer       │
//! └──────────────────────────────────────────────┴──────────────┘
//! ```

use std::sync::mpsc::Sender;
use std::time::Duration;

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use racer_core::{ControlCommand, Frontend, Maneuver, RenderFrame, RoadBounds};

use crate::landmark::{SimInput, SimKey};
use crate::scene::{obstacle_color, Camera, FlashFade, ScreenRect};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:       usize = 900;
pub const WIN_H:       usize = 600;
const HUD_W:           usize = 220;
const PLAY_W:          usize = WIN_W - HUD_W;
const ROAD_PX:         usize = 420;
const ROAD_X0:         usize = (PLAY_W - ROAD_PX) / 2;
const CAR_ROW:         usize = WIN_H - 110;
/// World units between lane-stripe dashes.
const STRIPE_PERIOD:   f32   = 60.0;
const STRIPE_LEN:      usize = 24;
const GRASS_COLOR:     u32   = 0xFF1E3B1E;
const ROAD_COLOR:      u32   = 0xFF3A3A3A;
const EDGE_COLOR:      u32   = 0xFFEEEEEE;
const STRIPE_COLOR:    u32   = 0xFFFFD700;  // gold
const CAR_COLOR:       u32   = 0xFF2F9BFF;
const PASSED_COLOR:    u32   = 0xFF555555;
const HUD_BG:          u32   = 0xFF16213E;
const TEXT_BG:         u32   = 0xFF0F3460;
const FLASH_COLOR:     u32   = 0xFFFF2020;
const WARN_COLOR:      u32   = 0xFFFFAA00;
/// Needle angle at full steering lock.
const MAX_NEEDLE_ANGLE: f32  = std::f32::consts::FRAC_PI_4;

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:       Window,
    buf:          Vec<u32>,
    sim_tx:       Sender<SimInput>,
    camera:       Camera,
    flash:        FlashFade,
    last_elapsed: f32,
    /// Simulation keys held as of the last poll.
    held:         Vec<SimKey>,
    mouse_was_down: bool,
    status:       String,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>, road: RoadBounds, title: &str) -> Result<Self, String> {
        let mut window = Window::new(
            title,
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![GRASS_COLOR; WIN_W * WIN_H],
            sim_tx,
            camera: Camera::new(road, ROAD_X0, ROAD_PX, CAR_ROW),
            flash: FlashFade::default(),
            last_elapsed: 0.0,
            held: Vec::new(),
            mouse_was_down: false,
            status: String::new(),
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Text shown in the bottom status bar.
    pub fn set_status(&mut self, status: &str) { self.status = status.to_string(); }

    /// Forward keyboard and mouse state to the simulated hand.
    fn poll_sim_input(&mut self) {
        let down = |k: Key| self.window.is_key_down(k);
        let mut now = Vec::new();
        if down(Key::W) || down(Key::Up)    { now.push(SimKey::ThumbUp);   }
        if down(Key::S) || down(Key::Down)  { now.push(SimKey::ThumbDown); }
        if down(Key::A) || down(Key::Left)  { now.push(SimKey::TiltLeft);  }
        if down(Key::D) || down(Key::Right) { now.push(SimKey::TiltRight); }
        if down(Key::B)                     { now.push(SimKey::Brake);     }
        if down(Key::V)                     { now.push(SimKey::Boost);     }

        for input in key_transitions(&self.held, &now) {
            let _ = self.sim_tx.send(input);
        }
        self.held = now;

        if self.window.is_key_pressed(Key::H, KeyRepeat::No) {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::ToggleHand));
        }

        // Dragging inside the play area positions the hand directly.
        let mouse_down = self.window.get_mouse_down(MouseButton::Left);
        if mouse_down {
            if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Discard) {
                if (mx as usize) < PLAY_W {
                    let _ = self.sim_tx.send(SimInput::Pointer {
                        x: mx / PLAY_W as f32,
                        y: my / WIN_H as f32,
                    });
                }
            }
        } else if self.mouse_was_down {
            let _ = self.sim_tx.send(SimInput::Pointer { x: 0.5, y: 0.75 });
        }
        self.mouse_was_down = mouse_down;
    }

    /// Render one frame.
    fn render(&mut self, frame: &RenderFrame) {
        let dt = (frame.elapsed - self.last_elapsed).max(0.0);
        self.last_elapsed = frame.elapsed;
        self.flash.update(frame.collision_flash, dt);
        self.camera.follow(frame.car.y);

        // Clear
        self.buf.fill(GRASS_COLOR);

        // ── Road ──────────────────────────────────────────────────────────
        self.fill_rect(ROAD_X0, 0, ROAD_PX, WIN_H, ROAD_COLOR);
        self.fill_rect(ROAD_X0.saturating_sub(3), 0, 3, WIN_H, EDGE_COLOR);
        self.fill_rect(ROAD_X0 + ROAD_PX, 0, 3, WIN_H, EDGE_COLOR);
        self.draw_stripes(frame.road);

        // ── Obstacles ─────────────────────────────────────────────────────
        for obstacle in &frame.obstacles {
            let r = self.camera.rect(&obstacle.bbox);
            let color = if obstacle.is_active() {
                obstacle_color(obstacle.id)
            } else if obstacle.is_passed() {
                PASSED_COLOR
            } else {
                blend(obstacle_color(obstacle.id), FLASH_COLOR, 0.6)
            };
            self.fill_screen_rect(r, color);
            self.draw_screen_border(r, 0xFF000000);
        }

        // ── Car ───────────────────────────────────────────────────────────
        let car = self.camera.rect(&frame.car.bbox);
        let car_color = if self.flash.level() > 0.0 {
            blend(CAR_COLOR, FLASH_COLOR, self.flash.level())
        } else {
            CAR_COLOR
        };
        self.fill_screen_rect(car, car_color);
        self.draw_screen_border(car, 0xFFFFFFFF);
        self.draw_heading(car, frame.car.heading);

        // ── Collision flash ───────────────────────────────────────────────
        if self.flash.level() > 0.0 {
            let t = self.flash.level() * 0.35;
            for px in self.buf.iter_mut() {
                *px = blend(*px, FLASH_COLOR, t);
            }
        }

        // ── HUD ───────────────────────────────────────────────────────────
        self.draw_hud(frame);

        // ── Overlays ──────────────────────────────────────────────────────
        if frame.paused {
            self.fill_rect(PLAY_W / 2 - 60, WIN_H / 2 - 16, 120, 32, TEXT_BG);
            self.draw_label("PAUSED - P TO RESUME", PLAY_W / 2 - 40, WIN_H / 2 - 3, 0xFFFFFFFF);
        }
        if !frame.signal.hand_present() {
            let (text, color) = if frame.fail_safe {
                ("NO HAND - SLOWING DOWN", WARN_COLOR)
            } else {
                ("NO HAND", 0xFFDDDDDD)
            };
            self.draw_label(text, ROAD_X0 + 10, 12, color);
        }

        // ── Status bar + key legend ───────────────────────────────────────
        self.fill_rect(0, WIN_H - 36, PLAY_W, 36, TEXT_BG);
        let status = self.status.clone();
        self.draw_label(&status, 10, WIN_H - 30, 0xFFEEEEEE);
        self.draw_label(
            "W/S=thumb  A/D=tilt  H=hand  mouse=drag hand  P=pause  M=mute  Q=quit",
            10, WIN_H - 16, 0xFF888888,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Lane stripes ──────────────────────────────────────────────────────

    fn draw_stripes(&mut self, road: RoadBounds) {
        let (cx, _) = self.camera.to_screen(road.center(), 0.0);
        let cx = cx.round() as usize;
        for row in self.camera.stripe_rows(STRIPE_PERIOD, WIN_H) {
            let r = ScreenRect { x: cx as isize - 2, y: row, w: 4, h: STRIPE_LEN };
            self.fill_screen_rect(r, STRIPE_COLOR);
        }
    }

    // ── Car heading tick ──────────────────────────────────────────────────

    fn draw_heading(&mut self, car: ScreenRect, heading: f32) {
        let cx = car.x as f32 + car.w as f32 / 2.0;
        let cy = car.y as f32;
        let (dx, dy) = needle_direction(heading);
        for i in 0..14 {
            let t  = i as f32;
            let px = cx + dx * t;
            let py = cy - dy * t;
            if px >= 0.0 && py >= 0.0 {
                self.set_pixel(px as usize, py as usize, 0xFFFFFFFF);
            }
        }
    }

    // ── HUD panel ─────────────────────────────────────────────────────────

    fn draw_hud(&mut self, frame: &RenderFrame) {
        let x0 = PLAY_W;
        self.fill_rect(x0, 0, HUD_W, WIN_H, HUD_BG);
        self.draw_label("LEAP RACER", x0 + 10, 10, 0xFFFFD700);

        let board = frame.scoreboard;
        self.draw_label(&format!("SCORE  {}", board.score),       x0 + 10, 40, 0xFFFFFFFF);
        self.draw_label(&format!("PASSED {}", board.passed),      x0 + 10, 56, 0xFFAADDFF);
        self.draw_label(&format!("HITS   {}", board.collisions),  x0 + 10, 72, 0xFFFFBBAA);

        // Speed bar
        self.draw_label("SPEED", x0 + 10, 104, 0xFFCCCCCC);
        let bar_w = HUD_W - 20;
        self.draw_border(x0 + 10, 114, bar_w, 12, 0xFF888888);
        let fill = (frame.signal.speed() * (bar_w - 2) as f32) as usize;
        self.fill_rect(x0 + 11, 115, fill, 10, blend(0xFF30C030, 0xFFFF3030, frame.signal.speed()));

        // Steering gauge: centre tick plus a marker
        self.draw_label("STEER", x0 + 10, 140, 0xFFCCCCCC);
        self.draw_border(x0 + 10, 150, bar_w, 12, 0xFF888888);
        let mid = x0 + 10 + bar_w / 2;
        self.fill_rect(mid, 150, 1, 12, 0xFF888888);
        let offset = frame.signal.steering() * (bar_w / 2 - 3) as f32;
        let marker = (mid as f32 + offset).round() as usize;
        self.fill_rect(marker.saturating_sub(2), 151, 5, 10, STRIPE_COLOR);

        self.draw_label(&format!("ENGINE {:.0} HZ", frame.tone.frequency), x0 + 10, 180, 0xFFCCCCCC);
        self.draw_label(&format!("TIME   {:.1}", frame.elapsed),          x0 + 10, 196, 0xFFCCCCCC);
        if let Some(left) = frame.time_remaining {
            let color = if left < 10.0 { WARN_COLOR } else { 0xFFFFFFFF };
            self.draw_label(&format!("LEFT   {:.1}", left), x0 + 10, 212, color);
        }
        if frame.muted {
            self.draw_label("MUTED", x0 + 10, 236, WARN_COLOR);
        }
        if let Some((text, color)) = pose_badge(frame) {
            self.draw_label(text, x0 + 10, 252, color);
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    /// Fill a possibly off-screen rectangle, clipped to the play area.
    fn fill_screen_rect(&mut self, r: ScreenRect, color: u32) {
        if let Some((x, y, w, h)) = clip(r, PLAY_W, WIN_H) {
            self.fill_rect(x, y, w, h, color);
        }
    }

    fn draw_screen_border(&mut self, r: ScreenRect, color: u32) {
        if let Some((x, y, w, h)) = clip(r, PLAY_W, WIN_H) {
            self.draw_border(x, y, w, h, color);
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x+w).min(WIN_W) {
            if y < WIN_H           { self.buf[y           * WIN_W + col] = color; }
            if y+h-1 < WIN_H       { self.buf[(y+h-1)     * WIN_W + col] = color; }
        }
        for row in y..(y+h).min(WIN_H) {
            if x < WIN_W           { self.buf[row * WIN_W + x    ] = color; }
            if x+w-1 < WIN_W       { self.buf[row * WIN_W + x+w-1] = color; }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    /// Minimal bitmap font — 3×5 characters for HUD text.
    /// Each character is encoded as 5 rows × 3 bits.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.set_pixel(cx + col, y + row, color);
                    }
                }
            }
            cx += 4; // 3 wide + 1 gap
            if cx + 4 > WIN_W { break; }
        }
    }
}

impl Frontend for Visualizer {
    fn present(&mut self, frame: &RenderFrame) {
        self.render(frame);
    }

    fn poll_commands(&mut self) -> Vec<ControlCommand> {
        if !self.window.is_open() {
            return vec![ControlCommand::Quit];
        }
        self.poll_sim_input();

        let mut cmds = Vec::new();
        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        if pressed(Key::P) || pressed(Key::Escape) || pressed(Key::Space) {
            cmds.push(ControlCommand::TogglePause);
        }
        if pressed(Key::M) {
            cmds.push(ControlCommand::ToggleMute);
        }
        if pressed(Key::Q) {
            cmds.push(ControlCommand::Quit);
        }
        cmds
    }
}

/// Press/release events that turn the `prev` held set into `now`.
fn key_transitions(prev: &[SimKey], now: &[SimKey]) -> Vec<SimInput> {
    let released = prev.iter().filter(|k| !now.contains(k)).map(|&k| SimInput::KeyUp(k));
    let pressed  = now.iter().filter(|k| !prev.contains(k)).map(|&k| SimInput::KeyDown(k));
    released.chain(pressed).collect()
}

/// Intersect `r` with a `w`×`h` area; `None` if nothing remains.
/// HUD label for a brake or boost in progress.
fn pose_badge(frame: &RenderFrame) -> Option<(&'static str, u32)> {
    if frame.signal.braking() {
        Some(("BRAKE", FLASH_COLOR))
    } else if matches!(frame.car.maneuver, Maneuver::Boosting { .. }) {
        Some(("BOOST", STRIPE_COLOR))
    } else {
        None
    }
}

/// Unit (sideways, forward) direction for a heading in `[-1, 1]`.
fn needle_direction(heading: f32) -> (f32, f32) {
    let angle = heading.clamp(-1.0, 1.0) * MAX_NEEDLE_ANGLE;
    (angle.sin(), angle.cos())
}

fn clip(r: ScreenRect, w: usize, h: usize) -> Option<(usize, usize, usize, usize)> {
    let x0 = r.x.max(0);
    let y0 = r.y.max(0);
    let x1 = (r.x + r.w as isize).min(w as isize);
    let y1 = (r.y + r.h as isize).min(h as isize);
    if x1 <= x0 || y1 <= y0 { return None; }
    Some((x0 as usize, y0 as usize, (x1 - x0) as usize, (y1 - y0) as usize))
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}
