//! Hand landmarks as delivered by the detection model.
//!
//! A frame holds 21 keypoints in the usual hand-tracking order, in normalized
//! image coordinates: `x` and `y` in `[0, 1]`, `y` growing downward.  `z` is
//! relative depth and is carried through untouched.

use crate::error::{CoreError, Result};

// ════════════════════════════════════════════════════════════════════════════
// Point3
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self { Point3 { x, y, z } }

    pub fn planar(x: f32, y: f32) -> Self { Point3 { x, y, z: 0.0 } }

    /// Distance in the image plane (ignores `z`).
    pub fn planar_distance(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Landmark — named keypoint index
// ════════════════════════════════════════════════════════════════════════════

/// Named keypoint.  Discriminants are the positions within a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Landmark {
    Wrist      = 0,
    ThumbCmc   = 1,
    ThumbMcp   = 2,
    ThumbIp    = 3,
    ThumbTip   = 4,
    IndexMcp   = 5,
    IndexPip   = 6,
    IndexDip   = 7,
    IndexTip   = 8,
    MiddleMcp  = 9,
    MiddlePip  = 10,
    MiddleDip  = 11,
    MiddleTip  = 12,
    RingMcp    = 13,
    RingPip    = 14,
    RingDip    = 15,
    RingTip    = 16,
    PinkyMcp   = 17,
    PinkyPip   = 18,
    PinkyDip   = 19,
    PinkyTip   = 20,
}

impl Landmark {
    pub const COUNT: usize = 21;

    pub fn index(self) -> usize { self as usize }

    /// Base joint and the three joints toward the tip, for finger index
    /// `0 = thumb .. 4 = pinky`.
    pub fn finger_chain(finger: usize) -> [Landmark; 4] {
        use Landmark::*;
        match finger {
            0 => [ThumbCmc,  ThumbMcp,  ThumbIp,   ThumbTip],
            1 => [IndexMcp,  IndexPip,  IndexDip,  IndexTip],
            2 => [MiddleMcp, MiddlePip, MiddleDip, MiddleTip],
            3 => [RingMcp,   RingPip,   RingDip,   RingTip],
            _ => [PinkyMcp,  PinkyPip,  PinkyDip,  PinkyTip],
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandLandmarks
// ════════════════════════════════════════════════════════════════════════════

/// One detected hand.  Absence of a hand is expressed as `Option::None`
/// at the call sites, never as an empty frame.
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    points: [Point3; Landmark::COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Point3; Landmark::COUNT]) -> Self {
        HandLandmarks { points }
    }

    /// Build from a slice coming off the detector.  The slice must hold
    /// exactly [`Landmark::COUNT`] points.
    pub fn from_slice(points: &[Point3]) -> Result<Self> {
        let points: [Point3; Landmark::COUNT] = points.try_into().map_err(|_| {
            CoreError::MalformedLandmarks { expected: Landmark::COUNT, got: points.len() }
        })?;
        Ok(HandLandmarks { points })
    }

    pub fn get(&self, lm: Landmark) -> Point3 { self.points[lm.index()] }

    pub fn points(&self) -> &[Point3; Landmark::COUNT] { &self.points }

    /// Width used to normalize steering tilt: index tip ↔ pinky tip.
    pub fn span(&self) -> f32 {
        self.get(Landmark::IndexTip).planar_distance(&self.get(Landmark::PinkyTip))
    }

    /// Knuckle-to-knuckle width (index MCP ↔ pinky MCP).  Finger
    /// extension is measured in these units so it holds at any distance
    /// from the camera.
    pub fn palm_width(&self) -> f32 {
        self.get(Landmark::IndexMcp).planar_distance(&self.get(Landmark::PinkyMcp))
    }

    /// Tip-to-MCP distance of finger `1 = index .. 4 = pinky`.
    pub fn finger_reach(&self, finger: usize) -> f32 {
        let chain = Landmark::finger_chain(finger.clamp(1, 4));
        self.get(chain[0]).planar_distance(&self.get(chain[3]))
    }

    /// Synthesize an upright driving hand from the three control inputs.
    ///
    /// `thumb_y` is the thumb-tip height, `tilt` is the vertical offset
    /// `index_tip.y - pinky_tip.y`.  Used by simulated sources and tests.
    pub fn synthetic(center_x: f32, thumb_y: f32, tilt: f32) -> Self {
        Self::synthetic_pose(center_x, thumb_y, tilt, HandPose::Drive)
    }

    /// As [`synthetic`](Self::synthetic), shaped into `pose`.  Curled
    /// fingers lie in the palm and ignore `tilt`.
    pub fn synthetic_pose(center_x: f32, thumb_y: f32, tilt: f32, pose: HandPose) -> Self {
        const FINGER_DX: [f32; 5] = [-0.09, -0.045, 0.0, 0.035, 0.07];
        const PALM_DROP: f32 = 0.12;
        const REACH: f32 = 0.12;
        const CURLED_REACH: f32 = 0.02;
        const V_SPREAD: f32 = 0.02;
        let mut points = [Point3::default(); Landmark::COUNT];

        let palm_y = thumb_y + PALM_DROP;
        points[Landmark::Wrist.index()] = Point3::planar(center_x, palm_y + 0.1);

        for finger in 0..5 {
            let x = center_x + FINGER_DX[finger];
            let curled = match pose {
                HandPose::Fist  => finger > 0,
                HandPose::Boost => finger >= 3,
                _               => false,
            };
            // Sideways offset of the fingertip from its knuckle.
            let splay = match (pose, finger) {
                (HandPose::OpenPalm, f) if f > 0 => FINGER_DX[f],
                (HandPose::Boost, 1) => -V_SPREAD,
                (HandPose::Boost, 2) =>  V_SPREAD,
                _ => 0.0,
            };
            // Tilt is spread linearly from index (+½) to pinky (-½).
            let lean = match finger {
                0 => 0.0,
                _ if curled => 0.0,
                f => tilt * (0.5 - (f as f32 - 1.0) / 3.0),
            };
            let tip = match finger {
                0 => Point3::planar(x, thumb_y),
                _ => {
                    let reach = if curled { CURLED_REACH } else { REACH };
                    Point3::planar(x + splay, palm_y - reach + lean)
                }
            };
            let chain = Landmark::finger_chain(finger);
            for (step, lm) in chain.iter().enumerate() {
                points[lm.index()] = if step == 3 {
                    tip
                } else {
                    let t = step as f32 / 3.0;
                    Point3::planar(x + (tip.x - x) * t, palm_y + (tip.y - palm_y) * t)
                };
            }
        }
        HandLandmarks { points }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandPose
// ════════════════════════════════════════════════════════════════════════════

/// Coarse hand shape, read from finger extension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HandPose {
    /// Fingers extended side by side; thumb and tilt steer the car.
    #[default]
    Drive,
    /// All four fingers curled into the palm.
    Fist,
    /// All four fingers extended and splayed apart ("stop").
    OpenPalm,
    /// Index and middle fingers up in a V, ring and pinky curled.
    Boost,
}

impl HandPose {
    pub fn brakes(self) -> bool { matches!(self, HandPose::Fist | HandPose::OpenPalm) }

    pub fn boosts(self) -> bool { self == HandPose::Boost }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_rejects_wrong_length() {
        let pts = vec![Point3::default(); 5];
        assert_eq!(
            HandLandmarks::from_slice(&pts),
            Err(CoreError::MalformedLandmarks { expected: 21, got: 5 })
        );
    }

    #[test]
    fn from_slice_keeps_order() {
        let pts: Vec<Point3> = (0..21).map(|i| Point3::planar(i as f32 / 20.0, 0.5)).collect();
        let hand = HandLandmarks::from_slice(&pts).unwrap();
        assert_eq!(hand.get(Landmark::Wrist).x, 0.0);
        assert_eq!(hand.get(Landmark::PinkyTip).x, 1.0);
        assert_eq!(hand.get(Landmark::ThumbTip).x, 4.0 / 20.0);
    }

    #[test]
    fn synthetic_hand_honours_inputs() {
        let hand = HandLandmarks::synthetic(0.5, 0.3, 0.04);
        assert!((hand.get(Landmark::ThumbTip).y - 0.3).abs() < 1e-6);
        let tilt = hand.get(Landmark::IndexTip).y - hand.get(Landmark::PinkyTip).y;
        assert!((tilt - 0.04).abs() < 1e-5, "tilt was {}", tilt);
        assert!(hand.span() > 0.0);
    }

    #[test]
    fn palm_width_is_knuckle_spacing() {
        let hand = HandLandmarks::synthetic(0.5, 0.5, 0.0);
        assert!((hand.palm_width() - 0.115).abs() < 1e-5);
        assert!((hand.finger_reach(1) - 0.12).abs() < 1e-5);
    }

    #[test]
    fn synthetic_poses_curl_and_splay_fingers() {
        let fist = HandLandmarks::synthetic_pose(0.5, 0.5, 0.05, HandPose::Fist);
        assert!((1..=4).all(|f| fist.finger_reach(f) < 0.03));
        // The thumb still reports the speed input.
        assert!((fist.get(Landmark::ThumbTip).y - 0.5).abs() < 1e-6);

        let boost = HandLandmarks::synthetic_pose(0.5, 0.5, 0.0, HandPose::Boost);
        assert!(boost.finger_reach(1) > 0.1 && boost.finger_reach(2) > 0.1);
        assert!(boost.finger_reach(3) < 0.03 && boost.finger_reach(4) < 0.03);

        let open = HandLandmarks::synthetic_pose(0.5, 0.5, 0.0, HandPose::OpenPalm);
        let drive = HandLandmarks::synthetic(0.5, 0.5, 0.0);
        assert!(open.span() > drive.span());
        assert_eq!(open.palm_width(), drive.palm_width());
    }

    #[test]
    fn synthetic_level_hand_has_no_tilt() {
        let hand = HandLandmarks::synthetic(0.5, 0.5, 0.0);
        assert_eq!(hand.get(Landmark::IndexTip).y, hand.get(Landmark::PinkyTip).y);
    }
}
