// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Face and hand region hints passed to the engine with every frame.
//!
//! The engine's hand and face sub-detectors can be seeded with rectangles.
//! [`HintSource`] decides where those rectangles come from: a fixed set
//! (by default the calibration values the adapter has always shipped), the
//! previous frame's body keypoints, or nothing at all.

use serde::{Deserialize, Serialize};

use crate::joints::Joint;
use crate::results::PoseKeypoints;

/// Joints below this confidence are treated as missing.
const MIN_JOINT_CONFIDENCE: f32 = 0.05;

/// Axis-aligned rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    /// Empty rectangle, meaning "no region" to the engine.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Square of side `size` centered on (`cx`, `cy`).
    #[must_use]
    pub fn square_around(cx: f32, cy: f32, size: f32) -> Self {
        Self::new(cx - size / 2.0, cy - size / 2.0, size, size)
    }

    #[must_use]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Rectangles for one frame: one face rectangle and one `[left, right]`
/// hand pair per person.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionHints {
    pub faces: Vec<Rectangle>,
    pub hands: Vec<[Rectangle; 2]>,
}

impl RegionHints {
    /// No hints.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The fixed calibration rectangles for three people.
    ///
    /// These values were measured on a single sample clip and are not
    /// derived from the frame being processed.
    #[must_use]
    pub fn calibration() -> Self {
        Self {
            faces: vec![
                Rectangle::new(330.119_385, 277.532_715, 48.717_274, 48.717_274),
                Rectangle::new(24.036_991, 267.918_793, 65.175_171, 65.175_171),
                Rectangle::new(151.803_436, 32.477_852, 108.295_761, 108.295_761),
            ],
            hands: vec![
                [
                    Rectangle::new(320.035_889, 377.675_049, 69.300_949, 69.300_949),
                    Rectangle::ZERO,
                ],
                [
                    Rectangle::new(80.155_792, 407.673_492, 80.812_706, 80.812_706),
                    Rectangle::new(46.449_715, 404.559_753, 98.898_178, 98.898_178),
                ],
                [
                    Rectangle::new(185.692_673, 303.112_244, 157.587_555, 157.587_555),
                    Rectangle::new(88.984_360, 268.866_547, 117.818_230, 117.818_230),
                ],
            ],
        }
    }

    /// Derive hints from body keypoints of a previous frame.
    ///
    /// The face square is centered on the nose with a side of twice the
    /// nose-to-neck distance. Each hand square is centered a third of a
    /// forearm past the wrist, sized 1.5x the longer of the forearm and
    /// 0.9x the upper arm. Missing joints yield [`Rectangle::ZERO`].
    #[must_use]
    pub fn from_pose(keypoints: &PoseKeypoints) -> Self {
        let mut hints = Self::empty();
        for person in 0..keypoints.len() {
            let point = |joint: Joint| {
                keypoints
                    .joint(person, joint)
                    .filter(|[_, _, c]| *c > MIN_JOINT_CONFIDENCE)
                    .map(|[x, y, _]| (x, y))
            };

            let face = match (point(Joint::Nose), point(Joint::Neck)) {
                (Some(nose), Some(neck)) => {
                    Rectangle::square_around(nose.0, nose.1, 2.0 * distance(nose, neck))
                }
                _ => Rectangle::ZERO,
            };

            let hand = |shoulder, elbow, wrist| match (point(shoulder), point(elbow), point(wrist))
            {
                (Some(s), Some(e), Some(w)) => {
                    let forearm = distance(e, w);
                    let upper_arm = distance(s, e);
                    let cx = w.0 + (w.0 - e.0) / 3.0;
                    let cy = w.1 + (w.1 - e.1) / 3.0;
                    Rectangle::square_around(cx, cy, 1.5 * forearm.max(0.9 * upper_arm))
                }
                _ => Rectangle::ZERO,
            };

            hints.faces.push(face);
            hints.hands.push([
                hand(Joint::LShoulder, Joint::LElbow, Joint::LWrist),
                hand(Joint::RShoulder, Joint::RElbow, Joint::RWrist),
            ]);
        }
        hints
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.hands.is_empty()
    }
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Where a session takes its per-frame region hints from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum HintSource {
    /// [`RegionHints::calibration`] on every frame.
    #[default]
    Calibration,
    /// The same caller-supplied rectangles on every frame.
    Fixed(RegionHints),
    /// [`RegionHints::from_pose`] of the previous frame; empty for the first.
    PreviousFrame,
    /// No rectangles.
    None,
}

impl HintSource {
    /// Hints for the first frame of a session.
    #[must_use]
    pub fn initial(&self) -> RegionHints {
        match self {
            Self::Calibration => RegionHints::calibration(),
            Self::Fixed(hints) => hints.clone(),
            Self::PreviousFrame | Self::None => RegionHints::empty(),
        }
    }

    /// Hints for the next frame, given the body keypoints just produced.
    #[must_use]
    pub fn next(&self, current: &RegionHints, keypoints: Option<&PoseKeypoints>) -> RegionHints {
        match self {
            Self::PreviousFrame => keypoints.map_or_else(RegionHints::empty, RegionHints::from_pose),
            _ => current.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joints::{KEYPOINT_DIMS, NUM_BODY_JOINTS};
    use ndarray::Array3;

    fn set(data: &mut Array3<f32>, joint: Joint, x: f32, y: f32) {
        data[[0, joint.index(), 0]] = x;
        data[[0, joint.index(), 1]] = y;
        data[[0, joint.index(), 2]] = 0.8;
    }

    #[test]
    fn test_calibration_layout() {
        let hints = RegionHints::calibration();
        assert_eq!(hints.faces.len(), 3);
        assert_eq!(hints.hands.len(), 3);
        assert_eq!(hints.hands[0][1], Rectangle::ZERO);
        assert!((hints.faces[2].width - 108.295_761).abs() < 1e-3);
    }

    #[test]
    fn test_from_pose_face_and_hands() {
        let mut data = Array3::zeros((1, NUM_BODY_JOINTS, KEYPOINT_DIMS));
        set(&mut data, Joint::Nose, 100.0, 50.0);
        set(&mut data, Joint::Neck, 100.0, 80.0);
        set(&mut data, Joint::LShoulder, 130.0, 80.0);
        set(&mut data, Joint::LElbow, 130.0, 120.0);
        set(&mut data, Joint::LWrist, 130.0, 150.0);
        let kp = PoseKeypoints::new(data).unwrap();

        let hints = RegionHints::from_pose(&kp);
        assert_eq!(hints.faces.len(), 1);
        assert_eq!(hints.faces[0], Rectangle::square_around(100.0, 50.0, 60.0));

        // forearm 30, upper arm 40 -> side 1.5 * 36 = 54, center 10px past wrist
        let left = hints.hands[0][0];
        assert!((left.width - 54.0).abs() < 1e-4);
        assert!((left.x + left.width / 2.0 - 130.0).abs() < 1e-4);
        assert!((left.y + left.height / 2.0 - 160.0).abs() < 1e-4);

        // right arm not detected
        assert!(hints.hands[0][1].is_empty());
    }

    #[test]
    fn test_hint_source_transitions() {
        let zeros = PoseKeypoints::zeros();

        let calibration = HintSource::Calibration;
        let first = calibration.initial();
        assert_eq!(calibration.next(&first, Some(&zeros)), first);

        let previous = HintSource::PreviousFrame;
        assert!(previous.initial().is_empty());
        let next = previous.next(&RegionHints::empty(), Some(&zeros));
        assert_eq!(next.faces, vec![Rectangle::ZERO]);
        assert!(previous.next(&next, None).is_empty());

        assert!(HintSource::None.initial().is_empty());
    }
}
