// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! BODY_25 joint layout.
//!
//! The engine writes body keypoints in a fixed slot order. Downstream
//! consumers index keypoint arrays with these slots, so the numbering here
//! must match the engine's output layout exactly.

use std::fmt;
use std::str::FromStr;

/// Number of body joints per person.
pub const NUM_BODY_JOINTS: usize = 25;

/// Number of keypoints per hand.
pub const NUM_HAND_JOINTS: usize = 21;

/// Number of face landmarks per person.
pub const NUM_FACE_JOINTS: usize = 70;

/// Values stored per keypoint: x, y, confidence.
pub const KEYPOINT_DIMS: usize = 3;

/// Named body landmarks and their fixed slot in the keypoint array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Joint {
    Nose = 0,
    Neck = 1,
    RShoulder = 2,
    RElbow = 3,
    RWrist = 4,
    LShoulder = 5,
    LElbow = 6,
    LWrist = 7,
    MidHip = 8,
    RHip = 9,
    RKnee = 10,
    RAnkle = 11,
    LHip = 12,
    LKnee = 13,
    LAnkle = 14,
    REye = 15,
    LEye = 16,
    REar = 17,
    LEar = 18,
    LBigToe = 19,
    LSmallToe = 20,
    LHeel = 21,
    RBigToe = 22,
    RSmallToe = 23,
    RHeel = 24,
}

impl Joint {
    /// All joints in slot order.
    pub const ALL: [Self; NUM_BODY_JOINTS] = [
        Self::Nose,
        Self::Neck,
        Self::RShoulder,
        Self::RElbow,
        Self::RWrist,
        Self::LShoulder,
        Self::LElbow,
        Self::LWrist,
        Self::MidHip,
        Self::RHip,
        Self::RKnee,
        Self::RAnkle,
        Self::LHip,
        Self::LKnee,
        Self::LAnkle,
        Self::REye,
        Self::LEye,
        Self::REar,
        Self::LEar,
        Self::LBigToe,
        Self::LSmallToe,
        Self::LHeel,
        Self::RBigToe,
        Self::RSmallToe,
        Self::RHeel,
    ];

    /// Slot of this joint in a person's keypoint rows.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up the joint stored at `index`.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < NUM_BODY_JOINTS {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Engine-style constant name, e.g. `OP_MIDHIP`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nose => "OP_NOSE",
            Self::Neck => "OP_NECK",
            Self::RShoulder => "OP_RSHOULDER",
            Self::RElbow => "OP_RELBOW",
            Self::RWrist => "OP_RWRIST",
            Self::LShoulder => "OP_LSHOULDER",
            Self::LElbow => "OP_LELBOW",
            Self::LWrist => "OP_LWRIST",
            Self::MidHip => "OP_MIDHIP",
            Self::RHip => "OP_RHIP",
            Self::RKnee => "OP_RKNEE",
            Self::RAnkle => "OP_RANKLE",
            Self::LHip => "OP_LHIP",
            Self::LKnee => "OP_LKNEE",
            Self::LAnkle => "OP_LANKLE",
            Self::REye => "OP_REYE",
            Self::LEye => "OP_LEYE",
            Self::REar => "OP_REAR",
            Self::LEar => "OP_LEAR",
            Self::LBigToe => "OP_LBIGTOE",
            Self::LSmallToe => "OP_LSMALLTOE",
            Self::LHeel => "OP_LHEEL",
            Self::RBigToe => "OP_RBIGTOE",
            Self::RSmallToe => "OP_RSMALLTOE",
            Self::RHeel => "OP_RHEEL",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Joint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        let wanted = if upper.starts_with("OP_") {
            upper
        } else {
            format!("OP_{upper}")
        };
        Self::ALL
            .iter()
            .copied()
            .find(|joint| joint.as_str() == wanted)
            .ok_or_else(|| format!("Unknown joint: {s}"))
    }
}

/// Limb pairs drawn for the BODY_25 skeleton.
pub const BODY_25_PAIRS: [[usize; 2]; 24] = [
    [1, 8],   // neck to mid hip
    [1, 2],   // neck to right shoulder
    [1, 5],   // neck to left shoulder
    [2, 3],   // right upper arm
    [3, 4],   // right forearm
    [5, 6],   // left upper arm
    [6, 7],   // left forearm
    [8, 9],   // mid hip to right hip
    [9, 10],  // right thigh
    [10, 11], // right shin
    [8, 12],  // mid hip to left hip
    [12, 13], // left thigh
    [13, 14], // left shin
    [1, 0],   // neck to nose
    [0, 15],  // nose to right eye
    [15, 17], // right eye to right ear
    [0, 16],  // nose to left eye
    [16, 18], // left eye to left ear
    [14, 19], // left ankle to big toe
    [19, 20], // left big toe to small toe
    [14, 21], // left ankle to heel
    [11, 22], // right ankle to big toe
    [22, 23], // right big toe to small toe
    [11, 24], // right ankle to heel
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_slots() {
        assert_eq!(Joint::Nose.index(), 0);
        assert_eq!(Joint::Neck.index(), 1);
        assert_eq!(Joint::MidHip.index(), 8);
        assert_eq!(Joint::LBigToe.index(), 19);
        assert_eq!(Joint::RHeel.index(), 24);
    }

    #[test]
    fn test_all_is_in_slot_order() {
        for (i, joint) in Joint::ALL.iter().enumerate() {
            assert_eq!(joint.index(), i);
            assert_eq!(Joint::from_index(i), Some(*joint));
        }
        assert_eq!(Joint::from_index(NUM_BODY_JOINTS), None);
    }

    #[test]
    fn test_joint_from_str() {
        assert_eq!("OP_NOSE".parse::<Joint>().unwrap(), Joint::Nose);
        assert_eq!("midhip".parse::<Joint>().unwrap(), Joint::MidHip);
        assert!("OP_TAIL".parse::<Joint>().is_err());
    }

    #[test]
    fn test_pairs_reference_valid_slots() {
        for [a, b] in BODY_25_PAIRS {
            assert!(a < NUM_BODY_JOINTS);
            assert!(b < NUM_BODY_JOINTS);
        }
    }
}
