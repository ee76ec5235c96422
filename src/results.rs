// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Per-frame results produced by a [`Session`](crate::Session).
//!
//! Optional outputs are explicit fields rather than keys that may or may not
//! exist: `hands` is `Some` exactly when hand detection is enabled and `face`
//! exactly when face detection is enabled, while `pose_ids` and
//! `pose_scores` are always filled.

use ndarray::{Array1, Array2, Array3, ArrayView2, Axis, s};

use crate::error::{PoseError, Result};
use crate::joints::{Joint, KEYPOINT_DIMS, NUM_BODY_JOINTS, NUM_FACE_JOINTS, NUM_HAND_JOINTS};

/// Check that `data` has shape (N, `joints`, 3).
fn check_shape(data: &Array3<f32>, joints: usize, what: &str) -> Result<()> {
    let shape = data.shape();
    if shape[1] != joints || shape[2] != KEYPOINT_DIMS {
        return Err(PoseError::ProcessError(format!(
            "{what} keypoints have shape {shape:?}, expected (N, {joints}, {KEYPOINT_DIMS})"
        )));
    }
    Ok(())
}

/// Body keypoints for every detected person.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseKeypoints {
    /// Raw keypoint data with shape (N, 25, 3): x, y, confidence.
    pub data: Array3<f32>,
}

impl PoseKeypoints {
    /// Wrap an engine keypoint array.
    ///
    /// # Errors
    ///
    /// Returns an error if the array is not shaped (N, 25, 3).
    pub fn new(data: Array3<f32>) -> Result<Self> {
        check_shape(&data, NUM_BODY_JOINTS, "Body")?;
        Ok(Self { data })
    }

    /// Placeholder for a frame where nobody was detected: a single person
    /// whose 25 joints are all zero.
    #[must_use]
    pub fn zeros() -> Self {
        Self {
            data: Array3::zeros((1, NUM_BODY_JOINTS, KEYPOINT_DIMS)),
        }
    }

    /// Number of people.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.shape()[0]
    }

    /// Check if there are no people.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if every value is zero.
    #[must_use]
    pub fn is_all_zero(&self) -> bool {
        self.data.iter().all(|v| *v == 0.0)
    }

    /// The 25x3 rows of one person.
    ///
    /// # Panics
    ///
    /// Panics if `person` is out of range.
    #[must_use]
    pub fn person(&self, person: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), person)
    }

    /// `[x, y, confidence]` of one joint, or `None` if `person` is out of range.
    #[must_use]
    pub fn joint(&self, person: usize, joint: Joint) -> Option<[f32; 3]> {
        if person >= self.len() {
            return None;
        }
        let i = joint.index();
        Some([
            self.data[[person, i, 0]],
            self.data[[person, i, 1]],
            self.data[[person, i, 2]],
        ])
    }

    /// xy coordinates with shape (N, 25, 2).
    #[must_use]
    pub fn xy(&self) -> Array3<f32> {
        self.data.slice(s![.., .., 0..2]).to_owned()
    }

    /// Confidences with shape (N, 25).
    #[must_use]
    pub fn conf(&self) -> Array2<f32> {
        self.data.slice(s![.., .., 2]).to_owned()
    }

    /// Mean joint confidence per person.
    #[must_use]
    pub fn mean_conf(&self) -> Array1<f32> {
        self.conf()
            .mean_axis(Axis(1))
            .unwrap_or_else(|| Array1::zeros(self.len()))
    }

    /// Nested `person -> joint -> [x, y, confidence]` rows.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<[f32; 3]>> {
        self.data
            .outer_iter()
            .map(|person| {
                person
                    .outer_iter()
                    .map(|row| [row[0], row[1], row[2]])
                    .collect()
            })
            .collect()
    }
}

/// Left and right hand keypoints, each with shape (N, 21, 3).
#[derive(Debug, Clone, PartialEq)]
pub struct HandKeypoints {
    pub left: Array3<f32>,
    pub right: Array3<f32>,
}

impl HandKeypoints {
    /// Wrap engine hand arrays.
    ///
    /// # Errors
    ///
    /// Returns an error if either side is not shaped (N, 21, 3).
    pub fn new(left: Array3<f32>, right: Array3<f32>) -> Result<Self> {
        check_shape(&left, NUM_HAND_JOINTS, "Left hand")?;
        check_shape(&right, NUM_HAND_JOINTS, "Right hand")?;
        Ok(Self { left, right })
    }

    /// Hands for zero people.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            left: Array3::zeros((0, NUM_HAND_JOINTS, KEYPOINT_DIMS)),
            right: Array3::zeros((0, NUM_HAND_JOINTS, KEYPOINT_DIMS)),
        }
    }
}

/// Face landmarks with shape (N, 70, 3).
#[derive(Debug, Clone, PartialEq)]
pub struct FaceKeypoints {
    pub data: Array3<f32>,
}

impl FaceKeypoints {
    /// Wrap an engine face array.
    ///
    /// # Errors
    ///
    /// Returns an error if the array is not shaped (N, 70, 3).
    pub fn new(data: Array3<f32>) -> Result<Self> {
        check_shape(&data, NUM_FACE_JOINTS, "Face")?;
        Ok(Self { data })
    }

    /// Face landmarks for zero people.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            data: Array3::zeros((0, NUM_FACE_JOINTS, KEYPOINT_DIMS)),
        }
    }
}

/// Everything the engine returned for one frame.
#[derive(Debug, Clone)]
pub struct FrameResult {
    /// Output image as HWC array, annotated when rendering is on.
    ///
    /// `None` once the image has been moved out, e.g. into a video sink.
    pub image: Option<Array3<u8>>,
    /// Body keypoints, `None` when nobody was detected.
    pub keypoints: Option<PoseKeypoints>,
    /// Hand keypoints, present iff hand detection is enabled.
    pub hands: Option<HandKeypoints>,
    /// Face landmarks, present iff face detection is enabled.
    pub face: Option<FaceKeypoints>,
    /// Tracking id per person (-1 when tracking is off).
    pub pose_ids: Array1<i64>,
    /// Score per person.
    pub pose_scores: Array1<f32>,
}

impl FrameResult {
    /// Number of people detected.
    #[must_use]
    pub fn num_people(&self) -> usize {
        self.keypoints.as_ref().map_or(0, PoseKeypoints::len)
    }

    /// Body keypoints, substituting [`PoseKeypoints::zeros`] when nobody was
    /// detected.
    #[must_use]
    pub fn keypoints_or_zeros(&self) -> PoseKeypoints {
        self.keypoints.clone().unwrap_or_else(PoseKeypoints::zeros)
    }

    /// Consume the result, keeping only normalized body keypoints.
    #[must_use]
    pub fn into_keypoints(self) -> PoseKeypoints {
        self.keypoints.unwrap_or_else(PoseKeypoints::zeros)
    }

    /// Move the image out of the record.
    pub fn take_image(&mut self) -> Option<Array3<u8>> {
        self.image.take()
    }

    /// Image dimensions (height, width), if the image is still attached.
    #[must_use]
    pub fn image_shape(&self) -> Option<(usize, usize)> {
        self.image.as_ref().map(|im| (im.shape()[0], im.shape()[1]))
    }
}
