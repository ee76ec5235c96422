// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! The seam between the adapter and a pose-estimation engine.
//!
//! A [`Session`](crate::Session) never talks to a concrete engine directly;
//! it is handed something implementing [`PoseEngine`] at construction. Native
//! bindings implement the trait by forwarding to the library's wrapper
//! object, and [`JsonReplayEngine`] implements it over the engine's own
//! per-frame JSON output.

use std::path::PathBuf;

use ndarray::{Array1, Array3};

use crate::config::EngineParams;
use crate::error::Result;
use crate::region::{Rectangle, RegionHints};

pub mod replay;

pub use replay::JsonReplayEngine;

/// Per-frame exchange record between a session and an engine.
///
/// The session fills the input and hint fields; the engine fills the
/// outputs. Outputs left as `None` mean the engine produced nothing for that
/// field (for body keypoints: nobody was detected).
#[derive(Debug, Clone)]
pub struct Datum {
    /// Input frame, HWC with 3 channels.
    pub input: Array3<u8>,
    /// Face region per person.
    pub face_rectangles: Vec<Rectangle>,
    /// `[left, right]` hand regions per person.
    pub hand_rectangles: Vec<[Rectangle; 2]>,
    /// Output frame, rendered if rendering is on.
    pub output: Option<Array3<u8>>,
    /// Body keypoints (N, 25, 3).
    pub pose_keypoints: Option<Array3<f32>>,
    /// `[left, right]` hand keypoints, each (N, 21, 3).
    pub hand_keypoints: Option<[Array3<f32>; 2]>,
    /// Face keypoints (N, 70, 3).
    pub face_keypoints: Option<Array3<f32>>,
    /// Tracking id per person.
    pub pose_ids: Option<Array1<i64>>,
    /// Score per person.
    pub pose_scores: Option<Array1<f32>>,
}

impl Datum {
    /// Build an input datum from a frame and its region hints.
    #[must_use]
    pub fn new(input: Array3<u8>, hints: &RegionHints) -> Self {
        Self {
            input,
            face_rectangles: hints.faces.clone(),
            hand_rectangles: hints.hands.clone(),
            output: None,
            pose_keypoints: None,
            hand_keypoints: None,
            face_keypoints: None,
            pose_ids: None,
            pose_scores: None,
        }
    }
}

/// A pose-estimation engine driven one frame at a time.
///
/// Calls arrive in the order `configure`, `start`, any number of
/// `process`, then `stop`. Every call blocks until the engine is done.
pub trait PoseEngine {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// Model directory used when the session config does not name one.
    fn default_model_dir(&self) -> PathBuf;

    /// Apply engine flags. Called once, before `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if a flag is invalid for this engine.
    fn configure(&mut self, params: &EngineParams) -> Result<()>;

    /// Allocate and start the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot start (e.g. missing models).
    fn start(&mut self) -> Result<()>;

    /// Process one datum in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails on this frame.
    fn process(&mut self, datum: &mut Datum) -> Result<()>;

    /// Release the engine's resources.
    ///
    /// # Errors
    ///
    /// Returns an error if shutdown fails.
    fn stop(&mut self) -> Result<()>;
}

impl<E: PoseEngine + ?Sized> PoseEngine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn default_model_dir(&self) -> PathBuf {
        (**self).default_model_dir()
    }

    fn configure(&mut self, params: &EngineParams) -> Result<()> {
        (**self).configure(params)
    }

    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn process(&mut self, datum: &mut Datum) -> Result<()> {
        (**self).process(datum)
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }
}
