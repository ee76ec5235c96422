// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! A configured, running engine and the per-frame call into it.

use ndarray::{Array1, Array3};

use crate::config::{EngineParams, SessionConfig};
use crate::engine::{Datum, PoseEngine};
use crate::error::{PoseError, Result};
use crate::region::{HintSource, RegionHints};
use crate::results::{FaceKeypoints, FrameResult, HandKeypoints, PoseKeypoints};
use crate::utils::frame_dims;
use crate::{verbose, warn};

/// One engine instance configured and started for frame processing.
///
/// A session is created running, processes frames through
/// [`process_frame`](Self::process_frame), and is finished with
/// [`stop`](Self::stop). Once stopped it rejects further frames. Dropping a
/// session that is still running stops its engine.
///
/// # Example
///
/// ```no_run
/// use ndarray::Array3;
/// use openpose_adapter::{JsonReplayEngine, Session, SessionConfig};
///
/// # fn main() -> openpose_adapter::Result<()> {
/// let engine = JsonReplayEngine::new("recorded_json/");
/// let mut session = Session::new(engine, SessionConfig::new().with_max_people(1))?;
/// let frame = Array3::<u8>::zeros((480, 640, 3));
/// let result = session.process_frame(&frame)?;
/// println!("{} people", result.num_people());
/// session.stop()?;
/// # Ok(())
/// # }
/// ```
pub struct Session<E: PoseEngine> {
    engine: E,
    config: SessionConfig,
    params: EngineParams,
    hints: RegionHints,
    frames_processed: usize,
    running: bool,
}

impl<E: PoseEngine> Session<E> {
    /// Configure and start `engine` with `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::EngineError`] if the engine rejects its
    /// parameters or fails to start.
    pub fn new(mut engine: E, config: SessionConfig) -> Result<Self> {
        let params = config.to_params(&engine.default_model_dir());
        verbose!("Starting {} engine: {params}", engine.name());

        engine.configure(&params).map_err(into_engine_error)?;
        engine.start().map_err(into_engine_error)?;

        if (config.hand || config.face) && config.hints == HintSource::Calibration {
            warn!(
                "Using fixed calibration rectangles as face/hand hints; they are not derived from the input frames."
            );
        }

        let hints = config.hints.initial();
        Ok(Self {
            engine,
            config,
            params,
            hints,
            frames_processed: 0,
            running: true,
        })
    }

    /// Run the engine on one HWC color frame.
    ///
    /// Always returns a result when the engine succeeds, including frames
    /// with nobody in them (`keypoints` is then `None`).
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::SessionStopped`] after [`stop`](Self::stop),
    /// an image error for a frame that is not 3-channel HWC, or whatever the
    /// engine reports for this frame.
    pub fn process_frame(&mut self, frame: &Array3<u8>) -> Result<FrameResult> {
        if !self.running {
            return Err(PoseError::SessionStopped);
        }
        frame_dims(frame)?;

        let mut datum = Datum::new(frame.clone(), &self.hints);
        self.engine.process(&mut datum)?;
        self.frames_processed += 1;

        let result = self.collect(datum)?;
        self.hints = self.config.hints.next(&self.hints, result.keypoints.as_ref());
        Ok(result)
    }

    /// Turn an engine datum into a result with explicit optional parts.
    fn collect(&self, datum: Datum) -> Result<FrameResult> {
        let keypoints = datum
            .pose_keypoints
            .filter(|k| k.shape()[0] > 0)
            .map(PoseKeypoints::new)
            .transpose()?;

        let hands = if self.config.hand {
            Some(match datum.hand_keypoints {
                Some([left, right]) => HandKeypoints::new(left, right)?,
                None => HandKeypoints::empty(),
            })
        } else {
            None
        };

        let face = if self.config.face {
            Some(match datum.face_keypoints {
                Some(data) => FaceKeypoints::new(data)?,
                None => FaceKeypoints::empty(),
            })
        } else {
            None
        };

        Ok(FrameResult {
            image: Some(datum.output.unwrap_or(datum.input)),
            keypoints,
            hands,
            face,
            pose_ids: datum.pose_ids.unwrap_or_else(|| Array1::zeros(0)),
            pose_scores: datum.pose_scores.unwrap_or_else(|| Array1::zeros(0)),
        })
    }

    /// Stop the engine. Stopping twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to shut down.
    pub fn stop(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        verbose!(
            "Stopping {} engine after {} frames",
            self.engine.name(),
            self.frames_processed
        );
        self.engine.stop()
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub const fn frames_processed(&self) -> usize {
        self.frames_processed
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Flags the engine was configured with.
    #[must_use]
    pub const fn params(&self) -> &EngineParams {
        &self.params
    }

    /// Hints that will accompany the next frame.
    #[must_use]
    pub const fn hints(&self) -> &RegionHints {
        &self.hints
    }

    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: PoseEngine> Drop for Session<E> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop engine: {e}");
        }
    }
}

fn into_engine_error(err: PoseError) -> PoseError {
    match err {
        PoseError::EngineError(_) => err,
        other => PoseError::EngineError(other.to_string()),
    }
}
