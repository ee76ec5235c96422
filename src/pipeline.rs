// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Driving a session over a stream of frames, and writing records back out.

use crate::engine::PoseEngine;
use crate::error::{PoseError, Result};
use crate::io::{FrameSink, FrameSource};
use crate::progress::FrameProgress;
use crate::results::{FrameResult, PoseKeypoints};
use crate::session::Session;
use crate::utils::{count_label, frame_dims};
use crate::{verbose, warn};

#[cfg(feature = "video")]
use std::path::Path;

#[cfg(feature = "video")]
use crate::io::{VideoFileSink, VideoReader};

/// Frame rate used by [`write_video`] when the caller has none.
pub const DEFAULT_WRITE_FPS: f32 = 30.0;

/// What to keep from each processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Body keypoints only, zero-filled for empty frames.
    KeypointsOnly,
    /// The full [`FrameResult`] per frame.
    #[default]
    FullRecords,
}

impl From<bool> for ParseMode {
    /// `true` selects [`ParseMode::KeypointsOnly`].
    fn from(keypoints_only: bool) -> Self {
        if keypoints_only {
            Self::KeypointsOnly
        } else {
            Self::FullRecords
        }
    }
}

/// Per-frame output of a parse, in frame order.
#[derive(Debug, Clone)]
pub enum ParsedVideo {
    Keypoints(Vec<PoseKeypoints>),
    Records(Vec<FrameResult>),
}

impl ParsedVideo {
    /// Number of frames parsed.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Keypoints(k) => k.len(),
            Self::Records(r) => r.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Body keypoints per frame, whichever mode produced them.
    #[must_use]
    pub fn into_keypoints(self) -> Vec<PoseKeypoints> {
        match self {
            Self::Keypoints(k) => k,
            Self::Records(r) => r.into_iter().map(FrameResult::into_keypoints).collect(),
        }
    }

    /// Full records, if the parse kept them.
    #[must_use]
    pub fn records(&self) -> Option<&[FrameResult]> {
        match self {
            Self::Keypoints(_) => None,
            Self::Records(r) => Some(r),
        }
    }
}

/// Run every frame of `source` through `session`.
///
/// In [`ParseMode::FullRecords`] with a `sink`, the sink is opened with the
/// first frame's size and the source frame rate, each output image is moved
/// from its record into the sink, and the sink is finished at the end. The
/// sink is never opened when the source yields no frames. A sink passed in
/// keypoints-only mode is ignored.
///
/// The session is stopped once the source is exhausted, and also when a
/// frame fails.
///
/// # Errors
///
/// Returns the first error from the source, the session or the sink.
pub fn parse_frames<E: PoseEngine>(
    session: &mut Session<E>,
    source: &mut dyn FrameSource,
    mode: ParseMode,
    mut sink: Option<&mut dyn FrameSink>,
) -> Result<ParsedVideo> {
    if mode == ParseMode::KeypointsOnly && sink.is_some() {
        warn!("Output video ignored in keypoints-only mode");
        sink = None;
    }

    let parsed = drive(session, source, mode, sink.as_deref_mut());
    let stopped = session.stop();
    let parsed = parsed?;
    stopped?;

    if let Some(sink) = sink
        && sink.is_open()
    {
        sink.finish()?;
    }
    Ok(parsed)
}

fn drive<'s, E: PoseEngine>(
    session: &mut Session<E>,
    source: &mut dyn FrameSource,
    mode: ParseMode,
    mut sink: Option<&mut (dyn FrameSink + 's)>,
) -> Result<ParsedVideo> {
    let fps = source.fps();
    let capacity = source.total_frames().unwrap_or(0);

    match mode {
        ParseMode::KeypointsOnly => {
            let mut keypoints = Vec::with_capacity(capacity);
            while let Some(frame) = source.next_frame()? {
                let result = session.process_frame(&frame)?;
                verbose!(
                    "frame {}: {}",
                    keypoints.len(),
                    count_label(result.num_people(), "person")
                );
                keypoints.push(result.into_keypoints());
            }
            Ok(ParsedVideo::Keypoints(keypoints))
        }
        ParseMode::FullRecords => {
            let mut records = Vec::with_capacity(capacity);
            while let Some(frame) = source.next_frame()? {
                let mut result = session.process_frame(&frame)?;
                verbose!(
                    "frame {}: {}",
                    records.len(),
                    count_label(result.num_people(), "person")
                );

                if let Some(sink) = sink.as_deref_mut() {
                    if !sink.is_open() {
                        let (height, width) = frame_dims(&frame)?;
                        sink.open(width, height, fps)?;
                    }
                    let image = result.take_image().unwrap_or(frame);
                    sink.write_frame(&image)?;
                }
                records.push(result);
            }
            Ok(ParsedVideo::Records(records))
        }
    }
}

/// Parse the video at `video_path` with `session`.
///
/// With `keypoints_only` the result holds one [`PoseKeypoints`] per frame.
/// Otherwise it holds full records, and when `out_path` is given the output
/// images are written there as an MP4 instead of being kept.
///
/// `out_path` is ignored with a warning when `keypoints_only` is set; no
/// video file is created in that case.
///
/// # Errors
///
/// Returns an error if the video cannot be opened or any frame fails.
#[cfg(feature = "video")]
pub fn parse_video<E: PoseEngine>(
    session: &mut Session<E>,
    video_path: &Path,
    keypoints_only: bool,
    out_path: Option<&Path>,
) -> Result<ParsedVideo> {
    let mut reader = VideoReader::open(video_path)?;
    verbose!(
        "Parsing {} at {:.2} fps",
        video_path.display(),
        reader.fps()
    );

    let mut sink = out_path.map(VideoFileSink::new);
    let parsed = parse_frames(
        session,
        &mut reader,
        ParseMode::from(keypoints_only),
        sink.as_mut().map(|s| s as &mut dyn FrameSink),
    )?;

    if let Some(sink) = &sink
        && sink.is_open()
    {
        verbose!("Output video saved to {}", sink.path().display());
    }
    Ok(parsed)
}

/// Write the image of every record to `sink`, in order.
///
/// The sink is opened with the first record's size. Returns the number of
/// frames written.
///
/// # Errors
///
/// Returns [`PoseError::EmptyResults`] for an empty slice and
/// [`PoseError::VideoError`] if a record has no image.
pub fn write_frames(sink: &mut dyn FrameSink, results: &[FrameResult], fps: f32) -> Result<usize> {
    let (height, width) = first_dims(results)?;
    sink.open(width, height, fps)?;

    let mut progress = FrameProgress::new("Writing video", results.len());
    for (i, result) in results.iter().enumerate() {
        let image = result
            .image
            .as_ref()
            .ok_or_else(|| PoseError::VideoError(format!("Record {i} has no image")))?;
        sink.write_frame(image)?;
        progress.inc();
    }
    progress.finish();

    sink.finish()?;
    Ok(results.len())
}

fn first_dims(results: &[FrameResult]) -> Result<(usize, usize)> {
    let first = results.first().ok_or(PoseError::EmptyResults)?;
    first
        .image_shape()
        .ok_or_else(|| PoseError::VideoError("Record 0 has no image".to_string()))
}

/// Write the images of `results` to an MP4 at `out_path`.
///
/// # Errors
///
/// See [`write_frames`]; encoder failures are reported as video errors.
#[cfg(feature = "video")]
pub fn write_video(out_path: &Path, results: &[FrameResult], fps: f32) -> Result<()> {
    let (height, width) = first_dims(results)?;
    verbose!(
        "Writing {} ({width}x{height}) to {}",
        count_label(results.len(), "frame"),
        out_path.display()
    );

    let mut sink = VideoFileSink::new(out_path);
    write_frames(&mut sink, results, fps)?;
    crate::success!("Video saved to {}", out_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineParams, SessionConfig};
    use crate::engine::Datum;
    use crate::io::{MemorySink, MemorySource};
    use crate::joints::{KEYPOINT_DIMS, NUM_BODY_JOINTS};
    use crate::region::HintSource;
    use ndarray::{Array1, Array3};
    use std::path::PathBuf;

    /// Sees a person on every third frame, at x = frame index.
    struct EveryThird {
        frame: usize,
    }

    impl PoseEngine for EveryThird {
        fn name(&self) -> &str {
            "every-third"
        }

        fn default_model_dir(&self) -> PathBuf {
            PathBuf::from("models")
        }

        fn configure(&mut self, _params: &EngineParams) -> Result<()> {
            Ok(())
        }

        fn start(&mut self) -> Result<()> {
            Ok(())
        }

        #[allow(clippy::cast_precision_loss)]
        fn process(&mut self, datum: &mut Datum) -> Result<()> {
            if self.frame % 3 == 0 {
                let mut kp = Array3::zeros((1, NUM_BODY_JOINTS, KEYPOINT_DIMS));
                kp[[0, 0, 0]] = self.frame as f32;
                kp[[0, 0, 2]] = 1.0;
                datum.pose_keypoints = Some(kp);
                datum.pose_ids = Some(Array1::from_vec(vec![-1]));
                datum.pose_scores = Some(Array1::from_vec(vec![1.0]));
            }
            self.frame += 1;
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn session() -> Session<EveryThird> {
        let config = SessionConfig::new().with_hints(HintSource::None);
        Session::new(EveryThird { frame: 0 }, config).unwrap()
    }

    fn frames(n: usize) -> MemorySource {
        MemorySource::new(vec![Array3::zeros((6, 10, 3)); n], 12.0)
    }

    #[test]
    fn test_keypoints_only_in_order() {
        let mut session = session();
        let parsed =
            parse_frames(&mut session, &mut frames(5), ParseMode::KeypointsOnly, None).unwrap();
        assert!(!session.is_running());

        let keypoints = parsed.into_keypoints();
        assert_eq!(keypoints.len(), 5);
        assert!((keypoints[3].data[[0, 0, 0]] - 3.0).abs() < f32::EPSILON);
        assert!(keypoints[1].is_all_zero());
        assert_eq!(keypoints[1].person(0).shape(), &[25, 3]);
    }

    #[test]
    fn test_keypoints_only_ignores_sink() {
        let mut session = session();
        let mut sink = MemorySink::new();
        let parsed = parse_frames(
            &mut session,
            &mut frames(2),
            ParseMode::KeypointsOnly,
            Some(&mut sink),
        )
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(!sink.is_open());
        assert!(sink.frames.is_empty());
    }

    #[test]
    fn test_records_stream_images_to_sink() {
        let mut session = session();
        let mut sink = MemorySink::new();
        let parsed = parse_frames(
            &mut session,
            &mut frames(4),
            ParseMode::FullRecords,
            Some(&mut sink),
        )
        .unwrap();

        assert_eq!(sink.frames.len(), 4);
        assert_eq!(sink.size, Some((10, 6)));
        assert_eq!(sink.fps, Some(12.0));
        assert!(sink.finished);

        let records = parsed.records().unwrap();
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.image.is_none()));
        assert_eq!(records[0].num_people(), 1);
        assert_eq!(records[1].num_people(), 0);
    }

    #[test]
    fn test_records_keep_images_without_sink() {
        let mut session = session();
        let parsed =
            parse_frames(&mut session, &mut frames(3), ParseMode::FullRecords, None).unwrap();
        let records = parsed.records().unwrap();
        assert!(records.iter().all(|r| r.image_shape() == Some((6, 10))));
    }

    #[test]
    fn test_zero_frames() {
        let mut session = session();
        let mut sink = MemorySink::new();
        let parsed = parse_frames(
            &mut session,
            &mut frames(0),
            ParseMode::FullRecords,
            Some(&mut sink),
        )
        .unwrap();
        assert!(parsed.is_empty());
        assert!(!sink.is_open());
        assert!(!sink.finished);
        assert!(!session.is_running());
    }

    #[test]
    fn test_failed_frame_stops_session() {
        let mut session = session();
        let mut source = MemorySource::new(
            vec![Array3::zeros((6, 10, 3)), Array3::zeros((6, 10, 1))],
            12.0,
        );
        let err =
            parse_frames(&mut session, &mut source, ParseMode::FullRecords, None).unwrap_err();
        assert!(matches!(err, PoseError::ImageError(_)));
        assert!(!session.is_running());
    }

    #[test]
    fn test_write_frames_counts() {
        let mut session = session();
        let parsed =
            parse_frames(&mut session, &mut frames(3), ParseMode::FullRecords, None).unwrap();
        let mut sink = MemorySink::new();
        let written = write_frames(&mut sink, parsed.records().unwrap(), 24.0).unwrap();
        assert_eq!(written, 3);
        assert_eq!(sink.frames.len(), 3);
        assert_eq!(sink.fps, Some(24.0));
        assert!(sink.finished);
    }

    #[test]
    fn test_write_frames_rejects_empty_and_stripped() {
        let mut sink = MemorySink::new();
        assert!(matches!(
            write_frames(&mut sink, &[], DEFAULT_WRITE_FPS),
            Err(PoseError::EmptyResults)
        ));

        let mut session = session();
        let parsed =
            parse_frames(&mut session, &mut frames(2), ParseMode::FullRecords, None).unwrap();
        let mut records = parsed.records().unwrap().to_vec();
        records[1].take_image();
        assert!(matches!(
            write_frames(&mut sink, &records, DEFAULT_WRITE_FPS),
            Err(PoseError::VideoError(_))
        ));
    }

    #[test]
    fn test_parse_mode_from_flag() {
        assert_eq!(ParseMode::from(true), ParseMode::KeypointsOnly);
        assert_eq!(ParseMode::from(false), ParseMode::FullRecords);
    }
}
