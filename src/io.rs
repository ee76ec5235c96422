// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame sources and sinks, including video decoding and encoding.
//!
//! The frame loop only sees [`FrameSource`] and [`FrameSink`]. Video files go
//! through [`VideoReader`] and [`VideoFileSink`] (feature `video`), and
//! in-memory frames through [`MemorySource`] and [`MemorySink`].

use std::collections::VecDeque;

use ndarray::{Array3, s};

use crate::error::{PoseError, Result};
use crate::utils::frame_dims;

#[cfg(feature = "video")]
use video_rs::{Encoder, Time, decode::Decoder, encode::Settings as EncoderSettings};

#[cfg(feature = "video")]
use std::path::{Path, PathBuf};

#[cfg(feature = "video")]
use std::sync::Once;

#[cfg(feature = "video")]
static INIT: Once = Once::new();

/// Frame rate used when a source does not report one.
pub const DEFAULT_FPS: f32 = 30.0;

/// Initialize global video logging configuration.
///
/// ensuring `video-rs` is initialized and `FFmpeg` logs are silenced
/// (only errors are shown). safe to call multiple times.
#[allow(clippy::missing_const_for_fn)]
pub fn init_logging() {
    #[cfg(feature = "video")]
    INIT.call_once(|| {
        if let Err(e) = video_rs::init() {
            crate::warn!("Failed to initialize video-rs: {e}");
        }

        ffmpeg_next::log::set_level(ffmpeg_next::log::Level::Error);
    });
}

/// Sequential supplier of HWC RGB frames.
pub trait FrameSource {
    /// Frames per second of the source.
    fn fps(&self) -> f32;

    /// Frame count if known up front.
    fn total_frames(&self) -> Option<usize> {
        None
    }

    /// Next frame, or `None` once the source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if a frame cannot be converted.
    fn next_frame(&mut self) -> Result<Option<Array3<u8>>>;
}

/// Destination for HWC RGB frames, opened lazily with the first frame's size.
pub trait FrameSink {
    /// Prepare the sink for frames of `width` x `height` at `fps`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot be created.
    fn open(&mut self, width: usize, height: usize, fps: f32) -> Result<()>;

    /// Whether [`open`](Self::open) has succeeded.
    fn is_open(&self) -> bool;

    /// Append one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink is not open or the frame does not fit.
    fn write_frame(&mut self, frame: &Array3<u8>) -> Result<()>;

    /// Flush and close the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn finish(&mut self) -> Result<()>;
}

/// Frames held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    frames: VecDeque<Array3<u8>>,
    total: usize,
    fps: f32,
}

impl MemorySource {
    #[must_use]
    pub fn new(frames: Vec<Array3<u8>>, fps: f32) -> Self {
        Self {
            total: frames.len(),
            frames: frames.into(),
            fps,
        }
    }
}

impl FrameSource for MemorySource {
    fn fps(&self) -> f32 {
        self.fps
    }

    fn total_frames(&self) -> Option<usize> {
        Some(self.total)
    }

    fn next_frame(&mut self) -> Result<Option<Array3<u8>>> {
        Ok(self.frames.pop_front())
    }
}

/// Collects written frames in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Frames written so far.
    pub frames: Vec<Array3<u8>>,
    /// (width, height) given to `open`.
    pub size: Option<(usize, usize)>,
    /// Frame rate given to `open`.
    pub fps: Option<f32>,
    /// Whether `finish` was called.
    pub finished: bool,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for MemorySink {
    fn open(&mut self, width: usize, height: usize, fps: f32) -> Result<()> {
        self.size = Some((width, height));
        self.fps = Some(fps);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.size.is_some()
    }

    fn write_frame(&mut self, frame: &Array3<u8>) -> Result<()> {
        let Some(size) = self.size else {
            return Err(PoseError::VideoError("Sink is not open".to_string()));
        };
        check_size(frame, size)?;
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Reject frames whose size differs from the sink's (width, height).
fn check_size(frame: &Array3<u8>, (width, height): (usize, usize)) -> Result<()> {
    let (h, w) = frame_dims(frame)?;
    if w != width || h != height {
        return Err(PoseError::VideoError(format!(
            "Frame dimensions {w}x{h} do not match video dimensions {width}x{height}"
        )));
    }
    Ok(())
}

/// Size (width, height) rounded up to even values, as yuv420p requires.
#[cfg_attr(not(feature = "video"), allow(dead_code))]
const fn even_size(width: usize, height: usize) -> (usize, usize) {
    (width + width % 2, height + height % 2)
}

/// Copy `frame` into a `width` x `height` buffer, repeating its last
/// column and row into the extra space.
///
/// `width` and `height` must be at least the frame's own size.
#[cfg_attr(not(feature = "video"), allow(dead_code))]
fn pad_frame(frame: &Array3<u8>, width: usize, height: usize) -> Array3<u8> {
    let (h, w, c) = frame.dim();
    let mut padded = Array3::zeros((height, width, c));
    padded.slice_mut(s![..h, ..w, ..]).assign(frame);
    if width > w {
        let last_col = padded.slice(s![..h, w - 1..w, ..]).to_owned();
        for x in w..width {
            padded.slice_mut(s![..h, x..=x, ..]).assign(&last_col);
        }
    }
    if height > h {
        let last_row = padded.slice(s![h - 1..h, .., ..]).to_owned();
        for y in h..height {
            padded.slice_mut(s![y..=y, .., ..]).assign(&last_row);
        }
    }
    padded
}

/// Decodes a video file frame by frame.
#[cfg(feature = "video")]
pub struct VideoReader {
    decoder: Decoder,
    path: PathBuf,
    fps: f32,
    total_frames: Option<usize>,
}

#[cfg(feature = "video")]
impl VideoReader {
    /// Open `path` for decoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        init_logging();
        let path = path.as_ref().to_path_buf();
        let decoder = Decoder::new(path.as_path()).map_err(|e| {
            PoseError::VideoError(format!("Failed to open {}: {e}", path.display()))
        })?;

        let reported = decoder.frame_rate();
        let fps = if reported.is_finite() && reported > 0.0 {
            reported
        } else {
            DEFAULT_FPS
        };

        // Estimated from duration; containers do not always store a count.
        let total_frames = decoder.duration().ok().map(|duration| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                (duration.as_secs_f64() * f64::from(fps)) as usize
            }
        });

        Ok(Self {
            decoder,
            path,
            fps,
            total_frames,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(feature = "video")]
impl FrameSource for VideoReader {
    fn fps(&self) -> f32 {
        self.fps
    }

    fn total_frames(&self) -> Option<usize> {
        self.total_frames
    }

    fn next_frame(&mut self) -> Result<Option<Array3<u8>>> {
        match self.decoder.decode() {
            Ok((_ts, frame)) => Ok(Some(frame)),
            Err(video_rs::Error::ReadExhausted | video_rs::Error::DecodeExhausted) => Ok(None),
            Err(e) => {
                // A failed read ends the stream, as with exhaustion.
                crate::warn!("Stopped reading {}: {e}", self.path.display());
                Ok(None)
            }
        }
    }
}

/// H.264 MP4 writer over the `video-rs` encoder.
///
/// yuv420p needs even dimensions, so frames with an odd width or height are
/// padded by one column or row (a copy of the last one) before encoding. The
/// decoded video is then at most one pixel wider and taller than the input.
#[cfg(feature = "video")]
pub struct VideoWriter {
    encoder: Encoder,
    frame_duration: Time,
    position: Time,
    width: usize,
    height: usize,
    encoded: (usize, usize),
    frames_written: usize,
}

#[cfg(feature = "video")]
impl VideoWriter {
    /// Open `path` for `width` x `height` frames at `fps`, creating missing
    /// parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive frame rate or if the encoder
    /// cannot be initialized.
    pub fn new<P: AsRef<Path>>(path: P, width: usize, height: usize, fps: f32) -> Result<Self> {
        init_logging();
        let output_path = path.as_ref().to_path_buf();

        if !(fps.is_finite() && fps > 0.0) {
            return Err(PoseError::ConfigError(format!("Invalid frame rate: {fps}")));
        }

        if let Some(parent) = output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                PoseError::IoError(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let encoded = even_size(width, height);
        if encoded != (width, height) {
            crate::verbose!(
                "Padding {width}x{height} frames to {}x{} for encoding",
                encoded.0,
                encoded.1
            );
        }

        let settings = EncoderSettings::preset_h264_yuv420p(encoded.0, encoded.1, false);
        let encoder = Encoder::new(output_path.as_path(), settings).map_err(|e| {
            PoseError::VideoError(format!("Failed to create video encoder: {e}"))
        })?;

        let frame_duration = Time::from_secs_f64(1.0 / f64::from(fps));

        Ok(Self {
            encoder,
            frame_duration,
            position: Time::zero(),
            width,
            height,
            encoded,
            frames_written: 0,
        })
    }

    /// Write a frame to the video.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or frame dimensions don't match.
    pub fn write_frame(&mut self, frame: &Array3<u8>) -> Result<()> {
        check_size(frame, (self.width, self.height))?;

        let frame = if self.encoded == (self.width, self.height) {
            frame.as_standard_layout().into_owned()
        } else {
            pad_frame(frame, self.encoded.0, self.encoded.1)
        };
        self.encoder
            .encode(&frame, self.position)
            .map_err(|e| PoseError::VideoError(format!("Failed to encode frame: {e}")))?;

        self.position = self.position.aligned_with(self.frame_duration).add();
        self.frames_written += 1;
        Ok(())
    }

    #[must_use]
    pub const fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Finish writing the video.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder fails to finish.
    pub fn finish(mut self) -> Result<()> {
        self.encoder.finish().map_err(|e| {
            PoseError::VideoError(format!("Failed to finish video encoding: {e}"))
        })
    }
}

/// [`FrameSink`] writing an MP4 file, created when the first frame arrives.
#[cfg(feature = "video")]
pub struct VideoFileSink {
    path: PathBuf,
    writer: Option<VideoWriter>,
}

#[cfg(feature = "video")]
impl VideoFileSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(feature = "video")]
impl FrameSink for VideoFileSink {
    fn open(&mut self, width: usize, height: usize, fps: f32) -> Result<()> {
        self.writer = Some(VideoWriter::new(&self.path, width, height, fps)?);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn write_frame(&mut self, frame: &Array3<u8>) -> Result<()> {
        self.writer
            .as_mut()
            .ok_or_else(|| PoseError::VideoError("Sink is not open".to_string()))?
            .write_frame(frame)
    }

    fn finish(&mut self) -> Result<()> {
        match self.writer.take() {
            Some(writer) => writer.finish(),
            None => Ok(()),
        }
    }
}
