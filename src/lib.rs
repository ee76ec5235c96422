// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # OpenPose Adapter
//!
//! A thin adapter around a multi-person pose-estimation engine (OpenPose):
//! configure the engine once, feed it video frames, and collect per-frame
//! BODY_25 keypoints into memory or render them to an output video.
//!
//! The adapter does no pose estimation itself. The engine sits behind the
//! [`PoseEngine`] trait; [`JsonReplayEngine`] implements it over the
//! engine's own `*_keypoints.json` output, so recorded runs can be replayed
//! without the native library.
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! # #[cfg(feature = "video")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::Path;
//! use openpose_adapter::{JsonReplayEngine, Session, SessionConfig, parse_video};
//!
//! let engine = JsonReplayEngine::new("recorded_json/");
//! let config = SessionConfig::new().with_max_people(1).with_render(false);
//! let mut session = Session::new(engine, config)?;
//!
//! let parsed = parse_video(&mut session, Path::new("clip.mp4"), true, None)?;
//! for (i, keypoints) in parsed.into_keypoints().iter().enumerate() {
//!     println!("frame {i}: {} people", keypoints.len());
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "video"))]
//! # fn main() {}
//! ```
//!
//! `parse_video` and `write_video` need the `video` feature; without it,
//! [`parse_frames`] drives any [`FrameSource`].
//!
//! ## CLI Usage
//!
//! ```bash
//! # Body keypoints only, saved as JSON
//! openpose-adapter parse --video clip.mp4 --replay recorded_json/ --keypoints-only --save-keypoints clip.json
//!
//! # Rendered skeletons written to a video
//! openpose-adapter parse --video clip.mp4 --replay recorded_json/ --output clip_pose.mp4
//!
//! # Joint index mapping
//! openpose-adapter joints
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | [`Session`]: one configured engine and the per-frame call |
//! | [`engine`] | [`PoseEngine`] trait, [`Datum`] exchange record, [`JsonReplayEngine`] |
//! | [`pipeline`] | [`parse_frames`], `parse_video`, [`write_frames`], `write_video` |
//! | [`config`] | [`SessionConfig`] and the engine flag map |
//! | [`results`] | [`FrameResult`], [`PoseKeypoints`], hand and face keypoints |
//! | [`region`] | Face/hand region hints |
//! | [`joints`] | BODY_25 joint indices |
//! | [`io`] | Frame sources and sinks, video decoding and encoding |
//! | [`error`] | Error types ([`PoseError`], [`Result`]) |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `video` | Video file support via `video-rs` (default) |

// Modules
pub mod annotate;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod joints;
pub mod pipeline;
pub mod progress;
pub mod region;
pub mod results;
pub mod session;
pub mod utils;

// Re-export main types for convenience
pub use config::{EngineParams, ParamValue, SessionConfig};
pub use engine::{Datum, JsonReplayEngine, PoseEngine};
pub use error::{PoseError, Result};
pub use io::{FrameSink, FrameSource, MemorySink, MemorySource};
pub use joints::Joint;
pub use pipeline::{ParseMode, ParsedVideo, parse_frames, write_frames};
pub use region::{HintSource, Rectangle, RegionHints};
pub use results::{FaceKeypoints, FrameResult, HandKeypoints, PoseKeypoints};
pub use session::Session;

#[cfg(feature = "video")]
pub use io::{VideoFileSink, VideoReader, VideoWriter};
#[cfg(feature = "video")]
pub use pipeline::{parse_video, write_video};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "openpose-adapter");
    }
}
