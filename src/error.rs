// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the adapter.

use std::fmt;

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, PoseError>;

/// Main error type for the adapter.
#[derive(Debug)]
pub enum PoseError {
    /// The engine could not be configured or started.
    EngineError(String),
    /// The engine failed while processing a frame.
    ProcessError(String),
    /// Frame buffer has an unusable shape or could not be converted.
    ImageError(String),
    /// Invalid configuration provided.
    ConfigError(String),
    /// IO error with context (file not found, permission denied, etc.).
    IoError(String),
    /// Wrapped `std::io::Error`.
    Io(std::io::Error),
    /// Malformed engine JSON output.
    JsonError(String),
    /// Video decoding or encoding error.
    VideoError(String),
    /// A frame was submitted to a session that was already stopped.
    SessionStopped,
    /// A video was requested from an empty result sequence.
    EmptyResults,
    /// Feature not enabled.
    FeatureNotEnabled(String),
}

impl fmt::Display for PoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EngineError(msg) => write!(f, "Engine error: {msg}"),
            Self::ProcessError(msg) => write!(f, "Processing error: {msg}"),
            Self::ImageError(msg) => write!(f, "Image error: {msg}"),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::IoError(msg) => write!(f, "IO error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::JsonError(msg) => write!(f, "JSON error: {msg}"),
            Self::VideoError(msg) => write!(f, "Video error: {msg}"),
            Self::SessionStopped => write!(f, "Session already stopped"),
            Self::EmptyResults => write!(f, "No results to write"),
            Self::FeatureNotEnabled(msg) => write!(f, "Feature not enabled: {msg}"),
        }
    }
}

impl std::error::Error for PoseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PoseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for PoseError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageError(err.to_string())
    }
}

impl From<serde_json::Error> for PoseError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}
