// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Session configuration and the engine parameter map it produces.
//!
//! [`SessionConfig`] holds the handful of options the adapter exposes.
//! [`SessionConfig::to_params`] translates them into [`EngineParams`], the
//! flag map the engine is configured with.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::region::HintSource;

/// Default number of people the engine keeps per frame.
pub const DEFAULT_MAX_PEOPLE: usize = 3;

/// Directory name under the system temp dir used for JSON output by default.
pub const DEFAULT_RESULTS_DIR: &str = "openpose";

/// Face detector mode forced when face detection is on.
pub const FACE_DETECTOR_MODE: i64 = 0;

/// Hand detector mode forced when hand detection is on.
pub const HAND_DETECTOR_MODE: i64 = 1;

/// A single engine flag value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<&Path> for ParamValue {
    fn from(p: &Path) -> Self {
        Self::Str(p.to_string_lossy().to_string())
    }
}

/// Engine flags keyed by name (`model_folder`, `number_people_max`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineParams(BTreeMap<String, ParamValue>);

impl EngineParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Flag as an integer; booleans count as 0/1.
    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            ParamValue::Int(i) => Some(*i),
            ParamValue::Bool(b) => Some(i64::from(*b)),
            ParamValue::Str(s) => s.parse().ok(),
        }
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::Int(i) => Some(*i != 0),
            ParamValue::Str(s) => s.parse().ok(),
        }
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            ParamValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EngineParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Options for a [`Session`](crate::Session).
///
/// # Example
///
/// ```rust
/// use openpose_adapter::SessionConfig;
///
/// let config = SessionConfig::new()
///     .with_max_people(1)
///     .with_hand(true)
///     .with_render(false);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Model directory. `None` uses the engine's default install location.
    pub model_path: Option<PathBuf>,
    /// Maximum number of people tracked per frame.
    pub max_people: usize,
    /// Whether the engine draws the skeleton onto the output image.
    pub render: bool,
    /// Directory for the engine's per-frame JSON.
    /// `None` uses `<temp dir>/openpose`.
    pub results_path: Option<PathBuf>,
    /// Enable hand keypoint detection.
    pub hand: bool,
    /// Enable face keypoint detection.
    pub face: bool,
    /// Where per-frame face/hand region hints come from.
    pub hints: HintSource,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            max_people: DEFAULT_MAX_PEOPLE,
            render: true,
            results_path: None,
            hand: false,
            face: false,
            hints: HintSource::default(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    #[must_use]
    pub const fn with_max_people(mut self, max_people: usize) -> Self {
        self.max_people = max_people;
        self
    }

    #[must_use]
    pub const fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    #[must_use]
    pub fn with_results_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_path = Some(path.into());
        self
    }

    #[must_use]
    pub const fn with_hand(mut self, hand: bool) -> Self {
        self.hand = hand;
        self
    }

    #[must_use]
    pub const fn with_face(mut self, face: bool) -> Self {
        self.face = face;
        self
    }

    #[must_use]
    pub fn with_hints(mut self, hints: HintSource) -> Self {
        self.hints = hints;
        self
    }

    /// JSON output directory after applying the default.
    #[must_use]
    pub fn resolved_results_path(&self) -> PathBuf {
        self.results_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_RESULTS_DIR))
    }

    /// Build the engine flag map.
    ///
    /// `default_model_dir` is used when no model path was configured.
    /// Hand and face detection force their detector modes; disabling
    /// rendering sets `render_pose` to 0.
    #[must_use]
    pub fn to_params(&self, default_model_dir: &Path) -> EngineParams {
        let mut params = EngineParams::new();
        let model_dir = self.model_path.as_deref().unwrap_or(default_model_dir);
        params.set("model_folder", model_dir);
        params.set(
            "number_people_max",
            i64::try_from(self.max_people).unwrap_or(i64::MAX),
        );

        if self.face {
            params.set("face", true);
            params.set("face_detector", FACE_DETECTOR_MODE);
        }

        if self.hand {
            params.set("hand", true);
            params.set("hand_detector", HAND_DETECTOR_MODE);
        }

        params.set("write_json", self.resolved_results_path().as_path());

        if !self.render {
            params.set("render_pose", 0_i64);
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.max_people, 3);
        assert!(config.render);
        assert!(!config.hand);
        assert!(!config.face);
        assert!(config.model_path.is_none());
        assert_eq!(config.hints, HintSource::Calibration);
    }

    #[test]
    fn test_default_params() {
        let params = SessionConfig::new().to_params(Path::new("/opt/openpose/models"));
        assert_eq!(params.get_str("model_folder"), Some("/opt/openpose/models"));
        assert_eq!(params.get_int("number_people_max"), Some(3));
        assert!(params.get("face").is_none());
        assert!(params.get("hand").is_none());
        assert!(params.get("render_pose").is_none());
        let json_dir = std::env::temp_dir().join("openpose");
        assert_eq!(
            params.get_str("write_json"),
            Some(json_dir.to_string_lossy().as_ref())
        );
    }

    #[test]
    fn test_forced_detector_modes() {
        let params = SessionConfig::new()
            .with_hand(true)
            .with_face(true)
            .with_render(false)
            .with_model_path("/models")
            .with_results_path("/out/json")
            .to_params(Path::new("/unused"));

        assert_eq!(params.get_bool("face"), Some(true));
        assert_eq!(params.get_int("face_detector"), Some(0));
        assert_eq!(params.get_bool("hand"), Some(true));
        assert_eq!(params.get_int("hand_detector"), Some(1));
        assert_eq!(params.get_int("render_pose"), Some(0));
        assert_eq!(params.get_str("model_folder"), Some("/models"));
        assert_eq!(params.get_str("write_json"), Some("/out/json"));
    }

    #[test]
    fn test_params_display() {
        let mut params = EngineParams::new();
        params.set("number_people_max", 2_i64);
        params.set("hand", true);
        assert_eq!(params.to_string(), "hand=true number_people_max=2");
    }
}
