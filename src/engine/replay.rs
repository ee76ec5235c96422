// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Engine that replays recorded per-frame JSON.
//!
//! The native engine can persist each frame as `<name>_<frame>_keypoints.json`
//! under its `write_json` directory. [`JsonReplayEngine`] reads such a
//! directory back, one file per processed frame in sorted name order, so the
//! rest of the adapter can run without the native library.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array3};
use serde::{Deserialize, Serialize};

use crate::annotate::draw_skeletons;
use crate::config::EngineParams;
use crate::engine::{Datum, PoseEngine};
use crate::error::{PoseError, Result};
use crate::joints::{KEYPOINT_DIMS, NUM_BODY_JOINTS, NUM_FACE_JOINTS, NUM_HAND_JOINTS};
use crate::results::PoseKeypoints;
use crate::utils::frame_dims;

/// Suffix of per-frame keypoint files.
pub const KEYPOINTS_SUFFIX: &str = "_keypoints.json";

/// JSON format version written by this engine.
const JSON_VERSION: f32 = 1.3;

/// One person in a keypoint file. Arrays are flat `[x, y, c, x, y, c, ...]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonRecord {
    pub person_id: Vec<i64>,
    pub pose_keypoints_2d: Vec<f32>,
    pub face_keypoints_2d: Vec<f32>,
    pub hand_left_keypoints_2d: Vec<f32>,
    pub hand_right_keypoints_2d: Vec<f32>,
}

/// Contents of one keypoint file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameRecord {
    pub version: f32,
    pub people: Vec<PersonRecord>,
}

impl FrameRecord {
    /// Load a keypoint file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            PoseError::IoError(format!("Failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| PoseError::JsonError(format!("{}: {e}", path.display())))
    }

    /// Write this record as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(|e| {
            PoseError::IoError(format!("Failed to write {}: {e}", path.display()))
        })
    }
}

/// Stack each person's flat array into (N, `joints`, 3).
///
/// An empty per-person array is treated as all-zero, which is how the
/// engine writes parts that were not detected.
fn stack(rows: &[&[f32]], joints: usize, what: &str) -> Result<Array3<f32>> {
    let per_person = joints * KEYPOINT_DIMS;
    let mut flat = Vec::with_capacity(rows.len() * per_person);
    for row in rows {
        if row.is_empty() {
            flat.extend(std::iter::repeat_n(0.0, per_person));
        } else if row.len() == per_person {
            flat.extend_from_slice(row);
        } else {
            return Err(PoseError::JsonError(format!(
                "{what} keypoints have {} values, expected {per_person}",
                row.len()
            )));
        }
    }
    Array3::from_shape_vec((rows.len(), joints, KEYPOINT_DIMS), flat)
        .map_err(|e| PoseError::JsonError(e.to_string()))
}

/// Whether `a` and `b` name the same directory, comparing canonical paths
/// when both exist.
fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn flatten(data: &Array3<f32>, person: usize) -> Vec<f32> {
    data.index_axis(ndarray::Axis(0), person).iter().copied().collect()
}

/// [`PoseEngine`] backed by a directory of recorded keypoint files.
#[derive(Debug)]
pub struct JsonReplayEngine {
    source_dir: PathBuf,
    frames: Vec<PathBuf>,
    next_frame: usize,
    max_people: Option<usize>,
    hand: bool,
    face: bool,
    render: bool,
    write_json: Option<PathBuf>,
    configured: bool,
    running: bool,
}

impl JsonReplayEngine {
    /// Create an engine replaying `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: dir.into(),
            frames: Vec::new(),
            next_frame: 0,
            max_people: None,
            hand: false,
            face: false,
            render: true,
            write_json: None,
            configured: false,
            running: false,
        }
    }

    /// Directory being replayed.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Number of recorded frames found at start.
    #[must_use]
    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    /// Whether the engine has been started and not yet stopped.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    fn collect_frames(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(PoseError::EngineError(format!(
                "Keypoint directory not found: {}",
                dir.display()
            )));
        }

        let mut frames: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .is_some_and(|n| n.to_string_lossy().ends_with(KEYPOINTS_SUFFIX))
            })
            .collect();

        frames.sort();
        Ok(frames)
    }

    /// Fill `datum` from a parsed record.
    fn fill(&self, datum: &mut Datum, mut record: FrameRecord) -> Result<()> {
        if let Some(max) = self.max_people {
            record.people.truncate(max);
        }

        let people = &record.people;
        if people.is_empty() {
            datum.output = Some(datum.input.clone());
            return Ok(());
        }

        let body: Vec<&[f32]> = people.iter().map(|p| p.pose_keypoints_2d.as_slice()).collect();
        let keypoints = PoseKeypoints::new(stack(&body, NUM_BODY_JOINTS, "Body")?)?;

        if self.hand {
            let left: Vec<&[f32]> = people
                .iter()
                .map(|p| p.hand_left_keypoints_2d.as_slice())
                .collect();
            let right: Vec<&[f32]> = people
                .iter()
                .map(|p| p.hand_right_keypoints_2d.as_slice())
                .collect();
            datum.hand_keypoints = Some([
                stack(&left, NUM_HAND_JOINTS, "Left hand")?,
                stack(&right, NUM_HAND_JOINTS, "Right hand")?,
            ]);
        }

        if self.face {
            let face: Vec<&[f32]> = people.iter().map(|p| p.face_keypoints_2d.as_slice()).collect();
            datum.face_keypoints = Some(stack(&face, NUM_FACE_JOINTS, "Face")?);
        }

        datum.pose_ids = Some(
            people
                .iter()
                .map(|p| p.person_id.first().copied().unwrap_or(-1))
                .collect::<Array1<i64>>(),
        );
        datum.pose_scores = Some(keypoints.mean_conf());

        datum.output = Some(if self.render {
            draw_skeletons(&datum.input, &keypoints)?
        } else {
            datum.input.clone()
        });
        datum.pose_keypoints = Some(keypoints.data);
        Ok(())
    }

    /// Re-emit the datum's outputs as a keypoint file.
    fn write_frame(&self, dir: &Path, frame: usize, datum: &Datum) -> Result<()> {
        let n = datum.pose_keypoints.as_ref().map_or(0, |k| k.shape()[0]);
        let people = (0..n)
            .map(|i| PersonRecord {
                person_id: vec![datum.pose_ids.as_ref().map_or(-1, |ids| ids[i])],
                pose_keypoints_2d: datum
                    .pose_keypoints
                    .as_ref()
                    .map(|k| flatten(k, i))
                    .unwrap_or_default(),
                face_keypoints_2d: datum
                    .face_keypoints
                    .as_ref()
                    .map(|k| flatten(k, i))
                    .unwrap_or_default(),
                hand_left_keypoints_2d: datum
                    .hand_keypoints
                    .as_ref()
                    .map(|[l, _]| flatten(l, i))
                    .unwrap_or_default(),
                hand_right_keypoints_2d: datum
                    .hand_keypoints
                    .as_ref()
                    .map(|[_, r]| flatten(r, i))
                    .unwrap_or_default(),
            })
            .collect();

        let record = FrameRecord {
            version: JSON_VERSION,
            people,
        };
        record.save(&dir.join(format!("{frame:012}{KEYPOINTS_SUFFIX}")))
    }
}

impl PoseEngine for JsonReplayEngine {
    fn name(&self) -> &str {
        "json-replay"
    }

    fn default_model_dir(&self) -> PathBuf {
        self.source_dir.join("models")
    }

    fn configure(&mut self, params: &EngineParams) -> Result<()> {
        if self.running {
            return Err(PoseError::EngineError(
                "Cannot configure a running engine".to_string(),
            ));
        }

        self.max_people = match params.get_int("number_people_max") {
            Some(n) if n >= 0 => Some(usize::try_from(n).unwrap_or(usize::MAX)),
            _ => None,
        };
        self.hand = params.get_bool("hand").unwrap_or(false);
        self.face = params.get_bool("face").unwrap_or(false);
        self.render = params.get_int("render_pose").is_none_or(|r| r != 0);
        self.write_json = params
            .get_str("write_json")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        self.configured = true;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if !self.configured {
            return Err(PoseError::EngineError(
                "Engine must be configured before start".to_string(),
            ));
        }

        let frames = Self::collect_frames(&self.source_dir)?;
        if frames.is_empty() {
            return Err(PoseError::EngineError(format!(
                "No *{KEYPOINTS_SUFFIX} files in {}",
                self.source_dir.display()
            )));
        }

        // Writing into the replayed directory would feed this run's output
        // to the next one.
        if self
            .write_json
            .as_deref()
            .is_some_and(|dir| same_dir(dir, &self.source_dir))
        {
            self.write_json = None;
        }

        if let Some(dir) = &self.write_json {
            fs::create_dir_all(dir).map_err(|e| {
                PoseError::EngineError(format!("Failed to create {}: {e}", dir.display()))
            })?;
        }

        self.frames = frames;
        self.next_frame = 0;
        self.running = true;
        Ok(())
    }

    fn process(&mut self, datum: &mut Datum) -> Result<()> {
        if !self.running {
            return Err(PoseError::EngineError("Engine is not running".to_string()));
        }
        frame_dims(&datum.input)?;

        let frame = self.next_frame;
        let path = self.frames.get(frame).ok_or_else(|| {
            PoseError::ProcessError(format!(
                "No recorded frame {frame} in {} ({} available)",
                self.source_dir.display(),
                self.frames.len()
            ))
        })?;

        let record = FrameRecord::load(path)?;
        self.fill(datum, record)?;

        if let Some(dir) = &self.write_json {
            self.write_frame(dir, frame, datum)?;
        }

        self.next_frame += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.running = false;
        self.frames.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::region::RegionHints;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "openpose-adapter-replay-{}-{name}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn person(id: i64, x: f32) -> PersonRecord {
        let mut pose = vec![0.0; NUM_BODY_JOINTS * 3];
        pose[0] = x;
        pose[1] = 5.0;
        pose[2] = 0.8;
        PersonRecord {
            person_id: vec![id],
            pose_keypoints_2d: pose,
            ..PersonRecord::default()
        }
    }

    fn write(dir: &Path, frame: usize, people: Vec<PersonRecord>) {
        let record = FrameRecord {
            version: 1.3,
            people,
        };
        record
            .save(&dir.join(format!("clip_{frame:012}{KEYPOINTS_SUFFIX}")))
            .unwrap();
    }

    fn started(dir: &Path, config: &SessionConfig) -> JsonReplayEngine {
        let mut engine = JsonReplayEngine::new(dir);
        let params = config.to_params(&engine.default_model_dir());
        engine.configure(&params).unwrap();
        engine.start().unwrap();
        engine
    }

    fn datum() -> Datum {
        Datum::new(Array3::zeros((10, 10, 3)), &RegionHints::empty())
    }

    #[test]
    fn test_replays_frames_in_order() {
        let dir = temp_dir("order");
        write(&dir, 0, vec![person(7, 1.0)]);
        write(&dir, 1, vec![]);
        let config = SessionConfig::new().with_results_path(&dir).with_render(false);
        let mut engine = started(&dir, &config);
        assert_eq!(engine.total_frames(), 2);

        let mut first = datum();
        engine.process(&mut first).unwrap();
        let kp = first.pose_keypoints.unwrap();
        assert_eq!(kp.shape(), &[1, 25, 3]);
        assert!((kp[[0, 0, 0]] - 1.0).abs() < f32::EPSILON);
        assert_eq!(first.pose_ids.unwrap()[0], 7);
        assert!(first.hand_keypoints.is_none());

        let mut second = datum();
        engine.process(&mut second).unwrap();
        assert!(second.pose_keypoints.is_none());
        assert!(second.output.is_some());

        assert!(matches!(
            engine.process(&mut datum()),
            Err(PoseError::ProcessError(_))
        ));
    }

    #[test]
    fn test_truncates_to_max_people() {
        let dir = temp_dir("max");
        write(&dir, 0, vec![person(0, 1.0), person(1, 2.0), person(2, 3.0)]);
        let config = SessionConfig::new()
            .with_max_people(2)
            .with_results_path(&dir);
        let mut engine = started(&dir, &config);

        let mut d = datum();
        engine.process(&mut d).unwrap();
        assert_eq!(d.pose_keypoints.unwrap().shape()[0], 2);
        assert_eq!(d.pose_scores.unwrap().len(), 2);
    }

    #[test]
    fn test_missing_hand_data_is_zero_filled() {
        let dir = temp_dir("hands");
        write(&dir, 0, vec![person(0, 1.0)]);
        let config = SessionConfig::new()
            .with_hand(true)
            .with_face(true)
            .with_results_path(&dir);
        let mut engine = started(&dir, &config);

        let mut d = datum();
        engine.process(&mut d).unwrap();
        let [left, right] = d.hand_keypoints.unwrap();
        assert_eq!(left.shape(), &[1, 21, 3]);
        assert_eq!(right.shape(), &[1, 21, 3]);
        assert_eq!(d.face_keypoints.unwrap().shape(), &[1, 70, 3]);
    }

    #[test]
    fn test_writes_json_side_channel() {
        let dir = temp_dir("src");
        let out = temp_dir("out");
        write(&dir, 0, vec![person(3, 4.0)]);
        let config = SessionConfig::new().with_results_path(&out);
        let mut engine = started(&dir, &config);

        engine.process(&mut datum()).unwrap();
        let written = FrameRecord::load(&out.join(format!("{:012}{KEYPOINTS_SUFFIX}", 0))).unwrap();
        assert_eq!(written.people.len(), 1);
        assert_eq!(written.people[0].person_id, vec![3]);
        assert!((written.people[0].pose_keypoints_2d[0] - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_no_json_written_into_replayed_dir() {
        let root = temp_dir("alias");
        let dir = root.join("json");
        fs::create_dir_all(&dir).unwrap();
        write(&dir, 0, vec![person(0, 1.0)]);
        write(&dir, 1, vec![person(0, 2.0)]);

        let alias = dir.join(".").join("..").join("json");
        let config = SessionConfig::new().with_results_path(&alias);
        for _ in 0..2 {
            let mut engine = started(&dir, &config);
            assert_eq!(engine.total_frames(), 2);
            engine.process(&mut datum()).unwrap();
            engine.process(&mut datum()).unwrap();
            engine.stop().unwrap();
        }
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 2);
    }

    #[test]
    fn test_start_failures() {
        let mut engine = JsonReplayEngine::new("/nonexistent/openpose-adapter");
        assert!(matches!(engine.start(), Err(PoseError::EngineError(_))));

        engine.configure(&EngineParams::new()).unwrap();
        assert!(matches!(engine.start(), Err(PoseError::EngineError(_))));

        let empty = temp_dir("empty");
        let mut engine = JsonReplayEngine::new(&empty);
        engine.configure(&EngineParams::new()).unwrap();
        assert!(matches!(engine.start(), Err(PoseError::EngineError(_))));
    }

    #[test]
    fn test_rejects_bad_keypoint_length() {
        let dir = temp_dir("bad");
        let bad = PersonRecord {
            pose_keypoints_2d: vec![1.0; 10],
            ..PersonRecord::default()
        };
        write(&dir, 0, vec![bad]);
        let mut engine = started(&dir, &SessionConfig::new().with_results_path(&dir));
        assert!(matches!(
            engine.process(&mut datum()),
            Err(PoseError::JsonError(_))
        ));
    }
}
