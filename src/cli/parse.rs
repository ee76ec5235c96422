// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::fs;
use std::path::Path;
use std::process;

use serde::Serialize;

use crate::cli::args::ParseArgs;
use crate::error::{PoseError, Result};
use crate::results::PoseKeypoints;
use crate::{JsonReplayEngine, Session, SessionConfig, VERSION};
use crate::{error, info, section, success};

/// Layout of a `--save-keypoints` file.
#[derive(Serialize)]
struct SavedKeypoints<'a> {
    version: &'a str,
    video: &'a Path,
    /// frames[frame][person][joint] = [x, y, confidence]
    frames: Vec<Vec<Vec<[f32; 3]>>>,
}

/// Run the parse command, exiting with status 1 on failure.
pub fn run_parse(args: &ParseArgs) {
    if let Err(e) = parse(args) {
        error!("{e}");
        process::exit(1);
    }
}

/// Session options from command-line flags.
pub(crate) fn session_config(args: &ParseArgs) -> SessionConfig {
    let mut config = SessionConfig::new()
        .with_max_people(args.max_people)
        .with_render(!args.no_render)
        .with_hand(args.hand)
        .with_face(args.face)
        .with_hints(args.hints.into());

    if let Some(dir) = &args.model_folder {
        config = config.with_model_path(dir);
    }
    if let Some(dir) = &args.write_json {
        config = config.with_results_path(dir);
    }
    config
}

fn parse(args: &ParseArgs) -> Result<()> {
    section!("openpose-adapter {VERSION}");

    let engine = JsonReplayEngine::new(&args.replay);
    let mut session = Session::new(engine, session_config(args))?;
    info!(
        "Replaying {} recorded frames from {}",
        session.engine().total_frames(),
        args.replay.display()
    );

    let keypoints = run_video(&mut session, args)?;

    let people: usize = keypoints
        .iter()
        .filter(|k| !k.is_all_zero())
        .map(PoseKeypoints::len)
        .sum();
    success!(
        "Parsed {} ({} detected)",
        crate::utils::count_label(keypoints.len(), "frame"),
        crate::utils::count_label(people, "person")
    );

    if let Some(out) = &args.save_keypoints {
        save_keypoints(out, &args.video, &keypoints)?;
        success!("Keypoints saved to {}", out.display());
    }
    Ok(())
}

#[cfg(feature = "video")]
fn run_video(
    session: &mut Session<JsonReplayEngine>,
    args: &ParseArgs,
) -> Result<Vec<PoseKeypoints>> {
    let parsed = crate::pipeline::parse_video(
        session,
        &args.video,
        args.keypoints_only,
        args.output.as_deref(),
    )?;
    Ok(parsed.into_keypoints())
}

#[cfg(not(feature = "video"))]
fn run_video(
    _session: &mut Session<JsonReplayEngine>,
    args: &ParseArgs,
) -> Result<Vec<PoseKeypoints>> {
    Err(PoseError::FeatureNotEnabled(format!(
        "Reading {} requires the 'video' feature",
        args.video.display()
    )))
}

/// Write `keypoints` to `path` as JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub(crate) fn save_keypoints(path: &Path, video: &Path, keypoints: &[PoseKeypoints]) -> Result<()> {
    let saved = SavedKeypoints {
        version: VERSION,
        video,
        frames: keypoints.iter().map(PoseKeypoints::to_rows).collect(),
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| {
            PoseError::IoError(format!("Failed to create directory {}: {e}", parent.display()))
        })?;
    }

    let json = serde_json::to_string(&saved)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{Cli, Commands};
    use crate::region::HintSource;
    use clap::Parser;
    use ndarray::Array3;

    fn parse_args(extra: &[&str]) -> ParseArgs {
        let mut argv = vec!["app", "parse", "--video", "a.mp4", "--replay", "json"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Parse(args) => args,
            Commands::Joints => panic!("expected parse"),
        }
    }

    #[test]
    fn test_session_config_from_flags() {
        let config = session_config(&parse_args(&[
            "--no-render",
            "--face",
            "--hints",
            "none",
            "--write-json",
            "out/json",
        ]));
        assert!(!config.render);
        assert!(config.face);
        assert!(!config.hand);
        assert_eq!(config.hints, HintSource::None);
        assert_eq!(config.resolved_results_path(), Path::new("out/json"));
        assert!(config.model_path.is_none());
    }

    #[test]
    fn test_save_keypoints_json() {
        let dir = std::env::temp_dir().join(format!("openpose-adapter-save-{}", process::id()));
        let path = dir.join("nested").join("kp.json");

        let mut data = Array3::zeros((1, 25, 3));
        data[[0, 8, 2]] = 0.5;
        let frames = vec![PoseKeypoints::zeros(), PoseKeypoints::new(data).unwrap()];
        save_keypoints(&path, Path::new("a.mp4"), &frames).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["video"], "a.mp4");
        let saved = value["frames"].as_array().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0][0].as_array().unwrap().len(), 25);
        assert_eq!(saved[1][0][8][2], 0.5);

        let _ = fs::remove_dir_all(&dir);
    }
}
