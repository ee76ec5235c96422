// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_MAX_PEOPLE;
use crate::region::HintSource;

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Examples:
    openpose-adapter parse --video clip.mp4 --replay openpose_json/ --keypoints-only --save-keypoints clip.json
    openpose-adapter parse --video clip.mp4 --replay openpose_json/ --output clip_pose.mp4
    openpose-adapter parse -v clip.mp4 -r openpose_json/ --hand --hints previous --max-people 1
    openpose-adapter joints"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run pose estimation over every frame of a video
    Parse(ParseArgs),
    /// Print the BODY_25 joint index mapping
    Joints,
}

/// Where face/hand region hints come from.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintsArg {
    /// Fixed calibration rectangles
    Calibration,
    /// Derived from the previous frame's body keypoints
    Previous,
    /// No hints
    None,
}

impl From<HintsArg> for HintSource {
    fn from(arg: HintsArg) -> Self {
        match arg {
            HintsArg::Calibration => Self::Calibration,
            HintsArg::Previous => Self::PreviousFrame,
            HintsArg::None => Self::None,
        }
    }
}

/// Arguments for the parse command.
#[derive(Args, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct ParseArgs {
    /// Input video
    #[arg(short, long)]
    pub video: PathBuf,

    /// Directory of recorded *_keypoints.json files to replay
    #[arg(short, long)]
    pub replay: PathBuf,

    /// Engine model directory
    #[arg(long)]
    pub model_folder: Option<PathBuf>,

    /// Maximum number of people per frame
    #[arg(long, default_value_t = DEFAULT_MAX_PEOPLE)]
    pub max_people: usize,

    /// Do not draw skeletons on output frames
    #[arg(long, default_value_t = false)]
    pub no_render: bool,

    /// Directory for per-frame JSON output [default: <temp dir>/openpose]
    #[arg(long)]
    pub write_json: Option<PathBuf>,

    /// Enable hand keypoints
    #[arg(long, default_value_t = false)]
    pub hand: bool,

    /// Enable face keypoints
    #[arg(long, default_value_t = false)]
    pub face: bool,

    /// Source of face/hand region hints
    #[arg(long, value_enum, default_value_t = HintsArg::Calibration)]
    pub hints: HintsArg,

    /// Keep body keypoints only
    #[arg(long, default_value_t = false)]
    pub keypoints_only: bool,

    /// Write rendered frames to this MP4
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Save per-frame body keypoints as JSON
    #[arg(long)]
    pub save_keypoints: Option<PathBuf>,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_args_defaults() {
        let args = Cli::parse_from(["app", "parse", "--video", "a.mp4", "--replay", "json"]);
        match args.command {
            Commands::Parse(parse_args) => {
                assert_eq!(parse_args.video, PathBuf::from("a.mp4"));
                assert_eq!(parse_args.replay, PathBuf::from("json"));
                assert_eq!(parse_args.max_people, 3);
                assert!(!parse_args.no_render);
                assert!(!parse_args.hand);
                assert!(!parse_args.face);
                assert_eq!(parse_args.hints, HintsArg::Calibration);
                assert!(!parse_args.keypoints_only);
                assert!(parse_args.output.is_none());
                assert!(parse_args.verbose);
            }
            Commands::Joints => panic!("expected parse"),
        }
    }

    #[test]
    fn test_parse_args_custom() {
        let args = Cli::parse_from([
            "app",
            "parse",
            "-v",
            "a.mp4",
            "-r",
            "json",
            "--max-people",
            "1",
            "--hand",
            "--hints",
            "previous",
            "--output",
            "out.mp4",
            "--verbose",
            "false",
        ]);
        match args.command {
            Commands::Parse(parse_args) => {
                assert_eq!(parse_args.max_people, 1);
                assert!(parse_args.hand);
                assert_eq!(
                    HintSource::from(parse_args.hints),
                    HintSource::PreviousFrame
                );
                assert_eq!(parse_args.output, Some(PathBuf::from("out.mp4")));
                assert!(!parse_args.verbose);
            }
            Commands::Joints => panic!("expected parse"),
        }
    }

    #[test]
    fn test_joints_command() {
        let args = Cli::parse_from(["app", "joints"]);
        assert!(matches!(args.command, Commands::Joints));
    }
}
