// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use openpose_adapter::cli::args::{Cli, Commands};
use openpose_adapter::cli::joints::run_joints;
use openpose_adapter::cli::logging::set_verbose;
use openpose_adapter::cli::parse::run_parse;

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Parse(args) => {
            set_verbose(args.verbose);
            run_parse(args);
        }
        Commands::Joints => run_joints(),
    }
}
