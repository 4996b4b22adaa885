// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use posture_skeleton::cli::args::{Cli, Commands};
use posture_skeleton::cli::predict::run_prediction;
use posture_skeleton::cli::prepare::run_prepare;

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Prepare(args) => run_prepare(args),
        Commands::Predict(args) => run_prediction(args),
    }
}
