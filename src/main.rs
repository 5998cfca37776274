// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use pose_pipeline::cli::analyze::run_analysis;
use pose_pipeline::cli::args::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => run_analysis(&args),
    }
}
