// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Analyze Options:
    --config, -c <FILE>        Pipeline configuration file [default: config.toml]
    --path <DIR>               Session-tree root (overrides config file)
    --model-folder <DIR>       Directory holding exported model folders
    --model-name <NAME>        Model folder name
    --model-train-iter <N>     Checkpoint snapshot number
    --verbose <BOOL>           Show per-frame progress [default: true]

Examples:
    pose-pipeline analyze
    pose-pipeline analyze --config experiments.toml
    pose-pipeline analyze --path /data/recordings --model-name leg-tracking
    pose-pipeline analyze -c config.toml --verbose false"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze every unprocessed video under the session-tree root
    Analyze(AnalyzeArgs),
}

/// Arguments for the analyze command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Pipeline configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Session-tree root (overrides the config file)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Directory holding exported model folders
    #[arg(long)]
    pub model_folder: Option<PathBuf>,

    /// Model folder name
    #[arg(long)]
    pub model_name: Option<String>,

    /// Checkpoint snapshot number
    #[arg(long)]
    pub model_train_iter: Option<u64>,

    /// Show per-frame progress
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}
