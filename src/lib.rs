// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]

//! # Pose Pipeline
//!
//! Batch 2D pose estimation over recorded video sessions. A run walks a
//! directory tree of recording sessions, streams every unprocessed raw
//! video frame-by-frame through a pre-trained pose-estimation network, and
//! writes one prediction table plus one metadata sidecar per video.
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use pose_pipeline::{PipelineConfig, PoseModel, SessionWalker};
//!
//! fn main() -> pose_pipeline::Result<()> {
//!     let config = PipelineConfig::load("config.toml")?;
//!     let mut model = PoseModel::load(&config)?;
//!
//!     let walker = SessionWalker::new(config);
//!     let summary = walker.run(&mut model)?;
//!     println!("{} analyzed, {} skipped", summary.analyzed, summary.skipped);
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Analyze every unprocessed video under the configured root
//! pose-pipeline analyze --config config.toml
//!
//! # Override the session-tree root and checkpoint from the command line
//! pose-pipeline analyze --path /data/recordings --model-train-iter 300000
//! ```
//!
//! Re-running over an unchanged tree is a no-op: videos whose output table
//! already exists and is readable are skipped without touching the model.
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | [`PipelineConfig`]: session-tree layout and model selection |
//! | [`netcfg`] | [`NetworkConfig`] parsed from the model's descriptor |
//! | [`video`] | [`VideoReader`] frame iteration over one container |
//! | [`model`] | [`FramePredictor`] seam and the ONNX-backed [`PoseModel`] |
//! | [`results`] | [`PoseEstimate`], [`PredictionTable`], [`RunMetadata`] |
//! | [`output`] | Table/metadata writers and the skip-validity check |
//! | [`pipeline`] | Per-video frame loop and state machine |
//! | [`walker`] | [`SessionWalker`] over the session tree |
//! | [`error`] | Error types ([`PipelineError`], [`Result`]) |

// Modules
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod netcfg;
pub mod output;
pub mod pipeline;
pub mod results;
pub mod video;
pub mod walker;

// Re-export main types for convenience
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use model::{FramePredictor, PoseModel};
pub use netcfg::NetworkConfig;
pub use pipeline::{VideoAnalysis, analyze_video};
pub use results::{PoseEstimate, PredictionTable, RunMetadata, VideoOutcome};
pub use video::VideoReader;
pub use walker::{RunSummary, SessionWalker};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
