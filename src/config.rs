// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pipeline configuration.
//!
//! The configuration names the session-tree root, the model to run, and the
//! per-session subfolder layout. It can be loaded from a TOML file; every
//! subfolder name has a default matching the standard pipeline layout.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PipelineError, Result};

/// Configuration for a batch pose-estimation run.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Root directory containing the session folders.
    pub path: PathBuf,
    /// Directory holding exported model folders.
    pub model_folder: PathBuf,
    /// Name of the model folder under `model_folder`.
    pub model_name: String,
    /// Training checkpoint to load (snapshot number).
    pub model_train_iter: u64,
    /// Subfolder with the raw videos, per session.
    #[serde(default = "default_videos_raw")]
    pub pipeline_videos_raw: String,
    /// Subfolder with calibration recordings, per session.
    #[serde(default = "default_calibration")]
    pub pipeline_calibration: String,
    /// Subfolder receiving 2D pose outputs, per session.
    #[serde(default = "default_pose_2d")]
    pub pipeline_pose_2d: String,
    /// Raw-video file extension (without dot).
    #[serde(default = "default_video_extension")]
    pub video_extension: String,
}

fn default_videos_raw() -> String {
    "videos-raw".to_string()
}
fn default_calibration() -> String {
    "calibration".to_string()
}
fn default_pose_2d() -> String {
    "pose-2d".to_string()
}
fn default_video_extension() -> String {
    "avi".to_string()
}

impl PipelineConfig {
    /// Load a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            PipelineError::ConfigError(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// Path to the exported model folder.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.model_folder.join(&self.model_name)
    }

    /// Path to the network weights for the configured checkpoint.
    #[must_use]
    pub fn weights_path(&self) -> PathBuf {
        self.model_path()
            .join("train")
            .join(format!("snapshot-{}.onnx", self.model_train_iter))
    }

    /// Path to the network configuration descriptor.
    #[must_use]
    pub fn network_config_path(&self) -> PathBuf {
        self.model_path().join("test").join("pose_cfg.yaml")
    }
}
