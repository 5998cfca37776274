// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Network configuration parsing.
//!
//! The exported model folder carries a `pose_cfg.yaml` descriptor naming the
//! keypoints the network predicts and the decode constants. Only the handful
//! of fields this pipeline needs are parsed, line by line, so a full YAML
//! dependency is avoided.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// The network-configuration descriptor for a trained pose model.
///
/// Stored alongside every prediction in the run metadata for provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Ordered keypoint names; output column order follows this list.
    pub all_joints_names: Vec<String>,
    /// Output stride of the network (heatmap cell size in pixels).
    pub stride: f32,
    /// Scale factor applied to the location-refinement offsets.
    pub locref_stdev: f32,
    /// Network architecture label, when the descriptor carries one.
    pub net_type: String,
    /// Path of the weights checkpoint loaded for this run.
    pub init_weights: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            all_joints_names: Vec::new(),
            stride: 8.0,
            locref_stdev: 7.2801,
            net_type: String::new(),
            init_weights: String::new(),
        }
    }
}

impl NetworkConfig {
    /// Read and parse a `pose_cfg.yaml` descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or if it names no
    /// keypoints.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::ModelLoadError(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse a descriptor from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if no keypoint names are present.
    pub fn from_yaml_str(yaml_str: &str) -> Result<Self> {
        let mut config = Self::default();

        for line in yaml_str.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                let key = key.trim();
                let value = value.trim().trim_matches('\'').trim_matches('"');

                match key {
                    "stride" => {
                        config.stride = value.parse().map_err(|_| {
                            PipelineError::ModelLoadError(format!("Invalid stride value: {value}"))
                        })?;
                    }
                    "locref_stdev" => {
                        config.locref_stdev = value.parse().map_err(|_| {
                            PipelineError::ModelLoadError(format!(
                                "Invalid locref_stdev value: {value}"
                            ))
                        })?;
                    }
                    "net_type" => config.net_type = value.to_string(),
                    _ => {}
                }
            }
        }

        config.all_joints_names = Self::parse_name_list(yaml_str, "all_joints_names");

        if config.all_joints_names.is_empty() {
            return Err(PipelineError::ModelLoadError(
                "No keypoint names found in network configuration (all_joints_names)".to_string(),
            ));
        }

        Ok(config)
    }

    /// Number of keypoints the network predicts.
    #[must_use]
    pub fn num_keypoints(&self) -> usize {
        self.all_joints_names.len()
    }

    /// Parse a string list that may be inline (`key: [a, b]`) or a block of
    /// `- item` lines following the key.
    fn parse_name_list(yaml_str: &str, key: &str) -> Vec<String> {
        let lines: Vec<&str> = yaml_str.lines().collect();

        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            let Some(rest) = trimmed.strip_prefix(key) else {
                continue;
            };
            let Some(rest) = rest.trim_start().strip_prefix(':') else {
                continue;
            };
            let rest = rest.trim();

            // Inline list form: key: [a, b, c]
            if let Some(inner) = rest.strip_prefix('[') {
                let inner = inner.trim_end_matches(']');
                return inner
                    .split(',')
                    .map(|s| s.trim().trim_matches('\'').trim_matches('"').to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }

            // Block list form: "- item" lines until the next key.
            let mut names = Vec::new();
            for following in lines.iter().skip(i + 1) {
                let trimmed = following.trim();
                if let Some(item) = trimmed.strip_prefix('-') {
                    names.push(item.trim().trim_matches('\'').trim_matches('"').to_string());
                } else if !trimmed.is_empty() && !trimmed.starts_with('#') {
                    break;
                }
            }
            return names;
        }

        Vec::new()
    }
}
