// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the pose pipeline.

use std::fmt;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for the pose pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// Error loading the network weights or configuration.
    ModelLoadError(String),
    /// Error during a predictor call.
    PredictError(String),
    /// Video open/decode error.
    VideoError(String),
    /// Invalid pipeline configuration.
    ConfigError(String),
    /// Prediction table assembly or serialization error.
    TableError(String),
    /// Run metadata serialization error.
    MetadataError(String),
    /// IO error (file not found, permission denied, etc.).
    IoError(String),
    /// Wrapped `std::io::Error`
    Io(std::io::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLoadError(msg) => write!(f, "Model load error: {msg}"),
            Self::PredictError(msg) => write!(f, "Predict error: {msg}"),
            Self::VideoError(msg) => write!(f, "Video error: {msg}"),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::TableError(msg) => write!(f, "Table error: {msg}"),
            Self::MetadataError(msg) => write!(f, "Metadata error: {msg}"),
            Self::IoError(msg) => write!(f, "IO error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        Self::TableError(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::MetadataError(err.to_string())
    }
}
