// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Result types for pose inference output.
//!
//! A [`PoseEstimate`] holds one frame's keypoint triples; a
//! [`PredictionTable`] accumulates them into the per-video table that is
//! ultimately written to disk, together with a [`RunMetadata`] sidecar.

use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::netcfg::NetworkConfig;

/// Pose estimate for a single frame.
///
/// Rows follow the network's configured keypoint order; columns are
/// (x, y, likelihood).
#[derive(Debug, Clone)]
pub struct PoseEstimate {
    /// Raw keypoint data with shape (K, 3).
    pub data: Array2<f32>,
}

impl PoseEstimate {
    /// Create a new pose estimate.
    ///
    /// # Errors
    ///
    /// Returns an error if the array does not have three columns.
    pub fn new(data: Array2<f32>) -> Result<Self> {
        if data.shape()[1] != 3 {
            return Err(PipelineError::PredictError(format!(
                "Pose estimate must have 3 columns (x, y, likelihood), got {}",
                data.shape()[1]
            )));
        }
        Ok(Self { data })
    }

    /// Build an estimate from (x, y, likelihood) triples.
    #[must_use]
    pub fn from_triples(triples: &[(f32, f32, f32)]) -> Self {
        let mut data = Array2::zeros((triples.len(), 3));
        for (i, &(x, y, likelihood)) in triples.iter().enumerate() {
            data[[i, 0]] = x;
            data[[i, 1]] = y;
            data[[i, 2]] = likelihood;
        }
        Self { data }
    }

    /// Number of keypoints in this estimate.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.shape()[0]
    }

    /// Check if the estimate holds no keypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the (x, y, likelihood) triple for one keypoint.
    #[must_use]
    pub fn keypoint(&self, index: usize) -> (f32, f32, f32) {
        (
            self.data[[index, 0]],
            self.data[[index, 1]],
            self.data[[index, 2]],
        )
    }
}

/// Per-video prediction table.
///
/// One row per declared frame index, one (x, y, likelihood) column triple
/// per keypoint. Rows are zero until populated; rows past the last readable
/// frame stay zero when a video truncates. Created once per video and
/// written exactly once.
#[derive(Debug, Clone)]
pub struct PredictionTable {
    keypoint_names: Vec<String>,
    data: Array2<f64>,
    populated: usize,
}

impl PredictionTable {
    /// Allocate a zero-filled table for `frame_count` frames.
    #[must_use]
    pub fn new(keypoint_names: Vec<String>, frame_count: usize) -> Self {
        let cols = 3 * keypoint_names.len();
        Self {
            keypoint_names,
            data: Array2::zeros((frame_count, cols)),
            populated: 0,
        }
    }

    /// Fill one row from a frame's pose estimate.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame index is out of range or the estimate's
    /// keypoint count does not match the table's.
    pub fn set_row(&mut self, frame_idx: usize, pose: &PoseEstimate) -> Result<()> {
        if frame_idx >= self.nrows() {
            return Err(PipelineError::TableError(format!(
                "Frame index {frame_idx} out of range for table with {} rows",
                self.nrows()
            )));
        }
        if pose.len() != self.keypoint_names.len() {
            return Err(PipelineError::TableError(format!(
                "Pose has {} keypoints, table expects {}",
                pose.len(),
                self.keypoint_names.len()
            )));
        }

        for k in 0..pose.len() {
            let (x, y, likelihood) = pose.keypoint(k);
            self.data[[frame_idx, 3 * k]] = f64::from(x);
            self.data[[frame_idx, 3 * k + 1]] = f64::from(y);
            self.data[[frame_idx, 3 * k + 2]] = f64::from(likelihood);
        }
        self.populated = self.populated.max(frame_idx + 1);
        Ok(())
    }

    /// Keypoint names, in output column order.
    #[must_use]
    pub fn keypoint_names(&self) -> &[String] {
        &self.keypoint_names
    }

    /// Declared number of rows (frames).
    #[must_use]
    pub fn nrows(&self) -> usize {
        self.data.shape()[0]
    }

    /// Number of value columns (3 per keypoint).
    #[must_use]
    pub fn ncols(&self) -> usize {
        self.data.shape()[1]
    }

    /// Highest populated row index plus one.
    #[must_use]
    pub const fn populated_rows(&self) -> usize {
        self.populated
    }

    /// One row of the table.
    #[must_use]
    pub fn row(&self, frame_idx: usize) -> ArrayView1<'_, f64> {
        self.data.row(frame_idx)
    }

    /// The full table as a view.
    #[must_use]
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }
}

/// How a video's frame loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoOutcome {
    /// Every declared frame was read and predicted.
    Complete,
    /// The stream ended before the declared frame count.
    Truncated,
}

/// Per-video run record, persisted as a sidecar next to the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Wall-clock start, seconds since the Unix epoch.
    pub start: f64,
    /// Wall-clock stop, seconds since the Unix epoch.
    pub stop: f64,
    /// Elapsed processing time in seconds.
    pub run_duration: f64,
    /// Label naming the model and checkpoint that produced the table.
    pub scorer: String,
    /// The network configuration used.
    pub network_config: NetworkConfig,
    /// Source video frame rate.
    pub fps: f32,
    /// Source frame dimensions as (height, width).
    pub frame_dimensions: (u32, u32),
    /// Declared frame count of the source video.
    pub frame_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["snout".to_string(), "tail_base".to_string()]
    }

    #[test]
    fn test_table_starts_zeroed() {
        let table = PredictionTable::new(names(), 5);
        assert_eq!(table.nrows(), 5);
        assert_eq!(table.ncols(), 6);
        assert_eq!(table.populated_rows(), 0);
        assert!(table.view().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_set_row_column_order() {
        let mut table = PredictionTable::new(names(), 3);
        let pose = PoseEstimate::from_triples(&[(1.0, 2.0, 0.5), (3.0, 4.0, 0.25)]);
        table.set_row(1, &pose).unwrap();

        let row = table.row(1);
        assert_eq!(row.to_vec(), vec![1.0, 2.0, 0.5, 3.0, 4.0, 0.25]);
        assert_eq!(table.populated_rows(), 2);
        // Untouched rows stay zero.
        assert!(table.row(0).iter().all(|&v| v == 0.0));
        assert!(table.row(2).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_set_row_out_of_range() {
        let mut table = PredictionTable::new(names(), 2);
        let pose = PoseEstimate::from_triples(&[(0.0, 0.0, 0.0), (0.0, 0.0, 0.0)]);
        assert!(table.set_row(2, &pose).is_err());
    }

    #[test]
    fn test_set_row_keypoint_mismatch() {
        let mut table = PredictionTable::new(names(), 2);
        let pose = PoseEstimate::from_triples(&[(0.0, 0.0, 0.0)]);
        assert!(table.set_row(0, &pose).is_err());
    }

    #[test]
    fn test_estimate_shape_checked() {
        let bad = Array2::zeros((4, 2));
        assert!(PoseEstimate::new(bad).is_err());

        let good = Array2::zeros((4, 3));
        let pose = PoseEstimate::new(good).unwrap();
        assert_eq!(pose.len(), 4);
        assert!(!pose.is_empty());
    }
}
