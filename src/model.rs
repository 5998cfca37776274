// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose model loading and per-frame inference.
//!
//! This module provides the [`FramePredictor`] trait the pipeline consumes,
//! and [`PoseModel`], the production implementation backed by an ONNX
//! Runtime session. The session is created once per run and reused across
//! all videos; the pipeline only ever borrows it.

use std::path::Path;

use image::DynamicImage;
use ndarray::{Array3, Array4};
use ort::session::Session;
use ort::value::TensorRef;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::netcfg::NetworkConfig;
use crate::results::PoseEstimate;

/// Per-frame pose predictor.
///
/// One blocking call per frame, no retry, no batching. Implementations keep
/// whatever session state they need; the pipeline treats them as opaque.
pub trait FramePredictor {
    /// The network configuration backing this predictor.
    fn network_config(&self) -> &NetworkConfig;

    /// Label naming the model and checkpoint, for output provenance.
    fn scorer(&self) -> &str;

    /// Estimate the pose for a single RGB frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying inference call fails.
    fn predict(&mut self, image: &DynamicImage) -> Result<PoseEstimate>;

    /// Keypoint names in output order.
    fn keypoint_names(&self) -> &[String] {
        &self.network_config().all_joints_names
    }
}

/// Pose-estimation model backed by an ONNX Runtime session.
///
/// # Example
///
/// ```no_run
/// use pose_pipeline::{PipelineConfig, PoseModel};
///
/// # fn main() -> pose_pipeline::Result<()> {
/// let config = PipelineConfig::load("config.toml")?;
/// let mut model = PoseModel::load(&config)?;
/// # Ok(())
/// # }
/// ```
pub struct PoseModel {
    /// ONNX Runtime session.
    session: Session,
    /// Parsed network configuration.
    netcfg: NetworkConfig,
    /// Scorer identifier for this model + checkpoint.
    scorer: String,
    /// Input tensor name.
    input_name: String,
    /// Output tensor names.
    output_names: Vec<String>,
}

impl PoseModel {
    /// Load the model named by a pipeline configuration.
    ///
    /// Reads the network configuration descriptor from the model folder and
    /// opens the checkpoint's weights in an ONNX Runtime session.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor or the weights are missing or
    /// cannot be loaded.
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        let mut netcfg = NetworkConfig::load(config.network_config_path())?;

        let weights = config.weights_path();
        if !weights.exists() {
            return Err(PipelineError::ModelLoadError(format!(
                "Weights file not found: {}",
                weights.display()
            )));
        }
        netcfg.init_weights = weights.to_string_lossy().to_string();

        let session = Self::open_session(&weights)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "image".to_string());
        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();

        let scorer = format!("{}-snapshot-{}", config.model_name, config.model_train_iter);

        Ok(Self {
            session,
            netcfg,
            scorer,
            input_name,
            output_names,
        })
    }

    /// Create the ONNX Runtime session for a weights file.
    fn open_session(weights: &Path) -> Result<Session> {
        Session::builder()
            .map_err(|e| {
                PipelineError::ModelLoadError(format!("Failed to create session builder: {e}"))
            })?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| {
                PipelineError::ModelLoadError(format!("Failed to set optimization level: {e}"))
            })?
            // 0 lets the runtime pick the intra-op thread count.
            .with_intra_threads(0)
            .map_err(|e| {
                PipelineError::ModelLoadError(format!("Failed to set intra-thread count: {e}"))
            })?
            .commit_from_file(weights)
            .map_err(|e| PipelineError::ModelLoadError(format!("Failed to load model: {e}")))
    }

    /// Run the network on one input tensor, returning every output as
    /// (data, shape).
    fn run_network(&mut self, input: &Array4<f32>) -> Result<Vec<(Vec<f32>, Vec<usize>)>> {
        let input_contiguous = input.as_standard_layout();
        let input_tensor = TensorRef::from_array_view(&input_contiguous).map_err(|e| {
            PipelineError::PredictError(format!("Failed to create input tensor: {e}"))
        })?;

        let inputs = ort::inputs![&self.input_name => input_tensor];

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| PipelineError::PredictError(format!("Inference failed: {e}")))?;

        let mut extracted = Vec::with_capacity(self.output_names.len());
        for name in &self.output_names {
            let output = outputs.get(name.as_str()).ok_or_else(|| {
                PipelineError::PredictError(format!("Output '{name}' not found"))
            })?;
            let (shape, data) = output.try_extract_tensor::<f32>().map_err(|e| {
                PipelineError::PredictError(format!("Failed to extract output '{name}': {e}"))
            })?;

            let shape_vec: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
            extracted.push((data.to_vec(), shape_vec));
        }

        Ok(extracted)
    }
}

impl FramePredictor for PoseModel {
    fn network_config(&self) -> &NetworkConfig {
        &self.netcfg
    }

    fn scorer(&self) -> &str {
        &self.scorer
    }

    fn predict(&mut self, image: &DynamicImage) -> Result<PoseEstimate> {
        let input = image_to_input(image);
        let outputs = self.run_network(&input)?;

        if outputs.is_empty() {
            return Err(PipelineError::PredictError(
                "Network produced no outputs".to_string(),
            ));
        }

        let num_keypoints = self.netcfg.num_keypoints();
        let scoremap = reshape_scoremap(&outputs[0], num_keypoints)?;
        let locref = if outputs.len() > 1 {
            Some(reshape_locref(&outputs[1], num_keypoints)?)
        } else {
            None
        };

        decode_pose(
            &scoremap,
            locref.as_ref(),
            self.netcfg.stride,
            self.netcfg.locref_stdev,
        )
    }
}

impl std::fmt::Debug for PoseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoseModel")
            .field("scorer", &self.scorer)
            .field("num_keypoints", &self.netcfg.num_keypoints())
            .finish()
    }
}

/// Convert an RGB image to the network's NHWC f32 input tensor.
///
/// Pixel values are fed unnormalized (0..255), matching how the network was
/// trained.
#[must_use]
pub fn image_to_input(image: &DynamicImage) -> Array4<f32> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut input = Array4::zeros((1, height as usize, width as usize, 3));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        input[[0, y as usize, x as usize, 0]] = f32::from(pixel[0]);
        input[[0, y as usize, x as usize, 1]] = f32::from(pixel[1]);
        input[[0, y as usize, x as usize, 2]] = f32::from(pixel[2]);
    }
    input
}

/// Reshape the raw score-map output (1, h, w, K) into (h, w, K).
fn reshape_scoremap(output: &(Vec<f32>, Vec<usize>), num_keypoints: usize) -> Result<Array3<f32>> {
    let (data, shape) = output;
    if shape.len() != 4 || shape[0] != 1 || shape[3] != num_keypoints {
        return Err(PipelineError::PredictError(format!(
            "Unexpected score-map shape {shape:?}, expected (1, h, w, {num_keypoints})"
        )));
    }
    Array3::from_shape_vec((shape[1], shape[2], shape[3]), data.clone())
        .map_err(|e| PipelineError::PredictError(format!("Score-map reshape failed: {e}")))
}

/// Reshape the raw location-refinement output (1, h, w, 2K) into (h, w, 2K).
fn reshape_locref(output: &(Vec<f32>, Vec<usize>), num_keypoints: usize) -> Result<Array3<f32>> {
    let (data, shape) = output;
    if shape.len() != 4 || shape[0] != 1 || shape[3] != 2 * num_keypoints {
        return Err(PipelineError::PredictError(format!(
            "Unexpected locref shape {shape:?}, expected (1, h, w, {})",
            2 * num_keypoints
        )));
    }
    Array3::from_shape_vec((shape[1], shape[2], shape[3]), data.clone())
        .map_err(|e| PipelineError::PredictError(format!("Locref reshape failed: {e}")))
}

/// Decode score maps into per-keypoint (x, y, likelihood) triples.
///
/// For each keypoint the score map's argmax cell is mapped back to image
/// coordinates at the cell center (`stride / 2`), then shifted by the
/// location-refinement offsets (stored as (dx, dy) pairs per keypoint,
/// scaled by `locref_stdev`) when available. The likelihood is the score at
/// the argmax cell.
pub fn decode_pose(
    scoremap: &Array3<f32>,
    locref: Option<&Array3<f32>>,
    stride: f32,
    locref_stdev: f32,
) -> Result<PoseEstimate> {
    let (rows, cols, num_keypoints) = scoremap.dim();
    if rows == 0 || cols == 0 {
        return Err(PipelineError::PredictError(
            "Empty score map".to_string(),
        ));
    }

    let mut triples = Vec::with_capacity(num_keypoints);
    for k in 0..num_keypoints {
        let mut best = (0usize, 0usize);
        let mut best_score = f32::NEG_INFINITY;
        for y in 0..rows {
            for x in 0..cols {
                let score = scoremap[[y, x, k]];
                if score > best_score {
                    best_score = score;
                    best = (y, x);
                }
            }
        }

        let (y, x) = best;
        let (dx, dy) = locref.map_or((0.0, 0.0), |l| {
            (
                l[[y, x, 2 * k]] * locref_stdev,
                l[[y, x, 2 * k + 1]] * locref_stdev,
            )
        });

        #[allow(clippy::cast_precision_loss)]
        let pos_x = (x as f32).mul_add(stride, 0.5 * stride) + dx;
        #[allow(clippy::cast_precision_loss)]
        let pos_y = (y as f32).mul_add(stride, 0.5 * stride) + dy;

        triples.push((pos_x, pos_y, best_score));
    }

    Ok(PoseEstimate::from_triples(&triples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pose_argmax() {
        // Two keypoints on a 4x4 grid, stride 8, no refinement.
        let mut scoremap = Array3::zeros((4, 4, 2));
        scoremap[[1, 2, 0]] = 0.9;
        scoremap[[3, 0, 1]] = 0.7;

        let pose = decode_pose(&scoremap, None, 8.0, 7.2801).unwrap();
        assert_eq!(pose.len(), 2);

        // Cell (y=1, x=2) maps to the cell center (2*8+4, 1*8+4).
        let (x, y, likelihood) = pose.keypoint(0);
        assert!((x - 20.0).abs() < 1e-5);
        assert!((y - 12.0).abs() < 1e-5);
        assert!((likelihood - 0.9).abs() < 1e-5);

        let (x, y, likelihood) = pose.keypoint(1);
        assert!((x - 4.0).abs() < 1e-5);
        assert!((y - 28.0).abs() < 1e-5);
        assert!((likelihood - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_decode_pose_with_refinement() {
        let mut scoremap = Array3::zeros((2, 2, 1));
        scoremap[[0, 1, 0]] = 0.8;

        let mut locref = Array3::zeros((2, 2, 2));
        locref[[0, 1, 0]] = 0.5; // dx before scaling
        locref[[0, 1, 1]] = -0.25; // dy before scaling

        let pose = decode_pose(&scoremap, Some(&locref), 8.0, 2.0).unwrap();
        let (x, y, _) = pose.keypoint(0);
        // Cell center (12, 4) plus scaled offsets (1.0, -0.5).
        assert!((x - 13.0).abs() < 1e-5);
        assert!((y - 3.5).abs() < 1e-5);
    }

    #[test]
    fn test_decode_pose_empty_map() {
        let scoremap = Array3::zeros((0, 0, 1));
        assert!(decode_pose(&scoremap, None, 8.0, 1.0).is_err());
    }

    #[test]
    fn test_image_to_input_shape() {
        let img = DynamicImage::new_rgb8(6, 4);
        let input = image_to_input(&img);
        assert_eq!(input.shape(), &[1, 4, 6, 3]);
    }

    #[test]
    fn test_image_to_input_values() {
        let mut buf = image::RgbImage::new(2, 1);
        buf.put_pixel(0, 0, image::Rgb([10, 20, 30]));
        buf.put_pixel(1, 0, image::Rgb([40, 50, 60]));
        let input = image_to_input(&DynamicImage::ImageRgb8(buf));

        assert!((input[[0, 0, 0, 0]] - 10.0).abs() < f32::EPSILON);
        assert!((input[[0, 0, 1, 2]] - 60.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_reshape_scoremap_bad_shape() {
        let output = (vec![0.0; 8], vec![1, 2, 2, 2]);
        assert!(reshape_scoremap(&output, 3).is_err());
        assert!(reshape_scoremap(&output, 2).is_ok());
    }
}
