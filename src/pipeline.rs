// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Per-video analysis.
//!
//! A video moves through `pending → reading-frames → (complete | truncated)`
//! here; the walker owns the `failed` outcome (any error returned from
//! [`analyze_video`]) and the final write.

use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use image::DynamicImage;

use crate::error::Result;
use crate::model::FramePredictor;
use crate::results::{PredictionTable, RunMetadata, VideoOutcome};
use crate::verbose;
use crate::video::VideoReader;

/// Completed analysis of one video, ready to be written.
#[derive(Debug)]
pub struct VideoAnalysis {
    /// The assembled prediction table.
    pub table: PredictionTable,
    /// The per-video run record.
    pub metadata: RunMetadata,
    /// Whether every declared frame was read.
    pub outcome: VideoOutcome,
}

/// Analyze a single video with the given predictor.
///
/// Decode failures mid-stream truncate the frame sequence and still produce
/// a result; predictor failures abort this video only and surface as `Err`.
///
/// # Errors
///
/// Returns an error if the video cannot be opened or a predictor call fails.
pub fn analyze_video(video: &Path, predictor: &mut dyn FramePredictor) -> Result<VideoAnalysis> {
    let reader = VideoReader::open(video)?;
    let frame_count = reader.frame_count();
    let fps = reader.fps();
    let frame_dimensions = (reader.height(), reader.width());

    let start = unix_time();
    let timer = Instant::now();

    let (table, frames_read) = collect_poses(reader, frame_count, predictor)?;

    let stop = unix_time();
    let outcome = if frames_read < frame_count {
        VideoOutcome::Truncated
    } else {
        VideoOutcome::Complete
    };

    let metadata = RunMetadata {
        start,
        stop,
        run_duration: timer.elapsed().as_secs_f64(),
        scorer: predictor.scorer().to_string(),
        network_config: predictor.network_config().clone(),
        fps,
        frame_dimensions,
        frame_count,
    };

    Ok(VideoAnalysis {
        table,
        metadata,
        outcome,
    })
}

/// Run the frame loop: predict every frame and fill the table.
///
/// The table is allocated at the declared frame count; rows past the last
/// yielded frame stay zero. Frames beyond the declared count are ignored.
///
/// # Errors
///
/// Returns the first predictor error encountered.
pub fn collect_poses<I>(
    frames: I,
    frame_count: usize,
    predictor: &mut dyn FramePredictor,
) -> Result<(PredictionTable, usize)>
where
    I: IntoIterator<Item = DynamicImage>,
{
    let mut table = PredictionTable::new(predictor.keypoint_names().to_vec(), frame_count);
    let mut frames_read = 0;

    for (frame_idx, frame) in frames.into_iter().enumerate() {
        if frame_idx >= frame_count {
            break;
        }
        let pose = predictor.predict(&frame)?;
        table.set_row(frame_idx, &pose)?;
        frames_read = frame_idx + 1;
        verbose!("frame {}/{}", frame_idx + 1, frame_count);
    }

    Ok((table, frames_read))
}

/// Wall-clock time as seconds since the Unix epoch.
fn unix_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
