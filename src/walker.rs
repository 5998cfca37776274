// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Session-tree walking.
//!
//! A run enumerates session folders under the root in lexicographic order,
//! and within each session the raw videos matching the naming convention.
//! Videos whose output table already exists and is valid are skipped, so
//! re-running over an unchanged tree performs no inference at all.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::model::FramePredictor;
use crate::output;
use crate::pipeline::analyze_video;
use crate::results::VideoOutcome;
use crate::{error, info, verbose, warn};

/// Prefix a raw video file name must carry to be picked up.
const VIDEO_PREFIX: &str = "vid";

/// Counters for one walk over the session tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Videos analyzed and written (includes truncated ones).
    pub analyzed: usize,
    /// Analyzed videos whose stream ended before the declared frame count.
    pub truncated: usize,
    /// Videos skipped because a valid output already existed.
    pub skipped: usize,
    /// Videos that failed to open or predict; nothing was written for them.
    pub failed: usize,
}

impl RunSummary {
    /// Total number of candidate videos seen.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.analyzed + self.skipped + self.failed
    }
}

/// Walks a session tree and runs the per-video pipeline on unprocessed
/// videos.
pub struct SessionWalker {
    config: PipelineConfig,
}

impl SessionWalker {
    /// Create a walker over the configured session tree.
    #[must_use]
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The walker's configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Session folders under the root, lexicographically sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a readable directory.
    pub fn sessions(&self) -> Result<Vec<PathBuf>> {
        let root = &self.config.path;
        if !root.is_dir() {
            return Err(PipelineError::ConfigError(format!(
                "Not a directory: {}",
                root.display()
            )));
        }

        let mut sessions: Vec<PathBuf> = fs::read_dir(root)
            .map_err(|e| {
                PipelineError::IoError(format!("Failed to read {}: {e}", root.display()))
            })?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();

        sessions.sort();
        Ok(sessions)
    }

    /// Raw videos within one session, lexicographically sorted.
    ///
    /// A session without a raw-video subfolder simply has no videos.
    ///
    /// # Errors
    ///
    /// Returns an error if the raw-video subfolder cannot be read.
    pub fn raw_videos(&self, session: &Path) -> Result<Vec<PathBuf>> {
        let dir = session.join(&self.config.pipeline_videos_raw);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let extension = self.config.video_extension.to_lowercase();
        let mut videos: Vec<PathBuf> = fs::read_dir(&dir)
            .map_err(|e| PipelineError::IoError(format!("Failed to read {}: {e}", dir.display())))?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_raw_video(path, &extension))
            .collect();

        videos.sort();
        Ok(videos)
    }

    /// Expected table output path for a video within a session.
    #[must_use]
    pub fn table_path(&self, session: &Path, video: &Path) -> PathBuf {
        output::table_path(session, &self.config.pipeline_pose_2d, video)
    }

    /// Walk the whole tree, analyzing every unprocessed video.
    ///
    /// Per-video failures are logged and counted; they do not abort the
    /// walk. Output-write failures do, since the run cannot make progress
    /// without a writable tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be enumerated or an output write
    /// fails.
    pub fn run(&self, predictor: &mut dyn FramePredictor) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for session in self.sessions()? {
            info!(
                "{}",
                session.file_name().unwrap_or_default().to_string_lossy()
            );

            for video in self.raw_videos(&session)? {
                let table_path = self.table_path(&session, &video);

                if output::table_is_valid(&table_path) {
                    verbose!("Already analyzed: {}", table_path.display());
                    summary.skipped += 1;
                    continue;
                }

                info!("{}", table_path.display());
                match analyze_video(&video, predictor) {
                    Ok(analysis) => {
                        if analysis.outcome == VideoOutcome::Truncated {
                            warn!(
                                "Stream ended early: {} of {} frames read from {}",
                                analysis.table.populated_rows(),
                                analysis.metadata.frame_count,
                                video.display()
                            );
                            summary.truncated += 1;
                        }
                        output::write_table(&table_path, &analysis.table)?;
                        output::write_metadata(
                            &output::metadata_path(&table_path),
                            &analysis.metadata,
                        )?;
                        summary.analyzed += 1;
                    }
                    Err(e) => {
                        error!("Failed to analyze {}: {e}", video.display());
                        summary.failed += 1;
                    }
                }
            }
        }

        Ok(summary)
    }
}

/// Check the raw-video naming convention: `vid*` with the configured
/// extension (case-insensitive).
fn is_raw_video(path: &Path, extension: &str) -> bool {
    if !path.is_file() {
        return false;
    }
    let prefix_ok = path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with(VIDEO_PREFIX));
    let extension_ok = path
        .extension()
        .is_some_and(|ext| ext.to_string_lossy().to_lowercase() == extension);
    prefix_ok && extension_ok
}
