// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Writing prediction tables and metadata sidecars.
//!
//! The table is a CSV with a two-level column header (keypoint names, then
//! coords) and a leading frame-index column; the sidecar is a JSON record
//! derived from the table path. Writes are unconditional overwrites with no
//! partial-write protection.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::results::{PredictionTable, RunMetadata};

/// File extension of prediction tables.
pub const TABLE_EXTENSION: &str = "csv";

/// Suffix replacing the table extension for the metadata sidecar.
pub const METADATA_SUFFIX: &str = "_metadata.json";

/// Derive the table output path for a video within a session.
#[must_use]
pub fn table_path(session: &Path, pose_subfolder: &str, video: &Path) -> PathBuf {
    let basename = video.file_stem().unwrap_or_default().to_string_lossy();
    session
        .join(pose_subfolder)
        .join(format!("{basename}.{TABLE_EXTENSION}"))
}

/// Derive the metadata sidecar path from a table path.
#[must_use]
pub fn metadata_path(table: &Path) -> PathBuf {
    let basename = table.file_stem().unwrap_or_default().to_string_lossy();
    table.with_file_name(format!("{basename}{METADATA_SUFFIX}"))
}

/// Write a prediction table, creating the output directory if needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the write fails.
pub fn write_table(path: &Path, table: &PredictionTable) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            PipelineError::IoError(format!(
                "Failed to create directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let mut writer = csv::Writer::from_path(path)?;

    let mut bodyparts = Vec::with_capacity(table.ncols() + 1);
    let mut coords = Vec::with_capacity(table.ncols() + 1);
    bodyparts.push("bodyparts".to_string());
    coords.push("coords".to_string());
    for name in table.keypoint_names() {
        for coord in ["x", "y", "likelihood"] {
            bodyparts.push(name.clone());
            coords.push(coord.to_string());
        }
    }
    writer.write_record(&bodyparts)?;
    writer.write_record(&coords)?;

    for frame_idx in 0..table.nrows() {
        let mut record = Vec::with_capacity(table.ncols() + 1);
        record.push(frame_idx.to_string());
        for value in table.row(frame_idx) {
            record.push(value.to_string());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the run metadata sidecar, creating the output directory if needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the write fails.
pub fn write_metadata(path: &Path, metadata: &RunMetadata) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            PipelineError::IoError(format!(
                "Failed to create directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let file = File::create(path).map_err(|e| {
        PipelineError::IoError(format!("Failed to create {}: {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), metadata)?;
    Ok(())
}

/// Check whether a previously-written table exists and is readable.
///
/// An existing valid table means the video was already analyzed and can be
/// skipped; staleness and content are deliberately not inspected.
#[must_use]
pub fn table_is_valid(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    let Ok(mut reader) = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
    else {
        return false;
    };

    let mut records = reader.records();
    let Some(Ok(bodyparts)) = records.next() else {
        return false;
    };
    let Some(Ok(coords)) = records.next() else {
        return false;
    };

    bodyparts.get(0) == Some("bodyparts")
        && coords.get(0) == Some("coords")
        && bodyparts.len() == coords.len()
        && bodyparts.len() > 1
        && (bodyparts.len() - 1) % 3 == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netcfg::NetworkConfig;
    use crate::results::PoseEstimate;

    fn sample_table() -> PredictionTable {
        let mut table =
            PredictionTable::new(vec!["snout".to_string(), "tail".to_string()], 3);
        let pose = PoseEstimate::from_triples(&[(1.5, 2.5, 0.5), (3.0, 4.0, 0.25)]);
        table.set_row(0, &pose).unwrap();
        table
    }

    #[test]
    fn test_path_derivation() {
        let session = Path::new("/data/2024-01-01");
        let video = Path::new("/data/2024-01-01/videos-raw/vid_cam1.avi");
        let table = table_path(session, "pose-2d", video);
        assert_eq!(
            table,
            PathBuf::from("/data/2024-01-01/pose-2d/vid_cam1.csv")
        );
        assert_eq!(
            metadata_path(&table),
            PathBuf::from("/data/2024-01-01/pose-2d/vid_cam1_metadata.json")
        );
    }

    #[test]
    fn test_write_and_validate_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pose-2d").join("vid_a.csv");

        write_table(&path, &sample_table()).unwrap();
        assert!(table_is_valid(&path));

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "bodyparts,snout,snout,snout,tail,tail,tail"
        );
        assert_eq!(lines.next().unwrap(), "coords,x,y,likelihood,x,y,likelihood");
        assert_eq!(lines.next().unwrap(), "0,1.5,2.5,0.5,3,4,0.25");
        // Unpopulated rows are written zero-filled.
        assert_eq!(lines.next().unwrap(), "1,0,0,0,0,0,0");
    }

    #[test]
    fn test_validity_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vid_a.csv");

        assert!(!table_is_valid(&path));

        std::fs::write(&path, "just,a,csv\n1,2,3\n").unwrap();
        assert!(!table_is_valid(&path));

        std::fs::write(&path, "").unwrap();
        assert!(!table_is_valid(&path));
    }

    #[test]
    fn test_metadata_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vid_a_metadata.json");

        let metadata = RunMetadata {
            start: 100.0,
            stop: 130.0,
            run_duration: 30.0,
            scorer: "leg-tracking-snapshot-300000".to_string(),
            network_config: NetworkConfig {
                all_joints_names: vec!["snout".to_string()],
                ..NetworkConfig::default()
            },
            fps: 30.0,
            frame_dimensions: (480, 640),
            frame_count: 10,
        };
        write_metadata(&path, &metadata).unwrap();

        let loaded: RunMetadata =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.frame_count, 10);
        assert_eq!(loaded.frame_dimensions, (480, 640));
        assert_eq!(loaded.scorer, metadata.scorer);
        assert_eq!(loaded.network_config.all_joints_names, vec!["snout"]);
    }
}
