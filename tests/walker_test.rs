// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Integration tests for the session walker.

use std::fs;
use std::path::Path;

use image::DynamicImage;
use pose_pipeline::output::{metadata_path, table_is_valid, write_table};
use pose_pipeline::{
    FramePredictor, NetworkConfig, PipelineConfig, PoseEstimate, PredictionTable, Result,
    SessionWalker,
};

/// Predictor stand-in that counts invocations.
struct CountingPredictor {
    netcfg: NetworkConfig,
    calls: usize,
}

impl CountingPredictor {
    fn new() -> Self {
        Self {
            netcfg: NetworkConfig {
                all_joints_names: vec!["snout".to_string(), "tail".to_string()],
                ..NetworkConfig::default()
            },
            calls: 0,
        }
    }
}

impl FramePredictor for CountingPredictor {
    fn network_config(&self) -> &NetworkConfig {
        &self.netcfg
    }

    fn scorer(&self) -> &str {
        "counting-stub"
    }

    fn predict(&mut self, _image: &DynamicImage) -> Result<PoseEstimate> {
        self.calls += 1;
        Ok(PoseEstimate::from_triples(&[(1.0, 1.0, 0.9), (2.0, 2.0, 0.8)]))
    }
}

fn config_for(root: &Path) -> PipelineConfig {
    toml::from_str(&format!(
        r#"
path = "{}"
model_folder = "/tmp/models"
model_name = "test"
model_train_iter = 1
"#,
        root.display()
    ))
    .unwrap()
}

fn write_valid_output(session: &Path, basename: &str) {
    let mut table = PredictionTable::new(vec!["snout".to_string(), "tail".to_string()], 2);
    let pose = PoseEstimate::from_triples(&[(1.0, 1.0, 0.9), (2.0, 2.0, 0.8)]);
    table.set_row(0, &pose).unwrap();
    write_table(
        &session.join("pose-2d").join(format!("{basename}.csv")),
        &table,
    )
    .unwrap();
}

#[test]
fn test_existing_output_skips_inference() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("2024-01-01");
    fs::create_dir_all(session.join("videos-raw")).unwrap();
    fs::write(session.join("videos-raw").join("vid_a.avi"), b"garbage").unwrap();
    write_valid_output(&session, "vid_a");

    let table = session.join("pose-2d").join("vid_a.csv");
    let before = fs::read_to_string(&table).unwrap();

    let walker = SessionWalker::new(config_for(dir.path()));
    let mut predictor = CountingPredictor::new();
    let summary = walker.run(&mut predictor).unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.analyzed, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(predictor.calls, 0);
    // The existing output is left untouched.
    assert_eq!(fs::read_to_string(&table).unwrap(), before);
    // No metadata sidecar appears for a skipped video.
    assert!(!metadata_path(&table).exists());
}

#[test]
fn test_rerun_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("2024-01-01");
    fs::create_dir_all(session.join("videos-raw")).unwrap();
    fs::write(session.join("videos-raw").join("vid_a.avi"), b"garbage").unwrap();
    write_valid_output(&session, "vid_a");

    let walker = SessionWalker::new(config_for(dir.path()));
    let mut predictor = CountingPredictor::new();

    let first = walker.run(&mut predictor).unwrap();
    let second = walker.run(&mut predictor).unwrap();

    assert_eq!(first, second);
    assert_eq!(predictor.calls, 0);
}

#[test]
fn test_undecodable_video_fails_without_aborting_run() {
    let dir = tempfile::tempdir().unwrap();

    // First session holds a video that cannot be decoded and has no output.
    let bad_session = dir.path().join("2024-01-01");
    fs::create_dir_all(bad_session.join("videos-raw")).unwrap();
    fs::write(bad_session.join("videos-raw").join("vid_bad.avi"), b"garbage").unwrap();

    // Second session is already analyzed.
    let good_session = dir.path().join("2024-01-02");
    fs::create_dir_all(good_session.join("videos-raw")).unwrap();
    fs::write(good_session.join("videos-raw").join("vid_a.avi"), b"garbage").unwrap();
    write_valid_output(&good_session, "vid_a");

    let walker = SessionWalker::new(config_for(dir.path()));
    let mut predictor = CountingPredictor::new();
    let summary = walker.run(&mut predictor).unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.analyzed, 0);
    // Nothing is written for the failed video.
    assert!(!bad_session.join("pose-2d").join("vid_bad.csv").exists());
}

#[test]
fn test_invalid_existing_output_is_not_a_skip() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("2024-01-01");
    fs::create_dir_all(session.join("videos-raw")).unwrap();
    fs::create_dir_all(session.join("pose-2d")).unwrap();
    fs::write(session.join("videos-raw").join("vid_a.avi"), b"garbage").unwrap();
    // A stale half-written output must not count as analyzed.
    fs::write(session.join("pose-2d").join("vid_a.csv"), "bodyparts").unwrap();

    assert!(!table_is_valid(&session.join("pose-2d").join("vid_a.csv")));

    let walker = SessionWalker::new(config_for(dir.path()));
    let mut predictor = CountingPredictor::new();
    let summary = walker.run(&mut predictor).unwrap();

    // The video is retried; with an undecodable file that means failed.
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.failed, 1);
}

#[test]
fn test_sessions_and_videos_enumerated_in_order() {
    let dir = tempfile::tempdir().unwrap();
    for session in ["b-session", "a-session"] {
        let raw = dir.path().join(session).join("videos-raw");
        fs::create_dir_all(&raw).unwrap();
        fs::write(raw.join("vid_2.avi"), b"x").unwrap();
        fs::write(raw.join("vid_1.avi"), b"x").unwrap();
    }

    let walker = SessionWalker::new(config_for(dir.path()));
    let sessions = walker.sessions().unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions[0].ends_with("a-session"));
    assert!(sessions[1].ends_with("b-session"));

    let videos = walker.raw_videos(&sessions[0]).unwrap();
    let names: Vec<_> = videos
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, ["vid_1.avi", "vid_2.avi"]);
}
