// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

use crate::cli::args::AnalyzeArgs;
use crate::cli::logging::set_verbose;
use crate::config::PipelineConfig;
use crate::model::{FramePredictor, PoseModel};
use crate::walker::SessionWalker;
use crate::{NAME, VERSION, error, info};

/// Run batch pose estimation over the configured session tree.
pub fn run_analysis(args: &AnalyzeArgs) {
    set_verbose(args.verbose);

    let mut config = match PipelineConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    // Command-line overrides win over the config file.
    if let Some(path) = &args.path {
        config.path = path.clone();
    }
    if let Some(model_folder) = &args.model_folder {
        config.model_folder = model_folder.clone();
    }
    if let Some(model_name) = &args.model_name {
        config.model_name = model_name.clone();
    }
    if let Some(train_iter) = args.model_train_iter {
        config.model_train_iter = train_iter;
    }

    let mut model = match PoseModel::load(&config) {
        Ok(model) => model,
        Err(e) => {
            error!("Error loading model: {e}");
            process::exit(1);
        }
    };

    info!("{NAME} {VERSION}");
    info!("Scorer: {}", model.scorer());
    info!("Keypoints: {}", model.keypoint_names().join(", "));
    info!("");

    let walker = SessionWalker::new(config);
    match walker.run(&mut model) {
        Ok(summary) => {
            info!("");
            info!(
                "{} analyzed ({} truncated), {} skipped, {} failed of {} videos",
                summary.analyzed,
                summary.truncated,
                summary.skipped,
                summary.failed,
                summary.total()
            );
        }
        Err(e) => {
            error!("Run failed: {e}");
            process::exit(1);
        }
    }
}
