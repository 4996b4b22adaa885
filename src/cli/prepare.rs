// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

use crate::batch::{BatchMode, BatchRunner, CancelToken};
use crate::cli::args::{Mode, PrepareArgs};
use crate::dataset::DatasetLayout;
use crate::onnx::YoloPoseEstimator;
use crate::utils::count_noun;
use crate::{VERSION, error, info, section, verbose, warn};

/// Build skeleton images for a labeled dataset.
pub fn run_prepare(args: &PrepareArgs) {
    crate::cli::logging::set_verbose(args.pipeline.verbose);
    let config = args.to_config();
    if let Err(e) = config.validate() {
        error!("{e}");
        process::exit(1);
    }

    section!("posture-skeleton {VERSION} prepare");

    let estimator = match YoloPoseEstimator::load(&args.pose_model) {
        Ok(estimator) => estimator.with_imgsz(args.pipeline.imgsz),
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };
    verbose!("Loaded {} (imgsz {})", args.pose_model, estimator.imgsz());

    let layout = match DatasetLayout::scan(&args.data) {
        Ok(layout) => layout,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };
    verbose!(
        "{} across {} in {}",
        count_noun(layout.image_count(), "image"),
        count_noun(layout.subjects().len(), "subject"),
        layout.root().display()
    );

    for (subject, label) in layout.unknown_labels() {
        warn!("{subject}/{label} is not a posture label, processing anyway");
    }

    let token = CancelToken::new();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        warn!("Interrupted, finishing in-flight images...");
        handler_token.cancel();
    }) {
        warn!("Failed to install Ctrl-C handler: {e}");
    }

    let mode = match args.mode {
        Mode::Real => BatchMode::Real,
        Mode::Synthetic => BatchMode::synthetic(&config),
    };

    let runner = match BatchRunner::new(estimator, config, &args.output, &args.fake_output) {
        Ok(runner) => runner.with_cancel_token(token),
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };
    if let Err(e) = runner.prepare_outputs(&layout) {
        error!("{e}");
        process::exit(1);
    }

    match runner.run(&layout, mode) {
        Ok(report) => {
            if !report.is_clean() {
                warn!(
                    "{} skipped, {} cancelled",
                    count_noun(report.skipped.len(), "image"),
                    report.cancelled
                );
            }
            for skipped in &report.skipped {
                verbose!("  skipped {} ({})", skipped.path.display(), skipped.reason.kind());
            }
            info!(
                "Results saved to {}",
                runner.output_root(mode).display()
            );
            if report.cancelled > 0 {
                process::exit(130);
            }
        }
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}
