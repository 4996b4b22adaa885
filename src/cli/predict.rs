// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

use crate::cli::args::PredictArgs;
use crate::inference::PosturePredictor;
use crate::io::save_raster;
use crate::label::Label;
use crate::onnx::{OnnxClassifier, YoloPoseEstimator};
use crate::{error, info, success, verbose};

/// Classify the posture in a single image.
pub fn run_prediction(args: &PredictArgs) {
    crate::cli::logging::set_verbose(args.pipeline.verbose);
    let config = args.pipeline.to_config();

    let predictor = YoloPoseEstimator::load(&args.pose_model)
        .map(|estimator| estimator.with_imgsz(args.pipeline.imgsz))
        .and_then(|estimator| Ok((estimator, OnnxClassifier::load(&args.classifier)?)))
        .and_then(|(estimator, classifier)| PosturePredictor::new(estimator, classifier, config));
    let predictor = match predictor {
        Ok(predictor) => predictor,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    if let Some(path) = &args.save_skeleton {
        let saved = predictor
            .skeleton(&args.source)
            .and_then(|raster| save_raster(&raster, path).map(|()| raster.size()));
        match saved {
            Ok(size) => success!("Skeleton ({size}x{size}) saved to {path}"),
            Err(e) => {
                error!("{}: {e}", args.source);
                process::exit(1);
            }
        }
    }

    match predictor.infer_timed(&args.source) {
        Ok((prediction, speed)) => {
            for label in Label::ALL {
                verbose!("  {:<8} {:.3}", label.as_str(), prediction.prob(label));
            }
            verbose!(
                "Speed: {:.1}ms pose, {:.1}ms raster, {:.1}ms classify",
                speed.pose,
                speed.raster,
                speed.classify
            );
            info!("RESULT: {}", prediction.label);
        }
        Err(e) => {
            error!("{}: {e}", args.source);
            process::exit(1);
        }
    }
}
