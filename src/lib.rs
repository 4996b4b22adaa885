// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Posture Skeleton
//!
//! Turns photos of people into normalized skeleton images for posture
//! classification. A pose estimator finds the keypoints of the most prominent
//! person; the keypoints are rescaled into a fixed square frame and drawn as a
//! stick figure. The same skeleton images feed both dataset preparation and
//! single-image inference, so the classifier always sees the representation it
//! was trained on.
//!
//! ## Pipeline
//!
//! 1. **Normalize** ([`normalize()`]) - confident keypoints define a bounding box
//!    that is stretched onto `[0, S]` per axis.
//! 2. **Rasterize** ([`visualizer::rasterize`]) - confident bones are drawn in
//!    green, their joints in red, onto an `S × S` black canvas.
//! 3. **Augment** ([`augment`]) - optional integer jitter per keypoint produces
//!    synthetic training variants.
//! 4. **Batch** ([`batch::BatchRunner`]) - a `subject/label/image` dataset is
//!    fanned out over a bounded worker pool and mirrored into an output tree.
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use posture_skeleton::PipelineConfig;
//! use posture_skeleton::inference::PosturePredictor;
//! use posture_skeleton::onnx::{OnnxClassifier, YoloPoseEstimator};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let predictor = PosturePredictor::new(
//!         YoloPoseEstimator::load("yolo11n-pose.onnx")?,
//!         OnnxClassifier::load("posture.onnx")?,
//!         PipelineConfig::default(),
//!     )?;
//!
//!     let prediction = predictor.infer("photo.jpg")?;
//!     println!("RESULT: {} ({:.2})", prediction.label, prediction.confidence);
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Real skeletons, one per photo
//! posture-skeleton prepare --data data/ --output processed/ --fake-output fake/ \
//!     --pose-model yolo11n-pose.onnx
//!
//! # 50 jittered skeletons per photo, reproducible
//! posture-skeleton prepare -d data/ -o processed/ -f fake/ -p yolo11n-pose.onnx \
//!     --mode synthetic --count 50 --seed 7
//!
//! # Classify one photo
//! posture-skeleton predict -p yolo11n-pose.onnx -c posture.onnx -s photo.jpg
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`pose`] | [`Pose`] and [`Keypoint`] containers |
//! | [`normalize`](mod@normalize) | Bounding-box normalization into the raster frame |
//! | [`visualizer`] | Bone table, palette and rasterizer |
//! | [`augment`] | Synthetic keypoint jitter |
//! | [`dataset`] | `subject/label/image` discovery and mirroring |
//! | [`batch`] | Parallel dataset processing with cancellation |
//! | [`inference`] | Single-image [`inference::PosturePredictor`] |
//! | [`model`] | [`PoseEstimator`] and [`Classifier`] traits |
//! | [`onnx`] | ONNX Runtime implementations of the model traits |
//! | [`config`] | [`PipelineConfig`] |
//! | [`error`] | Error types ([`PostureError`], [`Result`]) |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `onnx` | ONNX Runtime pose estimator and classifier, and the CLI (default) |
//!
//! ## License
//!
//! This project is licensed under [AGPL-3.0](https://ultralytics.com/license).

// Modules
pub mod augment;
pub mod batch;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod inference;
pub mod io;
pub mod label;
pub mod model;
pub mod normalize;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod pose;
pub mod utils;
pub mod visualizer;

// Re-export main types for convenience
pub use config::PipelineConfig;
pub use error::{PostureError, Result};
pub use label::Label;
pub use model::{Classifier, PoseEstimator};
pub use normalize::normalize;
pub use pose::{Keypoint, Pose, Position};
pub use visualizer::{SkeletonRaster, rasterize};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "posture-skeleton");
    }
}
