// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Model collaborator interfaces.
//!
//! The pipeline never talks to a concrete network. It consumes a
//! [`PoseEstimator`] to turn pixels into keypoints and a [`Classifier`] to turn
//! a skeleton raster into label scores. ONNX Runtime implementations live in
//! [`crate::onnx`] behind the `onnx` feature; tests plug in fakes.

use std::sync::Arc;

use image::DynamicImage;

use crate::error::Result;
use crate::pose::Pose;
use crate::visualizer::SkeletonRaster;

/// Single-person pose estimation.
///
/// Implementations are shared across batch workers, hence `Send + Sync`.
pub trait PoseEstimator: Send + Sync {
    /// Estimate the most prominent pose in `image`, in source-image pixels.
    ///
    /// An image with nobody in it is not an error: return a pose whose
    /// presence score is zero (see [`Pose::empty`]).
    ///
    /// # Errors
    ///
    /// Returns [`crate::PostureError::InferenceError`] if the model run fails.
    fn estimate(&self, image: &DynamicImage) -> Result<Pose>;
}

/// Posture classification over skeleton rasters.
pub trait Classifier: Send + Sync {
    /// Score `raster` against every label, in [`crate::Label::ALL`] order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PostureError::InferenceError`] if the model run fails.
    fn predict(&self, raster: &SkeletonRaster) -> Result<Vec<f32>>;
}

impl<T: PoseEstimator + ?Sized> PoseEstimator for Arc<T> {
    fn estimate(&self, image: &DynamicImage) -> Result<Pose> {
        (**self).estimate(image)
    }
}

impl<T: PoseEstimator + ?Sized> PoseEstimator for &T {
    fn estimate(&self, image: &DynamicImage) -> Result<Pose> {
        (**self).estimate(image)
    }
}

impl<T: Classifier + ?Sized> Classifier for Arc<T> {
    fn predict(&self, raster: &SkeletonRaster) -> Result<Vec<f32>> {
        (**self).predict(raster)
    }
}

impl<T: Classifier + ?Sized> Classifier for &T {
    fn predict(&self, raster: &SkeletonRaster) -> Result<Vec<f32>> {
        (**self).predict(raster)
    }
}
