// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Single-image posture inference.
//!
//! [`PosturePredictor`] chains the same normalizer and rasterizer used to build
//! the training set with a [`Classifier`], so a photo is judged on exactly the
//! kind of skeleton image the classifier was trained on.

use std::path::Path;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::error::{PostureError, Result};
use crate::io::decode_image;
use crate::label::Label;
use crate::model::{Classifier, PoseEstimator};
use crate::normalize::normalize;
use crate::utils::{argmax, to_probabilities};
use crate::visualizer::{SkeletonRaster, rasterize};

/// Outcome of classifying one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Most likely posture.
    pub label: Label,
    /// Probability of `label`.
    pub confidence: f32,
    /// Probability per label, in [`Label::ALL`] order.
    pub probs: Vec<f32>,
}

impl Prediction {
    /// Build a prediction from raw classifier scores.
    ///
    /// # Errors
    ///
    /// Returns [`PostureError::InferenceError`] if the score count does not
    /// match the label set.
    pub fn from_scores(scores: &[f32]) -> Result<Self> {
        if scores.len() != Label::COUNT {
            return Err(PostureError::InferenceError(format!(
                "classifier returned {} scores, expected {}",
                scores.len(),
                Label::COUNT
            )));
        }

        let probs = to_probabilities(scores);
        let (index, confidence) = argmax(&probs)
            .ok_or_else(|| PostureError::InferenceError("empty classifier output".to_string()))?;
        let label = Label::from_index(index).ok_or_else(|| {
            PostureError::InferenceError(format!("no label for class index {index}"))
        })?;

        Ok(Self {
            label,
            confidence,
            probs,
        })
    }

    /// Probability assigned to `label`.
    #[must_use]
    pub fn prob(&self, label: Label) -> f32 {
        self.probs.get(label.index()).copied().unwrap_or(0.0)
    }
}

/// Timing of one inference call, in milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Speed {
    /// Decode, pose estimation and normalization.
    pub pose: f64,
    /// Rasterization.
    pub raster: f64,
    /// Classification.
    pub classify: f64,
}

/// Pose estimator plus classifier, sharing one pipeline configuration.
pub struct PosturePredictor<P: PoseEstimator, C: Classifier> {
    estimator: P,
    classifier: C,
    config: PipelineConfig,
}

impl<P: PoseEstimator, C: Classifier> PosturePredictor<P, C> {
    /// Create a predictor.
    ///
    /// # Errors
    ///
    /// Returns [`PostureError::ConfigError`] if the configuration is invalid.
    pub fn new(estimator: P, classifier: C, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            estimator,
            classifier,
            config,
        })
    }

    /// Build the skeleton raster the classifier would see for `path`.
    ///
    /// # Errors
    ///
    /// Propagates decode, estimation and normalization errors.
    pub fn skeleton(&self, path: impl AsRef<Path>) -> Result<SkeletonRaster> {
        let image = decode_image(path)?;
        let pose = self.estimator.estimate(&image)?;
        let normalized = normalize(&pose, &self.config)?;
        Ok(rasterize(&normalized, &self.config))
    }

    /// Classify the posture in the image at `path`.
    ///
    /// # Errors
    ///
    /// * [`PostureError::DecodeError`] for unreadable images.
    /// * [`PostureError::NoPersonDetected`] / [`PostureError::DegenerateBoundingBox`]
    ///   when the pose is rejected.
    /// * [`PostureError::InferenceError`] when a model run fails or the
    ///   classifier output does not match the label set.
    pub fn infer(&self, path: impl AsRef<Path>) -> Result<Prediction> {
        self.infer_timed(path).map(|(prediction, _)| prediction)
    }

    /// Like [`Self::infer`], also returning per-stage timings.
    ///
    /// # Errors
    ///
    /// Same as [`Self::infer`].
    pub fn infer_timed(&self, path: impl AsRef<Path>) -> Result<(Prediction, Speed)> {
        let start = Instant::now();
        let image = decode_image(path)?;
        let pose = self.estimator.estimate(&image)?;
        let normalized = normalize(&pose, &self.config)?;
        let pose_ms = start.elapsed().as_secs_f64() * 1000.0;

        let start = Instant::now();
        let raster = rasterize(&normalized, &self.config);
        let raster_ms = start.elapsed().as_secs_f64() * 1000.0;

        let start = Instant::now();
        let scores = self.classifier.predict(&raster)?;
        let prediction = Prediction::from_scores(&scores)?;
        let classify_ms = start.elapsed().as_secs_f64() * 1000.0;

        Ok((
            prediction,
            Speed {
                pose: pose_ms,
                raster: raster_ms,
                classify: classify_ms,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_from_probabilities() {
        let p = Prediction::from_scores(&[0.1, 0.6, 0.2, 0.1]).unwrap();
        assert_eq!(p.label, Label::Left);
        assert!((p.confidence - 0.6).abs() < 1e-6);
        assert!((p.prob(Label::Right) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_prediction_from_logits() {
        let p = Prediction::from_scores(&[-3.0, 0.5, 1.0, 4.0]).unwrap();
        assert_eq!(p.label, Label::Good);
        let sum: f32 = p.probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_prediction_rejects_wrong_length() {
        assert!(matches!(
            Prediction::from_scores(&[0.5, 0.5]),
            Err(PostureError::InferenceError(_))
        ));
    }
}
