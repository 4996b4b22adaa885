// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pipeline configuration.
//!
//! This module defines the [`PipelineConfig`] struct, the single immutable value
//! threaded through the normalizer, rasterizer, augmenter and batch runner.

use image::ImageFormat;

use crate::error::{PostureError, Result};
use crate::visualizer::skeleton::{Bone, SKELETON};

/// Configuration for the posture pipeline.
///
/// It uses a builder pattern for convenient construction.
///
/// # Example
///
/// ```rust
/// use posture_skeleton::PipelineConfig;
///
/// let config = PipelineConfig::new()
///     .with_confidence(0.6)
///     .with_raster_size(96)
///     .with_synthetic_count(20)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Per-keypoint confidence threshold (`kp_score`).
    /// Keypoints at or below this score are never drawn and do not shape the bounding box.
    pub confidence_threshold: f32,
    /// Whole-pose presence threshold (`p_score`).
    /// Poses scoring at or below this value are rejected as "no person".
    pub presence_threshold: f32,
    /// Side length `S` of the square skeleton raster.
    pub raster_size: u32,
    /// Maximum absolute integer jitter applied per axis by the augmenter.
    pub jitter_radius: i32,
    /// Number of synthetic variants generated per source image.
    pub synthetic_count: usize,
    /// Bone connectivity table, drawn in order.
    pub bone_table: Vec<Bone>,
    /// Worker threads for batch runs. `0` lets rayon decide.
    pub num_workers: usize,
    /// Extension (and codec) of persisted rasters.
    pub image_format: String,
    /// Also persist each rasterized pose as JSON.
    pub save_json: bool,
    /// Seed for the augmentation random source. `None` draws from entropy.
    pub seed: Option<u64>,
    /// Persistence failures tolerated before a batch is aborted.
    pub max_persistence_failures: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            presence_threshold: 0.2,
            raster_size: 128,
            jitter_radius: 5,
            synthetic_count: 100,
            bone_table: SKELETON.to_vec(),
            num_workers: 0,
            image_format: "jpg".to_string(),
            save_json: false,
            seed: None,
            max_persistence_failures: 3,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-keypoint confidence threshold.
    #[must_use]
    pub const fn with_confidence(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the whole-pose presence threshold.
    #[must_use]
    pub const fn with_presence(mut self, threshold: f32) -> Self {
        self.presence_threshold = threshold;
        self
    }

    /// Set the raster side length.
    #[must_use]
    pub const fn with_raster_size(mut self, size: u32) -> Self {
        self.raster_size = size;
        self
    }

    /// Set the augmentation jitter radius.
    #[must_use]
    pub const fn with_jitter_radius(mut self, radius: i32) -> Self {
        self.jitter_radius = radius;
        self
    }

    /// Set how many synthetic variants are produced per image.
    #[must_use]
    pub const fn with_synthetic_count(mut self, count: usize) -> Self {
        self.synthetic_count = count;
        self
    }

    /// Replace the bone connectivity table.
    #[must_use]
    pub fn with_bone_table(mut self, bones: Vec<Bone>) -> Self {
        self.bone_table = bones;
        self
    }

    /// Set the number of batch worker threads.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.num_workers = workers;
        self
    }

    /// Set the output image extension (e.g. `jpg`, `png`).
    #[must_use]
    pub fn with_image_format(mut self, format: impl Into<String>) -> Self {
        self.image_format = format.into().trim_start_matches('.').to_ascii_lowercase();
        self
    }

    /// Enable or disable JSON pose dumps next to each raster.
    #[must_use]
    pub const fn with_save_json(mut self, save_json: bool) -> Self {
        self.save_json = save_json;
        self
    }

    /// Seed the augmentation random source.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set how many persistence failures abort a batch.
    #[must_use]
    pub const fn with_max_persistence_failures(mut self, max: usize) -> Self {
        self.max_persistence_failures = max;
        self
    }

    /// Check the configuration for values the pipeline cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`PostureError::ConfigError`] describing the first invalid option.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(PostureError::ConfigError(format!(
                "confidence threshold must be in [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.presence_threshold) {
            return Err(PostureError::ConfigError(format!(
                "presence threshold must be in [0, 1], got {}",
                self.presence_threshold
            )));
        }
        if self.raster_size == 0 {
            return Err(PostureError::ConfigError(
                "raster size must be positive".to_string(),
            ));
        }
        if self.jitter_radius < 0 {
            return Err(PostureError::ConfigError(format!(
                "jitter radius must be non-negative, got {}",
                self.jitter_radius
            )));
        }
        if let Some(bone) = self.bone_table.iter().find(|b| !b.is_valid()) {
            return Err(PostureError::ConfigError(format!(
                "bone ({}, {}) references an unknown keypoint",
                bone.0, bone.1
            )));
        }
        match ImageFormat::from_extension(&self.image_format) {
            Some(format) if format.writing_enabled() => {}
            _ => {
                return Err(PostureError::ConfigError(format!(
                    "unsupported output image format '{}'",
                    self.image_format
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = PipelineConfig::default();
        assert!((config.confidence_threshold - 0.5).abs() < f32::EPSILON);
        assert!((config.presence_threshold - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.raster_size, 128);
        assert_eq!(config.jitter_radius, 5);
        assert_eq!(config.synthetic_count, 100);
        assert_eq!(config.bone_table.len(), 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::new()
            .with_confidence(0.6)
            .with_presence(0.3)
            .with_raster_size(64)
            .with_jitter_radius(2)
            .with_workers(4)
            .with_image_format(".PNG")
            .with_seed(42);

        assert!((config.confidence_threshold - 0.6).abs() < f32::EPSILON);
        assert!((config.presence_threshold - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.raster_size, 64);
        assert_eq!(config.jitter_radius, 2);
        assert_eq!(config.num_workers, 4);
        assert_eq!(config.image_format, "png");
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(PipelineConfig::new().with_confidence(1.5).validate().is_err());
        assert!(PipelineConfig::new().with_raster_size(0).validate().is_err());
        assert!(PipelineConfig::new().with_jitter_radius(-1).validate().is_err());
        assert!(
            PipelineConfig::new()
                .with_bone_table(vec![Bone(0, 17)])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_validate_image_format() {
        for ext in ["jpg", "jpeg", ".PNG", "bmp"] {
            assert!(PipelineConfig::new().with_image_format(ext).validate().is_ok(), "{ext}");
        }
        for ext in ["", "jgp", "unknown"] {
            assert!(matches!(
                PipelineConfig::new().with_image_format(ext).validate(),
                Err(PostureError::ConfigError(_))
            ));
        }
    }
}
