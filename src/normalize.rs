// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Keypoint normalization into the canonical raster frame.
//!
//! The confident keypoints define an axis-aligned bounding box, which is
//! stretched independently per axis onto `[0, S]` and floored to the integer
//! grid. The box maximum lands exactly on `S` and keypoints outside the box
//! (only possible for low-confidence ones) land outside the raster. The
//! rasterizer clips both cases.

use crate::config::PipelineConfig;
use crate::error::{PostureError, Result};
use crate::pose::{Pose, Position};

/// Axis-aligned bounds of a keypoint subset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeypointBounds {
    /// Smallest x.
    pub min_x: f32,
    /// Largest x.
    pub max_x: f32,
    /// Smallest y.
    pub min_y: f32,
    /// Largest y.
    pub max_y: f32,
}

impl KeypointBounds {
    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Whether either axis has zero (or non-finite) extent.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let (w, h) = (self.width(), self.height());
        !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0)
    }
}

/// Bounding box of the keypoints scoring strictly above `threshold`.
///
/// Returns `None` when no keypoint qualifies.
#[must_use]
pub fn confident_bounds(pose: &Pose, threshold: f32) -> Option<KeypointBounds> {
    pose.confident(threshold).fold(None, |acc, kp| {
        let Position { x, y } = kp.position;
        Some(match acc {
            None => KeypointBounds {
                min_x: x,
                max_x: x,
                min_y: y,
                max_y: y,
            },
            Some(b) => KeypointBounds {
                min_x: b.min_x.min(x),
                max_x: b.max_x.max(x),
                min_y: b.min_y.min(y),
                max_y: b.max_y.max(y),
            },
        })
    })
}

/// Map a raw pose into the canonical `raster_size` frame.
///
/// Every keypoint is rescaled, including low-confidence ones, so downstream
/// code can still address joints by anatomical id. The input is not modified.
///
/// # Errors
///
/// * [`PostureError::NoPersonDetected`] if `pose.score <= presence_threshold`.
/// * [`PostureError::InvalidPose`] if any position is NaN or infinite, either
///   on input or after scaling.
/// * [`PostureError::DegenerateBoundingBox`] if no keypoint is confident or the
///   confident keypoints have zero width or height.
pub fn normalize(pose: &Pose, config: &PipelineConfig) -> Result<Pose> {
    if pose.score <= config.presence_threshold || pose.score.is_nan() {
        return Err(PostureError::NoPersonDetected);
    }

    if let Some(kp) = pose.first_non_finite() {
        return Err(PostureError::InvalidPose(format!(
            "{} has a non-finite position",
            kp.name()
        )));
    }

    let bounds = confident_bounds(pose, config.confidence_threshold)
        .ok_or(PostureError::DegenerateBoundingBox)?;
    if bounds.is_degenerate() {
        return Err(PostureError::DegenerateBoundingBox);
    }

    #[allow(clippy::cast_precision_loss)]
    let size = config.raster_size as f32;
    let (width, height) = (bounds.width(), bounds.height());

    let normalized = pose.map_positions(|kp| {
        Position::new(
            ((kp.position.x - bounds.min_x) / width * size).floor(),
            ((kp.position.y - bounds.min_y) / height * size).floor(),
        )
    });
    // Far-off low-confidence keypoints can still overflow.
    if let Some(kp) = normalized.first_non_finite() {
        return Err(PostureError::InvalidPose(format!(
            "{} overflows the raster frame",
            kp.name()
        )));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::NUM_KEYPOINTS;

    fn shoulders_and_elbows() -> [[f32; 3]; NUM_KEYPOINTS] {
        let mut rows = [[0.0, 0.0, 0.1]; NUM_KEYPOINTS];
        rows[5] = [100.0, 50.0, 0.9];
        rows[6] = [140.0, 50.0, 0.9];
        rows[7] = [90.0, 90.0, 0.9];
        rows[8] = [150.0, 90.0, 0.9];
        rows
    }

    fn position(pose: &Pose, id: usize) -> (f32, f32) {
        let kp = pose.keypoint(id).unwrap();
        (kp.position.x, kp.position.y)
    }

    #[test]
    fn test_normalize_reference_pose() {
        let config = PipelineConfig::default();
        let pose = Pose::from_rows(0.8, &shoulders_and_elbows());
        let out = normalize(&pose, &config).unwrap();

        assert_eq!(position(&out, 5), (21.0, 0.0));
        assert_eq!(position(&out, 6), (106.0, 0.0));
        assert_eq!(position(&out, 7), (0.0, 128.0));
        assert_eq!(position(&out, 8), (128.0, 128.0));

        // Scores and ids untouched.
        for (a, b) in pose.keypoints().iter().zip(out.keypoints()) {
            assert_eq!(a.id, b.id);
            assert!((a.score - b.score).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_normalize_does_not_mutate_input() {
        let config = PipelineConfig::default();
        let pose = Pose::from_rows(0.8, &shoulders_and_elbows());
        let before = pose.clone();
        let _ = normalize(&pose, &config).unwrap();
        assert_eq!(pose, before);
    }

    #[test]
    fn test_normalize_rejects_low_presence() {
        let config = PipelineConfig::default();
        let pose = Pose::from_rows(0.2, &shoulders_and_elbows());
        assert!(matches!(
            normalize(&pose, &config),
            Err(PostureError::NoPersonDetected)
        ));
    }

    #[test]
    fn test_normalize_rejects_degenerate_boxes() {
        let config = PipelineConfig::default();

        // No confident keypoints at all.
        let pose = Pose::from_rows(0.9, &[[10.0, 10.0, 0.1]; NUM_KEYPOINTS]);
        assert!(matches!(
            normalize(&pose, &config),
            Err(PostureError::DegenerateBoundingBox)
        ));

        // A single confident keypoint.
        let mut rows = [[0.0, 0.0, 0.1]; NUM_KEYPOINTS];
        rows[0] = [30.0, 40.0, 0.9];
        let pose = Pose::from_rows(0.9, &rows);
        assert!(matches!(
            normalize(&pose, &config),
            Err(PostureError::DegenerateBoundingBox)
        ));

        // Horizontally collinear confident keypoints: zero height.
        rows[1] = [80.0, 40.0, 0.9];
        let pose = Pose::from_rows(0.9, &rows);
        assert!(matches!(
            normalize(&pose, &config),
            Err(PostureError::DegenerateBoundingBox)
        ));
    }

    #[test]
    fn test_confident_keypoints_land_in_raster() {
        let config = PipelineConfig::default();
        let mut rows = [[0.0, 0.0, 0.9]; NUM_KEYPOINTS];
        for (i, row) in rows.iter_mut().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let f = i as f32;
            *row = [13.0 + f * 7.3, 220.0 - f * 11.1, 0.9];
        }
        let out = normalize(&Pose::from_rows(0.7, &rows), &config).unwrap();
        for kp in out.keypoints() {
            assert!((0.0..=128.0).contains(&kp.position.x));
            assert!((0.0..=128.0).contains(&kp.position.y));
            assert!((kp.position.x.fract()).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_normalize_translation_scale_covariant() {
        let config = PipelineConfig::default();
        let rows = shoulders_and_elbows();
        let base = normalize(&Pose::from_rows(0.8, &rows), &config).unwrap();

        let mut moved = rows;
        for row in &mut moved {
            row[0] = row[0] * 2.0 + 64.0;
            row[1] = row[1] * 2.0 - 16.0;
        }
        let shifted = normalize(&Pose::from_rows(0.8, &moved), &config).unwrap();
        assert_eq!(base, shifted);
    }

    #[test]
    fn test_normalize_rejects_non_finite_positions() {
        let config = PipelineConfig::default();

        let mut rows = shoulders_and_elbows();
        rows[0] = [f32::NAN, 10.0, 0.1];
        let err = normalize(&Pose::from_rows(0.8, &rows), &config).unwrap_err();
        assert!(matches!(err, PostureError::InvalidPose(_)));
        assert!(err.is_recoverable());

        let mut rows = shoulders_and_elbows();
        rows[7][1] = f32::INFINITY;
        assert!(matches!(
            normalize(&Pose::from_rows(0.8, &rows), &config),
            Err(PostureError::InvalidPose(_))
        ));

        // Finite, but so far out that scaling overflows.
        let mut rows = shoulders_and_elbows();
        rows[0] = [f32::MAX, 0.0, 0.1];
        assert!(matches!(
            normalize(&Pose::from_rows(0.8, &rows), &config),
            Err(PostureError::InvalidPose(_))
        ));
    }

    #[test]
    fn test_confident_bounds() {
        let pose = Pose::from_rows(0.8, &shoulders_and_elbows());
        let b = confident_bounds(&pose, 0.5).unwrap();
        assert_eq!((b.min_x, b.max_x, b.min_y, b.max_y), (90.0, 150.0, 50.0, 90.0));
        assert!(confident_bounds(&pose, 0.95).is_none());
    }
}
