// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Synthetic pose augmentation.
//!
//! Produces jittered copies of a normalized pose: every keypoint coordinate is
//! shifted by an independent integer offset drawn uniformly from `[-r, r)`.
//! Jittered coordinates are not clamped; the rasterizer clips them.

use rand::Rng;

use crate::pose::{Pose, Position};

/// Return a jittered copy of `pose`.
///
/// Ids, keypoint order and all scores are preserved. A `jitter_radius` of
/// zero (or less) yields an unchanged copy without touching `rng`.
///
/// # Example
///
/// ```rust
/// use posture_skeleton::augment::augment;
/// use posture_skeleton::pose::{NUM_KEYPOINTS, Pose};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let pose = Pose::from_rows(0.9, &[[64.0, 64.0, 0.8]; NUM_KEYPOINTS]);
/// let mut rng = StdRng::seed_from_u64(7);
/// let jittered = augment(&pose, 5, &mut rng);
/// assert_eq!(jittered.keypoints().len(), NUM_KEYPOINTS);
/// ```
pub fn augment<R: Rng + ?Sized>(pose: &Pose, jitter_radius: i32, rng: &mut R) -> Pose {
    if jitter_radius <= 0 {
        return pose.clone();
    }

    pose.map_positions(|kp| {
        let dx = rng.gen_range(-jitter_radius..jitter_radius);
        let dy = rng.gen_range(-jitter_radius..jitter_radius);
        #[allow(clippy::cast_precision_loss)]
        let (dx, dy) = (dx as f32, dy as f32);
        Position::new(kp.position.x + dx, kp.position.y + dy)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::NUM_KEYPOINTS;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample_pose() -> Pose {
        let mut rows = [[0.0; 3]; NUM_KEYPOINTS];
        for (i, row) in rows.iter_mut().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let f = i as f32;
            *row = [f * 7.0, 128.0 - f * 5.0, 0.05 * f];
        }
        Pose::from_rows(0.75, &rows)
    }

    #[test]
    fn test_offsets_within_radius() {
        let pose = sample_pose();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let out = augment(&pose, 5, &mut rng);
            for (a, b) in pose.keypoints().iter().zip(out.keypoints()) {
                let dx = b.position.x - a.position.x;
                let dy = b.position.y - a.position.y;
                assert!((-5.0..5.0).contains(&dx), "dx out of range: {dx}");
                assert!((-5.0..5.0).contains(&dy), "dy out of range: {dy}");
                assert!(dx.fract().abs() < f32::EPSILON);
            }
        }
    }

    #[test]
    fn test_preserves_ids_and_scores() {
        let pose = sample_pose();
        let mut rng = StdRng::seed_from_u64(2);
        let out = augment(&pose, 5, &mut rng);

        assert!((out.score - pose.score).abs() < f32::EPSILON);
        for (a, b) in pose.keypoints().iter().zip(out.keypoints()) {
            assert_eq!(a.id, b.id);
            assert!((a.score - b.score).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let pose = sample_pose();
        let a = augment(&pose, 5, &mut StdRng::seed_from_u64(99));
        let b = augment(&pose, 5, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_radius_is_identity() {
        let pose = sample_pose();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(augment(&pose, 0, &mut rng), pose);
    }
}
