// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Skeleton rasterization.
//!
//! Draws a normalized [`Pose`] onto a fixed-size RGB buffer: for every bone in
//! table order whose endpoints are both confident, a bone segment followed by
//! a joint disc at each endpoint. Primitives are clipped to the raster, so
//! jittered or out-of-box coordinates never fault.

use image::{ImageBuffer, Rgb, RgbImage};
use imageproc::drawing::{BresenhamLineIter, draw_filled_circle_mut};
use ndarray::Array4;

use crate::config::PipelineConfig;
use crate::error::{PostureError, Result};
use crate::pose::{Keypoint, Pose};
use crate::visualizer::color::{BACKGROUND, BONE_COLOR, JOINT_COLOR};

/// Bone segment width in pixels.
pub const BONE_THICKNESS: i32 = 2;

/// Joint disc radius in pixels.
pub const JOINT_RADIUS: i32 = 2;

/// A square `S × S × 3` skeleton image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkeletonRaster {
    image: RgbImage,
}

impl SkeletonRaster {
    /// Background-filled raster of side `size`.
    #[must_use]
    pub fn blank(size: u32) -> Self {
        Self {
            image: ImageBuffer::from_pixel(size, size, BACKGROUND.to_rgb()),
        }
    }

    /// Side length in pixels.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.image.width()
    }

    /// Borrow the underlying image buffer.
    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Raw HWC bytes.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Pixel at `(x, y)`, or `None` outside the raster.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb<u8>> {
        (x < self.image.width() && y < self.image.height()).then(|| *self.image.get_pixel(x, y))
    }

    /// Whether nothing has been drawn.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        let background = BACKGROUND.to_rgb();
        self.image.pixels().all(|p| *p == background)
    }

    /// Convert to a `[1, S, S, 3]` NHWC tensor of raw 0-255 intensities.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer does not match its declared shape.
    pub fn to_tensor(&self) -> Result<Array4<f32>> {
        let (w, h) = self.image.dimensions();
        let data: Vec<f32> = self.image.as_raw().iter().map(|&v| f32::from(v)).collect();
        Array4::from_shape_vec((1, h as usize, w as usize, 3), data)
            .map_err(|e| PostureError::InferenceError(format!("Failed to build raster tensor: {e}")))
    }
}

/// Draw a segment of the given thickness, clipped to the image.
fn draw_thick_line_mut(
    image: &mut RgbImage,
    start: (f32, f32),
    end: (f32, f32),
    thickness: i32,
    color: Rgb<u8>,
) {
    let (w, h) = image.dimensions();
    let (w, h) = (i64::from(w), i64::from(h));
    let lo = -(thickness / 2);
    let hi = thickness - thickness / 2;

    for (x, y) in BresenhamLineIter::new(start, end) {
        for dy in lo..hi {
            for dx in lo..hi {
                let (px, py) = (i64::from(x + dx), i64::from(y + dy));
                if let (Ok(px), Ok(py)) = (u32::try_from(px), u32::try_from(py))
                    && i64::from(px) < w
                    && i64::from(py) < h
                {
                    image.put_pixel(px, py, color);
                }
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn joint_center(kp: &Keypoint) -> (i32, i32) {
    (kp.position.x.floor() as i32, kp.position.y.floor() as i32)
}

/// Rasterize a normalized pose.
///
/// Only bones whose endpoints both score strictly above
/// `config.confidence_threshold` are drawn. A pose with no drawable bone
/// yields a blank raster, which is valid output.
#[must_use]
pub fn rasterize(pose: &Pose, config: &PipelineConfig) -> SkeletonRaster {
    let mut raster = SkeletonRaster::blank(config.raster_size);
    let threshold = config.confidence_threshold;

    for bone in &config.bone_table {
        let (start, end) = bone.endpoints();
        let (Some(a), Some(b)) = (pose.keypoint(start), pose.keypoint(end)) else {
            continue;
        };
        if !(a.is_confident(threshold) && b.is_confident(threshold)) {
            continue;
        }

        draw_thick_line_mut(
            &mut raster.image,
            (a.position.x, a.position.y),
            (b.position.x, b.position.y),
            BONE_THICKNESS,
            BONE_COLOR.to_rgb(),
        );
        draw_filled_circle_mut(&mut raster.image, joint_center(a), JOINT_RADIUS, JOINT_COLOR.to_rgb());
        draw_filled_circle_mut(&mut raster.image, joint_center(b), JOINT_RADIUS, JOINT_COLOR.to_rgb());
    }

    raster
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::NUM_KEYPOINTS;
    use crate::visualizer::skeleton::Bone;

    fn normalized_torso() -> Pose {
        let mut rows = [[0.0, 0.0, 0.1]; NUM_KEYPOINTS];
        rows[5] = [21.0, 0.0, 0.9];
        rows[6] = [106.0, 0.0, 0.9];
        rows[7] = [0.0, 128.0, 0.9];
        rows[8] = [128.0, 128.0, 0.9];
        rows[1] = [40.0, 60.0, 0.1];
        rows[3] = [50.0, 60.0, 0.1];
        Pose::from_rows(0.8, &rows)
    }

    #[test]
    fn test_blank_when_nothing_confident() {
        let config = PipelineConfig::default();
        let pose = Pose::from_rows(0.9, &[[64.0, 64.0, 0.2]; NUM_KEYPOINTS]);
        let raster = rasterize(&pose, &config);
        assert_eq!(raster.size(), 128);
        assert!(raster.is_blank());
    }

    #[test]
    fn test_confident_bone_is_drawn() {
        let config = PipelineConfig::default();
        let raster = rasterize(&normalized_torso(), &config);

        // Midpoint of the (5, 6) shoulder line.
        assert_eq!(raster.pixel(63, 0), Some(BONE_COLOR.to_rgb()));
        // Joints overwrite the line ends.
        assert_eq!(raster.pixel(21, 0), Some(JOINT_COLOR.to_rgb()));
        assert_eq!(raster.pixel(106, 0), Some(JOINT_COLOR.to_rgb()));
        // (5, 7) runs from the left shoulder down to the left elbow.
        assert_eq!(raster.pixel(10, 64), Some(BONE_COLOR.to_rgb()));
    }

    #[test]
    fn test_low_confidence_bone_is_skipped() {
        let config = PipelineConfig::default();
        let raster = rasterize(&normalized_torso(), &config);
        // Bone (1, 3) would pass through (45, 60).
        assert_eq!(raster.pixel(45, 60), Some(BACKGROUND.to_rgb()));
    }

    #[test]
    fn test_out_of_bounds_coordinates_are_clipped() {
        let config = PipelineConfig::default().with_bone_table(vec![Bone(5, 6)]);
        let mut rows = [[0.0, 0.0, 0.1]; NUM_KEYPOINTS];
        rows[5] = [-5.0, -5.0, 0.9];
        rows[6] = [133.0, 133.0, 0.9];
        let raster = rasterize(&Pose::from_rows(0.9, &rows), &config);
        assert!(!raster.is_blank());
        assert_eq!(raster.pixel(64, 64), Some(BONE_COLOR.to_rgb()));
    }

    #[test]
    fn test_rasterize_is_deterministic() {
        let config = PipelineConfig::default();
        let pose = normalized_torso();
        let a = rasterize(&pose, &config);
        let b = rasterize(&pose, &config);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_to_tensor_shape() {
        let config = PipelineConfig::default().with_raster_size(32);
        let raster = rasterize(&normalized_torso(), &config);
        let tensor = raster.to_tensor().unwrap();
        assert_eq!(tensor.shape(), &[1, 32, 32, 3]);
    }
}
