// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use image::Rgb;

/// Color type for visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    /// Red color.
    pub const RED: Color = Color(255, 0, 0);
    /// Green color.
    pub const GREEN: Color = Color(0, 255, 0);
    /// Black color.
    pub const BLACK: Color = Color(0, 0, 0);

    /// Pixel value for `image` buffers.
    #[must_use]
    pub const fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.0, self.1, self.2])
    }
}

/// Bone segment color.
pub const BONE_COLOR: Color = Color::GREEN;

/// Joint marker color.
pub const JOINT_COLOR: Color = Color::RED;

/// Raster background.
pub const BACKGROUND: Color = Color::BLACK;
