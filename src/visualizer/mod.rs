// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Skeleton drawing: bone table, palette and rasterizer.

/// Color definitions and the skeleton palette.
pub mod color;
/// Skeleton rasterization.
pub mod raster;
/// COCO bone connectivity.
pub mod skeleton;

pub use color::Color;
pub use raster::{SkeletonRaster, rasterize};
pub use skeleton::{Bone, SKELETON};
