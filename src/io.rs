// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Image decoding and artifact persistence.
//!
//! Every artifact is first written to a `.part` sibling and then renamed into
//! place, so a failed or interrupted write never leaves a partial file under
//! its final name.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};

use crate::error::{PostureError, Result};
use crate::pose::Pose;
use crate::visualizer::SkeletonRaster;

/// Decode an image file, applying its EXIF orientation.
///
/// # Errors
///
/// Returns [`PostureError::DecodeError`] if the file cannot be opened or decoded.
pub fn decode_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let path = path.as_ref();
    let decode_err =
        |e: &dyn std::fmt::Display| PostureError::DecodeError(format!("{}: {e}", path.display()));

    let reader = ImageReader::open(path)
        .map_err(|e| decode_err(&e))?
        .with_guessed_format()
        .map_err(|e| decode_err(&e))?;
    let mut decoder = reader.into_decoder().map_err(|e| decode_err(&e))?;
    let orientation = decoder.orientation().map_err(|e| decode_err(&e))?;
    let mut image = DynamicImage::from_decoder(decoder).map_err(|e| decode_err(&e))?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Temporary sibling used while `path` is being written.
#[must_use]
pub fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Write through `write` into a `.part` file, then rename onto `path`.
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> std::result::Result<(), String>,
{
    let tmp = part_path(path);
    if let Err(e) = write(&tmp) {
        let _ = std::fs::remove_file(&tmp);
        return Err(PostureError::PersistenceError(format!(
            "Failed to write {}: {e}",
            path.display()
        )));
    }
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        PostureError::PersistenceError(format!("Failed to finalize {}: {e}", path.display()))
    })
}

/// Persist a raster, encoding according to the extension of `path`.
///
/// # Errors
///
/// Returns [`PostureError::PersistenceError`] for unknown extensions and I/O
/// or encoding failures.
pub fn save_raster(raster: &SkeletonRaster, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path).map_err(|_| {
        PostureError::PersistenceError(format!(
            "Unsupported output format: {}",
            path.display()
        ))
    })?;
    write_atomic(path, |tmp| {
        raster
            .image()
            .save_with_format(tmp, format)
            .map_err(|e| e.to_string())
    })
}

/// Persist a pose as JSON.
///
/// # Errors
///
/// Returns [`PostureError::PersistenceError`] if serialization or the write fails.
pub fn save_pose_json(pose: &Pose, path: impl AsRef<Path>) -> Result<()> {
    let json = pose.to_json()?;
    write_atomic(path.as_ref(), |tmp| {
        std::fs::write(tmp, json.as_bytes()).map_err(|e| e.to_string())
    })
}
