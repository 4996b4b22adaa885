// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! ONNX Runtime backed model collaborators.
//!
//! [`YoloPoseEstimator`] runs a YOLO-pose export (`[1, 4 + nc + 51, N]`
//! output) and keeps only the highest-scoring person. [`OnnxClassifier`] runs
//! the posture classifier on skeleton rasters.

use std::path::Path;
use std::sync::Mutex;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use ndarray::{Array2, Array4, s};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;

use crate::error::{PostureError, Result};
use crate::model::{Classifier, PoseEstimator};
use crate::pose::{NUM_KEYPOINTS, Pose};
use crate::visualizer::SkeletonRaster;

/// Default square input size of YOLO-pose exports.
pub const DEFAULT_IMGSZ: u32 = 640;

/// Letterbox padding value (gray).
const PAD_VALUE: u8 = 114;

/// Values per keypoint in the raw output (x, y, confidence).
const KPT_DIM: usize = 3;

/// ONNX session plus the tensor names it was exported with.
struct OnnxSession {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxSession {
    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PostureError::ModelLoadError(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| PostureError::ModelLoadError(format!("Failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| PostureError::ModelLoadError(format!("Failed to set optimization level: {e}")))?
            .commit_from_file(path)
            .map_err(|e| PostureError::ModelLoadError(format!("Failed to load model: {e}")))?;

        let input_name = session
            .inputs
            .first()
            .map_or_else(|| "images".to_string(), |i| i.name.clone());
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| PostureError::ModelLoadError("Model has no outputs".to_string()))?;

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    /// Run the model on one input tensor and return the first output.
    fn run(&self, input: &Array4<f32>) -> Result<(Vec<f32>, Vec<usize>)> {
        let input_contiguous = input.as_standard_layout();
        let input_tensor = TensorRef::from_array_view(&input_contiguous)
            .map_err(|e| PostureError::InferenceError(format!("Failed to create input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| PostureError::InferenceError("Session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![&self.input_name => input_tensor])
            .map_err(|e| PostureError::InferenceError(format!("Inference failed: {e}")))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            PostureError::InferenceError(format!("Output '{}' not found", self.output_name))
        })?;
        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| PostureError::InferenceError(format!("Failed to extract output: {e}")))?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let shape_vec: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        Ok((data.to_vec(), shape_vec))
    }
}

/// Letterbox transform applied to a source image.
#[derive(Debug, Clone, PartialEq)]
pub struct Letterbox {
    /// NCHW tensor, normalized to `[0, 1]`.
    pub tensor: Array4<f32>,
    /// Original image dimensions (height, width).
    pub orig_shape: (u32, u32),
    /// Scale factors applied (`scale_y`, `scale_x`).
    pub scale: (f32, f32),
    /// Padding applied (`pad_top`, `pad_left`).
    pub padding: (f32, f32),
}

impl Letterbox {
    /// Map a point from letterboxed model space back to source pixels,
    /// clamped to the source image.
    #[must_use]
    pub fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        let (scale_y, scale_x) = self.scale;
        let (pad_top, pad_left) = self.padding;
        let (oh, ow) = self.orig_shape;
        #[allow(clippy::cast_precision_loss)]
        let (oh, ow) = (oh as f32, ow as f32);
        (
            ((x - pad_left) / scale_x).clamp(0.0, ow),
            ((y - pad_top) / scale_y).clamp(0.0, oh),
        )
    }
}

/// Aspect-preserving resize into a `size × size` canvas padded with gray.
#[must_use]
pub fn letterbox(image: &DynamicImage, size: u32) -> Letterbox {
    let (orig_w, orig_h) = image.dimensions();
    #[allow(clippy::cast_precision_loss)]
    let (fw, fh, fs) = (orig_w.max(1) as f32, orig_h.max(1) as f32, size as f32);

    let scale = (fs / fh).min(fs / fw);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_w = ((fw * scale).round() as u32).clamp(1, size);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_h = ((fh * scale).round() as u32).clamp(1, size);
    let pad_left = (size - new_w) / 2;
    let pad_top = (size - new_h) / 2;

    let resized = image::imageops::resize(&image.to_rgb8(), new_w, new_h, FilterType::Triangle);

    let side = size as usize;
    let mut tensor = Array4::from_elem((1, 3, side, side), f32::from(PAD_VALUE) / 255.0);
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (tx, ty) = ((x + pad_left) as usize, (y + pad_top) as usize);
        for c in 0..3 {
            tensor[[0, c, ty, tx]] = f32::from(pixel[c]) / 255.0;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let scale = (new_h as f32 / fh, new_w as f32 / fw);
    #[allow(clippy::cast_precision_loss)]
    let padding = (pad_top as f32, pad_left as f32);

    Letterbox {
        tensor,
        orig_shape: (orig_h, orig_w),
        scale,
        padding,
    }
}

/// Decode raw YOLO-pose output into the single best pose.
///
/// Accepts `[1, features, preds]` and `[1, preds, features]` layouts. The
/// best candidate's box confidence becomes the presence score; keypoints are
/// mapped back through `letterbox`. No candidates yields [`Pose::empty`].
#[must_use]
pub fn decode_pose(output: &[f32], output_shape: &[usize], letterbox: &Letterbox) -> Pose {
    let kpt_features = NUM_KEYPOINTS * KPT_DIM;
    let min_features = 4 + 1 + kpt_features;

    let (a, b) = match output_shape {
        [_, a, b] | [a, b] => (*a, *b),
        _ => return Pose::empty(),
    };
    if output.is_empty() || a == 0 || b == 0 || output.len() != a * b {
        return Pose::empty();
    }

    // Feature-major unless the second axis is the one that can hold a pose.
    let feature_major = a >= min_features && (b < min_features || a <= b);
    let (num_preds, features, transposed) = if feature_major {
        (b, a, false)
    } else {
        (a, b, true)
    };
    if features < min_features {
        return Pose::empty();
    }

    let Ok(raw) = Array2::from_shape_vec((a, b), output.to_vec()) else {
        return Pose::empty();
    };
    let preds = if transposed { raw } else { raw.t().to_owned() };

    let num_classes = features - 4 - kpt_features;
    let best = (0..num_preds)
        .map(|i| {
            let score = preds
                .slice(s![i, 4..4 + num_classes])
                .iter()
                .copied()
                .filter(|v| !v.is_nan())
                .fold(0.0_f32, f32::max);
            (i, score)
        })
        .fold(None, |best: Option<(usize, f32)>, (i, score)| match best {
            Some((_, b)) if b >= score => best,
            _ => Some((i, score)),
        });

    let Some((row, score)) = best else {
        return Pose::empty();
    };

    let kpt_start = 4 + num_classes;
    let mut rows = [[0.0_f32; 3]; NUM_KEYPOINTS];
    for (k, out) in rows.iter_mut().enumerate() {
        let offset = kpt_start + k * KPT_DIM;
        let (x, y) = letterbox.unmap(preds[[row, offset]], preds[[row, offset + 1]]);
        let conf = preds[[row, offset + 2]];
        *out = [x, y, if conf.is_nan() { 0.0 } else { conf }];
    }
    Pose::from_rows(score, &rows)
}

/// YOLO-pose ONNX model used as a single-person pose estimator.
///
/// # Example
///
/// ```no_run
/// use posture_skeleton::model::PoseEstimator;
/// use posture_skeleton::onnx::YoloPoseEstimator;
///
/// let estimator = YoloPoseEstimator::load("yolo11n-pose.onnx")?;
/// let image = image::open("person.jpg").expect("image");
/// let pose = estimator.estimate(&image)?;
/// println!("presence {:.2}", pose.score);
/// # Ok::<(), posture_skeleton::PostureError>(())
/// ```
pub struct YoloPoseEstimator {
    session: OnnxSession,
    imgsz: u32,
}

impl YoloPoseEstimator {
    /// Load a YOLO-pose model from an ONNX file.
    ///
    /// # Errors
    ///
    /// Returns [`PostureError::ModelLoadError`] if the file is missing or invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            session: OnnxSession::load(path.as_ref())?,
            imgsz: DEFAULT_IMGSZ,
        })
    }

    /// Override the square input size the model was exported with.
    #[must_use]
    pub const fn with_imgsz(mut self, imgsz: u32) -> Self {
        self.imgsz = imgsz;
        self
    }

    /// Model input size.
    #[must_use]
    pub const fn imgsz(&self) -> u32 {
        self.imgsz
    }
}

impl PoseEstimator for YoloPoseEstimator {
    fn estimate(&self, image: &DynamicImage) -> Result<Pose> {
        let prepared = letterbox(image, self.imgsz);
        let (output, shape) = self.session.run(&prepared.tensor)?;
        Ok(decode_pose(&output, &shape, &prepared))
    }
}

impl std::fmt::Debug for YoloPoseEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloPoseEstimator")
            .field("imgsz", &self.imgsz)
            .field("input", &self.session.input_name)
            .finish()
    }
}

/// Posture classifier exported to ONNX.
///
/// Takes a `[1, S, S, 3]` raster of raw 0-255 values and returns one score per
/// label.
pub struct OnnxClassifier {
    session: OnnxSession,
}

impl OnnxClassifier {
    /// Load the classifier from an ONNX file.
    ///
    /// # Errors
    ///
    /// Returns [`PostureError::ModelLoadError`] if the file is missing or invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            session: OnnxSession::load(path.as_ref())?,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, raster: &SkeletonRaster) -> Result<Vec<f32>> {
        let (output, _) = self.session.run(&raster.to_tensor()?)?;
        Ok(output)
    }
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("input", &self.session.input_name)
            .finish()
    }
}
