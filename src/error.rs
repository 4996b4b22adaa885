// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the posture pipeline.

use std::fmt;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PostureError>;

/// Main error type for the posture pipeline.
#[derive(Debug)]
pub enum PostureError {
    /// Pose presence score at or below the presence threshold.
    NoPersonDetected,
    /// Confident keypoints span zero width or zero height (or there are none).
    DegenerateBoundingBox,
    /// Source image is unreadable or corrupt.
    DecodeError(String),
    /// Writing an output artifact failed.
    PersistenceError(String),
    /// Keypoint set violates the pose invariants.
    InvalidPose(String),
    /// Error loading a model.
    ModelLoadError(String),
    /// Error during model inference.
    InferenceError(String),
    /// Invalid configuration provided.
    ConfigError(String),
    /// Wrapped `std::io::Error`.
    Io(std::io::Error),
}

impl PostureError {
    /// Whether the error only concerns the current image.
    ///
    /// Recoverable errors are logged and the image is skipped. Everything else
    /// points at a systemic problem such as a bad config or a missing model,
    /// and stops a batch run.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoPersonDetected
                | Self::DegenerateBoundingBox
                | Self::DecodeError(_)
                | Self::InvalidPose(_)
                | Self::InferenceError(_)
                | Self::PersistenceError(_)
        )
    }

    /// Short machine-friendly name of the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NoPersonDetected => "no_person_detected",
            Self::DegenerateBoundingBox => "degenerate_bounding_box",
            Self::DecodeError(_) => "decode_error",
            Self::PersistenceError(_) => "persistence_error",
            Self::InvalidPose(_) => "invalid_pose",
            Self::ModelLoadError(_) => "model_load_error",
            Self::InferenceError(_) => "inference_error",
            Self::ConfigError(_) => "config_error",
            Self::Io(_) => "io_error",
        }
    }
}

impl fmt::Display for PostureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPersonDetected => write!(f, "No person detected"),
            Self::DegenerateBoundingBox => {
                write!(f, "Degenerate bounding box: confident keypoints have zero extent")
            }
            Self::DecodeError(msg) => write!(f, "Decode error: {msg}"),
            Self::PersistenceError(msg) => write!(f, "Persistence error: {msg}"),
            Self::InvalidPose(msg) => write!(f, "Invalid pose: {msg}"),
            Self::ModelLoadError(msg) => write!(f, "Model load error: {msg}"),
            Self::InferenceError(msg) => write!(f, "Inference error: {msg}"),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
        }
    }
}

impl std::error::Error for PostureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PostureError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for PostureError {
    fn from(err: image::ImageError) -> Self {
        Self::DecodeError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PostureError::DecodeError("truncated".to_string());
        assert_eq!(err.to_string(), "Decode error: truncated");

        let err = PostureError::NoPersonDetected;
        assert_eq!(err.to_string(), "No person detected");
    }

    #[test]
    fn test_recoverable_split() {
        assert!(PostureError::NoPersonDetected.is_recoverable());
        assert!(PostureError::DegenerateBoundingBox.is_recoverable());
        assert!(PostureError::DecodeError(String::new()).is_recoverable());
        assert!(PostureError::InvalidPose(String::new()).is_recoverable());
        assert!(!PostureError::ConfigError(String::new()).is_recoverable());
        assert!(!PostureError::Io(std::io::Error::other("disk")).is_recoverable());
        assert!(!PostureError::ModelLoadError(String::new()).is_recoverable());
    }

    #[test]
    fn test_io_source() {
        use std::error::Error;
        let err = PostureError::from(std::io::Error::other("disk"));
        assert!(err.source().is_some());
        assert_eq!(err.kind(), "io_error");
    }
}
