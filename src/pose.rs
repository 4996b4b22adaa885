// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Keypoint and pose containers.
//!
//! A [`Pose`] always holds exactly [`NUM_KEYPOINTS`] keypoints ordered by their
//! COCO anatomical index, so downstream code can address a joint by id without
//! searching. Positions are either source-image pixels (raw, straight from the
//! pose estimator) or canonical raster coordinates (after normalization).

use serde::{Deserialize, Serialize};

use crate::error::{PostureError, Result};

/// Number of keypoints per pose (COCO-17 layout).
pub const NUM_KEYPOINTS: usize = 17;

/// Anatomical names of the COCO-17 keypoints, indexed by keypoint id.
pub const KEYPOINT_NAMES: [&str; NUM_KEYPOINTS] = [
    "nose",
    "left_eye",
    "right_eye",
    "left_ear",
    "right_ear",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
];

/// 2D position of a keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A single detected anatomical landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Anatomical index in `[0, 16]`.
    pub id: usize,
    /// Position in raw or canonical space.
    pub position: Position,
    /// Detection confidence in `[0, 1]`.
    pub score: f32,
}

impl Keypoint {
    /// Create a new keypoint.
    #[must_use]
    pub const fn new(id: usize, x: f32, y: f32, score: f32) -> Self {
        Self {
            id,
            position: Position::new(x, y),
            score,
        }
    }

    /// Anatomical name of this keypoint.
    #[must_use]
    pub fn name(&self) -> &'static str {
        KEYPOINT_NAMES.get(self.id).copied().unwrap_or("unknown")
    }

    /// Whether the detection confidence is strictly above `threshold`.
    #[must_use]
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.score > threshold
    }
}

/// The full set of keypoints detected for one person in one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPose")]
pub struct Pose {
    /// Person-presence score.
    pub score: f32,
    keypoints: Vec<Keypoint>,
}

impl Pose {
    /// Create a pose from keypoints ordered by anatomical id.
    ///
    /// # Errors
    ///
    /// Returns [`PostureError::InvalidPose`] if there are not exactly
    /// [`NUM_KEYPOINTS`] keypoints or if keypoint `i` does not carry id `i`.
    pub fn new(score: f32, keypoints: Vec<Keypoint>) -> Result<Self> {
        if keypoints.len() != NUM_KEYPOINTS {
            return Err(PostureError::InvalidPose(format!(
                "expected {NUM_KEYPOINTS} keypoints, got {}",
                keypoints.len()
            )));
        }
        if let Some((idx, kp)) = keypoints.iter().enumerate().find(|(i, kp)| kp.id != *i) {
            return Err(PostureError::InvalidPose(format!(
                "keypoint at slot {idx} has id {}",
                kp.id
            )));
        }
        Ok(Self { score, keypoints })
    }

    /// Create a pose from `[x, y, score]` rows indexed by anatomical id.
    #[must_use]
    pub fn from_rows(score: f32, rows: &[[f32; 3]; NUM_KEYPOINTS]) -> Self {
        let keypoints = rows
            .iter()
            .enumerate()
            .map(|(id, row)| Keypoint::new(id, row[0], row[1], row[2]))
            .collect();
        Self { score, keypoints }
    }

    /// A pose with zero presence score and all keypoints at the origin.
    ///
    /// Pose estimators return this when nobody is found in the image.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_rows(0.0, &[[0.0; 3]; NUM_KEYPOINTS])
    }

    /// Keypoints ordered by anatomical id.
    #[must_use]
    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    /// Keypoint with the given anatomical id.
    #[must_use]
    pub fn keypoint(&self, id: usize) -> Option<&Keypoint> {
        self.keypoints.get(id)
    }

    /// Build a new pose with every position passed through `f`.
    ///
    /// Ids, scores and the presence score are copied unchanged.
    #[must_use]
    pub fn map_positions<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&Keypoint) -> Position,
    {
        let keypoints = self
            .keypoints
            .iter()
            .map(|kp| Keypoint {
                position: f(kp),
                ..*kp
            })
            .collect();
        Self {
            score: self.score,
            keypoints,
        }
    }

    /// Keypoints whose confidence is strictly above `threshold`.
    pub fn confident(&self, threshold: f32) -> impl Iterator<Item = &Keypoint> {
        self.keypoints
            .iter()
            .filter(move |kp| kp.is_confident(threshold))
    }

    /// First keypoint whose position is NaN or infinite.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<&Keypoint> {
        self.keypoints.iter().find(|kp| !kp.position.is_finite())
    }

    /// Serialize to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`PostureError::PersistenceError`] if a position is not finite
    /// (JSON has no NaN) or serialization fails.
    pub fn to_json(&self) -> Result<String> {
        if let Some(kp) = self.first_non_finite() {
            return Err(PostureError::PersistenceError(format!(
                "{} has a non-finite position",
                kp.name()
            )));
        }
        serde_json::to_string(self).map_err(|e| PostureError::PersistenceError(e.to_string()))
    }

    /// Parse a pose from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`PostureError::InvalidPose`] on malformed JSON or invariant violations.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PostureError::InvalidPose(e.to_string()))
    }
}

/// Unchecked wire form used to validate deserialized poses.
#[derive(Deserialize)]
struct RawPose {
    score: f32,
    keypoints: Vec<Keypoint>,
}

impl TryFrom<RawPose> for Pose {
    type Error = PostureError;

    fn try_from(raw: RawPose) -> Result<Self> {
        Self::new(raw.score, raw.keypoints)
    }
}
