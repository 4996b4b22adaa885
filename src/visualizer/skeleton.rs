// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use serde::{Deserialize, Serialize};

use crate::pose::NUM_KEYPOINTS;

/// A fixed anatomical connection between two keypoint ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bone(pub usize, pub usize);

impl Bone {
    /// Endpoint ids in table order.
    #[must_use]
    pub const fn endpoints(&self) -> (usize, usize) {
        (self.0, self.1)
    }

    /// Whether both endpoint ids are valid anatomical indices.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.0 < NUM_KEYPOINTS && self.1 < NUM_KEYPOINTS
    }
}

/// Skeleton used to draw posture rasters (pairs of keypoint indices).
/// Draw order follows this table; later bones paint over earlier ones.
pub const SKELETON: [Bone; 16] = [
    Bone(1, 3),   // left eye to left ear
    Bone(2, 4),   // right eye to right ear
    Bone(1, 0),   // left eye to nose
    Bone(2, 0),   // right eye to nose
    Bone(5, 6),   // left shoulder to right shoulder
    Bone(5, 7),   // left shoulder to left elbow
    Bone(7, 9),   // left elbow to left wrist
    Bone(6, 8),   // right shoulder to right elbow
    Bone(8, 10),  // right elbow to right wrist
    Bone(5, 11),  // left shoulder to left hip
    Bone(6, 12),  // right shoulder to right hip
    Bone(11, 12), // left hip to right hip
    Bone(11, 13), // left hip to left knee
    Bone(13, 15), // left knee to left ankle
    Bone(12, 14), // right hip to right knee
    Bone(14, 16), // right knee to right ankle
];
