//! Per-cycle perception data model.
//!
//! Both types are produced once per perception cycle by external services,
//! are immutable after creation, and are discarded wholesale at the next
//! cycle. Segment ids are unique within a cycle only.

use serde::{Deserialize, Serialize};

use graspos_types::SegmentId;

use crate::geometry::{Pose, Quaternion, Rect, Vec3};

/// One fitted 3-D object region: a rounded-box/cylinder shape model with a
/// projected 2-D bounding box.
///
/// Semi-axes `a1..a3` are strictly positive half-extents; the shape
/// exponents `e1`/`e2` (≥ 0) control how box-like (small) or rounded (near
/// 1) the fitted surface is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometricSegment {
    pub id: SegmentId,
    /// Centre of the fitted shape in the planning frame.
    pub center: Vec3,
    /// First orientation angle, applied about Z.
    pub roll: f32,
    /// Second orientation angle, applied about Y.
    pub pitch: f32,
    /// Third orientation angle, applied about Z again.
    pub yaw: f32,
    pub a1: f32,
    pub a2: f32,
    pub a3: f32,
    pub e1: f32,
    pub e2: f32,
    /// Projection of the fitted shape into the detector's image plane.
    pub bbox: Rect,
}

impl GeometricSegment {
    /// The segment's pose in the planning frame.
    ///
    /// Orientation composes as `Rz(roll) · Ry(pitch) · Rz(yaw)` – see
    /// [`Quaternion::from_zyz`] for why the first and last rotations share
    /// an axis.
    pub fn pose(&self) -> Pose {
        Pose::new(self.center, Quaternion::from_zyz(self.roll, self.pitch, self.yaw))
    }

    /// Largest of the three semi-axes.
    pub fn max_semi_axis(&self) -> f32 {
        self.a1.max(self.a2).max(self.a3)
    }
}

/// One 2-D detection from the visual object detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionDetection {
    /// Class label, e.g. `"cup"` or `"water bottle"`.
    pub category: String,
    pub bbox: Rect,
}
