//! Rigid-pose and 2-D overlap primitives.
//!
//! A [`Pose`] is a translation plus a unit-quaternion rotation in the
//! planning frame. Poses compose the usual way (`T_A_B.compose(T_B_C)` =
//! `T_A_C`), which is what makes [`Pose::offset_along_x`] a *local*-frame
//! offset: composing with a pure translation moves the pose along its own X
//! axis, not the world's. The pick task uses that twice – once for the
//! tool-to-gripper offset and once for the standoff reach offset.
//!
//! # Example
//!
//! ```rust
//! use graspos_perception::geometry::{Pose, Quaternion, Vec3};
//!
//! // A grasp pose one metre forward of the origin, yawed 90°.
//! let q90z = Quaternion::from_zyz(std::f32::consts::FRAC_PI_2, 0.0, 0.0);
//! let grasp = Pose::new(Vec3::new(1.0, 0.0, 0.0), q90z);
//!
//! // Backing off 0.2 m along the grasp's own X axis moves it in world -Y.
//! let standoff = grasp.offset_along_x(-0.2);
//! assert!((standoff.translation.y + 0.2).abs() < 1e-5);
//! ```

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Vec3
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D translation vector (metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quaternion
// ────────────────────────────────────────────────────────────────────────────

/// A unit quaternion representing a 3-D rotation (w, x, y, z convention).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    /// Create a quaternion. The caller is responsible for providing a unit
    /// quaternion (|q| = 1).
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation (no rotation).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Rotation of `angle` radians about the Z axis.
    pub fn about_z(angle: f32) -> Self {
        let half = angle * 0.5;
        Self::new(half.cos(), 0.0, 0.0, half.sin())
    }

    /// Rotation of `angle` radians about the Y axis.
    pub fn about_y(angle: f32) -> Self {
        let half = angle * 0.5;
        Self::new(half.cos(), 0.0, half.sin(), 0.0)
    }

    /// Segment orientation from its three fitted angles, composed as
    /// `Rz(roll) · Ry(pitch) · Rz(yaw)`.
    ///
    /// The Z-Y-Z order (with the first and last rotations about the same
    /// axis) is the frame convention of the superquadric fitting service
    /// that produces segments; keep it in sync with that service, the
    /// variable names notwithstanding.
    pub fn from_zyz(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self::about_z(roll)
            .mul(Self::about_y(pitch))
            .mul(Self::about_z(yaw))
    }

    /// Hamilton product: compose two rotations.
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }

    /// Conjugate (== inverse for a unit quaternion).
    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Rotate a vector by this quaternion: p' = q * p * q*.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Self::new(0.0, v.x, v.y, v.z);
        let rotated = self.mul(p).mul(self.conjugate());
        Vec3::new(rotated.x, rotated.y, rotated.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose
// ────────────────────────────────────────────────────────────────────────────

/// A rigid 6-DOF pose: translation followed by rotation, expressed in the
/// planning frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quaternion,
}

impl Pose {
    pub fn new(translation: Vec3, rotation: Quaternion) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// The identity pose (no translation, no rotation).
    pub fn identity() -> Self {
        Self::new(Vec3::zero(), Quaternion::identity())
    }

    /// Compose two poses: `self` applied first, then `other`.
    ///
    /// If `self` = T_A_B and `other` = T_B_C, the result is T_A_C.
    pub fn compose(self, other: Self) -> Self {
        let translated = self.translation.add(self.rotation.rotate(other.translation));
        let rotated = self.rotation.mul(other.rotation);
        Self::new(translated, rotated)
    }

    /// A new pose translated by `distance` along this pose's own local X
    /// axis. Negative distances back away from whatever the pose points at.
    pub fn offset_along_x(self, distance: f32) -> Self {
        self.compose(Pose::new(Vec3::new(distance, 0.0, 0.0), Quaternion::identity()))
    }

    /// A new pose raised by `dz` along the *world* Z axis, orientation
    /// unchanged. Used to lift a grasped object straight up.
    pub fn lifted(self, dz: f32) -> Self {
        Self::new(
            Vec3::new(self.translation.x, self.translation.y, self.translation.z + dz),
            self.rotation,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rect + IoU
// ────────────────────────────────────────────────────────────────────────────

/// An axis-aligned 2-D rectangle in image coordinates.
///
/// `(tlx, tly)` is the top-left corner; `(brx, bry)` is the bottom-right
/// corner, treated as exclusive edges: width = `brx - tlx`, so a rectangle
/// with `tlx == brx` has zero area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub tlx: f32,
    pub tly: f32,
    pub brx: f32,
    pub bry: f32,
}

impl Rect {
    pub fn new(tlx: f32, tly: f32, brx: f32, bry: f32) -> Self {
        Self { tlx, tly, brx, bry }
    }

    fn area(self) -> f32 {
        (self.brx - self.tlx) * (self.bry - self.tly)
    }

    /// Intersection-over-union of two rectangles, in `[0, 1]`.
    ///
    /// Returns 0 when the rectangles share no open interval on either axis,
    /// and 0 (never NaN) when a degenerate pairing leaves the union with
    /// zero area.
    pub fn intersection_over_union(self, other: Rect) -> f32 {
        let overlaps = self.tlx < other.brx
            && self.brx > other.tlx
            && self.tly < other.bry
            && self.bry > other.tly;
        if !overlaps {
            return 0.0;
        }

        let xa = self.tlx.max(other.tlx);
        let ya = self.tly.max(other.tly);
        let xb = self.brx.min(other.brx);
        let yb = self.bry.min(other.bry);

        let inter = (xb - xa) * (yb - ya);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        inter / union
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
