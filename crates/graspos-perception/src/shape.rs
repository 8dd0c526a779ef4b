//! Collision Shape Synthesizer.
//!
//! The motion planner cannot collide against a raw rounded-box shape model,
//! so every segment is reduced to one of two primitives before entering the
//! obstacle map: a box for angular fits, a cylinder for fits that are round
//! in cross-section but flat on top. Both are inflated by a configured
//! margin so the planned paths keep clearance from the fitted surface.
//!
//! Classification looks only at the two shape exponents. `e1` governs the
//! vertical profile, `e2` the cross-section; values below `elimit1` read as
//! "square", values in `[elimit1, elimit2)` as "round", values at or above
//! `elimit2` as "pinched" (treated as square again).

use serde::{Deserialize, Serialize};
use tracing::debug;

use graspos_types::SegmentId;

use crate::geometry::Pose;
use crate::segment::GeometricSegment;

/// Simplified collision geometry for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveShape {
    /// Full extents (not semi-axes) along the segment's local axes.
    Box { x: f32, y: f32, z: f32 },
    Cylinder { radius: f32, height: f32 },
}

/// One entry of the obstacle map, owned by the obstacle sink until the next
/// environment refresh replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionPrimitive {
    /// Segment this primitive stands in for.
    pub segment_id: SegmentId,
    pub shape: PrimitiveShape,
    pub pose: Pose,
}

/// Classification thresholds and the clearance margin.
///
/// Invariant: `elimit1 < elimit2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeLimits {
    /// Below this an exponent reads as "square".
    pub elimit1: f32,
    /// At or above this an exponent reads as "pinched" (square again).
    pub elimit2: f32,
    /// Added to every primitive dimension for planner clearance.
    pub inflate: f32,
}

/// Classify one segment into its collision primitive.
///
/// A segment becomes a cylinder only when its vertical profile is square
/// (`e1 < elimit1`) while its cross-section is round
/// (`elimit1 <= e2 < elimit2`); every other combination becomes a box.
/// The cylinder's height is the largest semi-axis and its radius the
/// largest semi-axis strictly below that height (0 when all three are
/// equal), both inflated.
pub fn synthesize(segment: &GeometricSegment, limits: &ShapeLimits) -> CollisionPrimitive {
    let shape = if segment.e1 >= limits.elimit1 {
        inflated_box(segment, limits.inflate)
    } else if segment.e2 < limits.elimit1 || segment.e2 >= limits.elimit2 {
        inflated_box(segment, limits.inflate)
    } else {
        inflated_cylinder(segment, limits.inflate)
    };

    debug!(segment = segment.id, shape = ?shape, "synthesized collision primitive");

    CollisionPrimitive {
        segment_id: segment.id,
        shape,
        pose: segment.pose(),
    }
}

/// Classify every segment of a cycle. The result fully replaces the prior
/// obstacle set; there is no incremental diffing between cycles.
pub fn synthesize_all(segments: &[GeometricSegment], limits: &ShapeLimits) -> Vec<CollisionPrimitive> {
    segments.iter().map(|s| synthesize(s, limits)).collect()
}

fn inflated_box(segment: &GeometricSegment, inflate: f32) -> PrimitiveShape {
    PrimitiveShape::Box {
        x: 2.0 * segment.a1 + inflate,
        y: 2.0 * segment.a2 + inflate,
        z: 2.0 * segment.a3 + inflate,
    }
}

fn inflated_cylinder(segment: &GeometricSegment, inflate: f32) -> PrimitiveShape {
    let height = segment.max_semi_axis();

    // Largest semi-axis strictly below the height; stays 0 when all three
    // are equal.
    let mut radius = 0.0_f32;
    for a in [segment.a1, segment.a2, segment.a3] {
        if a > radius && a < height {
            radius = a;
        }
    }

    PrimitiveShape::Cylinder {
        radius: radius + inflate,
        height: height + inflate,
    }
}
