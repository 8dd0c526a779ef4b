//! Obstacle-map seam.

use graspos_perception::geometry::Pose;
use graspos_perception::shape::CollisionPrimitive;
use graspos_types::SegmentId;

/// The motion planner's obstacle map.
///
/// The map holds two kinds of entry: named static geometry (the workspace
/// table) and per-segment primitives. Segment entries are replaced as a
/// whole set on every environment refresh – there is no incremental diff –
/// and a single entry is removed right before the gripper closes on it so
/// the final approach is not rejected as a self-collision.
pub trait ObstacleSink: Send {
    /// Drop every obstacle, static and per-segment alike.
    fn clear(&mut self);

    /// Add a named static box (full extents, metres) at `pose`.
    fn add_workspace_box(&mut self, name: &str, dimensions: [f32; 3], pose: Pose);

    /// Replace the entire per-segment obstacle set.
    fn replace_segments(&mut self, primitives: Vec<CollisionPrimitive>);

    /// Remove the primitive standing in for `segment`, if present.
    fn remove_segment(&mut self, segment: SegmentId);
}
