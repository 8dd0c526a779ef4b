//! Position-controlled joint-group seam.

use graspos_types::PickError;

/// A small position-controlled joint group: the gripper fingers, the two
/// head joints, the torso lift.
///
/// Commands block until the underlying controller reports the motion done,
/// which is what lets the orchestrator treat "open the gripper" as a single
/// sequential step.
pub trait JointGroup: Send {
    /// Stable identifier, e.g. `"gripper_right"` or `"torso"`.
    fn id(&self) -> &str;

    /// Most recently reported joint positions, in the group's order.
    fn positions(&self) -> Vec<f32>;

    /// Drive every joint of the group to `positions` over `seconds`.
    ///
    /// # Errors
    ///
    /// Returns [`PickError::HardwareFault`] when the controller rejects or
    /// aborts the goal.
    fn move_to(&mut self, positions: &[f32], seconds: f32) -> Result<(), PickError>;
}
