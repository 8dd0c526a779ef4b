//! Kinematic-chain capability seam.

use std::time::Duration;

use graspos_perception::geometry::Pose;
use graspos_types::PickError;

/// One joint-space waypoint of a planned trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct JointWaypoint {
    pub positions: Vec<f32>,
    /// Seconds from trajectory start.
    pub time_from_start: f32,
}

/// A collision-aware joint trajectory produced by the external planner.
///
/// Opaque to the decision logic: it is only ever handed back to the chain
/// that produced it for execution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trajectory {
    pub waypoints: Vec<JointWaypoint>,
}

/// The owned capability object for one kinematic chain (e.g. the right
/// arm-plus-torso group).
///
/// Exactly one of these exists per chain and it is passed `&mut` into the
/// components that need it – never shared through globals. IK and planning
/// queries are synchronous and may take seconds; the chain enforces its own
/// attempt/timeout bounds and there is deliberately no way to cancel a
/// query already in flight.
pub trait KinematicChain: Send {
    /// Name of the planning group this capability drives.
    fn name(&self) -> &str;

    /// `true` when the solver found a joint configuration reaching `target`
    /// within the given attempt budget and per-attempt timeout.
    ///
    /// IK feasibility says nothing about collisions along the way; follow up
    /// with [`plan`][Self::plan] before moving.
    fn solve_ik(&mut self, target: &Pose, attempts: u32, timeout: Duration) -> bool;

    /// Ask the planner for a collision-free trajectory to `target` from the
    /// chain's current state. `None` means no path was found – an expected
    /// outcome during candidate scanning, not a fault.
    fn plan(&mut self, target: &Pose) -> Option<Trajectory>;

    /// Execute a previously planned trajectory; blocks until the controller
    /// reports completion.
    ///
    /// # Errors
    ///
    /// Returns [`PickError::HardwareFault`] when the controller aborts.
    fn execute(&mut self, trajectory: &Trajectory) -> Result<(), PickError>;

    /// The chain's current end-effector pose in the planning frame.
    fn current_pose(&self) -> Pose;

    /// Scale the velocity limits applied to subsequent plans (1.0 = full
    /// speed). The final closing motion onto an object runs slowed down.
    fn set_velocity_scaling(&mut self, factor: f32);
}
