//! `graspos-hal` – trait seams for every external collaborator.
//!
//! The task orchestrator only ever talks to these traits, so the real
//! network-backed services can be swapped for the in-process simulators in
//! [`sim`] without touching any decision logic.
//!
//! # Modules
//!
//! - [`perception`] – [`PerceptionSource`][perception::PerceptionSource]:
//!   segment and detection capture.
//! - [`grasp`] – [`GraspCandidateSource`][grasp::GraspCandidateSource]:
//!   ordered grasp pose proposals for a segment.
//! - [`chain`] – [`KinematicChain`][chain::KinematicChain]: the owned
//!   IK/plan/execute capability for one kinematic chain.
//! - [`scene`] – [`ObstacleSink`][scene::ObstacleSink]: the planner-side
//!   obstacle map.
//! - [`joints`] – [`JointGroup`][joints::JointGroup]: blocking
//!   position-controlled joint groups (gripper, head, torso).
//! - [`sim`] – recording simulators of all of the above for tests and the
//!   demo binary.

pub mod chain;
pub mod grasp;
pub mod joints;
pub mod perception;
pub mod scene;
pub mod sim;
