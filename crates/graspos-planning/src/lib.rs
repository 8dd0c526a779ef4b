//! `graspos-planning` – feasibility search over ordered grasp candidates.
//!
//! # Modules
//!
//! - [`reach`] – [`ReachSearch`][reach::ReachSearch]: first-fit scan that
//!   combines IK feasibility with motion-plan validation and returns the
//!   approach trajectory without executing it.

pub mod reach;
