//! Feasible approach-pose search.
//!
//! Grasp candidates arrive already ordered by the generator's preference,
//! so the search is a greedy first-fit: take candidates front to back,
//! stand off from each one, and commit to the first whose standoff is both
//! IK-reachable and plannable. It does not look ahead for a shorter path or
//! a smaller joint displacement among the remaining candidates.
//!
//! The search only *plans*; executing the returned trajectory is the
//! caller's job, which keeps this module free of motion side effects and
//! unit-testable against a scripted chain.

use std::time::Duration;

use tracing::{debug, info};

use graspos_hal::chain::{KinematicChain, Trajectory};
use graspos_perception::geometry::Pose;

/// Result of one candidate scan.
#[derive(Debug, Clone, Default)]
pub struct ReachOutcome {
    /// Index of the winning candidate in the input order.
    pub index: Option<usize>,
    /// The winning candidate's standoff pose.
    pub standoff: Option<Pose>,
    /// Planned approach to the standoff, ready for the caller to execute.
    pub trajectory: Option<Trajectory>,
    pub success: bool,
}

impl ReachOutcome {
    fn exhausted() -> Self {
        Self::default()
    }
}

/// Scans an ordered candidate list for a reachable, plannable standoff.
#[derive(Debug, Clone, Copy)]
pub struct ReachSearch {
    /// IK attempt budget per candidate.
    pub ik_attempts: u32,
    /// Per-attempt IK timeout.
    pub ik_timeout: Duration,
}

impl Default for ReachSearch {
    fn default() -> Self {
        Self {
            ik_attempts: 10,
            ik_timeout: Duration::from_millis(100),
        }
    }
}

impl ReachSearch {
    /// Find the first candidate whose standoff pose passes IK and planning.
    ///
    /// The standoff backs `reach_offset` metres away from each candidate
    /// along the candidate's own X axis. Each candidate costs at most one
    /// IK query and at most one planner query; a candidate that fails IK is
    /// never planned for, and a candidate that plans successfully ends the
    /// scan. An IK success does not guarantee a collision-free path, which
    /// is why the planner gets the final say.
    pub fn search(
        &self,
        chain: &mut dyn KinematicChain,
        candidates: &[Pose],
        reach_offset: f32,
    ) -> ReachOutcome {
        for (index, candidate) in candidates.iter().enumerate() {
            let standoff = candidate.offset_along_x(-reach_offset);
            debug!(
                chain = chain.name(),
                index,
                x = standoff.translation.x,
                y = standoff.translation.y,
                z = standoff.translation.z,
                "testing approach candidate"
            );

            if !chain.solve_ik(&standoff, self.ik_attempts, self.ik_timeout) {
                debug!(index, "candidate standoff is not IK-reachable");
                continue;
            }

            match chain.plan(&standoff) {
                Some(trajectory) => {
                    info!(chain = chain.name(), index, "approach candidate accepted");
                    return ReachOutcome {
                        index: Some(index),
                        standoff: Some(standoff),
                        trajectory: Some(trajectory),
                        success: true,
                    };
                }
                None => {
                    debug!(index, "candidate standoff is reachable but not plannable");
                }
            }
        }

        info!(
            chain = chain.name(),
            candidates = candidates.len(),
            "no feasible approach pose found"
        );
        ReachOutcome::exhausted()
    }
}
