//! Grasp-candidate generator seam.

use graspos_perception::geometry::Pose;
use graspos_types::{PickError, SegmentId};

/// External service that proposes grasp poses for a chosen segment.
///
/// The returned sequence is ORDERED by the generator's own preference; the
/// feasible-pose search scans it front to back and commits to the first
/// candidate that is both reachable and plannable, so the ordering is the
/// only ranking that ever applies.
pub trait GraspCandidateSource: Send {
    /// Grasp poses for `segment`, best first, in the planning frame.
    ///
    /// # Errors
    ///
    /// Returns [`PickError::HardwareFault`] when the service cannot be
    /// reached. An unknown segment yields an empty vector, not an error.
    fn candidates_for(&mut self, segment: SegmentId) -> Result<Vec<Pose>, PickError>;
}
