//! Perception service seam.

use graspos_perception::segment::{GeometricSegment, VisionDetection};
use graspos_types::PickError;

/// The external perception stack: a 3-D segment fitter plus a 2-D visual
/// object detector, both observing the same tabletop.
///
/// Segment fitting is expensive, so it is switched on only long enough to
/// produce one cycle's worth of segments; the scene is assumed static for
/// the remainder of the run.
pub trait PerceptionSource: Send {
    /// Start or stop continuous segment fitting.
    ///
    /// # Errors
    ///
    /// Returns [`PickError::HardwareFault`] when the service cannot be
    /// reached.
    fn set_streaming(&mut self, active: bool) -> Result<(), PickError>;

    /// Fetch the most recently fitted segments.
    ///
    /// An empty vector is a valid answer (nothing on the table); the caller
    /// decides whether that is fatal.
    fn capture_segments(&mut self) -> Result<Vec<GeometricSegment>, PickError>;

    /// Fetch the most recent detector output.
    fn capture_detections(&mut self) -> Result<Vec<VisionDetection>, PickError>;
}
