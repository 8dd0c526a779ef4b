//! In-process simulators for headless tests and the demo binary.
//!
//! Every simulator records the calls it receives in public fields so tests
//! can assert on exactly what the decision logic asked the hardware to do,
//! without any network services or physical robot.

use std::collections::HashMap;
use std::time::Duration;

use graspos_perception::geometry::Pose;
use graspos_perception::segment::{GeometricSegment, VisionDetection};
use graspos_perception::shape::CollisionPrimitive;
use graspos_types::{PickError, SegmentId};

use crate::chain::{JointWaypoint, KinematicChain, Trajectory};
use crate::grasp::GraspCandidateSource;
use crate::joints::JointGroup;
use crate::perception::PerceptionSource;
use crate::scene::ObstacleSink;

// ────────────────────────────────────────────────────────────────────────────
// SimPerception
// ────────────────────────────────────────────────────────────────────────────

/// Perception stub that serves pre-canned segments and detections.
pub struct SimPerception {
    segments: Vec<GeometricSegment>,
    detections: Vec<VisionDetection>,
    /// Every `set_streaming` argument, in call order.
    pub streaming_calls: Vec<bool>,
}

impl SimPerception {
    pub fn new(segments: Vec<GeometricSegment>, detections: Vec<VisionDetection>) -> Self {
        Self {
            segments,
            detections,
            streaming_calls: Vec::new(),
        }
    }

    /// A perception source with nothing on the table.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl PerceptionSource for SimPerception {
    fn set_streaming(&mut self, active: bool) -> Result<(), PickError> {
        self.streaming_calls.push(active);
        Ok(())
    }

    fn capture_segments(&mut self) -> Result<Vec<GeometricSegment>, PickError> {
        Ok(self.segments.clone())
    }

    fn capture_detections(&mut self) -> Result<Vec<VisionDetection>, PickError> {
        Ok(self.detections.clone())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimGraspSource
// ────────────────────────────────────────────────────────────────────────────

/// Grasp-candidate stub serving a fixed pose list per segment id.
#[derive(Default)]
pub struct SimGraspSource {
    table: HashMap<SegmentId, Vec<Pose>>,
    /// Segment ids queried, in call order.
    pub queries: Vec<SegmentId>,
}

impl SimGraspSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidates(mut self, segment: SegmentId, poses: Vec<Pose>) -> Self {
        self.table.insert(segment, poses);
        self
    }
}

impl GraspCandidateSource for SimGraspSource {
    fn candidates_for(&mut self, segment: SegmentId) -> Result<Vec<Pose>, PickError> {
        self.queries.push(segment);
        Ok(self.table.get(&segment).cloned().unwrap_or_default())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimKinematicChain
// ────────────────────────────────────────────────────────────────────────────

type PoseFilter = Box<dyn Fn(&Pose) -> bool + Send>;

/// Kinematic-chain stub with scriptable IK and planner verdicts.
///
/// Executing a trajectory teleports the chain to the target of the most
/// recent successful plan, which is how the real controller ends up too –
/// just without the intervening seconds.
pub struct SimKinematicChain {
    name: String,
    ik_filter: PoseFilter,
    plan_filter: PoseFilter,
    pose: Pose,
    velocity_scaling: f32,
    last_planned: Option<Pose>,
    /// `true` makes every `execute` call fault.
    pub fail_execute: bool,
    /// Every IK target queried, in call order.
    pub ik_queries: Vec<Pose>,
    /// Every plan target queried, in call order.
    pub plan_queries: Vec<Pose>,
    /// Every executed trajectory.
    pub executed: Vec<Trajectory>,
    /// Every velocity-scaling factor set, in call order.
    pub scaling_calls: Vec<f32>,
}

impl SimKinematicChain {
    /// A chain for which every pose is reachable and plannable.
    pub fn always_feasible(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ik_filter: Box::new(|_| true),
            plan_filter: Box::new(|_| true),
            pose: Pose::identity(),
            velocity_scaling: 1.0,
            last_planned: None,
            fail_execute: false,
            ik_queries: Vec::new(),
            plan_queries: Vec::new(),
            executed: Vec::new(),
            scaling_calls: Vec::new(),
        }
    }

    /// Restrict IK feasibility to poses accepted by `filter`.
    pub fn with_ik_feasible_when(mut self, filter: impl Fn(&Pose) -> bool + Send + 'static) -> Self {
        self.ik_filter = Box::new(filter);
        self
    }

    /// Restrict planner success to poses accepted by `filter`.
    pub fn with_plan_feasible_when(
        mut self,
        filter: impl Fn(&Pose) -> bool + Send + 'static,
    ) -> Self {
        self.plan_filter = Box::new(filter);
        self
    }

    pub fn velocity_scaling(&self) -> f32 {
        self.velocity_scaling
    }
}

impl KinematicChain for SimKinematicChain {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve_ik(&mut self, target: &Pose, _attempts: u32, _timeout: Duration) -> bool {
        self.ik_queries.push(*target);
        (self.ik_filter)(target)
    }

    fn plan(&mut self, target: &Pose) -> Option<Trajectory> {
        self.plan_queries.push(*target);
        if !(self.plan_filter)(target) {
            return None;
        }
        self.last_planned = Some(*target);
        // One start waypoint, one goal waypoint; contents are irrelevant to
        // the decision logic.
        Some(Trajectory {
            waypoints: vec![
                JointWaypoint {
                    positions: vec![0.0; 7],
                    time_from_start: 0.0,
                },
                JointWaypoint {
                    positions: vec![0.1; 7],
                    time_from_start: 1.0,
                },
            ],
        })
    }

    fn execute(&mut self, trajectory: &Trajectory) -> Result<(), PickError> {
        if self.fail_execute {
            return Err(PickError::HardwareFault {
                component: self.name.clone(),
                details: "controller aborted trajectory".to_string(),
            });
        }
        self.executed.push(trajectory.clone());
        if let Some(target) = self.last_planned.take() {
            self.pose = target;
        }
        Ok(())
    }

    fn current_pose(&self) -> Pose {
        self.pose
    }

    fn set_velocity_scaling(&mut self, factor: f32) {
        self.velocity_scaling = factor;
        self.scaling_calls.push(factor);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimObstacleSink
// ────────────────────────────────────────────────────────────────────────────

/// Obstacle-map stub recording the current scene contents.
#[derive(Default)]
pub struct SimObstacleSink {
    /// Named static boxes currently in the map.
    pub boxes: Vec<(String, [f32; 3], Pose)>,
    /// Per-segment primitives currently in the map.
    pub segments: Vec<CollisionPrimitive>,
    /// How many times the map has been wiped.
    pub clears: usize,
    /// Segment ids removed individually, in call order.
    pub removed: Vec<SegmentId>,
}

impl SimObstacleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_segment(&self, segment: SegmentId) -> bool {
        self.segments.iter().any(|p| p.segment_id == segment)
    }
}

impl ObstacleSink for SimObstacleSink {
    fn clear(&mut self) {
        self.boxes.clear();
        self.segments.clear();
        self.clears += 1;
    }

    fn add_workspace_box(&mut self, name: &str, dimensions: [f32; 3], pose: Pose) {
        self.boxes.push((name.to_string(), dimensions, pose));
    }

    fn replace_segments(&mut self, primitives: Vec<CollisionPrimitive>) {
        self.segments = primitives;
    }

    fn remove_segment(&mut self, segment: SegmentId) {
        self.removed.push(segment);
        self.segments.retain(|p| p.segment_id != segment);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimJointGroup
// ────────────────────────────────────────────────────────────────────────────

/// Joint-group stub recording every commanded goal.
pub struct SimJointGroup {
    id: String,
    positions: Vec<f32>,
    /// `true` makes every `move_to` call fault.
    pub fail: bool,
    /// Every `(positions, seconds)` goal received, in call order.
    pub commands: Vec<(Vec<f32>, f32)>,
}

impl SimJointGroup {
    pub fn new(id: impl Into<String>, positions: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            positions,
            fail: false,
            commands: Vec::new(),
        }
    }
}

impl JointGroup for SimJointGroup {
    fn id(&self) -> &str {
        &self.id
    }

    fn positions(&self) -> Vec<f32> {
        self.positions.clone()
    }

    fn move_to(&mut self, positions: &[f32], seconds: f32) -> Result<(), PickError> {
        if self.fail {
            return Err(PickError::HardwareFault {
                component: self.id.clone(),
                details: "goal rejected".to_string(),
            });
        }
        self.commands.push((positions.to_vec(), seconds));
        self.positions = positions.to_vec();
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
