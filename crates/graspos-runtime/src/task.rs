//! [`PickTask`] – the pick-task orchestrator.
//!
//! Drives one run through a linear sequence of stages:
//!
//! ```text
//! Idle → EnvironmentSetup → PerceptionCapture → LabelFusion → AwaitCommand
//!      → PoseSearch → Grasp → Lift → AwaitRelease → Release → Done
//! ```
//!
//! Two stages block on operator input: `AwaitCommand` parks on the command
//! mailbox until the voice/gaze pipeline supplies a category, and
//! `AwaitRelease` parks on the release mailbox before the gripper lets go.
//! Every other stage is a synchronous conversation with the external
//! collaborators behind the `graspos-hal` traits.
//!
//! A run is single-attempt: any stage failure lands in
//! [`TaskState::Failed`] with the specific [`PickError`] recorded in the
//! [`RunReport`], and nothing is retried or rolled back internally –
//! re-running from `EnvironmentSetup` is the caller's policy and yields a
//! clean slate. IK and planning calls are slow synchronous external calls;
//! the orchestrator does not abort one in flight (the solver's own
//! attempt/timeout budget is the only bound).

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use graspos_hal::chain::KinematicChain;
use graspos_hal::grasp::GraspCandidateSource;
use graspos_hal::joints::JointGroup;
use graspos_hal::perception::PerceptionSource;
use graspos_hal::scene::ObstacleSink;
use graspos_perception::fusion::{self, CategoryMap};
use graspos_perception::geometry::Pose;
use graspos_perception::segment::{GeometricSegment, VisionDetection};
use graspos_perception::shape;
use graspos_planning::reach::ReachSearch;
use graspos_types::{PickError, RunReport, SegmentId, TaskState};

use crate::config::TaskConfig;
use crate::signals::OperatorSignals;

/// The external collaborators one run talks to, borrowed for the duration
/// of [`PickTask::run`]. Each handle is an owned capability object; nothing
/// here is shared mutable state.
pub struct Collaborators<'a> {
    pub perception: &'a mut dyn PerceptionSource,
    pub grasps: &'a mut dyn GraspCandidateSource,
    pub arm: &'a mut dyn KinematicChain,
    pub scene: &'a mut dyn ObstacleSink,
    pub gripper: &'a mut dyn JointGroup,
    pub head: &'a mut dyn JointGroup,
    pub torso: &'a mut dyn JointGroup,
}

/// Facts accumulated along a run, reported even when a later stage fails.
#[derive(Default)]
struct Progress {
    category: Option<String>,
    target: Option<SegmentId>,
    approach_index: Option<usize>,
}

/// The pick-task state machine. One instance drives one run.
pub struct PickTask {
    config: TaskConfig,
    signals: Arc<OperatorSignals>,
    state: TaskState,
}

impl PickTask {
    pub fn new(config: TaskConfig, signals: Arc<OperatorSignals>) -> Self {
        Self {
            config,
            signals,
            state: TaskState::Idle,
        }
    }

    /// Current stage, for observers. Only `run` mutates it.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Execute one full run and report how it went.
    pub fn run(&mut self, collab: &mut Collaborators<'_>) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "pick task starting");

        let mut progress = Progress::default();
        let error = match self.drive(collab, &mut progress) {
            Ok(()) => {
                self.advance(TaskState::Done);
                None
            }
            Err(e) => {
                warn!(state = %self.state, error = %e, "pick task failed");
                self.state = TaskState::Failed;
                Some(e)
            }
        };

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            final_state: self.state,
            error,
            category: progress.category,
            target_segment: progress.target,
            approach_index: progress.approach_index,
        };
        info!(%run_id, state = %report.final_state, "pick task finished");
        report
    }

    fn drive(
        &mut self,
        collab: &mut Collaborators<'_>,
        progress: &mut Progress,
    ) -> Result<(), PickError> {
        self.advance(TaskState::EnvironmentSetup);
        self.setup_environment(collab)?;

        self.advance(TaskState::PerceptionCapture);
        let (segments, detections) = self.capture(collab)?;

        self.advance(TaskState::LabelFusion);
        let labels = fusion::fuse(&detections, &segments);
        info!(labelled = labels.len(), total = segments.len(), "label fusion complete");
        let primitives = shape::synthesize_all(&segments, &self.config.shape_limits());
        collab.scene.replace_segments(primitives);

        self.advance(TaskState::AwaitCommand);
        let category = self.await_command()?;
        progress.category = Some(category.clone());
        let target = select_target(&labels, &category)?;
        progress.target = Some(target);
        info!(category = %category, segment = target, "command matched a labelled segment");

        self.advance(TaskState::PoseSearch);
        let candidates = collab.grasps.candidates_for(target)?;
        if candidates.is_empty() {
            return Err(PickError::NoFeasiblePose { candidates: 0 });
        }
        let search = ReachSearch {
            ik_attempts: self.config.ik_attempts,
            ik_timeout: self.config.ik_timeout(),
        };
        let outcome = search.search(collab.arm, &candidates, self.config.reach_offset());
        let (index, trajectory) = match (outcome.index, outcome.trajectory) {
            (Some(index), Some(trajectory)) => (index, trajectory),
            _ => {
                return Err(PickError::NoFeasiblePose {
                    candidates: candidates.len(),
                });
            }
        };
        progress.approach_index = Some(index);
        collab
            .arm
            .execute(&trajectory)
            .map_err(|e| execution_failed("approach", e))?;

        self.advance(TaskState::Grasp);
        self.grasp(collab, &candidates[index], target)?;

        self.advance(TaskState::Lift);
        self.lift(collab)?;

        self.advance(TaskState::AwaitRelease);
        self.await_release()?;

        self.advance(TaskState::Release);
        collab
            .gripper
            .move_to(&self.config.gripper_open, self.config.joint_move_time_s)
            .map_err(|e| execution_failed("release", e))?;

        Ok(())
    }

    // ── Stages ──────────────────────────────────────────────────────────────

    /// Home the head and torso, then rebuild the static scene: wipe the
    /// obstacle map and add the workspace table.
    fn setup_environment(&self, collab: &mut Collaborators<'_>) -> Result<(), PickError> {
        let head_home = self.config.head_home;
        self.home_group(collab.head, &head_home)?;
        let torso_home = [self.config.torso_home];
        self.home_group(collab.torso, &torso_home)?;

        collab.scene.clear();
        collab.scene.add_workspace_box(
            "table",
            self.config.table_dimensions,
            self.config.table_pose(),
        );
        Ok(())
    }

    /// Drive one joint group to its home position, skipping the motion when
    /// every joint is already within the configured error of home.
    fn home_group(&self, group: &mut dyn JointGroup, home: &[f32]) -> Result<(), PickError> {
        let current = group.positions();
        let already_home = current.len() == home.len()
            && current
                .iter()
                .zip(home)
                .all(|(c, h)| (c - h).abs() < self.config.max_joint_error);
        if already_home {
            info!(group = group.id(), "joint group already at home position");
            return Ok(());
        }
        info!(group = group.id(), "homing joint group");
        group
            .move_to(home, self.config.joint_move_time_s)
            .map_err(|e| execution_failed("environment_setup", e))
    }

    /// Run one perception cycle: let the segment fitter work for the settle
    /// window, freeze it (the scene is static from here on), then capture
    /// both modalities.
    fn capture(
        &self,
        collab: &mut Collaborators<'_>,
    ) -> Result<(Vec<GeometricSegment>, Vec<VisionDetection>), PickError> {
        collab.perception.set_streaming(true)?;
        let settle = self.config.settle_time();
        if !settle.is_zero() {
            thread::sleep(settle);
        }
        collab.perception.set_streaming(false)?;

        let segments = collab.perception.capture_segments()?;
        if segments.is_empty() {
            return Err(PickError::PerceptionEmpty("segments".to_string()));
        }
        let detections = collab.perception.capture_detections()?;
        if detections.is_empty() {
            return Err(PickError::PerceptionEmpty("detections".to_string()));
        }
        info!(
            segments = segments.len(),
            detections = detections.len(),
            "perception cycle captured"
        );
        Ok((segments, detections))
    }

    /// Open, close in on the target, and hold it.
    fn grasp(
        &self,
        collab: &mut Collaborators<'_>,
        candidate: &Pose,
        target: SegmentId,
    ) -> Result<(), PickError> {
        collab
            .gripper
            .move_to(&self.config.gripper_open, self.config.joint_move_time_s)
            .map_err(|e| execution_failed("grasp", e))?;

        // The target stops being an obstacle the moment we intend to touch
        // it; everything else stays in the map.
        collab.scene.remove_segment(target);

        collab.arm.set_velocity_scaling(0.1);
        let grasp_pose = candidate.offset_along_x(-self.config.tool_gripper_offset);
        let trajectory = collab
            .arm
            .plan(&grasp_pose)
            .ok_or_else(|| PickError::PlanningFailed {
                stage: "grasp".to_string(),
            })?;
        collab
            .arm
            .execute(&trajectory)
            .map_err(|e| execution_failed("grasp", e))?;

        collab
            .gripper
            .move_to(&self.config.gripper_close, self.config.joint_move_time_s)
            .map_err(|e| execution_failed("grasp", e))
    }

    /// Raise the held object straight up from wherever the approach ended.
    fn lift(&self, collab: &mut Collaborators<'_>) -> Result<(), PickError> {
        collab.arm.set_velocity_scaling(1.0);
        let up = collab.arm.current_pose().lifted(self.config.lift_distance);
        let trajectory = collab
            .arm
            .plan(&up)
            .ok_or_else(|| PickError::PlanningFailed {
                stage: "lift".to_string(),
            })?;
        collab
            .arm
            .execute(&trajectory)
            .map_err(|e| execution_failed("lift", e))
    }

    // ── Waits ───────────────────────────────────────────────────────────────

    fn await_command(&self) -> Result<String, PickError> {
        info!("waiting for an operator category command");
        match self.config.command_timeout_s {
            Some(secs) => self
                .signals
                .command
                .wait_timeout(Duration::from_secs_f32(secs))
                .ok_or_else(|| PickError::SignalTimeout {
                    signal: "command".to_string(),
                }),
            None => Ok(self.signals.command.wait()),
        }
    }

    fn await_release(&self) -> Result<(), PickError> {
        info!("holding object, waiting for the release signal");
        match self.config.release_timeout_s {
            Some(secs) => self
                .signals
                .release
                .wait_timeout(Duration::from_secs_f32(secs))
                .ok_or_else(|| PickError::SignalTimeout {
                    signal: "release".to_string(),
                }),
            None => Ok(self.signals.release.wait()),
        }
    }

    fn advance(&mut self, next: TaskState) {
        info!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }
}

/// First labelled segment (ascending id) whose label contains `category` as
/// a substring, case-sensitively. The map's id ordering makes the
/// tie-breaking deterministic.
fn select_target(labels: &CategoryMap, category: &str) -> Result<SegmentId, PickError> {
    labels
        .iter()
        .find(|(_, label)| label.contains(category))
        .map(|(id, _)| *id)
        .ok_or_else(|| PickError::NoLabelMatch(category.to_string()))
}

fn execution_failed(stage: &str, cause: PickError) -> PickError {
    PickError::ExecutionFailed {
        stage: stage.to_string(),
        details: cause.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use graspos_hal::sim::{
        SimGraspSource, SimJointGroup, SimKinematicChain, SimObstacleSink, SimPerception,
    };
    use graspos_perception::geometry::{Quaternion, Rect, Vec3};

    fn segment(id: SegmentId, e1: f32, e2: f32, bbox: Rect) -> GeometricSegment {
        GeometricSegment {
            id,
            center: Vec3::new(0.55, 0.0, 0.85),
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            a1: 0.03,
            a2: 0.03,
            a3: 0.1,
            e1,
            e2,
            bbox,
        }
    }

    fn detection(category: &str, bbox: Rect) -> VisionDetection {
        VisionDetection {
            category: category.to_string(),
            bbox,
        }
    }

    fn candidate_at(x: f32) -> Pose {
        Pose::new(Vec3::new(x, 0.0, 0.85), Quaternion::identity())
    }

    /// A tabletop with a cup (segment 1, labelled "red cup") and a juice
    /// box (segment 2).
    fn tabletop_perception() -> SimPerception {
        let segments = vec![
            segment(1, 0.05, 0.5, Rect::new(100.0, 100.0, 160.0, 220.0)),
            segment(2, 0.95, 0.5, Rect::new(300.0, 100.0, 380.0, 200.0)),
        ];
        let detections = vec![
            detection("red cup", Rect::new(102.0, 104.0, 162.0, 224.0)),
            detection("juice box", Rect::new(298.0, 100.0, 378.0, 200.0)),
        ];
        SimPerception::new(segments, detections)
    }

    struct Rig {
        perception: SimPerception,
        grasps: SimGraspSource,
        arm: SimKinematicChain,
        scene: SimObstacleSink,
        gripper: SimJointGroup,
        head: SimJointGroup,
        torso: SimJointGroup,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                perception: tabletop_perception(),
                grasps: SimGraspSource::new().with_candidates(
                    1,
                    vec![candidate_at(0.55), candidate_at(0.6), candidate_at(0.65)],
                ),
                arm: SimKinematicChain::always_feasible("arm_right_torso"),
                scene: SimObstacleSink::new(),
                // Head starts at home, torso does not.
                gripper: SimJointGroup::new("gripper_right", vec![0.0, 0.0]),
                head: SimJointGroup::new("head", vec![0.0, -0.6]),
                torso: SimJointGroup::new("torso", vec![0.0]),
            }
        }

        fn collaborators(&mut self) -> Collaborators<'_> {
            Collaborators {
                perception: &mut self.perception,
                grasps: &mut self.grasps,
                arm: &mut self.arm,
                scene: &mut self.scene,
                gripper: &mut self.gripper,
                head: &mut self.head,
                torso: &mut self.torso,
            }
        }
    }

    fn fast_config() -> TaskConfig {
        TaskConfig {
            settle_time_s: 0.0,
            ..TaskConfig::default()
        }
    }

    fn task_with_signals(signals: &Arc<OperatorSignals>) -> PickTask {
        PickTask::new(fast_config(), Arc::clone(signals))
    }

    #[test]
    fn happy_path_reaches_done() {
        let signals = Arc::new(OperatorSignals::new());
        signals.on_command("cup");
        signals.on_release();

        let mut rig = Rig::new();
        let mut task = task_with_signals(&signals);
        let report = task.run(&mut rig.collaborators());

        assert!(report.succeeded(), "run failed: {:?}", report.error);
        assert_eq!(task.state(), TaskState::Done);
        assert_eq!(report.category.as_deref(), Some("cup"));
        assert_eq!(report.target_segment, Some(1));
        assert_eq!(report.approach_index, Some(0));
        assert!(report.error.is_none());
    }

    #[test]
    fn happy_path_drives_the_hardware_in_order() {
        let signals = Arc::new(OperatorSignals::new());
        signals.on_command("cup");
        signals.on_release();

        let mut rig = Rig::new();
        let mut task = task_with_signals(&signals);
        let report = task.run(&mut rig.collaborators());
        assert!(report.succeeded(), "run failed: {:?}", report.error);

        // Streaming was switched on exactly once and back off.
        assert_eq!(rig.perception.streaming_calls, vec![true, false]);

        // Head was already home; only the torso needed a goal.
        assert!(rig.head.commands.is_empty());
        assert_eq!(rig.torso.commands.len(), 1);

        // Scene: wiped once, table added, target removed before closing in.
        assert_eq!(rig.scene.clears, 1);
        assert_eq!(rig.scene.boxes.len(), 1);
        assert_eq!(rig.scene.boxes[0].0, "table");
        assert!(!rig.scene.contains_segment(1));
        assert!(rig.scene.contains_segment(2));

        // Gripper: open for the approach, close on the object, open to
        // release.
        let goals: Vec<Vec<f32>> = rig.gripper.commands.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(goals, vec![vec![0.05, 0.05], vec![0.03, 0.03], vec![0.05, 0.05]]);

        // Arm: approach, grasp, lift.
        assert_eq!(rig.arm.executed.len(), 3);
        // Closing motion slowed down, lift back at full speed.
        assert_eq!(rig.arm.scaling_calls, vec![0.1, 1.0]);
        assert_eq!(rig.arm.velocity_scaling(), 1.0);

        // Grasp target backed the tool offset away from the chosen
        // candidate; lift raised it by the configured distance.
        let grasp_x = rig.arm.plan_queries[1].translation.x;
        assert!((grasp_x - (0.55 - 0.151)).abs() < 1e-5);
        let lift_z = rig.arm.plan_queries[2].translation.z;
        assert!((lift_z - (0.85 + 0.2)).abs() < 1e-5);
    }

    #[test]
    fn command_arriving_later_unblocks_the_wait() {
        let signals = Arc::new(OperatorSignals::new());
        let producer = Arc::clone(&signals);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            producer.on_command("cup");
            thread::sleep(Duration::from_millis(30));
            producer.on_release();
        });

        let mut rig = Rig::new();
        let mut task = task_with_signals(&signals);
        let report = task.run(&mut rig.collaborators());

        assert!(report.succeeded(), "run failed: {:?}", report.error);
        handle.join().unwrap();
    }

    #[test]
    fn unmatched_category_fails_with_no_label_match() {
        let signals = Arc::new(OperatorSignals::new());
        signals.on_command("bowl");

        let mut rig = Rig::new();
        let mut task = task_with_signals(&signals);
        let report = task.run(&mut rig.collaborators());

        assert_eq!(report.final_state, TaskState::Failed);
        assert_eq!(report.error, Some(PickError::NoLabelMatch("bowl".to_string())));
        assert_eq!(report.category.as_deref(), Some("bowl"));
        assert_eq!(report.target_segment, None);
    }

    #[test]
    fn substring_match_takes_lowest_segment_id() {
        let labels: CategoryMap = [(1, "red cup".to_string()), (2, "cup".to_string())]
            .into_iter()
            .collect();
        assert_eq!(select_target(&labels, "cup").unwrap(), 1);
        // Case-sensitive: "Cup" matches nothing.
        assert!(matches!(
            select_target(&labels, "Cup"),
            Err(PickError::NoLabelMatch(_))
        ));
    }

    #[test]
    fn empty_segments_fail_perception_stage() {
        let signals = Arc::new(OperatorSignals::new());
        let mut rig = Rig::new();
        rig.perception = SimPerception::empty();

        let mut task = task_with_signals(&signals);
        let report = task.run(&mut rig.collaborators());

        assert_eq!(report.final_state, TaskState::Failed);
        assert_eq!(
            report.error,
            Some(PickError::PerceptionEmpty("segments".to_string()))
        );
        // The fitter was still switched off again before the failure.
        assert_eq!(rig.perception.streaming_calls, vec![true, false]);
    }

    #[test]
    fn missing_detections_fail_perception_stage() {
        let signals = Arc::new(OperatorSignals::new());
        let mut rig = Rig::new();
        rig.perception = SimPerception::new(
            vec![segment(1, 0.05, 0.5, Rect::new(0.0, 0.0, 10.0, 10.0))],
            Vec::new(),
        );

        let mut task = task_with_signals(&signals);
        let report = task.run(&mut rig.collaborators());

        assert_eq!(
            report.error,
            Some(PickError::PerceptionEmpty("detections".to_string()))
        );
    }

    #[test]
    fn infeasible_candidates_fail_pose_search() {
        let signals = Arc::new(OperatorSignals::new());
        signals.on_command("cup");

        let mut rig = Rig::new();
        rig.arm = SimKinematicChain::always_feasible("arm_right_torso")
            .with_ik_feasible_when(|_| false);

        let mut task = task_with_signals(&signals);
        let report = task.run(&mut rig.collaborators());

        assert_eq!(report.final_state, TaskState::Failed);
        assert_eq!(report.error, Some(PickError::NoFeasiblePose { candidates: 3 }));
        // Every candidate got exactly one IK query before giving up.
        assert_eq!(rig.arm.ik_queries.len(), 3);
        assert_eq!(report.approach_index, None);
    }

    #[test]
    fn missing_candidate_list_fails_pose_search() {
        let signals = Arc::new(OperatorSignals::new());
        signals.on_command("cup");

        let mut rig = Rig::new();
        rig.grasps = SimGraspSource::new();

        let mut task = task_with_signals(&signals);
        let report = task.run(&mut rig.collaborators());

        assert_eq!(report.error, Some(PickError::NoFeasiblePose { candidates: 0 }));
    }

    #[test]
    fn grasp_plan_failure_is_terminal() {
        let signals = Arc::new(OperatorSignals::new());
        signals.on_command("cup");

        let mut rig = Rig::new();
        // Standoffs (x ≈ 0.3) plan fine; the closer grasp target (x ≈ 0.4)
        // does not.
        rig.arm = SimKinematicChain::always_feasible("arm_right_torso")
            .with_plan_feasible_when(|p| p.translation.x < 0.35);

        let mut task = task_with_signals(&signals);
        let report = task.run(&mut rig.collaborators());

        assert_eq!(report.final_state, TaskState::Failed);
        assert_eq!(
            report.error,
            Some(PickError::PlanningFailed {
                stage: "grasp".to_string()
            })
        );
        // The approach already happened and is not rolled back.
        assert_eq!(report.approach_index, Some(0));
        assert!(!rig.scene.contains_segment(1));
    }

    #[test]
    fn controller_fault_during_approach_reports_execution_failure() {
        let signals = Arc::new(OperatorSignals::new());
        signals.on_command("cup");

        let mut rig = Rig::new();
        rig.arm.fail_execute = true;

        let mut task = task_with_signals(&signals);
        let report = task.run(&mut rig.collaborators());

        assert_eq!(report.final_state, TaskState::Failed);
        match report.error {
            Some(PickError::ExecutionFailed { ref stage, .. }) => {
                assert_eq!(stage, "approach");
            }
            other => panic!("expected ExecutionFailed, got {other:?}"),
        }
    }

    #[test]
    fn command_timeout_is_reported_when_configured() {
        let signals = Arc::new(OperatorSignals::new());
        let mut rig = Rig::new();

        let config = TaskConfig {
            settle_time_s: 0.0,
            command_timeout_s: Some(0.02),
            ..TaskConfig::default()
        };
        let mut task = PickTask::new(config, Arc::clone(&signals));
        let report = task.run(&mut rig.collaborators());

        assert_eq!(report.final_state, TaskState::Failed);
        assert_eq!(
            report.error,
            Some(PickError::SignalTimeout {
                signal: "command".to_string()
            })
        );
    }
}
