use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a geometric segment, unique within one perception cycle.
pub type SegmentId = u32;

/// Stages of one pick-task run, in execution order.
///
/// The orchestrator is the only mutator; transitions are monotonic within a
/// run except that the `AwaitCommand → PoseSearch → … → AwaitRelease` happy
/// path runs at most once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// Nothing has happened yet.
    Idle,
    /// Joint groups homed, obstacle map cleared, workspace box added.
    EnvironmentSetup,
    /// Segments and detections captured from the perception service.
    PerceptionCapture,
    /// Detections fused onto segments; obstacle map populated.
    LabelFusion,
    /// Blocked on an operator category command.
    AwaitCommand,
    /// Scanning grasp candidates for a reachable approach.
    PoseSearch,
    /// Gripper opened, approach completed, closing on the target.
    Grasp,
    /// Raising the grasped object.
    Lift,
    /// Blocked on the operator release signal.
    AwaitRelease,
    /// Opening the gripper to hand the object over.
    Release,
    /// The run completed successfully.
    Done,
    /// A stage failed; the run is over. See the report's error.
    Failed,
}

impl TaskState {
    /// `true` for the two states a run can end in.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Failed)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskState::Idle => "idle",
            TaskState::EnvironmentSetup => "environment_setup",
            TaskState::PerceptionCapture => "perception_capture",
            TaskState::LabelFusion => "label_fusion",
            TaskState::AwaitCommand => "await_command",
            TaskState::PoseSearch => "pose_search",
            TaskState::Grasp => "grasp",
            TaskState::Lift => "lift",
            TaskState::AwaitRelease => "await_release",
            TaskState::Release => "release",
            TaskState::Done => "done",
            TaskState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Terminal failure of a pick-task run.
///
/// None of these are retried internally; the orchestrator surfaces
/// [`TaskState::Failed`] plus the specific error so the caller can log it and
/// decide whether to start a fresh run.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PickError {
    #[error("perception returned no {0}")]
    PerceptionEmpty(String),

    #[error("no labelled segment matches category {0:?}")]
    NoLabelMatch(String),

    #[error("no feasible approach pose among {candidates} candidate(s)")]
    NoFeasiblePose { candidates: usize },

    #[error("motion planning failed during {stage}")]
    PlanningFailed { stage: String },

    #[error("trajectory execution failed during {stage}: {details}")]
    ExecutionFailed { stage: String, details: String },

    #[error("timed out waiting for the {signal} signal")]
    SignalTimeout { signal: String },

    /// Fault reported by an external collaborator (perception service,
    /// controller, planner transport). The orchestrator folds faults raised
    /// during a motion stage into [`PickError::ExecutionFailed`] so the
    /// report names the stage that died.
    #[error("hardware fault on {component}: {details}")]
    HardwareFault { component: String, details: String },
}

/// Caller-facing summary of one pick-task run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// [`TaskState::Done`] or [`TaskState::Failed`].
    pub final_state: TaskState,
    pub error: Option<PickError>,
    /// Operator category that drove the run, if one arrived.
    pub category: Option<String>,
    /// Segment the run locked onto, if the category matched one.
    pub target_segment: Option<SegmentId>,
    /// Index of the grasp candidate whose approach succeeded.
    pub approach_index: Option<usize>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.final_state == TaskState::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_state_serialization_roundtrip() {
        let state = TaskState::AwaitCommand;
        let json = serde_json::to_string(&state).unwrap();
        let back: TaskState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }

    #[test]
    fn terminal_states() {
        assert!(TaskState::Done.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::Idle.is_terminal());
        assert!(!TaskState::AwaitRelease.is_terminal());
    }

    #[test]
    fn task_state_display_is_snake_case() {
        assert_eq!(TaskState::PerceptionCapture.to_string(), "perception_capture");
        assert_eq!(TaskState::PoseSearch.to_string(), "pose_search");
    }

    #[test]
    fn pick_error_display() {
        let err = PickError::NoLabelMatch("bowl".to_string());
        assert!(err.to_string().contains("bowl"));

        let err2 = PickError::NoFeasiblePose { candidates: 7 };
        assert!(err2.to_string().contains('7'));
    }

    #[test]
    fn pick_error_serialization_roundtrip() {
        let err = PickError::ExecutionFailed {
            stage: "lift".to_string(),
            details: "controller aborted".to_string(),
        };
        let json = serde_json::to_string(&err).unwrap();
        let back: PickError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }

    #[test]
    fn run_report_roundtrip() {
        let report = RunReport {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            final_state: TaskState::Done,
            error: None,
            category: Some("cup".to_string()),
            target_segment: Some(3),
            approach_index: Some(1),
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report.run_id, back.run_id);
        assert!(back.succeeded());
    }

    #[test]
    fn failed_report_is_not_success() {
        let report = RunReport {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            final_state: TaskState::Failed,
            error: Some(PickError::PerceptionEmpty("segments".to_string())),
            category: None,
            target_segment: None,
            approach_index: None,
        };
        assert!(!report.succeeded());
    }
}
