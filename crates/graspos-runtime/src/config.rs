//! Task configuration – reads an optional `graspos.toml`.
//!
//! Every field has a default tuned for the tabletop demo rig, so an absent
//! or partial file is fine. Distances are metres, times seconds, joint
//! positions radians (gripper fingers: metres of finger travel).

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use graspos_perception::geometry::{Pose, Quaternion, Vec3};
use graspos_perception::shape::ShapeLimits;

/// Parameters of one pick run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Standoff distance between the staged approach and the grasp pose.
    #[serde(default = "default_reaching_distance")]
    pub reaching_distance: f32,

    /// Fixed offset from the tool frame back to the gripper frame. Added to
    /// `reaching_distance` for the approach and applied alone for the final
    /// grasp target.
    #[serde(default = "default_tool_gripper_offset")]
    pub tool_gripper_offset: f32,

    /// Shape-exponent threshold below which a profile reads as square.
    #[serde(default = "default_elimit1")]
    pub elimit1: f32,

    /// Shape-exponent threshold at which a cross-section reads as pinched.
    #[serde(default = "default_elimit2")]
    pub elimit2: f32,

    /// Clearance margin added to every collision primitive dimension.
    #[serde(default = "default_inflate_size")]
    pub inflate_size: f32,

    /// How far straight up to lift the grasped object.
    #[serde(default = "default_lift_distance")]
    pub lift_distance: f32,

    /// A joint group already within this error of its home position is not
    /// re-homed during environment setup.
    #[serde(default = "default_max_joint_error")]
    pub max_joint_error: f32,

    /// Home position of the two head joints (pan, tilt).
    #[serde(default = "default_head_home")]
    pub head_home: [f32; 2],

    /// Home position of the torso lift joint.
    #[serde(default = "default_torso_home")]
    pub torso_home: f32,

    /// Finger positions for an open gripper.
    #[serde(default = "default_gripper_open")]
    pub gripper_open: [f32; 2],

    /// Finger positions for a closed (holding) gripper.
    #[serde(default = "default_gripper_close")]
    pub gripper_close: [f32; 2],

    /// Seconds granted to each joint-group goal.
    #[serde(default = "default_joint_move_time")]
    pub joint_move_time_s: f32,

    /// Workspace table full extents (x, y, z).
    #[serde(default = "default_table_dimensions")]
    pub table_dimensions: [f32; 3],

    /// Workspace table centre in the planning frame.
    #[serde(default = "default_table_position")]
    pub table_position: [f32; 3],

    /// IK attempt budget per approach candidate.
    #[serde(default = "default_ik_attempts")]
    pub ik_attempts: u32,

    /// Per-attempt IK timeout, seconds.
    #[serde(default = "default_ik_timeout")]
    pub ik_timeout_s: f32,

    /// Pause after toggling segment computation, letting the fitter finish
    /// a cycle before capture.
    #[serde(default = "default_settle_time")]
    pub settle_time_s: f32,

    /// Optional bound on the command wait. `None` (the default) waits
    /// forever, matching the demo's original behaviour; setting a bound
    /// turns an absent operator into a reported timeout failure.
    #[serde(default)]
    pub command_timeout_s: Option<f32>,

    /// Optional bound on the release wait; same semantics.
    #[serde(default)]
    pub release_timeout_s: Option<f32>,
}

fn default_reaching_distance() -> f32 {
    0.10
}
fn default_tool_gripper_offset() -> f32 {
    0.151
}
fn default_elimit1() -> f32 {
    0.1
}
fn default_elimit2() -> f32 {
    0.9
}
fn default_inflate_size() -> f32 {
    0.02
}
fn default_lift_distance() -> f32 {
    0.2
}
fn default_max_joint_error() -> f32 {
    0.02
}
fn default_head_home() -> [f32; 2] {
    [0.0, -0.6]
}
fn default_torso_home() -> f32 {
    0.25
}
fn default_gripper_open() -> [f32; 2] {
    [0.05, 0.05]
}
fn default_gripper_close() -> [f32; 2] {
    [0.03, 0.03]
}
fn default_joint_move_time() -> f32 {
    2.0
}
fn default_table_dimensions() -> [f32; 3] {
    [1.1, 0.95, 0.7]
}
fn default_table_position() -> [f32; 3] {
    [0.9, 0.0, 0.4]
}
fn default_ik_attempts() -> u32 {
    10
}
fn default_ik_timeout() -> f32 {
    0.1
}
fn default_settle_time() -> f32 {
    0.5
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            reaching_distance: default_reaching_distance(),
            tool_gripper_offset: default_tool_gripper_offset(),
            elimit1: default_elimit1(),
            elimit2: default_elimit2(),
            inflate_size: default_inflate_size(),
            lift_distance: default_lift_distance(),
            max_joint_error: default_max_joint_error(),
            head_home: default_head_home(),
            torso_home: default_torso_home(),
            gripper_open: default_gripper_open(),
            gripper_close: default_gripper_close(),
            joint_move_time_s: default_joint_move_time(),
            table_dimensions: default_table_dimensions(),
            table_position: default_table_position(),
            ik_attempts: default_ik_attempts(),
            ik_timeout_s: default_ik_timeout(),
            settle_time_s: default_settle_time(),
            command_timeout_s: None,
            release_timeout_s: None,
        }
    }
}

impl TaskConfig {
    /// Total backward offset of the staged approach: reaching distance plus
    /// the tool-to-gripper distance, additive by construction.
    pub fn reach_offset(&self) -> f32 {
        self.reaching_distance + self.tool_gripper_offset
    }

    /// Thresholds handed to the collision shape synthesizer.
    pub fn shape_limits(&self) -> ShapeLimits {
        ShapeLimits {
            elimit1: self.elimit1,
            elimit2: self.elimit2,
            inflate: self.inflate_size,
        }
    }

    /// Table pose in the planning frame (no rotation).
    pub fn table_pose(&self) -> Pose {
        Pose::new(
            Vec3::new(
                self.table_position[0],
                self.table_position[1],
                self.table_position[2],
            ),
            Quaternion::identity(),
        )
    }

    pub fn ik_timeout(&self) -> Duration {
        Duration::from_secs_f32(self.ik_timeout_s)
    }

    pub fn settle_time(&self) -> Duration {
        Duration::from_secs_f32(self.settle_time_s)
    }
}

/// Load a config from `path`. Returns `Ok(None)` when the file does not
/// exist, so callers can fall back to defaults.
pub fn load_from(path: &Path) -> Result<Option<TaskConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config at {}: {e}", path.display()))?;
    let cfg: TaskConfig =
        toml::from_str(&raw).map_err(|e| format!("failed to parse config: {e}"))?;
    Ok(Some(cfg))
}
