//! `graspos-cli` – headless demo of one full pick run.
//!
//! Wires the task orchestrator to the in-process simulators: a tabletop
//! with a cup and a juice box, an always-feasible arm, and a scripted
//! operator who asks for a category (default `"cup"`, override with the
//! first CLI argument) and triggers the release shortly after the lift.
//!
//! Configuration is read from `graspos.toml` in the working directory when
//! present; every field falls back to its default otherwise. Logging is
//! plain `RUST_LOG`-filtered output; set `GRASPOS_LOG_FORMAT=json` for
//! newline-delimited JSON.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use colored::Colorize;
use tracing::info;

use graspos_hal::sim::{
    SimGraspSource, SimJointGroup, SimKinematicChain, SimObstacleSink, SimPerception,
};
use graspos_perception::geometry::{Pose, Quaternion, Rect, Vec3};
use graspos_perception::segment::{GeometricSegment, VisionDetection};
use graspos_runtime::config::{self, TaskConfig};
use graspos_runtime::signals::OperatorSignals;
use graspos_runtime::task::{Collaborators, PickTask};

fn main() {
    init_logging();

    let category = std::env::args().nth(1).unwrap_or_else(|| "cup".to_string());

    let config_path = Path::new("graspos.toml");
    let config = match config::load_from(config_path) {
        Ok(Some(cfg)) => {
            info!(path = %config_path.display(), "configuration loaded");
            cfg
        }
        Ok(None) => TaskConfig::default(),
        Err(e) => {
            eprintln!("{}: {e}", "config error".red());
            eprintln!("  falling back to defaults");
            TaskConfig::default()
        }
    };

    println!("{}", "GraspOS pick demo (simulated rig)".bold());
    println!("  requested category: {}", category.bold());

    // ── Simulated rig ─────────────────────────────────────────────────────
    let mut perception = tabletop_perception();
    let mut grasps = SimGraspSource::new()
        .with_candidates(
            1,
            vec![
                grasp_candidate(0.55, -0.05),
                grasp_candidate(0.55, 0.0),
                grasp_candidate(0.55, 0.05),
            ],
        )
        .with_candidates(
            2,
            vec![grasp_candidate(0.7, -0.25), grasp_candidate(0.7, -0.15)],
        );
    let mut arm = SimKinematicChain::always_feasible("arm_right_torso");
    let mut scene = SimObstacleSink::new();
    let mut gripper = SimJointGroup::new("gripper_right", vec![0.0, 0.0]);
    let mut head = SimJointGroup::new("head", vec![0.0, 0.0]);
    let mut torso = SimJointGroup::new("torso", vec![0.0]);

    // ── Scripted operator ─────────────────────────────────────────────────
    let signals = Arc::new(OperatorSignals::new());
    let operator = Arc::clone(&signals);
    let spoken = category.clone();
    let operator_thread = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        info!(category = %spoken, "operator speaks");
        operator.on_command(spoken);
        thread::sleep(Duration::from_millis(1500));
        info!("operator triggers release");
        operator.on_release();
    });

    // ── One run ───────────────────────────────────────────────────────────
    let mut task = PickTask::new(config, Arc::clone(&signals));
    let mut collaborators = Collaborators {
        perception: &mut perception,
        grasps: &mut grasps,
        arm: &mut arm,
        scene: &mut scene,
        gripper: &mut gripper,
        head: &mut head,
        torso: &mut torso,
    };
    let report = task.run(&mut collaborators);

    let _ = operator_thread.join();

    // ── Outcome ───────────────────────────────────────────────────────────
    if report.succeeded() {
        println!("  outcome: {}", "done".green().bold());
    } else {
        println!("  outcome: {}", "failed".red().bold());
    }
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("could not render report: {e}"),
    }

    if !report.succeeded() {
        std::process::exit(1);
    }
}

fn init_logging() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("GRASPOS_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }
}

/// A cup (segment 1) and a juice box (segment 2) on the demo table.
fn tabletop_perception() -> SimPerception {
    let segments = vec![
        GeometricSegment {
            id: 1,
            center: Vec3::new(0.55, 0.0, 0.85),
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            a1: 0.035,
            a2: 0.035,
            a3: 0.09,
            e1: 0.05,
            e2: 0.4,
            bbox: Rect::new(100.0, 100.0, 160.0, 220.0),
        },
        GeometricSegment {
            id: 2,
            center: Vec3::new(0.7, -0.2, 0.88),
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.4,
            a1: 0.03,
            a2: 0.045,
            a3: 0.12,
            e1: 0.95,
            e2: 0.2,
            bbox: Rect::new(300.0, 90.0, 380.0, 210.0),
        },
    ];
    let detections = vec![
        VisionDetection {
            category: "red cup".to_string(),
            bbox: Rect::new(103.0, 98.0, 158.0, 218.0),
        },
        VisionDetection {
            category: "juice box".to_string(),
            bbox: Rect::new(297.0, 93.0, 377.0, 208.0),
        },
    ];
    SimPerception::new(segments, detections)
}

fn grasp_candidate(x: f32, y: f32) -> Pose {
    Pose::new(Vec3::new(x, y, 0.85), Quaternion::identity())
}
