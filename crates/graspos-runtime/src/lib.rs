//! `graspos-runtime` – the pick-task state machine and its operator inputs.
//!
//! # Modules
//!
//! - [`signals`] – [`Mailbox`][signals::Mailbox]: single-slot, lock-and-
//!   condvar handoff from asynchronous operator sources (voice, gaze, a
//!   release button) into the task thread.
//! - [`config`] – [`TaskConfig`][config::TaskConfig]: TOML-backed task
//!   parameters with per-field defaults.
//! - [`task`] – [`PickTask`][task::PickTask]: the orchestrator that drives
//!   one run from environment setup through release.

pub mod config;
pub mod signals;
pub mod task;
