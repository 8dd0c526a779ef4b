//! Operator signal mailboxes.
//!
//! The task thread owns the state machine; operator inputs (a spoken or
//! gazed category, the release trigger) arrive from other threads. Each
//! input gets a [`Mailbox`]: a single slot guarded by a mutex with a
//! condition variable for the consumer to park on. The consumer re-checks
//! the slot under the same lock before every park, so a send can never be
//! missed, and a value sent before the consumer starts waiting is simply
//! picked up on arrival.
//!
//! A second send before the first is consumed replaces the slot – for
//! operator commands the newest utterance is the one that counts.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use graspos_runtime::signals::Mailbox;
//!
//! let mailbox: Arc<Mailbox<String>> = Arc::new(Mailbox::new());
//! let producer = Arc::clone(&mailbox);
//!
//! std::thread::spawn(move || producer.send("cup".to_string()));
//! assert_eq!(mailbox.wait(), "cup");
//! ```

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// A single-slot, thread-safe handoff cell.
#[derive(Debug, Default)]
pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
    bell: Condvar,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            bell: Condvar::new(),
        }
    }

    // A poisoned lock means a producer panicked mid-send of a plain value;
    // the slot itself is still coherent, so recover it rather than
    // propagating the panic into the task thread.
    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Put `value` in the slot, replacing any unconsumed one, and wake the
    /// waiting consumer.
    pub fn send(&self, value: T) {
        let mut slot = self.lock();
        *slot = Some(value);
        self.bell.notify_all();
    }

    /// Take the value if one is present, without blocking.
    pub fn try_take(&self) -> Option<T> {
        self.lock().take()
    }

    /// Block until a value arrives, then take it.
    pub fn wait(&self) -> T {
        let mut slot = self.lock();
        loop {
            if let Some(value) = slot.take() {
                return value;
            }
            slot = self
                .bell
                .wait(slot)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Block until a value arrives or `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.lock();
        loop {
            if let Some(value) = slot.take() {
                return Some(value);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let (guard, _result) = self
                .bell
                .wait_timeout(slot, remaining)
                .unwrap_or_else(|e| e.into_inner());
            slot = guard;
        }
    }
}

/// The two operator inputs of a pick run, shared between the producer
/// threads and the task thread via `Arc`.
#[derive(Debug, Default)]
pub struct OperatorSignals {
    /// Category string from the voice/gaze pipeline.
    pub command: Mailbox<String>,
    /// Trigger to let go of the held object.
    pub release: Mailbox<()>,
}

impl OperatorSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer-side entry point for a recognised category.
    pub fn on_command(&self, category: impl Into<String>) {
        self.command.send(category.into());
    }

    /// Producer-side entry point for the release trigger.
    pub fn on_release(&self) {
        self.release.send(());
    }
}
