//! Cancellable one-shot step timer contract
//!
//! The scheduler never sleeps itself; it arms an injected [`StepTimer`]
//! with the delay to the next step and a generation number identifying the
//! pending step. The host delivers the fire back through
//! [`crate::scheduler::PlaybackScheduler::on_timer_fired`], which ignores
//! generations that were cancelled or superseded in the meantime. At most
//! one generation is live at any instant.
//!
//! [`ManualTimer`] is the deterministic implementation used by tests and
//! virtual-time hosts; the real-time thread-backed implementation lives in
//! the `presto` crate.

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A pending scheduled step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedStep {
    /// Real-time delay until the step should fire.
    pub delay: Duration,
    /// Identity of the pending step; stale fires are ignored.
    pub generation: u64,
}

/// One-shot timer source the scheduler arms between steps.
pub trait StepTimer {
    /// Arm the timer. Replaces any previously armed step.
    fn arm(&mut self, delay: Duration, generation: u64);

    /// Cancel the pending step, if any.
    fn cancel(&mut self);
}

/// Deterministic timer for tests and virtual-time hosts.
///
/// Records the most recently armed step instead of sleeping. Clones share
/// state, so a host can hand one clone to the scheduler and keep another to
/// observe and fire steps at its own pace.
#[derive(Clone, Default)]
pub struct ManualTimer {
    armed: Arc<Mutex<Option<ArmedStep>>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently armed step, if any.
    pub fn armed(&self) -> Option<ArmedStep> {
        *self.armed.lock().unwrap()
    }

    /// Take the armed step, leaving the timer empty. The caller is expected
    /// to deliver it to the scheduler as a fire.
    pub fn take(&self) -> Option<ArmedStep> {
        self.armed.lock().unwrap().take()
    }
}

impl StepTimer for ManualTimer {
    fn arm(&mut self, delay: Duration, generation: u64) {
        *self.armed.lock().unwrap() = Some(ArmedStep { delay, generation });
    }

    fn cancel(&mut self) {
        *self.armed.lock().unwrap() = None;
    }
}
