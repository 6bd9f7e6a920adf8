//! Real-time step timer
//!
//! [`ThreadTimer`] implements the scheduler's [`StepTimer`] contract with
//! wall-clock delays. Each armed step sleeps on a short-lived thread,
//! checking the shared current generation in small increments so `cancel`
//! and re-arms interrupt promptly, then delivers a [`StepFired`] message
//! over a channel. The host thread receives fires and forwards them to
//! [`presto_core::PlaybackScheduler::on_timer_fired`], keeping all
//! scheduler and cursor mutation on one thread.

use crossbeam_channel::{unbounded, Receiver, Sender};
use presto_core::StepTimer;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Sentinel meaning no step is armed. Scheduler generations start at 1.
const NO_STEP: u64 = 0;

/// Granularity of the interruptible sleep.
const SLEEP_SLICE: Duration = Duration::from_millis(5);

/// A step timer fire, delivered to the host thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepFired {
    pub generation: u64,
}

/// Wall-clock one-shot timer delivering fires over a crossbeam channel.
pub struct ThreadTimer {
    tx: Sender<StepFired>,
    current: Arc<AtomicU64>,
}

impl ThreadTimer {
    /// Create a timer and the receiver the host loop should drain.
    pub fn new() -> (Self, Receiver<StepFired>) {
        let (tx, rx) = unbounded();
        (
            Self {
                tx,
                current: Arc::new(AtomicU64::new(NO_STEP)),
            },
            rx,
        )
    }
}

impl StepTimer for ThreadTimer {
    fn arm(&mut self, delay: Duration, generation: u64) {
        self.current.store(generation, Ordering::Relaxed);
        let tx = self.tx.clone();
        let current = self.current.clone();

        thread::spawn(move || {
            let target = Instant::now() + delay;
            loop {
                let now = Instant::now();
                if now >= target {
                    break;
                }
                if current.load(Ordering::Relaxed) != generation {
                    return; // cancelled or superseded mid-sleep
                }
                thread::sleep((target - now).min(SLEEP_SLICE));
            }
            if current.load(Ordering::Relaxed) == generation {
                let _ = tx.send(StepFired { generation });
            }
        });
    }

    fn cancel(&mut self) {
        self.current.store(NO_STEP, Ordering::Relaxed);
    }
}
