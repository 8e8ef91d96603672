use super::ThroughputMonitor;
use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const LOG_TARGET: &str = "   rotator";

/// How often the oldest bucket is rotated out unless configured otherwise.
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_mins(30);

/// Periodically rotates a [`ThroughputMonitor`] from a background tokio task.
///
/// The first rotation happens one full `interval` after [`Rotator::spawn`].
/// Dropping the rotator stops the task.
#[derive(Debug)]
pub struct Rotator {
    task: JoinHandle<()>,
    rotations: Arc<AtomicU64>,
}

impl Rotator {
    /// Start rotating `monitor` every `interval`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    #[must_use]
    pub fn spawn(monitor: Arc<ThroughputMonitor>, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "rotation interval must be non-zero");

        let rotations = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(rotate_task(monitor, interval, Arc::clone(&rotations)));

        log::debug!(target: LOG_TARGET, "Rotating every {:.0}s", interval.as_secs_f64());
        Self { task, rotations }
    }

    /// Number of rotations performed so far.
    #[must_use]
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// Stop rotating. Equivalent to dropping the rotator.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for Rotator {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn rotate_task(monitor: Arc<ThroughputMonitor>, interval: Duration, rotations: Arc<AtomicU64>) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    #[expect(clippy::infinite_loop, reason = "task runs until aborted")]
    loop {
        let _ = ticker.tick().await;

        if monitor.rotate().is_some() {
            let _ = rotations.fetch_add(1, Ordering::Relaxed);
        }
    }
}
