//! Periodic background work that runs off the game loop.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// A closure invoked every `period` on its own tokio task.
///
/// The first run happens one full period after spawning. Dropping the
/// handle cancels the task.
pub struct RepeatingTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl RepeatingTask {
    /// Spawns the task on the current runtime.
    ///
    /// # Panics
    /// Panics if `period` is zero (tokio's `interval` requirement).
    pub fn spawn<F>(name: &'static str, period: Duration, mut f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                trace!(task = name, "repeating task fired");
                f();
            }
        });
        debug!(task = name, period_ms = period.as_millis() as u64, "repeating task started");
        Self { name, handle }
    }

    /// Name given at spawn time.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stops the task. Idempotent.
    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            debug!(task = self.name, "repeating task cancelled");
        }
        self.handle.abort();
    }

    /// Whether the task has stopped running.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
