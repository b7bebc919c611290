//! Cancellable periodic tasks.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Handle to a spawned periodic task.
///
/// `cancel()` is idempotent. Dropping the handle cancels the task.
pub struct TaskHandle {
    name: &'static str,
    abort: AbortHandle,
    cancelled: AtomicBool,
}

impl TaskHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stop the task. Later calls do nothing.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.abort.abort();
            debug!(task = self.name, "Task cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// True once the task has stopped running, whatever the reason.
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Run `tick` every `period`, starting immediately.
///
/// Ticks never overlap: a slow tick delays the next one instead of queueing a
/// burst.
pub fn spawn_interval<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> TaskHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            tick().await;
        }
    });

    debug!(task = name, period_ms = period.as_millis() as u64, "Task started");
    TaskHandle {
        name,
        abort: handle.abort_handle(),
        cancelled: AtomicBool::new(false),
    }
}
