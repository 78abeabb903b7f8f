//! Scheduled publication of due posts.
//!
//! A single background timer loop promotes due scheduled posts on every
//! tick. Delivery is at-least-once: a cycle that fails leaves its posts
//! scheduled and the next tick picks them up again, so there is no
//! per-post retry inside a cycle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;

/// Executor seam for one promotion cycle.
#[async_trait::async_trait]
pub trait PublicationExecutor: Send + Sync {
    /// Promote every due scheduled post, returning how many were
    /// published.
    async fn publish_due(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;
}

/// Scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    /// No timer task is running.
    Stopped,
    /// The timer task is running.
    Running,
}

/// Background publication scheduler.
///
/// The timer state is exclusively owned by this instance; `start` and
/// `stop` are mutually exclusive and safe to call from any task.
pub struct PublicationScheduler<E: PublicationExecutor + 'static> {
    executor: Arc<E>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<E: PublicationExecutor + 'static> PublicationScheduler<E> {
    /// Create a new scheduler around an executor.
    #[must_use]
    pub fn new(executor: Arc<E>) -> Self {
        Self {
            executor,
            handle: Mutex::new(None),
        }
    }

    /// Start the scheduler.
    ///
    /// Runs one promotion cycle immediately, then one per `period`
    /// (which must be non-zero). Calling `start` while already running
    /// is a logged no-op. A failing cycle is reported and never stops
    /// the timer.
    pub fn start(&self, period: Duration) {
        let mut guard = self.lock_handle();

        if guard.as_ref().is_some_and(|h| !h.is_finished()) {
            tracing::debug!("Publication scheduler is already running");
            return;
        }

        let executor = Arc::clone(&self.executor);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                // The first tick completes immediately.
                ticker.tick().await;
                match executor.publish_due().await {
                    Ok(count) => {
                        if count > 0 {
                            tracing::info!(count, "Published due posts");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Publication cycle failed");
                    }
                }
            }
        });

        *guard = Some(handle);
        tracing::info!(period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            "Publication scheduler started");
    }

    /// Stop the scheduler. Idempotent if already stopped.
    pub fn stop(&self) {
        let mut guard = self.lock_handle();

        if let Some(handle) = guard.take() {
            handle.abort();
            tracing::info!("Publication scheduler stopped");
        }
    }

    /// Get the scheduler lifecycle state.
    pub fn status(&self) -> SchedulerStatus {
        let guard = self.lock_handle();

        if guard.as_ref().is_some_and(|h| !h.is_finished()) {
            SchedulerStatus::Running
        } else {
            SchedulerStatus::Stopped
        }
    }

    fn lock_handle(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        // A poisoned lock only means a panic elsewhere; the handle state
        // itself stays usable.
        self.handle.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<E: PublicationExecutor + 'static> Drop for PublicationScheduler<E> {
    fn drop(&mut self) {
        self.stop();
    }
}
