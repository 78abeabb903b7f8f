//! Transient-fault retry for single statements.
//!
//! Every repository statement runs through [`RetryPolicy::run`]. Faults
//! classified as transient are retried up to a fixed bound with a fixed
//! backoff; once the bound is exhausted (or the fault is not transient)
//! the error surfaces as the fatal `Database` kind.

use std::future::Future;
use std::time::Duration;

use sea_orm::DbErr;
use tidepool_common::{AppError, AppResult};

/// Retry policy with a fixed bound and fixed backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the initial try.
    pub max_retries: u32,
    /// Delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Whether a storage fault is expected to clear if retried shortly.
///
/// Covers dropped/reset connections, pool and statement timeouts, and
/// the Postgres codes for serialization failure (40001) and connection
/// teardown during shutdown/recovery (57P01, 57P03).
#[must_use]
pub fn is_transient(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) => true,
        DbErr::Conn(e) | DbErr::Exec(e) | DbErr::Query(e) => {
            let msg = e.to_string().to_lowercase();
            msg.contains("connection reset")
                || msg.contains("connection terminated")
                || msg.contains("connection closed")
                || msg.contains("timed out")
                || msg.contains("timeout")
                || msg.contains("40001")
                || msg.contains("57p01")
                || msg.contains("57p03")
        }
        _ => false,
    }
}

impl RetryPolicy {
    /// Create a policy with the given bound and backoff.
    #[must_use]
    pub const fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Run a statement, retrying transient faults up to the bound.
    ///
    /// The closure is re-invoked for every attempt, so it must rebuild
    /// the statement from scratch.
    pub async fn run<T, F, Fut>(&self, op: F) -> AppResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, DbErr>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if is_transient(&err) && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(error = %err, attempt, "Transient database error, retrying");
                    tokio::time::sleep(self.backoff).await;
                }
                Err(err) if is_transient(&err) => {
                    return Err(AppError::Database(format!(
                        "transient fault persisted after {} attempts: {err}",
                        attempt + 1
                    )));
                }
                Err(err) => return Err(AppError::Database(err.to_string())),
            }
        }
    }
}
