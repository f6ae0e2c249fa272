//! Retry policy for single upstream calls.
//!
//! # Responsibilities
//! - Re-attempt transient-classified failures up to a fixed budget
//! - Delay between attempts with jittered backoff (backoff.rs)
//! - Tag exhaustion so the terminal error names the spent budget
//!
//! # Design Decisions
//! - Not-found is never retried; a missing product does not appear by asking again
//! - A breaker rejection burns an attempt without generating upstream load
//! - The policy is immutable configuration; it holds no per-call state

use std::future::Future;

use crate::error::FetchError;
use crate::resilience::backoff::retry_delay;

/// Immutable retry parameters, shared read-only by every fetch task.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op`, re-invoking it on retryable failures.
    ///
    /// Returns the first success, a non-retryable failure as-is, or
    /// [`FetchError::RetriesExhausted`] once the budget is spent.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !err.is_retryable() {
                return Err(err);
            }
            if attempt >= self.max_attempts {
                return Err(FetchError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }
            let delay = retry_delay(attempt, self.base_delay_ms, self.max_delay_ms);
            tracing::debug!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying upstream call"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
