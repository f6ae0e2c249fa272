//! Circuit breaker guarding the detail-fetch upstream operation.
//!
//! # States
//! - Closed: calls pass through; outcomes recorded into a sliding window
//! - Open: calls fail fast without touching upstream
//! - Half-Open: a limited number of trial calls probe for recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure rate ≥ threshold over ≥ minimum_calls recorded calls
//! Open → Half-Open: wait_duration_open elapsed at the next admission attempt
//! Half-Open → Open: any trial fails
//! Half-Open → Closed: all permitted trials succeed (window cleared)
//! ```
//!
//! # Shared State
//! One instance guards every concurrent aggregation's detail fetches. All
//! mutations go through a single mutex that is never held across an await.
//! Admission hands out an RAII [`CallPermit`]; a permit dropped without an
//! outcome (the call was cancelled mid-flight) returns its half-open trial
//! slot, so cancellation cannot leak trial admissions.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::FetchError;
use crate::observability::metrics;

/// Breaker tuning parameters.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of most recent call outcomes considered for the failure rate.
    pub sliding_window_size: usize,
    /// Recorded calls required before the failure rate is evaluated at all.
    pub minimum_calls: usize,
    /// Failure percentage at which the circuit opens.
    pub failure_rate_threshold: f32,
    /// How long an open circuit rejects calls before probing again.
    pub wait_duration_open: Duration,
    /// Trial calls admitted while half-open.
    pub permitted_half_open_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            sliding_window_size: 10,
            minimum_calls: 5,
            failure_rate_threshold: 50.0,
            wait_duration_open: Duration::from_secs(10),
            permitted_half_open_calls: 3,
        }
    }
}

/// Classified result of one guarded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    /// Network error, timeout, or 5xx.
    TransientFailure,
    /// Upstream 404. Never retried, but still a failure for the window.
    NotFoundFailure,
}

impl CallOutcome {
    pub fn is_failure(self) -> bool {
        !matches!(self, CallOutcome::Success)
    }

    /// Classify a finished call. Breaker rejections never reach here; a
    /// rejected call was not executed and records nothing.
    pub fn from_result<T>(result: &Result<T, FetchError>) -> Self {
        match result {
            Ok(_) => CallOutcome::Success,
            Err(FetchError::NotFound(_)) => CallOutcome::NotFoundFailure,
            Err(_) => CallOutcome::TransientFailure,
        }
    }
}

/// Breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Ring buffer of the last `capacity` call outcomes (`true` = failure).
#[derive(Debug)]
struct OutcomeWindow {
    outcomes: VecDeque<bool>,
    capacity: usize,
}

impl OutcomeWindow {
    fn new(capacity: usize) -> Self {
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn record(&mut self, failed: bool) {
        if self.outcomes.len() == self.capacity {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(failed);
    }

    fn len(&self) -> usize {
        self.outcomes.len()
    }

    fn failure_rate(&self) -> f32 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        let failures = self.outcomes.iter().filter(|failed| **failed).count();
        failures as f32 * 100.0 / self.outcomes.len() as f32
    }

    fn clear(&mut self) {
        self.outcomes.clear();
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    window: OutcomeWindow,
    opened_at: Option<Instant>,
    trials_started: u32,
    trials_succeeded: u32,
}

/// Admission gate around a named class of upstream calls.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        tracing::info!(
            breaker = %name,
            window = config.sliding_window_size,
            minimum_calls = config.minimum_calls,
            failure_rate_threshold = config.failure_rate_threshold,
            permitted_half_open_calls = config.permitted_half_open_calls,
            "Circuit breaker initialized"
        );
        let window = OutcomeWindow::new(config.sliding_window_size);
        Self {
            name,
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                window,
                opened_at: None,
                trials_started: 0,
                trials_succeeded: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state, for logs and tests. Does not advance Open → Half-Open;
    /// only an admission attempt does.
    pub fn state(&self) -> CircuitState {
        self.locked().state
    }

    // A poisoned lock only means a panic on another thread; every mutation
    // completes under the guard, so the state itself is still consistent.
    fn locked(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask to make one guarded call.
    ///
    /// Open circuits reject immediately; once the open wait has elapsed the
    /// breaker moves to half-open and admits up to the permitted number of
    /// trials. The returned permit must be completed with the call outcome.
    pub fn try_acquire(&self) -> Result<CallPermit<'_>, FetchError> {
        let mut inner = self.locked();
        match inner.state {
            CircuitState::Closed => Ok(CallPermit::regular(self)),
            CircuitState::Open => {
                let wait_elapsed = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.wait_duration_open)
                    .unwrap_or(true);
                if !wait_elapsed {
                    return Err(self.rejection());
                }
                self.to_half_open(&mut inner);
                self.admit_trial(&mut inner)
            }
            CircuitState::HalfOpen => self.admit_trial(&mut inner),
        }
    }

    /// Run `op` under the breaker, recording its outcome.
    pub async fn call<T, F, Fut>(&self, op: F) -> Result<T, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let permit = self.try_acquire()?;
        let result = op().await;
        permit.complete(CallOutcome::from_result(&result));
        result
    }

    fn admit_trial(&self, inner: &mut BreakerInner) -> Result<CallPermit<'_>, FetchError> {
        if inner.trials_started >= self.config.permitted_half_open_calls {
            return Err(self.rejection());
        }
        inner.trials_started += 1;
        Ok(CallPermit::trial(self))
    }

    fn rejection(&self) -> FetchError {
        FetchError::CircuitOpen {
            breaker: self.name.clone(),
        }
    }

    fn record(&self, trial: bool, outcome: CallOutcome) {
        let mut inner = self.locked();
        let failed = outcome.is_failure();
        match inner.state {
            CircuitState::Closed => {
                inner.window.record(failed);
                if inner.window.len() >= self.config.minimum_calls
                    && inner.window.failure_rate() >= self.config.failure_rate_threshold
                {
                    self.to_open(&mut inner);
                }
            }
            CircuitState::HalfOpen if trial => {
                inner.window.record(failed);
                if failed {
                    self.to_open(&mut inner);
                } else {
                    inner.trials_succeeded += 1;
                    if inner.trials_succeeded >= self.config.permitted_half_open_calls {
                        self.to_closed(&mut inner);
                    }
                }
            }
            // The state moved on while this call was in flight; the counters
            // were reset at the transition, so the late outcome is discarded.
            _ => {}
        }
    }

    fn abandon(&self, trial: bool) {
        if !trial {
            return;
        }
        let mut inner = self.locked();
        if inner.state == CircuitState::HalfOpen {
            inner.trials_started = inner.trials_started.saturating_sub(1);
        }
    }

    fn to_open(&self, inner: &mut BreakerInner) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.trials_started = 0;
        inner.trials_succeeded = 0;
        tracing::warn!(
            breaker = %self.name,
            failure_rate = inner.window.failure_rate(),
            recorded_calls = inner.window.len(),
            wait_secs = self.config.wait_duration_open.as_secs(),
            "Circuit breaker opened, failing fast"
        );
        metrics::record_breaker_state(&self.name, CircuitState::Open);
    }

    fn to_half_open(&self, inner: &mut BreakerInner) {
        inner.state = CircuitState::HalfOpen;
        inner.trials_started = 0;
        inner.trials_succeeded = 0;
        tracing::info!(
            breaker = %self.name,
            permitted_trials = self.config.permitted_half_open_calls,
            "Circuit breaker half-open, probing upstream"
        );
        metrics::record_breaker_state(&self.name, CircuitState::HalfOpen);
    }

    fn to_closed(&self, inner: &mut BreakerInner) {
        inner.state = CircuitState::Closed;
        inner.window.clear();
        inner.opened_at = None;
        inner.trials_started = 0;
        inner.trials_succeeded = 0;
        tracing::info!(breaker = %self.name, "Circuit breaker closed, upstream recovered");
        metrics::record_breaker_state(&self.name, CircuitState::Closed);
    }
}

/// Permission for one guarded call.
///
/// Complete it with the observed outcome; dropping it unrecorded means the
/// call was cancelled, and any half-open trial slot is released.
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    completed: bool,
}

impl<'a> CallPermit<'a> {
    fn regular(breaker: &'a CircuitBreaker) -> Self {
        Self {
            breaker,
            trial: false,
            completed: false,
        }
    }

    fn trial(breaker: &'a CircuitBreaker) -> Self {
        Self {
            breaker,
            trial: true,
            completed: false,
        }
    }

    /// Record the call outcome and consume the permit.
    pub fn complete(mut self, outcome: CallOutcome) {
        self.completed = true;
        self.breaker.record(self.trial, outcome);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.breaker.abandon(self.trial);
        }
    }
}
