//! Failure taxonomy shared by the upstream client, the resilience layers,
//! and the aggregator.
//!
//! # Classification
//! - `NotFound`: the upstream says the id does not exist; never retried
//! - `Transient`: network error, timeout, or 5xx; retried within the budget
//! - `CircuitOpen`: rejected by an open breaker without touching upstream
//! - `RetriesExhausted`: terminal retry outcome, wraps the last failure
//! - `Internal`: unclassified (malformed body, unexpected status); not retried

use thiserror::Error;

use crate::upstream::types::ProductId;

/// Failure of a single upstream operation or of an aggregation request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream answered 404 for this identifier.
    #[error("product {0} not found upstream")]
    NotFound(ProductId),

    /// Network error, timeout, or upstream 5xx. Worth another attempt.
    #[error("transient upstream failure: {reason}")]
    Transient { reason: String },

    /// The circuit breaker refused admission; upstream was not called.
    #[error("circuit breaker '{breaker}' is open")]
    CircuitOpen { breaker: String },

    /// The retry budget is spent; carries the last observed failure.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },

    /// Anything that does not fit the classification above.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FetchError {
    /// True for failures a fresh attempt could plausibly clear.
    ///
    /// A breaker rejection is retryable on purpose: the attempt is burned
    /// without generating upstream load, and a later attempt may find the
    /// circuit half-open.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Transient { .. } | FetchError::CircuitOpen { .. }
        )
    }
}
