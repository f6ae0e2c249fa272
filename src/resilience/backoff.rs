//! Inter-attempt delay for the retry policy.

use std::time::Duration;

use rand::Rng;

/// Delay before re-attempt number `attempt` (1 = first retry).
///
/// Doubles from `base_ms` up to the `max_ms` cap, plus up to 10% jitter so
/// fetches that failed together do not retry in lockstep. Configuring
/// `base_ms == max_ms` degenerates to a fixed wait.
pub fn retry_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let doubled = base_ms.saturating_mul(2u64.saturating_pow(attempt - 1));
    let capped = doubled.min(max_ms);

    let jitter_span = capped / 10;
    let jitter = if jitter_span > 0 {
        rand::thread_rng().gen_range(0..jitter_span)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}
