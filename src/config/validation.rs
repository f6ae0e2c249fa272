//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic ones. Pure function over the
//! config; collects every problem instead of stopping at the first.

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidBindAddress(String),
    InvalidBaseUrl(String),
    InvalidMetricsAddress(String),
    ZeroBound(&'static str),
    ThresholdOutOfRange(f32),
    DelayCapBelowBase { base_ms: u64, max_ms: u64 },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "listener.bind_address '{addr}' is not a socket address")
            }
            ValidationError::InvalidBaseUrl(url) => {
                write!(f, "upstream.base_url '{url}' is not a valid URL")
            }
            ValidationError::InvalidMetricsAddress(addr) => {
                write!(
                    f,
                    "observability.metrics_address '{addr}' is not a socket address"
                )
            }
            ValidationError::ZeroBound(field) => {
                write!(f, "{field} must be greater than zero")
            }
            ValidationError::ThresholdOutOfRange(value) => {
                write!(
                    f,
                    "circuit_breaker.failure_rate_threshold {value} must be within (0, 100]"
                )
            }
            ValidationError::DelayCapBelowBase { base_ms, max_ms } => {
                write!(
                    f,
                    "retries.max_delay_ms {max_ms} is below retries.base_delay_ms {base_ms}"
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a parsed configuration, returning every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if Url::parse(&config.upstream.base_url).is_err() {
        errors.push(ValidationError::InvalidBaseUrl(
            config.upstream.base_url.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroBound("timeouts.request_secs"));
    }
    if config.upstream.response_timeout_ms == 0 {
        errors.push(ValidationError::ZeroBound("upstream.response_timeout_ms"));
    }
    if config.aggregation.max_active_requests == 0 {
        errors.push(ValidationError::ZeroBound("aggregation.max_active_requests"));
    }
    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::ZeroBound("retries.max_attempts"));
    }
    if config.retries.max_delay_ms < config.retries.base_delay_ms {
        errors.push(ValidationError::DelayCapBelowBase {
            base_ms: config.retries.base_delay_ms,
            max_ms: config.retries.max_delay_ms,
        });
    }
    if config.circuit_breaker.sliding_window_size == 0 {
        errors.push(ValidationError::ZeroBound(
            "circuit_breaker.sliding_window_size",
        ));
    }
    if config.circuit_breaker.minimum_calls == 0 {
        errors.push(ValidationError::ZeroBound("circuit_breaker.minimum_calls"));
    }
    if config.circuit_breaker.permitted_half_open_calls == 0 {
        errors.push(ValidationError::ZeroBound(
            "circuit_breaker.permitted_half_open_calls",
        ));
    }
    let threshold = config.circuit_breaker.failure_rate_threshold;
    if !(threshold > 0.0 && threshold <= 100.0) {
        errors.push(ValidationError::ThresholdOutOfRange(threshold));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn all_problems_are_collected() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.aggregation.max_active_requests = 0;
        config.circuit_breaker.failure_rate_threshold = 120.0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidBindAddress(_))));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ZeroBound("aggregation.max_active_requests"))));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ThresholdOutOfRange(_))));
    }

    #[test]
    fn inverted_retry_delays_are_rejected() {
        let mut config = AppConfig::default();
        config.retries.base_delay_ms = 500;
        config.retries.max_delay_ms = 100;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DelayCapBelowBase { .. })));
    }
}
