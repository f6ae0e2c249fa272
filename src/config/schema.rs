//! Configuration schema definitions.
//!
//! All types derive Serde traits and default field-by-field, so a minimal
//! TOML file (or none at all) yields a runnable configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the aggregation service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Inbound timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Upstream catalog settings.
    pub upstream: UpstreamConfig,

    /// Fan-out settings.
    pub aggregation: AggregationConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Circuit breaker configuration.
    pub circuit_breaker: CircuitBreakerSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Inbound timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request timeout in seconds; bounds one full aggregation.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Upstream catalog configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the catalog service.
    pub base_url: String,

    /// Per-call response timeout in milliseconds.
    pub response_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            response_timeout_ms: 5000,
        }
    }
}

/// Fan-out configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Maximum detail fetches in flight per aggregation request.
    pub max_active_requests: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_active_requests: 5,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per call, the first one included.
    pub max_attempts: u32,

    /// Base delay for backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Delay cap for backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Call outcomes kept in the sliding window.
    pub sliding_window_size: usize,

    /// Recorded calls required before the failure rate is evaluated.
    pub minimum_calls: usize,

    /// Failure percentage at which the circuit opens.
    pub failure_rate_threshold: f32,

    /// Seconds an open circuit rejects calls before probing again.
    pub wait_duration_open_secs: u64,

    /// Trial calls admitted while half-open.
    pub permitted_half_open_calls: u32,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            sliding_window_size: 10,
            minimum_calls: 5,
            failure_rate_threshold: 50.0,
            wait_duration_open_secs: 10,
            permitted_half_open_calls: 3,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Metrics exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
