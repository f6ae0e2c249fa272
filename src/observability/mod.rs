//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! handlers    → metrics.rs (request counters, latency histogram)
//! upstream    → metrics.rs (per-operation call outcomes)
//! breaker     → metrics.rs (state gauge)
//! aggregator  → metrics.rs (dropped-product counter)
//! all modules → tracing (structured events; subscriber set up in main)
//! ```
//!
//! # Design Decisions
//! - Metric updates are cheap macro calls; without a recorder they are no-ops
//! - The Prometheus exporter runs on its own listener, away from traffic

pub mod metrics;
