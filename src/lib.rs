//! Similar-products aggregation service.
//!
//! Given a root product id, the service resolves the similar ids from the
//! upstream catalog and fetches each detail record concurrently under a
//! bounded limit, with per-call retry and circuit-breaker admission.
//! Unreachable items are dropped; callers get the reachable subset.
//!
//! # Architecture Overview
//!
//! ```text
//!   GET /product/{id}/similar
//!        │
//!        ▼
//!   ┌──────────┐      ┌──────────────────────┐      ┌───────────────────┐
//!   │   http   │─────▶│      aggregator      │─────▶│  upstream (ids)   │
//!   │ handlers │      │  resolve → fan out   │      └───────────────────┘
//!   └──────────┘      │ (semaphore, N wide)  │
//!        ▲            └──────────┬───────────┘
//!        │                       │ per id
//!        │            ┌──────────▼───────────┐      ┌───────────────────┐
//!   200 / 404 / 500   │   retry ▸ breaker    │─────▶│ upstream (detail) │
//!                     └──────────────────────┘      └───────────────────┘
//!
//!   Cross-cutting: config ─ observability ─ lifecycle
//! ```

// Core subsystems
pub mod aggregator;
pub mod config;
pub mod error;
pub mod http;
pub mod resilience;
pub mod upstream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use aggregator::SimilarProductService;
pub use config::AppConfig;
pub use error::FetchError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
