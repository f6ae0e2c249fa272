//! Outbound catalog surface.
//!
//! # Responsibilities
//! - Wire types for the two catalog endpoints (types.rs)
//! - A transport-only client (client.rs); resilience lives a layer up
//!
//! # Design Decisions
//! - `UpstreamClient` is a trait object so tests can script the catalog
//! - Failure classification happens here, once, for every caller

pub mod client;
pub mod types;

pub use client::{HttpUpstreamClient, UpstreamClient};
pub use types::{ProductDetail, ProductId};
