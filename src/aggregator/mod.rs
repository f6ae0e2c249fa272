//! Similar-products aggregation.
//!
//! # Data Flow
//! ```text
//! get_similar_products(root)
//!     → upstream.similar_product_ids(root)       (unprotected; failure is fatal)
//!     → per id: semaphore permit (max_active_requests)
//!         → retry( breaker( upstream.product_detail(id) ) )
//!     → successes collected in completion order
//!     → failures logged and dropped
//! ```
//!
//! # Design Decisions
//! - Resolution failure fails the request; a single detail failure never does
//! - Retry wraps the breaker, so every attempt re-asks for admission
//! - Dropping the returned future aborts all in-flight fetches

pub mod service;

pub use service::SimilarProductService;
