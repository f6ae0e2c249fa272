//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     load config → validate → wire core → bind listener → serve
//!
//! Shutdown:
//!     SIGTERM/Ctrl+C (signals.rs) → broadcast (shutdown.rs)
//!     → server stops accepting, drains, exits
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
