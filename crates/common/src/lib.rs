//! Tagreel Common Utilities
//!
//! Shared infrastructure for all Tagreel crates:
//! - Error types and result aliases
//! - Frame clock, dwell timers and cancellation helpers
//! - The export job lock
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod lock;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use lock::*;

pub use tokio_util::sync::CancellationToken;
