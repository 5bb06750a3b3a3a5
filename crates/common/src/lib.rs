//! Marktrack Common Utilities
//!
//! Shared infrastructure for all marktrack crates:
//! - Error types and result aliases
//! - Frame clock and run stamps for deriving timestamps from frame indices
//! - Cooperative cancellation between the foreground and the frame worker
//! - Tracing/logging initialization
//! - Configuration loading

pub mod cancel;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use cancel::*;
pub use clock::*;
pub use config::*;
pub use error::*;
