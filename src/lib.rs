//! fetchlist library
//!
//! Downloads the files described by a YAML item list, one after another.
//! Each transfer shows live progress, is cancelled when its speed stays too
//! low for too long, and replaces its destination atomically only after the
//! whole body has arrived.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
