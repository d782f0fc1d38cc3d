//! Command-line interface components
//!
//! This module contains CLI-specific code for fetchlist, including argument
//! parsing, command handlers and console progress.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{CacheAction, CacheArgs, Cli, Commands, DownloadArgs, GlobalArgs};
pub use commands::{handle_cache, handle_download};
pub use progress::{status_message, ConsoleReporter};
