//! Prelude module for the fetchlist library
//!
//! Re-exports the items most integrations need, so that
//! `use fetchlist::prelude::*;` is enough to build and run a batch.
//!
//! # Usage
//!
//! ```rust,no_run
//! use fetchlist::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let groups = load_items(Path::new("config.yaml")).await?;
//!     let cache = Arc::new(CacheManager::new(CacheConfig::default()).await?);
//!     let fetcher = Arc::new(FetchClient::new(&ClientConfig::default())?);
//!
//!     let downloader = Downloader::new(fetcher, TransferConfig::default()).with_cache(cache.clone());
//!     let stats = BatchRunner::new(downloader, BatchConfig::default())
//!         .with_cache(cache)
//!         .run(&groups)
//!         .await;
//!
//!     println!("succeeded {}/{}", stats.succeeded(), stats.total);
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, DownloadError, DownloadErrorKind, Result};

pub use crate::app::{
    load_items, BatchConfig, BatchRunner, BatchStats, CacheConfig, CacheManager, ClientConfig,
    DownloadItem, Downloader, FetchClient, HttpFetcher, ItemGroups, OutcomeStatus,
    TransferConfig, TransferObserver, TransferSummary,
};
pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_RETRIES, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;
