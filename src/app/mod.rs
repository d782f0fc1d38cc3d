//! Core application logic for fetchlist
//!
//! This module contains the item list model and loader, the HTTP client, the
//! single-file transfer engine, the download cache and the batch runner that
//! ties them together.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use fetchlist::app::{
//!     load_items, BatchConfig, BatchRunner, ClientConfig, Downloader, FetchClient,
//!     TransferConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let groups = load_items(Path::new("config.yaml")).await?;
//!
//! let fetcher = Arc::new(FetchClient::new(&ClientConfig::default())?);
//! let downloader = Downloader::new(fetcher, TransferConfig::default());
//! let runner = BatchRunner::new(downloader, BatchConfig::default());
//!
//! let stats = runner.run(&groups).await;
//! println!("succeeded {}/{}", stats.succeeded(), stats.total);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod cache;
pub mod client;
pub mod format;
pub mod items;
pub mod models;
pub mod transfer;

// Re-export main public API
pub use batch::{
    BatchConfig, BatchEvent, BatchObserver, BatchRunner, BatchStats, ItemOutcome, OutcomeStatus,
    PlannedAction, PlannedItem,
};
pub use cache::{CacheConfig, CacheManager};
pub use client::{resolve_download_url, ClientConfig, FetchClient, FetchResponse, HttpFetcher};
pub use format::{format_duration, format_size, format_speed};
pub use items::{load_items, parse_items};
pub use models::{item_count, DownloadItem, ItemGroups};
pub use transfer::{
    Downloader, NullObserver, ProgressSnapshot, TransferConfig, TransferEvent, TransferObserver,
    TransferSummary,
};
