//! Download cache
//!
//! Remembers when each file was last downloaded so items marked
//! `keep-updated` are fetched again only once their record has expired.
//!
//! # Module Organization
//!
//! - [`config`] - Cache file location and expiry settings
//! - [`manager`] - Loading, querying and atomically persisting records
//!
//! # Examples
//!
//! ```rust,no_run
//! use fetchlist::app::cache::{CacheConfig, CacheManager};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = CacheManager::new(CacheConfig::default()).await?;
//! let file = Path::new("downloads/tools/app.zip");
//!
//! if cache.needs_update(file).await {
//!     // download it, then
//!     cache.record_download(file).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod manager;

pub use config::CacheConfig;
pub use manager::{absolute_key, CacheManager};
