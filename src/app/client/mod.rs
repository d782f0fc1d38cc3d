//! HTTP client for fetching files
//!
//! Configuration of the shared reqwest client, the [`HttpFetcher`] trait the
//! downloader is written against, and URL normalisation.

pub mod config;
pub mod github;
pub mod http;

pub use config::ClientConfig;
pub use github::{convert_github_url, resolve_download_url};
pub use http::{BodyReader, FetchClient, FetchResponse, HttpFetcher};
