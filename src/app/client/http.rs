//! HTTP fetching seam
//!
//! The downloader talks to the network only through [`HttpFetcher`], so tests
//! can script responses without a server. [`FetchClient`] is the reqwest-backed
//! implementation used by the binary.

use std::io;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::Client;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tracing::debug;
use url::Url;

use super::config::ClientConfig;
use crate::errors::DownloadResult;

/// Response body as a byte reader
pub type BodyReader = Box<dyn AsyncRead + Send + Unpin>;

/// Status line, declared length and body of a GET response
pub struct FetchResponse {
    pub status: u16,
    /// Declared `Content-Length`, if any
    pub content_length: Option<u64>,
    pub body: BodyReader,
}

impl FetchResponse {
    pub fn new(status: u16, content_length: Option<u64>, body: BodyReader) -> Self {
        Self {
            status,
            content_length,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Issues GET requests
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Send a GET for `url` and return once headers have arrived.
    ///
    /// Non-success statuses are returned as responses, not errors.
    async fn get(&self, url: &Url) -> DownloadResult<FetchResponse>;
}

/// [`HttpFetcher`] backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
}

impl FetchClient {
    pub fn new(config: &ClientConfig) -> DownloadResult<Self> {
        Ok(Self {
            client: config.build_http_client()?,
        })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetcher for FetchClient {
    async fn get(&self, url: &Url) -> DownloadResult<FetchResponse> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let content_length = response.content_length();
        debug!(
            "GET {} -> {} ({:?} bytes declared)",
            url, status, content_length
        );

        let stream = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let body: BodyReader = Box::new(StreamReader::new(Box::pin(stream)));

        Ok(FetchResponse::new(status, content_length, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        let ok = FetchResponse::new(200, Some(3), Box::new(tokio::io::empty()));
        assert!(ok.is_success());

        let partial = FetchResponse::new(206, None, Box::new(tokio::io::empty()));
        assert!(partial.is_success());

        let missing = FetchResponse::new(404, None, Box::new(tokio::io::empty()));
        assert!(!missing.is_success());
    }

    #[test]
    fn test_fetch_client_builds_from_config() {
        assert!(FetchClient::new(&ClientConfig::default()).is_ok());
    }
}
