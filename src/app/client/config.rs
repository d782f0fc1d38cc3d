//! HTTP client configuration and building logic

use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Client, Proxy};
use serde::{Deserialize, Serialize};

use crate::constants::http;
use crate::errors::{DownloadError, DownloadResult};

/// Settings for the shared HTTP client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Connection pool idle timeout
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,
    /// TCP keep-alive interval (None = disabled)
    #[serde(with = "humantime_serde")]
    pub tcp_keepalive: Option<Duration>,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Proxy for all requests, e.g. `socks5://127.0.0.1:1080`.
    /// None leaves reqwest's environment proxy detection in place.
    pub proxy: Option<String>,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: http::CONNECT_TIMEOUT,
            idle_timeout: http::IDLE_TIMEOUT,
            tcp_keepalive: Some(http::TCP_KEEPALIVE),
            tcp_nodelay: true,
            proxy: None,
            user_agent: http::USER_AGENT.to_string(),
            max_redirects: http::MAX_REDIRECTS,
        }
    }
}

impl ClientConfig {
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Builds the HTTP client with the specified configuration.
    ///
    /// No overall request timeout is set: a large file may legitimately take
    /// hours, and slow transfers are handled by the low-speed watchdog.
    pub fn build_http_client(&self) -> DownloadResult<Client> {
        let mut client_builder = Client::builder()
            .connect_timeout(self.connect_timeout)
            .pool_idle_timeout(self.idle_timeout)
            .user_agent(self.user_agent.as_str())
            .tcp_nodelay(self.tcp_nodelay)
            .redirect(Policy::limited(self.max_redirects));

        if let Some(keepalive) = self.tcp_keepalive {
            client_builder = client_builder.tcp_keepalive(keepalive);
        }

        if let Some(proxy_url) = &self.proxy {
            let proxy = Proxy::all(proxy_url.as_str()).map_err(|e| DownloadError::InvalidUrl {
                url: proxy_url.clone(),
                error: e.to_string(),
            })?;
            client_builder = client_builder.proxy(proxy);
        }

        client_builder.build().map_err(DownloadError::Http)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
        assert!(config.tcp_nodelay);
        assert!(config.proxy.is_none());
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_http_client_creation() {
        let config = ClientConfig::default();
        assert!(config.build_http_client().is_ok());
    }

    #[test]
    fn test_http_client_with_socks_proxy() {
        let config = ClientConfig::default()
            .with_proxy("socks5://127.0.0.1:1080")
            .with_connect_timeout(Duration::from_secs(5));
        assert!(config.build_http_client().is_ok());
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let config = ClientConfig::default().with_proxy("not a proxy url");
        let err = config.build_http_client().unwrap_err();
        assert!(matches!(err, DownloadError::InvalidUrl { .. }));
    }
}
