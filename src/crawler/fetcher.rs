//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - The `Fetcher` capability consumed by crawl tasks
//! - Building HTTP clients with the configured user agent and timeouts
//! - Error classification into readable fetch failures
//!
//! Retrying is not done here; a failed fetch goes back to the orchestrator,
//! which decides whether the URL is queued again.

use crate::config::FetcherConfig;
use crate::{CrawlError, CrawlResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Source of raw page bytes
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Downloads `url` and returns the response body
    async fn fetch(&self, url: &str) -> CrawlResult<Vec<u8>>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a client built from `config`
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// Sends a GET and returns the body of a successful response as UTF-8
    ///
    /// The body is transcoded from the charset named in `Content-Type`
    /// (UTF-8 when absent); bytes that do not decode become U+FFFD.
    ///
    /// # Failure Mapping
    ///
    /// | Condition | Message |
    /// |-----------|---------|
    /// | Malformed URL | `InvalidUrl` (never retried) |
    /// | Non-2xx status | `HTTP <code>` |
    /// | Timeout | `Request timeout` |
    /// | Connect error | `Connection refused` |
    /// | Anything else | reqwest's description |
    async fn fetch(&self, url: &str) -> CrawlResult<Vec<u8>> {
        let target = Url::parse(url).map_err(|e| CrawlError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| classify_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        // Decoded with the Content-Type charset, so the body is always UTF-8
        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, &e))?;

        Ok(body.into_bytes())
    }
}

fn classify_error(url: &str, error: &reqwest::Error) -> CrawlError {
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else {
        error.to_string()
    };

    CrawlError::Fetch {
        url: url.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> FetcherConfig {
        FetcherConfig {
            user_agent: "TestCrawler/1.0".to_string(),
            timeout_secs: 5,
            connect_timeout_secs: 5,
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("user-agent", "TestCrawler/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&create_test_config()).unwrap();
        let body = fetcher
            .fetch(&format!("{}/page", server.uri()))
            .await
            .unwrap();

        assert_eq!(body, b"<html>hi</html>".to_vec());
    }

    #[tokio::test]
    async fn test_fetch_transcodes_declared_charset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latin"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                b"<p>caf\xe9</p>".to_vec(),
                "text/html; charset=iso-8859-1",
            ))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&create_test_config()).unwrap();
        let body = fetcher
            .fetch(&format!("{}/latin", server.uri()))
            .await
            .unwrap();

        assert_eq!(String::from_utf8(body).unwrap(), "<p>café</p>");
    }

    #[tokio::test]
    async fn test_fetch_http_error_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&create_test_config()).unwrap();
        let url = format!("{}/missing", server.uri());
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert_eq!(
            err,
            CrawlError::Fetch {
                url,
                message: "HTTP 404".to_string(),
            }
        );
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_unparseable_url_is_failure() {
        let fetcher = HttpFetcher::new(&create_test_config()).unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, CrawlError::InvalidUrl { .. }));
        assert!(!err.is_retryable());
    }
}
