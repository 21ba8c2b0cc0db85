// src/services/fetcher.rs

//! Rate-limited page fetcher.
//!
//! Issues single GET requests with a configured timeout, redirect cap and a
//! browser-like header set. Failures never cross this boundary: a network
//! error, timeout or rejected status yields `None`, which callers treat as
//! "no data for this page". Rate limiting itself (inter-request delays) is
//! the batch scheduler's job, not the fetcher's.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, redirect};

use crate::error::Result;
use crate::models::HttpConfig;

/// Thin wrapper around a configured [`reqwest::Client`].
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a fetcher from per-source HTTP settings.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("mk,en;q=0.7"));

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(redirect::Policy::limited(config.max_redirects))
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch one page, returning its body text or `None` on any failure.
    ///
    /// Only server-error statuses are rejected; a 3xx/4xx body may still be
    /// usable and is returned as-is. No retries are performed here.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(error) => {
                log::warn!("Fetch failed for {url}: {error}");
                return None;
            }
        };

        if !Self::acceptable(response.status()) {
            log::warn!("Rejected status {} for {url}", response.status());
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(error) => {
                log::warn!("Body read failed for {url}: {error}");
                None
            }
        }
    }

    fn acceptable(status: StatusCode) -> bool {
        !status.is_server_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptance_rejects_only_server_errors() {
        assert!(Fetcher::acceptable(StatusCode::OK));
        assert!(Fetcher::acceptable(StatusCode::MOVED_PERMANENTLY));
        assert!(Fetcher::acceptable(StatusCode::NOT_FOUND));
        assert!(!Fetcher::acceptable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!Fetcher::acceptable(StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn test_build_from_config() {
        assert!(Fetcher::new(&HttpConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_none() {
        let fetcher = Fetcher::new(&HttpConfig {
            timeout_secs: 1,
            ..HttpConfig::default()
        })
        .unwrap();
        assert!(fetcher.fetch("http://127.0.0.1:9/none").await.is_none());
    }
}
