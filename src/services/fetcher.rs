// src/services/fetcher.rs

//! Career page retrieval.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Retrieves the markup of a page.
///
/// Implementations make exactly one attempt; retrying is never their call.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its body, or a [`AppError::Fetch`] carrying the
    /// URL and the status or transport cause.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// `reqwest`-backed fetcher with a per-request timeout.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a configured fetcher.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch_transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch_status(url, status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::fetch_transport(url, e))
    }
}
