//! HTTP client for wiki pages and images.

use std::time::Duration;

use arcdex_shared::{ArcdexError, HttpConfig, Result};
use reqwest::Client;
use tracing::debug;

/// User-Agent string for wiki requests.
const USER_AGENT: &str = concat!("arcdex/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Thin wrapper over `reqwest` with a politeness delay before every request.
#[derive(Debug, Clone)]
pub struct WikiClient {
    client: Client,
    rate_limit: Duration,
}

impl WikiClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ArcdexError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            rate_limit: Duration::from_millis(config.rate_limit_ms),
        })
    }

    /// Fetch a page body as text. Non-2xx responses are errors.
    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;
        response
            .text()
            .await
            .map_err(|e| ArcdexError::Network(format!("{url}: failed to read body: {e}")))
    }

    /// Fetch raw bytes (images). Non-2xx responses are errors.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ArcdexError::Network(format!("{url}: failed to read body: {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        if !self.rate_limit.is_zero() {
            tokio::time::sleep(self.rate_limit).await;
        }

        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ArcdexError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArcdexError::Network(format!("{url}: HTTP {status}")));
        }

        Ok(response)
    }
}
