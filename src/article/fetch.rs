use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::error::AppError;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Plain HTTP GET against the content site. No retries and no rate-limit handling.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    #[tracing::instrument(skip(self), fields(url = %url))]
    pub async fn fetch_html(&self, url: &Url) -> Result<String, AppError> {
        let response = self.get(url).await?;
        let html = response
            .text()
            .await
            .map_err(|e| AppError::UpstreamFetch(format!("failed to read body of {}: {}", url, e)))?;
        tracing::debug!("Fetched {} bytes of HTML", html.len());
        Ok(html)
    }

    pub async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, AppError> {
        let response = self.get(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::UpstreamFetch(format!("failed to read body of {}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }

    async fn get(&self, url: &Url) -> Result<reqwest::Response, AppError> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::UpstreamFetch(format!("timed out fetching {}", url))
            } else {
                AppError::UpstreamFetch(format!("failed to fetch {}: {}", url, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamFetch(format!("{} returned status {}", url, status)));
        }
        Ok(response)
    }
}
