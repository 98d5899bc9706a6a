//! Async HTTP client wrapping reqwest.
//!
//! HEAD and GET only. Handles redirects, per-request
//! timeouts, retry on 5xx, and backoff on 429 for downloads.

use std::time::Duration;

use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use serde::{Deserialize, Serialize};

/// Network settings shared by the prober and the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Timeout for the metadata-only HEAD probe.
    pub probe_timeout_ms: u64,
    /// Timeout for the streaming GET used when HEAD is inconclusive.
    pub fallback_timeout_ms: u64,
    /// Timeout for a full download, body included.
    pub fetch_timeout_ms: u64,
    /// Maximum redirects followed per request.
    pub max_redirects: usize,
    /// Retries for downloads on 5xx, 429 or transport errors.
    pub max_retries: u32,
    /// Substring the Content-Type must contain (case-insensitive).
    pub expected_media: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string(),
            probe_timeout_ms: 5_000,
            fallback_timeout_ms: 15_000,
            fetch_timeout_ms: 60_000,
            max_redirects: 5,
            max_retries: 2,
            expected_media: "pdf".to_string(),
        }
    }
}

/// Status line and media type of a HEAD probe; the body is never read.
#[derive(Debug, Clone)]
pub struct HeadResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
}

/// HTTP client for probing and downloading.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    max_retries: u32,
}

impl HttpClient {
    pub fn new(settings: &HttpSettings) -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
            .user_agent(settings.user_agent.as_str())
            .build()
            .unwrap_or_default();

        Self {
            client,
            max_retries: settings.max_retries,
        }
    }

    /// Metadata-only request. No retries: a miss is the common case.
    pub async fn head(&self, url: &str, timeout_ms: u64) -> Result<HeadResponse, reqwest::Error> {
        let resp = self
            .client
            .head(url)
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await?;

        Ok(HeadResponse {
            url: url.to_string(),
            status: resp.status().as_u16(),
            content_type: content_type(resp.headers()),
        })
    }

    /// Single GET returning as soon as headers arrive. The body is left
    /// unread; dropping the response abandons it.
    pub async fn get_streaming(
        &self,
        url: &str,
        timeout_ms: u64,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .get(url)
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await
    }

    /// GET with retry on 5xx and transport errors, and backoff on 429.
    pub async fn get_with_retry(
        &self,
        url: &str,
        timeout_ms: u64,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut retries = 0u32;

        loop {
            match self.get_streaming(url, timeout_ms).await {
                Ok(r) => {
                    let status = r.status().as_u16();

                    if status >= 500 && retries < self.max_retries {
                        retries += 1;
                        tracing::debug!(url, status, retries, "retrying after server error");
                        tokio::time::sleep(backoff(retries)).await;
                        continue;
                    }

                    if status == 429 && retries < self.max_retries {
                        retries += 1;
                        let retry_after = r
                            .headers()
                            .get(RETRY_AFTER)
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(2);
                        tracing::debug!(url, retry_after, "rate limited");
                        tokio::time::sleep(Duration::from_secs(retry_after.min(10))).await;
                        continue;
                    }

                    return Ok(r);
                }
                Err(e) => {
                    if retries < self.max_retries {
                        retries += 1;
                        tracing::debug!(url, error = %e, retries, "retrying after transport error");
                        tokio::time::sleep(backoff(retries)).await;
                        continue;
                    }
                    return Err(e);
                }
            }
        }
    }
}

fn backoff(retries: u32) -> Duration {
    Duration::from_millis(500 * 2u64.pow(retries.saturating_sub(1)))
}

/// Content-Type header value, if present and readable.
pub fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Whether a Content-Type denotes the expected media.
pub fn media_matches(content_type: Option<&str>, expected: &str) -> bool {
    content_type
        .map(|ct| ct.to_ascii_lowercase().contains(&expected.to_ascii_lowercase()))
        .unwrap_or(false)
}
