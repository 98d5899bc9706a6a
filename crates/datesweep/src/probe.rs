//! Existence probing.
//!
//! A probe answers one question: does this exact URL denote a binary
//! document of the expected media type? Failures of any kind mean "no".

use async_trait::async_trait;

use crate::http_client::{content_type, media_matches, HttpClient, HttpSettings};
use crate::types::ProbeFailure;

/// Cheap existence check against a single URL.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Must not fail on ordinary network errors; those return `false`.
    async fn probe(&self, url: &str) -> bool;
}

/// Prober backed by HEAD, with a streaming GET fallback for servers that
/// omit Content-Type on HEAD.
pub struct HttpProber {
    client: HttpClient,
    head_timeout_ms: u64,
    fallback_timeout_ms: u64,
    expected_media: String,
}

impl HttpProber {
    pub fn new(client: HttpClient, settings: &HttpSettings) -> Self {
        Self {
            client,
            head_timeout_ms: settings.probe_timeout_ms,
            fallback_timeout_ms: settings.fallback_timeout_ms,
            expected_media: settings.expected_media.clone(),
        }
    }

    /// Probe with the failure reason kept, for logging and tests.
    pub async fn check(&self, url: &str) -> Result<(), ProbeFailure> {
        let head = self.client.head(url, self.head_timeout_ms).await?;
        match (head.status, head.content_type) {
            (200, Some(ct)) if media_matches(Some(ct.as_str()), &self.expected_media) => {
                return Ok(())
            }
            (200, Some(ct)) => return Err(ProbeFailure::ContentType(Some(ct))),
            // 405/501: HEAD not supported.
            (200, None) | (405, _) | (501, _) => {
                tracing::trace!(url, status = head.status, "HEAD inconclusive, trying GET");
            }
            (status, _) => return Err(ProbeFailure::Status(status)),
        }

        let resp = self.client.get_streaming(url, self.fallback_timeout_ms).await?;
        let status = resp.status().as_u16();
        if status != 200 {
            return Err(ProbeFailure::Status(status));
        }
        let ct = content_type(resp.headers());
        if !media_matches(ct.as_deref(), &self.expected_media) {
            return Err(ProbeFailure::ContentType(ct));
        }
        Ok(())
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> bool {
        match self.check(url).await {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(url, %reason, "probe negative");
                false
            }
        }
    }
}
