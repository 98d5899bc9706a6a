//! Download of verified resources.
//!
//! Bytes stream into a hidden `.part` sibling which is then hard-linked to
//! the destination. Linking fails when the destination exists, so an
//! existing file is never overwritten, even by a concurrent writer. Where
//! the filesystem has no hard links the part file is copied into a
//! destination opened with `create_new`, which gives the same guarantee.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::http_client::{content_type, media_matches, HttpClient, HttpSettings};
use crate::types::FetchError;

/// Result of a fetch that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// New file written.
    Downloaded { bytes: u64 },
    /// Destination already existed; nothing was written.
    AlreadyPresent,
}

/// Retrieves the bytes at a URL into a destination path.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<FetchOutcome, FetchError>;
}

/// Fetcher over HTTP GET with retries.
pub struct HttpFetcher {
    client: HttpClient,
    timeout_ms: u64,
    expected_media: String,
}

impl HttpFetcher {
    pub fn new(client: HttpClient, settings: &HttpSettings) -> Self {
        Self {
            client,
            timeout_ms: settings.fetch_timeout_ms,
            expected_media: settings.expected_media.clone(),
        }
    }

    async fn download(&self, url: &str, part: &Path) -> Result<u64, FetchError> {
        let mut resp = self.client.get_with_retry(url, self.timeout_ms).await?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(FetchError::Status(status));
        }
        let ct = content_type(resp.headers());
        if !media_matches(ct.as_deref(), &self.expected_media) {
            return Err(FetchError::ContentType(ct));
        }

        let mut file = tokio::fs::File::create(part).await?;
        let mut written = 0u64;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<FetchOutcome, FetchError> {
        if tokio::fs::try_exists(dest).await? {
            tracing::debug!(dest = %dest.display(), "destination exists, not fetching");
            return Ok(FetchOutcome::AlreadyPresent);
        }

        let part = part_path(dest);
        let bytes = match self.download(url, &part).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                return Err(e);
            }
        };

        let placed = match tokio::fs::hard_link(&part, dest).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => {
                tracing::debug!(dest = %dest.display(), error = %e, "hard link failed, copying");
                copy_into_place(&part, dest).await
            }
        };
        let _ = tokio::fs::remove_file(&part).await;
        if placed? {
            Ok(FetchOutcome::Downloaded { bytes })
        } else {
            Ok(FetchOutcome::AlreadyPresent)
        }
    }
}

/// Copy `part` to `dest` without ever replacing an existing `dest`.
/// Returns `false` when `dest` already exists.
async fn copy_into_place(part: &Path, dest: &Path) -> io::Result<bool> {
    let mut out = match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .await
    {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e),
    };

    let copied = async {
        let mut src = tokio::fs::File::open(part).await?;
        tokio::io::copy(&mut src, &mut out).await?;
        out.flush().await?;
        out.sync_all().await
    }
    .await;

    if let Err(e) = copied {
        drop(out);
        let _ = tokio::fs::remove_file(dest).await;
        return Err(e);
    }
    Ok(true)
}

/// `dir/.name.part` for `dir/name`.
fn part_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download");
    dest.with_file_name(format!(".{name}.part"))
}
