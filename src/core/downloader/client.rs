use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use serde::de::DeserializeOwned;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::error::{BrowserError, BrowserResult};
use crate::core::http::RateLimiter;

const DEFAULT_CONCURRENCY: usize = 8;

/// A single file to download with optional SHA-1 for validation.
#[derive(Debug, Clone)]
pub struct DownloadEntry {
    pub url: String,
    pub dest: PathBuf,
    pub sha1: Option<String>,
}

/// Outcome of streaming a response body into a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamedFile {
    pub bytes: u64,
    pub sha1: String,
}

/// Rate-limited, SHA-1 validated downloader.
///
/// Every request goes through one shared [`RateLimiter`], so a 429 seen by
/// any request pauses the rest.
pub struct Downloader {
    client: Client,
    limiter: Arc<RateLimiter>,
    /// Maximum number of parallel downloads in [`Downloader::download_batch`].
    concurrency: usize,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            limiter: Arc::new(RateLimiter::new()),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// GET `url` and decode the body as JSON.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> BrowserResult<T> {
        let response = self.limiter.get(&self.client, url).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Like [`Downloader::fetch_json`], but rejects a body whose SHA-1 differs
    /// from `sha1_expected` before decoding it.
    pub async fn fetch_json_checked<T: DeserializeOwned>(
        &self,
        url: &str,
        sha1_expected: Option<&str>,
    ) -> BrowserResult<T> {
        let response = self.limiter.get(&self.client, url).await?;
        let bytes = response.bytes().await?;
        if let Some(expected) = sha1_expected {
            let actual = sha1_hex(&bytes);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(BrowserError::ChecksumMismatch {
                    url: url.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    // ── Streaming download ──────────────────────────────

    /// Stream the body of `url` into an already open file, chunk by chunk.
    ///
    /// `path` is only used for error reporting.
    pub async fn stream_to_file(
        &self,
        url: &str,
        file: &mut tokio::fs::File,
        path: &Path,
    ) -> BrowserResult<StreamedFile> {
        let response = self.limiter.get(&self.client, url).await?;
        let mut body = response.bytes_stream();
        let mut hasher = Sha1::new();
        let mut written = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            hasher.update(&chunk);
            file.write_all(&chunk).await.map_err(|e| BrowserError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| BrowserError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        debug!("Streamed {} bytes from {}", written, url);
        Ok(StreamedFile {
            bytes: written,
            sha1: hex::encode(hasher.finalize()),
        })
    }

    // ── Single file download ────────────────────────────

    /// Download a single file to `dest`, optionally validating SHA-1.
    ///
    /// Creates parent directories as needed. The body goes to a temporary
    /// file next to `dest` and is renamed into place once fully written, so
    /// `dest` is either absent, untouched, or complete. Nothing is written
    /// when the hash does not match.
    pub async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> BrowserResult<()> {
        let parent = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| BrowserError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;

        let response = self.limiter.get(&self.client, url).await?;
        let bytes = response.bytes().await?;

        if let Some(expected) = sha1_expected {
            verify_sha1(dest, expected, &sha1_hex(&bytes))?;
        }

        let io_err = |e| BrowserError::Io {
            path: dest.to_path_buf(),
            source: e,
        };
        let partial = tempfile::Builder::new()
            .prefix(".download-")
            .suffix(".part")
            .tempfile_in(parent)
            .map_err(io_err)?;

        // Write inside a block so the handle is dropped before the rename
        {
            let mut file = tokio::fs::File::from_std(partial.reopen().map_err(io_err)?);
            file.write_all(&bytes).await.map_err(io_err)?;
            file.flush().await.map_err(io_err)?;
        }

        partial.persist(dest).map_err(|e| io_err(e.error))?;

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(())
    }

    /// Validate an existing file's SHA-1, case-insensitively.
    pub async fn validate_sha1(path: &Path, expected: &str) -> BrowserResult<bool> {
        let bytes = tokio::fs::read(path).await.map_err(|e| BrowserError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(sha1_hex(&bytes).eq_ignore_ascii_case(expected))
    }

    // ── Batch concurrent downloads ──────────────────────

    /// Download many files concurrently using `buffer_unordered`.
    ///
    /// Returns the list of files that failed (if any).
    pub async fn download_batch(
        &self,
        entries: Vec<DownloadEntry>,
    ) -> Vec<(DownloadEntry, BrowserError)> {
        info!(
            "Starting batch download: {} files, concurrency={}",
            entries.len(),
            self.concurrency
        );

        let results: Vec<_> = stream::iter(entries)
            .map(|entry| async move {
                let result = self
                    .download_file(&entry.url, &entry.dest, entry.sha1.as_deref())
                    .await;
                (entry, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|(entry, result)| match result {
                Ok(()) => None,
                Err(e) => Some((entry, e)),
            })
            .collect()
    }
}

/// Compare a computed hex digest against the expected one, case-insensitively.
pub fn verify_sha1(path: &Path, expected: &str, actual: &str) -> BrowserResult<()> {
    if actual.eq_ignore_ascii_case(expected) {
        return Ok(());
    }
    Err(BrowserError::Sha1Mismatch {
        path: path.to_path_buf(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

/// Hex SHA-1 of `data`.
pub fn sha1_hex(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
