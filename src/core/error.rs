use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the browser and download pipeline.
/// Every module returns `Result<T, BrowserError>`.
#[derive(Debug, Error)]
pub enum BrowserError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Rate limited on {url} without a usable reset timestamp")]
    RateLimitResetUnusable { url: String },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("SHA-1 mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Config ──────────────────────────────────────────
    #[error("Malformed config file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid config value for `{key}`: {reason}")]
    ConfigInvalid { key: &'static str, reason: String },

    // ── Manifest ────────────────────────────────────────
    #[error("Version {0} not found in versions list")]
    VersionNotFound(String),

    #[error("Version {0} does not provide a client download")]
    MissingClientDownload(String),

    #[error("Version {0} does not reference an asset index")]
    MissingAssetIndex(String),

    #[error("{failed} of {total} hashed resources failed to download")]
    AssetSyncFailed { failed: usize, total: usize },

    // ── Terminal ────────────────────────────────────────
    #[error("Terminal setup failed: {0}")]
    TerminalSetup(std::io::Error),

    #[error("Input stream closed")]
    InputClosed,

    #[error("Interrupted")]
    Interrupted,

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type BrowserResult<T> = Result<T, BrowserError>;

impl From<std::io::Error> for BrowserError {
    fn from(source: std::io::Error) -> Self {
        BrowserError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl From<tokio::task::JoinError> for BrowserError {
    fn from(err: tokio::task::JoinError) -> Self {
        BrowserError::Other(format!("background task failed: {err}"))
    }
}
