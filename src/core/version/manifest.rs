// ─── Version Manifest ───
// Handles fetching and parsing the top-level version manifest.

use serde::Deserialize;
use tracing::info;

use crate::core::downloader::Downloader;
use crate::core::error::BrowserResult;

/// Top-level version manifest. Order is the server's order and is kept as-is.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub versions: Vec<VersionEntry>,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    /// URL of the per-version descriptor document.
    pub url: String,
}

impl VersionManifest {
    /// Fetch the version manifest from `url`.
    pub async fn fetch(downloader: &Downloader, url: &str) -> BrowserResult<Self> {
        info!("Fetching version manifest from {}", url);

        let manifest: VersionManifest = downloader.fetch_json(url).await?;

        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// All version ids in manifest order.
    pub fn ids(&self) -> Vec<String> {
        self.versions.iter().map(|v| v.id.clone()).collect()
    }
}
