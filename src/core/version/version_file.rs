// ─── Version Descriptor ───
// The per-version JSON: where the client package and the asset index live.

use serde::Deserialize;

use crate::core::downloader::Downloader;
use crate::core::error::{BrowserError, BrowserResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDescriptor {
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexInfo>,
}

#[derive(Debug, Deserialize)]
pub struct VersionDownloads {
    pub client: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    pub url: String,
    /// Digest of the index document itself.
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionDescriptor {
    pub async fn fetch(downloader: &Downloader, url: &str) -> BrowserResult<Self> {
        downloader.fetch_json(url).await
    }

    /// The client package, or an error naming `version_id` if the descriptor has none.
    pub fn client_download(&self, version_id: &str) -> BrowserResult<&DownloadArtifact> {
        self.downloads
            .as_ref()
            .and_then(|d| d.client.as_ref())
            .ok_or_else(|| BrowserError::MissingClientDownload(version_id.to_string()))
    }

    pub fn asset_index(&self, version_id: &str) -> BrowserResult<&AssetIndexInfo> {
        self.asset_index
            .as_ref()
            .ok_or_else(|| BrowserError::MissingAssetIndex(version_id.to_string()))
    }
}
