// ─── Download Pipeline ───
// Resolves a version, fetches its client package, keeps the `assets/` and
// `data/` trees, and optionally syncs the hashed resources.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::info;

use crate::core::archive::{extract_prefixed, TempArchive, EXTRACT_PREFIXES};
use crate::core::assets::{AssetManager, AssetSyncReport};
use crate::core::config::Config;
use crate::core::downloader::{verify_sha1, Downloader};
use crate::core::error::{BrowserError, BrowserResult};
use crate::core::version::{VersionDescriptor, VersionManifest};

#[derive(Debug)]
pub struct PipelineReport {
    pub version_dir: PathBuf,
    pub extracted_files: usize,
    pub assets: Option<AssetSyncReport>,
    pub elapsed: Duration,
}

pub struct Pipeline<'a> {
    config: &'a Config,
    manifest: &'a VersionManifest,
    downloader: &'a Downloader,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, manifest: &'a VersionManifest, downloader: &'a Downloader) -> Self {
        Self {
            config,
            manifest,
            downloader,
        }
    }

    /// Download and unpack version `id` into `output_dir/{id}`.
    ///
    /// An unknown id fails before anything touches the filesystem.
    pub async fn download(&self, id: &str, sync_assets: bool) -> BrowserResult<PipelineReport> {
        let entry = self
            .manifest
            .find_version(id)
            .ok_or_else(|| BrowserError::VersionNotFound(id.to_string()))?;

        let started = Instant::now();

        let version_dir = self.config.output_dir.join(id);
        tokio::fs::create_dir_all(&version_dir)
            .await
            .map_err(|source| BrowserError::Io {
                path: version_dir.clone(),
                source,
            })?;

        let descriptor = VersionDescriptor::fetch(self.downloader, &entry.url).await?;
        let client = descriptor.client_download(id)?;
        let asset_index = if sync_assets {
            Some(descriptor.asset_index(id)?)
        } else {
            None
        };

        println!("Downloading {id}...");
        let archive = TempArchive::create_in(&version_dir, id)?;
        {
            let mut writer = tokio::fs::File::from_std(archive.reopen()?);
            let streamed = self
                .downloader
                .stream_to_file(&client.url, &mut writer, archive.path())
                .await?;
            if let Some(expected) = &client.sha1 {
                verify_sha1(archive.path(), expected, &streamed.sha1)?;
            }
            info!("Downloaded client package for {} ({} bytes)", id, streamed.bytes);
        }

        println!("Extracting assets and data...");
        let reader = archive.reopen()?;
        let dest = version_dir.clone();
        let extracted_files =
            tokio::task::spawn_blocking(move || extract_prefixed(reader, &dest, &EXTRACT_PREFIXES))
                .await??;
        archive.close()?;

        let assets = match asset_index {
            Some(index) => {
                println!("Synchronizing hashed resources...");
                let report = AssetManager::sync_assets(
                    &index.url,
                    index.sha1.as_deref(),
                    &self.config.hashes_base_url,
                    &version_dir.join("assets"),
                    self.downloader,
                )
                .await?;
                Some(report)
            }
            None => None,
        };

        let elapsed = started.elapsed();
        info!("Version {} ready in {:?}", id, elapsed);

        Ok(PipelineReport {
            version_dir,
            extracted_files,
            assets,
            elapsed,
        })
    }
}
