use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::core::downloader::{DownloadEntry, Downloader};
use crate::core::error::{BrowserError, BrowserResult};

/// Synchronises hashed resources referenced by an asset index.
pub struct AssetManager;

/// Top-level asset index JSON structure.
#[derive(Debug, Deserialize)]
pub struct AssetIndex {
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Deserialize)]
pub struct AssetObject {
    pub hash: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssetSyncReport {
    pub total: usize,
    pub downloaded: usize,
    pub skipped: usize,
}

/// Location of an object in the content-addressed store: `{base}/{hash[0:2]}/{hash}`.
pub fn object_url(base_url: &str, hash: &str) -> Option<String> {
    let prefix = hash.get(..2)?;
    Some(format!("{}/{}/{}", base_url.trim_end_matches('/'), prefix, hash))
}

/// Turn a logical asset path into a relative path that cannot leave its root.
fn logical_to_relative(logical: &str) -> Option<PathBuf> {
    let mut rel = PathBuf::new();
    for component in Path::new(logical).components() {
        match component {
            Component::Normal(part) => rel.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!rel.as_os_str().is_empty()).then_some(rel)
}

impl AssetIndex {
    /// Fetch the index, rejecting it when `sha1` is given and does not match.
    pub async fn fetch(
        downloader: &Downloader,
        url: &str,
        sha1: Option<&str>,
    ) -> BrowserResult<Self> {
        downloader.fetch_json_checked(url, sha1).await
    }

    /// Build download entries for every object not already on disk.
    ///
    /// Returns the entries plus the number of objects skipped because their
    /// destination already holds content with the expected hash. A file that
    /// is truncated or otherwise differs is downloaded again. Objects with a
    /// malformed hash or an unsafe logical path are dropped with a warning.
    pub async fn download_entries(
        &self,
        base_url: &str,
        assets_dir: &Path,
    ) -> (Vec<DownloadEntry>, usize) {
        let mut entries = Vec::new();
        let mut skipped = 0;

        for (name, obj) in &self.objects {
            let Some(rel) = logical_to_relative(name) else {
                warn!("Ignoring asset with unsafe path: {}", name);
                continue;
            };
            let Some(url) = object_url(base_url, &obj.hash) else {
                warn!("Ignoring asset {} with malformed hash {:?}", name, obj.hash);
                continue;
            };

            let dest = assets_dir.join(rel);
            if dest.exists() {
                match Downloader::validate_sha1(&dest, &obj.hash).await {
                    Ok(true) => {
                        skipped += 1;
                        continue;
                    }
                    Ok(false) => debug!("Re-downloading {}: content does not match", name),
                    Err(e) => warn!("Re-downloading {}: {}", name, e),
                }
            }

            entries.push(DownloadEntry {
                url,
                dest,
                sha1: Some(obj.hash.clone()),
            });
        }

        (entries, skipped)
    }
}

impl AssetManager {
    /// Download the asset index and every hashed resource it references into
    /// `assets_dir/{logical path}`.
    ///
    /// `index_sha1`, when known, is checked against the fetched index.
    pub async fn sync_assets(
        index_url: &str,
        index_sha1: Option<&str>,
        hashes_base_url: &str,
        assets_dir: &Path,
        downloader: &Downloader,
    ) -> BrowserResult<AssetSyncReport> {
        let index = AssetIndex::fetch(downloader, index_url, index_sha1).await?;
        let (entries, skipped) = index.download_entries(hashes_base_url, assets_dir).await;
        let pending = entries.len();

        info!(
            "Downloading {} hashed resources ({} already present)",
            pending, skipped
        );

        let failures = downloader.download_batch(entries).await;
        if !failures.is_empty() {
            for (entry, err) in &failures {
                warn!("Failed {} -> {:?}: {}", entry.url, entry.dest, err);
            }
            return Err(BrowserError::AssetSyncFailed {
                failed: failures.len(),
                total: pending,
            });
        }

        Ok(AssetSyncReport {
            total: index.objects.len(),
            downloaded: pending,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::sha1_hex;
    use crate::core::http::build_http_client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn object_url_uses_two_char_prefix() {
        assert_eq!(
            object_url("https://example/", "abcdef0123").as_deref(),
            Some("https://example/ab/abcdef0123")
        );
        assert_eq!(
            object_url("https://example", "abcdef0123").as_deref(),
            Some("https://example/ab/abcdef0123")
        );
        assert!(object_url("https://example", "a").is_none());
    }

    #[test]
    fn unsafe_logical_paths_are_rejected() {
        assert_eq!(
            logical_to_relative("icons/a.png"),
            Some(PathBuf::from("icons").join("a.png"))
        );
        assert!(logical_to_relative("../escape.png").is_none());
        assert!(logical_to_relative("/etc/passwd").is_none());
        assert!(logical_to_relative("").is_none());
    }

    #[tokio::test]
    async fn existing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("icons")).unwrap();
        std::fs::write(dir.path().join("icons").join("have.png"), b"x").unwrap();

        let index: AssetIndex = serde_json::from_value(serde_json::json!({
            "objects": {
                "icons/have.png": { "hash": sha1_hex(b"x").to_uppercase(), "size": 1 },
                "icons/need.png": { "hash": "2222222222", "size": 1 }
            }
        }))
        .unwrap();

        let (entries, skipped) = index.download_entries("https://example", dir.path()).await;
        assert_eq!(skipped, 1);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "https://example/22/2222222222");
        assert_eq!(entries[0].dest, dir.path().join("icons").join("need.png"));
    }

    #[tokio::test]
    async fn files_with_wrong_content_are_queued_again() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("icons")).unwrap();
        std::fs::write(dir.path().join("icons").join("cut.png"), b"full p").unwrap();

        let hash = sha1_hex(b"full png");
        let index: AssetIndex = serde_json::from_value(serde_json::json!({
            "objects": { "icons/cut.png": { "hash": hash } }
        }))
        .unwrap();

        let (entries, skipped) = index.download_entries("https://example", dir.path()).await;
        assert_eq!(skipped, 0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].dest, dir.path().join("icons").join("cut.png"));
        assert_eq!(entries[0].sha1.as_deref(), Some(hash.as_str()));
    }

    #[tokio::test]
    async fn sync_writes_objects_under_logical_paths() {
        let server = MockServer::start().await;
        let body = b"png bytes".to_vec();
        let hash = sha1_hex(&body);

        Mock::given(method("GET"))
            .and(path("/indexes/5.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "objects": { "icons/a.png": { "hash": hash, "size": body.len() } }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/objects/{}/{}", &hash[..2], hash)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let assets_dir = dir.path().join("assets");
        let downloader = Downloader::new(build_http_client().unwrap());
        let report = AssetManager::sync_assets(
            &format!("{}/indexes/5.json", server.uri()),
            None,
            &format!("{}/objects/", server.uri()),
            &assets_dir,
            &downloader,
        )
        .await
        .unwrap();

        assert_eq!(
            report,
            AssetSyncReport {
                total: 1,
                downloaded: 1,
                skipped: 0
            }
        );
        assert_eq!(
            std::fs::read(assets_dir.join("icons").join("a.png")).unwrap(),
            body
        );
    }

    #[tokio::test]
    async fn failed_objects_fail_the_sync() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "objects": {
                    "a.ogg": { "hash": "aa00000000" },
                    "b.ogg": { "hash": "bb00000000" }
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(build_http_client().unwrap());
        let err = AssetManager::sync_assets(
            &format!("{}/index.json", server.uri()),
            None,
            &server.uri(),
            dir.path(),
            &downloader,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            BrowserError::AssetSyncFailed {
                failed: 2,
                total: 2
            }
        ));
    }

    #[tokio::test]
    async fn truncated_object_is_repaired_on_resume() {
        let server = MockServer::start().await;
        let body = b"full png".to_vec();
        let hash = sha1_hex(&body);
        let index = serde_json::json!({ "objects": { "icons/a.png": { "hash": hash } } });
        let index_bytes = serde_json::to_vec(&index).unwrap();

        Mock::given(method("GET"))
            .and(path("/index.json"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(index_bytes.clone()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/{}/{}", &hash[..2], hash)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("icons")).unwrap();
        std::fs::write(dir.path().join("icons").join("a.png"), b"full p").unwrap();

        let downloader = Downloader::new(build_http_client().unwrap());
        let report = AssetManager::sync_assets(
            &format!("{}/index.json", server.uri()),
            Some(&sha1_hex(&index_bytes)),
            &server.uri(),
            dir.path(),
            &downloader,
        )
        .await
        .unwrap();

        assert_eq!(
            report,
            AssetSyncReport {
                total: 1,
                downloaded: 1,
                skipped: 0
            }
        );
        assert_eq!(
            std::fs::read(dir.path().join("icons").join("a.png")).unwrap(),
            body
        );
    }

    #[tokio::test]
    async fn index_with_wrong_digest_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "objects": { "a.ogg": { "hash": "aa00000000" } }
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(build_http_client().unwrap());
        let err = AssetManager::sync_assets(
            &format!("{}/index.json", server.uri()),
            Some("0000000000000000000000000000000000000000"),
            &server.uri(),
            dir.path(),
            &downloader,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BrowserError::ChecksumMismatch { .. }));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
