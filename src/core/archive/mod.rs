// ─── Client Archive ───
// Scoped temporary archive and prefix-filtered zip extraction.

use std::fs::File;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::core::error::{BrowserError, BrowserResult};

/// Top-level directories kept from a client package; everything else is discarded.
pub const EXTRACT_PREFIXES: [&str; 2] = ["assets/", "data/"];

/// A downloaded package that lives only as long as this value.
///
/// The file is removed on drop, so it never outlives the download call,
/// whether that call succeeds, fails, or its future is dropped mid-way.
pub struct TempArchive {
    file: NamedTempFile,
}

impl TempArchive {
    pub fn create_in(dir: &Path, name: &str) -> BrowserResult<Self> {
        let file = tempfile::Builder::new()
            .prefix(&format!(".{name}-"))
            .suffix(".jar.part")
            .tempfile_in(dir)
            .map_err(|source| BrowserError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        debug!("Created temporary archive {:?}", file.path());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// A fresh read/write handle positioned at the start of the file.
    pub fn reopen(&self) -> BrowserResult<File> {
        self.file.reopen().map_err(|source| BrowserError::Io {
            path: self.path().to_path_buf(),
            source,
        })
    }

    /// Delete the file now, reporting failures instead of swallowing them.
    pub fn close(self) -> BrowserResult<()> {
        let path = self.path().to_path_buf();
        self.file
            .close()
            .map_err(|source| BrowserError::Io { path, source })
    }
}

/// Extract entries whose path starts with one of `prefixes` into `dest`,
/// preserving their relative paths. Returns the number of files written.
///
/// Entries whose names would escape `dest` are skipped.
pub fn extract_prefixed(archive_file: File, dest: &Path, prefixes: &[&str]) -> BrowserResult<usize> {
    let mut archive = zip::ZipArchive::new(archive_file)?;
    let mut written = 0;

    for index in 0..archive.len() {
        let mut zipped = archive.by_index(index)?;

        if !prefixes.iter().any(|p| zipped.name().starts_with(p)) {
            continue;
        }

        let Some(rel_path) = zipped.enclosed_name() else {
            warn!("Skipping unsafe archive entry {:?}", zipped.name());
            continue;
        };
        let out_path: PathBuf = dest.join(rel_path);

        if zipped.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|source| BrowserError::Io {
                path: out_path,
                source,
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| BrowserError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut out = File::create(&out_path).map_err(|source| BrowserError::Io {
            path: out_path.clone(),
            source,
        })?;
        std::io::copy(&mut zipped, &mut out).map_err(|source| BrowserError::Io {
            path: out_path,
            source,
        })?;
        written += 1;
    }

    debug!("Extracted {} files into {:?}", written, dest);
    Ok(written)
}
