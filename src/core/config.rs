// ─── Config ───
// Process-wide settings, loaded once at startup from an optional JSON file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::core::error::{BrowserError, BrowserResult};

const CONFIG_FILE: &str = "config.json";
const APP_DIR_NAME: &str = "version-browser";

pub const DEFAULT_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";
pub const DEFAULT_HASHES_BASE_URL: &str = "https://resources.download.minecraft.net";
const DEFAULT_WINDOW_SIZE: usize = 10;
const DEFAULT_OUTPUT_DIR: &str = "versions";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub manifest_url: String,
    pub hashes_base_url: String,
    pub window_size: usize,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            hashes_base_url: DEFAULT_HASHES_BASE_URL.to_string(),
            window_size: DEFAULT_WINDOW_SIZE,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl Config {
    /// Load the first config file found, or the built-in defaults if none exists.
    pub fn load() -> BrowserResult<Self> {
        match candidate_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> BrowserResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| BrowserError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&raw).map_err(|source| BrowserError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    fn validate(&self) -> BrowserResult<()> {
        if self.window_size == 0 {
            return Err(BrowserError::ConfigInvalid {
                key: "window_size",
                reason: "must be at least 1".into(),
            });
        }
        if self.manifest_url.trim().is_empty() {
            return Err(BrowserError::ConfigInvalid {
                key: "manifest_url",
                reason: "must not be empty".into(),
            });
        }
        if self.hashes_base_url.trim().is_empty() {
            return Err(BrowserError::ConfigInvalid {
                key: "hashes_base_url",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(APP_DIR_NAME).join(CONFIG_FILE));
    }
    paths
}
