//! # Engine Configuration
//!
//! Process-level settings that outlive a single render: where fonts and
//! icon assets live and how long image downloads may take. Loaded from a
//! JSON file; every field has a default.
//!
//! ```json
//! {
//!   "fonts": { "custom_dirs": ["/config/fonts"], "config_root": "/config" },
//!   "icons": { "font": "/config/mdi/materialdesignicons-webfont.ttf",
//!              "meta": "/config/mdi/meta.json" },
//!   "media_dir": "/media",
//!   "fetch_timeout_secs": 10
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::PapertagError;

/// Font search configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Searched first, in order. Must be absolute, existing directories.
    pub custom_dirs: Vec<PathBuf>,
    /// Bundled asset directory
    pub asset_dir: PathBuf,
    /// Root of the host installation; enables `www/fonts` and `media/fonts`
    pub config_root: Option<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            custom_dirs: Vec::new(),
            asset_dir: PathBuf::from("assets/fonts"),
            config_root: None,
        }
    }
}

/// Icon font and its name index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IconFontConfig {
    /// TrueType icon font
    pub font: PathBuf,
    /// JSON list of `{ "name", "codepoint", "aliases" }` records
    pub meta: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fonts: FontConfig,
    pub icons: Option<IconFontConfig>,
    /// Base directory for image URLs that are local paths
    pub media_dir: Option<PathBuf>,
    pub fetch_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fonts: FontConfig::default(),
            icons: None,
            media_dir: None,
            fetch_timeout_secs: 10,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, PapertagError> {
        serde_json::from_str(json).map_err(|e| PapertagError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, PapertagError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
            .map_err(|e| PapertagError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}
