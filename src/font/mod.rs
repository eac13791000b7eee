//! # Font Resolver
//!
//! Locates fonts by name across a prioritized search path and caches the
//! loaded faces by (name, size).
//!
//! ## Search Order
//!
//! 1. The name itself, if it is an absolute path
//! 2. Custom directories, in configured order
//! 3. The bundled asset directory
//! 4. Web and media directories (`<root>/www/fonts`, `<root>/media/fonts`, `/media/fonts`)
//!
//! A name without extension also matches `<name>.ttf` and `<name>.otf`.
//!
//! ## Fallback
//!
//! When no candidate loads, the bundled Spleen bitmap face is used and the
//! resolution carries a warning. Asking for [`DEFAULT_FONT`] and not finding
//! it is not worth a warning: the bundled face *is* the default.
//!
//! ## Concurrency
//!
//! The resolver is shared by parallel renders. Lookups take a read lock.
//! On a miss the font is loaded outside any lock and inserted with
//! `entry().or_insert`, so concurrent first uses of the same key all end up
//! with the face that was inserted first.

mod face;

pub use face::{BitmapFace, Face};

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use ab_glyph::FontArc;
use tracing::{debug, warn};

use crate::config::FontConfig;

/// Font used when an element does not name one.
pub const DEFAULT_FONT: &str = "ppb.ttf";

/// Result of a font lookup.
#[derive(Debug, Clone)]
pub struct FontResolution {
    pub face: Arc<Face>,
    /// Set when the requested font was not found
    pub warning: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedFace {
    face: Arc<Face>,
    fallback: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct SearchPath {
    custom: Vec<PathBuf>,
    assets: PathBuf,
    platform: Vec<PathBuf>,
}

impl SearchPath {
    fn dirs(&self) -> Vec<PathBuf> {
        self.custom
            .iter()
            .chain(std::iter::once(&self.assets))
            .chain(self.platform.iter())
            .cloned()
            .collect()
    }
}

pub struct FontResolver {
    search: RwLock<SearchPath>,
    cache: RwLock<HashMap<(String, u32), CachedFace>>,
}

impl FontResolver {
    pub fn new(config: &FontConfig) -> Self {
        let mut platform = Vec::new();
        if let Some(root) = &config.config_root {
            platform.push(root.join("www/fonts"));
            platform.push(root.join("media/fonts"));
        }
        platform.push(PathBuf::from("/media/fonts"));

        Self {
            search: RwLock::new(SearchPath {
                custom: validate_dirs(&config.custom_dirs),
                assets: config.asset_dir.clone(),
                platform,
            }),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve `name` at `size` pixels, falling back to the bundled face.
    pub fn resolve(&self, name: &str, size: u32) -> FontResolution {
        let size = size.max(1);
        let key = (name.to_string(), size);

        let hit = self
            .cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .cloned();
        let cached = match hit {
            Some(cached) => cached,
            None => {
                let loaded = self.load(name, size);
                self.cache
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .entry(key)
                    .or_insert(loaded)
                    .clone()
            }
        };

        let warning = (cached.fallback && name != DEFAULT_FONT)
            .then(|| format!("font '{}' not found, using bundled font", name));
        FontResolution {
            face: cached.face,
            warning,
        }
    }

    fn load(&self, name: &str, size: u32) -> CachedFace {
        let dirs = self.search_dirs();
        for path in candidates(name, &dirs) {
            if !path.is_file() {
                continue;
            }
            match fs::read(&path).map(FontArc::try_from_vec) {
                Ok(Ok(font)) => {
                    debug!(font = name, path = %path.display(), size, "Loaded font");
                    return CachedFace {
                        face: Arc::new(Face::outline(font, size)),
                        fallback: false,
                    };
                }
                Ok(Err(e)) => warn!(path = %path.display(), error = %e, "Unreadable font file"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to read font file"),
            }
        }

        if name == DEFAULT_FONT {
            debug!(font = name, "Default font not installed, using bundled font");
        } else {
            warn!(font = name, searched = ?dirs, "Font not found, using bundled font");
        }
        CachedFace {
            face: Arc::new(Face::bundled(size)),
            fallback: true,
        }
    }

    /// Replace the custom directories. Clears the cache if they changed.
    pub fn set_custom_dirs(&self, dirs: &[PathBuf]) {
        let custom = validate_dirs(dirs);
        let mut search = self.search.write().unwrap_or_else(|e| e.into_inner());
        if search.custom != custom {
            search.custom = custom;
            self.clear_cache();
        }
    }

    pub fn clear_cache(&self) {
        self.cache.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Number of cached (name, size) entries.
    pub fn cached_faces(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// All directories searched, in priority order.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        self.search.read().unwrap_or_else(|e| e.into_inner()).dirs()
    }

    /// File names of `.ttf`/`.otf` fonts across the search path, sorted.
    pub fn available_fonts(&self) -> Vec<String> {
        let mut fonts = BTreeSet::new();
        for dir in self.search_dirs() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() && is_font_file(&path) {
                    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                        fonts.insert(name.to_string());
                    }
                }
            }
        }
        fonts.into_iter().collect()
    }
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::new(&FontConfig::default())
    }
}

/// Split a semicolon-separated directory list.
pub fn parse_dir_list(list: &str) -> Vec<PathBuf> {
    list.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn validate_dirs(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut valid = Vec::new();
    for dir in dirs {
        if !dir.is_absolute() {
            warn!(dir = %dir.display(), "Font directory must be an absolute path, skipping");
        } else if !dir.is_dir() {
            warn!(dir = %dir.display(), "Font directory does not exist, skipping");
        } else if !valid.contains(dir) {
            valid.push(dir.clone());
        }
    }
    valid
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
}

fn candidates(name: &str, dirs: &[PathBuf]) -> Vec<PathBuf> {
    let path = Path::new(name);
    if path.is_absolute() {
        return vec![path.to_path_buf()];
    }
    let mut names = vec![name.to_string()];
    if path.extension().is_none() {
        names.push(format!("{}.ttf", name));
        names.push(format!("{}.otf", name));
    }
    dirs.iter()
        .flat_map(|dir| names.iter().map(move |n| dir.join(n)))
        .collect()
}
