//! PNG file transport, used by the CLI and for previews.

use std::fs;
use std::path::{Path, PathBuf};

use super::Transport;
use crate::error::PapertagError;
use crate::render::Bitmap;

/// Writes each bitmap to a fixed path, replacing the previous one.
#[derive(Debug, Clone)]
pub struct PngFileTransport {
    path: PathBuf,
}

impl PngFileTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Transport for PngFileTransport {
    fn send(&mut self, bitmap: &Bitmap) -> Result<(), PapertagError> {
        let png = bitmap.to_png()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, png).map_err(|e| {
            PapertagError::Transport(format!("failed to write {}: {}", self.path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Palette;

    #[test]
    fn test_writes_decodable_png() {
        let dir = std::env::temp_dir().join(format!("papertag-png-{}", std::process::id()));
        let path = dir.join("nested").join("out.png");
        let bitmap = Bitmap::new(3, 2, Palette::BWR, vec![0, 1, 2, 0, 1, 2]);

        PngFileTransport::new(&path).send(&bitmap).unwrap();

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(0, 0), &bitmap.pixel(0, 0));
        fs::remove_dir_all(dir).unwrap();
    }
}
