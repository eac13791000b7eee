//! Quantized output image.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

use super::dither::pack_row;
use crate::display::Palette;
use crate::error::PapertagError;

/// A palette-indexed raster in the panel's native size and orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    palette: Palette,
    indices: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, palette: Palette, indices: Vec<u8>) -> Self {
        debug_assert_eq!(indices.len(), width as usize * height as usize);
        Self {
            width,
            height,
            palette,
            indices,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Palette index of every pixel, row-major.
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn index(&self, x: u32, y: u32) -> u8 {
        self.indices[y as usize * self.width as usize + x as usize]
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        self.palette.colors()[self.index(x, y) as usize].rgb
    }

    /// Number of pixels using the named ink.
    pub fn count(&self, color: &str) -> usize {
        match self.palette.index_of(color) {
            Some(idx) => self.indices.iter().filter(|&&i| i as usize == idx).count(),
            None => 0,
        }
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| self.pixel(x, y))
    }

    /// Encode as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, PapertagError> {
        let mut bytes = Vec::new();
        self.to_rgb_image()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| PapertagError::Image(format!("PNG encode failed: {}", e)))?;
        Ok(bytes)
    }

    /// 1-bit plane of one palette ink, rows packed MSB-first.
    ///
    /// Tags take one plane per ink, rows padded to whole bytes.
    pub fn plane(&self, index: u8) -> Vec<u8> {
        let w = self.width as usize;
        self.indices
            .chunks(w.max(1))
            .flat_map(|row| {
                let bits: Vec<bool> = row.iter().map(|&i| i == index).collect();
                pack_row(&bits)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Bitmap {
        // 10x2, black on even columns of row 0, red at (9, 1)
        let mut indices = vec![1u8; 20];
        for x in (0..10).step_by(2) {
            indices[x] = 0;
        }
        indices[19] = 2;
        Bitmap::new(10, 2, Palette::BWR, indices)
    }

    #[test]
    fn test_pixel_lookup() {
        let bitmap = checker();
        assert_eq!(bitmap.pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(bitmap.pixel(9, 1), Rgb([255, 0, 0]));
        assert_eq!(bitmap.count("black"), 5);
        assert_eq!(bitmap.count("yellow"), 0);
    }

    #[test]
    fn test_planes_are_padded_per_row() {
        let bitmap = checker();
        let black = bitmap.plane(0);
        assert_eq!(black, vec![0b1010_1010, 0b1000_0000, 0, 0]);
        let red = bitmap.plane(2);
        assert_eq!(red, vec![0, 0, 0, 0b0100_0000]);
    }

    #[test]
    fn test_png_roundtrip_dimensions() {
        let png = checker().to_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 2));
    }
}
