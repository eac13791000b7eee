//! # Palette Quantization and Dithering
//!
//! This module converts the composed [`Surface`] into a [`Bitmap`] that only
//! contains colors of the panel's native palette.
//!
//! ## What is Dithering?
//!
//! E-paper panels show two to four inks. Any other color, and every
//! halftone request (`half_red`, `gray`, ...), is simulated by mixing
//! neighboring dots of the inks the panel does have:
//!
//! ```text
//! gray request:   ░░░░░░   ->   █ █ █
//!                                █ █ █
//! ```
//!
//! Quantization runs exactly once per render, on the whole (already rotated)
//! canvas, so overlapping elements dither as one image.
//!
//! ## Modes
//!
//! | Mode | Halftone requests | Continuous colors |
//! |------|-------------------|-------------------|
//! | None | base ink | nearest ink |
//! | Ordered (default) | Bayer 4x4 dot pattern | nearest ink after a Bayer offset |
//! | Floyd–Steinberg | 50% mix, error diffused | error diffused |
//! | Burkes | 50% mix, error diffused | error diffused |
//!
//! ## The Bayer Matrix
//!
//! ```text
//!     0   1   2   3   (x mod 4)
//!   ┌───┬───┬───┬───┐
//! 0 │ 0 │ 8 │ 2 │10 │
//!   ├───┼───┼───┼───┤
//! 1 │12 │ 4 │14 │ 6 │
//!   ├───┼───┼───┼───┤
//! 2 │ 3 │11 │ 1 │ 9 │
//!   ├───┼───┼───┼───┤
//! 3 │15 │ 7 │13 │ 5 │
//!   └───┴───┴───┴───┘
//! (y mod 4)
//! ```
//!
//! A halftone pixel takes its base ink where the matrix value is below 8,
//! which inks exactly half of every 4x4 cell.
//!
//! ## Error Diffusion
//!
//! Floyd–Steinberg pushes the per-channel quantization error of each pixel
//! to its unprocessed neighbors, in raster scan order:
//!
//! ```text
//!          X   7/16
//!   3/16  5/16 1/16
//! ```
//!
//! ## Color Distance
//!
//! Nearest-ink matching uses the weighted distance
//! `3·Δr² + 5.47·Δg² + 1.53·Δb²`. A gray source pixel (channels within 20
//! of each other) is never matched to a chromatic ink, which keeps neutral
//! areas from picking up a red or yellow tint.
//!
//! ## Usage Example
//!
//! ```
//! use papertag::color::Paint;
//! use papertag::display::Palette;
//! use papertag::render::{dither, Surface};
//!
//! let surface = Surface::new(8, 8, Paint::WHITE);
//! let bitmap = dither::quantize(&surface, &Palette::BWR, dither::DitherMode::Ordered);
//! assert!(bitmap.indices().iter().all(|&i| i == 1)); // all white
//! ```

use std::fmt;
use std::str::FromStr;

use image::Rgb;
use serde::{Deserialize, Deserializer, de};

use super::bitmap::Bitmap;
use super::surface::Surface;
use crate::color::Paint;
use crate::display::Palette;

/// Bayer 4x4 ordered dithering matrix, values 0-15.
pub const BAYER4: [[u8; 4]; 4] = [
    [0, 8, 2, 10],
    [12, 4, 14, 6],
    [3, 11, 1, 9],
    [15, 7, 13, 5],
];

/// Per-channel offset range applied to continuous colors in ordered mode.
const ORDERED_SPREAD: f32 = 32.0;

/// Floyd–Steinberg kernel: (dx, dy, weight), divisor 16.
const FLOYD_STEINBERG: [(i32, i32, f32); 4] = [(1, 0, 7.0), (-1, 1, 3.0), (0, 1, 5.0), (1, 1, 1.0)];

/// Burkes kernel: (dx, dy, weight), divisor 32.
const BURKES: [(i32, i32, f32); 7] = [
    (1, 0, 8.0),
    (2, 0, 4.0),
    (-2, 1, 2.0),
    (-1, 1, 4.0),
    (0, 1, 8.0),
    (1, 1, 4.0),
    (2, 1, 2.0),
];

/// Dithering mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherMode {
    /// Nearest ink, halftones rounded to their base
    None,
    /// Floyd–Steinberg error diffusion
    FloydSteinberg,
    /// Bayer 4x4 ordered dithering
    #[default]
    Ordered,
    /// Burkes error diffusion
    Burkes,
}

impl DitherMode {
    /// Map the firmware-style numeric selector (0 none, 1 error diffusion,
    /// 2 ordered).
    pub fn from_id(id: u64) -> Option<Self> {
        match id {
            0 => Some(DitherMode::None),
            1 => Some(DitherMode::FloydSteinberg),
            2 => Some(DitherMode::Ordered),
            3 => Some(DitherMode::Burkes),
            _ => None,
        }
    }
}

impl FromStr for DitherMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "off" | "0" => Ok(DitherMode::None),
            "floyd-steinberg" | "floyd_steinberg" | "fs" | "1" => Ok(DitherMode::FloydSteinberg),
            "ordered" | "bayer" | "2" => Ok(DitherMode::Ordered),
            "burkes" | "3" => Ok(DitherMode::Burkes),
            _ => Err(format!("unknown dither mode '{}'", s)),
        }
    }
}

impl fmt::Display for DitherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DitherMode::None => "none",
            DitherMode::FloydSteinberg => "floyd-steinberg",
            DitherMode::Ordered => "ordered",
            DitherMode::Burkes => "burkes",
        })
    }
}

/// Accepts `"ordered"`, `2`, or a legacy boolean (`true` = error diffusion).
impl<'de> Deserialize<'de> for DitherMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Id(u64),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => Ok(DitherMode::None),
            Raw::Flag(true) => Ok(DitherMode::FloydSteinberg),
            Raw::Id(id) => DitherMode::from_id(id)
                .ok_or_else(|| de::Error::custom(format!("unknown dither mode {}", id))),
            Raw::Name(name) => name.parse().map_err(de::Error::custom),
        }
    }
}

// ============================================================================
// COLOR MATCHING
// ============================================================================

/// Weighted perceptual distance with grayscale protection.
///
/// Returns `None` when a gray source would be matched to a chromatic ink.
pub fn perceptual_distance(source: [f32; 3], target: Rgb<u8>) -> Option<f32> {
    let [r1, g1, b1] = source;
    let [r2, g2, b2] = target.0.map(|c| c as f32);

    let source_gray = (r1 - g1).abs() < 20.0 && (b1 - g1).abs() < 20.0;
    let target_chromatic = (r2 - g2).abs() > 20.0 || (b2 - g2).abs() > 20.0;
    if source_gray && target_chromatic {
        return None;
    }

    Some(3.0 * (r1 - r2).powi(2) + 5.47 * (g1 - g2).powi(2) + 1.53 * (b1 - b2).powi(2))
}

/// Index of the palette ink closest to `source`.
pub fn nearest_color(source: [f32; 3], palette: &Palette) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, color) in palette.colors().iter().enumerate() {
        if let Some(dist) = perceptual_distance(source, color.rgb) {
            if dist < best_dist {
                best_dist = dist;
                best = i;
            }
        }
    }
    best
}

#[inline]
fn channels(rgb: Rgb<u8>) -> [f32; 3] {
    rgb.0.map(|c| c as f32)
}

// ============================================================================
// QUANTIZATION
// ============================================================================

/// Quantize a composed surface into the palette.
pub fn quantize(surface: &Surface, palette: &Palette, mode: DitherMode) -> Bitmap {
    let indices = match mode {
        DitherMode::None => quantize_nearest(surface, palette),
        DitherMode::Ordered => quantize_ordered(surface, palette),
        DitherMode::FloydSteinberg => diffuse(surface, palette, &FLOYD_STEINBERG, 16.0),
        DitherMode::Burkes => diffuse(surface, palette, &BURKES, 32.0),
    };
    Bitmap::new(surface.width(), surface.height(), *palette, indices)
}

fn quantize_nearest(surface: &Surface, palette: &Palette) -> Vec<u8> {
    surface
        .pixels()
        .iter()
        .map(|paint| {
            let rgb = match *paint {
                Paint::Solid(rgb) | Paint::Halftone(rgb) => rgb,
            };
            nearest_color(channels(rgb), palette) as u8
        })
        .collect()
}

fn quantize_ordered(surface: &Surface, palette: &Palette) -> Vec<u8> {
    let width = surface.width() as usize;
    let white = nearest_color([255.0; 3], palette) as u8;

    surface
        .pixels()
        .iter()
        .enumerate()
        .map(|(i, paint)| {
            let (x, y) = (i % width, i / width);
            let cell = BAYER4[y & 3][x & 3];
            match *paint {
                Paint::Halftone(base) => {
                    if cell < 8 {
                        nearest_color(channels(base), palette) as u8
                    } else {
                        white
                    }
                }
                Paint::Solid(rgb) => {
                    let offset = (cell as f32 / 16.0 - 0.5) * ORDERED_SPREAD;
                    let shifted = channels(rgb).map(|c| (c + offset).clamp(0.0, 255.0));
                    nearest_color(shifted, palette) as u8
                }
            }
        })
        .collect()
}

/// Error diffusion in raster scan order with the given kernel.
fn diffuse(surface: &Surface, palette: &Palette, kernel: &[(i32, i32, f32)], divisor: f32) -> Vec<u8> {
    let width = surface.width() as usize;
    let height = surface.height() as usize;
    let mut buf: Vec<[f32; 3]> = surface.pixels().iter().map(|p| channels(p.mixed())).collect();
    let mut out = vec![0u8; width * height];

    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let old = buf[i].map(|c| c.clamp(0.0, 255.0));
            let idx = nearest_color(old, palette);
            out[i] = idx as u8;

            let new = channels(palette.colors()[idx].rgb);
            let err = [old[0] - new[0], old[1] - new[1], old[2] - new[2]];

            for &(dx, dy, weight) in kernel {
                let nx = x as i32 + dx;
                let ny = y + dy as usize;
                if nx < 0 || nx >= width as i32 || ny >= height {
                    continue;
                }
                let target = &mut buf[ny * width + nx as usize];
                for c in 0..3 {
                    target[c] += err[c] * weight / divisor;
                }
            }
        }
    }
    out
}

/// Pack a row of boolean pixel values into bytes.
///
/// ## Bit Packing
///
/// - Bit 7 (MSB) = leftmost pixel
/// - Bit 0 (LSB) = rightmost pixel
///
/// If the row length is not a multiple of 8, the last byte is padded
/// with zeros on the right.
///
/// ## Example
///
/// ```
/// use papertag::render::dither::pack_row;
///
/// let row = vec![true, true, true, true, false, false, false, false];
/// assert_eq!(pack_row(&row), vec![0xF0]);
/// ```
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let mut out = vec![0u8; pixels.len().div_ceil(8)];
    for (i, &on) in pixels.iter().enumerate() {
        if on {
            out[i / 8] |= 0x80 >> (i % 8);
        }
    }
    out
}
