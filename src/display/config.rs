//! # Display Configuration
//!
//! This module defines the color schemes and canvas geometry of supported
//! e-paper panels.
//!
//! ## Color Schemes
//!
//! | Scheme | Firmware id | Colors | Accent |
//! |--------|-------------|--------|--------|
//! | Mono | 0 | black, white | black |
//! | Bwr | 1 | black, white, red | red |
//! | Bwy | 2 | black, white, yellow | yellow |
//! | Bwry | 3 | black, white, red, yellow | red |
//! | Grayscale4 | 5 | black, 2 grays, white | black |
//!
//! ## Usage
//!
//! ```
//! use papertag::display::{AccentColor, ColorScheme, DisplayConfig};
//!
//! let display = DisplayConfig::new(296, 128, ColorScheme::Bwy);
//! assert_eq!(display.accent(), AccentColor::Yellow);
//! assert_eq!(display.palette().len(), 3);
//! ```

use std::fmt;
use std::str::FromStr;

use image::Rgb;
use serde::{Deserialize, Serialize};

/// One entry of a native panel palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteColor {
    pub name: &'static str,
    pub rgb: Rgb<u8>,
}

impl PaletteColor {
    const fn new(name: &'static str, r: u8, g: u8, b: u8) -> Self {
        Self {
            name,
            rgb: Rgb([r, g, b]),
        }
    }

    /// True for black, white and grays.
    pub fn is_achromatic(&self) -> bool {
        let [r, g, b] = self.rgb.0;
        r == g && g == b
    }
}

pub const BLACK: PaletteColor = PaletteColor::new("black", 0, 0, 0);
pub const WHITE: PaletteColor = PaletteColor::new("white", 255, 255, 255);
pub const RED: PaletteColor = PaletteColor::new("red", 255, 0, 0);
pub const YELLOW: PaletteColor = PaletteColor::new("yellow", 255, 255, 0);
const GRAY1: PaletteColor = PaletteColor::new("gray1", 85, 85, 85);
const GRAY2: PaletteColor = PaletteColor::new("gray2", 170, 170, 170);

/// The discrete set of colors a panel can physically show.
///
/// Index order is stable and is what [`crate::render::Bitmap`] stores per
/// pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    colors: &'static [PaletteColor],
}

impl Palette {
    pub const MONO: Self = Self {
        colors: &[BLACK, WHITE],
    };
    pub const BWR: Self = Self {
        colors: &[BLACK, WHITE, RED],
    };
    pub const BWY: Self = Self {
        colors: &[BLACK, WHITE, YELLOW],
    };
    pub const BWRY: Self = Self {
        colors: &[BLACK, WHITE, RED, YELLOW],
    };
    pub const GRAYSCALE_4: Self = Self {
        colors: &[BLACK, GRAY1, GRAY2, WHITE],
    };

    pub fn colors(&self) -> &'static [PaletteColor] {
        self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.colors.iter().any(|c| c.name == name)
    }

    /// Index of a color by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.colors.iter().position(|c| c.name == name)
    }
}

/// The secondary color a payload refers to with `accent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccentColor {
    #[default]
    Red,
    Yellow,
    /// Panels without a chromatic ink
    Black,
}

impl AccentColor {
    /// Detect the accent from a palette: yellow-only panels get yellow, any
    /// panel with red gets red, everything else black.
    pub fn detect(palette: &Palette) -> Self {
        let red = palette.contains("red");
        let yellow = palette.contains("yellow");
        if yellow && !red {
            AccentColor::Yellow
        } else if red {
            AccentColor::Red
        } else {
            AccentColor::Black
        }
    }

    pub fn rgb(self) -> Rgb<u8> {
        match self {
            AccentColor::Red => RED.rgb,
            AccentColor::Yellow => YELLOW.rgb,
            AccentColor::Black => BLACK.rgb,
        }
    }
}

/// Panel color scheme as reported by tag firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Mono,
    #[default]
    Bwr,
    Bwy,
    Bwry,
    Grayscale4,
}

impl ColorScheme {
    /// Map a firmware color id to a scheme, falling back to mono.
    pub fn from_id(id: u8) -> Self {
        match id {
            1 => ColorScheme::Bwr,
            2 => ColorScheme::Bwy,
            3 => ColorScheme::Bwry,
            5 => ColorScheme::Grayscale4,
            _ => ColorScheme::Mono,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            ColorScheme::Mono => Palette::MONO,
            ColorScheme::Bwr => Palette::BWR,
            ColorScheme::Bwy => Palette::BWY,
            ColorScheme::Bwry => Palette::BWRY,
            ColorScheme::Grayscale4 => Palette::GRAYSCALE_4,
        }
    }

    pub fn all() -> &'static [ColorScheme] {
        &[
            ColorScheme::Mono,
            ColorScheme::Bwr,
            ColorScheme::Bwy,
            ColorScheme::Bwry,
            ColorScheme::Grayscale4,
        ]
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorScheme::Mono => "mono",
            ColorScheme::Bwr => "bwr",
            ColorScheme::Bwy => "bwy",
            ColorScheme::Bwry => "bwry",
            ColorScheme::Grayscale4 => "grayscale4",
        };
        f.write_str(name)
    }
}

impl FromStr for ColorScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mono" | "bw" => Ok(ColorScheme::Mono),
            "bwr" => Ok(ColorScheme::Bwr),
            "bwy" => Ok(ColorScheme::Bwy),
            "bwry" => Ok(ColorScheme::Bwry),
            "grayscale4" | "gray4" => Ok(ColorScheme::Grayscale4),
            other => other
                .parse::<u8>()
                .map(ColorScheme::from_id)
                .map_err(|_| format!("unknown color scheme '{}'", s)),
        }
    }
}

/// # Display Configuration
///
/// Canvas geometry in the panel's native orientation plus its color scheme.
/// Supplied by the caller, never by the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Native width in pixels
    pub width: u32,
    /// Native height in pixels
    pub height: u32,
    #[serde(default)]
    pub scheme: ColorScheme,
    /// Overrides the accent detected from the palette
    #[serde(default)]
    pub accent: Option<AccentColor>,
}

impl DisplayConfig {
    /// 2.9" BWR tag, the most common hardware.
    pub const TAG_29: Self = Self {
        width: 296,
        height: 128,
        scheme: ColorScheme::Bwr,
        accent: None,
    };

    /// 1.54" BW tag.
    pub const TAG_154: Self = Self {
        width: 152,
        height: 152,
        scheme: ColorScheme::Mono,
        accent: None,
    };

    pub fn new(width: u32, height: u32, scheme: ColorScheme) -> Self {
        Self {
            width,
            height,
            scheme,
            accent: None,
        }
    }

    pub fn palette(&self) -> Palette {
        self.scheme.palette()
    }

    pub fn accent(&self) -> AccentColor {
        self.accent
            .unwrap_or_else(|| AccentColor::detect(&self.palette()))
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self::TAG_29
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accent_detection() {
        assert_eq!(AccentColor::detect(&Palette::BWR), AccentColor::Red);
        assert_eq!(AccentColor::detect(&Palette::BWY), AccentColor::Yellow);
        assert_eq!(AccentColor::detect(&Palette::BWRY), AccentColor::Red);
        assert_eq!(AccentColor::detect(&Palette::MONO), AccentColor::Black);
    }

    #[test]
    fn test_scheme_from_id() {
        assert_eq!(ColorScheme::from_id(2), ColorScheme::Bwy);
        assert_eq!(ColorScheme::from_id(42), ColorScheme::Mono);
        assert_eq!("3".parse::<ColorScheme>(), Ok(ColorScheme::Bwry));
        assert_eq!("BWR".parse::<ColorScheme>(), Ok(ColorScheme::Bwr));
        assert!("neon".parse::<ColorScheme>().is_err());
        assert!("bwgbry".parse::<ColorScheme>().is_err());
    }

    #[test]
    fn test_accent_override() {
        let mut display = DisplayConfig::new(10, 10, ColorScheme::Bwry);
        assert_eq!(display.accent(), AccentColor::Red);
        display.accent = Some(AccentColor::Yellow);
        assert_eq!(display.accent(), AccentColor::Yellow);
    }

    #[test]
    fn test_deserialize_display() {
        let display: DisplayConfig =
            serde_json::from_str(r#"{"width": 400, "height": 300, "scheme": "bwy"}"#).unwrap();
        assert_eq!(display.width, 400);
        assert_eq!(display.scheme, ColorScheme::Bwy);
    }
}
