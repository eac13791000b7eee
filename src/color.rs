//! # Color Resolver
//!
//! Payload colors are short case-insensitive tokens. They are parsed into a
//! closed [`ColorToken`] and then resolved against the panel's accent
//! identity into a [`Paint`], the value stored on the drawing surface.
//!
//! ## Vocabulary
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `black` `b`, `white` `w`, `red` `r`, `yellow` `y` | Base inks |
//! | `green`, `blue` | Base colors (quantized to the nearest ink) |
//! | `accent` `a` | Red or yellow, whichever the panel has |
//! | `gray` `grey` `g` | Half-intensity black |
//! | `half_<base>` / `h<letter>` | Half-intensity request, e.g. `half_red`, `hr`, `ha` |
//! | `#RGB`, `#RRGGBB` | Hex literal |
//!
//! ## Halftones
//!
//! A halftone does not resolve to a literal pixel. It resolves to
//! [`Paint::Halftone`], a request that the terminal dithering pass render
//! 50% of the base ink over white. `half_white` is treated as gray.
//!
//! ```
//! use papertag::color::{ColorToken, Paint};
//! use papertag::display::AccentColor;
//! use image::Rgb;
//!
//! let token: ColorToken = "ha".parse().unwrap();
//! assert_eq!(token.resolve(AccentColor::Yellow), Paint::Halftone(Rgb([255, 255, 0])));
//! ```

use std::str::FromStr;

use image::Rgb;
use serde::Deserialize;

use crate::display::AccentColor;
use crate::error::ElementError;

/// Base color family referenced by a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseColor {
    Black,
    White,
    Red,
    Yellow,
    Green,
    Blue,
    Accent,
}

impl BaseColor {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "black" | "b" => Some(BaseColor::Black),
            "white" | "w" => Some(BaseColor::White),
            "red" | "r" => Some(BaseColor::Red),
            "yellow" | "y" => Some(BaseColor::Yellow),
            "green" => Some(BaseColor::Green),
            "blue" => Some(BaseColor::Blue),
            "accent" | "a" => Some(BaseColor::Accent),
            _ => None,
        }
    }

    fn rgb(self, accent: AccentColor) -> Rgb<u8> {
        match self {
            BaseColor::Black => Rgb([0, 0, 0]),
            BaseColor::White => Rgb([255, 255, 255]),
            BaseColor::Red => Rgb([255, 0, 0]),
            BaseColor::Yellow => Rgb([255, 255, 0]),
            BaseColor::Green => Rgb([0, 255, 0]),
            BaseColor::Blue => Rgb([0, 0, 255]),
            BaseColor::Accent => accent.rgb(),
        }
    }
}

/// A parsed, not yet resolved color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorToken {
    Named(BaseColor),
    /// 50% of the base over white
    Half(BaseColor),
    Hex(Rgb<u8>),
}

impl ColorToken {
    pub fn parse(token: &str) -> Result<Self, ElementError> {
        let lower = token.trim().to_ascii_lowercase();
        let invalid = || ElementError::InvalidColor(token.to_string());

        if let Some(hex) = lower.strip_prefix('#') {
            return parse_hex(hex).map(ColorToken::Hex).ok_or_else(invalid);
        }
        if matches!(lower.as_str(), "gray" | "grey" | "g") {
            return Ok(ColorToken::Half(BaseColor::Black));
        }
        if let Some(base) = BaseColor::from_name(&lower) {
            return Ok(ColorToken::Named(base));
        }

        let half = lower
            .strip_prefix("half_")
            .and_then(BaseColor::from_name)
            .or_else(|| {
                // Two-letter shorthand: hb, hw, hr, hy, ha
                let rest = lower.strip_prefix('h')?;
                if rest.len() == 1 {
                    BaseColor::from_name(rest)
                } else {
                    None
                }
            });
        match half {
            Some(BaseColor::White) => Ok(ColorToken::Half(BaseColor::Black)),
            Some(base) => Ok(ColorToken::Half(base)),
            None => Err(invalid()),
        }
    }

    /// Resolve against the active panel's accent identity.
    pub fn resolve(&self, accent: AccentColor) -> Paint {
        match *self {
            ColorToken::Named(base) => Paint::Solid(base.rgb(accent)),
            ColorToken::Half(base) => Paint::Halftone(base.rgb(accent)),
            ColorToken::Hex(rgb) => Paint::Solid(rgb),
        }
    }
}

impl FromStr for ColorToken {
    type Err = ElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorToken::parse(s)
    }
}

fn parse_hex(hex: &str) -> Option<Rgb<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(Rgb(rgb))
        }
        6 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
        }
        _ => None,
    }
}

/// A resolved color as stored on the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Solid(Rgb<u8>),
    /// Dither request for 50% of the base ink
    Halftone(Rgb<u8>),
}

impl Paint {
    pub const WHITE: Paint = Paint::Solid(Rgb([255, 255, 255]));
    pub const BLACK: Paint = Paint::Solid(Rgb([0, 0, 0]));

    /// Continuous color this paint represents, halftones mixed with white.
    pub fn mixed(&self) -> Rgb<u8> {
        match *self {
            Paint::Solid(rgb) => rgb,
            Paint::Halftone(Rgb([r, g, b])) => {
                let mix = |c: u8| ((c as u16 + 255) / 2) as u8;
                Rgb([mix(r), mix(g), mix(b)])
            }
        }
    }
}

/// A color field as written in a payload.
///
/// Kept as text until an element renders, so that an unknown token fails
/// that element with [`ElementError::InvalidColor`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ColorRef(pub String);

impl ColorRef {
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }

    pub fn black() -> Self {
        Self::new("black")
    }

    pub fn white() -> Self {
        Self::new("white")
    }

    pub fn parse(&self) -> Result<ColorToken, ElementError> {
        ColorToken::parse(&self.0)
    }

    pub fn resolve(&self, accent: AccentColor) -> Result<Paint, ElementError> {
        Ok(self.parse()?.resolve(accent))
    }
}
