//! Icon and IconSequence elements, and the glyph catalogs behind them.
//!
//! Icons are looked up by name in a [`GlyphCatalog`]. The engine ships
//! three catalogs:
//!
//! | Catalog | Source |
//! |---------|--------|
//! | [`NoGlyphs`] | nothing; every lookup misses |
//! | [`StaticCatalog`] | in-memory grayscale images, scaled per request |
//! | [`MdiCatalog`] | an icon font plus a JSON name index (Material Design Icons) |
//!
//! Names may carry a `namespace:` prefix (`mdi:thermometer`), which is
//! stripped before the lookup.

use std::collections::HashMap;
use std::fs;

use ab_glyph::{FontArc, PxScale};
use image::GrayImage;
use image::imageops::{self, FilterType};
use serde::Deserialize;
use tracing::debug;

use super::anchor::Anchor;
use super::{DrawContext, Render};
use crate::color::{ColorRef, Paint};
use crate::config::IconFontConfig;
use crate::coords::{Coord, Cursor};
use crate::error::{ElementError, PapertagError, WarningKind};
use crate::font::Face;
use crate::render::Mask;

// ============================================================================
// CATALOGS
// ============================================================================

/// Source of icon glyphs.
///
/// The returned mask has its origin at the top-left corner of a
/// `size` x `size` em box.
pub trait GlyphCatalog: Send + Sync {
    fn glyph(&self, name: &str, size: u32) -> Option<Mask>;
}

/// Strip a `namespace:` prefix from an icon name.
pub fn icon_name(value: &str) -> &str {
    value.split_once(':').map_or(value, |(_, name)| name)
}

/// Catalog without any glyphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGlyphs;

impl GlyphCatalog for NoGlyphs {
    fn glyph(&self, _name: &str, _size: u32) -> Option<Mask> {
        None
    }
}

/// Glyphs from in-memory images. Dark pixels are ink.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    images: HashMap<String, GrayImage>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, image: GrayImage) {
        self.images.insert(name.to_string(), image);
    }

    pub fn with(mut self, name: &str, image: GrayImage) -> Self {
        self.insert(name, image);
        self
    }
}

impl GlyphCatalog for StaticCatalog {
    fn glyph(&self, name: &str, size: u32) -> Option<Mask> {
        let image = self.images.get(name)?;
        if size == 0 {
            return None;
        }
        if image.dimensions() == (size, size) {
            return Some(Mask::from_luma(image));
        }
        let scaled = imageops::resize(image, size, size, FilterType::Nearest);
        Some(Mask::from_luma(&scaled))
    }
}

#[derive(Debug, Deserialize)]
struct IconMeta {
    name: String,
    codepoint: String,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Material Design Icons: a TrueType icon font indexed by a meta file.
pub struct MdiCatalog {
    font: FontArc,
    codepoints: HashMap<String, char>,
}

impl MdiCatalog {
    pub fn load(config: &IconFontConfig) -> Result<Self, PapertagError> {
        let data = fs::read(&config.font)?;
        let font = FontArc::try_from_vec(data)
            .map_err(|e| PapertagError::Font(format!("{}: {}", config.font.display(), e)))?;
        let meta = fs::read_to_string(&config.meta)?;
        Self::from_parts(font, &meta)
    }

    /// Build from a loaded font and the JSON meta index.
    ///
    /// Primary names win over aliases when both claim the same string.
    pub fn from_parts(font: FontArc, meta_json: &str) -> Result<Self, PapertagError> {
        let records: Vec<IconMeta> = serde_json::from_str(meta_json)
            .map_err(|e| PapertagError::Config(format!("icon meta: {}", e)))?;

        let mut codepoints = HashMap::new();
        let mut aliases = Vec::new();
        for record in &records {
            let Some(ch) = u32::from_str_radix(record.codepoint.trim(), 16)
                .ok()
                .and_then(char::from_u32)
            else {
                debug!(icon = %record.name, codepoint = %record.codepoint, "Skipping icon with bad codepoint");
                continue;
            };
            codepoints.insert(record.name.clone(), ch);
            aliases.extend(record.aliases.iter().map(|a| (a.clone(), ch)));
        }
        for (alias, ch) in aliases {
            codepoints.entry(alias).or_insert(ch);
        }
        debug!(icons = codepoints.len(), "Loaded icon index");
        Ok(Self { font, codepoints })
    }

    pub fn len(&self) -> usize {
        self.codepoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codepoints.is_empty()
    }
}

impl GlyphCatalog for MdiCatalog {
    fn glyph(&self, name: &str, size: u32) -> Option<Mask> {
        let ch = *self.codepoints.get(name)?;
        let face = Face::Outline {
            font: self.font.clone(),
            scale: PxScale::from(size as f32),
        };
        let mask = face.render_line(&ch.to_string());
        (!mask.is_blank()).then_some(mask)
    }
}

// ============================================================================
// ELEMENTS
// ============================================================================

fn default_anchor() -> Anchor {
    Anchor::LEFT_TOP
}

/// Draw a glyph with optional outline, anchored by its em box.
#[allow(clippy::too_many_arguments)]
fn draw_glyph(ctx: &mut DrawContext<'_>, mask: &Mask, x: i32, y: i32, size: i32, anchor: Anchor, fill: Paint, stroke: Option<(u32, Paint)>) {
    let (left, top) = anchor.origin(x, y, size, size, size);
    if let Some((width, paint)) = stroke {
        ctx.surface.blit_mask_dilated(mask, left, top, width, paint);
    }
    ctx.surface.blit_mask(mask, left, top, fill);
}

fn stroke(ctx: &DrawContext<'_>, width: u32, fill: &ColorRef) -> Result<Option<(u32, Paint)>, ElementError> {
    if width == 0 {
        return Ok(None);
    }
    Ok(Some((width, ctx.paint(fill)?)))
}

#[derive(Debug, Clone, Deserialize)]
pub struct Icon {
    pub x: Coord,
    pub y: Coord,
    pub value: String,
    pub size: Coord,
    #[serde(default = "ColorRef::black", alias = "fill")]
    pub color: ColorRef,
    #[serde(default = "default_anchor")]
    pub anchor: Anchor,
    #[serde(default)]
    pub stroke_width: u32,
    #[serde(default = "ColorRef::white")]
    pub stroke_fill: ColorRef,
}

impl Render for Icon {
    const REQUIRED: &'static [&'static str] = &["x", "y", "value", "size"];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        let (x, y) = (ctx.x(&self.x)?, ctx.y(&self.y)?);
        let size = ctx.check_size(ctx.y(&self.size)?.max(1) as u32)? as i32;
        let fill = ctx.paint(&self.color)?;
        let stroke = stroke(ctx, self.stroke_width, &self.stroke_fill)?;

        let name = icon_name(&self.value);
        let mask = ctx
            .glyphs
            .glyph(name, size as u32)
            .ok_or_else(|| ElementError::AssetLookupFailure(format!("icon '{}'", self.value)))?;
        draw_glyph(ctx, &mask, x, y, size, self.anchor, fill, stroke);
        Ok(cursor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Right,
    Left,
    Down,
    Up,
}

/// A row or column of icons with fixed spacing.
#[derive(Debug, Clone, Deserialize)]
pub struct IconSequence {
    pub x: Coord,
    pub y: Coord,
    pub icons: Vec<String>,
    pub size: Coord,
    #[serde(default)]
    pub direction: Direction,
    /// Defaults to a quarter of the icon size
    #[serde(default)]
    pub spacing: Option<Coord>,
    #[serde(default = "ColorRef::black", alias = "fill")]
    pub color: ColorRef,
    #[serde(default = "default_anchor")]
    pub anchor: Anchor,
    #[serde(default)]
    pub stroke_width: u32,
    #[serde(default = "ColorRef::white")]
    pub stroke_fill: ColorRef,
}

impl Render for IconSequence {
    const REQUIRED: &'static [&'static str] = &["x", "y", "icons", "size"];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        let (mut x, mut y) = (ctx.x(&self.x)?, ctx.y(&self.y)?);
        let size = ctx.check_size(ctx.y(&self.size)?.max(1) as u32)? as i32;
        let spacing = match &self.spacing {
            Some(c) => ctx.x(c)?,
            None => size / 4,
        };
        let fill = ctx.paint(&self.color)?;
        let stroke = stroke(ctx, self.stroke_width, &self.stroke_fill)?;
        let step = size.saturating_add(spacing);

        for value in &self.icons {
            let Some(mask) = ctx.glyphs.glyph(icon_name(value), size as u32) else {
                ctx.note(WarningKind::AssetMissing, format!("icon '{}' not found", value));
                continue;
            };
            draw_glyph(ctx, &mask, x, y, size, self.anchor, fill, stroke);
            match self.direction {
                Direction::Right => x = x.saturating_add(step),
                Direction::Left => x = x.saturating_sub(step),
                Direction::Down => y = y.saturating_add(step),
                Direction::Up => y = y.saturating_sub(step),
            }
        }
        Ok(cursor)
    }
}
