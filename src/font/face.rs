//! Font faces and 1-bit text rasterization.
//!
//! Two kinds of faces exist:
//!
//! - [`Face::Outline`]: a TrueType/OpenType font loaded with ab_glyph.
//! - [`Face::Bitmap`]: the bundled Spleen bitmap fonts, integer-scaled.
//!
//! Text is rasterized without anti-aliasing: a pixel is inked when the glyph
//! covers at least half of it. Gray fringes would only turn into dither
//! noise on a panel with two or three inks.

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use spleen_font::{FONT_6X12, FONT_8X16, FONT_12X24, PSF2Font};

use crate::render::Mask;

/// Coverage at or above which a pixel counts as ink.
const INK_COVERAGE: f32 = 0.5;

/// A font at a fixed pixel size.
#[derive(Clone)]
pub enum Face {
    Outline { font: FontArc, scale: PxScale },
    Bitmap(BitmapFace),
}

impl std::fmt::Debug for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Face::Outline { scale, .. } => f.debug_struct("Outline").field("scale", &scale.y).finish(),
            Face::Bitmap(b) => b.fmt(f),
        }
    }
}

impl Face {
    /// Outline face at a point size (pixels per em).
    pub fn outline(font: FontArc, size: u32) -> Self {
        let scale = font
            .pt_to_px_scale(size as f32)
            .unwrap_or_else(|| PxScale::from(size as f32));
        Face::Outline { font, scale }
    }

    /// Bundled bitmap face closest to `size` pixels.
    pub fn bundled(size: u32) -> Self {
        Face::Bitmap(BitmapFace::for_size(size))
    }

    pub fn is_bundled(&self) -> bool {
        matches!(self, Face::Bitmap(_))
    }

    /// Pixels from the ascender line to the baseline.
    pub fn ascent(&self) -> i32 {
        match self {
            Face::Outline { font, scale } => font.as_scaled(*scale).ascent().round() as i32,
            Face::Bitmap(b) => ((b.cell_h - b.descent) * b.scale) as i32,
        }
    }

    /// Pixels from the baseline down to the descender line.
    pub fn descent(&self) -> i32 {
        match self {
            Face::Outline { font, scale } => (-font.as_scaled(*scale).descent()).round() as i32,
            Face::Bitmap(b) => (b.descent * b.scale) as i32,
        }
    }

    pub fn line_height(&self) -> i32 {
        self.ascent() + self.descent()
    }

    /// Advance width of a single line of text.
    pub fn text_width(&self, text: &str) -> i32 {
        match self {
            Face::Outline { font, scale } => {
                let scaled = font.as_scaled(*scale);
                let mut caret = 0.0f32;
                let mut prev: Option<GlyphId> = None;
                for ch in text.chars() {
                    let id = font.glyph_id(ch);
                    if let Some(p) = prev {
                        caret += scaled.kern(p, id);
                    }
                    caret += scaled.h_advance(id);
                    prev = Some(id);
                }
                caret.round() as i32
            }
            Face::Bitmap(b) => saturate(text.chars().count() as u64 * b.advance()),
        }
    }

    /// Rasterize one line of text.
    ///
    /// The mask origin is the start of the pen on the ascender line, so the
    /// baseline sits at `y = ascent()`.
    pub fn render_line(&self, text: &str) -> Mask {
        match self {
            Face::Outline { font, scale } => render_outline(font, *scale, text),
            Face::Bitmap(b) => b.render(text),
        }
    }
}

fn render_outline(font: &FontArc, scale: PxScale, text: &str) -> Mask {
    let scaled = font.as_scaled(scale);
    let ascent = scaled.ascent();

    let mut outlined = Vec::new();
    let mut caret = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(p) = prev {
            caret += scaled.kern(p, id);
        }
        let glyph = id.with_scale_and_position(scale, point(caret, ascent));
        if let Some(og) = font.outline_glyph(glyph) {
            outlined.push(og);
        }
        caret += scaled.h_advance(id);
        prev = Some(id);
    }

    if outlined.is_empty() {
        return Mask::new(0, 0, 0, 0);
    }

    let min_x = outlined.iter().map(|g| g.px_bounds().min.x.floor() as i32).min().unwrap_or(0);
    let min_y = outlined.iter().map(|g| g.px_bounds().min.y.floor() as i32).min().unwrap_or(0);
    let max_x = outlined.iter().map(|g| g.px_bounds().max.x.ceil() as i32).max().unwrap_or(0);
    let max_y = outlined.iter().map(|g| g.px_bounds().max.y.ceil() as i32).max().unwrap_or(0);

    let mut mask = Mask::new(
        (max_x - min_x).max(0) as u32,
        (max_y - min_y).max(0) as u32,
        min_x,
        min_y,
    );
    for og in &outlined {
        let bounds = og.px_bounds();
        let (bx, by) = (bounds.min.x as i32, bounds.min.y as i32);
        og.draw(|px, py, coverage| {
            if coverage >= INK_COVERAGE {
                mask.set(bx + px as i32, by + py as i32);
            }
        });
    }
    mask
}

fn saturate(pixels: u64) -> i32 {
    i32::try_from(pixels).unwrap_or(i32::MAX)
}

// ============================================================================
// BUNDLED BITMAP FACE
// ============================================================================

/// One of the compiled-in Spleen fonts at an integer scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapFace {
    data: &'static [u8],
    pub cell_w: u32,
    pub cell_h: u32,
    /// Rows of the cell below the baseline
    descent: u32,
    pub scale: u32,
}

/// (data, cell width, cell height, rows below baseline)
const SPLEEN: [(&[u8], u32, u32, u32); 3] = [
    (FONT_6X12, 6, 12, 2),
    (FONT_8X16, 8, 16, 3),
    (FONT_12X24, 12, 24, 5),
];

impl BitmapFace {
    /// Pick the cell size and scale whose height comes closest to `size`
    /// without exceeding it. Sizes below 12 use the 6x12 cell.
    pub fn for_size(size: u32) -> Self {
        let mut best = (SPLEEN[0], 1u32);
        let mut best_h = 0u32;
        for font in SPLEEN {
            let scale = size / font.2;
            if scale == 0 {
                continue;
            }
            let h = font.2 * scale;
            if h > best_h {
                best = (font, scale);
                best_h = h;
            }
        }
        let ((data, cell_w, cell_h, descent), scale) = best;
        Self {
            data,
            cell_w,
            cell_h,
            descent,
            scale,
        }
    }

    /// Horizontal pen advance per character.
    fn advance(&self) -> u64 {
        u64::from(self.cell_w) * u64::from(self.scale)
    }

    fn render(&self, text: &str) -> Mask {
        let count = text.chars().count() as u64;
        let s = self.scale as i32;
        let width = u32::try_from(count * self.advance()).unwrap_or(u32::MAX);
        let mut mask = Mask::new(width, self.cell_h.saturating_mul(self.scale), 0, 0);
        let Ok(mut font) = PSF2Font::new(self.data) else {
            return mask;
        };

        let mut pen_x = 0i32;
        for ch in text.chars() {
            let utf8 = ch.to_string();
            if let Some(glyph) = font.glyph_for_utf8(utf8.as_bytes()) {
                for (row_y, row) in glyph.enumerate() {
                    for (col_x, on) in row.enumerate() {
                        if !on {
                            continue;
                        }
                        let (x0, y0) = (pen_x + col_x as i32 * s, row_y as i32 * s);
                        for dy in 0..s {
                            for dx in 0..s {
                                mask.set(x0 + dx, y0 + dy);
                            }
                        }
                    }
                }
            }
            pen_x = pen_x.saturating_add(saturate(self.advance()));
        }
        mask
    }
}
