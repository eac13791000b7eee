//! Text and Multiline elements.
//!
//! ## Layout
//!
//! A text element becomes a block of lines. Explicit newlines always break.
//! With `max_width` the block either word-wraps (default) or, with
//! `truncate: true`, each line is clipped and ends in `...`.
//!
//! The `anchor` picks the point of the whole block that lands on (x, y);
//! `align` positions each line inside the block:
//!
//! ```text
//!   anchor "lt"            anchor "mm"             anchor "rs"
//!   (x,y)+--------+        +--------+              +--------+
//!        |Kitchen |        |Kitc(x,y)n|            |Kitchen |
//!        +--------+        +--------+              +-------(x,y)  <- baseline
//! ```

use serde::Deserialize;

use super::anchor::Anchor;
use super::markup::{self, Span};
use super::{DrawContext, Render, deserialize_text};
use crate::color::{ColorRef, Paint};
use crate::coords::{Coord, Cursor};
use crate::error::ElementError;
use crate::font::Face;
use crate::render::Surface;

const ELLIPSIS: &str = "...";

/// Horizontal alignment of lines within a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    #[serde(alias = "middle")]
    Center,
    Right,
}

fn default_size() -> Coord {
    Coord::Px(20.0)
}

fn default_spacing() -> i32 {
    5
}

fn default_y_padding() -> i32 {
    10
}

// ============================================================================
// TEXT
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Text {
    pub x: Coord,
    #[serde(default)]
    pub y: Option<Coord>,
    #[serde(deserialize_with = "deserialize_text")]
    pub value: String,
    /// Font size in pixels; percentages are of the canvas height
    #[serde(default = "default_size")]
    pub size: Coord,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default = "ColorRef::black", alias = "fill")]
    pub color: ColorRef,
    #[serde(default)]
    pub align: Align,
    #[serde(default)]
    pub anchor: Option<Anchor>,
    /// Gap between wrapped lines
    #[serde(default = "default_spacing")]
    pub spacing: i32,
    #[serde(default = "default_y_padding")]
    pub y_padding: i32,
    #[serde(default)]
    pub stroke_width: u32,
    #[serde(default = "ColorRef::white")]
    pub stroke_fill: ColorRef,
    #[serde(default)]
    pub max_width: Option<Coord>,
    #[serde(default)]
    pub truncate: bool,
    #[serde(default)]
    pub parse_colors: bool,
}

impl Text {
    pub fn new(x: i32, value: &str) -> Self {
        Self {
            x: Coord::px(x),
            y: None,
            value: value.to_string(),
            size: default_size(),
            font: None,
            color: ColorRef::black(),
            align: Align::Left,
            anchor: None,
            spacing: default_spacing(),
            y_padding: default_y_padding(),
            stroke_width: 0,
            stroke_fill: ColorRef::white(),
            max_width: None,
            truncate: false,
            parse_colors: false,
        }
    }
}

impl Render for Text {
    const REQUIRED: &'static [&'static str] = &["x", "value"];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        ctx.surface.begin_element();
        let size = ctx.y(&self.size)?.max(1) as u32;
        let x = ctx.x(&self.x)?;
        let explicit = self.y.as_ref().map(|c| ctx.y(c)).transpose()?;
        let (y, auto) = cursor.place(explicit, self.y_padding);
        let style = TextStyle {
            color: ctx.paint(&self.color)?,
            stroke: stroke(ctx, self.stroke_width, &self.stroke_fill)?,
            align: self.align,
            spacing: self.spacing,
        };
        let max_width = self.max_width.as_ref().map(|c| ctx.x(c)).transpose()?;

        let face = ctx.font(self.font.as_deref(), size)?;
        let spans = spans_of(&self.value, self.parse_colors);
        let lines = layout(&spans, &face, max_width, self.truncate);
        let anchor = self.anchor.unwrap_or(Anchor::LEFT_TOP);
        draw_block(ctx, &face, &lines, x, y, anchor, &style)?;

        Ok(if auto {
            cursor.advance(ctx.surface.ink_bottom())
        } else {
            cursor
        })
    }
}

// ============================================================================
// MULTILINE
// ============================================================================

/// Text split on a delimiter, one line every `offset_y` pixels.
#[derive(Debug, Clone, Deserialize)]
pub struct Multiline {
    pub x: Coord,
    #[serde(default, alias = "start_y")]
    pub y: Option<Coord>,
    #[serde(deserialize_with = "deserialize_text")]
    pub value: String,
    pub delimiter: String,
    pub offset_y: Coord,
    #[serde(default = "default_size")]
    pub size: Coord,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default = "ColorRef::black", alias = "fill")]
    pub color: ColorRef,
    #[serde(default)]
    pub align: Align,
    #[serde(default)]
    pub anchor: Option<Anchor>,
    #[serde(default = "default_y_padding")]
    pub y_padding: i32,
    #[serde(default)]
    pub stroke_width: u32,
    #[serde(default = "ColorRef::white")]
    pub stroke_fill: ColorRef,
    #[serde(default)]
    pub parse_colors: bool,
}

impl Render for Multiline {
    const REQUIRED: &'static [&'static str] = &["x", "value", "delimiter", "offset_y"];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        if self.delimiter.is_empty() {
            return Err(ElementError::InvalidValue(
                "multiline delimiter must not be empty".to_string(),
            ));
        }
        ctx.surface.begin_element();
        let size = ctx.y(&self.size)?.max(1) as u32;
        let x = ctx.x(&self.x)?;
        let offset_y = ctx.y(&self.offset_y)?;
        let explicit = self.y.as_ref().map(|c| ctx.y(c)).transpose()?;
        let (mut current_y, auto) = cursor.place(explicit, self.y_padding);
        let style = TextStyle {
            color: ctx.paint(&self.color)?,
            stroke: stroke(ctx, self.stroke_width, &self.stroke_fill)?,
            align: self.align,
            spacing: 0,
        };

        let face = ctx.font(self.font.as_deref(), size)?;
        let anchor = self.anchor.unwrap_or(Anchor::LEFT_MIDDLE);
        for line in self.value.split(self.delimiter.as_str()) {
            let spans = spans_of(line, self.parse_colors);
            draw_block(ctx, &face, &[spans], x, current_y, anchor, &style)?;
            current_y += offset_y;
        }

        Ok(if auto {
            cursor.advance(ctx.surface.ink_bottom())
        } else {
            cursor
        })
    }
}

// ============================================================================
// LAYOUT
// ============================================================================

pub(crate) struct TextStyle {
    pub color: Paint,
    pub stroke: Option<(u32, Paint)>,
    pub align: Align,
    pub spacing: i32,
}

fn stroke(ctx: &DrawContext<'_>, width: u32, fill: &ColorRef) -> Result<Option<(u32, Paint)>, ElementError> {
    if width == 0 {
        return Ok(None);
    }
    Ok(Some((width, ctx.paint(fill)?)))
}

fn spans_of(text: &str, parse_colors: bool) -> Vec<Span> {
    if parse_colors {
        markup::parse(text)
    } else if text.is_empty() {
        Vec::new()
    } else {
        vec![Span::plain(text)]
    }
}

/// Split spans into lines, wrapping or truncating at `max_width`.
pub(crate) fn layout(spans: &[Span], face: &Face, max_width: Option<i32>, truncate: bool) -> Vec<Vec<Span>> {
    let text = markup::visible_text(spans);
    let paragraphs = paragraph_ranges(&text);

    match max_width {
        None => paragraphs
            .into_iter()
            .map(|(s, e)| markup::slice_spans(spans, s, e))
            .collect(),
        Some(max) if truncate => paragraphs
            .into_iter()
            .map(|(s, e)| {
                if face.text_width(&text[s..e]) <= max {
                    return markup::slice_spans(spans, s, e);
                }
                let cut = truncate_at(&text, s, e, face, max);
                let mut line = markup::slice_spans(spans, s, cut);
                let color = color_at(spans, cut.max(s + 1) - 1);
                line.push(Span {
                    text: ELLIPSIS.to_string(),
                    color,
                });
                line
            })
            .collect(),
        Some(max) => paragraphs
            .into_iter()
            .flat_map(|(s, e)| wrap(&text, s, e, face, max))
            .map(|(s, e)| markup::slice_spans(spans, s, e))
            .collect(),
    }
}

fn paragraph_ranges(text: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = 0;
    for para in text.split('\n') {
        out.push((start, start + para.len()));
        start += para.len() + 1;
    }
    out
}

/// Largest char boundary `cut` in `[s, e]` with `text[s..cut] + "..."` fitting.
fn truncate_at(text: &str, s: usize, e: usize, face: &Face, max: i32) -> usize {
    let mut cut = e;
    while cut > s {
        cut = text[s..cut]
            .char_indices()
            .next_back()
            .map_or(s, |(i, _)| s + i);
        let candidate = format!("{}{}", &text[s..cut], ELLIPSIS);
        if face.text_width(&candidate) <= max {
            break;
        }
    }
    cut
}

fn color_at(spans: &[Span], pos: usize) -> Option<String> {
    let mut offset = 0;
    for span in spans {
        offset += span.text.len();
        if pos < offset {
            return span.color.clone();
        }
    }
    spans.last().and_then(|s| s.color.clone())
}

/// Greedy word wrap of `text[s..e]`. A word wider than `max` gets its own line.
fn wrap(text: &str, s: usize, e: usize, face: &Face, max: i32) -> Vec<(usize, usize)> {
    let mut lines = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    for (ws, we) in word_ranges(&text[s..e]) {
        let (ws, we) = (s + ws, s + we);
        current = match current {
            None => Some((ws, we)),
            Some((ls, _)) if face.text_width(&text[ls..we]) <= max => Some((ls, we)),
            Some(line) => {
                lines.push(line);
                Some((ws, we))
            }
        };
    }
    lines.push(current.unwrap_or((s, s)));
    lines
}

fn word_ranges(text: &str) -> Vec<(usize, usize)> {
    let mut words = Vec::new();
    let mut start = None;
    for (i, ch) in text.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                words.push((s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push((s, text.len()));
    }
    words
}

/// Draw a block of lines anchored at (x, y).
pub(crate) fn draw_block(
    ctx: &mut DrawContext<'_>,
    face: &Face,
    lines: &[Vec<Span>],
    x: i32,
    y: i32,
    anchor: Anchor,
    style: &TextStyle,
) -> Result<(), ElementError> {
    if lines.is_empty() {
        return Ok(());
    }
    // Resolve span colors before touching the surface
    let mut painted: Vec<Vec<(&str, Paint)>> = Vec::with_capacity(lines.len());
    for line in lines {
        let mut out = Vec::with_capacity(line.len());
        for span in line {
            let paint = match &span.color {
                Some(name) => ColorRef::new(name).resolve(ctx.accent)?,
                None => style.color,
            };
            out.push((span.text.as_str(), paint));
        }
        painted.push(out);
    }

    let line_h = face.line_height();
    let widths: Vec<i32> = lines
        .iter()
        .map(|l| face.text_width(&markup::visible_text(l)))
        .collect();
    let block_w = widths.iter().copied().max().unwrap_or(0);
    let n = lines.len() as i32;
    let block_h = n * line_h + (n - 1) * style.spacing;
    let (left, top) = anchor.origin(x, y, block_w, block_h, face.ascent());

    let passes: &[bool] = if style.stroke.is_some() { &[true, false] } else { &[false] };
    for &stroke_pass in passes {
        for (i, line) in painted.iter().enumerate() {
            let line_top = top + i as i32 * (line_h + style.spacing);
            let line_left = left
                + match style.align {
                    Align::Left => 0,
                    Align::Center => (block_w - widths[i]) / 2,
                    Align::Right => block_w - widths[i],
                };
            let mut prefix = String::new();
            for (text, paint) in line {
                let span_x = line_left + face.text_width(&prefix);
                let mask = face.render_line(text);
                match (stroke_pass, style.stroke) {
                    (true, Some((width, stroke_paint))) => {
                        ctx.surface.blit_mask_dilated(&mask, span_x, line_top, width, stroke_paint)
                    }
                    _ => ctx.surface.blit_mask(&mask, span_x, line_top, *paint),
                }
                prefix.push_str(text);
            }
        }
    }
    Ok(())
}

/// Draw a single unstyled line, used for labels of other elements.
pub(crate) fn draw_label(surface: &mut Surface, face: &Face, text: &str, x: i32, y: i32, anchor: Anchor, paint: Paint) {
    let width = face.text_width(text);
    let (left, top) = anchor.origin(x, y, width, face.line_height(), face.ascent());
    surface.blit_mask(&face.render_line(text), left, top, paint);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::NoGlyphs;
    use crate::font::FontResolver;
    use crate::render::RenderInputs;
    use crate::display::AccentColor;
    use chrono::DateTime;

    fn plain_lines(lines: &[Vec<Span>]) -> Vec<String> {
        lines.iter().map(|l| markup::visible_text(l)).collect()
    }

    fn with_ctx<R>(w: u32, h: u32, f: impl FnOnce(&mut DrawContext<'_>) -> R) -> (R, Surface) {
        let mut surface = Surface::new(w, h, Paint::WHITE);
        let fonts = FontResolver::default();
        let inputs = RenderInputs::default();
        let now = DateTime::parse_from_rfc3339("2024-01-01T12:00:00Z").unwrap();
        let r = {
            let mut ctx = DrawContext::new(&mut surface, AccentColor::Red, &fonts, &NoGlyphs, &inputs, now);
            f(&mut ctx)
        };
        (r, surface)
    }

    fn ink_rows(surface: &Surface) -> Vec<i32> {
        (0..surface.height() as i32)
            .filter(|&y| (0..surface.width() as i32).any(|x| surface.get(x, y) != Some(Paint::WHITE)))
            .collect()
    }

    #[test]
    fn test_wrap_breaks_between_words() {
        // Bundled 8x16 face: 8 px per character
        let face = Face::bundled(16);
        let spans = vec![Span::plain("aaa bbb ccc")];
        let lines = layout(&spans, &face, Some(7 * 8), false);
        assert_eq!(plain_lines(&lines), vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn test_wrap_keeps_long_words_and_newlines() {
        let face = Face::bundled(16);
        let spans = vec![Span::plain("extraordinary\nok")];
        let lines = layout(&spans, &face, Some(4 * 8), false);
        assert_eq!(plain_lines(&lines), vec!["extraordinary", "ok"]);
    }

    #[test]
    fn test_truncate_appends_ellipsis() {
        let face = Face::bundled(16);
        let spans = vec![Span::plain("temperature")];
        let lines = layout(&spans, &face, Some(8 * 8), true);
        assert_eq!(plain_lines(&lines), vec!["tempe..."]);
        // Fits: untouched
        let lines = layout(&spans, &face, Some(200), true);
        assert_eq!(plain_lines(&lines), vec!["temperature"]);
    }

    #[test]
    fn test_truncate_keeps_span_color() {
        let face = Face::bundled(16);
        let spans = markup::parse("ab[red]cdefgh[/red]");
        let lines = layout(&spans, &face, Some(6 * 8), true);
        assert_eq!(plain_lines(&lines), vec!["abc..."]);
        assert_eq!(lines[0].last().unwrap().color.as_deref(), Some("red"));
    }

    #[test]
    fn test_auto_y_is_cursor_plus_padding() {
        let (cursor, surface) = with_ctx(100, 100, |ctx| {
            Text::new(0, "Hg").render(ctx, Cursor::new(20)).unwrap()
        });
        let rows = ink_rows(&surface);
        // Bundled 8x16 face, anchored at its top: ink stays within the cell
        assert!(*rows.first().unwrap() >= 30);
        assert!(*rows.last().unwrap() < 30 + 16);
        assert_eq!(cursor.y, *rows.last().unwrap());
    }

    #[test]
    fn test_explicit_y_keeps_cursor() {
        let mut text = Text::new(0, "Hi");
        text.y = Some(Coord::px(40));
        let (cursor, _) = with_ctx(100, 100, |ctx| text.render(ctx, Cursor::new(7)).unwrap());
        assert_eq!(cursor, Cursor::new(7));
    }

    #[test]
    fn test_markup_colors_text() {
        let mut text = Text::new(0, "[red]A[/red]B");
        text.parse_colors = true;
        text.y = Some(Coord::px(0));
        let (_, surface) = with_ctx(40, 20, |ctx| text.render(ctx, Cursor::default()).unwrap());
        let red = Paint::Solid(image::Rgb([255, 0, 0]));
        let red_px = surface.pixels().iter().filter(|p| **p == red).count();
        let black_px = surface.pixels().iter().filter(|p| **p == Paint::BLACK).count();
        assert!(red_px > 0 && black_px > 0);
        // "A" lives in the first 8 columns
        for y in 0..16 {
            for x in 8..40 {
                assert_ne!(surface.get(x, y), Some(red));
            }
        }
    }

    #[test]
    fn test_invalid_color_fails_element() {
        let mut text = Text::new(0, "x");
        text.color = ColorRef::new("chartreuse");
        let (result, surface) = with_ctx(20, 20, |ctx| text.render(ctx, Cursor::default()));
        assert_eq!(result, Err(ElementError::InvalidColor("chartreuse".into())));
        assert!(surface.pixels().iter().all(|p| *p == Paint::WHITE));
    }

    #[test]
    fn test_multiline_steps_offset() {
        let multiline: Multiline = serde_json::from_value(serde_json::json!({
            "x": 0, "y": 10, "value": "a|b|c", "delimiter": "|", "offset_y": 20, "size": 16
        }))
        .unwrap();
        let (cursor, surface) = with_ctx(20, 80, |ctx| multiline.render(ctx, Cursor::new(3)).unwrap());
        assert_eq!(cursor, Cursor::new(3));
        let rows = ink_rows(&surface);
        // Three separate line bands, anchored at their middles 10, 30, 50
        assert!(rows.iter().any(|&y| y < 10));
        assert!(rows.iter().any(|&y| (22..38).contains(&y)));
        assert!(rows.iter().any(|&y| y >= 42));
        assert!(rows.iter().all(|&y| y < 60));
    }

    #[test]
    fn test_multiline_rejects_empty_delimiter() {
        let multiline: Multiline = serde_json::from_value(serde_json::json!({
            "x": 0, "value": "abc", "delimiter": "", "offset_y": 10
        }))
        .unwrap();
        let (result, _) = with_ctx(20, 20, |ctx| multiline.render(ctx, Cursor::default()));
        assert!(matches!(result, Err(ElementError::InvalidValue(_))));
    }

    #[test]
    fn test_oversized_font_fails_element() {
        let mut text = Text::new(0, "Hi");
        text.size = Coord::px(1_000_000);
        let (result, surface) = with_ctx(40, 20, |ctx| text.render(ctx, Cursor::default()));
        assert!(matches!(result, Err(ElementError::InvalidValue(_))));
        assert!(ink_rows(&surface).is_empty());

        // Four times the longer side is still allowed
        text.size = Coord::px(160);
        let (result, _) = with_ctx(40, 20, |ctx| text.render(ctx, Cursor::default()));
        assert!(result.is_ok());
    }
}
