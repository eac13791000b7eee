//! Debug grid: coordinate lines and labels for laying out a payload.

use serde::Deserialize;

use super::anchor::Anchor;
use super::text::draw_label;
use super::{DrawContext, Render, default_true};
use crate::color::{ColorRef, Paint};
use crate::coords::Cursor;
use crate::error::ElementError;
use crate::render::Surface;

fn default_spacing() -> u32 {
    20
}

fn default_dash() -> u32 {
    2
}

fn default_space() -> u32 {
    4
}

fn default_label_size() -> u32 {
    12
}

#[derive(Debug, Clone, Deserialize)]
pub struct DebugGrid {
    #[serde(default = "default_spacing")]
    pub spacing: u32,
    #[serde(default = "ColorRef::black")]
    pub line_color: ColorRef,
    #[serde(default = "default_true")]
    pub dashed: bool,
    #[serde(default = "default_dash")]
    pub dash_length: u32,
    #[serde(default = "default_space")]
    pub space_length: u32,
    #[serde(default = "default_true")]
    pub show_labels: bool,
    /// Defaults to twice the spacing
    #[serde(default)]
    pub label_step: Option<u32>,
    #[serde(default = "ColorRef::black")]
    pub label_color: ColorRef,
    #[serde(default = "default_label_size")]
    pub label_font_size: u32,
    #[serde(default)]
    pub font: Option<String>,
}

impl DebugGrid {
    fn grid_line(&self, surface: &mut Surface, from: (i32, i32), to: (i32, i32), paint: Paint) {
        if self.dashed {
            surface.dashed_line(from.0, from.1, to.0, to.1, 1, self.dash_length, self.space_length, paint);
        } else {
            surface.line(from.0, from.1, to.0, to.1, 1, paint);
        }
    }
}

impl Render for DebugGrid {
    const REQUIRED: &'static [&'static str] = &[];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        if self.spacing == 0 {
            return Err(ElementError::InvalidValue("debug grid spacing must be positive".to_string()));
        }
        let line = ctx.paint(&self.line_color)?;
        let label = ctx.paint(&self.label_color)?;
        let step = self.label_step.unwrap_or(self.spacing * 2).max(1);
        let face = ctx.font(self.font.as_deref(), self.label_font_size)?;
        let (w, h) = (ctx.width() as i32, ctx.height() as i32);

        for y in (0..h).step_by(self.spacing as usize) {
            self.grid_line(ctx.surface, (0, y), (w - 1, y), line);
            if self.show_labels && y as u32 % step == 0 {
                draw_label(ctx.surface, &face, &y.to_string(), 2, y + 2, Anchor::LEFT_TOP, label);
            }
        }
        for x in (0..w).step_by(self.spacing as usize) {
            self.grid_line(ctx.surface, (x, 0), (x, h - 1), line);
            if self.show_labels && x as u32 % step == 0 {
                draw_label(ctx.surface, &face, &x.to_string(), x + 2, 2, Anchor::LEFT_TOP, label);
            }
        }
        Ok(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::AccentColor;
    use crate::elements::NoGlyphs;
    use crate::font::FontResolver;
    use crate::render::RenderInputs;
    use chrono::DateTime;
    use serde_json::json;

    fn draw(value: serde_json::Value) -> Result<Surface, ElementError> {
        let grid: DebugGrid = serde_json::from_value(value).unwrap();
        let mut surface = Surface::new(60, 40, Paint::WHITE);
        let fonts = FontResolver::default();
        let inputs = RenderInputs::default();
        let now = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let mut ctx = DrawContext::new(&mut surface, AccentColor::Red, &fonts, &NoGlyphs, &inputs, now);
        grid.render(&mut ctx, Cursor::default())?;
        Ok(surface)
    }

    #[test]
    fn test_solid_grid_lines() {
        let s = draw(json!({"dashed": false, "show_labels": false})).unwrap();
        for x in 0..60 {
            assert_eq!(s.get(x, 20), Some(Paint::BLACK));
        }
        for y in 0..40 {
            assert_eq!(s.get(40, y), Some(Paint::BLACK));
        }
        assert_eq!(s.get(10, 10), Some(Paint::WHITE));
    }

    #[test]
    fn test_dashed_grid_phase() {
        let s = draw(json!({"show_labels": false})).unwrap();
        // Dash 2, space 4, starting at the left edge
        let row: Vec<bool> = (0..12).map(|x| s.get(x, 20) == Some(Paint::BLACK)).collect();
        assert_eq!(
            row,
            vec![true, true, false, false, false, false, true, true, false, false, false, false]
        );
    }

    #[test]
    fn test_zero_spacing_is_rejected() {
        assert!(matches!(draw(json!({"spacing": 0})), Err(ElementError::InvalidValue(_))));
    }
}
