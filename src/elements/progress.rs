//! Progress bar element.

use serde::Deserialize;

use super::anchor::Anchor;
use super::text::draw_label;
use super::{DrawContext, Render};
use crate::color::ColorRef;
use crate::coords::{Coord, Cursor};
use crate::error::ElementError;
use crate::font::DEFAULT_FONT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillDirection {
    #[default]
    Right,
    Left,
    Up,
    Down,
}

fn default_fill() -> ColorRef {
    ColorRef::new("red")
}

fn default_width() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressBar {
    pub x_start: Coord,
    pub x_end: Coord,
    pub y_start: Coord,
    pub y_end: Coord,
    /// Percent, clamped to 0..=100
    pub progress: f64,
    #[serde(default)]
    pub direction: FillDirection,
    #[serde(default = "ColorRef::white")]
    pub background: ColorRef,
    #[serde(default = "default_fill")]
    pub fill: ColorRef,
    #[serde(default = "ColorRef::black")]
    pub outline: ColorRef,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default)]
    pub show_percentage: bool,
    #[serde(default)]
    pub font_name: Option<String>,
}

/// The label text, without a trailing `.0` for whole percentages.
fn percentage_label(progress: f64) -> String {
    if progress.fract() == 0.0 {
        format!("{}%", progress as i64)
    } else {
        format!("{:.1}%", progress)
    }
}

impl Render for ProgressBar {
    const REQUIRED: &'static [&'static str] = &["x_start", "x_end", "y_start", "y_end", "progress"];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        if !self.progress.is_finite() {
            return Err(ElementError::InvalidValue(format!("progress {} is not a number", self.progress)));
        }
        let progress = self.progress.clamp(0.0, 100.0);
        let (x0, x1) = (ctx.x(&self.x_start)?, ctx.x(&self.x_end)?);
        let (y0, y1) = (ctx.y(&self.y_start)?, ctx.y(&self.y_end)?);
        let (x0, x1) = (x0.min(x1), x0.max(x1));
        let (y0, y1) = (y0.min(y1), y0.max(y1));
        let background = ctx.paint(&self.background)?;
        let fill = ctx.paint(&self.fill)?;
        let outline = ctx.paint(&self.outline)?;

        let (w, h) = (x1 - x0, y1 - y0);
        ctx.surface.fill_rect(x0, y0, x1, y1, background);

        let filled_w = (w as f64 * progress / 100.0) as i32;
        let filled_h = (h as f64 * progress / 100.0) as i32;
        match self.direction {
            FillDirection::Right => ctx.surface.fill_rect(x0, y0, x0 + filled_w, y1, fill),
            FillDirection::Left => ctx.surface.fill_rect(x1 - filled_w, y0, x1, y1, fill),
            FillDirection::Up => ctx.surface.fill_rect(x0, y1 - filled_h, x1, y1, fill),
            FillDirection::Down => ctx.surface.fill_rect(x0, y0, x1, y0 + filled_h, fill),
        }

        let bw = self.width as i32;
        if bw > 0 {
            ctx.surface.fill_rect(x0, y0, x1, y0 + bw, outline);
            ctx.surface.fill_rect(x0, y1 - bw, x1, y1, outline);
            ctx.surface.fill_rect(x0, y0, x0 + bw, y1, outline);
            ctx.surface.fill_rect(x1 - bw, y0, x1, y1, outline);
        }

        if self.show_percentage {
            let size = (h - 4).min(w - 4).min(20);
            if size > 0 {
                let face = ctx.font(Some(self.font_name.as_deref().unwrap_or(DEFAULT_FONT)), size as u32)?;
                let color = if progress > 50.0 { background } else { fill };
                draw_label(
                    ctx.surface,
                    &face,
                    &percentage_label(progress),
                    (x0 + x1) / 2,
                    (y0 + y1) / 2,
                    Anchor::CENTER,
                    color,
                );
            }
        }
        Ok(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Paint;
    use crate::display::AccentColor;
    use crate::elements::NoGlyphs;
    use crate::font::FontResolver;
    use crate::render::{RenderInputs, Surface};
    use chrono::DateTime;
    use image::Rgb;
    use serde_json::json;

    const RED: Paint = Paint::Solid(Rgb([255, 0, 0]));

    fn draw(value: serde_json::Value) -> Surface {
        let bar: ProgressBar = serde_json::from_value(value).unwrap();
        let mut surface = Surface::new(60, 20, Paint::WHITE);
        let fonts = FontResolver::default();
        let inputs = RenderInputs::default();
        let now = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let mut ctx = DrawContext::new(&mut surface, AccentColor::Red, &fonts, &NoGlyphs, &inputs, now);
        bar.render(&mut ctx, Cursor::default()).unwrap();
        surface
    }

    fn red(s: &Surface) -> usize {
        s.pixels().iter().filter(|p| **p == RED).count()
    }

    #[test]
    fn test_progress_is_clamped() {
        let over = draw(json!({"x_start": 0, "x_end": 50, "y_start": 0, "y_end": 10, "progress": 150, "width": 0}));
        let full = draw(json!({"x_start": 0, "x_end": 50, "y_start": 0, "y_end": 10, "progress": 100, "width": 0}));
        assert_eq!(red(&over), 500);
        assert_eq!(over, full);
        let under = draw(json!({"x_start": 0, "x_end": 50, "y_start": 0, "y_end": 10, "progress": -20, "width": 0}));
        assert_eq!(red(&under), 0);
    }

    #[test]
    fn test_direction_left_fills_from_end() {
        let s = draw(json!({"x_start": 0, "x_end": 50, "y_start": 0, "y_end": 10, "progress": 20,
            "direction": "left", "width": 0}));
        assert_eq!(red(&s), 100);
        assert_eq!(s.get(49, 5), Some(RED));
        assert_eq!(s.get(0, 5), Some(Paint::WHITE));
    }

    #[test]
    fn test_outline_drawn_over_fill() {
        let s = draw(json!({"x_start": 0, "x_end": 50, "y_start": 0, "y_end": 10, "progress": 100}));
        assert_eq!(s.get(0, 0), Some(Paint::BLACK));
        assert_eq!(s.get(49, 9), Some(Paint::BLACK));
        assert_eq!(s.get(10, 5), Some(RED));
    }

    #[test]
    fn test_percentage_label() {
        assert_eq!(percentage_label(40.0), "40%");
        assert_eq!(percentage_label(12.5), "12.5%");
        // Label drawn in the background color over a mostly filled bar
        let s = draw(json!({"x_start": 0, "x_end": 60, "y_start": 0, "y_end": 20, "progress": 80,
            "show_percentage": true, "width": 0}));
        let white_inside = (0..48).flat_map(|x| (0..20).map(move |y| (x, y)))
            .filter(|&(x, y)| s.get(x, y) == Some(Paint::WHITE))
            .count();
        assert!(white_inside > 0);
    }
}
