//! Bar chart element.
//!
//! ```text
//!  x   x+margin                      x+width
//!  |   |                               |       <- top (y or cursor)
//!  |   |        ___                    |
//!  |   |  ___  |   |  ___              |
//!  |   | |   | |   | |   |             |
//!  |   +-+---+-+---+-+---+-------------+       <- top + height - margin
//!  |      Mon   Tue   Wed                      <- legends, centered in the margin
//! ```
//!
//! Bars are given as `"name,value;name,value"` and scale so the largest value
//! reaches the top of the chart.

use serde::Deserialize;

use super::anchor::Anchor;
use super::text::draw_label;
use super::{DrawContext, Render};
use crate::color::{ColorRef, Paint};
use crate::coords::{Coord, Cursor};
use crate::error::ElementError;
use crate::font::DEFAULT_FONT;

fn default_margin() -> i32 {
    20
}

fn default_bar_margin() -> i32 {
    10
}

fn default_legend_size() -> u32 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bars {
    /// `name,value` pairs separated by `;`
    pub values: String,
    pub color: ColorRef,
    #[serde(default = "default_bar_margin")]
    pub margin: i32,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default = "default_legend_size")]
    pub legend_size: u32,
    #[serde(default = "ColorRef::black")]
    pub legend_color: ColorRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Diagram {
    pub x: Coord,
    /// Top edge; the cursor when absent
    #[serde(default)]
    pub y: Option<Coord>,
    pub height: Coord,
    /// Defaults to the canvas width
    #[serde(default)]
    pub width: Option<Coord>,
    /// Space left of the y axis and below the x axis
    #[serde(default = "default_margin")]
    pub margin: i32,
    #[serde(default)]
    pub bars: Option<Bars>,
}

/// Parse `"a,1;b,2"` into labelled values. Empty entries are ignored.
fn parse_bars(values: &str) -> Result<Vec<(&str, f64)>, ElementError> {
    values
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, value) = entry
                .split_once(',')
                .ok_or_else(|| ElementError::InvalidValue(format!("bar '{}' is not 'name,value'", entry)))?;
            let value: f64 = value
                .trim()
                .parse()
                .ok()
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .ok_or_else(|| ElementError::InvalidValue(format!("bar '{}' has no valid value", entry)))?;
            Ok((name.trim(), value))
        })
        .collect()
}

impl Render for Diagram {
    const REQUIRED: &'static [&'static str] = &["x", "height"];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        let x = ctx.x(&self.x)?;
        let explicit = self.y.as_ref().map(|c| ctx.y(c)).transpose()?;
        let (top, auto) = cursor.place(explicit, 0);
        let height = ctx.y(&self.height)?;
        let width = match &self.width {
            Some(c) => ctx.x(c)?,
            None => ctx.width() as i32,
        };
        let margin = self.margin;
        if height <= margin || width <= margin {
            return Err(ElementError::InvalidValue(format!(
                "diagram {}x{} leaves no room inside margin {}",
                width, height, margin
            )));
        }

        let origin_x = x.saturating_add(margin);
        let base = top.saturating_add(height.saturating_sub(margin));
        ctx.surface.line(origin_x, base, x.saturating_add(width), base, 1, Paint::BLACK);
        ctx.surface.line(origin_x, top, origin_x, base, 1, Paint::BLACK);

        if let Some(bars) = &self.bars {
            let entries = parse_bars(&bars.values)?;
            let count = entries.len() as i64;
            if count > 0 {
                let gap = i64::from(bars.margin);
                let bar_width = (i64::from(width) - i64::from(margin) - (count + 1) * gap).div_euclid(count);
                if bar_width <= 0 {
                    return Err(ElementError::InvalidValue(format!(
                        "{} bars do not fit in a diagram {} wide",
                        count, width
                    )));
                }
                let fill = ctx.paint(&bars.color)?;
                let legend = ctx.paint(&bars.legend_color)?;
                let face = ctx.font(Some(bars.font.as_deref().unwrap_or(DEFAULT_FONT)), bars.legend_size.max(1))?;
                let max = entries.iter().map(|(_, v)| *v).fold(0.0, f64::max);
                let scale = if max > 0.0 { f64::from(height.saturating_sub(margin)) / max } else { 0.0 };

                for (i, (name, value)) in entries.iter().enumerate() {
                    let left = (gap + bar_width) * i as i64 + i64::from(origin_x);
                    let Ok(left) = i32::try_from(left) else { break };
                    let bar_width = bar_width as i32;
                    draw_label(
                        ctx.surface,
                        &face,
                        name,
                        left + bar_width / 2,
                        base + margin / 2,
                        Anchor::CENTER,
                        legend,
                    );
                    let bar_height = (scale * value).round() as i32;
                    ctx.surface.fill_rect(left, base - bar_height, left + bar_width, base, fill);
                }
            }
        }

        Ok(if auto {
            cursor.advance(Some(top.saturating_add(height - 1)))
        } else {
            cursor
        })
    }
}
