//! Geometric elements: lines, rectangles, polygons, circles, ellipses, arcs.
//!
//! Closed shapes share one model. A shape is a predicate over pixel centers
//! that can be shrunk by an inset; the fill is the shape itself and the
//! outline is the shape minus the shape inset by `width`. Boxes are
//! half-open, so `x_end`/`y_end` are the first column/row outside.

use serde::{Deserialize, Deserializer, de};

use super::{DrawContext, Render};
use crate::color::{ColorRef, Paint};
use crate::coords::{Coord, Cursor};
use crate::error::ElementError;
use crate::render::Surface;

fn default_width() -> u32 {
    1
}

fn some_black() -> Option<ColorRef> {
    Some(ColorRef::black())
}

fn default_dash() -> u32 {
    5
}

fn default_space() -> u32 {
    3
}

fn default_y_padding() -> i32 {
    10
}

/// Paint a closed shape described by `inside(px, py, inset)`.
fn paint_shape<F>(
    surface: &mut Surface,
    bounds: (i32, i32, i32, i32),
    fill: Option<Paint>,
    outline: Option<Paint>,
    width: u32,
    inside: F,
) where
    F: Fn(f32, f32, f32) -> bool,
{
    let (x0, y0, x1, y1) = bounds;
    if let Some(paint) = fill {
        surface.fill_where(x0, y0, x1, y1, paint, |px, py| inside(px, py, 0.0));
    }
    if let Some(paint) = outline {
        if width > 0 {
            let w = width as f32;
            surface.fill_where(x0, y0, x1, y1, paint, |px, py| {
                inside(px, py, 0.0) && !inside(px, py, w)
            });
        }
    }
}

fn ordered(a: i32, b: i32) -> (i32, i32) {
    (a.min(b), a.max(b))
}

// ============================================================================
// LINE
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Line {
    pub x_start: Coord,
    pub x_end: Coord,
    #[serde(default)]
    pub y_start: Option<Coord>,
    #[serde(default)]
    pub y_end: Option<Coord>,
    #[serde(default = "ColorRef::black")]
    pub fill: ColorRef,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default)]
    pub dashed: bool,
    #[serde(default = "default_dash")]
    pub dash_length: u32,
    #[serde(default = "default_space")]
    pub space_length: u32,
    #[serde(default = "default_y_padding")]
    pub y_padding: i32,
}

impl Render for Line {
    const REQUIRED: &'static [&'static str] = &["x_start", "x_end"];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        ctx.surface.begin_element();
        let x0 = ctx.x(&self.x_start)?;
        let x1 = ctx.x(&self.x_end)?;
        let explicit = self.y_start.as_ref().map(|c| ctx.y(c)).transpose()?;
        let (y0, auto) = cursor.place(explicit, self.y_padding);
        let y1 = match &self.y_end {
            Some(c) => ctx.y(c)?,
            None => y0,
        };
        let paint = ctx.paint(&self.fill)?;

        if self.dashed {
            ctx.surface.dashed_line(
                x0,
                y0,
                x1,
                y1,
                self.width,
                self.dash_length,
                self.space_length,
                paint,
            );
        } else {
            ctx.surface.line(x0, y0, x1, y1, self.width, paint);
        }

        Ok(if auto {
            cursor.advance(ctx.surface.ink_bottom())
        } else {
            cursor
        })
    }
}

// ============================================================================
// RECTANGLES
// ============================================================================

/// Which corners of a rectangle are rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corners {
    pub top_left: bool,
    pub top_right: bool,
    pub bottom_left: bool,
    pub bottom_right: bool,
}

impl Corners {
    pub const ALL: Corners = Corners {
        top_left: true,
        top_right: true,
        bottom_left: true,
        bottom_right: true,
    };

    pub fn parse(list: &str) -> Result<Self, String> {
        let list = list.trim();
        if list.eq_ignore_ascii_case("all") {
            return Ok(Self::ALL);
        }
        let mut corners = Corners {
            top_left: false,
            top_right: false,
            bottom_left: false,
            bottom_right: false,
        };
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match name.to_ascii_lowercase().as_str() {
                "top_left" => corners.top_left = true,
                "top_right" => corners.top_right = true,
                "bottom_left" => corners.bottom_left = true,
                "bottom_right" => corners.bottom_right = true,
                _ => return Err(format!("unknown corner '{}'", name)),
            }
        }
        Ok(corners)
    }
}

impl Default for Corners {
    fn default() -> Self {
        Self::ALL
    }
}

impl<'de> Deserialize<'de> for Corners {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Corners::parse(&s).map_err(de::Error::custom)
    }
}

/// Is the pixel center inside the rounded box shrunk by `inset`?
fn in_rounded_box(px: f32, py: f32, bounds: (f32, f32, f32, f32), radius: f32, corners: Corners, inset: f32) -> bool {
    let (x0, y0, x1, y1) = (bounds.0 + inset, bounds.1 + inset, bounds.2 - inset, bounds.3 - inset);
    if px < x0 || px >= x1 || py < y0 || py >= y1 {
        return false;
    }
    let r = (radius - inset).max(0.0);
    if r <= 0.0 {
        return true;
    }
    let corner = match (px < x0 + r, px >= x1 - r, py < y0 + r, py >= y1 - r) {
        (true, _, true, _) if corners.top_left => Some((x0 + r, y0 + r)),
        (_, true, true, _) if corners.top_right => Some((x1 - r, y0 + r)),
        (true, _, _, true) if corners.bottom_left => Some((x0 + r, y1 - r)),
        (_, true, _, true) if corners.bottom_right => Some((x1 - r, y1 - r)),
        _ => None,
    };
    corner.is_none_or(|(cx, cy)| (px - cx).powi(2) + (py - cy).powi(2) <= r * r)
}

#[allow(clippy::too_many_arguments)]
fn draw_box(
    surface: &mut Surface,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    fill: Option<Paint>,
    outline: Option<Paint>,
    width: u32,
    radius: i32,
    corners: Corners,
) {
    let (x0, x1) = ordered(x0, x1);
    let (y0, y1) = ordered(y0, y1);
    let bounds = (x0 as f32, y0 as f32, x1 as f32, y1 as f32);
    let radius = radius.max(0) as f32;
    paint_shape(surface, (x0, y0, x1, y1), fill, outline, width, |px, py, inset| {
        in_rounded_box(px, py, bounds, radius, corners, inset)
    });
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rectangle {
    pub x_start: Coord,
    pub x_end: Coord,
    pub y_start: Coord,
    pub y_end: Coord,
    #[serde(default)]
    pub fill: Option<ColorRef>,
    #[serde(default = "some_black")]
    pub outline: Option<ColorRef>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default)]
    pub radius: i32,
    #[serde(default)]
    pub corners: Corners,
}

impl Render for Rectangle {
    const REQUIRED: &'static [&'static str] = &["x_start", "x_end", "y_start", "y_end"];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        let (x0, x1) = (ctx.x(&self.x_start)?, ctx.x(&self.x_end)?);
        let (y0, y1) = (ctx.y(&self.y_start)?, ctx.y(&self.y_end)?);
        let fill = ctx.paint_opt(self.fill.as_ref())?;
        let outline = ctx.paint_opt(self.outline.as_ref())?;
        draw_box(ctx.surface, x0, y0, x1, y1, fill, outline, self.width, self.radius, self.corners);
        Ok(cursor)
    }
}

/// A grid of identical rectangles.
#[derive(Debug, Clone, Deserialize)]
pub struct RectanglePattern {
    pub x_start: Coord,
    pub x_size: Coord,
    pub y_start: Coord,
    pub y_size: Coord,
    pub x_repeat: u32,
    pub y_repeat: u32,
    pub x_offset: Coord,
    pub y_offset: Coord,
    #[serde(default)]
    pub fill: Option<ColorRef>,
    #[serde(default = "some_black")]
    pub outline: Option<ColorRef>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default)]
    pub radius: i32,
    #[serde(default)]
    pub corners: Corners,
}

impl Render for RectanglePattern {
    const REQUIRED: &'static [&'static str] = &[
        "x_start", "x_size", "y_start", "y_size", "x_repeat", "y_repeat", "x_offset", "y_offset",
    ];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        let (x_start, x_size, x_offset) = (ctx.x(&self.x_start)?, ctx.x(&self.x_size)?, ctx.x(&self.x_offset)?);
        let (y_start, y_size, y_offset) = (ctx.y(&self.y_start)?, ctx.y(&self.y_size)?, ctx.y(&self.y_offset)?);
        let fill = ctx.paint_opt(self.fill.as_ref())?;
        let outline = ctx.paint_opt(self.outline.as_ref())?;

        let columns = tile_spans(x_start, x_size, x_offset, self.x_repeat, ctx.width())?;
        let rows = tile_spans(y_start, y_size, y_offset, self.y_repeat, ctx.height())?;
        for &(y0, y1) in &rows {
            for &(x0, x1) in &columns {
                draw_box(ctx.surface, x0, y0, x1, y1, fill, outline, self.width, self.radius, self.corners);
            }
        }
        Ok(cursor)
    }
}

/// Start and end of each tile along one axis, stopping once tiles leave the
/// surface in the direction of travel.
fn tile_spans(start: i32, size: i32, offset: i32, repeat: u32, extent: u32) -> Result<Vec<(i32, i32)>, ElementError> {
    let overflow = || ElementError::InvalidValue(format!("rectangle_pattern tiles overflow at start {} size {}", start, size));
    let pitch = i64::from(size) + i64::from(offset);
    let repeat = if pitch == 0 { repeat.min(1) } else { repeat };
    let mut spans = Vec::new();
    for i in 0..i64::from(repeat) {
        let origin = i
            .checked_mul(pitch)
            .and_then(|d| d.checked_add(i64::from(start)))
            .ok_or_else(overflow)?;
        let end = origin + i64::from(size);
        if (pitch > 0 && origin >= i64::from(extent)) || (pitch < 0 && origin.max(end) < 0) {
            break;
        }
        let origin = i32::try_from(origin).map_err(|_| overflow())?;
        let end = i32::try_from(end).map_err(|_| overflow())?;
        spans.push((origin, end));
    }
    Ok(spans)
}

// ============================================================================
// POLYGON
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Polygon {
    pub points: Vec<(Coord, Coord)>,
    #[serde(default)]
    pub fill: Option<ColorRef>,
    #[serde(default = "some_black")]
    pub outline: Option<ColorRef>,
    #[serde(default = "default_width")]
    pub width: u32,
}

/// Even-odd test of a point against a closed polygon.
fn even_odd(px: f32, py: f32, points: &[(f32, f32)]) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (xi, yi) = points[i];
        let (xj, yj) = points[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

impl Render for Polygon {
    const REQUIRED: &'static [&'static str] = &["points"];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        if self.points.len() < 3 {
            return Err(ElementError::InvalidValue(format!(
                "polygon needs at least 3 points, got {}",
                self.points.len()
            )));
        }
        let mut points = Vec::with_capacity(self.points.len());
        for (x, y) in &self.points {
            points.push((ctx.x(x)?, ctx.y(y)?));
        }
        let fill = ctx.paint_opt(self.fill.as_ref())?;
        let outline = ctx.paint_opt(self.outline.as_ref())?;

        if let Some(paint) = fill {
            let corners: Vec<(f32, f32)> = points.iter().map(|&(x, y)| (x as f32, y as f32)).collect();
            let min_x = points.iter().map(|p| p.0).min().unwrap_or(0);
            let max_x = points.iter().map(|p| p.0).max().unwrap_or(0);
            let min_y = points.iter().map(|p| p.1).min().unwrap_or(0);
            let max_y = points.iter().map(|p| p.1).max().unwrap_or(0);
            ctx.surface
                .fill_where(min_x, min_y, max_x + 1, max_y + 1, paint, |px, py| even_odd(px, py, &corners));
        }
        if let Some(paint) = outline {
            for (i, &(x0, y0)) in points.iter().enumerate() {
                let (x1, y1) = points[(i + 1) % points.len()];
                ctx.surface.line(x0, y0, x1, y1, self.width, paint);
            }
        }
        Ok(cursor)
    }
}

// ============================================================================
// CIRCLE / ELLIPSE
// ============================================================================

fn draw_ellipse(surface: &mut Surface, x0: i32, y0: i32, x1: i32, y1: i32, fill: Option<Paint>, outline: Option<Paint>, width: u32) {
    let (x0, x1) = ordered(x0, x1);
    let (y0, y1) = ordered(y0, y1);
    let cx = (x0 + x1) as f32 / 2.0;
    let cy = (y0 + y1) as f32 / 2.0;
    let rx = (x1 - x0) as f32 / 2.0;
    let ry = (y1 - y0) as f32 / 2.0;
    paint_shape(surface, (x0, y0, x1, y1), fill, outline, width, |px, py, inset| {
        let (ax, ay) = (rx - inset, ry - inset);
        if ax <= 0.0 || ay <= 0.0 {
            return false;
        }
        ((px - cx) / ax).powi(2) + ((py - cy) / ay).powi(2) <= 1.0
    });
}

#[derive(Debug, Clone, Deserialize)]
pub struct Circle {
    pub x: Coord,
    pub y: Coord,
    /// Resolved against the canvas width
    pub radius: Coord,
    #[serde(default)]
    pub fill: Option<ColorRef>,
    #[serde(default = "some_black")]
    pub outline: Option<ColorRef>,
    #[serde(default = "default_width")]
    pub width: u32,
}

impl Render for Circle {
    const REQUIRED: &'static [&'static str] = &["x", "y", "radius"];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        let (x, y) = (ctx.x(&self.x)?, ctx.y(&self.y)?);
        let r = ctx.x(&self.radius)?;
        if r < 0 {
            return Err(ElementError::InvalidValue(format!("negative radius {}", r)));
        }
        let fill = ctx.paint_opt(self.fill.as_ref())?;
        let outline = ctx.paint_opt(self.outline.as_ref())?;
        draw_ellipse(ctx.surface, x - r, y - r, x + r + 1, y + r + 1, fill, outline, self.width);
        Ok(cursor)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ellipse {
    pub x_start: Coord,
    pub x_end: Coord,
    pub y_start: Coord,
    pub y_end: Coord,
    #[serde(default)]
    pub fill: Option<ColorRef>,
    #[serde(default = "some_black")]
    pub outline: Option<ColorRef>,
    #[serde(default = "default_width")]
    pub width: u32,
}

impl Render for Ellipse {
    const REQUIRED: &'static [&'static str] = &["x_start", "x_end", "y_start", "y_end"];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        let (x0, x1) = (ctx.x(&self.x_start)?, ctx.x(&self.x_end)?);
        let (y0, y1) = (ctx.y(&self.y_start)?, ctx.y(&self.y_end)?);
        let fill = ctx.paint_opt(self.fill.as_ref())?;
        let outline = ctx.paint_opt(self.outline.as_ref())?;
        draw_ellipse(ctx.surface, x0, y0, x1, y1, fill, outline, self.width);
        Ok(cursor)
    }
}

// ============================================================================
// ARC
// ============================================================================

/// Circular arc or pie slice. 0° points right, angles grow clockwise.
#[derive(Debug, Clone, Deserialize)]
pub struct Arc {
    pub x: Coord,
    pub y: Coord,
    pub radius: Coord,
    pub start_angle: f64,
    pub end_angle: f64,
    /// Set: pie slice. Unset: open stroke.
    #[serde(default)]
    pub fill: Option<ColorRef>,
    #[serde(default = "some_black")]
    pub outline: Option<ColorRef>,
    #[serde(default = "default_width")]
    pub width: u32,
}

/// Does the screen-space angle of (dx, dy) fall in the clockwise sweep?
fn in_sweep(dx: f32, dy: f32, start: f64, sweep: f64) -> bool {
    if sweep >= 360.0 {
        return true;
    }
    let angle = (dy as f64).atan2(dx as f64).to_degrees().rem_euclid(360.0);
    (angle - start).rem_euclid(360.0) <= sweep
}

impl Render for Arc {
    const REQUIRED: &'static [&'static str] = &["x", "y", "radius", "start_angle", "end_angle"];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        let (x, y) = (ctx.x(&self.x)?, ctx.y(&self.y)?);
        let r = ctx.x(&self.radius)?;
        if r < 0 {
            return Err(ElementError::InvalidValue(format!("negative radius {}", r)));
        }
        let fill = ctx.paint_opt(self.fill.as_ref())?;
        let outline = ctx.paint_opt(self.outline.as_ref())?;

        let start = self.start_angle.rem_euclid(360.0);
        let span = self.end_angle - self.start_angle;
        let sweep = if span.abs() >= 360.0 { 360.0 } else { span.rem_euclid(360.0) };
        let (cx, cy) = (x as f32 + 0.5, y as f32 + 0.5);
        let outer = r as f32 + 0.5;
        let bounds = (x - r - 1, y - r - 1, x + r + 2, y + r + 2);
        let w = self.width as f32;

        let in_ring = |px: f32, py: f32, inner: f32| {
            let d2 = (px - cx).powi(2) + (py - cy).powi(2);
            d2 <= outer * outer && (inner <= 0.0 || d2 > inner * inner) && in_sweep(px - cx, py - cy, start, sweep)
        };

        match fill {
            Some(paint) => {
                ctx.surface
                    .fill_where(bounds.0, bounds.1, bounds.2, bounds.3, paint, |px, py| in_ring(px, py, 0.0));
                if let Some(edge) = outline {
                    ctx.surface.fill_where(bounds.0, bounds.1, bounds.2, bounds.3, edge, |px, py| {
                        in_ring(px, py, outer - w)
                    });
                    if sweep < 360.0 {
                        for angle in [start, start + sweep] {
                            let (sin, cos) = angle.to_radians().sin_cos();
                            let ex = cx + (cos as f32) * (outer - 0.5);
                            let ey = cy + (sin as f32) * (outer - 0.5);
                            if self.width <= 1 {
                                ctx.surface.line(x, y, ex.floor() as i32, ey.floor() as i32, 1, edge);
                            } else {
                                ctx.surface.thick_segment(cx, cy, ex, ey, w, edge);
                            }
                        }
                    }
                }
            }
            None => {
                if let Some(edge) = outline {
                    ctx.surface.fill_where(bounds.0, bounds.1, bounds.2, bounds.3, edge, |px, py| {
                        in_ring(px, py, outer - w)
                    });
                }
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

    fn draw<R: Render + for<'de> Deserialize<'de>>(w: u32, h: u32, value: serde_json::Value) -> Surface {
        let element: R = serde_json::from_value(value).unwrap();
        let mut surface = Surface::new(w, h, Paint::WHITE);
        let fonts = FontResolver::default();
        let inputs = RenderInputs::default();
        let now = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let mut ctx = DrawContext::new(&mut surface, AccentColor::Red, &fonts, &NoGlyphs, &inputs, now);
        element.render(&mut ctx, Cursor::default()).unwrap();
        surface
    }

    fn black(s: &Surface) -> usize {
        s.pixels().iter().filter(|p| **p == Paint::BLACK).count()
    }

    #[test]
    fn test_filled_rectangle_is_half_open() {
        let s = draw::<Rectangle>(
            20,
            20,
            json!({"x_start": 0, "y_start": 0, "x_end": 10, "y_end": 10, "fill": "black", "outline": null}),
        );
        assert_eq!(black(&s), 100);
    }

    #[test]
    fn test_unfilled_rectangle_keeps_interior() {
        let s = draw::<Rectangle>(20, 20, json!({"x_start": 2, "y_start": 2, "x_end": 12, "y_end": 12, "width": 2}));
        // Ring of a 10x10 box minus the 6x6 interior
        assert_eq!(black(&s), 100 - 36);
        for y in 4..10 {
            for x in 4..10 {
                assert_eq!(s.get(x, y), Some(Paint::WHITE));
            }
        }
    }

    #[test]
    fn test_rounded_corners_subset() {
        let all = draw::<Rectangle>(30, 30, json!({"x_start": 0, "y_start": 0, "x_end": 20, "y_end": 20,
            "fill": "black", "outline": null, "radius": 6}));
        let one = draw::<Rectangle>(30, 30, json!({"x_start": 0, "y_start": 0, "x_end": 20, "y_end": 20,
            "fill": "black", "outline": null, "radius": 6, "corners": "top_left"}));
        assert_eq!(all.get(0, 0), Some(Paint::WHITE));
        assert_eq!(one.get(0, 0), Some(Paint::WHITE));
        assert_eq!(one.get(19, 19), Some(Paint::BLACK));
        assert!(black(&one) > black(&all));
    }

    #[test]
    fn test_corners_parse() {
        assert_eq!(Corners::parse("all"), Ok(Corners::ALL));
        let c = Corners::parse("top_left, bottom_right").unwrap();
        assert!(c.top_left && c.bottom_right && !c.top_right && !c.bottom_left);
        assert!(Corners::parse("middle").is_err());
    }

    #[test]
    fn test_rectangle_pattern_tiles() {
        let s = draw::<RectanglePattern>(
            40,
            20,
            json!({"x_start": 0, "x_size": 4, "y_start": 0, "y_size": 4, "x_repeat": 3, "y_repeat": 2,
                   "x_offset": 2, "y_offset": 1, "fill": "black", "outline": null}),
        );
        assert_eq!(black(&s), 6 * 16);
        assert_eq!(s.get(6, 5), Some(Paint::BLACK));
        assert_eq!(s.get(4, 0), Some(Paint::WHITE));
    }

    #[test]
    fn test_rectangle_pattern_stops_at_surface_edge() {
        let s = draw::<RectanglePattern>(
            20,
            20,
            json!({"x_start": 0, "x_size": 100000, "y_start": 0, "y_size": 5, "x_repeat": 30000, "y_repeat": 1,
                   "x_offset": 0, "y_offset": 0, "fill": "black", "outline": null}),
        );
        assert_eq!(black(&s), 20 * 5);

        assert_eq!(tile_spans(0, 4, 2, u32::MAX, 20).unwrap().len(), 4);
        assert_eq!(tile_spans(18, 4, -6, u32::MAX, 20).unwrap().len(), 12);
        assert_eq!(tile_spans(3, 0, 0, u32::MAX, 20).unwrap(), vec![(3, 3)]);
    }

    #[test]
    fn test_rectangle_pattern_overflow_is_error() {
        assert!(matches!(
            tile_spans(i32::MAX - 1, 4, 0, 1, u32::MAX),
            Err(ElementError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_polygon_even_odd_fill() {
        let s = draw::<Polygon>(
            20,
            20,
            json!({"points": [[0, 0], [10, 0], [10, 10], [0, 10]], "fill": "black", "outline": null}),
        );
        assert_eq!(black(&s), 100);
    }

    #[test]
    fn test_circle_bounds() {
        let s = draw::<Circle>(20, 20, json!({"x": 10, "y": 10, "radius": 3, "fill": "black", "outline": null}));
        assert_eq!(s.get(10, 10), Some(Paint::BLACK));
        assert_eq!(s.get(13, 10), Some(Paint::BLACK));
        assert_eq!(s.get(14, 10), Some(Paint::WHITE));
        assert_eq!(s.get(7, 10), Some(Paint::BLACK));
        assert_eq!(s.get(6, 10), Some(Paint::WHITE));
    }

    #[test]
    fn test_arc_pie_covers_quadrant() {
        // 0 to 90 degrees clockwise: the lower-right quadrant on screen
        let s = draw::<Arc>(
            40,
            40,
            json!({"x": 20, "y": 20, "radius": 10, "start_angle": 0, "end_angle": 90, "fill": "black"}),
        );
        assert_eq!(s.get(25, 25), Some(Paint::BLACK));
        assert_eq!(s.get(15, 15), Some(Paint::WHITE));
        assert_eq!(s.get(25, 15), Some(Paint::WHITE));
    }

    #[test]
    fn test_arc_stroke_leaves_center() {
        let s = draw::<Arc>(40, 40, json!({"x": 20, "y": 20, "radius": 10, "start_angle": 0, "end_angle": 360}));
        assert_eq!(s.get(20, 20), Some(Paint::WHITE));
        assert_eq!(s.get(30, 20), Some(Paint::BLACK));
    }

    #[test]
    fn test_line_auto_position_advances_cursor() {
        let line: Line = serde_json::from_value(json!({"x_start": 0, "x_end": 9, "width": 3})).unwrap();
        let mut surface = Surface::new(10, 40, Paint::WHITE);
        let fonts = FontResolver::default();
        let inputs = RenderInputs::default();
        let now = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let mut ctx = DrawContext::new(&mut surface, AccentColor::Red, &fonts, &NoGlyphs, &inputs, now);
        let next = line.render(&mut ctx, Cursor::new(5)).unwrap();
        // y = 15, width 3 covers rows 14..=16
        assert_eq!(next, Cursor::new(16));
    }
}
