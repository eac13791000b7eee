//! # Plot Subsystem
//!
//! Time series line charts drawn from pre-fetched samples
//! ([`RenderInputs::series`](crate::render::RenderInputs)).
//!
//! ## Layout
//!
//! ```text
//!  x_start                                   x_end
//!  +------+-----------------------------------+   y_start
//!  | 25.5 |                 ___/\             |
//!  |      |  ___/\_________/     \___         |   <- diagram area
//!  | 18   |_/                                 |
//!  |      +-----+--------+--------+--------+--+   <- x axis
//!  |          06:00    12:00    18:00    00:00|   <- x legend
//!  +------------------------------------------+   y_end
//!  ^ y legend
//! ```
//!
//! The y legend takes its width from the left or right of the plot box;
//! the x legend takes its height from the bottom or top. The rest is the
//! diagram area where values map linearly onto pixels:
//!
//! - time: `[now - duration, now]` onto `[diag_x, diag_x + diag_w - 1]`
//! - value: `[min, max]` onto `[diag_y + diag_h - 1, diag_y]`

pub mod series;

pub use series::{Segment, SeriesSample, SpanGaps};

use std::fmt::Write;

use chrono::{DateTime, Duration, FixedOffset, Timelike};
use serde::Deserialize;

use crate::color::{ColorRef, Paint};
use crate::coords::{Coord, Cursor};
use crate::elements::anchor::{Anchor, HAnchor, VAnchor};
use crate::elements::text::draw_label;
use crate::elements::{DrawContext, Render, default_true};
use crate::error::ElementError;
use crate::render::Surface;

/// Upper bound on ticks, labels and grid lines per axis.
const MAX_STEPS: usize = 1000;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridStyle {
    #[default]
    Dotted,
    Dashed,
    Lines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YLegendPosition {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XLegendPosition {
    #[default]
    Bottom,
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Linear,
    Step,
}

fn one() -> u32 {
    1
}

fn two() -> u32 {
    2
}

fn four() -> i32 {
    4
}

fn auto() -> i32 {
    -1
}

fn legend_size() -> u32 {
    10
}

fn one_f() -> f64 {
    1.0
}

fn time_format() -> String {
    "%H:%M".to_string()
}

fn default_duration() -> f64 {
    86400.0
}

fn smooth_steps() -> u32 {
    10
}

fn point_size() -> i32 {
    3
}

#[derive(Debug, Clone, Deserialize)]
pub struct YLegend {
    /// `-1` sizes the legend to its widest label
    #[serde(default = "auto")]
    pub width: i32,
    #[serde(default = "ColorRef::black")]
    pub color: ColorRef,
    #[serde(default)]
    pub position: YLegendPosition,
    #[serde(default = "legend_size")]
    pub size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YAxis {
    #[serde(default = "one")]
    pub width: u32,
    #[serde(default = "ColorRef::black")]
    pub color: ColorRef,
    #[serde(default = "four")]
    pub tick_length: i32,
    #[serde(default = "two")]
    pub tick_width: u32,
    #[serde(default = "one_f")]
    pub tick_every: f64,
    #[serde(default = "default_true")]
    pub grid: bool,
    #[serde(default = "ColorRef::black")]
    pub grid_color: ColorRef,
    #[serde(default)]
    pub grid_style: GridStyle,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XLegend {
    /// strftime format of the time labels
    #[serde(default = "time_format")]
    pub format: String,
    /// Seconds between labels; a quarter of the duration by default
    #[serde(default)]
    pub interval: Option<f64>,
    #[serde(default = "legend_size")]
    pub size: u32,
    #[serde(default = "ColorRef::black")]
    pub color: ColorRef,
    #[serde(default)]
    pub position: XLegendPosition,
    /// `-1` sizes the legend to the font, `0` hides it
    #[serde(default = "auto")]
    pub height: i32,
    #[serde(default = "default_true")]
    pub snap_to_hours: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XAxis {
    #[serde(default = "one")]
    pub width: u32,
    #[serde(default = "ColorRef::black")]
    pub color: ColorRef,
    #[serde(default = "four")]
    pub tick_length: i32,
    #[serde(default = "two")]
    pub tick_width: u32,
    #[serde(default = "default_true")]
    pub grid: bool,
    #[serde(default = "ColorRef::black")]
    pub grid_color: ColorRef,
    #[serde(default)]
    pub grid_style: GridStyle,
}

/// One plotted entity.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesConfig {
    pub entity: String,
    #[serde(default = "ColorRef::black")]
    pub color: ColorRef,
    #[serde(default = "one")]
    pub width: u32,
    #[serde(default)]
    pub smooth: bool,
    #[serde(default = "smooth_steps")]
    pub smooth_steps: u32,
    #[serde(default)]
    pub line_style: LineStyle,
    #[serde(default)]
    pub show_points: bool,
    #[serde(default = "point_size")]
    pub point_size: i32,
    #[serde(default = "ColorRef::black")]
    pub point_color: ColorRef,
    #[serde(default = "one_f")]
    pub value_scale: f64,
    #[serde(default)]
    pub span_gaps: SpanGaps,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Plot {
    pub data: Vec<SeriesConfig>,
    #[serde(default)]
    pub x_start: Option<Coord>,
    #[serde(default)]
    pub y_start: Option<Coord>,
    #[serde(default)]
    pub x_end: Option<Coord>,
    #[serde(default)]
    pub y_end: Option<Coord>,
    /// Window length in seconds
    #[serde(default = "default_duration")]
    pub duration: f64,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub round_values: bool,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub ylegend: Option<YLegend>,
    #[serde(default)]
    pub yaxis: Option<YAxis>,
    #[serde(default)]
    pub xlegend: Option<XLegend>,
    #[serde(default)]
    pub xaxis: Option<XAxis>,
}

// ============================================================================
// SCALES
// ============================================================================

/// Value range of the plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    /// Range of the data, extended (never narrowed) by `low`/`high`.
    pub fn of(values: impl Iterator<Item = f64>, low: Option<f64>, high: Option<f64>, round: bool) -> Option<Range> {
        let (mut min, mut max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        if let Some(low) = low {
            min = min.min(low);
        }
        if let Some(high) = high {
            max = max.max(high);
        }
        if round {
            min = min.floor();
            max = max.ceil();
        }
        if max == min {
            min -= 1.0;
        }
        Some(Range { min, max })
    }

    pub fn spread(&self) -> f64 {
        self.max - self.min
    }

    /// Values from `min` in steps of `every`, up to `max`.
    fn steps(&self, every: f64) -> impl Iterator<Item = f64> + '_ {
        (0..MAX_STEPS)
            .map(move |i| self.min + i as f64 * every)
            .take_while(|v| *v <= self.max + 1e-9)
    }
}

/// Diagram area in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Area {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

struct Scale {
    area: Area,
    range: Range,
    start: DateTime<FixedOffset>,
    duration: f64,
}

impl Scale {
    fn x(&self, t: DateTime<FixedOffset>) -> i32 {
        let rel = (t - self.start).num_milliseconds() as f64 / 1000.0 / self.duration;
        (self.area.x as f64 + rel * (self.area.w - 1) as f64).round() as i32
    }

    fn y(&self, value: f64) -> i32 {
        let rel = (value - self.range.min) / self.range.spread();
        (self.area.y as f64 + (1.0 - rel) * (self.area.h - 1) as f64).round() as i32
    }

    fn contains_x(&self, x: i32) -> bool {
        self.area.x <= x && x <= self.area.x + self.area.w
    }
}

/// Format an axis value: integers without decimals, others to at most two.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        return format!("{}", value as i64);
    }
    let fixed = format!("{:.2}", value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Format a timestamp with a strftime pattern, failing on a bad pattern.
pub fn format_time(t: DateTime<FixedOffset>, pattern: &str) -> Result<String, ElementError> {
    let mut out = String::new();
    write!(out, "{}", t.format(pattern))
        .map_err(|_| ElementError::InvalidValue(format!("invalid time format '{}'", pattern)))?;
    Ok(out)
}

/// Whole milliseconds in `seconds`, if chrono can represent them.
fn millis(seconds: f64) -> Option<Duration> {
    let ms = (seconds * 1000.0).trunc();
    if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(ms as i64)
}

fn truncate_to_hour(t: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    t.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

/// Catmull-Rom spline point between `p1` and `p2`.
fn catmull_rom(p0: (f32, f32), p1: (f32, f32), p2: (f32, f32), p3: (f32, f32), t: f32) -> (f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    let blend = |a: f32, b: f32, c: f32, d: f32| {
        0.5 * ((-t3 + 2.0 * t2 - t) * a + (3.0 * t3 - 5.0 * t2 + 2.0) * b + (-3.0 * t3 + 4.0 * t2 + t) * c + (t3 - t2) * d)
    };
    (blend(p0.0, p1.0, p2.0, p3.0).trunc(), blend(p0.1, p1.1, p2.1, p3.1).trunc())
}

/// Smooth a polyline; end points are duplicated as outer control points.
pub fn smooth(points: &[(f32, f32)], steps: u32) -> Vec<(f32, f32)> {
    let n = points.len();
    if n < 3 || steps == 0 {
        return points.to_vec();
    }
    let steps = steps as usize;
    let mut out = vec![points[0]];
    let mut span = |p0, p1, p2, p3, from: usize| {
        for i in from..steps {
            out.push(catmull_rom(p0, p1, p2, p3, i as f32 / steps as f32));
        }
    };
    if n > 3 {
        span(points[0], points[0], points[1], points[2], 1);
    }
    for i in 0..n.saturating_sub(3) {
        span(points[i], points[i + 1], points[i + 2], points[i + 3], 0);
    }
    if n > 3 {
        span(points[n - 3], points[n - 2], points[n - 1], points[n - 1], 1);
    }
    out.push(points[n - 1]);
    out
}

/// Stair-step a polyline: horizontal first, then vertical.
pub fn step(points: &[(f32, f32)]) -> Vec<(f32, f32)> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    let mut out = vec![first];
    for pair in points.windows(2) {
        out.push((pair[1].0, pair[0].1));
        out.push(pair[1]);
    }
    out
}

// ============================================================================
// RENDERING
// ============================================================================

fn outline_rect(surface: &mut Surface, x0: i32, y0: i32, x1: i32, y1: i32, paint: Paint) {
    surface.fill_rect(x0, y0, x1, y0 + 1, paint);
    surface.fill_rect(x0, y1 - 1, x1, y1, paint);
    surface.fill_rect(x0, y0, x0 + 1, y1, paint);
    surface.fill_rect(x1 - 1, y0, x1, y1, paint);
}

fn grid_line(surface: &mut Surface, from: (i32, i32), to: (i32, i32), style: GridStyle, paint: Paint) {
    match style {
        GridStyle::Lines => surface.line(from.0, from.1, to.0, to.1, 1, paint),
        GridStyle::Dashed => surface.dashed_line(from.0, from.1, to.0, to.1, 1, 5, 3, paint),
        GridStyle::Dotted => surface.dashed_line(from.0, from.1, to.0, to.1, 1, 1, 4, paint),
    }
}

struct PreparedSeries<'a> {
    config: &'a SeriesConfig,
    segments: Vec<Segment>,
}

impl Plot {
    fn prepare<'a>(
        &'a self,
        ctx: &DrawContext<'_>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<PreparedSeries<'a>>, ElementError> {
        let mut prepared = Vec::with_capacity(self.data.len());
        for config in &self.data {
            let samples = ctx
                .inputs
                .series
                .get(&config.entity)
                .ok_or_else(|| ElementError::MissingSeries(config.entity.clone()))?;
            let windowed = series::window(samples, start, end);
            let segments = series::segments(&windowed, config.span_gaps, config.value_scale);
            if !segments.is_empty() {
                prepared.push(PreparedSeries { config, segments });
            }
        }
        Ok(prepared)
    }
}

impl Render for Plot {
    const REQUIRED: &'static [&'static str] = &["data"];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        if !(self.duration > 0.0 && self.duration.is_finite()) {
            return Err(ElementError::InvalidValue(format!("plot duration must be positive, got {}", self.duration)));
        }
        let x_start = match &self.x_start {
            Some(c) => ctx.x(c)?,
            None => 0,
        };
        let y_start = match &self.y_start {
            Some(c) => ctx.y(c)?,
            None => 0,
        };
        let x_end = match &self.x_end {
            Some(c) => ctx.x(c)?,
            None => ctx.width() as i32 - 1,
        };
        let y_end = match &self.y_end {
            Some(c) => ctx.y(c)?,
            None => ctx.height() as i32 - 1,
        };
        let width = x_end - x_start + 1;
        let height = y_end - y_start + 1;

        let end = ctx.now;
        let start = millis(self.duration)
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| ElementError::InvalidValue(format!("plot duration {} is out of range", self.duration)))?;

        let prepared = self.prepare(ctx, start, end)?;
        let range = Range::of(
            prepared.iter().flat_map(|p| p.segments.iter().flatten().map(|(_, v)| *v)),
            self.low,
            self.high,
            self.round_values,
        )
        .ok_or_else(|| ElementError::InvalidValue("plot has no valid data points".to_string()))?;

        // Y legend width
        let y_legend = match &self.ylegend {
            Some(legend) => {
                let face = ctx.font(self.font.as_deref(), legend.size)?;
                let color = ctx.paint(&legend.color)?;
                let w = if legend.width < 0 {
                    face.text_width(&format_value(range.max))
                        .max(face.text_width(&format_value(range.min)))
                } else {
                    legend.width
                };
                Some((legend, face, color, w))
            }
            None => None,
        };
        let y_legend_w = y_legend.as_ref().map_or(0, |l| l.3);
        let y_legend_left = y_legend
            .as_ref()
            .is_some_and(|l| l.0.position == YLegendPosition::Left);

        // X legend height
        let x_tick_width = self.xaxis.as_ref().map_or(0, |a| a.tick_width as i32);
        let x_legend = match &self.xlegend {
            Some(legend) if legend.height != 0 => {
                let face = ctx.font(self.font.as_deref(), legend.size)?;
                let color = ctx.paint(&legend.color)?;
                let h = if legend.height > 0 {
                    legend.height
                } else {
                    face.line_height() + x_tick_width + 2
                };
                Some((legend, face, color, h))
            }
            _ => None,
        };
        let x_legend_h = x_legend.as_ref().map_or(0, |l| l.3);
        let x_legend_top = x_legend
            .as_ref()
            .is_some_and(|l| l.0.position == XLegendPosition::Top);

        let interval = self
            .xlegend
            .as_ref()
            .and_then(|l| l.interval)
            .unwrap_or(self.duration / 4.0);
        if !(interval > 0.0 && interval.is_finite()) {
            return Err(ElementError::InvalidValue(format!("plot label interval must be positive, got {}", interval)));
        }
        let step = millis(interval)
            .filter(|step| step.num_milliseconds() > 0)
            .ok_or_else(|| ElementError::InvalidValue(format!("plot label interval {} is out of range", interval)))?;

        let area = Area {
            x: x_start + if y_legend_left { y_legend_w } else { 0 },
            y: y_start + if x_legend_top { x_legend_h } else { 0 },
            w: width - y_legend_w,
            h: height - x_legend_h,
        };
        if area.w < 2 || area.h < 2 {
            return Err(ElementError::InvalidValue(format!(
                "plot diagram area {}x{} is too small",
                area.w, area.h
            )));
        }
        let scale = Scale {
            area,
            range,
            start,
            duration: self.duration,
        };

        if self.debug {
            outline_rect(ctx.surface, x_start, y_start, x_end + 1, y_end + 1, Paint::BLACK);
            let red = ctx.paint(&ColorRef::new("red"))?;
            outline_rect(ctx.surface, area.x, area.y, area.x + area.w, area.y + area.h, red);
        }

        // Y legend labels
        if let Some((legend, face, color, _)) = &y_legend {
            let (lx, h) = match legend.position {
                YLegendPosition::Left => (x_start, HAnchor::Left),
                YLegendPosition::Right => (x_end, HAnchor::Right),
            };
            match self.yaxis.as_ref().map(|a| a.tick_every) {
                Some(every) if every > 0.0 => {
                    let anchor = Anchor { h, v: VAnchor::Middle };
                    let mut max_drawn = false;
                    for v in range.steps(every) {
                        draw_label(ctx.surface, face, &format_value(v), lx, scale.y(v), anchor, *color);
                        max_drawn |= (v - range.max).abs() < 1e-4;
                    }
                    if !max_drawn {
                        draw_label(ctx.surface, face, &format_value(range.max), lx, scale.y(range.max), anchor, *color);
                    }
                }
                _ => {
                    let top = area.y;
                    let bottom = area.y + area.h - 1;
                    draw_label(ctx.surface, face, &format_value(range.max), lx, top, Anchor { h, v: VAnchor::Top }, *color);
                    draw_label(ctx.surface, face, &format_value(range.min), lx, bottom, Anchor { h, v: VAnchor::Baseline }, *color);
                }
            }
        }

        // Y axis, ticks and grid
        if let Some(axis) = &self.yaxis {
            if !(axis.tick_every > 0.0) {
                return Err(ElementError::InvalidValue("yaxis tick_every must be positive".to_string()));
            }
            let color = ctx.paint(&axis.color)?;
            if axis.width > 0 {
                ctx.surface
                    .fill_rect(area.x, area.y, area.x + axis.width as i32, area.y + area.h, color);
            }
            if axis.tick_length > 0 {
                for v in range.steps(axis.tick_every) {
                    let y = scale.y(v);
                    ctx.surface
                        .line(area.x, y, area.x + axis.tick_length - 1, y, axis.tick_width, color);
                }
            }
            if axis.grid {
                let grid = ctx.paint(&axis.grid_color)?;
                for v in range.steps(axis.tick_every) {
                    let y = scale.y(v);
                    grid_line(ctx.surface, (area.x, y), (area.x + area.w - 1, y), axis.grid_style, grid);
                }
            }
        }

        // Time steps
        let snap = self.xlegend.as_ref().is_some_and(|l| l.snap_to_hours) && x_legend.is_some();
        let (first, last) = if snap {
            let last = truncate_to_hour(end);
            let last = if end > last {
                last.checked_add_signed(Duration::hours(1)).unwrap_or(end)
            } else {
                last
            };
            (truncate_to_hour(start), last)
        } else {
            (start, end)
        };
        let mut times: Vec<DateTime<FixedOffset>> = Vec::new();
        let mut t = Some(first);
        while let Some(current) = t.filter(|t| *t <= last && times.len() < MAX_STEPS) {
            times.push(current);
            t = current.checked_add_signed(step);
        }

        let base = area.y + area.h;
        if let Some(axis) = &self.xaxis {
            let color = ctx.paint(&axis.color)?;
            if axis.width > 0 {
                ctx.surface
                    .line(area.x, base, area.x + area.w, base, axis.width, color);
            }
            if axis.tick_length > 0 {
                for &t in &times {
                    let x = scale.x(t);
                    if scale.contains_x(x) {
                        ctx.surface
                            .line(x, base, x, base - axis.tick_length, axis.tick_width, color);
                    }
                }
            }
            if axis.grid {
                let grid = ctx.paint(&axis.grid_color)?;
                for &t in &times {
                    let x = scale.x(t);
                    if scale.contains_x(x) {
                        grid_line(ctx.surface, (x, area.y), (x, base), axis.grid_style, grid);
                    }
                }
            }
        }

        // X legend labels
        if let Some((legend, face, color, _)) = &x_legend {
            let axis = match &self.xaxis {
                Some(a) if a.width > 0 => Some((a.width, ctx.paint(&a.color)?)),
                _ => None,
            };
            let anchor = Anchor { h: HAnchor::Middle, v: VAnchor::Top };
            for &t in &times {
                let x = scale.x(t);
                if !scale.contains_x(x) {
                    continue;
                }
                let text = format_time(t, &legend.format)?;
                match legend.position {
                    XLegendPosition::Bottom => {
                        if let Some((w, c)) = axis {
                            ctx.surface.line(x, base, x, base - x_tick_width, w, c);
                        }
                        draw_label(ctx.surface, face, &text, x, base + x_tick_width + 2, anchor, *color);
                    }
                    XLegendPosition::Top => {
                        if let Some((w, c)) = axis {
                            ctx.surface.line(x, area.y, x, area.y + x_tick_width, w, c);
                        }
                        draw_label(ctx.surface, face, &text, x, y_start, anchor, *color);
                    }
                }
            }
        }

        // Data
        for series in &prepared {
            let config = series.config;
            let line = ctx.paint(&config.color)?;
            let point = ctx.paint(&config.point_color)?;
            let mut all_points = Vec::new();
            for segment in &series.segments {
                let points: Vec<(f32, f32)> = segment
                    .iter()
                    .map(|&(t, v)| (scale.x(t) as f32, scale.y(v) as f32))
                    .collect();
                all_points.extend(points.iter().copied());
                if points.len() < 2 {
                    continue;
                }
                let path = match config.line_style {
                    LineStyle::Step => self::step(&points),
                    LineStyle::Linear if config.smooth => smooth(&points, config.smooth_steps),
                    LineStyle::Linear => points,
                };
                let centers: Vec<(f32, f32)> = path.iter().map(|&(x, y)| (x + 0.5, y + 0.5)).collect();
                ctx.surface.polyline(&centers, config.width, line);
            }
            if config.show_points {
                for (x, y) in all_points {
                    ctx.surface
                        .fill_disc(x + 0.5, y + 0.5, config.point_size.max(0) as f32, point);
                }
            }
        }

        Ok(cursor)
    }
}
