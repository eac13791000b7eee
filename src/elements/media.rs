//! Raster elements: downloaded images (`dlimg`) and QR codes.
//!
//! Images are never fetched here. The caller resolves every URL up front
//! (see [`crate::resolve`]) and passes the decoded pixels in
//! [`RenderInputs::images`](crate::render::RenderInputs).

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use qrcode::{Color as Module, QrCode as QrSymbol};
use serde::Deserialize;

use super::{DrawContext, Render, deserialize_text};
use crate::color::{ColorRef, Paint};
use crate::coords::{Coord, Cursor};
use crate::error::ElementError;

/// Pixels with less alpha than this leave the surface untouched.
const ALPHA_CUTOFF: u8 = 128;

// ============================================================================
// IMAGE
// ============================================================================

/// How a source image is fitted into `xsize` x `ysize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMethod {
    /// Scale both axes independently
    #[default]
    Stretch,
    /// Center crop without scaling
    Crop,
    /// Scale to cover the target, then center crop
    Cover,
    /// Scale to fit inside the target, padding with transparency
    Contain,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub x: Coord,
    pub y: Coord,
    pub url: String,
    pub xsize: Coord,
    pub ysize: Coord,
    /// Clockwise, in multiples of 90 degrees
    #[serde(default)]
    pub rotate: i32,
    #[serde(default)]
    pub resize_method: ResizeMethod,
}

/// Rotate clockwise by a multiple of 90 degrees.
fn rotate_cw(image: &RgbaImage, degrees: i32) -> Result<RgbaImage, ElementError> {
    Ok(match degrees.rem_euclid(360) {
        0 => image.clone(),
        90 => imageops::rotate90(image),
        180 => imageops::rotate180(image),
        270 => imageops::rotate270(image),
        _ => {
            return Err(ElementError::InvalidValue(format!(
                "image rotation must be a multiple of 90, got {}",
                degrees
            )));
        }
    })
}

fn center_crop(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let w = width.min(image.width());
    let h = height.min(image.height());
    let x = (image.width() - w) / 2;
    let y = (image.height() - h) / 2;
    imageops::crop_imm(image, x, y, w, h).to_image()
}

/// Fit an image into `width` x `height` with the given method.
pub fn fit(image: &RgbaImage, width: u32, height: u32, method: ResizeMethod) -> RgbaImage {
    let (sw, sh) = (image.width().max(1) as f64, image.height().max(1) as f64);
    let fitted = match method {
        ResizeMethod::Stretch => image.clone(),
        ResizeMethod::Crop => center_crop(image, width, height),
        ResizeMethod::Cover => {
            let scale = (width as f64 / sw).max(height as f64 / sh);
            let (nw, nh) = ((sw * scale).ceil() as u32, (sh * scale).ceil() as u32);
            let scaled = imageops::resize(image, nw.max(width), nh.max(height), FilterType::Triangle);
            center_crop(&scaled, width, height)
        }
        ResizeMethod::Contain => {
            let scale = (width as f64 / sw).min(height as f64 / sh);
            let (nw, nh) = (
                ((sw * scale).round() as u32).clamp(1, width),
                ((sh * scale).round() as u32).clamp(1, height),
            );
            let scaled = imageops::resize(image, nw, nh, FilterType::Triangle);
            let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 0]));
            imageops::overlay(&mut canvas, &scaled, ((width - nw) / 2) as i64, ((height - nh) / 2) as i64);
            canvas
        }
    };
    if fitted.dimensions() == (width, height) {
        fitted
    } else {
        imageops::resize(&fitted, width, height, FilterType::Triangle)
    }
}

/// Composite a pixel over white.
fn over_white(px: Rgba<u8>) -> Paint {
    let [r, g, b, a] = px.0;
    let a = a as u32;
    let mix = |c: u8| ((c as u32 * a + 255 * (255 - a)) / 255) as u8;
    Paint::Solid(image::Rgb([mix(r), mix(g), mix(b)]))
}

impl Render for Image {
    const REQUIRED: &'static [&'static str] = &["x", "y", "url", "xsize", "ysize"];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        let (x, y) = (ctx.x(&self.x)?, ctx.y(&self.y)?);
        let (w, h) = (ctx.x(&self.xsize)?, ctx.y(&self.ysize)?);
        if w <= 0 || h <= 0 {
            return Err(ElementError::InvalidValue(format!("image size {}x{} is empty", w, h)));
        }
        let source = ctx
            .inputs
            .images
            .get(&self.url)
            .ok_or_else(|| {
                let reason = match ctx.inputs.failed.get(&self.url) {
                    Some(reason) => format!("image '{}': {}", self.url, reason),
                    None => format!("image '{}'", self.url),
                };
                ElementError::AssetLookupFailure(reason)
            })?;

        let rotated = rotate_cw(source, self.rotate)?;
        let fitted = fit(&rotated, w as u32, h as u32, self.resize_method);
        for (px, py, pixel) in fitted.enumerate_pixels() {
            if pixel.0[3] >= ALPHA_CUTOFF {
                ctx.surface.put(x + px as i32, y + py as i32, over_white(*pixel));
            }
        }
        Ok(cursor)
    }
}

// ============================================================================
// QR CODE
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct QrCode {
    pub x: Coord,
    pub y: Coord,
    #[serde(deserialize_with = "deserialize_text")]
    pub data: String,
    #[serde(default = "ColorRef::black")]
    pub color: ColorRef,
    #[serde(default = "ColorRef::white")]
    pub bgcolor: ColorRef,
    /// Quiet zone, in modules
    #[serde(default = "default_border")]
    pub border: u32,
    /// Pixels per module
    #[serde(default = "default_boxsize")]
    pub boxsize: u32,
}

fn default_border() -> u32 {
    1
}

fn default_boxsize() -> u32 {
    2
}

/// Module matrix of the QR symbol for `data`, row-major, `true` = dark.
pub fn qr_matrix(data: &str) -> Result<Vec<Vec<bool>>, ElementError> {
    let code = QrSymbol::new(data.as_bytes())
        .map_err(|e| ElementError::InvalidValue(format!("cannot encode QR code: {}", e)))?;
    let width = code.width();
    Ok(code
        .to_colors()
        .chunks(width)
        .map(|row| row.iter().map(|m| *m == Module::Dark).collect())
        .collect())
}

impl Render for QrCode {
    const REQUIRED: &'static [&'static str] = &["x", "y", "data"];

    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError> {
        let (x, y) = (ctx.x(&self.x)?, ctx.y(&self.y)?);
        let dark = ctx.paint(&self.color)?;
        let light = ctx.paint(&self.bgcolor)?;
        let matrix = qr_matrix(&self.data)?;

        let boxsize = self.boxsize.max(1) as i32;
        let border = self.border as i32;
        let side = (matrix.len() as i32 + 2 * border) * boxsize;
        ctx.surface.fill_rect(x, y, x + side, y + side, light);

        for (row, modules) in matrix.iter().enumerate() {
            for (col, on) in modules.iter().enumerate() {
                if *on {
                    let mx = x + (col as i32 + border) * boxsize;
                    let my = y + (row as i32 + border) * boxsize;
                    ctx.surface.fill_rect(mx, my, mx + boxsize, my + boxsize, dark);
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
    use crate::render::{RenderInputs, Surface};
    use chrono::DateTime;
    use serde_json::json;

    fn run<R: Render>(element: &R, inputs: &RenderInputs, w: u32, h: u32) -> (Result<Cursor, ElementError>, Surface) {
        let mut surface = Surface::new(w, h, Paint::WHITE);
        let fonts = FontResolver::default();
        let now = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let result = {
            let mut ctx = DrawContext::new(&mut surface, AccentColor::Red, &fonts, &NoGlyphs, inputs, now);
            element.render(&mut ctx, Cursor::default())
        };
        (result, surface)
    }

    #[test]
    fn test_qr_matrix_is_deterministic() {
        let a = qr_matrix("https://example.com/tag/42").unwrap();
        let b = qr_matrix("https://example.com/tag/42").unwrap();
        assert_eq!(a, b);
        assert!(a.len() >= 21);
        assert!(a.iter().all(|row| row.len() == a.len()));
        // Finder pattern corner is dark
        assert!(a[0][0]);
    }

    #[test]
    fn test_qr_render_size() {
        let qr: QrCode = serde_json::from_value(json!({"x": 0, "y": 0, "data": "hi", "bgcolor": "red"})).unwrap();
        let (result, surface) = run(&qr, &RenderInputs::default(), 80, 80);
        assert!(result.is_ok());
        let n = qr_matrix("hi").unwrap().len() as i32;
        let side = (n + 2) * 2;
        let red = Paint::Solid(image::Rgb([255, 0, 0]));
        // Quiet zone in background color, module area starts after it
        assert_eq!(surface.get(0, 0), Some(red));
        assert_eq!(surface.get(2, 2), Some(Paint::BLACK));
        assert_eq!(surface.get(side - 1, side - 1), Some(red));
        assert_eq!(surface.get(side, side), Some(Paint::WHITE));
    }

    #[test]
    fn test_image_missing_input() {
        let img: Image =
            serde_json::from_value(json!({"x": 0, "y": 0, "url": "http://x/a.png", "xsize": 4, "ysize": 4})).unwrap();
        let (result, _) = run(&img, &RenderInputs::default(), 10, 10);
        assert!(matches!(result, Err(ElementError::AssetLookupFailure(_))));
    }

    #[test]
    fn test_image_error_carries_fetch_reason() {
        let img: Image =
            serde_json::from_value(json!({"x": 0, "y": 0, "url": "http://x/a.png", "xsize": 4, "ysize": 4})).unwrap();
        let mut inputs = RenderInputs::default();
        inputs
            .failed
            .insert("http://x/a.png".to_string(), "failed with status 404 Not Found".to_string());
        let (result, _) = run(&img, &inputs, 10, 10);
        match result {
            Err(ElementError::AssetLookupFailure(reason)) => assert!(reason.contains("404 Not Found")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_image_alpha_threshold() {
        let mut source = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        source.put_pixel(1, 0, Rgba([0, 0, 0, 100]));
        let mut inputs = RenderInputs::default();
        inputs.images.insert("logo".to_string(), source);
        let img: Image =
            serde_json::from_value(json!({"x": 1, "y": 1, "url": "logo", "xsize": 2, "ysize": 1})).unwrap();
        let (result, surface) = run(&img, &inputs, 4, 4);
        assert!(result.is_ok());
        assert_eq!(surface.get(1, 1), Some(Paint::BLACK));
        assert_eq!(surface.get(2, 1), Some(Paint::WHITE));
    }

    #[test]
    fn test_rotate_then_fit() {
        let source = RgbaImage::from_fn(4, 2, |x, _| if x == 0 { Rgba([0, 0, 0, 255]) } else { Rgba([255, 255, 255, 255]) });
        let rotated = rotate_cw(&source, 90).unwrap();
        assert_eq!(rotated.dimensions(), (2, 4));
        // Left column moves to the top row when turning clockwise
        assert_eq!(rotated.get_pixel(0, 0).0[0], 0);
        assert_eq!(rotated.get_pixel(1, 0).0[0], 0);
        assert!(rotate_cw(&source, 45).is_err());
    }

    #[test]
    fn test_fit_methods_hit_target_size() {
        let source = RgbaImage::from_pixel(40, 20, Rgba([10, 20, 30, 255]));
        for method in [ResizeMethod::Stretch, ResizeMethod::Crop, ResizeMethod::Cover, ResizeMethod::Contain] {
            assert_eq!(fit(&source, 16, 16, method).dimensions(), (16, 16), "{:?}", method);
        }
        let contained = fit(&source, 16, 16, ResizeMethod::Contain);
        // Letterbox bands are transparent
        assert_eq!(contained.get_pixel(8, 0).0[3], 0);
        assert_eq!(contained.get_pixel(8, 8).0[3], 255);
    }
}
