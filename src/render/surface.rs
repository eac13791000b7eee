//! Drawing surface and raster primitives.
//!
//! The [`Surface`] stores one [`Paint`] per pixel: either a literal color or
//! a halftone request that the dithering pass resolves later. All element
//! renderers draw through the primitives here.
//!
//! ## Conventions
//!
//! - Boxes are half-open: `fill_rect(0, 0, 10, 10)` covers 100 pixels.
//! - Lines include both end points.
//! - Drawing outside the surface is silently clipped.
//! - Every in-bounds write updates the *ink bottom*, the lowest row touched
//!   since [`Surface::begin_element`]. Auto-positioned elements feed it to the cursor.

use crate::color::Paint;

// ============================================================================
// SURFACE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    buf: Vec<Paint>,
    ink_bottom: Option<i32>,
}

impl Surface {
    pub fn new(width: u32, height: u32, background: Paint) -> Self {
        Self {
            width,
            height,
            buf: vec![background; width as usize * height as usize],
            ink_bottom: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Paint> {
        self.index(x, y).map(|i| self.buf[i])
    }

    /// Write a single pixel, ignoring coordinates outside the surface.
    #[inline]
    pub fn put(&mut self, x: i32, y: i32, paint: Paint) {
        if let Some(i) = self.index(x, y) {
            self.buf[i] = paint;
            if self.ink_bottom.is_none_or(|b| y > b) {
                self.ink_bottom = Some(y);
            }
        }
    }

    /// Reset ink tracking before an element draws.
    pub fn begin_element(&mut self) {
        self.ink_bottom = None;
    }

    /// Lowest row written since the last [`Surface::begin_element`].
    pub fn ink_bottom(&self) -> Option<i32> {
        self.ink_bottom
    }

    pub fn pixels(&self) -> &[Paint] {
        &self.buf
    }

    /// Rotate counter-clockwise by a multiple of 90 degrees.
    ///
    /// Returns `None` for any other angle.
    pub fn rotated(&self, degrees: i32) -> Option<Surface> {
        let (w, h) = (self.width as usize, self.height as usize);
        let (nw, nh) = match degrees.rem_euclid(360) {
            0 | 180 => (w, h),
            90 | 270 => (h, w),
            _ => return None,
        };
        if degrees.rem_euclid(360) == 0 {
            return Some(self.clone());
        }
        let mut buf = vec![Paint::WHITE; w * h];
        for y in 0..h {
            for x in 0..w {
                let (nx, ny) = match degrees.rem_euclid(360) {
                    90 => (y, w - 1 - x),
                    180 => (w - 1 - x, h - 1 - y),
                    _ => (h - 1 - y, x),
                };
                buf[ny * nw + nx] = self.buf[y * w + x];
            }
        }
        Some(Surface {
            width: nw as u32,
            height: nh as u32,
            buf,
            ink_bottom: None,
        })
    }

    // ========================================================================
    // FILLS
    // ========================================================================

    /// Fill the half-open box `[x0, x1) x [y0, y1)`.
    pub fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, paint: Paint) {
        let x0 = x0.max(0);
        let y0 = y0.max(0);
        let x1 = x1.min(self.width as i32);
        let y1 = y1.min(self.height as i32);
        for y in y0..y1 {
            for x in x0..x1 {
                self.put(x, y, paint);
            }
        }
    }

    /// Paint every pixel of the box whose center satisfies `inside`.
    ///
    /// `inside` receives pixel-center coordinates (`x + 0.5`, `y + 0.5`).
    pub fn fill_where<F>(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, paint: Paint, inside: F)
    where
        F: Fn(f32, f32) -> bool,
    {
        let x0 = x0.max(0);
        let y0 = y0.max(0);
        let x1 = x1.min(self.width as i32);
        let y1 = y1.min(self.height as i32);
        for y in y0..y1 {
            for x in x0..x1 {
                if inside(x as f32 + 0.5, y as f32 + 0.5) {
                    self.put(x, y, paint);
                }
            }
        }
    }

    /// Filled disc around a pixel-center point.
    pub fn fill_disc(&mut self, cx: f32, cy: f32, radius: f32, paint: Paint) {
        let r = radius.ceil() as i32 + 1;
        let (x, y) = (cx.floor() as i32, cy.floor() as i32);
        self.fill_where(x - r, y - r, x + r + 1, y + r + 1, paint, |px, py| {
            (px - cx).powi(2) + (py - cy).powi(2) <= radius * radius
        });
    }

    // ========================================================================
    // LINES
    // ========================================================================

    /// Straight line between two pixels, both included.
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, width: u32, paint: Paint) {
        if width == 0 {
            return;
        }
        if width == 1 {
            for (x, y) in line_pixels(x0, y0, x1, y1) {
                self.put(x, y, paint);
            }
            return;
        }
        let w = width as i32;
        let before = (w - 1) / 2;
        if y0 == y1 {
            let (a, b) = (x0.min(x1), x0.max(x1));
            self.fill_rect(a, y0 - before, b + 1, y0 - before + w, paint);
        } else if x0 == x1 {
            let (a, b) = (y0.min(y1), y0.max(y1));
            self.fill_rect(x0 - before, a, x0 - before + w, b + 1, paint);
        } else {
            self.thick_segment(
                x0 as f32 + 0.5,
                y0 as f32 + 0.5,
                x1 as f32 + 0.5,
                y1 as f32 + 0.5,
                width as f32,
                paint,
            );
        }
    }

    /// Thick segment between pixel-center points, with round caps.
    pub fn thick_segment(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, thickness: f32, paint: Paint) {
        let dx = x1 - x0;
        let dy = y1 - y0;
        let len_sq = dx * dx + dy * dy;
        let half = thickness / 2.0;
        if len_sq < 1e-6 {
            self.fill_disc(x0, y0, half, paint);
            return;
        }

        let min_x = (x0.min(x1) - half - 1.0).floor() as i32;
        let max_x = (x0.max(x1) + half + 1.0).ceil() as i32;
        let min_y = (y0.min(y1) - half - 1.0).floor() as i32;
        let max_y = (y0.max(y1) + half + 1.0).ceil() as i32;

        self.fill_where(min_x, min_y, max_x, max_y, paint, |px, py| {
            let t = (((px - x0) * dx + (py - y0) * dy) / len_sq).clamp(0.0, 1.0);
            let cx = x0 + t * dx;
            let cy = y0 + t * dy;
            (px - cx).powi(2) + (py - cy).powi(2) <= half * half
        });
    }

    /// Dashed line. The dash phase starts at `(x0, y0)`: the first
    /// `dash` pixels are drawn, the next `space` skipped, and so on.
    #[allow(clippy::too_many_arguments)]
    pub fn dashed_line(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        width: u32,
        dash: u32,
        space: u32,
        paint: Paint,
    ) {
        if dash == 0 {
            return;
        }
        if space == 0 {
            self.line(x0, y0, x1, y1, width, paint);
            return;
        }
        let period = (dash + space) as usize;
        let pixels = line_pixels(x0, y0, x1, y1);

        if width <= 1 {
            for (i, (x, y)) in pixels.into_iter().enumerate() {
                if i % period < dash as usize {
                    self.put(x, y, paint);
                }
            }
            return;
        }

        // Thick dashes: draw each run of "on" pixels as one segment.
        let mut start = 0;
        while start < pixels.len() {
            let end = (start + dash as usize).min(pixels.len()) - 1;
            let (ax, ay) = pixels[start];
            let (bx, by) = pixels[end];
            self.line(ax, ay, bx, by, width, paint);
            start += period;
        }
    }

    /// Connected polyline through pixel-center points.
    pub fn polyline(&mut self, points: &[(f32, f32)], width: u32, paint: Paint) {
        if width == 0 {
            return;
        }
        if points.len() == 1 {
            let (x, y) = points[0];
            self.fill_disc(x, y, (width as f32 / 2.0).max(0.5), paint);
            return;
        }
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if width == 1 {
                self.line(
                    a.0.floor() as i32,
                    a.1.floor() as i32,
                    b.0.floor() as i32,
                    b.1.floor() as i32,
                    1,
                    paint,
                );
            } else {
                self.thick_segment(a.0, a.1, b.0, b.1, width as f32, paint);
            }
        }
    }

    // ========================================================================
    // MASKS
    // ========================================================================

    /// Paint the set bits of a mask with its origin at `(x, y)`.
    pub fn blit_mask(&mut self, mask: &Mask, x: i32, y: i32, paint: Paint) {
        for (mx, my) in mask.set_bits() {
            self.put(x + mx, y + my, paint);
        }
    }

    /// Paint a mask dilated by `radius` pixels (text outline).
    pub fn blit_mask_dilated(&mut self, mask: &Mask, x: i32, y: i32, radius: u32, paint: Paint) {
        let r = radius as i32;
        for (mx, my) in mask.set_bits() {
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx * dx + dy * dy <= r * r {
                        self.put(x + mx + dx, y + my + dy, paint);
                    }
                }
            }
        }
    }
}

/// Pixels of a Bresenham line from `(x0, y0)` to `(x1, y1)`, in order.
pub fn line_pixels(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<(i32, i32)> {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);
    let mut out = Vec::with_capacity((dx - dy) as usize + 1);
    loop {
        out.push((x, y));
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    out
}

// ============================================================================
// MASK
// ============================================================================

/// A 1-bit coverage map, e.g. a rasterized line of text or an icon glyph.
///
/// `left`/`top` place the map relative to the drawing origin, which lets
/// glyphs with negative bearings extend left of or above the pen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    pub width: u32,
    pub height: u32,
    pub left: i32,
    pub top: i32,
    bits: Vec<bool>,
}

impl Mask {
    pub fn new(width: u32, height: u32, left: i32, top: i32) -> Self {
        Self {
            width,
            height,
            left,
            top,
            bits: vec![false; width as usize * height as usize],
        }
    }

    /// Build from a luma image, treating dark pixels as set.
    pub fn from_luma(image: &image::GrayImage) -> Self {
        let mut mask = Mask::new(image.width(), image.height(), 0, 0);
        for (x, y, px) in image.enumerate_pixels() {
            if px.0[0] < 128 {
                mask.set(x as i32, y as i32);
            }
        }
        mask
    }

    /// Set a bit by coordinates relative to the origin (not the map corner).
    pub fn set(&mut self, x: i32, y: i32) {
        let (mx, my) = (x - self.left, y - self.top);
        if mx >= 0 && my >= 0 && (mx as u32) < self.width && (my as u32) < self.height {
            self.bits[my as usize * self.width as usize + mx as usize] = true;
        }
    }

    pub fn get(&self, x: i32, y: i32) -> bool {
        let (mx, my) = (x - self.left, y - self.top);
        mx >= 0
            && my >= 0
            && (mx as u32) < self.width
            && (my as u32) < self.height
            && self.bits[my as usize * self.width as usize + mx as usize]
    }

    pub fn is_blank(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }

    /// Origin-relative coordinates of every set bit.
    pub fn set_bits(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let w = self.width as usize;
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(move |(i, _)| ((i % w) as i32 + self.left, (i / w) as i32 + self.top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn count(surface: &Surface, paint: Paint) -> usize {
        surface.pixels().iter().filter(|p| **p == paint).count()
    }

    #[test]
    fn test_fill_rect_is_half_open() {
        let mut s = Surface::new(20, 20, Paint::WHITE);
        s.fill_rect(0, 0, 10, 10, Paint::BLACK);
        assert_eq!(count(&s, Paint::BLACK), 100);
        assert_eq!(s.get(9, 9), Some(Paint::BLACK));
        assert_eq!(s.get(10, 10), Some(Paint::WHITE));
        assert_eq!(s.ink_bottom(), Some(9));
    }

    #[test]
    fn test_clipping() {
        let mut s = Surface::new(4, 4, Paint::WHITE);
        s.fill_rect(-5, -5, 100, 2, Paint::BLACK);
        assert_eq!(count(&s, Paint::BLACK), 8);
        s.put(-1, 10, Paint::BLACK);
        assert_eq!(s.ink_bottom(), Some(1));
    }

    #[test]
    fn test_line_includes_endpoints() {
        let mut s = Surface::new(10, 10, Paint::WHITE);
        s.line(1, 1, 6, 1, 1, Paint::BLACK);
        assert_eq!(count(&s, Paint::BLACK), 6);
        let mut s = Surface::new(10, 10, Paint::WHITE);
        s.line(2, 2, 2, 7, 2, Paint::BLACK);
        assert_eq!(count(&s, Paint::BLACK), 12);
    }

    #[test]
    fn test_dashed_phase_starts_at_origin() {
        let mut s = Surface::new(20, 1, Paint::WHITE);
        s.dashed_line(0, 0, 19, 0, 1, 5, 3, Paint::BLACK);
        let row: Vec<bool> = (0..20).map(|x| s.get(x, 0) == Some(Paint::BLACK)).collect();
        let expected: Vec<bool> = (0..20).map(|x| x % 8 < 5).collect();
        assert_eq!(row, expected);
    }

    #[test]
    fn test_rotation_ccw() {
        let red = Paint::Solid(Rgb([255, 0, 0]));
        // 3x2 surface with a red top-left pixel
        let mut s = Surface::new(3, 2, Paint::WHITE);
        s.put(0, 0, red);
        let r90 = s.rotated(90).unwrap();
        assert_eq!((r90.width(), r90.height()), (2, 3));
        // Top-left goes to bottom-left when turning counter-clockwise
        assert_eq!(r90.get(0, 2), Some(red));
        let r270 = s.rotated(270).unwrap();
        assert_eq!(r270.get(1, 0), Some(red));
        let r180 = s.rotated(180).unwrap();
        assert_eq!(r180.get(2, 1), Some(red));
        assert!(s.rotated(45).is_none());
    }

    #[test]
    fn test_mask_blit_and_dilate() {
        let mut mask = Mask::new(3, 3, -1, -1);
        mask.set(0, 0);
        let mut s = Surface::new(10, 10, Paint::WHITE);
        s.blit_mask_dilated(&mask, 5, 5, 1, Paint::BLACK);
        assert_eq!(count(&s, Paint::BLACK), 5);
        assert_eq!(mask.set_bits().collect::<Vec<_>>(), vec![(0, 0)]);
    }
}
