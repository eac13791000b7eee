//! # Coordinate Resolver
//!
//! Payload positions are absolute pixels or percentages of the canvas:
//!
//! ```text
//! 42          -> 42 px
//! "42"        -> 42 px
//! "50%"       -> round(0.50 * axis_length)
//! ```
//!
//! x-axes resolve against the canvas width, y-axes against the height.
//!
//! ## Auto-positioning
//!
//! Text, Multiline and Line may omit their y coordinate. They are then
//! placed `y_padding` rows below the [`Cursor`], which tracks the lowest row
//! inked by the previous auto-positioned element. The cursor is an explicit
//! value: renderers receive it and return the next one.

use serde::Deserialize;

use crate::error::ElementError;

/// A coordinate or length as written in a payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Coord {
    Px(f64),
    Text(String),
}

impl Coord {
    pub fn px(value: i32) -> Self {
        Coord::Px(value as f64)
    }

    /// Resolve against the length of the relevant canvas axis.
    pub fn resolve(&self, axis_len: u32) -> Result<i32, ElementError> {
        resolve_axis(self, axis_len)
    }
}

impl From<i32> for Coord {
    fn from(value: i32) -> Self {
        Coord::px(value)
    }
}

/// Convert a coordinate to pixels on an axis of `axis_len` pixels.
pub fn resolve_axis(value: &Coord, axis_len: u32) -> Result<i32, ElementError> {
    match value {
        Coord::Px(px) if px.is_finite() => Ok(px.round() as i32),
        Coord::Px(px) => Err(ElementError::InvalidCoordinate(px.to_string())),
        Coord::Text(text) => {
            let trimmed = text.trim();
            let invalid = || ElementError::InvalidCoordinate(text.clone());
            if let Some(pct) = trimmed.strip_suffix('%') {
                if axis_len == 0 {
                    return Err(invalid());
                }
                let pct: f64 = pct.trim().parse().map_err(|_| invalid())?;
                if !pct.is_finite() {
                    return Err(invalid());
                }
                Ok((pct / 100.0 * axis_len as f64).round() as i32)
            } else {
                let px: f64 = trimmed.parse().map_err(|_| invalid())?;
                if !px.is_finite() {
                    return Err(invalid());
                }
                Ok(px.round() as i32)
            }
        }
    }
}

/// Resolve an optional coordinate, falling back to `default`.
pub fn resolve_or(value: Option<&Coord>, axis_len: u32, default: i32) -> Result<i32, ElementError> {
    value.map_or(Ok(default), |v| resolve_axis(v, axis_len))
}

/// Position where the next auto-positioned element starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Lowest row inked so far by auto-positioned elements
    pub y: i32,
}

impl Cursor {
    pub fn new(y: i32) -> Self {
        Self { y }
    }

    /// Choose the y of an element: the explicit value, or `y_padding` below
    /// the cursor. The flag reports whether auto-positioning was used.
    pub fn place(self, explicit: Option<i32>, y_padding: i32) -> (i32, bool) {
        match explicit {
            Some(y) => (y, false),
            None => (self.y + y_padding, true),
        }
    }

    /// Move down to `ink_bottom`. The cursor never moves up.
    pub fn advance(self, ink_bottom: Option<i32>) -> Self {
        match ink_bottom {
            Some(bottom) if bottom > self.y => Self { y: bottom },
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Coord {
        Coord::Text(s.to_string())
    }

    #[test]
    fn test_absolute_pixels() {
        assert_eq!(resolve_axis(&Coord::Px(12.0), 100), Ok(12));
        assert_eq!(resolve_axis(&Coord::Px(12.6), 100), Ok(13));
        assert_eq!(resolve_axis(&text(" 7 "), 100), Ok(7));
        assert_eq!(resolve_axis(&Coord::Px(-3.0), 100), Ok(-3));
    }

    #[test]
    fn test_percentages_round() {
        assert_eq!(resolve_axis(&text("50%"), 296), Ok(148));
        // 33% of 128 = 42.24
        assert_eq!(resolve_axis(&text("33%"), 128), Ok(42));
        // 25% of 38 = 9.5, rounds away from zero
        assert_eq!(resolve_axis(&text("25%"), 38), Ok(10));
        assert_eq!(resolve_axis(&text("100%"), 128), Ok(128));
    }

    #[test]
    fn test_invalid_coordinates() {
        assert_eq!(
            resolve_axis(&text("left"), 100),
            Err(ElementError::InvalidCoordinate("left".into()))
        );
        assert!(resolve_axis(&text("%"), 100).is_err());
        assert!(resolve_axis(&text("50%"), 0).is_err());
        assert!(resolve_axis(&Coord::Px(f64::NAN), 10).is_err());
    }

    #[test]
    fn test_deserialize_forms() {
        let coords: Vec<Coord> = serde_json::from_str(r#"[10, 2.5, "10%", "4"]"#).unwrap();
        assert_eq!(coords[0], Coord::Px(10.0));
        assert_eq!(coords[2], text("10%"));
    }

    #[test]
    fn test_cursor_place_and_advance() {
        let cursor = Cursor::new(20);
        assert_eq!(cursor.place(None, 10), (30, true));
        assert_eq!(cursor.place(Some(5), 10), (5, false));
        assert_eq!(cursor.advance(Some(44)).y, 44);
        assert_eq!(cursor.advance(Some(3)).y, 20);
        assert_eq!(cursor.advance(None).y, 20);
    }
}
