//! # Drawing Elements
//!
//! A payload is a JSON list of elements, each tagged by `"type"`:
//!
//! ```json
//! [
//!   {"type": "text", "x": 10, "value": "Kitchen", "size": 24},
//!   {"type": "text", "x": 10, "value": "21.5 °C", "color": "accent"},
//!   {"type": "line", "x_start": 0, "x_end": "100%"},
//!   {"type": "rectangle", "x_start": 0, "y_start": 0, "x_end": 10, "y_end": 10, "fill": "black"}
//! ]
//! ```
//!
//! Every element is parsed on its own, so one malformed entry fails alone
//! and the rest of the payload still renders. Each element kind implements
//! [`Render`], which draws into the [`DrawContext`] and threads the
//! auto-positioning [`Cursor`] through.
//!
//! ## Element Types
//!
//! | Tag | Type | Module |
//! |-----|------|--------|
//! | `text`, `multiline` | [`Text`], [`Multiline`] | [`text`] |
//! | `line`, `rectangle`, `rectangle_pattern`, `polygon`, `circle`, `ellipse`, `arc` | shapes | [`shapes`] |
//! | `icon`, `icon_sequence` | [`Icon`], [`IconSequence`] | [`icon`] |
//! | `dlimg`, `qrcode` | [`Image`], [`QrCode`] | [`media`] |
//! | `plot` | [`Plot`] | [`crate::plot`] |
//! | `progress_bar` | [`ProgressBar`] | [`progress`] |
//! | `diagram` | [`Diagram`] | [`diagram`] |
//! | `debug_grid` | [`DebugGrid`] | [`debug`] |

pub mod anchor;
pub mod debug;
pub mod diagram;
pub mod icon;
pub mod markup;
pub mod media;
pub mod progress;
pub mod shapes;
pub mod text;

pub use anchor::Anchor;
pub use debug::DebugGrid;
pub use diagram::Diagram;
pub use icon::{GlyphCatalog, Icon, IconSequence, MdiCatalog, NoGlyphs, StaticCatalog};
pub use media::{Image, QrCode};
pub use progress::ProgressBar;
pub use shapes::{Arc, Circle, Ellipse, Line, Polygon, Rectangle, RectanglePattern};
pub use text::{Multiline, Text};

pub use crate::plot::Plot;

use std::sync::Arc as Shared;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

use crate::color::{ColorRef, Paint};
use crate::coords::{Coord, Cursor};
use crate::display::AccentColor;
use crate::error::{ElementError, WarningKind};
use crate::font::{DEFAULT_FONT, Face, FontResolver};
use crate::render::{RenderInputs, Surface};

// ============================================================================
// RENDER TRAIT
// ============================================================================

/// A drawing element.
pub trait Render {
    /// Fields that must be present in the payload object.
    const REQUIRED: &'static [&'static str];

    /// Draw into the context and return the cursor for the next element.
    fn render(&self, ctx: &mut DrawContext<'_>, cursor: Cursor) -> Result<Cursor, ElementError>;
}

/// Everything an element may read or write while drawing.
pub struct DrawContext<'a> {
    pub surface: &'a mut Surface,
    pub accent: AccentColor,
    pub fonts: &'a FontResolver,
    pub glyphs: &'a dyn GlyphCatalog,
    pub inputs: &'a RenderInputs,
    /// End of plot windows
    pub now: DateTime<FixedOffset>,
    notes: Vec<(WarningKind, String)>,
}

impl<'a> DrawContext<'a> {
    pub fn new(
        surface: &'a mut Surface,
        accent: AccentColor,
        fonts: &'a FontResolver,
        glyphs: &'a dyn GlyphCatalog,
        inputs: &'a RenderInputs,
        now: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            surface,
            accent,
            fonts,
            glyphs,
            inputs,
            now,
            notes: Vec::new(),
        }
    }

    /// Canvas width in layout orientation.
    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    /// Resolve a coordinate on the horizontal axis.
    pub fn x(&self, coord: &Coord) -> Result<i32, ElementError> {
        coord.resolve(self.width())
    }

    /// Resolve a coordinate on the vertical axis.
    pub fn y(&self, coord: &Coord) -> Result<i32, ElementError> {
        coord.resolve(self.height())
    }

    pub fn paint(&self, color: &ColorRef) -> Result<Paint, ElementError> {
        color.resolve(self.accent)
    }

    /// Resolve an optional color; `None` means "do not draw".
    pub fn paint_opt(&self, color: Option<&ColorRef>) -> Result<Option<Paint>, ElementError> {
        color.map(|c| self.paint(c)).transpose()
    }

    /// Largest font size an element may ask for: four times the longer side.
    pub fn max_font_size(&self) -> u32 {
        self.width().max(self.height()).saturating_mul(4)
    }

    /// Reject glyph sizes beyond [`DrawContext::max_font_size`].
    pub fn check_size(&self, size: u32) -> Result<u32, ElementError> {
        let max = self.max_font_size();
        if size > max {
            return Err(ElementError::InvalidValue(format!(
                "size {} exceeds {} for a {}x{} canvas",
                size,
                max,
                self.width(),
                self.height()
            )));
        }
        Ok(size)
    }

    /// Look up a font, recording a warning if it fell back.
    pub fn font(&mut self, name: Option<&str>, size: u32) -> Result<Shared<Face>, ElementError> {
        let size = self.check_size(size)?;
        let resolution = self.fonts.resolve(name.unwrap_or(DEFAULT_FONT), size);
        if let Some(warning) = resolution.warning {
            self.note(WarningKind::FontFallback, warning);
        }
        Ok(resolution.face)
    }

    /// Record a non-fatal problem for the element being drawn.
    pub fn note(&mut self, kind: WarningKind, message: String) {
        self.notes.push((kind, message));
    }

    pub fn take_notes(&mut self) -> Vec<(WarningKind, String)> {
        std::mem::take(&mut self.notes)
    }
}

// ============================================================================
// ELEMENT ENUM
// ============================================================================

macro_rules! define_elements {
    ($($variant:ident => $tag:literal),+ $(,)?) => {
        /// One drawing instruction of a payload.
        #[derive(Debug, Clone, Deserialize)]
        #[serde(tag = "type")]
        pub enum Element {
            $(
                #[serde(rename = $tag)]
                $variant($variant),
            )+
        }

        /// All element type tags.
        pub const ELEMENT_TYPES: &[&str] = &[$($tag),+];

        impl Element {
            /// The `"type"` tag of this element.
            pub fn kind(&self) -> &'static str {
                match self {
                    $(Element::$variant(_) => $tag,)+
                }
            }

            fn required_fields(tag: &str) -> Option<&'static [&'static str]> {
                match tag {
                    $($tag => Some(<$variant as Render>::REQUIRED),)+
                    _ => None,
                }
            }

            pub fn render(
                &self,
                ctx: &mut DrawContext<'_>,
                cursor: Cursor,
            ) -> Result<Cursor, ElementError> {
                match self {
                    $(Element::$variant(e) => e.render(ctx, cursor),)+
                }
            }
        }
    };
}

define_elements! {
    Text => "text",
    Multiline => "multiline",
    Line => "line",
    Rectangle => "rectangle",
    RectanglePattern => "rectangle_pattern",
    Polygon => "polygon",
    Circle => "circle",
    Ellipse => "ellipse",
    Arc => "arc",
    Icon => "icon",
    IconSequence => "icon_sequence",
    Image => "dlimg",
    QrCode => "qrcode",
    Plot => "plot",
    ProgressBar => "progress_bar",
    Diagram => "diagram",
    DebugGrid => "debug_grid",
}

impl Element {
    /// Parse one payload entry.
    ///
    /// Returns `Ok(None)` for invisible elements, which are skipped without
    /// validation.
    pub fn parse(value: &Value) -> Result<Option<Element>, ElementError> {
        let Some(map) = value.as_object() else {
            return Err(ElementError::InvalidValue(
                "element must be a JSON object".to_string(),
            ));
        };
        if !is_visible(map.get("visible")) {
            return Ok(None);
        }

        let kind = match map.get("type") {
            Some(Value::String(kind)) => kind.as_str(),
            Some(other) => {
                return Err(ElementError::InvalidValue(format!(
                    "element type must be a string, got {}",
                    other
                )));
            }
            None => {
                return Err(ElementError::MissingRequiredField {
                    element: "element".to_string(),
                    field: "type".to_string(),
                });
            }
        };
        let required = Element::required_fields(kind)
            .ok_or_else(|| ElementError::UnknownElement(kind.to_string()))?;
        if let Some(field) = required.iter().find(|f| !map.contains_key(**f)) {
            return Err(ElementError::MissingRequiredField {
                element: kind.to_string(),
                field: field.to_string(),
            });
        }

        Element::deserialize(value)
            .map(Some)
            .map_err(|e| ElementError::InvalidField {
                element: kind.to_string(),
                message: e.to_string(),
            })
    }
}

/// The `"type"` tag of a raw payload entry, if any.
pub fn kind_of(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

pub(crate) fn is_visible(flag: Option<&Value>) -> bool {
    match flag {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(Value::String(s)) => !matches!(s.to_ascii_lowercase().as_str(), "false" | "0" | ""),
        Some(Value::Null) | None => true,
        Some(_) => true,
    }
}

// ============================================================================
// SHARED DESERIALIZERS
// ============================================================================

pub(crate) fn default_true() -> bool {
    true
}

/// Accept strings, numbers and booleans as text.
pub(crate) fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!("expected text, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_text_element() {
        let el = Element::parse(&json!({"type": "text", "x": 5, "value": 42}))
            .unwrap()
            .unwrap();
        assert_eq!(el.kind(), "text");
        match el {
            Element::Text(t) => assert_eq!(t.value, "42"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invisible_element_skips_validation() {
        assert!(Element::parse(&json!({"type": "text", "visible": false}))
            .unwrap()
            .is_none());
        assert!(Element::parse(&json!({"type": "bogus", "visible": "false"}))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_missing_required_field() {
        assert_eq!(
            Element::parse(&json!({"type": "rectangle", "x_start": 0, "x_end": 4, "y_start": 0}))
                .unwrap_err(),
            ElementError::MissingRequiredField {
                element: "rectangle".into(),
                field: "y_end".into()
            }
        );
    }

    #[test]
    fn test_missing_and_unknown_type() {
        assert!(matches!(
            Element::parse(&json!({"x": 1})),
            Err(ElementError::MissingRequiredField { .. })
        ));
        assert_eq!(
            Element::parse(&json!({"type": "hologram"})).unwrap_err(),
            ElementError::UnknownElement("hologram".into())
        );
        assert!(Element::parse(&json!("text")).is_err());
    }

    #[test]
    fn test_invalid_field_type() {
        let err = Element::parse(&json!({"type": "line", "x_start": 0, "x_end": 5, "width": "wide"}))
            .unwrap_err();
        assert!(matches!(err, ElementError::InvalidField { ref element, .. } if element == "line"));
    }

    #[test]
    fn test_every_tag_is_known() {
        for tag in ELEMENT_TYPES {
            assert!(Element::required_fields(tag).is_some(), "{}", tag);
        }
    }
}
