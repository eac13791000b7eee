//! # Rendering Pipeline
//!
//! Turns a [`Payload`] into a palette-quantized [`Bitmap`].
//!
//! ## Stages
//!
//! | Stage | What happens |
//! |-------|--------------|
//! | Canvas | A [`Surface`] in layout orientation (width and height swapped for 90/270) filled with the background |
//! | Elements | Each payload entry is parsed and drawn in list order; failures become warnings |
//! | Rotate | The composed surface is rotated counter-clockwise into panel orientation |
//! | Quantize | [`dither::quantize`] maps every paint onto the display palette |
//!
//! ## Modules
//!
//! - [`surface`]: the paint raster and its drawing primitives
//! - [`dither`]: nearest-color, Floyd–Steinberg, Bayer and Burkes quantization
//! - [`bitmap`]: quantized output, PNG encoding and 1-bpp planes
//!
//! ## Example
//!
//! ```
//! use papertag::display::DisplayConfig;
//! use papertag::render::{Payload, RenderInputs, RenderOptions, Renderer};
//!
//! let payload = Payload::from_json(r#"[{"type": "text", "x": 2, "value": "Hi"}]"#).unwrap();
//! let output = Renderer::default()
//!     .render(&payload, &DisplayConfig::TAG_29, &RenderInputs::default(), &RenderOptions::default())
//!     .unwrap();
//! assert_eq!(output.bitmap.width(), DisplayConfig::TAG_29.width);
//! ```

pub mod bitmap;
pub mod dither;
pub mod surface;

pub use bitmap::Bitmap;
pub use dither::DitherMode;
pub use surface::{Mask, Surface};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};
use image::RgbaImage;
use rayon::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::color::ColorRef;
use crate::config::EngineConfig;
use crate::coords::Cursor;
use crate::display::DisplayConfig;
use crate::elements::{DrawContext, Element, GlyphCatalog, MdiCatalog, NoGlyphs, kind_of};
use crate::error::{PapertagError, Warning, WarningKind};
use crate::font::FontResolver;
use crate::plot::SeriesSample;

// ============================================================================
// INPUTS
// ============================================================================

/// Assets resolved before rendering.
#[derive(Debug, Clone, Default)]
pub struct RenderInputs {
    /// Decoded images keyed by the `url` of `dlimg` elements
    pub images: HashMap<String, RgbaImage>,
    /// Why an image could not be fetched, keyed by `url`
    pub failed: HashMap<String, String>,
    /// Time series keyed by entity id
    pub series: HashMap<String, Vec<SeriesSample>>,
}

impl RenderInputs {
    /// Load series from a JSON object of `{ entity: [{timestamp, value}, ...] }`.
    pub fn series_from_json(json: &str) -> Result<HashMap<String, Vec<SeriesSample>>, PapertagError> {
        serde_json::from_str(json).map_err(|e| PapertagError::InvalidPayload(format!("series: {}", e)))
    }
}

/// Per-call switches.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Fail the whole render on the first element error
    pub strict: bool,
    /// End of plot windows; the local clock when unset
    pub now: Option<DateTime<FixedOffset>>,
}

/// A drawing request.
#[derive(Debug, Clone, Deserialize)]
pub struct Payload {
    /// Raw element list; entries are parsed one by one
    #[serde(alias = "payload")]
    pub elements: Value,
    #[serde(default = "ColorRef::white")]
    pub background: ColorRef,
    /// Counter-clockwise degrees: 0, 90, 180 or 270
    #[serde(default)]
    pub rotate: i32,
    #[serde(default)]
    pub dither: DitherMode,
    #[serde(default)]
    pub dry_run: bool,
}

impl Payload {
    pub fn new(elements: Value) -> Self {
        Self {
            elements,
            background: ColorRef::white(),
            rotate: 0,
            dither: DitherMode::default(),
            dry_run: false,
        }
    }

    /// Accepts either a full request object or a bare element list.
    pub fn from_value(value: Value) -> Result<Self, PapertagError> {
        match value {
            Value::Array(_) => Ok(Payload::new(value)),
            other => serde_json::from_value(other).map_err(|e| PapertagError::InvalidPayload(e.to_string())),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PapertagError> {
        let value: Value = serde_json::from_str(json).map_err(|e| PapertagError::InvalidPayload(e.to_string()))?;
        Self::from_value(value)
    }
}

/// Result of a successful render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub bitmap: Bitmap,
    pub warnings: Vec<Warning>,
}

/// One independent job for [`Renderer::render_many`].
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub payload: Payload,
    pub display: DisplayConfig,
    pub inputs: RenderInputs,
    pub options: RenderOptions,
}

// ============================================================================
// RENDERER
// ============================================================================

/// Long-lived rendering engine: the font cache and glyph catalog are shared
/// across renders and threads.
#[derive(Clone)]
pub struct Renderer {
    fonts: Arc<FontResolver>,
    glyphs: Arc<dyn GlyphCatalog>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Arc::new(FontResolver::default()), Arc::new(NoGlyphs))
    }
}

impl Renderer {
    pub fn new(fonts: Arc<FontResolver>, glyphs: Arc<dyn GlyphCatalog>) -> Self {
        Self { fonts, glyphs }
    }

    /// Build a renderer from engine configuration, loading the icon font if
    /// one is configured.
    pub fn from_config(config: &EngineConfig) -> Result<Self, PapertagError> {
        let fonts = Arc::new(FontResolver::new(&config.fonts));
        let glyphs: Arc<dyn GlyphCatalog> = match &config.icons {
            Some(icons) => {
                let catalog = MdiCatalog::load(icons)?;
                debug!(glyphs = catalog.len(), "loaded icon catalog");
                Arc::new(catalog)
            }
            None => Arc::new(NoGlyphs),
        };
        Ok(Self::new(fonts, glyphs))
    }

    pub fn fonts(&self) -> &FontResolver {
        &self.fonts
    }

    /// Render one payload for one display.
    pub fn render(
        &self,
        payload: &Payload,
        display: &DisplayConfig,
        inputs: &RenderInputs,
        options: &RenderOptions,
    ) -> Result<RenderOutput, PapertagError> {
        if display.width == 0 || display.height == 0 {
            return Err(PapertagError::InvalidCanvas(format!(
                "{}x{} has no pixels",
                display.width, display.height
            )));
        }
        let (layout_w, layout_h) = match payload.rotate {
            0 | 180 => (display.width, display.height),
            90 | 270 => (display.height, display.width),
            other => return Err(PapertagError::InvalidRotation(other)),
        };
        let Some(entries) = payload.elements.as_array() else {
            return Err(PapertagError::InvalidPayload("elements must be a list".to_string()));
        };

        let accent = display.accent();
        let background = payload
            .background
            .resolve(accent)
            .map_err(|e| PapertagError::InvalidColor(e.to_string()))?;
        let now = options.now.unwrap_or_else(|| Local::now().fixed_offset());

        let (display_w, display_h) = (display.width, display.height);
        debug!(
            elements = entries.len(),
            width = display_w,
            height = display_h,
            rotate = payload.rotate,
            dither = %payload.dither,
            "rendering payload"
        );

        let mut surface = Surface::new(layout_w, layout_h, background);
        let mut warnings = Vec::new();
        let mut font_notes: HashSet<String> = HashSet::new();
        {
            let mut ctx = DrawContext::new(&mut surface, accent, &self.fonts, self.glyphs.as_ref(), inputs, now);
            let mut cursor = Cursor::default();

            for (index, entry) in entries.iter().enumerate() {
                let result = Element::parse(entry).and_then(|element| match element {
                    Some(element) => element.render(&mut ctx, cursor),
                    None => Ok(cursor),
                });

                for (kind, message) in ctx.take_notes() {
                    if kind == WarningKind::FontFallback && !font_notes.insert(message.clone()) {
                        continue;
                    }
                    warnings.push(Warning {
                        index: Some(index),
                        element: kind_of(entry).map(str::to_string),
                        kind,
                        message,
                    });
                }

                match result {
                    Ok(next) => cursor = next,
                    Err(error) => {
                        let kind = kind_of(entry);
                        if options.strict {
                            return Err(PapertagError::Element {
                                index,
                                kind: kind.unwrap_or("element").to_string(),
                                source: error,
                            });
                        }
                        let warning = Warning::skipped(index, kind, &error);
                        warn!("{}", warning);
                        warnings.push(warning);
                    }
                }
            }
        }

        let rotated = surface
            .rotated(payload.rotate)
            .ok_or(PapertagError::InvalidRotation(payload.rotate))?;
        let bitmap = dither::quantize(&rotated, &display.palette(), payload.dither);
        Ok(RenderOutput { bitmap, warnings })
    }

    /// Render independent jobs in parallel, sharing the font cache.
    pub fn render_many(&self, jobs: &[RenderJob]) -> Vec<Result<RenderOutput, PapertagError>> {
        jobs.par_iter()
            .map(|job| self.render(&job.payload, &job.display, &job.inputs, &job.options))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::ColorScheme;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn display(w: u32, h: u32) -> DisplayConfig {
        DisplayConfig::new(w, h, ColorScheme::Bwr)
    }

    fn render(payload: Value, w: u32, h: u32) -> Result<RenderOutput, PapertagError> {
        let payload = Payload::from_value(payload).unwrap();
        Renderer::default().render(&payload, &display(w, h), &RenderInputs::default(), &RenderOptions::default())
    }

    #[test]
    fn test_bare_list_and_object_payloads() {
        let list = Payload::from_value(json!([])).unwrap();
        assert_eq!(list.rotate, 0);
        let obj = Payload::from_value(json!({"payload": [], "rotate": 90, "dither": 0})).unwrap();
        assert_eq!(obj.rotate, 90);
        assert_eq!(obj.dither, DitherMode::None);
    }

    #[test]
    fn test_invalid_rotation_and_canvas() {
        let payload = Payload::from_value(json!({"elements": [], "rotate": 45})).unwrap();
        let err = Renderer::default()
            .render(&payload, &display(10, 10), &RenderInputs::default(), &RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, PapertagError::InvalidRotation(45)));
        assert!(matches!(render(json!([]), 0, 10), Err(PapertagError::InvalidCanvas(_))));
    }

    #[test]
    fn test_non_list_payload_is_fatal() {
        let result = render(json!({"elements": {"type": "text"}}), 10, 10);
        assert!(matches!(result, Err(PapertagError::InvalidPayload(_))));
    }

    #[test]
    fn test_bad_background_is_fatal() {
        let result = render(json!({"elements": [], "background": "chartreuse"}), 10, 10);
        assert!(matches!(result, Err(PapertagError::InvalidColor(_))));
    }

    #[test]
    fn test_invisible_element_produces_no_warning() {
        let out = render(json!([{"type": "bogus", "visible": false}]), 10, 10).unwrap();
        assert!(out.warnings.is_empty());
        assert_eq!(out.bitmap.count("white"), 100);
    }

    #[test]
    fn test_font_fallback_warning_is_deduplicated() {
        let out = render(
            json!([
                {"type": "text", "x": 0, "value": "a", "font": "missing.ttf"},
                {"type": "text", "x": 0, "value": "b", "font": "missing.ttf"}
            ]),
            60,
            60,
        )
        .unwrap();
        let fallbacks: Vec<_> = out
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::FontFallback)
            .collect();
        assert_eq!(fallbacks.len(), 1);
        assert_eq!(fallbacks[0].index, Some(0));
    }

    #[test]
    fn test_layout_canvas_swaps_for_quarter_turns() {
        let out = render(json!({"elements": [], "rotate": 270}), 30, 10).unwrap();
        assert_eq!((out.bitmap.width(), out.bitmap.height()), (30, 10));
    }
}
