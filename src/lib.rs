//! # papertag - E-Paper Tag Rendering Engine
//!
//! papertag turns declarative drawing payloads (JSON element lists) into
//! bitmaps quantized to the two to four inks of an e-paper price tag. It
//! provides:
//!
//! - **Elements**: text, shapes, icons, images, QR codes, progress bars and time series plots
//! - **Layout**: percentage coordinates, anchors and cursor-chained stacking
//! - **Dithering**: nearest color, Floyd–Steinberg, Bayer 4x4 and Burkes
//! - **Delivery**: a transport trait, a PNG file transport and an HTTP preview server
//!
//! ## Quick Start
//!
//! ```
//! use papertag::{
//!     display::DisplayConfig,
//!     render::{Payload, RenderInputs, RenderOptions, Renderer},
//! };
//!
//! let payload = Payload::from_json(r#"[
//!     {"type": "text", "x": 10, "value": "Hello", "size": 24},
//!     {"type": "text", "x": 10, "value": "[red]4.99[/red] EUR", "parse_colors": true},
//!     {"type": "rectangle", "x_start": 0, "y_start": 0, "x_end": "100%", "y_end": "100%"}
//! ]"#)?;
//!
//! let renderer = Renderer::default();
//! let output = renderer.render(
//!     &payload,
//!     &DisplayConfig::TAG_29,
//!     &RenderInputs::default(),
//!     &RenderOptions::default(),
//! )?;
//!
//! for warning in &output.warnings {
//!     eprintln!("{}", warning);
//! }
//! let png = output.bitmap.to_png()?;
//! assert!(!png.is_empty());
//! # Ok::<(), papertag::PapertagError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`color`] | Color tokens and their resolution to paints |
//! | [`coords`] | Coordinates and the layout cursor |
//! | [`font`] | Font search path, cache and bundled fallback |
//! | [`elements`] | Element types and their renderers |
//! | [`plot`] | Time series plots |
//! | [`render`] | Pipeline, surface, dithering and bitmaps |
//! | [`display`] | Palettes and panel presets |
//! | [`config`] | Engine configuration file |
//! | [`resolve`] | Image fetching ahead of a render |
//! | [`transport`] | Delivery of finished bitmaps |
//! | [`server`] | HTTP preview server |
//! | [`error`] | Error and warning types |

pub mod color;
pub mod config;
pub mod coords;
pub mod display;
pub mod elements;
pub mod error;
pub mod font;
pub mod plot;
pub mod render;
pub mod resolve;
pub mod server;
pub mod transport;

// Re-exports for convenience
pub use display::DisplayConfig;
pub use error::{ElementError, PapertagError, Warning, WarningKind};
pub use render::{Bitmap, Payload, RenderInputs, RenderOptions, RenderOutput, Renderer};
pub use transport::{PngFileTransport, Transport};
