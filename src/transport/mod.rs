//! # Bitmap Transport Layer
//!
//! Hands a finished [`Bitmap`] to whatever delivers it to the panel.
//!
//! ## Available Transports
//!
//! - [`file`]: writes the bitmap as a PNG file
//!
//! The device wire protocol lives outside this crate; implement
//! [`Transport`] to plug one in.

pub mod file;

pub use file::PngFileTransport;

use tracing::{debug, info};

use crate::display::DisplayConfig;
use crate::error::PapertagError;
use crate::render::{Bitmap, Payload, RenderInputs, RenderOptions, RenderOutput, Renderer};

/// Destination of rendered bitmaps.
pub trait Transport {
    fn send(&mut self, bitmap: &Bitmap) -> Result<(), PapertagError>;
}

/// Render a payload and send it, unless the payload is a dry run.
///
/// The render output is returned either way so callers can inspect the
/// warnings.
pub fn deliver(
    renderer: &Renderer,
    payload: &Payload,
    display: &DisplayConfig,
    inputs: &RenderInputs,
    options: &RenderOptions,
    transport: &mut dyn Transport,
) -> Result<RenderOutput, PapertagError> {
    let output = renderer.render(payload, display, inputs, options)?;
    if payload.dry_run {
        debug!(warnings = output.warnings.len(), "dry run, transport skipped");
        return Ok(output);
    }
    transport.send(&output.bitmap)?;
    info!(
        width = output.bitmap.width(),
        height = output.bitmap.height(),
        warnings = output.warnings.len(),
        "bitmap delivered"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        sent: Vec<(u32, u32)>,
    }

    impl Transport for Recorder {
        fn send(&mut self, bitmap: &Bitmap) -> Result<(), PapertagError> {
            self.sent.push((bitmap.width(), bitmap.height()));
            Ok(())
        }
    }

    fn run(payload: serde_json::Value) -> (Result<RenderOutput, PapertagError>, Recorder) {
        let payload = Payload::from_value(payload).unwrap();
        let mut recorder = Recorder::default();
        let result = deliver(
            &Renderer::default(),
            &payload,
            &DisplayConfig::TAG_29,
            &RenderInputs::default(),
            &RenderOptions::default(),
            &mut recorder,
        );
        (result, recorder)
    }

    #[test]
    fn test_deliver_sends_bitmap() {
        let (result, recorder) = run(json!({"elements": []}));
        assert!(result.is_ok());
        assert_eq!(recorder.sent, vec![(DisplayConfig::TAG_29.width, DisplayConfig::TAG_29.height)]);
    }

    #[test]
    fn test_dry_run_skips_transport() {
        let (result, recorder) = run(json!({"elements": [{"type": "nope"}], "dry_run": true}));
        assert_eq!(result.unwrap().warnings.len(), 1);
        assert!(recorder.sent.is_empty());
    }

    #[test]
    fn test_fatal_render_error_skips_transport() {
        let (result, recorder) = run(json!({"elements": [], "rotate": 12}));
        assert!(result.is_err());
        assert!(recorder.sent.is_empty());
    }
}
