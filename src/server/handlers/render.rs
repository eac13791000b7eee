//! Render and validate handlers.
//!
//! Both accept the payload object with optional panel overrides:
//!
//! ```json
//! {
//!   "payload": [{"type": "text", "x": 10, "value": "Hello"}],
//!   "rotate": 0, "dither": "ordered", "background": "white",
//!   "width": 296, "height": 128, "scheme": "bwr",
//!   "strict": false,
//!   "series": {"sensor.temp": [{"timestamp": "...", "value": 21.5}]}
//! }
//! ```

use axum::{
    Json,
    extract::State,
    http::{HeaderName, StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::display::{ColorScheme, DisplayConfig};
use crate::error::{PapertagError, Warning};
use crate::plot::SeriesSample;
use crate::render::{Payload, RenderInputs, RenderOptions, RenderOutput};

use super::super::state::AppState;

/// Response header carrying the number of render warnings.
pub const WARNINGS_HEADER: HeaderName = HeaderName::from_static("x-render-warnings");

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    #[serde(flatten)]
    pub payload: Payload,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub scheme: Option<ColorScheme>,
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub series: HashMap<String, Vec<SeriesSample>>,
}

impl RenderRequest {
    fn display(&self, default: &DisplayConfig) -> DisplayConfig {
        let mut display = *default;
        if let Some(width) = self.width {
            display.width = width;
        }
        if let Some(height) = self.height {
            display.height = height;
        }
        if let Some(scheme) = self.scheme {
            display = DisplayConfig::new(display.width, display.height, scheme);
        }
        display
    }
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub warnings: Vec<Warning>,
}

fn status_for(error: &PapertagError) -> StatusCode {
    match error {
        PapertagError::InvalidCanvas(_)
        | PapertagError::InvalidPayload(_)
        | PapertagError::InvalidRotation(_)
        | PapertagError::InvalidColor(_)
        | PapertagError::Element { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Fetch assets, then render on the blocking pool.
async fn run(state: Arc<AppState>, request: RenderRequest) -> Result<RenderOutput, (StatusCode, String)> {
    let display = request.display(&state.config.display);
    let mut inputs = RenderInputs {
        series: request.series,
        ..RenderInputs::default()
    };
    state.fetcher.resolve_into(&request.payload, &mut inputs).await;
    let options = RenderOptions {
        strict: request.strict,
        now: None,
    };
    let payload = request.payload;

    tokio::task::spawn_blocking(move || state.renderer.render(&payload, &display, &inputs, &options))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task error: {}", e)))?
        .map_err(|e| (status_for(&e), e.to_string()))
}

/// Handle POST /api/render - render a payload to PNG.
pub async fn render(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RenderRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let output = run(state, request).await?;
    let png = output.bitmap.to_png().map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("PNG encoding failed: {}", e),
        )
    })?;
    debug!(bytes = png.len(), warnings = output.warnings.len(), "rendered");

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (WARNINGS_HEADER, output.warnings.len().to_string()),
        ],
        png,
    ))
}

/// Handle POST /api/validate - dry-run a payload and report its warnings.
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<ValidateResponse>, (StatusCode, String)> {
    let output = run(state, request).await?;
    Ok(Json(ValidateResponse {
        valid: output.warnings.is_empty(),
        warnings: output.warnings,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_overrides_display() {
        let request: RenderRequest = serde_json::from_value(json!({
            "payload": [], "width": 200, "scheme": "bwy"
        }))
        .unwrap();
        let display = request.display(&DisplayConfig::TAG_29);
        assert_eq!(display.width, 200);
        assert_eq!(display.height, DisplayConfig::TAG_29.height);
        assert_eq!(display.scheme, ColorScheme::Bwy);
    }

    #[test]
    fn test_client_errors_map_to_bad_request() {
        assert_eq!(status_for(&PapertagError::InvalidRotation(45)), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&PapertagError::Font("broken".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
