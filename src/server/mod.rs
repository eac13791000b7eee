//! # HTTP Preview Server
//!
//! Renders payloads over HTTP, for previews and for hosts that prefer to
//! push bitmaps themselves.
//!
//! ## Usage
//!
//! ```bash
//! papertag serve --listen 0.0.0.0:8080
//! ```
//!
//! ## Routes
//!
//! | Route | Result |
//! |-------|--------|
//! | `POST /api/render` | PNG, with the warning count in `x-render-warnings` |
//! | `POST /api/validate` | `{"valid": bool, "warnings": [...]}` |
//! | `GET /api/fonts` | Font files and search directories |

mod handlers;
mod state;

pub use handlers::render::{RenderRequest, ValidateResponse, WARNINGS_HEADER};
pub use state::ServerConfig;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::PapertagError;
use state::AppState;

/// Inline data URIs make request bodies large.
const BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Build the router without binding a socket.
pub fn router(config: ServerConfig) -> Result<Router, PapertagError> {
    let app_state = Arc::new(AppState::new(config)?);
    Ok(Router::new()
        .route("/api/render", post(handlers::render::render))
        .route("/api/validate", post(handlers::render::validate))
        .route("/api/fonts", get(handlers::fonts::list))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use papertag::config::EngineConfig;
/// use papertag::display::DisplayConfig;
/// use papertag::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), papertag::error::PapertagError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     display: DisplayConfig::TAG_29,
///     engine: EngineConfig::default(),
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), PapertagError> {
    let listen_addr = config.listen_addr.clone();
    info!(
        width = config.display.width,
        height = config.display.height,
        scheme = %config.display.scheme,
        "default display"
    );
    let app = router(config)?;

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| PapertagError::Transport(format!("Failed to bind to {}: {}", listen_addr, e)))?;
    info!("papertag server listening on http://{}/", listen_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| PapertagError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}
