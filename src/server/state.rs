//! Server state and configuration.

use crate::config::EngineConfig;
use crate::display::DisplayConfig;
use crate::error::PapertagError;
use crate::render::Renderer;
use crate::resolve::ImageFetcher;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Panel used when a request names no size
    pub display: DisplayConfig,
    pub engine: EngineConfig,
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub renderer: Renderer,
    pub fetcher: ImageFetcher,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self, PapertagError> {
        let renderer = Renderer::from_config(&config.engine)?;
        let fetcher = ImageFetcher::new(&config.engine)?;
        Ok(Self {
            config,
            renderer,
            fetcher,
        })
    }
}
