//! Font listing handler.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::super::state::AppState;

#[derive(Debug, Serialize)]
pub struct FontList {
    pub fonts: Vec<String>,
    pub search_dirs: Vec<String>,
}

/// Handle GET /api/fonts - list font files visible to the resolver.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<FontList> {
    let fonts = state.renderer.fonts();
    Json(FontList {
        fonts: fonts.available_fonts(),
        search_dirs: fonts
            .search_dirs()
            .iter()
            .map(|d| d.display().to_string())
            .collect(),
    })
}
