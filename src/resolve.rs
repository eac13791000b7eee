//! # Asset Fetching
//!
//! Downloads and decodes the images referenced by `dlimg` elements before a
//! render, producing [`RenderInputs::images`]. The engine itself never does
//! I/O.
//!
//! ## URL forms
//!
//! | Form | Source |
//! |------|--------|
//! | `http://...`, `https://...` | HTTP GET with the configured timeout |
//! | `data:image/png;base64,...` | Inline base64 payload |
//! | `/abs/path.png` | Local file |
//! | `rel/path.png` | Local file under the media directory |

use std::collections::HashMap;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::elements::{is_visible, kind_of};
use crate::error::PapertagError;
use crate::render::{Payload, RenderInputs};

/// Fetches and decodes payload images.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
    media_dir: Option<PathBuf>,
}

impl ImageFetcher {
    pub fn new(config: &EngineConfig) -> Result<Self, PapertagError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .map_err(|e| PapertagError::Config(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            media_dir: config.media_dir.clone(),
        })
    }

    /// Fetch and decode one image.
    pub async fn fetch(&self, url: &str) -> Result<RgbaImage, PapertagError> {
        let bytes = if url.starts_with("http://") || url.starts_with("https://") {
            self.download(url).await?
        } else if let Some(data) = url.strip_prefix("data:") {
            decode_data_uri(data)?
        } else {
            let path = match &self.media_dir {
                Some(dir) if !url.starts_with('/') => dir.join(url),
                _ => PathBuf::from(url),
            };
            tokio::fs::read(&path)
                .await
                .map_err(|e| PapertagError::Image(format!("{}: {}", path.display(), e)))?
        };

        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| PapertagError::Image(format!("decode task failed: {}", e)))?
            .map_err(|e| PapertagError::Image(format!("{}: {}", short(url), e)))?;
        Ok(image.to_rgba8())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, PapertagError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PapertagError::Image(format!("download of {} failed: {}", url, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PapertagError::Image(format!(
                "download of {} failed with status {}",
                url, status
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PapertagError::Image(format!("download of {} failed: {}", url, e)))?;
        Ok(bytes.to_vec())
    }

    /// Resolve every image of a payload into `inputs`.
    ///
    /// Failed images are logged and their reason kept in
    /// [`RenderInputs::failed`]; the element then fails with that reason during
    /// the render.
    pub async fn resolve_into(&self, payload: &Payload, inputs: &mut RenderInputs) {
        for url in image_urls(&payload.elements) {
            if inputs.images.contains_key(&url) {
                continue;
            }
            match self.fetch(&url).await {
                Ok(image) => {
                    debug!(url = short(&url), width = image.width(), height = image.height(), "image fetched");
                    inputs.images.insert(url, image);
                }
                Err(e) => {
                    warn!("{}", e);
                    inputs.failed.insert(url, e.to_string());
                }
            }
        }
    }

    /// Resolve a payload's images into fresh inputs.
    pub async fn resolve(&self, payload: &Payload) -> HashMap<String, RgbaImage> {
        let mut inputs = RenderInputs::default();
        self.resolve_into(payload, &mut inputs).await;
        inputs.images
    }
}

/// Unique `url`s of visible image elements, in payload order.
pub fn image_urls(elements: &Value) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let Some(entries) = elements.as_array() else {
        return urls;
    };
    for entry in entries {
        if kind_of(entry) != Some("dlimg") || !is_visible(entry.get("visible")) {
            continue;
        }
        if let Some(url) = entry.get("url").and_then(Value::as_str) {
            if !urls.iter().any(|u| u == url) {
                urls.push(url.to_string());
            }
        }
    }
    urls
}

fn decode_data_uri(data: &str) -> Result<Vec<u8>, PapertagError> {
    let (header, body) = data
        .split_once(',')
        .ok_or_else(|| PapertagError::Image("data URI has no payload".to_string()))?;
    if !header.split(';').any(|p| p == "base64") {
        return Err(PapertagError::Image("only base64 data URIs are supported".to_string()));
    }
    STANDARD
        .decode(body.trim())
        .map_err(|e| PapertagError::Image(format!("invalid base64 image: {}", e)))
}

/// Data URIs are long; log only their start.
fn short(url: &str) -> &str {
    match url.char_indices().nth(48) {
        Some((i, _)) if url.starts_with("data:") => &url[..i],
        _ => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use serde_json::json;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(2, 3, Rgba([255, 0, 0, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_image_urls_skip_hidden_and_duplicates() {
        let elements = json!([
            {"type": "dlimg", "url": "a.png"},
            {"type": "text", "url": "b.png"},
            {"type": "dlimg", "url": "c.png", "visible": false},
            {"type": "dlimg", "url": "a.png"}
        ]);
        assert_eq!(image_urls(&elements), vec!["a.png".to_string()]);
    }

    #[test]
    fn test_data_uri_decoding() {
        let encoded = STANDARD.encode(png_bytes());
        assert_eq!(decode_data_uri(&format!("image/png;base64,{}", encoded)).unwrap(), png_bytes());
        assert!(decode_data_uri("image/png,rawbytes").is_err());
        assert!(decode_data_uri("image/png;base64").is_err());
    }

    #[tokio::test]
    async fn test_fetch_local_and_inline_images() {
        let dir = std::env::temp_dir().join(format!("papertag-media-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("red.png"), png_bytes()).unwrap();
        let config = EngineConfig {
            media_dir: Some(dir.clone()),
            ..EngineConfig::default()
        };
        let fetcher = ImageFetcher::new(&config).unwrap();

        let local = fetcher.fetch("red.png").await.unwrap();
        assert_eq!(local.dimensions(), (2, 3));

        let uri = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes()));
        let payload = Payload::new(json!([{"type": "dlimg", "url": uri}, {"type": "dlimg", "url": "missing.png"}]));
        let images = fetcher.resolve(&payload).await;
        assert_eq!(images.len(), 1);
        assert!(images.contains_key(&uri));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_failure_reason_reaches_render_warning() {
        let fetcher = ImageFetcher::new(&EngineConfig::default()).unwrap();
        let payload = Payload::new(json!([
            {"type": "dlimg", "x": 0, "y": 0, "url": "data:image/png,raw", "xsize": 4, "ysize": 4}
        ]));
        let mut inputs = RenderInputs::default();
        fetcher.resolve_into(&payload, &mut inputs).await;
        assert!(inputs.images.is_empty());
        assert!(inputs.failed["data:image/png,raw"].contains("only base64"));

        let output = crate::render::Renderer::default()
            .render(
                &payload,
                &crate::display::DisplayConfig::new(8, 8, crate::display::ColorScheme::Mono),
                &inputs,
                &crate::render::RenderOptions::default(),
            )
            .unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].message.contains("only base64"));
    }
}
