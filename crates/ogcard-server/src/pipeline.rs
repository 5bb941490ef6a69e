//! Card rendering pipeline.
//!
//! One request runs strictly in sequence: page metadata, then the font, then
//! layout and rasterization. Nothing is cached or shared between requests
//! apart from the HTTP client and the rasterizer.

use std::fmt;
use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ogcard_core::metrics::{record_render_seconds, record_upstream_fetch};
use ogcard_core::{compose, render_svg};

use crate::emoji::HttpGlyphResolver;
use crate::error::CardError;
use crate::font::load_font;
use crate::metadata::fetch_metadata;
use crate::state::AppState;

/// Request lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    MetadataFetched,
    FontLoaded,
    Rendered,
    Responded,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::MetadataFetched => "metadata_fetched",
            Self::FontLoaded => "font_loaded",
            Self::Rendered => "rendered",
            Self::Responded => "responded",
        }
    }

    /// Record this stage on the current span and log the transition.
    pub fn enter(self) {
        tracing::Span::current().record("stage", self.as_str());
        tracing::debug!(stage = self.as_str(), "request stage");
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render the card for `target` to PNG bytes.
pub async fn render_card(state: &AppState, target: &str) -> Result<Vec<u8>, CardError> {
    let config = &state.config;

    let metadata = fetch_metadata(&state.http, target, &config.user_agent).await?;
    Stage::MetadataFetched.enter();
    tracing::debug!(
        title = metadata.title.as_deref(),
        image = metadata.image_url.as_deref(),
        "metadata extracted"
    );

    let font = load_font(&state.http, &config.font_css_url).await?;
    Stage::FontLoaded.enter();

    let mut desc = compose(&metadata, config.variant);
    for src in desc.root.image_sources_mut() {
        let inlined = inline_image(&state.http, src, config.max_image_bytes).await?;
        *src = inlined;
    }

    let started = Instant::now();
    let resolver = HttpGlyphResolver::new(state.http.clone(), config.emoji_base_url.as_str());
    let svg = render_svg(&desc, &font, &resolver).await?;

    let rasterizer = state.rasterizer.clone();
    let png = tokio::task::spawn_blocking(move || rasterizer.render_png(&svg, &font))
        .await
        .map_err(|e| ogcard_core::Error::Raster(format!("render task failed: {e}")))??;
    record_render_seconds(started.elapsed().as_secs_f64());
    Stage::Rendered.enter();

    tracing::debug!(bytes = png.len(), "card rendered");

    Ok(png)
}

/// Fetch an image and return it as a base64 `data:` URI.
async fn inline_image(
    http: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<String, CardError> {
    let failed = |reason: String| {
        record_upstream_fetch("image", false);
        CardError::ImageFetch(format!("{url}: {reason}"))
    };

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| failed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(failed(format!("status {status}")));
    }
    if response
        .content_length()
        .is_some_and(|len| len > max_bytes as u64)
    {
        return Err(failed(format!("larger than {max_bytes} bytes")));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    if bytes.len() > max_bytes {
        return Err(failed(format!("larger than {max_bytes} bytes")));
    }
    record_upstream_fetch("image", true);

    let mime = detect_image_mime(&bytes);
    tracing::debug!(url = %url, mime, bytes = bytes.len(), "inlined image");

    Ok(format!("data:{mime};base64,{}", STANDARD.encode(&bytes)))
}

/// Detect MIME type from image bytes (basic magic byte detection).
fn detect_image_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG") {
        "image/png"
    } else if bytes.starts_with(b"\xFF\xD8\xFF") {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(b"WEBP") {
        "image/webp"
    } else if looks_like_svg(bytes) {
        "image/svg+xml"
    } else {
        // Most og:images are JPEG.
        "image/jpeg"
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{FEFF}').trim_start();
    (text.starts_with("<?xml") || text.starts_with("<svg")) && text.contains("<svg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_image_types() {
        assert_eq!(detect_image_mime(b"\x89PNG\r\n\x1a\n"), "image/png");
        assert_eq!(detect_image_mime(b"\xFF\xD8\xFF\xE0"), "image/jpeg");
        assert_eq!(detect_image_mime(b"GIF89a"), "image/gif");
        assert_eq!(detect_image_mime(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(
            detect_image_mime(b"<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"/>"),
            "image/svg+xml"
        );
        assert_eq!(detect_image_mime(b"  <svg/>"), "image/svg+xml");
        assert_eq!(detect_image_mime(b"unknown"), "image/jpeg");
        assert_eq!(detect_image_mime(b""), "image/jpeg");
    }

    #[test]
    fn stage_names() {
        assert_eq!(Stage::Received.to_string(), "received");
        assert_eq!(Stage::MetadataFetched.as_str(), "metadata_fetched");
        assert_eq!(Stage::Responded.to_string(), "responded");
    }

    #[test]
    fn stage_enter_outside_span_does_not_panic() {
        Stage::Validated.enter();
    }

    #[tokio::test]
    async fn unreachable_image_is_image_error() {
        let http = reqwest::Client::new();
        let err = inline_image(&http, "http://127.0.0.1:1/a.png", 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, CardError::ImageFetch(_)));
    }
}
