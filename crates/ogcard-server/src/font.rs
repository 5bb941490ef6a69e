//! Font provider.
//!
//! Fetches a Google Fonts style stylesheet, picks the first OpenType/TrueType
//! source URL out of it and downloads the font bytes. The match is a plain
//! pattern over the CSS text; a stylesheet that only offers other formats
//! (e.g. WOFF2) has no usable source.

use std::sync::LazyLock;

use ogcard_core::metrics::record_upstream_fetch;
use regex::Regex;

use crate::error::CardError;

static FONT_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"src: url\((.+)\) format\('(opentype|truetype)'\)")
        .expect("font source pattern is valid")
});

/// The first OpenType/TrueType source URL declared in `css`.
pub fn extract_font_url(css: &str) -> Option<&str> {
    FONT_SRC
        .captures(css)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Fetch the stylesheet at `css_url` and download the font it declares.
pub async fn load_font(http: &reqwest::Client, css_url: &str) -> Result<Vec<u8>, CardError> {
    let css = fetch_stylesheet(http, css_url).await?;

    let font_url = extract_font_url(&css)
        .ok_or_else(|| CardError::FontManifest("no opentype/truetype source in stylesheet".to_string()))?;

    tracing::debug!(font_url = %font_url, "downloading font");

    let response = http.get(font_url).send().await.map_err(|e| {
        record_upstream_fetch("font", false);
        CardError::FontDownload(format!("{font_url}: {e}"))
    })?;

    let status = response.status();
    if !status.is_success() {
        record_upstream_fetch("font", false);
        return Err(CardError::FontDownload(format!("{font_url}: status {status}")));
    }

    let bytes = response.bytes().await.map_err(|e| {
        record_upstream_fetch("font", false);
        CardError::FontDownload(format!("{font_url}: {e}"))
    })?;
    record_upstream_fetch("font", true);

    tracing::debug!(bytes = bytes.len(), "font loaded");

    Ok(bytes.to_vec())
}

async fn fetch_stylesheet(http: &reqwest::Client, css_url: &str) -> Result<String, CardError> {
    let manifest = |reason: String| {
        record_upstream_fetch("font_css", false);
        CardError::FontManifest(format!("{css_url}: {reason}"))
    };

    let response = http
        .get(css_url)
        .send()
        .await
        .map_err(|e| manifest(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(manifest(format!("status {status}")));
    }

    let css = response.text().await.map_err(|e| manifest(e.to_string()))?;
    record_upstream_fetch("font_css", true);

    Ok(css)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOGLE_CSS: &str = "/* japanese */
@font-face {
  font-family: 'Noto Sans JP';
  font-style: normal;
  font-weight: 700;
  src: url(https://fonts.gstatic.com/s/notosansjp/v53/font.ttf) format('truetype');
}
";

    #[test]
    fn extracts_truetype_url() {
        assert_eq!(
            extract_font_url(GOOGLE_CSS),
            Some("https://fonts.gstatic.com/s/notosansjp/v53/font.ttf")
        );
    }

    #[test]
    fn extracts_opentype_url() {
        let css = "src: url(https://example.com/a.otf) format('opentype');";
        assert_eq!(extract_font_url(css), Some("https://example.com/a.otf"));
    }

    #[test]
    fn first_match_wins() {
        let css = "@font-face { src: url(https://a.test/1.ttf) format('truetype'); }\n\
                   @font-face { src: url(https://a.test/2.ttf) format('truetype'); }";
        assert_eq!(extract_font_url(css), Some("https://a.test/1.ttf"));
    }

    #[test]
    fn woff2_only_has_no_match() {
        let css = "src: url(https://example.com/a.woff2) format('woff2');";
        assert_eq!(extract_font_url(css), None);
    }

    #[test]
    fn spacing_must_match_exactly() {
        let css = "src:url(https://example.com/a.ttf) format('truetype');";
        assert_eq!(extract_font_url(css), None);
    }

    #[tokio::test]
    async fn unreachable_stylesheet_is_manifest_error() {
        let http = reqwest::Client::new();
        let err = load_font(&http, "http://127.0.0.1:1/css").await.unwrap_err();
        assert!(matches!(err, CardError::FontManifest(_)));
    }
}
