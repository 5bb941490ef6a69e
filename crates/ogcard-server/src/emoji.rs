//! Emoji glyph assets fetched over HTTP.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ogcard_core::codepoint::codepoint_sequence;
use ogcard_core::glyph::{GlyphClass, GlyphResolver, ResolvedGlyph};
use ogcard_core::metrics::{record_emoji_asset, record_upstream_fetch};
use reqwest::StatusCode;

/// Resolves emoji to SVG assets from an OpenMoji/Twemoji style repository,
/// where each glyph lives at `{base}/{SEQUENCE}.svg`.
#[derive(Debug, Clone)]
pub struct HttpGlyphResolver {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGlyphResolver {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Asset URL for an emoji cluster.
    pub fn asset_url(&self, segment: &str) -> String {
        format!(
            "{}/{}.svg",
            self.base_url.trim_end_matches('/'),
            codepoint_sequence(segment).to_uppercase()
        )
    }

    /// Fetch an asset. `None` when the repository has no such file.
    async fn fetch(&self, url: &str) -> ogcard_core::Result<Option<Vec<u8>>> {
        let failed = |reason: String| {
            record_upstream_fetch("emoji", false);
            ogcard_core::Error::GlyphAsset(format!("{url}: {reason}"))
        };

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            record_upstream_fetch("emoji", false);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(failed(format!("status {status}")));
        }

        let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
        record_upstream_fetch("emoji", true);
        record_emoji_asset();

        Ok(Some(bytes.to_vec()))
    }
}

impl GlyphResolver for HttpGlyphResolver {
    async fn resolve(&self, class: GlyphClass, segment: &str) -> ogcard_core::Result<ResolvedGlyph> {
        if class != GlyphClass::Emoji {
            return Ok(ResolvedGlyph::Text(segment.to_string()));
        }

        let url = self.asset_url(segment);
        tracing::debug!(url = %url, "fetching emoji asset");

        match self.fetch(&url).await? {
            Some(svg) => Ok(ResolvedGlyph::Image(format!(
                "data:image/svg+xml;base64,{}",
                STANDARD.encode(svg)
            ))),
            None => {
                tracing::warn!(url = %url, "no emoji asset, drawing as text");
                Ok(ResolvedGlyph::Text(segment.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> HttpGlyphResolver {
        HttpGlyphResolver::new(reqwest::Client::new(), "https://emoji.test/svg/")
    }

    #[test]
    fn asset_url_uses_uppercase_sequence() {
        let r = resolver();
        assert_eq!(r.asset_url("😀"), "https://emoji.test/svg/1F600.svg");
        assert_eq!(r.asset_url("🇯🇵"), "https://emoji.test/svg/1F1EF-1F1F5.svg");
        assert_eq!(
            r.asset_url("\u{2764}\u{FE0F}\u{200D}\u{1F525}"),
            "https://emoji.test/svg/2764-FE0F-200D-1F525.svg"
        );
    }

    #[tokio::test]
    async fn non_emoji_passes_through() {
        let r = resolver();
        let resolved = r.resolve(GlyphClass::Missing, "日").await.unwrap();
        assert_eq!(resolved, ResolvedGlyph::Text("日".to_string()));
        let resolved = r.resolve(GlyphClass::Text, "a").await.unwrap();
        assert_eq!(resolved, ResolvedGlyph::Text("a".to_string()));
    }

    /// Serve every request with `status` from a local stub.
    fn stub(status: u16) -> String {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let base = format!("http://{}", server.server_addr().to_ip().unwrap());
        std::thread::spawn(move || {
            for request in server.incoming_requests() {
                let _ = request.respond(tiny_http::Response::empty(status));
            }
        });
        base
    }

    fn local(base: &str) -> HttpGlyphResolver {
        HttpGlyphResolver::new(reqwest::Client::builder().no_proxy().build().unwrap(), base)
    }

    #[tokio::test]
    async fn missing_asset_falls_back_to_text() {
        let r = local(&stub(404));
        let resolved = r.resolve(GlyphClass::Emoji, "🦄").await.unwrap();
        assert_eq!(resolved, ResolvedGlyph::Text("🦄".to_string()));
    }

    #[tokio::test]
    async fn server_error_is_glyph_error() {
        let r = local(&stub(503));
        let err = r.resolve(GlyphClass::Emoji, "😀").await.unwrap_err();
        assert!(matches!(err, ogcard_core::Error::GlyphAsset(_)));
    }

    #[tokio::test]
    async fn unreachable_asset_is_glyph_error() {
        let r = HttpGlyphResolver::new(reqwest::Client::new(), "http://127.0.0.1:1");
        let err = r.resolve(GlyphClass::Emoji, "😀").await.unwrap_err();
        assert!(matches!(err, ogcard_core::Error::GlyphAsset(_)));
    }
}
