//! Open Graph metadata fetching and extraction.

use ogcard_core::CardMetadata;
use ogcard_core::metrics::record_upstream_fetch;
use reqwest::header;
use scraper::{Html, Selector};
use url::Url;

use crate::error::CardError;

/// Fetch `target` and extract its Open Graph metadata.
///
/// The target must be an absolute `http`/`https` URL. Transport failures and
/// non-2xx responses are [`CardError::UpstreamFetch`].
pub async fn fetch_metadata(
    http: &reqwest::Client,
    target: &str,
    user_agent: &str,
) -> Result<CardMetadata, CardError> {
    let upstream = |reason: String| CardError::UpstreamFetch {
        url: target.to_string(),
        reason,
    };

    let url = Url::parse(target).map_err(|e| upstream(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(upstream(format!("unsupported scheme '{}'", url.scheme())));
    }

    let response = http
        .get(url)
        .header(header::USER_AGENT, user_agent)
        .send()
        .await
        .map_err(|e| {
            record_upstream_fetch("page", false);
            upstream(e.to_string())
        })?;

    let status = response.status();
    if !status.is_success() {
        record_upstream_fetch("page", false);
        return Err(upstream(format!("status {status}")));
    }

    // Relative og:image values resolve against the final URL after redirects.
    let base = response.url().clone();
    let body = response.text().await.map_err(|e| {
        record_upstream_fetch("page", false);
        upstream(e.to_string())
    })?;
    record_upstream_fetch("page", true);

    tracing::debug!(url = %base, bytes = body.len(), "fetched page");

    extract_metadata(&body, &base)
}

/// Extract `og:title`, `og:description` and `og:image` from an HTML document.
///
/// The first occurrence of each property wins. Blank values count as absent.
/// `og:image` is resolved against `base`; values that do not resolve to an
/// `http`/`https` URL are dropped.
pub fn extract_metadata(html: &str, base: &Url) -> Result<CardMetadata, CardError> {
    if html.trim().is_empty() {
        return Err(CardError::MetadataParse("empty document".to_string()));
    }

    let selector = Selector::parse("meta[property][content]")
        .map_err(|e| CardError::MetadataParse(e.to_string()))?;
    let document = Html::parse_document(html);

    let property = |name: &str| {
        document
            .select(&selector)
            .find(|el| el.value().attr("property") == Some(name))
            .and_then(|el| el.value().attr("content"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let title = property("og:title");
    let description = property("og:description");
    let image_url = property("og:image").and_then(|raw| match base.join(&raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url.to_string()),
        Ok(url) => {
            tracing::warn!(image = %raw, scheme = url.scheme(), "ignoring og:image");
            None
        }
        Err(e) => {
            tracing::warn!(image = %raw, error = %e, "ignoring og:image");
            None
        }
    });

    Ok(CardMetadata {
        title,
        description,
        image_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/blog/post").unwrap()
    }

    #[test]
    fn extracts_all_fields() {
        let html = r#"<html><head>
            <meta property="og:title" content="Hello">
            <meta property="og:description" content="A post">
            <meta property="og:image" content="https://cdn.example.com/a.png">
        </head><body></body></html>"#;
        let meta = extract_metadata(html, &base()).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Hello"));
        assert_eq!(meta.description.as_deref(), Some("A post"));
        assert_eq!(meta.image_url.as_deref(), Some("https://cdn.example.com/a.png"));
    }

    #[test]
    fn missing_fields_are_none() {
        let html = "<html><head><title>Only a title</title></head></html>";
        let meta = extract_metadata(html, &base()).unwrap();
        assert_eq!(meta, CardMetadata::default());
    }

    #[test]
    fn first_occurrence_wins() {
        let html = r#"<meta property="og:title" content="First">
                      <meta property="og:title" content="Second">"#;
        let meta = extract_metadata(html, &base()).unwrap();
        assert_eq!(meta.title.as_deref(), Some("First"));
    }

    #[test]
    fn blank_values_are_absent() {
        let html = r#"<meta property="og:title" content="   ">
                      <meta property="og:description" content="">"#;
        let meta = extract_metadata(html, &base()).unwrap();
        assert_eq!(meta.title, None);
        assert_eq!(meta.description, None);
    }

    #[test]
    fn values_are_trimmed_and_entities_decoded() {
        let html = r#"<meta property="og:title" content="  Tom &amp; Jerry  ">"#;
        let meta = extract_metadata(html, &base()).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Tom & Jerry"));
    }

    #[test]
    fn relative_image_resolved_against_page() {
        let html = r#"<meta property="og:image" content="../img/card.png">"#;
        let meta = extract_metadata(html, &base()).unwrap();
        assert_eq!(meta.image_url.as_deref(), Some("https://example.com/img/card.png"));
    }

    #[test]
    fn non_http_image_dropped() {
        let html = r#"<meta property="og:image" content="data:image/png;base64,AAAA">"#;
        let meta = extract_metadata(html, &base()).unwrap();
        assert_eq!(meta.image_url, None);
    }

    #[test]
    fn name_attribute_is_not_og() {
        let html = r#"<meta name="og:title" content="Wrong attribute">
                      <meta name="description" content="Plain description">"#;
        let meta = extract_metadata(html, &base()).unwrap();
        assert_eq!(meta, CardMetadata::default());
    }

    #[test]
    fn empty_document_is_parse_error() {
        let err = extract_metadata("  \n ", &base()).unwrap_err();
        assert!(matches!(err, CardError::MetadataParse(_)));
    }

    #[tokio::test]
    async fn rejects_non_http_target() {
        let http = reqwest::Client::new();
        let err = fetch_metadata(&http, "ftp://example.com/", "bot")
            .await
            .unwrap_err();
        assert!(matches!(err, CardError::UpstreamFetch { .. }));

        let err = fetch_metadata(&http, "not a url", "bot").await.unwrap_err();
        assert!(matches!(err, CardError::UpstreamFetch { .. }));
    }
}
