//! Error types for the card service.
//!
//! Every error answers with a short `text/plain` body. Client errors carry
//! their own status code; every failure after validation is a 500.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

/// Card service error type.
#[derive(Debug, thiserror::Error)]
pub enum CardError {
    /// Any method other than GET.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// GET on a path other than `/cards`.
    #[error("not found: {0}")]
    NotFound(String),

    /// The `url` query parameter is missing or empty.
    #[error("missing url parameter")]
    MissingUrl,

    /// The target page could not be fetched.
    #[error("failed to fetch {url}: {reason}")]
    UpstreamFetch { url: String, reason: String },

    /// The target page could not be read as a document.
    #[error("failed to parse metadata: {0}")]
    MetadataParse(String),

    /// The font stylesheet could not be fetched or had no usable font URL.
    #[error("font manifest error: {0}")]
    FontManifest(String),

    /// The font file itself could not be fetched.
    #[error("font download error: {0}")]
    FontDownload(String),

    /// The `og:image` could not be fetched.
    #[error("image fetch error: {0}")]
    ImageFetch(String),

    /// Layout, glyph resolution or rasterization failed.
    #[error("render error: {0}")]
    Render(#[from] ogcard_core::Error),
}

impl CardError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MissingUrl => StatusCode::BAD_REQUEST,
            Self::UpstreamFetch { .. }
            | Self::MetadataParse(_)
            | Self::FontManifest(_)
            | Self::FontDownload(_)
            | Self::ImageFetch(_)
            | Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed(_) => "Method Not Allowed",
            Self::NotFound(_) => "Not Found",
            Self::MissingUrl => "Bad Request",
            Self::UpstreamFetch { .. } => "Failed to fetch URL",
            Self::MetadataParse(_) => "Failed to parse metadata",
            Self::FontManifest(_) | Self::FontDownload(_) => "Failed to load font",
            Self::ImageFetch(_) => "Failed to fetch image",
            Self::Render(_) => "Failed to render card",
        }
    }
}

impl IntoResponse for CardError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "card request failed");
        }
        ogcard_core::metrics::record_request(status.as_u16());

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.body(),
        )
            .into_response()
    }
}
