//! Error types for card layout and rendering.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a card description into an image.
#[derive(Error, Debug)]
pub enum Error {
    /// The supplied font bytes could not be parsed as a font face.
    #[error("font error: {0}")]
    Font(String),

    /// The flexbox layout pass failed.
    #[error("layout error: {0}")]
    Layout(String),

    /// The generated SVG document was rejected by the parser.
    #[error("SVG error: {0}")]
    Svg(String),

    /// Rasterization or PNG encoding failed.
    #[error("raster error: {0}")]
    Raster(String),

    /// A glyph asset (e.g. an emoji image) could not be resolved.
    #[error("glyph asset error: {0}")]
    GlyphAsset(String),
}

impl From<taffy::TaffyError> for Error {
    fn from(err: taffy::TaffyError) -> Self {
        Self::Layout(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_display() {
        let err = Error::Font("no face at index 0".to_string());
        let msg = err.to_string();
        assert!(msg.contains("font error"));
        assert!(msg.contains("no face at index 0"));
    }

    #[test]
    fn test_glyph_asset_display() {
        let err = Error::GlyphAsset("status 404 for 1F600".to_string());
        let msg = err.to_string();
        assert!(msg.contains("glyph asset error"));
        assert!(msg.contains("1F600"));
    }

    #[test]
    fn test_from_taffy_error() {
        let err: Error = taffy::TaffyError::InvalidInputNode(taffy::NodeId::from(7u64)).into();
        assert!(matches!(err, Error::Layout(_)));
    }

    #[test]
    fn test_result_type_err() {
        let result: Result<i32> = Err(Error::Raster("pixmap".to_string()));
        assert!(result.is_err());
    }
}
