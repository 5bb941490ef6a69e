//! SVG to PNG rasterization.
//!
//! Uses `resvg` at the document's intrinsic size. The [`Rasterizer`] is
//! built once per process, before the listener starts, and shared read-only
//! between requests. Each render gets its own font database seeded from the
//! shared one plus the font bytes fetched for that request.

use std::sync::Arc;

use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, ImageHrefResolver, fontdb};

use crate::error::{Error, Result};

/// Process-wide rasterizer setup.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    fontdb: Arc<fontdb::Database>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    /// Create the rasterizer with an empty base font database.
    ///
    /// System fonts are never loaded, so output depends only on the font bytes
    /// passed to [`Rasterizer::render_png`].
    pub fn new() -> Self {
        Self {
            fontdb: Arc::new(fontdb::Database::new()),
        }
    }

    /// Render `svg` to PNG bytes, drawing text with `font_data`.
    pub fn render_png(&self, svg: &str, font_data: &[u8]) -> Result<Vec<u8>> {
        let options = self.options(font_data)?;

        let tree = usvg::Tree::from_str(svg, &options)
            .map_err(|e| Error::Svg(format!("SVG parse error: {e}")))?;

        let size = tree.size().to_int_size();
        let mut pixmap = Pixmap::new(size.width(), size.height()).ok_or_else(|| {
            Error::Raster(format!(
                "failed to create {}x{} pixmap",
                size.width(),
                size.height()
            ))
        })?;

        resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| Error::Raster(format!("PNG encode error: {e}")))
    }

    fn options(&self, font_data: &[u8]) -> Result<usvg::Options<'static>> {
        let mut options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            image_href_resolver: ImageHrefResolver {
                resolve_data: ImageHrefResolver::default_data_resolver(),
                // Only data URIs are honored; no file or network access.
                resolve_string: Box::new(|_, _| None),
            },
            ..Default::default()
        };

        let db = options.fontdb_mut();
        let before = db.len();
        db.load_font_data(font_data.to_vec());
        if db.len() == before {
            return Err(Error::Font("font data contains no usable face".to_string()));
        }

        let family = db
            .faces()
            .last()
            .and_then(|face| face.families.first())
            .map(|(name, _)| name.clone())
            .ok_or_else(|| Error::Font("font has no family name".to_string()))?;
        db.set_sans_serif_family(family.clone());
        options.font_family = family;

        Ok(options)
    }
}
