//! Core library for rendering Open Graph preview cards.
//!
//! This crate provides:
//! - The card model and composer (title, description, image region per variant)
//! - Flexbox layout of the card into SVG, with text wrapping and line clamping
//! - Glyph classification and the resolver hook used for emoji assets
//! - Codepoint sequence extraction for emoji asset lookup
//! - SVG to PNG rasterization
//! - Prometheus metrics helpers
//!
//! It performs no network I/O. Fetching pages, fonts and glyph assets is the
//! caller's job; see the `ogcard-server` crate.

pub mod card;
pub mod codepoint;
mod error;
pub mod glyph;
pub mod layout;
pub mod metrics;
pub mod raster;

pub use card::{CardDescription, CardMetadata, CardVariant, compose};
pub use codepoint::{codepoint_sequence, codepoint_sequence_utf16};
pub use error::{Error, Result};
pub use glyph::{GlyphClass, GlyphResolver, ResolvedGlyph};
pub use layout::render_svg;
pub use raster::Rasterizer;
