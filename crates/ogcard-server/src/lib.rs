//! ogcard - Open Graph preview cards as PNG images.
//!
//! This crate provides the HTTP service around `ogcard-core`. For a request
//! like
//!
//! ```text
//! GET /cards?url=https://example.com/post
//! ```
//!
//! it fetches the page, reads its Open Graph tags, downloads the card font,
//! lays out the card, resolves emoji to SVG assets and answers with a PNG.
//!
//! # Architecture
//!
//! - **Metadata**: page fetch with `reqwest`, `og:*` extraction with `scraper`
//! - **Font**: stylesheet fetch and font source match
//! - **Pipeline**: card composition, image inlining, layout and rasterization
//! - **Routes**: a single `/cards` endpoint; everything else is 404 or 405

pub mod config;
pub mod emoji;
pub mod error;
pub mod font;
pub mod metadata;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::CardError;
pub use routes::router;
pub use state::AppState;
