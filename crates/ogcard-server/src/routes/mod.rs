//! Route definitions for the card service.
//!
//! ## Routes
//!
//! - `GET /cards?url=<page>` - Render the page's Open Graph card as PNG
//!
//! Any other method is 405 on every path; any other GET path is 404.

mod cards;

use axum::Router;
use axum::http::{Method, Uri};
use axum::routing::any;

use crate::error::CardError;
use crate::state::AppState;

/// Build the complete card service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/cards", any(cards::cards_handler))
        .fallback(fallback)
        .with_state(state)
}

/// Answer for every path other than `/cards`.
async fn fallback(method: Method, uri: Uri) -> CardError {
    if method != Method::GET {
        CardError::MethodNotAllowed(method.to_string())
    } else {
        CardError::NotFound(uri.path().to_string())
    }
}
