//! `/cards` handler.

use axum::extract::{RawQuery, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use ogcard_core::metrics::record_request;

use crate::error::CardError;
use crate::pipeline::{Stage, render_card};
use crate::state::AppState;

/// Handle a card request.
///
/// Route: `GET /cards?url=<page>`
pub async fn cards_handler(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
) -> Result<Response, CardError> {
    Stage::Received.enter();

    if method != Method::GET {
        return Err(CardError::MethodNotAllowed(method.to_string()));
    }

    let target = target_url(query.as_deref()).ok_or(CardError::MissingUrl)?;
    Stage::Validated.enter();
    tracing::debug!(url = %target, "rendering card");

    let png = render_card(&state, &target).await?;

    Stage::Responded.enter();
    record_request(StatusCode::OK.as_u16());

    Ok(png_response(png))
}

/// The first `url` query parameter, if present and non-empty.
fn target_url(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Build an HTTP response with PNG content.
fn png_response(png_bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static("image/png"))],
        png_bytes,
    )
        .into_response()
}
