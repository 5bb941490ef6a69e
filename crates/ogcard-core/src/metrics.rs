//! Prometheus metrics for the card service.
//!
//! The recorder is optional. When it is not installed every `metrics` macro is
//! a no-op, so the recording helpers below are safe to call unconditionally.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ogcard_core::metrics::{init_metrics, start_metrics_server};
//!
//! let handle = init_metrics()?;
//! start_metrics_server(9091, handle).await?;
//! ```
//!
//! # Metric Naming Conventions
//!
//! - Prefix: `ogcard_`
//! - Suffix: unit or type (`_total`, `_seconds`)
//! - Labels: only bounded sets (status codes, upstream kinds)

use std::net::SocketAddr;

use axum::{Router, routing::get};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const REQUESTS_TOTAL: &str = "ogcard_requests_total";
pub const RENDER_SECONDS: &str = "ogcard_render_seconds";
pub const UPSTREAM_FETCHES_TOTAL: &str = "ogcard_upstream_fetches_total";
pub const EMOJI_ASSETS_TOTAL: &str = "ogcard_emoji_assets_total";

/// Install the Prometheus recorder and register metric descriptions.
///
/// Fails if a recorder is already installed.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {e}"))?;

    register_metrics();

    Ok(handle)
}

/// Like [`init_metrics`] but returns `None` if a recorder is already installed.
pub fn try_init_metrics() -> Option<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder().ok()?;
    register_metrics();
    Some(handle)
}

/// Serve `GET /metrics` on `port` in a background task.
///
/// The listener is bound before this returns, so a port conflict is reported
/// to the caller rather than lost in the background task.
pub async fn start_metrics_server(
    port: u16,
    handle: PrometheusHandle,
) -> Result<SocketAddr, std::io::Error> {
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    let addr = listener.local_addr()?;
    tracing::info!("Metrics server listening on http://{}/metrics", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "metrics server stopped");
        }
    });

    Ok(addr)
}

fn register_metrics() {
    describe_counter!(
        REQUESTS_TOTAL,
        "Card requests answered (label: status)"
    );
    describe_histogram!(
        RENDER_SECONDS,
        "Time spent laying out and rasterizing a card"
    );
    describe_counter!(
        UPSTREAM_FETCHES_TOTAL,
        "Outbound fetches (labels: kind, outcome)"
    );
    describe_counter!(EMOJI_ASSETS_TOTAL, "Emoji glyph assets fetched");
}

/// Count an answered request by status code.
pub fn record_request(status: u16) {
    metrics::counter!(REQUESTS_TOTAL, "status" => status.to_string()).increment(1);
}

/// Record render duration in seconds.
pub fn record_render_seconds(seconds: f64) {
    metrics::histogram!(RENDER_SECONDS).record(seconds);
}

/// Count an outbound fetch. `kind` is one of `page`, `font_css`, `font`,
/// `image`, `emoji`.
pub fn record_upstream_fetch(kind: &'static str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!(UPSTREAM_FETCHES_TOTAL, "kind" => kind, "outcome" => outcome).increment(1);
}

#[inline]
pub fn record_emoji_asset() {
    metrics::counter!(EMOJI_ASSETS_TOTAL).increment(1);
}
