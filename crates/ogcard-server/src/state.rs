//! Application state shared across all request handlers.

use std::sync::Arc;

use anyhow::Context;
use ogcard_core::Rasterizer;

use crate::config::Config;

/// Shared application state available to all request handlers.
///
/// Built once before the listener starts and never mutated afterward.
#[derive(Clone)]
pub struct AppState {
    /// Outbound HTTP client for pages, fonts, images and emoji assets.
    pub http: reqwest::Client,

    /// Application configuration.
    pub config: Arc<Config>,

    /// Process-wide rasterizer.
    pub rasterizer: Arc<Rasterizer>,
}

impl AppState {
    /// Create a new application state from configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build HTTP client")?;

        let rasterizer = Rasterizer::new();

        tracing::info!(
            variant = %config.variant,
            "application state initialized"
        );

        Ok(Self {
            http,
            config: Arc::new(config),
            rasterizer: Arc::new(rasterizer),
        })
    }
}
