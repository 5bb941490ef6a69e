//! Application configuration loaded from environment variables.

use std::time::Duration;

use anyhow::Context;
use ogcard_core::CardVariant;

const DEFAULT_FONT_CSS_URL: &str = "https://fonts.googleapis.com/css2?family=Noto+Sans+JP:wght@700";
const DEFAULT_EMOJI_BASE_URL: &str = "https://cdn.jsdelivr.net/npm/openmoji@15.0.0/color/svg";
const DEFAULT_MAX_IMAGE_BYTES: usize = 5_000_000;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8787").
    pub bind_addr: String,

    /// Card layout used for every request.
    pub variant: CardVariant,

    /// `User-Agent` sent when fetching the target page.
    pub user_agent: String,

    /// Stylesheet that declares the card font.
    pub font_css_url: String,

    /// Base URL of the emoji SVG repository, without a trailing slash.
    pub emoji_base_url: String,

    /// Outbound request timeout. `None` leaves the transport default.
    pub http_timeout: Option<Duration>,

    /// Largest `og:image` accepted for inlining.
    pub max_image_bytes: usize,

    /// Port for the Prometheus `/metrics` listener, if enabled.
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8787".to_string(),
            variant: CardVariant::default(),
            user_agent: "bot".to_string(),
            font_css_url: DEFAULT_FONT_CSS_URL.to_string(),
            emoji_base_url: DEFAULT_EMOJI_BASE_URL.to_string(),
            http_timeout: None,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `OGCARD_BIND_ADDR`: Server bind address (default: "0.0.0.0:8787")
    /// - `OGCARD_VARIANT`: `landscape`, `portrait` or `compact` (default: "landscape")
    /// - `OGCARD_USER_AGENT`: Page fetch User-Agent (default: "bot")
    /// - `OGCARD_FONT_CSS_URL`: Font stylesheet URL (default: Noto Sans JP 700)
    /// - `OGCARD_EMOJI_BASE_URL`: Emoji SVG base URL (default: OpenMoji on jsDelivr)
    /// - `OGCARD_HTTP_TIMEOUT_SECS`: Outbound timeout in seconds (default: none)
    /// - `OGCARD_MAX_IMAGE_BYTES`: `og:image` size cap (default: 5000000)
    /// - `OGCARD_METRICS_PORT`: Prometheus listener port (default: disabled)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = std::env::var("OGCARD_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let variant = match std::env::var("OGCARD_VARIANT") {
            Ok(raw) => raw
                .parse::<CardVariant>()
                .map_err(|e| anyhow::anyhow!("OGCARD_VARIANT: {e}"))?,
            Err(_) => defaults.variant,
        };

        let user_agent = std::env::var("OGCARD_USER_AGENT").unwrap_or(defaults.user_agent);

        let font_css_url = std::env::var("OGCARD_FONT_CSS_URL").unwrap_or(defaults.font_css_url);

        let emoji_base_url = std::env::var("OGCARD_EMOJI_BASE_URL")
            .unwrap_or(defaults.emoji_base_url)
            .trim_end_matches('/')
            .to_string();

        let http_timeout = parse_var::<u64>("OGCARD_HTTP_TIMEOUT_SECS")?.map(Duration::from_secs);

        let max_image_bytes =
            parse_var::<usize>("OGCARD_MAX_IMAGE_BYTES")?.unwrap_or(defaults.max_image_bytes);

        let metrics_port = parse_var::<u16>("OGCARD_METRICS_PORT")?;

        tracing::info!(
            bind_addr = %bind_addr,
            variant = %variant,
            user_agent = %user_agent,
            font_css_url = %font_css_url,
            emoji_base_url = %emoji_base_url,
            http_timeout_secs = http_timeout.map(|t| t.as_secs()),
            max_image_bytes,
            metrics_port,
            "card configuration loaded"
        );

        Ok(Self {
            bind_addr,
            variant,
            user_agent,
            font_css_url,
            emoji_base_url,
            http_timeout,
            max_image_bytes,
            metrics_port,
        })
    }
}

/// Parse an optional numeric variable. Unset or blank means `None`.
fn parse_var<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{key}: invalid value '{raw}'")),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize config tests that manipulate env vars.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "OGCARD_BIND_ADDR",
        "OGCARD_VARIANT",
        "OGCARD_USER_AGENT",
        "OGCARD_FONT_CSS_URL",
        "OGCARD_EMOJI_BASE_URL",
        "OGCARD_HTTP_TIMEOUT_SECS",
        "OGCARD_MAX_IMAGE_BYTES",
        "OGCARD_METRICS_PORT",
    ];

    /// Helper to run config tests with isolated env vars.
    fn with_env_vars<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

        let saved: Vec<_> = ENV_KEYS
            .iter()
            .map(|k| (*k, std::env::var(k).ok()))
            .collect();

        // SAFETY: Serialized by mutex; only test code touches these vars.
        unsafe {
            for k in ENV_KEYS {
                std::env::remove_var(k);
            }
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
        }

        f();

        // SAFETY: Restoring original env state.
        unsafe {
            for (k, v) in &saved {
                match v {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn config_defaults() {
        with_env_vars(&[], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.bind_addr, "0.0.0.0:8787");
            assert_eq!(config.variant, CardVariant::Landscape);
            assert_eq!(config.user_agent, "bot");
            assert_eq!(config.font_css_url, DEFAULT_FONT_CSS_URL);
            assert_eq!(config.emoji_base_url, DEFAULT_EMOJI_BASE_URL);
            assert_eq!(config.http_timeout, None);
            assert_eq!(config.max_image_bytes, 5_000_000);
            assert_eq!(config.metrics_port, None);
        });
    }

    #[test]
    fn config_custom_values() {
        with_env_vars(
            &[
                ("OGCARD_BIND_ADDR", "127.0.0.1:9090"),
                ("OGCARD_VARIANT", "portrait"),
                ("OGCARD_USER_AGENT", "cardbot/1.0"),
                ("OGCARD_FONT_CSS_URL", "http://fonts.test/css"),
                ("OGCARD_HTTP_TIMEOUT_SECS", "7"),
                ("OGCARD_MAX_IMAGE_BYTES", "1024"),
                ("OGCARD_METRICS_PORT", "9091"),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.bind_addr, "127.0.0.1:9090");
                assert_eq!(config.variant, CardVariant::Portrait);
                assert_eq!(config.user_agent, "cardbot/1.0");
                assert_eq!(config.font_css_url, "http://fonts.test/css");
                assert_eq!(config.http_timeout, Some(Duration::from_secs(7)));
                assert_eq!(config.max_image_bytes, 1024);
                assert_eq!(config.metrics_port, Some(9091));
            },
        );
    }

    #[test]
    fn config_emoji_base_trailing_slash_stripped() {
        with_env_vars(&[("OGCARD_EMOJI_BASE_URL", "http://emoji.test/svg/")], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.emoji_base_url, "http://emoji.test/svg");
        });
    }

    #[test]
    fn config_unknown_variant_rejected() {
        with_env_vars(&[("OGCARD_VARIANT", "square")], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("OGCARD_VARIANT"));
        });
    }

    #[test]
    fn config_variant_case_insensitive() {
        with_env_vars(&[("OGCARD_VARIANT", "Compact")], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.variant, CardVariant::Compact);
        });
    }

    #[test]
    fn config_invalid_number_rejected() {
        with_env_vars(&[("OGCARD_MAX_IMAGE_BYTES", "lots")], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("OGCARD_MAX_IMAGE_BYTES"));
        });
        with_env_vars(&[("OGCARD_METRICS_PORT", "70000")], || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn config_blank_number_is_unset() {
        with_env_vars(&[("OGCARD_HTTP_TIMEOUT_SECS", " ")], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.http_timeout, None);
        });
    }
}
