//! Edge configuration loaded from environment variables.

use std::time::Duration;

/// Default prerendering service.
pub const DEFAULT_PRERENDER_URL: &str = "https://service.prerender.io";

/// Default bound on a prerender round trip.
pub const DEFAULT_PRERENDER_TIMEOUT: Duration = Duration::from_secs(8);

/// Edge dispatcher configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080").
    pub bind_addr: String,

    /// Origin server base URL, without a trailing slash.
    pub origin_url: String,

    /// Public site base URL used to build canonical prerender targets.
    pub site_url: String,

    /// Where the sitemap is fetched from.
    pub sitemap_url: String,

    /// Prerendering service base URL.
    pub prerender_url: String,

    /// Prerendering service token; `None` disables prerendering.
    pub prerender_token: Option<String>,

    /// Upper bound on a prerender round trip.
    pub prerender_timeout: Duration,

    /// Port for the Prometheus `/metrics` endpoint, if enabled.
    pub metrics_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `EDGE_BIND_ADDR`: Server bind address (default: "0.0.0.0:8080")
    /// - `ORIGIN_URL`: Origin base URL (default: "http://127.0.0.1:3000")
    /// - `SITE_URL`: Public base URL (default: "http://localhost:8080")
    /// - `SITEMAP_URL`: Sitemap source (default: "{ORIGIN_URL}/sitemap.xml")
    /// - `PRERENDER_URL`: Prerender service (default: "https://service.prerender.io")
    /// - `PRERENDER_TOKEN`: Prerender service token; unset disables prerendering
    /// - `PRERENDER_TIMEOUT_MS`: Prerender bound in milliseconds (default: 8000)
    /// - `METRICS_PORT`: Enables the Prometheus endpoint
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env_or("EDGE_BIND_ADDR", "0.0.0.0:8080");
        let origin_url = trim_url(env_or("ORIGIN_URL", "http://127.0.0.1:3000"));
        let site_url = trim_url(env_or("SITE_URL", "http://localhost:8080"));
        let sitemap_url = env_or("SITEMAP_URL", &format!("{origin_url}/sitemap.xml"));
        let prerender_url = trim_url(env_or("PRERENDER_URL", DEFAULT_PRERENDER_URL));

        let prerender_token = std::env::var("PRERENDER_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let prerender_timeout = match std::env::var("PRERENDER_TIMEOUT_MS") {
            Ok(ms) => Duration::from_millis(ms.parse::<u64>().map_err(|e| {
                anyhow::anyhow!("PRERENDER_TIMEOUT_MS must be a number of milliseconds: {e}")
            })?),
            Err(_) => DEFAULT_PRERENDER_TIMEOUT,
        };

        let metrics_port = match std::env::var("METRICS_PORT") {
            Ok(p) => Some(
                p.parse::<u16>()
                    .map_err(|e| anyhow::anyhow!("METRICS_PORT must be a port number: {e}"))?,
            ),
            Err(_) => None,
        };

        if prerender_token.is_none() {
            tracing::warn!("PRERENDER_TOKEN not set, crawler requests go straight to the origin");
        }

        tracing::info!(
            bind_addr = %bind_addr,
            origin_url = %origin_url,
            site_url = %site_url,
            prerender_url = %prerender_url,
            prerender_timeout_ms = prerender_timeout.as_millis() as u64,
            "edge configuration loaded"
        );

        Ok(Self {
            bind_addr,
            origin_url,
            site_url,
            sitemap_url,
            prerender_url,
            prerender_token,
            prerender_timeout,
            metrics_port,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
