//! Application state shared across all request handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use moka::future::Cache;

use crate::config::Config;

/// Sitemap body cache, keyed by source URL.
pub type SitemapCache = Cache<String, Bytes>;

/// How long a fetched sitemap is reused.
const SITEMAP_CACHE_TTL: Duration = Duration::from_secs(300);

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// Outbound client for origin, sitemap and prerender requests.
    ///
    /// Redirects are not followed so the client sees the origin's own answers.
    pub http: reqwest::Client,

    /// Recently fetched sitemap bodies.
    pub sitemap: SitemapCache,
}

impl AppState {
    /// Create a new application state from configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        let sitemap = Cache::builder()
            .max_capacity(4)
            .time_to_live(SITEMAP_CACHE_TTL)
            .build();

        tracing::info!(
            sitemap_ttl_secs = SITEMAP_CACHE_TTL.as_secs(),
            prerender_enabled = config.prerender_token.is_some(),
            "edge state initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            http,
            sitemap,
        })
    }
}
