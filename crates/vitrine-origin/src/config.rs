//! Origin configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use vitrine_core::content::{ContentfulConfig, DEFAULT_API_URL};
use vitrine_core::meta::SiteDefaults;

use crate::speech::SpeechConfig;

/// Origin server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:3000").
    pub bind_addr: String,

    /// Directory holding the built SPA (static assets).
    pub dist_dir: PathBuf,

    /// HTML shell with `__META_*__` placeholders, read once at startup.
    pub shell_path: PathBuf,

    /// Site-wide metadata defaults, including the public base URL.
    pub site: SiteDefaults,

    /// Content store connection.
    pub contentful: ContentfulConfig,

    /// Text-to-speech settings; `None` disables `/api/tts`.
    pub speech: Option<SpeechConfig>,

    /// Directory of the content-addressed speech cache.
    pub audio_dir: PathBuf,

    /// Port for the Prometheus `/metrics` endpoint, if enabled.
    pub metrics_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `CONTENTFUL_SPACE_ID`: Content store space
    /// - `CONTENTFUL_ACCESS_TOKEN`: Delivery API token
    ///
    /// Optional:
    /// - `ORIGIN_BIND_ADDR`: Server bind address (default: "0.0.0.0:3000")
    /// - `SITE_DIST_DIR`: Built SPA directory (default: "dist")
    /// - `SITE_SHELL_PATH`: HTML shell (default: "{SITE_DIST_DIR}/index.html")
    /// - `SITE_URL`: Public base URL (default: "http://localhost:3000")
    /// - `SITE_NAME`, `SITE_TITLE`, `SITE_DESCRIPTION`, `SITE_AUTHOR`, `SITE_KEYWORDS`
    /// - `SITE_OG_IMAGE`: Default share image (default: "{SITE_URL}/og-image.png")
    /// - `CONTENTFUL_ENVIRONMENT` (default: "master"), `CONTENTFUL_API_URL`
    /// - `ELEVENLABS_API_KEY`: Enables text-to-speech
    /// - `ELEVENLABS_VOICE_ID`, `ELEVENLABS_MODEL_ID`, `ELEVENLABS_API_URL`
    /// - `AUDIO_CACHE_DIR`: Speech cache (default: "audio-cache")
    /// - `METRICS_PORT`: Enables the Prometheus endpoint
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env_or("ORIGIN_BIND_ADDR", "0.0.0.0:3000");

        let dist_dir = PathBuf::from(env_or("SITE_DIST_DIR", "dist"));
        let shell_path = std::env::var("SITE_SHELL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dist_dir.join("index.html"));

        let base_url = env_or("SITE_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();
        let site_name = env_or("SITE_NAME", "Vitrine");
        let site = SiteDefaults {
            title: env_or("SITE_TITLE", &site_name),
            description: env_or("SITE_DESCRIPTION", "Portfolio, services and writing."),
            og_image: env_or("SITE_OG_IMAGE", &format!("{base_url}/og-image.png")),
            author: env_or("SITE_AUTHOR", &site_name),
            keywords: env_or("SITE_KEYWORDS", ""),
            site_name,
            base_url,
        };

        let space_id = std::env::var("CONTENTFUL_SPACE_ID")
            .map_err(|_| anyhow::anyhow!("CONTENTFUL_SPACE_ID environment variable is required"))?;
        let access_token = std::env::var("CONTENTFUL_ACCESS_TOKEN").map_err(|_| {
            anyhow::anyhow!("CONTENTFUL_ACCESS_TOKEN environment variable is required")
        })?;
        let mut contentful = ContentfulConfig::new(space_id, access_token);
        contentful.environment = env_or("CONTENTFUL_ENVIRONMENT", "master");
        contentful.api_url = env_or("CONTENTFUL_API_URL", DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();
        contentful.timeout = Duration::from_secs(5);

        let speech = std::env::var("ELEVENLABS_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(|api_key| {
                let mut speech = SpeechConfig::new(api_key);
                if let Ok(voice) = std::env::var("ELEVENLABS_VOICE_ID") {
                    speech.voice_id = voice;
                }
                if let Ok(model) = std::env::var("ELEVENLABS_MODEL_ID") {
                    speech.model_id = model;
                }
                if let Ok(url) = std::env::var("ELEVENLABS_API_URL") {
                    speech.api_url = url.trim_end_matches('/').to_string();
                }
                speech
            });

        let audio_dir = PathBuf::from(env_or("AUDIO_CACHE_DIR", "audio-cache"));

        let metrics_port = match std::env::var("METRICS_PORT") {
            Ok(p) => Some(
                p.parse::<u16>()
                    .map_err(|e| anyhow::anyhow!("METRICS_PORT must be a port number: {e}"))?,
            ),
            Err(_) => None,
        };

        tracing::info!(
            bind_addr = %bind_addr,
            dist_dir = %dist_dir.display(),
            shell = %shell_path.display(),
            base_url = %site.base_url,
            contentful_env = %contentful.environment,
            speech_enabled = speech.is_some(),
            "origin configuration loaded"
        );

        Ok(Self {
            bind_addr,
            dist_dir,
            shell_path,
            site,
            contentful,
            speech,
            audio_dir,
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
