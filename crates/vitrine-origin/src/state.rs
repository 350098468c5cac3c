//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use vitrine_core::{ContentfulClient, MetaProjection, Shell};

use crate::config::Config;
use crate::speech::{AudioCache, SpeechClient};

/// Shared application state available to all request handlers.
///
/// Everything here is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// HTML shell, read once at startup.
    pub shell: Arc<Shell>,

    /// Shell rendered with the site defaults.
    pub default_html: Arc<str>,

    /// Content store client.
    pub content: ContentfulClient,

    /// Plain HTTP client for `/debug-social` fetches.
    pub http: reqwest::Client,

    /// Text-to-speech client, if an API key is configured.
    pub speech: Option<SpeechClient>,

    /// On-disk speech cache.
    pub audio: AudioCache,
}

impl AppState {
    /// Build state from configuration. Fails if the HTML shell cannot be read.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let shell = Shell::load(&config.shell_path)?;
        Self::with_shell(config, shell)
    }

    /// Build state around an already-loaded shell.
    pub fn with_shell(config: Config, shell: Shell) -> anyhow::Result<Self> {
        let default_html: Arc<str> = shell
            .render(&MetaProjection::defaults(&config.site))
            .into();

        let content = ContentfulClient::new(config.contentful.clone())?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        let speech = config
            .speech
            .clone()
            .map(SpeechClient::new)
            .transpose()?;

        let audio = AudioCache::new(config.audio_dir.clone());

        Ok(Self {
            config: Arc::new(config),
            shell: Arc::new(shell),
            default_html,
            content,
            http,
            speech,
            audio,
        })
    }
}
