//! Text-to-speech for blog posts.
//!
//! Audio is produced by the ElevenLabs API and stored in a content-addressed
//! cache: `{post_id}-{md5(text)}.mp3`. Identical text for the same post is
//! synthesized once; edited text gets a new file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use md5::{Digest, Md5};
use serde::Serialize;

/// Default ElevenLabs API base URL.
pub const DEFAULT_API_URL: &str = "https://api.elevenlabs.io";

/// Longest text accepted in a single synthesis request.
pub const MAX_TEXT_CHARS: usize = 5000;

/// ElevenLabs connection settings.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub api_url: String,
    pub api_key: String,
    pub voice_id: String,
    pub model_id: String,
}

impl SpeechConfig {
    /// Settings with the stock voice and multilingual model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
        }
    }
}

/// Errors from the speech API.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// Transport failure or timeout.
    #[error("speech request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("speech API returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Start of the response body, for diagnostics.
        body: String,
    },
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// Client for the text-to-speech endpoint.
#[derive(Debug, Clone)]
pub struct SpeechClient {
    http: reqwest::Client,
    config: Arc<SpeechConfig>,
}

impl SpeechClient {
    /// Build a client. Synthesis of long posts can take a while, hence the generous timeout.
    pub fn new(config: SpeechConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// Synthesize `text` and return MP3 bytes.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.config.api_url, self.config.voice_id
        );
        let body = SynthesisRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
            },
        };

        let resp = self
            .http
            .post(&url)
            .header("xi-api-key", &self.config.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SpeechError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

/// Content-addressed directory of synthesized audio.
#[derive(Debug, Clone)]
pub struct AudioCache {
    dir: PathBuf,
}

impl AudioCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file name for a post's text: `{post_id}-{md5(text)}.mp3`.
    pub fn file_name(post_id: &str, text: &str) -> String {
        let digest = Md5::digest(text.as_bytes());
        format!("{post_id}-{}.mp3", hex::encode(digest))
    }

    /// Whether a cached file exists.
    pub async fn contains(&self, file_name: &str) -> bool {
        tokio::fs::try_exists(self.dir.join(file_name))
            .await
            .unwrap_or(false)
    }

    /// Store audio atomically (write to a unique temp file, then rename).
    ///
    /// Concurrent writers of the same name all succeed; file names are content
    /// addressed, so whichever rename lands last leaves identical bytes.
    pub async fn store(&self, file_name: &str, audio: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let dir = self.dir.clone();
        let target = self.dir.join(file_name);
        let audio = audio.to_vec();

        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = tempfile::Builder::new()
                .prefix(".audio-")
                .suffix(".tmp")
                .tempfile_in(&dir)?;
            tmp.write_all(&audio)?;
            match tmp.persist(&target) {
                Ok(_) => Ok(()),
                Err(_) if target.exists() => Ok(()),
                Err(e) => Err(e.error),
            }
        })
        .await
        .map_err(std::io::Error::other)?
    }
}

/// Post IDs become part of a file name, so only `[A-Za-z0-9_-]` is accepted.
pub fn is_valid_post_id(post_id: &str) -> bool {
    !post_id.is_empty()
        && post_id.len() <= 128
        && post_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
