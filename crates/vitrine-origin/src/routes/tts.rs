//! `POST /api/tts`: synthesize speech for a post, cached on disk.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::speech::{AudioCache, MAX_TEXT_CHARS, is_valid_post_id};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsRequest {
    #[serde(default)]
    post_id: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsResponse {
    audio_url: String,
    cached: bool,
}

pub async fn synthesize(
    State(state): State<AppState>,
    body: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Json<TtsResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let post_id = req.post_id.trim();
    let text = req.text.trim();
    if post_id.is_empty() || text.is_empty() {
        return Err(ApiError::BadRequest(
            "`postId` and `text` are required".to_string(),
        ));
    }
    if !is_valid_post_id(post_id) {
        return Err(ApiError::BadRequest(
            "`postId` may only contain letters, digits, `-` and `_`".to_string(),
        ));
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(ApiError::BadRequest(format!(
            "`text` exceeds {MAX_TEXT_CHARS} characters"
        )));
    }

    let file_name = AudioCache::file_name(post_id, text);
    let audio_url = format!("/audio/{file_name}");

    if state.audio.contains(&file_name).await {
        tracing::debug!(post_id = %post_id, file = %file_name, "speech cache hit");
        metrics::counter!("tts_requests_total", "outcome" => "cached").increment(1);
        return Ok(Json(TtsResponse {
            audio_url,
            cached: true,
        }));
    }

    let Some(speech) = &state.speech else {
        metrics::counter!("tts_requests_total", "outcome" => "unavailable").increment(1);
        return Err(ApiError::Unavailable(
            "text-to-speech is not configured".to_string(),
        ));
    };

    let audio = speech.synthesize(text).await.map_err(|e| {
        metrics::counter!("tts_requests_total", "outcome" => "upstream_error").increment(1);
        ApiError::Upstream(e.to_string())
    })?;

    state
        .audio
        .store(&file_name, &audio)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("storing {file_name}: {e}")))?;

    tracing::info!(
        post_id = %post_id,
        file = %file_name,
        bytes = audio.len(),
        "speech synthesized"
    );
    metrics::counter!("tts_requests_total", "outcome" => "synthesized").increment(1);

    Ok(Json(TtsResponse {
        audio_url,
        cached: false,
    }))
}
