//! Forwarding crawler requests to the prerendering service.

use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

/// Request headers carried through to the prerendering service.
pub const FORWARDED_HEADERS: [HeaderName; 4] = [
    header::USER_AGENT,
    header::ACCEPT_LANGUAGE,
    header::ACCEPT_ENCODING,
    header::ACCEPT,
];

/// Marker added to prerendered responses.
pub const PRERENDERED_HEADER: &str = "x-prerendered";

const TOKEN_HEADER: &str = "x-prerender-token";

/// Why a prerender attempt did not produce a response.
#[derive(Debug)]
enum Miss {
    Disabled,
    Timeout,
    Status(StatusCode),
    Transport(reqwest::Error),
}

impl Miss {
    fn outcome(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Timeout => "timeout",
            Self::Status(_) => "bad_status",
            Self::Transport(_) => "error",
        }
    }
}

/// Canonical prerender target: `{service}/{site}{path}?{query}`.
pub fn target_url(prerender_url: &str, site_url: &str, parts: &Parts) -> String {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    format!("{prerender_url}/{site_url}{path_and_query}")
}

/// Try to prerender the request. `None` means "continue to the origin".
pub async fn forward(state: &AppState, parts: &Parts) -> Option<Response> {
    let path = parts.uri.path();
    match attempt(state, parts).await {
        Ok(resp) => {
            tracing::debug!(path = %path, "served prerendered page");
            metrics::counter!("edge_prerender_total", "outcome" => "success").increment(1);
            Some(resp)
        }
        Err(miss) => {
            match &miss {
                Miss::Disabled => tracing::debug!(path = %path, "prerendering disabled"),
                Miss::Timeout => {
                    tracing::warn!(path = %path, "prerender timed out, passing through")
                }
                Miss::Status(status) => {
                    tracing::warn!(
                        path = %path,
                        status = status.as_u16(),
                        "prerender refused, passing through"
                    )
                }
                Miss::Transport(e) => {
                    tracing::warn!(path = %path, error = %e, "prerender failed, passing through")
                }
            }
            metrics::counter!("edge_prerender_total", "outcome" => miss.outcome()).increment(1);
            None
        }
    }
}

async fn attempt(state: &AppState, parts: &Parts) -> Result<Response, Miss> {
    let config = &state.config;
    let token = config.prerender_token.as_deref().ok_or(Miss::Disabled)?;
    let url = target_url(&config.prerender_url, &config.site_url, parts);

    let mut headers = HeaderMap::new();
    for name in &FORWARDED_HEADERS {
        if let Some(value) = parts.headers.get(name) {
            headers.insert(name.clone(), value.clone());
        }
    }

    // One timeout covers both the response head and the body.
    let fetch = async {
        let resp = state
            .http
            .get(&url)
            .headers(headers)
            .header(TOKEN_HEADER, token)
            .send()
            .await?;
        let status = resp.status();
        let content_type = resp.headers().get(header::CONTENT_TYPE).cloned();
        let content_encoding = resp.headers().get(header::CONTENT_ENCODING).cloned();
        let body = resp.bytes().await?;
        Ok::<_, reqwest::Error>((status, content_type, content_encoding, body))
    };

    let (status, content_type, content_encoding, body) =
        tokio::time::timeout(config.prerender_timeout, fetch)
            .await
            .map_err(|_| Miss::Timeout)?
            .map_err(Miss::Transport)?;

    if !status.is_success() {
        return Err(Miss::Status(status));
    }

    let mut out = HeaderMap::new();
    out.insert(
        header::CONTENT_TYPE,
        content_type.unwrap_or_else(|| HeaderValue::from_static("text/html; charset=utf-8")),
    );
    if let Some(encoding) = content_encoding {
        out.insert(header::CONTENT_ENCODING, encoding);
    }
    out.insert(PRERENDERED_HEADER, HeaderValue::from_static("true"));

    Ok((status, out, body).into_response())
}
