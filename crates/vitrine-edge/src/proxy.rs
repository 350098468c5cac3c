//! Pass-through to the origin server.

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

/// Largest request body forwarded to the origin.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Connection-scoped headers that must not cross a proxy.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Copy headers, dropping hop-by-hop ones and anything named in `Connection`.
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let connection_listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if HOP_BY_HOP.contains(&name.as_str())
            || connection_listed.iter().any(|c| c == name.as_str())
        {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Proxy the request to the origin and relay its answer.
pub async fn forward(state: &AppState, parts: Parts, body: Body) -> Response {
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!(error = %e, "request body rejected");
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{}{}", state.config.origin_url, path_and_query);

    let mut headers = forwardable_headers(&parts.headers);
    if let Some(host) = headers.remove(header::HOST) {
        headers.insert(HeaderName::from_static("x-forwarded-host"), host);
    }

    let result = state
        .http
        .request(parts.method.clone(), &url)
        .headers(headers)
        .body(body)
        .send()
        .await;

    let resp = match result {
        Ok(resp) => resp,
        Err(e) => {
            tracing::error!(url = %url, error = %e, "origin unreachable");
            return bad_gateway();
        }
    };

    let status = resp.status();
    let mut out_headers = forwardable_headers(resp.headers());
    out_headers.remove(header::CONTENT_LENGTH);

    let bytes: Bytes = match resp.bytes().await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(url = %url, error = %e, "origin response interrupted");
            return bad_gateway();
        }
    };

    (status, out_headers, bytes).into_response()
}

fn bad_gateway() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        "origin unavailable",
    )
        .into_response()
}
