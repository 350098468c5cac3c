//! HTML page handlers.
//!
//! Both handlers always answer 200 with a fully substituted shell. A post
//! that cannot be found, or a content store that cannot be reached, yields
//! the default page.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use vitrine_core::MetaProjection;

use crate::state::AppState;

/// CDN TTL for post pages, in seconds.
const POST_S_MAXAGE: u32 = 300;

/// CDN TTL for default pages, in seconds.
const DEFAULT_S_MAXAGE: u32 = 3600;

/// `GET /blog/{slug}`: the shell with the post's metadata.
pub async fn blog_post(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let slug = slug.trim();
    if slug.is_empty() {
        return default_response(&state, "empty_slug");
    }

    match state.content.resolve_post(slug).await {
        Ok(Some(post)) => {
            tracing::debug!(slug = %slug, id = %post.id, "post resolved");
            metrics::counter!("origin_page_requests_total", "outcome" => "post").increment(1);
            let meta = MetaProjection::for_post(&post, &state.config.site);
            html_response(state.shell.render(&meta), POST_S_MAXAGE)
        }
        Ok(None) => {
            tracing::debug!(slug = %slug, "no post matches slug");
            default_response(&state, "not_found")
        }
        Err(e) => {
            tracing::warn!(slug = %slug, error = %e, "content lookup failed, serving defaults");
            metrics::counter!("content_fetch_errors_total").increment(1);
            default_response(&state, "content_error")
        }
    }
}

/// Every non-post route: the shell rendered with the site defaults.
pub async fn default_page(State(state): State<AppState>) -> Response {
    default_response(&state, "default")
}

fn default_response(state: &AppState, outcome: &'static str) -> Response {
    metrics::counter!("origin_page_requests_total", "outcome" => outcome).increment(1);
    html_response(state.default_html.to_string(), DEFAULT_S_MAXAGE)
}

/// Build an HTML response with security and cache headers.
fn html_response(html: String, s_maxage: u32) -> Response {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    // ETag (xxHash of content)
    let hash = xxhash_rust::xxh3::xxh3_64(html.as_bytes());
    let etag = format!("\"{}\"", hex_fmt::HexFmt(&hash.to_be_bytes()));
    if let Ok(val) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, val);
    }

    let cache_value = format!("public, max-age=0, s-maxage={s_maxage}");
    if let Ok(val) = HeaderValue::from_str(&cache_value) {
        headers.insert(header::CACHE_CONTROL, val);
    }

    (StatusCode::OK, headers, html).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_response_headers() {
        let resp = html_response("<html></html>".to_string(), POST_S_MAXAGE);
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(
            headers[header::CACHE_CONTROL],
            "public, max-age=0, s-maxage=300"
        );
        let etag = headers[header::ETAG].to_str().unwrap();
        assert!(etag.starts_with('"') && etag.ends_with('"'));
        assert_eq!(etag.len(), 18);
    }

    #[test]
    fn etag_tracks_content() {
        let a = html_response("a".to_string(), DEFAULT_S_MAXAGE);
        let b = html_response("b".to_string(), DEFAULT_S_MAXAGE);
        let a2 = html_response("a".to_string(), DEFAULT_S_MAXAGE);
        assert_ne!(a.headers()[header::ETAG], b.headers()[header::ETAG]);
        assert_eq!(a.headers()[header::ETAG], a2.headers()[header::ETAG]);
    }
}
