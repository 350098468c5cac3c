//! The edge request dispatcher.

use axum::Router;
use axum::extract::{Request, State};
use axum::http::{Method, header};
use axum::response::Response;
use vitrine_core::{RequestClass, classify};

use crate::state::AppState;
use crate::{prerender, proxy, sitemap};

/// Build the edge router: a single fallback handler for every path and method.
pub fn router(state: AppState) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

/// Route one request: sitemap, prerender or pass-through.
pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let readable = parts.method == Method::GET || parts.method == Method::HEAD;

    // A failed sitemap fetch falls through to the origin like any other path.
    if readable
        && parts.uri.path() == sitemap::SITEMAP_PATH
        && let Some(resp) = sitemap::serve(&state).await
    {
        return resp;
    }

    let user_agent = parts
        .headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok());
    let class = classify(user_agent, parts.uri.query());
    metrics::counter!("edge_requests_total", "class" => class.as_str()).increment(1);

    match class {
        RequestClass::RecursivePrerender => {
            tracing::debug!(path = %parts.uri.path(), "request from prerenderer, passing through");
        }
        class if class.wants_prerender() && parts.method == Method::GET => {
            tracing::debug!(path = %parts.uri.path(), class = %class, "prerender candidate");
            if let Some(resp) = prerender::forward(&state, &parts).await {
                return resp;
            }
        }
        _ => {}
    }

    proxy::forward(&state, parts, body).await
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::body::{Body, Bytes};
    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use tower::ServiceExt;

    use crate::config::Config;

    const TOKEN: &str = "tok";

    #[derive(Clone, Default)]
    struct Hits {
        origin: Arc<AtomicUsize>,
        sitemap: Arc<AtomicUsize>,
        prerender: Arc<AtomicUsize>,
    }

    async fn origin_echo(
        State(hits): State<Hits>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        hits.origin.fetch_add(1, Ordering::SeqCst);
        let host = headers
            .get("x-forwarded-host")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        (
            [("x-origin", "yes")],
            format!(
                "origin {method} {uri} host={host} body={}",
                String::from_utf8_lossy(&body)
            ),
        )
            .into_response()
    }

    async fn origin_sitemap(State(hits): State<Hits>) -> Response {
        hits.sitemap.fetch_add(1, Ordering::SeqCst);
        (
            [(header::CONTENT_TYPE, "text/xml")],
            "<urlset></urlset>",
        )
            .into_response()
    }

    async fn prerender_service(
        State(hits): State<Hits>,
        uri: Uri,
        headers: HeaderMap,
    ) -> Response {
        hits.prerender.fetch_add(1, Ordering::SeqCst);
        if headers.get("x-prerender-token").and_then(|v| v.to_str().ok()) != Some(TOKEN) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        let target = uri.to_string();
        if target.contains("/slow") {
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
        if target.contains("/broken") {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        let ua = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        let cookie = headers.contains_key(header::COOKIE);
        (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            format!("prerendered {target} ua={ua} cookie={cookie}"),
        )
            .into_response()
    }

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    struct Harness {
        app: Router,
        hits: Hits,
    }

    async fn harness(configure: impl FnOnce(&mut Config)) -> Harness {
        let hits = Hits::default();
        let origin = spawn(
            Router::new()
                .route("/sitemap.xml", get(origin_sitemap))
                .fallback(origin_echo)
                .with_state(hits.clone()),
        )
        .await;
        let prerender = spawn(
            Router::new()
                .fallback(prerender_service)
                .with_state(hits.clone()),
        )
        .await;

        let mut config = Config {
            bind_addr: "127.0.0.1:0".into(),
            sitemap_url: format!("{origin}/sitemap.xml"),
            origin_url: origin,
            site_url: "https://example.com".into(),
            prerender_url: prerender,
            prerender_token: Some(TOKEN.into()),
            prerender_timeout: Duration::from_millis(300),
            metrics_port: None,
        };
        configure(&mut config);

        let state = AppState::new(config).unwrap();
        Harness {
            app: router(state),
            hits,
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let resp = app.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get_as(uri: &str, user_agent: &str) -> Request<Body> {
        axum::http::Request::get(uri)
            .header(header::USER_AGENT, user_agent)
            .header(header::HOST, "example.com")
            .header(header::COOKIE, "session=1")
            .body(Body::empty())
            .unwrap()
    }

    const BROWSER: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) Safari/605.1.15";

    #[tokio::test]
    async fn browsers_pass_through_to_origin() {
        let h = harness(|_| {}).await;
        let (status, headers, body) = send(&h.app, get_as("/blog/post?x=1", BROWSER)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["x-origin"], "yes");
        assert!(headers.get(prerender::PRERENDERED_HEADER).is_none());
        assert_eq!(body, "origin GET /blog/post?x=1 host=example.com body=");
        assert_eq!(h.hits.prerender.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bots_are_prerendered() {
        let h = harness(|_| {}).await;
        let (status, headers, body) = send(&h.app, get_as("/blog/post", "Twitterbot/1.0")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[prerender::PRERENDERED_HEADER], "true");
        assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(
            body,
            "prerendered /https://example.com/blog/post ua=Twitterbot/1.0 cookie=false"
        );
        assert_eq!(h.hits.origin.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn escaped_fragment_is_prerendered() {
        let h = harness(|_| {}).await;
        let (_, headers, body) =
            send(&h.app, get_as("/services?_escaped_fragment_=", BROWSER)).await;
        assert_eq!(headers[prerender::PRERENDERED_HEADER], "true");
        assert!(body.starts_with("prerendered /https://example.com/services?_escaped_fragment_="));
    }

    #[tokio::test]
    async fn prerenderer_itself_is_never_forwarded() {
        let h = harness(|_| {}).await;
        let ua = "Mozilla/5.0 (compatible; Googlebot/2.1) \
                  Prerender (+https://github.com/prerender/prerender)";
        let (_, headers, body) = send(&h.app, get_as("/blog/post", ua)).await;
        assert!(headers.get(prerender::PRERENDERED_HEADER).is_none());
        assert!(body.starts_with("origin GET /blog/post"));
        assert_eq!(h.hits.prerender.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn prerender_timeout_falls_back_to_origin() {
        let h = harness(|_| {}).await;
        let started = std::time::Instant::now();
        let (status, headers, body) = send(&h.app, get_as("/slow", "Googlebot/2.1")).await;
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get(prerender::PRERENDERED_HEADER).is_none());
        assert!(body.starts_with("origin GET /slow"));
    }

    #[tokio::test]
    async fn prerender_error_status_falls_back_to_origin() {
        let h = harness(|_| {}).await;
        let (_, headers, body) = send(&h.app, get_as("/broken", "bingbot/2.0")).await;
        assert!(headers.get(prerender::PRERENDERED_HEADER).is_none());
        assert!(body.starts_with("origin GET /broken"));
        assert_eq!(h.hits.prerender.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bad_token_falls_back_to_origin() {
        let h = harness(|c| c.prerender_token = Some("wrong".into())).await;
        let (_, _, body) = send(&h.app, get_as("/blog/post", "Twitterbot/1.0")).await;
        assert!(body.starts_with("origin GET /blog/post"));
    }

    #[tokio::test]
    async fn missing_token_disables_prerendering() {
        let h = harness(|c| c.prerender_token = None).await;
        let (_, _, body) = send(&h.app, get_as("/blog/post", "Twitterbot/1.0")).await;
        assert!(body.starts_with("origin GET /blog/post"));
        assert_eq!(h.hits.prerender.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bot_posts_are_not_prerendered() {
        let h = harness(|_| {}).await;
        let request = axum::http::Request::post("/api/tts")
            .header(header::USER_AGENT, "Googlebot/2.1")
            .body(Body::from("{\"a\":1}"))
            .unwrap();
        let (_, _, body) = send(&h.app, request).await;
        assert_eq!(body, "origin POST /api/tts host=- body={\"a\":1}");
    }

    #[tokio::test]
    async fn sitemap_served_directly_and_cached() {
        let h = harness(|_| {}).await;
        for _ in 0..2 {
            let (status, headers, body) = send(&h.app, get_as("/sitemap.xml", BROWSER)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(headers[header::CONTENT_TYPE], "application/xml");
            assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=3600");
            assert_eq!(body, "<urlset></urlset>");
        }
        assert_eq!(h.hits.sitemap.load(Ordering::SeqCst), 1);
        assert_eq!(h.hits.origin.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn sitemap_failure_falls_through() {
        let h = harness(|c| c.sitemap_url = "http://127.0.0.1:9/sitemap.xml".into()).await;
        let (status, headers, body) = send(&h.app, get_as("/sitemap.xml", BROWSER)).await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(headers[header::CONTENT_TYPE], "application/xml");
        // The pass-through reaches the origin's own sitemap route.
        assert_eq!(body, "<urlset></urlset>");
        assert_eq!(h.hits.sitemap.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn origin_down_is_bad_gateway() {
        let h = harness(|c| {
            c.origin_url = "http://127.0.0.1:9".into();
            c.prerender_token = None;
        })
        .await;
        let (status, _, body) = send(&h.app, get_as("/", BROWSER)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, "origin unavailable");
    }

    #[tokio::test]
    async fn oversized_body_rejected() {
        let h = harness(|_| {}).await;
        let request = axum::http::Request::post("/upload")
            .body(Body::from(vec![b'x'; proxy::MAX_BODY_BYTES + 1]))
            .unwrap();
        let (status, _, _) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(h.hits.origin.load(Ordering::SeqCst), 0);
    }
}
