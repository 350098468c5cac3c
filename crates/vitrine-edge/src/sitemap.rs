//! Direct delivery of `/sitemap.xml`.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

/// Path served by this module.
pub const SITEMAP_PATH: &str = "/sitemap.xml";

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Serve the sitemap, or `None` if it could not be fetched.
///
/// Failed fetches are not cached; concurrent misses share one upstream request.
pub async fn serve(state: &AppState) -> Option<Response> {
    let url = state.config.sitemap_url.clone();
    let http = state.http.clone();

    match state
        .sitemap
        .try_get_with(url.clone(), fetch(http, url.clone()))
        .await
    {
        Ok(body) => {
            metrics::counter!("edge_sitemap_total", "outcome" => "served").increment(1);
            Some(xml_response(body))
        }
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "sitemap fetch failed, passing through");
            metrics::counter!("edge_sitemap_total", "outcome" => "fallthrough").increment(1);
            None
        }
    }
}

async fn fetch(http: reqwest::Client, url: String) -> Result<Bytes, reqwest::Error> {
    let resp = http
        .get(&url)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;
    Ok(resp.bytes().await?)
}

fn xml_response(body: Bytes) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/xml")),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=3600"),
            ),
        ],
        body,
    )
        .into_response()
}
