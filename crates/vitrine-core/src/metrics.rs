//! Prometheus metrics helpers for the vitrine servers.
//!
//! # Usage
//!
//! ```rust,ignore
//! use vitrine_core::metrics::{try_init_metrics, start_metrics_server};
//!
//! if let Some(handle) = try_init_metrics() {
//!     start_metrics_server(9091, handle).await?;
//! }
//! metrics::counter!("edge_requests_total", "class" => "bot").increment(1);
//! ```
//!
//! Recording without an installed recorder is a no-op, so library code and
//! tests can record unconditionally.

use std::net::SocketAddr;

use axum::{Router, routing::get};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Try to install the Prometheus recorder.
///
/// Returns `None` if a recorder is already installed. Metric descriptions are
/// registered on success.
pub fn try_init_metrics() -> Option<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder().ok()?;
    register_metrics();
    Some(handle)
}

/// Serve `/metrics` on the given port from a background task.
pub async fn start_metrics_server(
    port: u16,
    handle: PrometheusHandle,
) -> Result<(), std::io::Error> {
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "metrics server listening");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "metrics server stopped");
        }
    });

    Ok(())
}

fn register_metrics() {
    // Edge dispatcher
    describe_counter!(
        "edge_requests_total",
        "Requests seen by the edge dispatcher (label: class)"
    );
    describe_counter!(
        "edge_prerender_total",
        "Prerender forwarding attempts (label: outcome)"
    );
    describe_counter!(
        "edge_sitemap_total",
        "Sitemap short-circuit results (label: outcome)"
    );

    // Origin
    describe_counter!(
        "origin_page_requests_total",
        "HTML pages served by the origin (label: outcome)"
    );
    describe_counter!(
        "content_fetch_errors_total",
        "Content store lookups that failed"
    );
    describe_counter!(
        "tts_requests_total",
        "Text-to-speech requests (label: outcome)"
    );
}
