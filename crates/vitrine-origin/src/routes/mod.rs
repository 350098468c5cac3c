//! HTTP route definitions.

mod debug;
mod health;
mod page;
mod tts;

use axum::Router;
use axum::routing::{MethodRouter, get, post};
use tower_http::services::ServeDir;

use crate::state::AppState;

/// Build the complete origin router.
///
/// # Route Structure
///
/// - `GET /health` - Health check
/// - `GET /blog/{slug}` - Post page with per-post metadata
/// - `GET /`, `GET /index.html` - Default page
/// - `GET /debug-social?url=/path` - Crawler view report
/// - `POST /api/tts` - Text-to-speech
/// - `GET /audio/*` - Cached speech files
/// - anything else - Static file from the SPA build, or the default page
pub fn router(state: AppState) -> Router {
    // Directory requests fall through to the default page, so the raw shell
    // with unsubstituted placeholders is never served.
    let default_page: MethodRouter = get(page::default_page).with_state(state.clone());
    let static_files = ServeDir::new(&state.config.dist_dir)
        .append_index_html_on_directories(false)
        .fallback(default_page);

    let audio_files = ServeDir::new(state.audio.dir());

    Router::new()
        .route("/health", get(health::health_check))
        .route("/", get(page::default_page))
        .route("/index.html", get(page::default_page))
        .route("/blog/{slug}", get(page::blog_post))
        .route("/debug-social", get(debug::debug_social))
        .route("/api/tts", post(tts::synthesize))
        .nest_service("/audio", audio_files)
        .fallback_service(static_files)
        .with_state(state)
}
