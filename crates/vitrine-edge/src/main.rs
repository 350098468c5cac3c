//! Vitrine Edge - dispatcher in front of the origin server.

use axum::http::Request;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use vitrine_core::metrics::{start_metrics_server, try_init_metrics};
use vitrine_edge::{AppState, Config, router};

/// Edge dispatcher for the vitrine site.
#[derive(Parser, Debug)]
#[command(name = "vitrine-edge")]
#[command(
    about = "Sitemap delivery, crawler prerendering and origin pass-through",
    long_about = None
)]
struct Args {
    /// Path to .env file (optional).
    #[arg(long, env = "DOTENV_PATH", default_value = ".env")]
    dotenv: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if std::path::Path::new(&args.dotenv).exists() {
        dotenvy::from_path(&args.dotenv)?;
        eprintln!("Loaded environment from {}", args.dotenv);
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();

    if let Some(port) = config.metrics_port
        && let Some(handle) = try_init_metrics()
    {
        start_metrics_server(port, handle).await?;
    }

    let state = AppState::new(config)?;

    let app = router(state).layer(TraceLayer::new_for_http().make_span_with(
        |request: &Request<_>| {
            tracing::span!(
                Level::INFO,
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        },
    ));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "starting edge dispatcher");

    axum::serve(listener, app).await?;

    Ok(())
}
