//! Vitrine Tools - build-time utilities for the vitrine site.
//!
//! - [`sitemap`]: sitemaps.org XML from static routes and published posts
//! - [`og_image`]: the default 1200x630 share image
//! - [`webhook`]: Contentful webhook setup for rebuild-on-publish

pub mod og_image;
pub mod sitemap;
pub mod webhook;

/// Install the stderr tracing subscriber used by every tool binary.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load a `.env` file if it exists.
pub fn load_dotenv(path: &str) -> anyhow::Result<()> {
    if std::path::Path::new(path).exists() {
        dotenvy::from_path(path)?;
        eprintln!("Loaded environment from {path}");
    }
    Ok(())
}
