//! Sitemap generator.
//!
//! Lists every published post from the content store and writes
//! `sitemap.xml` for the static build.
//!
//! # Usage
//!
//! ```bash
//! generate-sitemap --out dist/sitemap.xml
//! generate-sitemap --out dist/sitemap.xml --route / --route /services
//! generate-sitemap --api-url https://preview.contentful.com
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use vitrine_core::content::DEFAULT_API_URL;
use vitrine_core::{ContentfulClient, ContentfulConfig};
use vitrine_tools::sitemap::{self, DEFAULT_ROUTES};

/// Sitemap generator.
#[derive(Parser, Debug)]
#[command(name = "generate-sitemap")]
#[command(about = "Write sitemap.xml from static routes and published posts")]
#[command(version)]
struct Args {
    /// Output file
    #[arg(long, short, default_value = "dist/sitemap.xml")]
    out: PathBuf,

    /// Static route to include (repeatable; defaults to the site's main pages)
    #[arg(long = "route")]
    routes: Vec<String>,

    /// Public base URL
    #[arg(long, env = "SITE_URL", default_value = "http://localhost:3000")]
    site_url: String,

    /// Content store space
    #[arg(long, env = "CONTENTFUL_SPACE_ID")]
    space_id: String,

    /// Delivery API token
    #[arg(long, env = "CONTENTFUL_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// Content store environment
    #[arg(long, env = "CONTENTFUL_ENVIRONMENT", default_value = "master")]
    environment: String,

    /// Delivery API base URL
    #[arg(long, env = "CONTENTFUL_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Write only static routes if the content store is unreachable
    #[arg(long)]
    allow_partial: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    vitrine_tools::load_dotenv(&std::env::var("DOTENV_PATH").unwrap_or_else(|_| ".env".into()))?;
    vitrine_tools::init_tracing();
    let args = Args::parse();

    let routes: Vec<String> = if args.routes.is_empty() {
        DEFAULT_ROUTES.iter().map(|r| r.to_string()).collect()
    } else {
        args.routes.clone()
    };

    let client = ContentfulClient::new(contentful_config(&args))?;

    let posts = match client.list_posts().await {
        Ok(posts) => posts,
        Err(e) if args.allow_partial => {
            tracing::warn!(error = %e, "content store unavailable, writing static routes only");
            Vec::new()
        }
        Err(e) => return Err(e).context("listing posts"),
    };

    let mut entries = sitemap::static_entries(&args.site_url, &routes);
    entries.extend(sitemap::post_entries(&args.site_url, &posts));
    let xml = sitemap::render(&entries);

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(&args.out, xml).with_context(|| format!("writing {}", args.out.display()))?;

    tracing::info!(
        out = %args.out.display(),
        routes = routes.len(),
        posts = posts.len(),
        "sitemap written"
    );
    Ok(())
}

fn contentful_config(args: &Args) -> ContentfulConfig {
    let mut config = ContentfulConfig::new(&args.space_id, &args.access_token);
    config.environment = args.environment.clone();
    config.api_url = args.api_url.trim_end_matches('/').to_string();
    config
}
