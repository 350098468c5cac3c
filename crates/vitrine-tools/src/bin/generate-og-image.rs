//! Default share image generator.
//!
//! # Usage
//!
//! ```bash
//! generate-og-image --out public/og-image.png --title "Studio" --tagline "Websites that work"
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use vitrine_tools::og_image::{OgImageSpec, render_png};

/// Default share image generator.
#[derive(Parser, Debug)]
#[command(name = "generate-og-image")]
#[command(about = "Render the 1200x630 Open Graph image")]
#[command(version)]
struct Args {
    /// Output PNG file
    #[arg(long, short, default_value = "public/og-image.png")]
    out: PathBuf,

    /// Headline text
    #[arg(long, env = "SITE_NAME")]
    title: String,

    /// Smaller line under the headline
    #[arg(long)]
    tagline: Option<String>,

    /// Background colour
    #[arg(long, default_value = "#0b0b0f")]
    background: String,

    /// Accent bar colour
    #[arg(long, default_value = "#6366f1")]
    accent: String,
}

fn main() -> Result<()> {
    vitrine_tools::load_dotenv(&std::env::var("DOTENV_PATH").unwrap_or_else(|_| ".env".into()))?;
    vitrine_tools::init_tracing();
    let args = Args::parse();

    let mut spec = OgImageSpec::new(args.title);
    spec.tagline = args.tagline.filter(|t| !t.trim().is_empty());
    spec.background = args.background;
    spec.accent = args.accent;

    let png = render_png(&spec)?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(&args.out, &png).with_context(|| format!("writing {}", args.out.display()))?;

    tracing::info!(out = %args.out.display(), bytes = png.len(), "share image written");
    Ok(())
}
