//! Default Open Graph share image.
//!
//! Renders a 1200x630 PNG: dark background, accent bar, the site title
//! centred with an optional tagline underneath.

use anyhow::{Context, Result};
use vitrine_core::escape_html;

/// Standard Open Graph dimensions.
pub const OG_WIDTH: u32 = 1200;
pub const OG_HEIGHT: u32 = 630;

const FONT_FAMILY: &str = "Inter, -apple-system, BlinkMacSystemFont, Segoe UI, Roboto, sans-serif";

/// Colours and text for the image.
#[derive(Debug, Clone)]
pub struct OgImageSpec {
    pub title: String,
    pub tagline: Option<String>,
    pub background: String,
    pub foreground: String,
    pub accent: String,
}

impl OgImageSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tagline: None,
            background: "#0b0b0f".to_string(),
            foreground: "#ffffff".to_string(),
            accent: "#6366f1".to_string(),
        }
    }

    /// The SVG source rendered by [`render_png`].
    pub fn to_svg(&self) -> String {
        let mut svg = String::with_capacity(2048);
        svg.push_str(&format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="{bg}"/><rect x="0" y="{bar_y}" width="{w}" height="12" fill="{accent}"/>"##,
            w = OG_WIDTH,
            h = OG_HEIGHT,
            bg = escape_html(&self.background),
            accent = escape_html(&self.accent),
            bar_y = OG_HEIGHT - 12,
        ));

        let title_y = if self.tagline.is_some() {
            OG_HEIGHT / 2 - 30
        } else {
            OG_HEIGHT / 2
        };
        svg.push_str(&format!(
            r##"<text x="{x}" y="{y}" text-anchor="middle" dominant-baseline="central" font-family="{font}" font-size="{size}" font-weight="800" letter-spacing="-2" fill="{fg}">{title}</text>"##,
            x = OG_WIDTH / 2,
            y = title_y,
            font = FONT_FAMILY,
            size = title_font_size(&self.title),
            fg = escape_html(&self.foreground),
            title = escape_html(&self.title),
        ));

        if let Some(tagline) = &self.tagline {
            svg.push_str(&format!(
                r##"<text x="{x}" y="{y}" text-anchor="middle" dominant-baseline="central" font-family="{font}" font-size="36" font-weight="400" fill="{fg}" fill-opacity="0.7">{tagline}</text>"##,
                x = OG_WIDTH / 2,
                y = title_y + 90,
                font = FONT_FAMILY,
                fg = escape_html(&self.foreground),
                tagline = escape_html(tagline),
            ));
        }

        svg.push_str("</svg>");
        svg
    }
}

/// Shrink long titles so they fit on one line.
fn title_font_size(title: &str) -> u32 {
    match title.chars().count() {
        0..=16 => 112,
        17..=28 => 88,
        29..=44 => 64,
        _ => 48,
    }
}

/// Render the image as PNG bytes.
pub fn render_png(spec: &OgImageSpec) -> Result<Vec<u8>> {
    let svg = spec.to_svg();

    let mut options = resvg::usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = resvg::usvg::Tree::from_str(&svg, &options).context("SVG parse error")?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(OG_WIDTH, OG_HEIGHT)
        .context("failed to create pixmap")?;

    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap.as_mut());

    pixmap.encode_png().context("PNG encode error")
}
