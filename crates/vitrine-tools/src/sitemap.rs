//! Sitemap generation.
//!
//! Produces a sitemaps.org `urlset` document. Static routes come first, then
//! posts in the order the content store returned them (newest first).

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate};
use vitrine_core::BlogPost;

/// Routes listed when none are given on the command line.
pub const DEFAULT_ROUTES: &[&str] = &[
    "/",
    "/services",
    "/portfolio",
    "/about",
    "/blog",
    "/contact",
];

/// How often a page is expected to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Weekly,
    Monthly,
}

impl ChangeFreq {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// One `<url>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

/// Entries for fixed site routes. The home page gets the top priority.
pub fn static_entries(base_url: &str, routes: &[String]) -> Vec<SitemapEntry> {
    let base = base_url.trim_end_matches('/');
    routes
        .iter()
        .map(|route| {
            let path = if route.starts_with('/') {
                route.clone()
            } else {
                format!("/{route}")
            };
            SitemapEntry {
                priority: if path == "/" { 1.0 } else { 0.8 },
                loc: format!("{base}{path}"),
                lastmod: None,
                changefreq: ChangeFreq::Monthly,
            }
        })
        .collect()
}

/// Entries for published posts.
pub fn post_entries(base_url: &str, posts: &[BlogPost]) -> Vec<SitemapEntry> {
    let base = base_url.trim_end_matches('/');
    posts
        .iter()
        .map(|post| SitemapEntry {
            loc: format!("{base}{}", post.path()),
            lastmod: post.last_modified().and_then(date_part),
            changefreq: ChangeFreq::Weekly,
            priority: 0.7,
        })
        .collect()
}

/// `YYYY-MM-DD` from an RFC 3339 timestamp or a bare date.
pub fn date_part(value: &str) -> Option<String> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.date_naive().format("%Y-%m-%d").to_string());
    }
    let date = value.get(..10)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Render the XML document.
pub fn render(entries: &[SitemapEntry]) -> String {
    let mut xml = String::with_capacity(128 + entries.len() * 160);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
    for entry in entries {
        xml.push_str("  <url>\n");
        let _ = writeln!(xml, "    <loc>{}</loc>", escape_xml(&entry.loc));
        if let Some(lastmod) = &entry.lastmod {
            let _ = writeln!(xml, "    <lastmod>{}</lastmod>", escape_xml(lastmod));
        }
        let _ = writeln!(xml, "    <changefreq>{}</changefreq>", entry.changefreq.as_str());
        let _ = writeln!(xml, "    <priority>{:.1}</priority>", entry.priority);
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Escape the five XML special characters.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
