//! The static HTML shell and its `__META_*__` substitution.
//!
//! The shell is the SPA's built `index.html`, read once at startup. It is
//! never mutated; each render produces a fresh string.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{Error, Result};
use crate::meta::{MetaProjection, MetaToken};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__META_([A-Z0-9_]+?)__").expect("placeholder regex is valid"));

/// Immutable HTML template containing placeholder tokens.
#[derive(Debug, Clone)]
pub struct Shell {
    template: String,
}

impl Shell {
    /// Read the shell from disk. A missing or unreadable file is fatal at startup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let template = std::fs::read_to_string(path).map_err(|source| Error::ShellUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let shell = Self::from_template(template);
        tracing::info!(
            path = %path.display(),
            bytes = shell.template.len(),
            placeholders = shell.placeholders().len(),
            "HTML shell loaded"
        );
        Ok(shell)
    }

    /// Build a shell from an in-memory template.
    pub fn from_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The raw template text.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Distinct known tokens present in the template, in order of first appearance.
    pub fn placeholders(&self) -> Vec<MetaToken> {
        let mut seen = Vec::new();
        for cap in PLACEHOLDER_RE.captures_iter(&self.template) {
            if let Some(token) = MetaToken::from_name(&cap[1])
                && !seen.contains(&token)
            {
                seen.push(token);
            }
        }
        seen
    }

    /// Substitute every placeholder in a single pass.
    ///
    /// Unknown token names render as the empty string, so the output never
    /// contains a `__META_*__` placeholder.
    pub fn render(&self, meta: &MetaProjection) -> String {
        PLACEHOLDER_RE
            .replace_all(&self.template, |caps: &Captures<'_>| {
                meta.get_by_name(&caps[1]).unwrap_or_default().to_string()
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::BlogPost;
    use crate::meta::SiteDefaults;

    const SHELL: &str = r#"<!doctype html>
<html lang="en">
<head>
<title>__META_TITLE__</title>
<meta name="description" content="__META_DESCRIPTION__">
<link rel="canonical" href="__META_CANONICAL_URL__">
<meta property="og:title" content="__META_OG_TITLE__">
<meta property="og:description" content="__META_OG_DESCRIPTION__">
<meta property="og:image" content="__META_OG_IMAGE__">
<meta property="og:url" content="__META_OG_URL__">
<meta property="og:type" content="__META_OG_TYPE__">
<meta property="og:site_name" content="__META_OG_SITE_NAME__">
<meta name="twitter:card" content="__META_TWITTER_CARD__">
<meta name="twitter:title" content="__META_TWITTER_TITLE__">
<meta name="twitter:description" content="__META_TWITTER_DESCRIPTION__">
<meta name="twitter:image" content="__META_TWITTER_IMAGE__">
<meta name="author" content="__META_AUTHOR__">
<meta name="keywords" content="__META_KEYWORDS__">
<meta property="article:published_time" content="__META_PUBLISHED_TIME__">
<meta property="article:modified_time" content="__META_MODIFIED_TIME__">
<meta property="article:section" content="__META_SECTION__">
</head>
<body><div id="root"></div></body>
</html>
"#;

    fn site() -> SiteDefaults {
        SiteDefaults {
            base_url: "https://example.com".into(),
            site_name: "Example".into(),
            title: "Example".into(),
            description: "Default description".into(),
            og_image: "https://example.com/og.png".into(),
            author: "Example Team".into(),
            keywords: "design".into(),
        }
    }

    fn post_with(fields: u32) -> BlogPost {
        // Each bit toggles one optional field.
        let s = |bit: u32, v: &str| (fields & (1 << bit) != 0).then(|| v.to_string());
        BlogPost {
            id: "id".into(),
            title: s(0, "Title"),
            slug: s(1, "slug"),
            custom_url: s(2, "custom"),
            meta_title: s(3, "Meta"),
            meta_description: s(4, "Meta description"),
            excerpt: s(5, "Excerpt"),
            og_title: s(6, "OG"),
            og_description: s(7, "OG description"),
            og_image_url: s(8, "https://img/og.png"),
            featured_image_url: s(9, "https://img/f.png"),
            twitter_card_type: s(10, "summary"),
            publish_date: s(11, "2024-01-01"),
            author_name: s(12, "Author"),
            ..Default::default()
        }
    }

    #[test]
    fn no_placeholder_survives_any_field_subset() {
        let shell = Shell::from_template(SHELL);
        for mask in 0..(1u32 << 13) {
            let html = shell.render(&MetaProjection::for_post(&post_with(mask), &site()));
            assert!(!html.contains("__META_"), "leftover token for mask {mask:#b}");
        }
    }

    #[test]
    fn required_tokens_never_empty() {
        let shell = Shell::from_template(
            "[__META_TITLE__][__META_DESCRIPTION__][__META_OG_IMAGE__][__META_AUTHOR__]",
        );
        let html = shell.render(&MetaProjection::for_post(&post_with(0), &site()));
        assert_eq!(
            html,
            "[Example][Default description][https://example.com/og.png][Example Team]"
        );
    }

    #[test]
    fn unknown_tokens_are_blanked() {
        let shell = Shell::from_template("a__META_NOT_A_TOKEN__b");
        assert_eq!(shell.render(&MetaProjection::defaults(&site())), "ab");
    }

    #[test]
    fn repeated_tokens_all_replaced() {
        let shell = Shell::from_template("__META_TITLE__ / __META_TITLE__");
        assert_eq!(
            shell.render(&MetaProjection::defaults(&site())),
            "Example / Example"
        );
    }

    #[test]
    fn escaped_values_rendered() {
        let mut post = post_with(0);
        post.title = Some("Tom & Jerry's <b>\"Show\"</b>".into());
        let shell = Shell::from_template("<title>__META_TITLE__</title>");
        assert_eq!(
            shell.render(&MetaProjection::for_post(&post, &site())),
            "<title>Tom &amp; Jerry&#39;s &lt;b&gt;&quot;Show&quot;&lt;/b&gt;</title>"
        );
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let mut post = post_with(0);
        post.title = Some("__META_AUTHOR__".into());
        let shell = Shell::from_template("__META_TITLE__");
        // The value itself looks like a token but substitution is single-pass.
        assert_eq!(
            shell.render(&MetaProjection::for_post(&post, &site())),
            "__META_AUTHOR__"
        );
    }

    #[test]
    fn render_does_not_mutate_template() {
        let shell = Shell::from_template(SHELL);
        let _ = shell.render(&MetaProjection::defaults(&site()));
        assert_eq!(shell.template(), SHELL);
    }

    #[test]
    fn placeholders_listed_once() {
        let shell =
            Shell::from_template("__META_TITLE__ __META_OG_TYPE__ __META_TITLE__ __META_BOGUS__");
        assert_eq!(shell.placeholders(), vec![MetaToken::Title, MetaToken::OgType]);
        assert_eq!(Shell::from_template(SHELL).placeholders().len(), MetaToken::ALL.len());
    }

    #[test]
    fn load_missing_file_is_fatal_error() {
        let err = Shell::load("/definitely/not/here/index.html").unwrap_err();
        assert!(matches!(err, Error::ShellUnreadable { .. }));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, SHELL).unwrap();
        let shell = Shell::load(&path).unwrap();
        assert_eq!(shell.template(), SHELL);
    }
}
