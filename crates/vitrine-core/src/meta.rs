//! Metadata projection: placeholder token → resolved, HTML-escaped value.
//!
//! Per-post values are resolved through [`POST_RULES`], an ordered table of
//! accessor chains. Each rule tries its sources in order and falls back to a
//! site-wide default, so every token always has a value. The default
//! projection used for non-post routes is exactly the fallback column of the
//! same table.

use std::collections::BTreeMap;

use crate::content::BlogPost;

/// Image transform applied to content-store image assets (Open Graph size, JPEG).
pub const IMAGE_TRANSFORM: &str = "w=1200&h=630&fit=fill&fm=jpg";

/// Placeholder tokens recognised in the HTML shell.
///
/// The text form in the shell is `__META_{NAME}__`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetaToken {
    Title,
    Description,
    CanonicalUrl,
    OgTitle,
    OgDescription,
    OgImage,
    OgUrl,
    OgType,
    OgSiteName,
    TwitterCard,
    TwitterTitle,
    TwitterDescription,
    TwitterImage,
    Author,
    Keywords,
    PublishedTime,
    ModifiedTime,
    Section,
}

impl MetaToken {
    /// Every token, in shell order.
    pub const ALL: [MetaToken; 18] = [
        Self::Title,
        Self::Description,
        Self::CanonicalUrl,
        Self::OgTitle,
        Self::OgDescription,
        Self::OgImage,
        Self::OgUrl,
        Self::OgType,
        Self::OgSiteName,
        Self::TwitterCard,
        Self::TwitterTitle,
        Self::TwitterDescription,
        Self::TwitterImage,
        Self::Author,
        Self::Keywords,
        Self::PublishedTime,
        Self::ModifiedTime,
        Self::Section,
    ];

    /// Token name as written between `__META_` and `__`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Title => "TITLE",
            Self::Description => "DESCRIPTION",
            Self::CanonicalUrl => "CANONICAL_URL",
            Self::OgTitle => "OG_TITLE",
            Self::OgDescription => "OG_DESCRIPTION",
            Self::OgImage => "OG_IMAGE",
            Self::OgUrl => "OG_URL",
            Self::OgType => "OG_TYPE",
            Self::OgSiteName => "OG_SITE_NAME",
            Self::TwitterCard => "TWITTER_CARD",
            Self::TwitterTitle => "TWITTER_TITLE",
            Self::TwitterDescription => "TWITTER_DESCRIPTION",
            Self::TwitterImage => "TWITTER_IMAGE",
            Self::Author => "AUTHOR",
            Self::Keywords => "KEYWORDS",
            Self::PublishedTime => "PUBLISHED_TIME",
            Self::ModifiedTime => "MODIFIED_TIME",
            Self::Section => "SECTION",
        }
    }

    /// Full placeholder text, e.g. `__META_TITLE__`.
    pub fn placeholder(self) -> String {
        format!("__META_{}__", self.name())
    }

    /// Look a token up by its name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

/// Site-wide defaults used when a post lacks a field and for every non-post route.
#[derive(Debug, Clone)]
pub struct SiteDefaults {
    /// Public base URL without trailing slash, e.g. `https://example.com`.
    pub base_url: String,
    pub site_name: String,
    pub title: String,
    pub description: String,
    /// Absolute URL of the default Open Graph image.
    pub og_image: String,
    pub author: String,
    pub keywords: String,
}

/// Reads one candidate value for a token from a post.
pub type Accessor = fn(&BlogPost, &SiteDefaults) -> Option<String>;

/// Produces the value used when no accessor yields one.
pub type Fallback = fn(&SiteDefaults) -> String;

/// Resolution rule for one token: accessors in precedence order, then a fallback.
pub struct FieldRule {
    pub token: MetaToken,
    pub sources: &'static [Accessor],
    pub fallback: Fallback,
}

impl FieldRule {
    /// Evaluate the rule against a post.
    pub fn resolve(&self, post: &BlogPost, site: &SiteDefaults) -> String {
        self.sources
            .iter()
            .filter_map(|source| source(post, site))
            .find(|v| !v.trim().is_empty())
            .unwrap_or_else(|| (self.fallback)(site))
    }
}

/// Per-post resolution table. Covers every [`MetaToken`] exactly once.
pub static POST_RULES: &[FieldRule] = &[
    FieldRule {
        token: MetaToken::Title,
        sources: &[meta_title, title],
        fallback: site_title,
    },
    FieldRule {
        token: MetaToken::Description,
        sources: &[meta_description, excerpt],
        fallback: site_description,
    },
    FieldRule {
        token: MetaToken::CanonicalUrl,
        sources: &[post_url],
        fallback: site_url,
    },
    FieldRule {
        token: MetaToken::OgTitle,
        sources: &[og_title, meta_title, title],
        fallback: site_title,
    },
    FieldRule {
        token: MetaToken::OgDescription,
        sources: &[og_description, meta_description, excerpt],
        fallback: site_description,
    },
    FieldRule {
        token: MetaToken::OgImage,
        sources: &[og_image, featured_image],
        fallback: site_og_image,
    },
    FieldRule {
        token: MetaToken::OgUrl,
        sources: &[post_url],
        fallback: site_url,
    },
    FieldRule {
        token: MetaToken::OgType,
        sources: &[article_type],
        fallback: website_type,
    },
    FieldRule {
        token: MetaToken::OgSiteName,
        sources: &[],
        fallback: site_name,
    },
    FieldRule {
        token: MetaToken::TwitterCard,
        sources: &[twitter_card_type],
        fallback: large_image_card,
    },
    FieldRule {
        token: MetaToken::TwitterTitle,
        sources: &[og_title, meta_title, title],
        fallback: site_title,
    },
    FieldRule {
        token: MetaToken::TwitterDescription,
        sources: &[og_description, meta_description, excerpt],
        fallback: site_description,
    },
    FieldRule {
        token: MetaToken::TwitterImage,
        sources: &[og_image, featured_image],
        fallback: site_og_image,
    },
    FieldRule {
        token: MetaToken::Author,
        sources: &[author_name],
        fallback: site_author,
    },
    FieldRule {
        token: MetaToken::Keywords,
        sources: &[keywords],
        fallback: site_keywords,
    },
    FieldRule {
        token: MetaToken::PublishedTime,
        sources: &[publish_date, created_at],
        fallback: empty,
    },
    FieldRule {
        token: MetaToken::ModifiedTime,
        sources: &[updated_at, publish_date],
        fallback: empty,
    },
    FieldRule {
        token: MetaToken::Section,
        sources: &[first_category],
        fallback: empty,
    },
];

// -- Accessors --

fn title(p: &BlogPost, _: &SiteDefaults) -> Option<String> {
    p.title.clone()
}

fn meta_title(p: &BlogPost, _: &SiteDefaults) -> Option<String> {
    p.meta_title.clone()
}

fn og_title(p: &BlogPost, _: &SiteDefaults) -> Option<String> {
    p.og_title.clone()
}

fn meta_description(p: &BlogPost, _: &SiteDefaults) -> Option<String> {
    p.meta_description.clone()
}

fn og_description(p: &BlogPost, _: &SiteDefaults) -> Option<String> {
    p.og_description.clone()
}

fn excerpt(p: &BlogPost, _: &SiteDefaults) -> Option<String> {
    p.excerpt.clone()
}

fn post_url(p: &BlogPost, site: &SiteDefaults) -> Option<String> {
    Some(format!("{}{}", site.base_url, p.path()))
}

fn og_image(p: &BlogPost, _: &SiteDefaults) -> Option<String> {
    p.og_image_url.as_deref().map(transform_image)
}

fn featured_image(p: &BlogPost, _: &SiteDefaults) -> Option<String> {
    p.featured_image_url.as_deref().map(transform_image)
}

fn article_type(_: &BlogPost, _: &SiteDefaults) -> Option<String> {
    Some("article".to_string())
}

fn twitter_card_type(p: &BlogPost, _: &SiteDefaults) -> Option<String> {
    p.twitter_card_type.clone()
}

fn author_name(p: &BlogPost, _: &SiteDefaults) -> Option<String> {
    p.author_name.clone()
}

fn keywords(p: &BlogPost, _: &SiteDefaults) -> Option<String> {
    Some(p.keywords.join(", "))
}

fn publish_date(p: &BlogPost, _: &SiteDefaults) -> Option<String> {
    p.publish_date.clone()
}

fn created_at(p: &BlogPost, _: &SiteDefaults) -> Option<String> {
    p.created_at.clone()
}

fn updated_at(p: &BlogPost, _: &SiteDefaults) -> Option<String> {
    p.updated_at.clone()
}

fn first_category(p: &BlogPost, _: &SiteDefaults) -> Option<String> {
    p.categories.first().cloned()
}

// -- Fallbacks --

fn site_name(s: &SiteDefaults) -> String {
    s.site_name.clone()
}

fn site_title(s: &SiteDefaults) -> String {
    s.title.clone()
}

fn site_description(s: &SiteDefaults) -> String {
    s.description.clone()
}

fn site_url(s: &SiteDefaults) -> String {
    s.base_url.clone()
}

fn site_og_image(s: &SiteDefaults) -> String {
    s.og_image.clone()
}

fn site_author(s: &SiteDefaults) -> String {
    s.author.clone()
}

fn site_keywords(s: &SiteDefaults) -> String {
    s.keywords.clone()
}

fn website_type(_: &SiteDefaults) -> String {
    "website".to_string()
}

fn large_image_card(_: &SiteDefaults) -> String {
    "summary_large_image".to_string()
}

fn empty(_: &SiteDefaults) -> String {
    String::new()
}

/// Append the Open Graph image transform to an asset URL.
pub fn transform_image(url: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{IMAGE_TRANSFORM}")
}

/// Escape `&`, `<`, `>`, `"` and `'` for use in HTML text and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Request-scoped mapping from token to escaped value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaProjection {
    values: BTreeMap<MetaToken, String>,
}

impl MetaProjection {
    /// Site-wide defaults for routes without a post.
    pub fn defaults(site: &SiteDefaults) -> Self {
        Self::from_pairs(POST_RULES.iter().map(|rule| (rule.token, (rule.fallback)(site))))
    }

    /// Values for a single post, with per-token fallbacks.
    pub fn for_post(post: &BlogPost, site: &SiteDefaults) -> Self {
        Self::from_pairs(
            POST_RULES
                .iter()
                .map(|rule| (rule.token, rule.resolve(post, site))),
        )
    }

    fn from_pairs(pairs: impl Iterator<Item = (MetaToken, String)>) -> Self {
        Self {
            values: pairs.map(|(t, v)| (t, escape_html(&v))).collect(),
        }
    }

    /// Escaped value for a token (empty if unset).
    pub fn get(&self, token: MetaToken) -> &str {
        self.values.get(&token).map(String::as_str).unwrap_or_default()
    }

    /// Escaped value for a token name as it appears in the shell.
    pub fn get_by_name(&self, name: &str) -> Option<&str> {
        MetaToken::from_name(name).map(|t| self.get(t))
    }

    /// Iterate over `(token, escaped value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (MetaToken, &str)> {
        self.values.iter().map(|(t, v)| (*t, v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteDefaults {
        SiteDefaults {
            base_url: "https://example.com".into(),
            site_name: "Example Studio".into(),
            title: "Example Studio | Web Design".into(),
            description: "Websites that work.".into(),
            og_image: "https://example.com/og-default.png".into(),
            author: "Example Studio".into(),
            keywords: "web design, development".into(),
        }
    }

    fn post() -> BlogPost {
        BlogPost {
            id: "p1".into(),
            title: Some("Plain Title".into()),
            slug: Some("plain-title".into()),
            ..Default::default()
        }
    }

    #[test]
    fn rules_cover_every_token_once() {
        let mut seen: Vec<MetaToken> = POST_RULES.iter().map(|r| r.token).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), POST_RULES.len());
        assert_eq!(seen.len(), MetaToken::ALL.len());
    }

    #[test]
    fn token_names_round_trip() {
        for token in MetaToken::ALL {
            assert_eq!(MetaToken::from_name(token.name()), Some(token));
        }
        assert_eq!(MetaToken::from_name("NOPE"), None);
        assert_eq!(MetaToken::OgImage.placeholder(), "__META_OG_IMAGE__");
    }

    #[test]
    fn defaults_projection() {
        let p = MetaProjection::defaults(&site());
        assert_eq!(p.get(MetaToken::Title), "Example Studio | Web Design");
        assert_eq!(p.get(MetaToken::CanonicalUrl), "https://example.com");
        assert_eq!(p.get(MetaToken::OgType), "website");
        assert_eq!(p.get(MetaToken::OgSiteName), "Example Studio");
        assert_eq!(p.get(MetaToken::TwitterCard), "summary_large_image");
        assert_eq!(p.get(MetaToken::OgImage), "https://example.com/og-default.png");
        assert_eq!(p.get(MetaToken::PublishedTime), "");
    }

    #[test]
    fn minimal_post_uses_fallbacks() {
        let p = MetaProjection::for_post(&post(), &site());
        assert_eq!(p.get(MetaToken::Title), "Plain Title");
        assert_eq!(p.get(MetaToken::OgTitle), "Plain Title");
        assert_eq!(p.get(MetaToken::Description), "Websites that work.");
        assert_eq!(p.get(MetaToken::OgImage), "https://example.com/og-default.png");
        assert_eq!(p.get(MetaToken::Author), "Example Studio");
        assert_eq!(p.get(MetaToken::Keywords), "web design, development");
        assert_eq!(p.get(MetaToken::OgType), "article");
        assert_eq!(p.get(MetaToken::OgSiteName), "Example Studio");
        assert_eq!(
            p.get(MetaToken::CanonicalUrl),
            "https://example.com/blog/plain-title"
        );
    }

    #[test]
    fn description_falls_back_to_excerpt() {
        let mut post = post();
        post.excerpt = Some("The excerpt.".into());
        let p = MetaProjection::for_post(&post, &site());
        assert_eq!(p.get(MetaToken::Description), "The excerpt.");
        assert_eq!(p.get(MetaToken::OgDescription), "The excerpt.");

        post.meta_description = Some("Meta desc.".into());
        let p = MetaProjection::for_post(&post, &site());
        assert_eq!(p.get(MetaToken::Description), "Meta desc.");

        post.og_description = Some("OG desc.".into());
        let p = MetaProjection::for_post(&post, &site());
        assert_eq!(p.get(MetaToken::Description), "Meta desc.");
        assert_eq!(p.get(MetaToken::OgDescription), "OG desc.");
        assert_eq!(p.get(MetaToken::TwitterDescription), "OG desc.");
    }

    #[test]
    fn og_image_precedence_and_transform() {
        let mut post = post();
        post.featured_image_url = Some("https://images.ctfassets.net/f.jpg".into());
        let p = MetaProjection::for_post(&post, &site());
        assert_eq!(
            p.get(MetaToken::OgImage),
            "https://images.ctfassets.net/f.jpg?w=1200&amp;h=630&amp;fit=fill&amp;fm=jpg"
        );

        post.og_image_url = Some("https://images.ctfassets.net/og.png".into());
        let p = MetaProjection::for_post(&post, &site());
        assert!(
            p.get(MetaToken::OgImage)
                .starts_with("https://images.ctfassets.net/og.png?w=1200")
        );
        assert_eq!(p.get(MetaToken::OgImage), p.get(MetaToken::TwitterImage));
    }

    #[test]
    fn transform_appends_with_ampersand_when_query_present() {
        assert_eq!(
            transform_image("https://a/b.png?x=1"),
            format!("https://a/b.png?x=1&{IMAGE_TRANSFORM}")
        );
    }

    #[test]
    fn blank_values_fall_through() {
        let mut post = post();
        post.meta_title = Some("   ".into());
        let p = MetaProjection::for_post(&post, &site());
        assert_eq!(p.get(MetaToken::Title), "Plain Title");
    }

    #[test]
    fn empty_keywords_use_site_keywords() {
        let p = MetaProjection::for_post(&post(), &site());
        assert_eq!(p.get(MetaToken::Keywords), "web design, development");

        let mut post = post();
        post.keywords = vec!["rust".into(), "axum".into()];
        let p = MetaProjection::for_post(&post, &site());
        assert_eq!(p.get(MetaToken::Keywords), "rust, axum");
    }

    #[test]
    fn times_and_section() {
        let mut post = post();
        post.created_at = Some("2024-01-01T00:00:00Z".into());
        post.categories = vec!["Design".into(), "Dev".into()];
        let p = MetaProjection::for_post(&post, &site());
        assert_eq!(p.get(MetaToken::PublishedTime), "2024-01-01T00:00:00Z");
        assert_eq!(p.get(MetaToken::ModifiedTime), "");
        assert_eq!(p.get(MetaToken::Section), "Design");
    }

    #[test]
    fn values_are_escaped() {
        let mut post = post();
        post.title = Some(r#"<script>alert("x")</script> & 'co'"#.into());
        let p = MetaProjection::for_post(&post, &site());
        assert_eq!(
            p.get(MetaToken::Title),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;co&#39;"
        );
    }

    #[test]
    fn escape_is_single_pass() {
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
        assert_eq!(escape_html("plain"), "plain");
        assert_eq!(escape_html(""), "");
    }

    #[test]
    fn get_by_name() {
        let p = MetaProjection::defaults(&site());
        assert_eq!(p.get_by_name("OG_TYPE"), Some("website"));
        assert_eq!(p.get_by_name("UNKNOWN"), None);
        assert_eq!(p.iter().count(), MetaToken::ALL.len());
    }
}
