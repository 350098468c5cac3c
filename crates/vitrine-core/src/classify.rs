//! Request classification for crawler-aware serving.
//!
//! Decides from the User-Agent and query string whether a request comes from
//! a crawler that cannot execute client-side rendering, asks for a prerendered
//! page through the legacy escaped-fragment convention, or was issued by the
//! prerendering service itself.

use std::sync::LazyLock;

use regex::Regex;

/// Query parameter of the legacy AJAX crawling scheme.
pub const ESCAPED_FRAGMENT_PARAM: &str = "_escaped_fragment_";

/// Substring identifying requests made by the prerendering service.
///
/// If the vendor changes its crawler signature this guard stops matching and
/// the edge would forward the service's own requests back to it.
pub const PRERENDER_SIGNATURE: &str = "prerender";

/// Known crawler and link-preview User-Agent fragments (matched case-insensitively).
pub const BOT_SIGNATURES: &[&str] = &[
    "googlebot",
    "adsbot-google",
    "mediapartners-google",
    "google-inspectiontool",
    "google page speed",
    "chrome-lighthouse",
    "bingbot",
    "yandex",
    "baiduspider",
    "duckduckbot",
    "slurp",
    "applebot",
    "facebookexternalhit",
    "facebookcatalog",
    "twitterbot",
    "linkedinbot",
    "embedly",
    "quora link preview",
    "showyoubot",
    "outbrain",
    "pinterest/0.",
    "pinterestbot",
    "developers.google.com/+/web/snippet",
    "slackbot",
    "vkshare",
    "w3c_validator",
    "redditbot",
    "whatsapp",
    "flipboard",
    "tumblr",
    "bitlybot",
    "skypeuripreview",
    "nuzzel",
    "discordbot",
    "telegrambot",
    "qwantify",
    "bitrix link preview",
    "xing-contenttabreceiver",
    "rogerbot",
    "ahrefsbot",
    "semrushbot",
    "petalbot",
    "mastodon",
];

static BOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = BOT_SIGNATURES
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i){alternation}")).expect("bot signature regex is valid")
});

/// Classification of an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestClass {
    /// Known crawler or link-preview agent.
    Bot,
    /// Request carrying the `_escaped_fragment_` query parameter.
    EscapedFragment,
    /// Request issued by the prerendering service itself.
    RecursivePrerender,
    /// Ordinary browser traffic.
    Normal,
}

impl RequestClass {
    /// Whether the request should be answered from the prerendering service.
    pub fn wants_prerender(self) -> bool {
        matches!(self, Self::Bot | Self::EscapedFragment)
    }

    /// Short label used for logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bot => "bot",
            Self::EscapedFragment => "escaped_fragment",
            Self::RecursivePrerender => "recursive_prerender",
            Self::Normal => "normal",
        }
    }
}

impl std::fmt::Display for RequestClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a request from its User-Agent header and raw query string.
///
/// The recursion guard wins over every other signal so that the prerendering
/// service is never forwarded to itself, even when its agent string also
/// looks like a crawler.
pub fn classify(user_agent: Option<&str>, query: Option<&str>) -> RequestClass {
    let user_agent = user_agent.unwrap_or_default();

    if user_agent.to_ascii_lowercase().contains(PRERENDER_SIGNATURE) {
        return RequestClass::RecursivePrerender;
    }

    if query.is_some_and(has_escaped_fragment) {
        return RequestClass::EscapedFragment;
    }

    if is_bot(user_agent) {
        return RequestClass::Bot;
    }

    RequestClass::Normal
}

/// Whether the User-Agent matches one of [`BOT_SIGNATURES`].
pub fn is_bot(user_agent: &str) -> bool {
    !user_agent.is_empty() && BOT_RE.is_match(user_agent)
}

fn has_escaped_fragment(query: &str) -> bool {
    url::form_urlencoded::parse(query.as_bytes()).any(|(key, _)| key == ESCAPED_FRAGMENT_PARAM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twitterbot_is_bot() {
        assert_eq!(classify(Some("Twitterbot/1.0"), None), RequestClass::Bot);
    }

    #[test]
    fn bot_match_is_case_insensitive() {
        assert_eq!(
            classify(Some("Mozilla/5.0 (compatible; GOOGLEBOT/2.1)"), None),
            RequestClass::Bot
        );
        assert_eq!(
            classify(Some("facebookexternalhit/1.1"), None),
            RequestClass::Bot
        );
    }

    #[test]
    fn browser_is_normal() {
        let ua = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/126.0 Safari/537.36";
        assert_eq!(classify(Some(ua), None), RequestClass::Normal);
    }

    #[test]
    fn missing_user_agent_is_normal() {
        assert_eq!(classify(None, None), RequestClass::Normal);
        assert_eq!(classify(Some(""), Some("a=1")), RequestClass::Normal);
    }

    #[test]
    fn prerender_agent_is_recursive_even_when_bot_like() {
        assert_eq!(
            classify(
                Some("Mozilla/5.0 Prerender (+https://github.com/prerender/prerender) Googlebot"),
                None
            ),
            RequestClass::RecursivePrerender
        );
    }

    #[test]
    fn prerender_agent_beats_escaped_fragment() {
        assert_eq!(
            classify(Some("prerender"), Some("_escaped_fragment_=")),
            RequestClass::RecursivePrerender
        );
    }

    #[test]
    fn escaped_fragment_detected() {
        assert_eq!(
            classify(Some("Mozilla/5.0"), Some("_escaped_fragment_=")),
            RequestClass::EscapedFragment
        );
        assert_eq!(
            classify(None, Some("page=2&_escaped_fragment_=%2Fabout")),
            RequestClass::EscapedFragment
        );
    }

    #[test]
    fn escaped_fragment_needs_exact_key() {
        assert_eq!(
            classify(None, Some("x_escaped_fragment_y=1")),
            RequestClass::Normal
        );
    }

    #[test]
    fn escaped_fragment_beats_bot() {
        assert_eq!(
            classify(Some("Twitterbot/1.0"), Some("_escaped_fragment_=")),
            RequestClass::EscapedFragment
        );
    }

    #[test]
    fn wants_prerender_flags() {
        assert!(RequestClass::Bot.wants_prerender());
        assert!(RequestClass::EscapedFragment.wants_prerender());
        assert!(!RequestClass::RecursivePrerender.wants_prerender());
        assert!(!RequestClass::Normal.wants_prerender());
    }

    #[test]
    fn every_signature_matches_itself() {
        for sig in BOT_SIGNATURES {
            assert!(is_bot(sig), "{sig} should match");
            assert!(is_bot(&sig.to_uppercase()), "{sig} uppercased should match");
        }
    }

    #[test]
    fn signatures_are_literal_not_patterns() {
        // "pinterest/0." must not match "pinterest/01" via a regex wildcard
        assert!(!is_bot("pinterest/01"));
    }
}
