//! `GET /debug-social`: how link-preview crawlers see a page.
//!
//! Fetches the page from the public site once per crawler User-Agent and
//! reports the title, description and Open Graph image each one received.

use std::sync::LazyLock;

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Response};
use maud::{DOCTYPE, Markup, html};
use regex::Regex;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Crawler User-Agents compared by the report.
pub static CRAWLER_AGENTS: [(&str, &str); 4] = [
    ("Facebook", "facebookexternalhit/1.1"),
    ("Twitter", "Twitterbot/1.0"),
    ("LinkedIn", "LinkedInBot/1.0"),
    ("Slack", "Slackbot-LinkExpanding 1.0"),
];

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title regex is valid")
});

static META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\s+(?:name|property)="([^"]+)"\s+content="([^"]*)""#)
        .expect("meta regex is valid")
});

const REPORT_CSS: &str = r#"
body{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem;color:#111}
table{border-collapse:collapse;width:100%}
th,td{text-align:left;vertical-align:top;padding:.5rem;border-bottom:1px solid #ddd}
td.err{color:#b00020}
img{max-width:240px;height:auto}
code{font-family:ui-monospace,Menlo,monospace;font-size:.85rem}
"#;

#[derive(Debug, Deserialize)]
pub struct DebugParams {
    url: Option<String>,
}

/// What one crawler saw.
#[derive(Debug, Default, PartialEq)]
pub struct CrawlerView {
    pub status: u16,
    pub title: Option<String>,
    pub description: Option<String>,
    pub og_image: Option<String>,
}

pub async fn debug_social(
    State(state): State<AppState>,
    Query(params): Query<DebugParams>,
) -> Result<Response, ApiError> {
    let path = params
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing `url` query parameter".to_string()))?;
    if !path.starts_with('/') || path.starts_with("//") {
        return Err(ApiError::BadRequest(
            "`url` must be a site-relative path starting with `/`".to_string(),
        ));
    }

    let target = format!("{}{}", state.config.site.base_url, path);
    tracing::debug!(target = %target, "debug-social report");

    let fetches = CRAWLER_AGENTS.iter().map(|(name, agent)| {
        let http = state.http.clone();
        let target = target.clone();
        async move { (*name, *agent, fetch_as(&http, &target, agent).await) }
    });
    let results = futures::future::join_all(fetches).await;

    Ok(Html(render_report(&target, &results).into_string()).into_response())
}

async fn fetch_as(
    http: &reqwest::Client,
    url: &str,
    user_agent: &str,
) -> Result<CrawlerView, reqwest::Error> {
    let resp = http
        .get(url)
        .header(reqwest::header::USER_AGENT, user_agent)
        .send()
        .await?;
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    Ok(CrawlerView {
        status,
        ..extract_view(&body)
    })
}

/// Pull title, description and og:image out of an HTML document.
///
/// Values are entity-decoded so the report can escape them exactly once.
pub fn extract_view(html: &str) -> CrawlerView {
    let title = TITLE_RE
        .captures(html)
        .map(|c| decode(&c[1]))
        .filter(|t| !t.is_empty());

    let mut description = None;
    let mut og_image = None;
    for cap in META_RE.captures_iter(html) {
        let value = cap[2].trim();
        if value.is_empty() {
            continue;
        }
        match &cap[1] {
            "description" if description.is_none() => description = Some(decode(value)),
            "og:image" if og_image.is_none() => og_image = Some(decode(value)),
            _ => {}
        }
    }

    CrawlerView {
        status: 0,
        title,
        description,
        og_image,
    }
}

fn decode(raw: &str) -> String {
    html_escape::decode_html_entities(raw.trim()).into_owned()
}

fn render_report(
    target: &str,
    results: &[(&str, &str, Result<CrawlerView, reqwest::Error>)],
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="robots" content="noindex";
                title { "Social preview debug" }
                style { (REPORT_CSS) }
            }
            body {
                h1 { "Social preview debug" }
                p { "Target: " code { (target) } }
                table {
                    thead {
                        tr {
                            th { "Crawler" }
                            th { "Status" }
                            th { "Title" }
                            th { "Description" }
                            th { "Image" }
                        }
                    }
                    tbody {
                        @for (name, agent, result) in results {
                            tr {
                                td { strong { (name) } br; code { (agent) } }
                                @match result {
                                    Ok(view) => {
                                        td { (view.status) }
                                        td { (view.title.as_deref().unwrap_or("(none)")) }
                                        td { (view.description.as_deref().unwrap_or("(none)")) }
                                        td {
                                            @if let Some(img) = &view.og_image {
                                                img src=(img) alt="og:image";
                                                br;
                                                code { (img) }
                                            } @else {
                                                "(none)"
                                            }
                                        }
                                    }
                                    Err(e) => {
                                        td.err colspan="4" { "fetch failed: " (e.to_string()) }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
