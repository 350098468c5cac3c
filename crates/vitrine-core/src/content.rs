//! Read-only client for the Contentful delivery API.
//!
//! Blog posts are looked up per request; nothing is cached locally so every
//! response reflects the latest published version of an entry. Linked authors,
//! categories and image assets are resolved from the `includes` block of each
//! entry collection.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::{Error, Result};

/// Default delivery API base URL.
pub const DEFAULT_API_URL: &str = "https://cdn.contentful.com";

/// Default content type ID of blog posts.
pub const DEFAULT_CONTENT_TYPE: &str = "blogPost";

/// Page size used when listing every post.
const PAGE_SIZE: usize = 100;

/// Connection settings for the delivery API.
#[derive(Debug, Clone)]
pub struct ContentfulConfig {
    /// API base URL, without trailing slash.
    pub api_url: String,
    /// Space ID.
    pub space_id: String,
    /// Environment name (usually `master`).
    pub environment: String,
    /// Delivery API access token.
    pub access_token: String,
    /// Content type ID of blog posts.
    pub content_type: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ContentfulConfig {
    /// Config for the public delivery API with default environment and content type.
    pub fn new(space_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            space_id: space_id.into(),
            environment: "master".to_string(),
            access_token: access_token.into(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Strategy used to locate a post from the slug segment of a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostLookup {
    /// Exact match on the `customUrl` field.
    CustomUrl,
    /// Exact match on the `slug` field.
    Slug,
    /// Direct lookup by entry ID.
    Id,
}

impl PostLookup {
    /// Resolution order for `/blog/{slug}` requests.
    pub const ORDER: [PostLookup; 3] = [Self::CustomUrl, Self::Slug, Self::Id];

    /// Query parameter name understood by the delivery API.
    fn query_key(self) -> &'static str {
        match self {
            Self::CustomUrl => "fields.customUrl",
            Self::Slug => "fields.slug",
            Self::Id => "sys.id",
        }
    }

    /// Label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CustomUrl => "custom_url",
            Self::Slug => "slug",
            Self::Id => "id",
        }
    }
}

/// A published blog post, flattened from a Contentful entry.
///
/// Empty strings coming from the store are normalised to `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogPost {
    /// Entry ID.
    pub id: String,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub custom_url: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub excerpt: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    /// Absolute URL of the linked Open Graph image asset.
    pub og_image_url: Option<String>,
    /// Absolute URL of the linked featured image asset.
    pub featured_image_url: Option<String>,
    pub twitter_card_type: Option<String>,
    pub publish_date: Option<String>,
    /// `sys.createdAt`.
    pub created_at: Option<String>,
    /// `sys.updatedAt`.
    pub updated_at: Option<String>,
    /// Name of the linked author entry.
    pub author_name: Option<String>,
    pub keywords: Vec<String>,
    pub categories: Vec<String>,
}

impl BlogPost {
    /// Site-relative path of the post: `/blog/{customUrl | slug | id}`.
    pub fn path(&self) -> String {
        let segment = self
            .custom_url
            .as_deref()
            .map(|u| u.trim_matches('/'))
            .filter(|u| !u.is_empty())
            .or(self.slug.as_deref())
            .unwrap_or(&self.id);
        format!("/blog/{segment}")
    }

    /// Most recent known timestamp (updated, then published, then created).
    pub fn last_modified(&self) -> Option<&str> {
        self.updated_at
            .as_deref()
            .or(self.publish_date.as_deref())
            .or(self.created_at.as_deref())
    }

    fn from_entry(entry: &RawEntry, links: &Links<'_>) -> Self {
        let f = &entry.fields;
        Self {
            id: entry.sys.id.clone(),
            title: text(f, "title"),
            slug: text(f, "slug"),
            custom_url: text(f, "customUrl"),
            meta_title: text(f, "metaTitle"),
            meta_description: text(f, "metaDescription"),
            excerpt: text(f, "excerpt"),
            og_title: text(f, "ogTitle"),
            og_description: text(f, "ogDescription"),
            og_image_url: link_id(f.get("ogImage")).and_then(|id| links.asset_url(id)),
            featured_image_url: link_id(f.get("featuredImage")).and_then(|id| links.asset_url(id)),
            twitter_card_type: text(f, "twitterCardType"),
            publish_date: text(f, "publishDate"),
            created_at: entry.sys.created_at.clone().filter(|s| !s.is_empty()),
            updated_at: entry.sys.updated_at.clone().filter(|s| !s.is_empty()),
            author_name: link_id(f.get("author")).and_then(|id| links.entry_name(id)),
            keywords: string_list(f.get("keywords"), links),
            categories: string_list(f.get("categories"), links),
        }
    }
}

/// Thin client over the entries endpoint of the delivery API.
#[derive(Debug, Clone)]
pub struct ContentfulClient {
    http: reqwest::Client,
    config: Arc<ContentfulConfig>,
}

impl ContentfulClient {
    /// Build a client with its own connection pool.
    pub fn new(config: ContentfulConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ContentfulConfig {
        &self.config
    }

    /// Locate the post addressed by a `/blog/{slug}` URL segment.
    ///
    /// Tries [`PostLookup::ORDER`] in sequence; the first lookup that returns an
    /// entry wins. A failing lookup is logged and the next one is attempted. When
    /// nothing matched and at least one lookup failed, the first failure is
    /// returned.
    pub async fn resolve_post(&self, slug: &str) -> Result<Option<BlogPost>> {
        let mut first_error = None;

        for lookup in PostLookup::ORDER {
            match self.find_post(lookup, slug).await {
                Ok(Some(post)) => {
                    tracing::debug!(
                        slug = %slug,
                        lookup = lookup.as_str(),
                        id = %post.id,
                        "post resolved"
                    );
                    return Ok(Some(post));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        slug = %slug,
                        lookup = lookup.as_str(),
                        error = %e,
                        "post lookup failed"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// Find a post by a lookup strategy.
    ///
    /// Custom URLs are matched with or without leading and trailing slashes,
    /// the same way [`BlogPost::path`] strips them.
    pub async fn find_post(&self, lookup: PostLookup, value: &str) -> Result<Option<BlogPost>> {
        let value = value.trim();
        if lookup == PostLookup::CustomUrl {
            let bare = value.trim_matches('/');
            if bare.is_empty() {
                return Ok(None);
            }
            let candidates = custom_url_forms(bare).join(",");
            let key = format!("{}[in]", lookup.query_key());
            let page = self
                .fetch_entries(&[(key.as_str(), candidates.as_str()), ("limit", "1")])
                .await?;
            return Ok(page.posts.into_iter().next());
        }

        if value.is_empty() {
            return Ok(None);
        }
        let page = self
            .fetch_entries(&[(lookup.query_key(), value), ("limit", "1")])
            .await?;
        Ok(page.posts.into_iter().next())
    }

    /// Find a post whose field `field` equals `value` exactly.
    pub async fn find_post_by_field(&self, field: &str, value: &str) -> Result<Option<BlogPost>> {
        let key = format!("fields.{field}");
        let page = self.fetch_entries(&[(key.as_str(), value), ("limit", "1")]).await?;
        Ok(page.posts.into_iter().next())
    }

    /// Fetch a post by entry ID.
    pub async fn get_post(&self, id: &str) -> Result<Option<BlogPost>> {
        self.find_post(PostLookup::Id, id).await
    }

    /// List every published post, newest first.
    pub async fn list_posts(&self) -> Result<Vec<BlogPost>> {
        let mut posts = Vec::new();
        let limit = PAGE_SIZE.to_string();

        loop {
            let skip = posts.len().to_string();
            let page = self
                .fetch_entries(&[
                    ("order", "-fields.publishDate"),
                    ("limit", limit.as_str()),
                    ("skip", skip.as_str()),
                ])
                .await?;

            let fetched = page.posts.len();
            posts.extend(page.posts);

            if fetched < PAGE_SIZE || posts.len() as u64 >= page.total {
                break;
            }
        }

        tracing::info!(count = posts.len(), "listed blog posts");
        Ok(posts)
    }

    async fn fetch_entries(&self, params: &[(&str, &str)]) -> Result<PostPage> {
        let mut url = self.entries_url()?;
        let display_url = url.to_string();
        url.query_pairs_mut()
            .append_pair("content_type", &self.config.content_type)
            .append_pair("include", "2")
            .extend_pairs(params.iter().copied());

        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::ContentStatus {
                status: status.as_u16(),
                url: display_url,
            });
        }

        let body = resp.bytes().await?;
        parse_collection(&body)
    }

    fn entries_url(&self) -> Result<Url> {
        let c = &self.config;
        Ok(Url::parse(&format!(
            "{}/spaces/{}/environments/{}/entries",
            c.api_url.trim_end_matches('/'),
            c.space_id,
            c.environment
        ))?)
    }
}

/// One page of posts from the entries endpoint.
#[derive(Debug)]
struct PostPage {
    posts: Vec<BlogPost>,
    total: u64,
}

fn parse_collection(body: &[u8]) -> Result<PostPage> {
    let collection: EntryCollection = serde_json::from_slice(body)?;
    let links = Links::new(&collection.includes);
    let posts = collection
        .items
        .iter()
        .map(|entry| BlogPost::from_entry(entry, &links))
        .collect();
    Ok(PostPage {
        posts,
        total: collection.total,
    })
}

// -- Wire format --

#[derive(Debug, Deserialize)]
struct EntryCollection {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    items: Vec<RawEntry>,
    #[serde(default)]
    includes: Includes,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(rename = "Entry", default)]
    entries: Vec<RawEntry>,
    #[serde(rename = "Asset", default)]
    assets: Vec<RawAsset>,
}

#[derive(Debug, Deserialize)]
struct Sys {
    id: String,
    #[serde(rename = "createdAt", default)]
    created_at: Option<String>,
    #[serde(rename = "updatedAt", default)]
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    sys: Sys,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawAsset {
    sys: Sys,
    #[serde(default)]
    fields: AssetFields,
}

#[derive(Debug, Default, Deserialize)]
struct AssetFields {
    #[serde(default)]
    file: Option<AssetFile>,
}

#[derive(Debug, Deserialize)]
struct AssetFile {
    url: String,
}

/// Index over the `includes` block of a collection.
struct Links<'a> {
    entries: HashMap<&'a str, &'a RawEntry>,
    assets: HashMap<&'a str, &'a RawAsset>,
}

impl<'a> Links<'a> {
    fn new(includes: &'a Includes) -> Self {
        Self {
            entries: includes
                .entries
                .iter()
                .map(|e| (e.sys.id.as_str(), e))
                .collect(),
            assets: includes
                .assets
                .iter()
                .map(|a| (a.sys.id.as_str(), a))
                .collect(),
        }
    }

    fn asset_url(&self, id: &str) -> Option<String> {
        let file = self.assets.get(id)?.fields.file.as_ref()?;
        normalize_asset_url(&file.url)
    }

    /// Display name of a linked entry (`name`, falling back to `title`).
    fn entry_name(&self, id: &str) -> Option<String> {
        let entry = self.entries.get(id)?;
        text(&entry.fields, "name").or_else(|| text(&entry.fields, "title"))
    }
}

/// Spellings of a custom URL that all map to the same post path.
fn custom_url_forms(bare: &str) -> [String; 4] {
    [
        bare.to_string(),
        format!("/{bare}"),
        format!("{bare}/"),
        format!("/{bare}/"),
    ]
}

/// Make an asset URL absolute; the delivery API returns protocol-relative URLs.
pub fn normalize_asset_url(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        None
    } else if url.starts_with("//") {
        Some(format!("https:{url}"))
    } else {
        Some(url.to_string())
    }
}

fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn link_id(value: Option<&Value>) -> Option<&str> {
    value?.get("sys")?.get("id")?.as_str()
}

/// A list field that may hold plain strings, a comma-separated string, or
/// links to entries with a `name`/`title`.
fn string_list(value: Option<&Value>, links: &Links<'_>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
                other => link_id(Some(other)).and_then(|id| links.entry_name(id)),
            })
            .collect(),
        _ => Vec::new(),
    }
}
