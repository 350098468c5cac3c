//! Contentful webhook setup.
//!
//! Registers a webhook that calls the site's build hook whenever a post is
//! published, unpublished or deleted, so the static sitemap stays current.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default Content Management API base URL.
pub const DEFAULT_CMA_URL: &str = "https://api.contentful.com";

/// Events that trigger a rebuild.
pub const REBUILD_TOPICS: [&str; 3] = ["Entry.publish", "Entry.unpublish", "Entry.delete"];

const CMA_CONTENT_TYPE: &str = "application/vnd.contentful.management.v1+json";

/// A webhook definition as stored by the Management API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookDefinition {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl WebhookDefinition {
    /// Definition for a rebuild hook.
    pub fn rebuild(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            topics: REBUILD_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WebhookCollection {
    #[serde(default)]
    items: Vec<WebhookDefinition>,
}

/// What [`ManagementClient::ensure_webhook`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum EnsureOutcome {
    /// A definition with the same name already exists; it was left as is.
    Exists(WebhookDefinition),
    /// The definition was created.
    Created(WebhookDefinition),
    /// Dry run: the definition would have been created.
    WouldCreate(WebhookDefinition),
}

/// Minimal Content Management API client.
#[derive(Debug, Clone)]
pub struct ManagementClient {
    http: reqwest::Client,
    api_url: String,
    space_id: String,
    token: String,
}

impl ManagementClient {
    pub fn new(
        api_url: impl Into<String>,
        space_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            space_id: space_id.into(),
            token: token.into(),
        })
    }

    fn definitions_url(&self) -> String {
        format!(
            "{}/spaces/{}/webhook_definitions",
            self.api_url, self.space_id
        )
    }

    /// List the space's webhook definitions.
    pub async fn list_webhooks(&self) -> Result<Vec<WebhookDefinition>> {
        let resp = self
            .http
            .get(self.definitions_url())
            .bearer_auth(&self.token)
            .send()
            .await
            .context("listing webhooks")?
            .error_for_status()
            .context("listing webhooks")?;
        let collection: WebhookCollection = resp.json().await.context("decoding webhook list")?;
        Ok(collection.items)
    }

    /// Create a webhook definition.
    pub async fn create_webhook(
        &self,
        definition: &WebhookDefinition,
    ) -> Result<WebhookDefinition> {
        let resp = self
            .http
            .post(self.definitions_url())
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, CMA_CONTENT_TYPE)
            .body(serde_json::to_vec(definition)?)
            .send()
            .await
            .context("creating webhook")?
            .error_for_status()
            .context("creating webhook")?;
        resp.json().await.context("decoding created webhook")
    }

    /// Create `definition` unless a webhook with the same name exists.
    pub async fn ensure_webhook(
        &self,
        definition: WebhookDefinition,
        dry_run: bool,
    ) -> Result<EnsureOutcome> {
        let existing = self.list_webhooks().await?;
        if let Some(found) = existing.into_iter().find(|w| w.name == definition.name) {
            tracing::info!(name = %found.name, url = %found.url, "webhook already configured");
            return Ok(EnsureOutcome::Exists(found));
        }

        if dry_run {
            tracing::info!(name = %definition.name, "dry run, webhook not created");
            return Ok(EnsureOutcome::WouldCreate(definition));
        }

        let created = self.create_webhook(&definition).await?;
        tracing::info!(name = %created.name, url = %created.url, "webhook created");
        Ok(EnsureOutcome::Created(created))
    }
}
