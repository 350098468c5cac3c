//! Contentful webhook setup.
//!
//! Makes sure the space has a webhook that triggers a site rebuild when posts
//! change. Safe to run repeatedly: an existing webhook with the same name is
//! left untouched.
//!
//! # Usage
//!
//! ```bash
//! # Show what would be done
//! configure-webhook --url https://api.netlify.com/build_hooks/abc --dry-run
//!
//! # Create the webhook
//! configure-webhook --url https://api.netlify.com/build_hooks/abc
//! ```

use anyhow::Result;
use clap::Parser;
use vitrine_tools::webhook::{DEFAULT_CMA_URL, EnsureOutcome, ManagementClient, WebhookDefinition};

/// Contentful webhook setup.
#[derive(Parser, Debug)]
#[command(name = "configure-webhook")]
#[command(about = "Register the rebuild-on-publish webhook in Contentful")]
#[command(version)]
struct Args {
    /// Build hook URL the webhook should call
    #[arg(long, env = "BUILD_HOOK_URL")]
    url: String,

    /// Webhook name
    #[arg(long, default_value = "Rebuild site on publish")]
    name: String,

    /// Content store space
    #[arg(long, env = "CONTENTFUL_SPACE_ID")]
    space_id: String,

    /// Management API token
    #[arg(long, env = "CONTENTFUL_MANAGEMENT_TOKEN", hide_env_values = true)]
    management_token: String,

    /// Management API base URL
    #[arg(long, env = "CONTENTFUL_MANAGEMENT_API_URL", default_value = DEFAULT_CMA_URL)]
    api_url: String,

    /// Dry run - show what would be done without making changes
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    vitrine_tools::load_dotenv(&std::env::var("DOTENV_PATH").unwrap_or_else(|_| ".env".into()))?;
    vitrine_tools::init_tracing();
    let args = Args::parse();

    if !args.url.starts_with("https://") && !args.url.starts_with("http://") {
        anyhow::bail!("--url must be an http(s) URL: {}", args.url);
    }

    let client = ManagementClient::new(&args.api_url, &args.space_id, &args.management_token)?;
    let definition = WebhookDefinition::rebuild(&args.name, &args.url);

    match client.ensure_webhook(definition, args.dry_run).await? {
        EnsureOutcome::Exists(w) => println!("Webhook \"{}\" already exists ({})", w.name, w.url),
        EnsureOutcome::Created(w) => println!("Created webhook \"{}\" -> {}", w.name, w.url),
        EnsureOutcome::WouldCreate(w) => {
            println!("Would create webhook \"{}\" -> {}", w.name, w.url);
            println!("Topics: {}", w.topics.join(", "));
        }
    }
    Ok(())
}
