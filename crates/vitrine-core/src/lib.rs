//! Vitrine Core - shared building blocks for the vitrine site servers.
//!
//! This crate provides:
//! - A read-only client for the Contentful delivery API ([`content`])
//! - The per-request metadata projection and its fallback rules ([`meta`])
//! - The HTML shell template with `__META_*__` placeholders ([`shell`])
//! - Crawler / prerender request classification ([`classify`])
//! - Prometheus metrics helpers ([`metrics`])
//! - Shared error types

pub mod classify;
pub mod content;
mod error;
pub mod meta;
pub mod metrics;
pub mod shell;

pub use classify::{RequestClass, classify};
pub use content::{BlogPost, ContentfulClient, ContentfulConfig};
pub use error::{Error, Result};
pub use meta::{MetaProjection, MetaToken, SiteDefaults, escape_html};
pub use shell::Shell;
