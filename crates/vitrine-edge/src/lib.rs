//! Vitrine Edge - request dispatcher that runs in front of the origin.
//!
//! Every request passes through [`dispatch::dispatch`]:
//!
//! 1. `/sitemap.xml` is fetched from upstream and served directly (cached
//!    for a few minutes).
//! 2. Crawlers and `_escaped_fragment_` requests are forwarded to the
//!    prerendering service under a hard timeout.
//! 3. Everything else, and every failure above, is proxied to the origin.
//!
//! No failure of the sitemap or prerender path is ever visible to the client.

pub mod config;
pub mod dispatch;
mod prerender;
mod proxy;
mod sitemap;
pub mod state;

pub use config::Config;
pub use dispatch::router;
pub use state::AppState;
