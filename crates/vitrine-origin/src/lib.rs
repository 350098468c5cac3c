//! Vitrine Origin - HTML origin server for the vitrine single-page site.
//!
//! Every route answers with the SPA's `index.html` shell. Before sending it,
//! the server substitutes the shell's `__META_*__` placeholders so crawlers
//! that do not run JavaScript still see correct titles, descriptions and
//! Open Graph cards.
//!
//! # Routes
//!
//! - `GET /blog/{slug}` - Shell with metadata of the matching post
//! - `GET /debug-social?url=/path` - How common link-preview crawlers see a page
//! - `POST /api/tts` - Text-to-speech for a post, cached on disk
//! - `GET /audio/*` - Cached speech files
//! - `GET /health` - Health check (JSON)
//! - anything else - Static asset if one exists, otherwise the default shell
//!
//! # Failure policy
//!
//! Content store failures never surface to visitors: the default shell is
//! served instead, always with status 200.

pub mod config;
pub mod error;
pub mod routes;
pub mod speech;
pub mod state;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
