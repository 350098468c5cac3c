//! Error types shared by the vitrine crates.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the content client and the shell loader.
#[derive(Error, Debug)]
pub enum Error {
    /// The HTML shell could not be read at startup.
    #[error("cannot read HTML shell {path}: {source}")]
    ShellUnreadable {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The content store answered with a non-success status.
    #[error("content store returned {status} for {url}")]
    ContentStatus {
        /// HTTP status returned by the store.
        status: u16,
        /// Request URL (without credentials).
        url: String,
    },

    /// HTTP transport error talking to an upstream service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A URL could not be constructed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
