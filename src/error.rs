//! Error types for access-sdk.

use std::sync::Arc;
use thiserror::Error;

/// The main error type for access-sdk.
#[derive(Debug, Error)]
pub enum Error {
    // ── Client ───────────────────────────────────────────────────────────────
    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configured base URL could not be parsed.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Remote service ───────────────────────────────────────────────────────
    /// The identity service answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, or the status reason when the body was empty.
        message: String,
    },

    /// The request did not complete in time.
    #[error("Request timed out")]
    Timeout,

    // ── Refresh coordination ─────────────────────────────────────────────────
    /// A refresh failed. Every caller that shared the request receives the
    /// same underlying error.
    #[error("Token refresh failed: {0}")]
    Refresh(#[source] Arc<Error>),

    /// The drain task went away before settling this caller.
    #[error("Token refresh aborted before completion")]
    RefreshAborted,

    // ── Infrastructure ───────────────────────────────────────────────────────
    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// General I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status carried by this error, looking through shared refresh failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            Error::Refresh(inner) => inner.status(),
            _ => None,
        }
    }

    /// Returns true if the caller must sign in again to recover.
    #[must_use]
    pub fn requires_reauth(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

/// Convenience type alias.
pub type Result<T> = std::result::Result<T, Error>;
