use thiserror::Error;

/// Top-level error type for the `civicmap-api` crate.
///
/// Covers transport, URL, service and payload failures of the place-search
/// service. `civicmap-core` maps these into its own error type.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Building the HTTP client failed (bad header value, TLS backend).
    #[error("Client setup failed: {0}")]
    ClientSetup(String),

    // ── Service ─────────────────────────────────────────────────────
    /// Non-success response from the search service.
    #[error("Search service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    /// API key rejected by the service.
    #[error("Invalid API key")]
    InvalidApiKey,

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status code attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Service { status, .. } => Some(*status),
            Self::InvalidApiKey => Some(401),
            _ => None,
        }
    }
}
