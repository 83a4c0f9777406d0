// ── Core error types ──
//
// User-facing errors from civicmap-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<civicmap_api::Error>`
// impl translates transport-layer errors into search failures.

use thiserror::Error;

use crate::engine::EngineError;
use crate::model::GeometryError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Engine errors ────────────────────────────────────────────────
    #[error("Mapping engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Mapping engine is not available in this environment")]
    EngineUnavailable,

    #[error("Map is not mounted")]
    NotMounted,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Project not found: {id}")]
    ProjectNotFound { id: String },

    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Cannot load projects from {path}: {reason}")]
    ProjectsFile { path: String, reason: String },

    // ── Search errors ────────────────────────────────────────────────
    #[error("No search service configured")]
    SearchUnavailable,

    #[error("Search failed: {message}")]
    SearchFailed {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Search timed out")]
    SearchTimeout,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<civicmap_api::Error> for CoreError {
    fn from(err: civicmap_api::Error) -> Self {
        let status = err.status();
        match err {
            civicmap_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid search endpoint URL: {e}"),
            },
            civicmap_api::Error::ClientSetup(message) => CoreError::Config { message },
            civicmap_api::Error::Service { message, .. } => {
                CoreError::SearchFailed { message, status }
            }
            civicmap_api::Error::InvalidApiKey => CoreError::SearchFailed {
                message: "search service rejected the API key".into(),
                status,
            },
            civicmap_api::Error::Deserialization { message, body: _ } => {
                CoreError::SearchFailed {
                    message: format!("unexpected response: {message}"),
                    status,
                }
            }
            civicmap_api::Error::Transport(e) if e.is_timeout() => CoreError::SearchTimeout,
            civicmap_api::Error::Transport(e) => CoreError::SearchFailed {
                message: e.to_string(),
                status,
            },
        }
    }
}
