//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use civicmap_config::ConfigError;
use civicmap_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(civicmap::not_found),
        help("Run: civicmap {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Cannot load projects from {path}")]
    #[diagnostic(
        code(civicmap::projects_file),
        help("Expected a JSON array of projects: {reason}")
    )]
    ProjectsFile { path: String, reason: String },

    // ── Map ──────────────────────────────────────────────────────────
    #[error("Mapping engine is not available")]
    #[diagnostic(code(civicmap::engine_unavailable))]
    EngineUnavailable,

    #[error("Map error: {message}")]
    #[diagnostic(code(civicmap::map))]
    Map { message: String },

    // ── Search ───────────────────────────────────────────────────────
    #[error("Location search is not configured")]
    #[diagnostic(
        code(civicmap::search_not_configured),
        help(
            "Set search.endpoint in the config file,\n\
             or pass --search-url / set CIVICMAP_SEARCH_URL."
        )
    )]
    SearchNotConfigured,

    #[error("Location search failed: {message}")]
    #[diagnostic(code(civicmap::search_failed))]
    SearchFailed {
        message: String,
        status: Option<u16>,
    },

    #[error("Location search timed out")]
    #[diagnostic(
        code(civicmap::timeout),
        help("Raise the limit with --timeout <seconds> or search.timeout in the config file.")
    )]
    SearchTimeout,

    #[error("Search was interrupted before it completed")]
    #[diagnostic(code(civicmap::interrupted))]
    Interrupted,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(civicmap::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(civicmap::config),
        help("Inspect the effective configuration with: civicmap config show")
    )]
    Config(Box<figment::Error>),

    #[error("Failed to write config: {0}")]
    #[diagnostic(code(civicmap::config_write))]
    ConfigWrite(#[from] toml::ser::Error),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    #[diagnostic(code(civicmap::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    #[diagnostic(code(civicmap::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            Self::SearchFailed { status: None, .. } => exit_code::CONNECTION,
            Self::SearchTimeout => exit_code::TIMEOUT,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProjectNotFound { id } => CliError::NotFound {
                resource_type: "project".into(),
                identifier: id,
                list_command: "projects list".into(),
            },

            CoreError::ProjectsFile { path, reason } => CliError::ProjectsFile { path, reason },

            CoreError::EngineUnavailable => CliError::EngineUnavailable,

            CoreError::Engine(e) => CliError::Map {
                message: e.to_string(),
            },

            CoreError::NotMounted => CliError::Map {
                message: "map is not mounted".into(),
            },

            CoreError::Geometry(e) => CliError::Validation {
                field: "boundary".into(),
                reason: e.to_string(),
            },

            CoreError::SearchUnavailable => CliError::SearchNotConfigured,

            CoreError::SearchFailed { message, status } => {
                CliError::SearchFailed { message, status }
            }

            CoreError::SearchTimeout => CliError::SearchTimeout,

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Serialization(e) => CliError::ConfigWrite(e),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_exit_code() {
        let err = CliError::from(CoreError::ProjectNotFound { id: "9".into() });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }

    #[test]
    fn transport_failures_are_connection_errors() {
        let transport = CliError::from(CoreError::SearchFailed {
            message: "connection refused".into(),
            status: None,
        });
        assert_eq!(transport.exit_code(), exit_code::CONNECTION);

        let service = CliError::from(CoreError::SearchFailed {
            message: "unavailable".into(),
            status: Some(503),
        });
        assert_eq!(service.exit_code(), exit_code::GENERAL);

        let timeout = CliError::from(CoreError::SearchTimeout);
        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);
    }
}
