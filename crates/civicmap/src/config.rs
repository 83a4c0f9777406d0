//! CLI configuration layer.
//!
//! Wraps `civicmap-config` with `GlobalOpts` overrides: an explicit config
//! path, a projects file, the search endpoint and key, and the timeout.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tracing::debug;

use civicmap_api::SearchClient;
use civicmap_core::{Project, seed};

pub use civicmap_config::{Config, config_path, save_config_to};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Effective config file path: `--config` or the platform default.
pub fn effective_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load config from file + environment, then apply CLI overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = civicmap_config::load_config_from(&effective_path(global))?;

    if let Some(ref projects) = global.projects {
        cfg.projects_file = Some(projects.clone());
    }
    if let Some(ref url) = global.search_url {
        cfg.search.endpoint = Some(url.clone());
    }
    if let Some(timeout) = global.timeout {
        cfg.defaults.timeout = timeout;
        cfg.search.timeout = Some(timeout);
    }
    cfg.validate()?;
    Ok(cfg)
}

/// The configured project list, or the built-in Berlin projects.
pub fn load_projects(cfg: &Config) -> Result<Vec<Project>, CliError> {
    match cfg.projects_file {
        Some(ref path) => {
            debug!(path = %path.display(), "loading projects file");
            Ok(seed::load_projects(path)?)
        }
        None => Ok(seed::berlin_projects()),
    }
}

/// Build the search client, or `None` when no endpoint is configured.
pub fn search_client(cfg: &Config, global: &GlobalOpts) -> Result<Option<SearchClient>, CliError> {
    let Some(ref endpoint) = cfg.search.endpoint else {
        return Ok(None);
    };

    let mut transport = cfg.transport_config();
    if let Some(ref key) = global.api_key {
        transport = transport.with_api_key(SecretString::from(key.clone()));
    }
    if let Some(timeout) = global.timeout {
        transport = transport.with_timeout(Duration::from_secs(timeout));
    }

    let client = SearchClient::new(endpoint, &transport)
        .map_err(civicmap_core::CoreError::from)?;
    Ok(Some(client))
}
