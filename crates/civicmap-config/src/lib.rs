//! Shared configuration for the civicmap CLI.
//!
//! TOML file at the platform config dir, merged with `CIVICMAP_` environment
//! variables, and translation to `civicmap_core::MapConfig` and
//! `civicmap_api::TransportConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use civicmap_api::TransportConfig;
use civicmap_core::engine::{ControlPosition, TileLayer};
use civicmap_core::{LatLng, MapConfig, ViewMode};

/// Environment prefix; nested keys are separated by a double underscore
/// (`CIVICMAP_SEARCH__ENDPOINT`).
pub const ENV_PREFIX: &str = "CIVICMAP_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// JSON project list to load instead of the built-in Berlin projects.
    pub projects_file: Option<PathBuf>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub map: MapSettings,

    #[serde(default)]
    pub search: SearchSettings,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// Map view and base-layer settings.
#[derive(Debug, Deserialize, Serialize)]
pub struct MapSettings {
    #[serde(default = "default_zoom")]
    pub zoom: u8,

    /// Corner for the zoom buttons: topleft, topright, bottomleft, bottomright.
    #[serde(default)]
    pub zoom_control: ControlPosition,

    #[serde(default)]
    pub view_mode: ViewMode,

    #[serde(default = "default_container")]
    pub container: String,

    #[serde(default = "default_center")]
    pub center: LatLng,

    #[serde(default)]
    pub tile: TileLayer,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            zoom_control: ControlPosition::default(),
            view_mode: ViewMode::default(),
            container: default_container(),
            center: default_center(),
            tile: TileLayer::default(),
        }
    }
}

fn default_center() -> LatLng {
    civicmap_core::config::DEFAULT_CENTER
}
fn default_zoom() -> u8 {
    civicmap_core::config::DEFAULT_ZOOM
}
fn default_container() -> String {
    civicmap_core::config::DEFAULT_CONTAINER.into()
}

/// Location search service settings. Search is disabled without an endpoint.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SearchSettings {
    /// Base URL of the places service (e.g., "https://places.example.org").
    pub endpoint: Option<String>,

    /// API key (plaintext; prefer `api_key_env`).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Override the global timeout.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "civicmap", "civicmap").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("civicmap");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from an explicit file path + environment. A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML at `path`, creating parent directories.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Validation & translation ────────────────────────────────────────

impl Config {
    /// Reject values the map or transport could not use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.map.center.is_finite() {
            return Err(ConfigError::Validation {
                field: "map.center".into(),
                reason: "latitude and longitude must be finite".into(),
            });
        }
        if self.map.zoom > self.map.tile.max_zoom {
            return Err(ConfigError::Validation {
                field: "map.zoom".into(),
                reason: format!(
                    "{} exceeds the tile layer's max zoom of {}",
                    self.map.zoom, self.map.tile.max_zoom
                ),
            });
        }
        if let Some(ref endpoint) = self.search.endpoint {
            url::Url::parse(endpoint).map_err(|e| ConfigError::Validation {
                field: "search.endpoint".into(),
                reason: format!("invalid URL '{endpoint}': {e}"),
            })?;
        }
        Ok(())
    }

    /// Runtime settings for `MapHost`.
    pub fn map_config(&self) -> MapConfig {
        MapConfig {
            center: self.map.center,
            zoom: self.map.zoom,
            tile: self.map.tile.clone(),
            zoom_control: self.map.zoom_control,
            initial_view_mode: self.map.view_mode,
            container: self.map.container.clone(),
        }
    }

    /// HTTP settings for the search client.
    pub fn transport_config(&self) -> TransportConfig {
        let timeout = self.search.timeout.unwrap_or(self.defaults.timeout);
        let mut transport = TransportConfig::default().with_timeout(Duration::from_secs(timeout));
        if let Some(key) = resolve_api_key(&self.search) {
            transport = transport.with_api_key(key);
        }
        transport
    }
}

/// Resolve the search API key: `api_key_env` first, then plaintext.
pub fn resolve_api_key(search: &SearchSettings) -> Option<SecretString> {
    if let Some(ref env_name) = search.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }
    search
        .api_key
        .as_ref()
        .map(|key| SecretString::from(key.clone()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn load(jail_path: &str) -> Result<Config, figment::Error> {
        load_config_from(Path::new(jail_path)).map_err(|e| figment::Error::from(e.to_string()))
    }

    #[test]
    fn defaults_describe_berlin_overview() {
        Jail::expect_with(|_| {
            let config = load("missing.toml")?;
            let map = config.map_config();
            assert_eq!(map, MapConfig::default());
            assert!(config.search.endpoint.is_none());
            assert_eq!(config.defaults.output, "table");
            Ok(())
        });
    }

    #[test]
    fn file_values_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                projects_file = "projects.json"

                [map]
                zoom = 14
                zoom_control = "topleft"
                view_mode = "structural"
                center = { lat = 52.52, lng = 13.405 }

                [search]
                endpoint = "https://places.example.org"
                api_key = "plain"
                "#,
            )?;
            let config = load("config.toml")?;
            let map = config.map_config();
            assert_eq!(map.zoom, 14);
            assert_eq!(map.zoom_control, ControlPosition::TopLeft);
            assert_eq!(map.initial_view_mode, ViewMode::Structural);
            assert_eq!(config.projects_file, Some(PathBuf::from("projects.json")));
            assert_eq!(
                resolve_api_key(&config.search).unwrap().expose_secret(),
                "plain"
            );
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[map]\nzoom = 10\n")?;
            jail.set_env("CIVICMAP_MAP__ZOOM", "15");
            jail.set_env("CIVICMAP_SEARCH__ENDPOINT", "https://env.example.org");
            let config = load("config.toml")?;
            assert_eq!(config.map.zoom, 15);
            assert_eq!(config.search.endpoint.as_deref(), Some("https://env.example.org"));
            Ok(())
        });
    }

    #[test]
    fn zoom_beyond_tile_max_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[map]\nzoom = 21\n")?;
            let err = load_config_from(Path::new("config.toml")).unwrap_err();
            assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "map.zoom"));
            Ok(())
        });
    }

    #[test]
    fn bad_endpoint_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[search]\nendpoint = \"not a url\"\n")?;
            let err = load_config_from(Path::new("config.toml")).unwrap_err();
            assert!(err.to_string().contains("search.endpoint"));
            Ok(())
        });
    }

    #[test]
    fn api_key_env_takes_precedence() {
        Jail::expect_with(|jail| {
            jail.set_env("CIVICMAP_TEST_SEARCH_KEY", "from-env");
            let search = SearchSettings {
                api_key: Some("plain".into()),
                api_key_env: Some("CIVICMAP_TEST_SEARCH_KEY".into()),
                ..SearchSettings::default()
            };
            assert_eq!(resolve_api_key(&search).unwrap().expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn transport_uses_search_timeout() {
        let mut config = Config::default();
        config.search.timeout = Some(5);
        assert_eq!(config.transport_config().timeout, Duration::from_secs(5));
        config.search.timeout = None;
        assert_eq!(config.transport_config().timeout, Duration::from_secs(30));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.map.zoom = 13;
        config.search.endpoint = Some("https://places.example.org".into());

        save_config_to(&config, &path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("zoom = 13"));

        let loaded: Config = toml::from_str(&raw).unwrap();
        assert_eq!(loaded.map.zoom, 13);
        assert_eq!(loaded.search.endpoint, config.search.endpoint);
    }
}
