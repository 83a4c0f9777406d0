//! Config subcommand handlers.

use std::path::Path;
use std::str::FromStr;

use civicmap_core::ViewMode;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

const SETTABLE_KEYS: &str = "projects_file, defaults.output, defaults.color, defaults.timeout, \
     map.zoom, map.view_mode, map.container, search.endpoint, search.api_key, \
     search.api_key_env, search.timeout";

// ── Helpers ─────────────────────────────────────────────────────────

fn load_from(path: &Path) -> Result<Config, CliError> {
    Ok(civicmap_config::load_config_from(path)?)
}

/// Replace any plaintext secret before the config is displayed.
fn redacted(mut cfg: Config) -> Config {
    if cfg.search.api_key.is_some() {
        cfg.search.api_key = Some("********".into());
    }
    cfg
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: format!("'{value}' is not a valid number"),
    })
}

fn apply(cfg: &mut Config, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "projects_file" => cfg.projects_file = Some(value.into()),
        "defaults.output" => cfg.defaults.output = value,
        "defaults.color" => cfg.defaults.color = value,
        "defaults.timeout" => cfg.defaults.timeout = parse_number(key, &value)?,
        "map.zoom" => cfg.map.zoom = parse_number(key, &value)?,
        "map.view_mode" => {
            cfg.map.view_mode = ViewMode::from_str(&value).map_err(|_| CliError::Validation {
                field: key.into(),
                reason: "must be 'standard' or 'structural'".into(),
            })?;
        }
        "map.container" => cfg.map.container = value,
        "search.endpoint" => cfg.search.endpoint = Some(value),
        "search.api_key" => cfg.search.api_key = Some(value),
        "search.api_key_env" => cfg.search.api_key_env = Some(value),
        "search.timeout" => cfg.search.timeout = Some(parse_number(key, &value)?),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {SETTABLE_KEYS}"),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::effective_path(global);

    match args.command {
        ConfigCommand::Show => {
            let cfg = redacted(load_from(&path)?);
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?}\n# {e}")),
                |_| path.display().to_string(),
            )?;
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = load_from(&path)?;
            apply(&mut cfg, &key, value)?;
            cfg.validate()?;
            config::save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!("✓ Set {key} in {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!(
                        "{} already exists (pass --force to overwrite)",
                        path.display()
                    ),
                });
            }
            config::save_config_to(&Config::default(), &path)?;
            if !global.quiet {
                eprintln!("✓ Configuration written to {}", path.display());
                eprintln!("\n  Try it: civicmap map render");
            }
            Ok(())
        }
    }
}
