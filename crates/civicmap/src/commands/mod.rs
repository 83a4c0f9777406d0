//! Command dispatch.

pub mod config_cmd;
mod map;
mod projects;
mod search;

use std::sync::Arc;

use civicmap_core::ProjectStore;

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;

/// Route a parsed command to its handler.
pub async fn dispatch(cmd: Command, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Projects(args) => {
            let store = load_store(cfg)?;
            projects::handle(&store, args, global)
        }
        Command::Map(args) => {
            let store = load_store(cfg)?;
            map::handle(store, cfg, args, global)
        }
        Command::Search(args) => search::handle(cfg, args, global).await,
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}

fn load_store(cfg: &Config) -> Result<Arc<ProjectStore>, CliError> {
    let projects = config::load_projects(cfg)?;
    Ok(Arc::new(ProjectStore::with_projects(projects)))
}
