//! Project command handlers.

use std::sync::Arc;

use tabled::Tabled;

use civicmap_core::{Project, ProjectId, ProjectStatus, ProjectStore};

use crate::cli::{GlobalOpts, ProjectsArgs, ProjectsCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Progress")]
    progress: String,
    #[tabled(rename = "Boundary")]
    boundary: String,
}

impl From<&Arc<Project>> for ProjectRow {
    fn from(p: &Arc<Project>) -> Self {
        Self {
            id: p.id.to_string(),
            title: p.title.clone(),
            status: p.status.to_string(),
            location: p.location.clone(),
            progress: format!("{}%", p.progress),
            boundary: boundary_summary(p),
        }
    }
}

fn boundary_summary(p: &Project) -> String {
    match p.boundary.ring() {
        Ok(ring) => format!("{} vertices", ring.len()),
        Err(e) => format!("invalid ({e})"),
    }
}

/// Multi-line detail view for a single project.
pub fn detail(p: &Project, color: bool) -> String {
    let mut lines = vec![
        format!("ID:          {}", p.id),
        format!("Title:       {}", p.title),
        format!("Status:      {}", output::paint_status(p.status, color)),
        format!("Location:    {}", p.location),
        format!(
            "Coordinates: {:.4}, {:.4}",
            p.coordinates.lat, p.coordinates.lng
        ),
        format!("Boundary:    {}", boundary_summary(p)),
        format!("Progress:    {}%", p.progress),
    ];
    if let Some(ref kind) = p.kind {
        lines.push(format!("Type:        {kind}"));
    }
    if !p.description.is_empty() {
        lines.push(String::new());
        lines.push(p.description.clone());
    }
    lines.join("\n")
}

pub fn not_found(id: &str) -> CliError {
    CliError::NotFound {
        resource_type: "project".into(),
        identifier: id.into(),
        list_command: "projects list".into(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(store: &ProjectStore, args: ProjectsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ProjectsCommand::List { status } => {
            let status: Option<ProjectStatus> = status.map(Into::into);
            let snap: Vec<Arc<Project>> = store
                .snapshot()
                .iter()
                .filter(|p| status.is_none_or(|s| p.status == s))
                .cloned()
                .collect();
            let out = output::render_list(
                &global.output,
                &snap,
                |p| ProjectRow::from(p),
                |p| p.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProjectsCommand::Get { id } => {
            let project = store
                .get(&ProjectId::new(id.as_str()))
                .ok_or_else(|| not_found(&id))?;
            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                &project,
                |p| detail(p, color),
                |p| p.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
