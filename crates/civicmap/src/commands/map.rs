//! Map command handlers.
//!
//! Mounts a `MapHost` over the headless engine, so every command exercises
//! the same mount → synchronize → interact → teardown path a UI host would.

use std::fmt::Write as _;
use std::sync::{Arc, mpsc};

use serde::Serialize;
use tabled::Tabled;

use civicmap_api::SearchClient;
use civicmap_core::engine::{PathStyle, PopupContent};
use civicmap_core::{
    Color, CoreError, HeadlessEngine, LatLng, Legend, MapHost, MountOutcome, ProjectStatus,
    ProjectStore, ViewMode,
};

use crate::cli::{GlobalOpts, MapArgs, MapCommand, SelectVia};
use crate::config::Config;
use crate::error::CliError;
use crate::output;

use super::projects;

type CliHost = MapHost<HeadlessEngine, Option<SearchClient>>;

// ── Render model ────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PolygonView {
    vertices: usize,
    style: PathStyle,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkerView {
    position: LatLng,
    color: Color,
    class_name: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderedLayer {
    id: String,
    title: String,
    status: ProjectStatus,
    polygon: Option<PolygonView>,
    marker: Option<MarkerView>,
    popup: PopupContent,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapRender {
    view_mode: ViewMode,
    center: LatLng,
    zoom: u8,
    tile_url: String,
    legend: Legend,
    layers: Vec<RenderedLayer>,
}

#[derive(Tabled)]
struct LayerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Polygon")]
    polygon: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Fill")]
    fill: String,
    #[tabled(rename = "Marker")]
    marker: String,
}

impl From<&RenderedLayer> for LayerRow {
    fn from(l: &RenderedLayer) -> Self {
        let (polygon, fill) = match l.polygon {
            Some(ref p) => (
                format!("{} vertices", p.vertices),
                format!("{:.2}", p.style.fill_opacity),
            ),
            None => ("skipped".into(), "-".into()),
        };
        let (color, marker) = match l.marker {
            Some(ref m) => (
                m.color.to_string(),
                format!("{:.4}, {:.4}", m.position.lat, m.position.lng),
            ),
            None => ("-".into(), "-".into()),
        };
        Self {
            id: l.id.clone(),
            title: l.title.clone(),
            status: l.status.to_string(),
            polygon,
            color,
            fill,
            marker,
        }
    }
}

fn snapshot(host: &CliHost) -> Result<MapRender, CliError> {
    let engine = host.engine().ok_or(CliError::EngineUnavailable)?;
    let config = host.config();

    let layers = host
        .layer_entries()
        .iter()
        .map(|entry| {
            let polygon = entry
                .polygon
                .and_then(|h| engine.layer(h))
                .and_then(|l| l.as_polygon())
                .map(|p| PolygonView {
                    vertices: p.vertices.len(),
                    style: p.style,
                });
            let marker = entry
                .marker
                .and_then(|h| engine.layer(h))
                .and_then(|l| l.as_marker())
                .map(|m| MarkerView {
                    position: m.point,
                    color: m.icon.color,
                    class_name: m.icon.class_name,
                });
            RenderedLayer {
                id: entry.project.id.to_string(),
                title: entry.project.title.clone(),
                status: entry.project.status,
                polygon,
                marker,
                popup: entry.popup.clone(),
            }
        })
        .collect();

    Ok(MapRender {
        view_mode: host.view_mode(),
        center: config.center,
        zoom: config.zoom,
        tile_url: config.tile.url_template.clone(),
        legend: host.legend(),
        layers,
    })
}

fn render_detail(render: &MapRender, color: bool) -> String {
    let rows: Vec<LayerRow> = render.layers.iter().map(LayerRow::from).collect();
    let mut out = format!(
        "Map: {:.4}, {:.4} @ zoom {} ({} view)\n",
        render.center.lat, render.center.lng, render.zoom, render.view_mode
    );
    out.push_str(&output::render_table(&rows));
    let _ = write!(out, "\n\n{}", render.legend.heading);
    for entry in &render.legend.entries {
        let _ = write!(out, "\n  {} {}", output::swatch(entry.color, color), entry.label);
    }
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    store: Arc<ProjectStore>,
    cfg: &Config,
    args: MapArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let map_config = cfg.map_config();
    let container = map_config.container_handle();
    let mut host: CliHost = MapHost::new(Some(HeadlessEngine::new()), store, None, map_config);

    if host.initialize(&container)? == MountOutcome::EngineUnavailable {
        return Err(CliError::EngineUnavailable);
    }
    let color = output::should_color(&global.color);

    let out = match args.command {
        MapCommand::Render { mode } => {
            if let Some(mode) = mode {
                host.set_view_mode(mode.into())?;
            }
            let render = snapshot(&host)?;
            output::render_single(
                &global.output,
                &render,
                |r| render_detail(r, color),
                |r| {
                    r.layers
                        .iter()
                        .map(|l| l.id.clone())
                        .collect::<Vec<_>>()
                        .join("\n")
                },
            )?
        }

        MapCommand::Select { id, via } => {
            let (tx, rx) = mpsc::channel();
            host.on_select(move |project| {
                let _ = tx.send(project);
            });

            activate(&host, &id, via)?;
            let selected = rx.try_recv().map_err(|_| CliError::Map {
                message: "selection handler was not invoked".into(),
            })?;
            output::render_single(
                &global.output,
                &selected,
                |p| projects::detail(p, color),
                |p| p.id.to_string(),
            )?
        }
    };

    host.teardown();
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Fire the interaction handler bound to project `id`'s polygon or popup.
fn activate(host: &CliHost, id: &str, via: SelectVia) -> Result<(), CliError> {
    let entry = host
        .layer_entries()
        .iter()
        .find(|e| e.project.id.as_str() == id)
        .ok_or_else(|| projects::not_found(id))?;
    let engine = host.engine().ok_or(CliError::EngineUnavailable)?;

    let result = match via {
        SelectVia::Polygon => {
            let layer = entry.polygon.ok_or_else(|| CliError::Validation {
                field: "via".into(),
                reason: format!(
                    "project '{id}' has no polygon (degenerate boundary); use --via popup"
                ),
            })?;
            engine.click(layer)
        }
        SelectVia::Popup => {
            let layer = entry.marker.ok_or_else(|| CliError::Map {
                message: format!("project '{id}' has no marker"),
            })?;
            engine.activate_popup(layer)
        }
    };
    result.map_err(|e| CliError::from(CoreError::from(e)))
}
