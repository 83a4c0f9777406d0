// ── Layer synchronization ──
//
// Full clear-and-rebuild of the root layer group from (projects, mode).
// Project counts are small and edits replace the whole list, so every pass
// starts from an empty group. A keyed diff by project id is the upgrade
// path if collections grow.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::{debug, warn};

use crate::engine::{
    ActivationHandler, LayerGroupHandle, LayerHandle, MapEngine, MarkerIcon, PathStyle, Popup,
    PopupContent, POPUP_ACTION_LABEL,
};
use crate::error::CoreError;
use crate::model::{Project, ProjectId, ViewMode};
use crate::style::style;

// ── Selection callback ──────────────────────────────────────────────

struct SelectionHandler(Box<dyn Fn(Arc<Project>) + Send + Sync>);

/// Shared slot holding the host application's selection callback.
///
/// Layer handlers capture a clone of the slot rather than the callback
/// itself, so re-registering takes effect for layers already on the map.
#[derive(Clone, Default)]
pub struct SelectionSlot {
    handler: Arc<ArcSwapOption<SelectionHandler>>,
}

impl SelectionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the single selection callback, replacing any previous one.
    pub fn set<F>(&self, callback: F)
    where
        F: Fn(Arc<Project>) + Send + Sync + 'static,
    {
        self.handler
            .store(Some(Arc::new(SelectionHandler(Box::new(callback)))));
    }

    pub fn clear(&self) {
        self.handler.store(None);
    }

    pub fn is_set(&self) -> bool {
        self.handler.load().is_some()
    }

    /// Invoke the callback with `project`. Returns `false` if none is registered.
    pub fn dispatch(&self, project: Arc<Project>) -> bool {
        match self.handler.load_full() {
            Some(handler) => {
                debug!(project = %project.id, "project selected");
                (handler.0)(project);
                true
            }
            None => {
                debug!(project = %project.id, "selection ignored, no callback registered");
                false
            }
        }
    }

    /// Engine-facing handler that selects `project` when fired.
    fn bind(&self, project: &Arc<Project>) -> ActivationHandler {
        let slot = self.clone();
        let project = Arc::clone(project);
        Arc::new(move || {
            slot.dispatch(Arc::clone(&project));
        })
    }
}

// ── Layer entries ───────────────────────────────────────────────────

/// One project paired with the engine objects rendered for it during the
/// current pass. Discarded wholesale at the start of the next pass.
#[derive(Debug, Clone)]
pub struct MapLayerEntry {
    pub project: Arc<Project>,
    /// `None` when the boundary was degenerate or the engine rejected it.
    pub polygon: Option<LayerHandle>,
    pub marker: Option<LayerHandle>,
    pub popup: PopupContent,
}

/// Counts from one synchronization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub polygons: usize,
    pub markers: usize,
    /// Projects whose boundary was skipped as degenerate.
    pub skipped: Vec<ProjectId>,
    /// Layers the engine refused to create.
    pub failed: usize,
}

// ── LayerSynchronizer ───────────────────────────────────────────────

/// Rebuilds the root layer group. Only touches the engine while a pass
/// holds `&mut` access to it.
pub struct LayerSynchronizer {
    group: LayerGroupHandle,
    entries: Vec<MapLayerEntry>,
}

impl LayerSynchronizer {
    pub fn new(group: LayerGroupHandle) -> Self {
        Self {
            group,
            entries: Vec::new(),
        }
    }

    pub fn group(&self) -> LayerGroupHandle {
        self.group
    }

    /// Entries from the latest pass, in draw order.
    pub fn entries(&self) -> &[MapLayerEntry] {
        &self.entries
    }

    pub fn entry(&self, id: &ProjectId) -> Option<&MapLayerEntry> {
        self.entries.iter().find(|e| &e.project.id == id)
    }

    /// Run one pass: clear the group, then render every project in order.
    ///
    /// Only a failure to clear the group aborts the pass. Per-project
    /// problems are logged and the remaining projects are still rendered.
    pub fn synchronize<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        projects: &[Arc<Project>],
        mode: ViewMode,
        selection: &SelectionSlot,
    ) -> Result<SyncReport, CoreError> {
        self.clear(engine)?;

        let mut report = SyncReport::default();
        for project in projects {
            let entry = self.render_project(engine, project, mode, selection, &mut report);
            self.entries.push(entry);
        }

        debug!(
            %mode,
            polygons = report.polygons,
            markers = report.markers,
            skipped = report.skipped.len(),
            "synchronization pass complete"
        );
        Ok(report)
    }

    /// Remove every layer this synchronizer created.
    pub fn clear<E: MapEngine + ?Sized>(&mut self, engine: &mut E) -> Result<(), CoreError> {
        self.entries.clear();
        engine.remove_all_layers(self.group)?;
        Ok(())
    }

    fn render_project<E: MapEngine + ?Sized>(
        &self,
        engine: &mut E,
        project: &Arc<Project>,
        mode: ViewMode,
        selection: &SelectionSlot,
        report: &mut SyncReport,
    ) -> MapLayerEntry {
        let resolved = style(project.status, mode);

        let polygon = match project.boundary.ring() {
            Ok(ring) => match engine.add_polygon(
                self.group,
                ring.vertices(),
                &PathStyle::from(resolved),
                selection.bind(project),
            ) {
                Ok(handle) => {
                    report.polygons += 1;
                    Some(handle)
                }
                Err(e) => {
                    warn!(project = %project.id, error = %e, "engine rejected polygon");
                    report.failed += 1;
                    None
                }
            },
            Err(e) => {
                warn!(
                    project = %project.id,
                    title = %project.title,
                    error = %e,
                    "degenerate boundary, rendering marker only"
                );
                report.skipped.push(project.id.clone());
                None
            }
        };

        let popup = PopupContent {
            title: project.title.clone(),
            status: project.status,
            action_label: POPUP_ACTION_LABEL,
        };

        let marker = match engine.add_marker(
            self.group,
            project.coordinates,
            &MarkerIcon::dot(resolved.color),
            Popup::new(popup.clone(), selection.bind(project)),
        ) {
            Ok(handle) => {
                report.markers += 1;
                Some(handle)
            }
            Err(e) => {
                warn!(project = %project.id, error = %e, "engine rejected marker");
                report.failed += 1;
                None
            }
        };

        MapLayerEntry {
            project: Arc::clone(project),
            polygon,
            marker,
            popup,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::engine::{ContainerHandle, HeadlessEngine, MapOptions};
    use crate::model::{Boundary, LatLng, ProjectStatus};
    use crate::seed;
    use crate::style::palette;

    fn setup() -> (HeadlessEngine, LayerSynchronizer) {
        let mut engine = HeadlessEngine::new();
        let map = engine
            .create_map(
                &ContainerHandle::new("map"),
                &MapOptions {
                    center: LatLng::new(52.49, 13.36),
                    zoom: 12,
                    zoom_control: false,
                    attribution_control: false,
                },
            )
            .unwrap();
        let group = engine.create_layer_group(map).unwrap();
        (engine, LayerSynchronizer::new(group))
    }

    fn berlin() -> Vec<Arc<Project>> {
        seed::berlin_projects().into_iter().map(Arc::new).collect()
    }

    #[test]
    fn one_polygon_and_marker_per_project() {
        let (mut engine, mut sync) = setup();
        let projects = berlin();
        let slot = SelectionSlot::new();

        let report = sync
            .synchronize(&mut engine, &projects, ViewMode::Standard, &slot)
            .unwrap();
        assert_eq!(report.polygons, 6);
        assert_eq!(report.markers, 6);

        // Second pass over a populated group yields the same counts.
        sync.synchronize(&mut engine, &projects, ViewMode::Standard, &slot)
            .unwrap();
        assert_eq!(engine.polygon_count(sync.group()), 6);
        assert_eq!(engine.marker_count(sync.group()), 6);
        assert_eq!(sync.entries().len(), 6);
    }

    #[test]
    fn degenerate_boundary_keeps_marker_and_continues() {
        let (mut engine, mut sync) = setup();
        let flat = Project::new("x", "Flat", ProjectStatus::Planning, LatLng::new(52.5, 13.4))
            .with_boundary(vec![LatLng::new(52.5, 13.4), LatLng::new(52.6, 13.5)]);
        let square = Project::new("y", "Square", ProjectStatus::Active, LatLng::new(52.4, 13.3))
            .with_boundary(Boundary::rectangle(LatLng::new(52.4, 13.3), 0.0002));
        let (a, b) = (LatLng::new(52.45, 13.35), LatLng::new(52.46, 13.36));
        let zigzag = Project::new("z", "Zigzag", ProjectStatus::Review, a)
            .with_boundary(vec![a, b, a, b]);
        let retraced = Project::new("w", "Retraced", ProjectStatus::Review, b)
            .with_boundary(vec![a, b, b, a, b]);
        let projects = vec![
            Arc::new(flat),
            Arc::new(square),
            Arc::new(zigzag),
            Arc::new(retraced),
        ];

        let report = sync
            .synchronize(&mut engine, &projects, ViewMode::Standard, &SelectionSlot::new())
            .unwrap();

        assert_eq!(
            report.skipped,
            vec![ProjectId::from("x"), ProjectId::from("z"), ProjectId::from("w")]
        );
        assert_eq!(report.polygons, 1);
        assert_eq!(report.markers, 4);
        assert_eq!(engine.polygon_count(sync.group()), 1);
        assert!(sync.entry(&"x".into()).unwrap().polygon.is_none());
        assert!(sync.entry(&"y".into()).unwrap().polygon.is_some());
        assert!(sync.entry(&"z".into()).unwrap().polygon.is_none());
    }

    #[test]
    fn polygon_click_selects_that_project_once() {
        let (mut engine, mut sync) = setup();
        let slot = SelectionSlot::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        slot.set(move |p| sink.lock().unwrap().push(p.id.clone()));

        sync.synchronize(&mut engine, &berlin(), ViewMode::Standard, &slot)
            .unwrap();
        let polygon = sync.entry(&"3".into()).unwrap().polygon.unwrap();
        engine.click(polygon).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![ProjectId::from("3")]);
    }

    #[test]
    fn popup_action_selects_project() {
        let (mut engine, mut sync) = setup();
        let slot = SelectionSlot::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        slot.set(move |p| *sink.lock().unwrap() = Some(p.title.clone()));

        sync.synchronize(&mut engine, &berlin(), ViewMode::Standard, &slot)
            .unwrap();
        let entry = sync.entry(&"2".into()).unwrap();
        assert_eq!(entry.popup.action_label, "Open Studio");
        engine.activate_popup(entry.marker.unwrap()).unwrap();

        assert_eq!(
            seen.lock().unwrap().as_deref(),
            Some("Kollwitzplatz Schoolyard")
        );
    }

    #[test]
    fn marker_dot_matches_polygon_color() {
        let (mut engine, mut sync) = setup();
        sync.synchronize(&mut engine, &berlin(), ViewMode::Structural, &SelectionSlot::new())
            .unwrap();
        let entry = sync.entry(&"1".into()).unwrap();

        let polygon = engine.layer(entry.polygon.unwrap()).unwrap().as_polygon().unwrap();
        let marker = engine.layer(entry.marker.unwrap()).unwrap().as_marker().unwrap();
        assert_eq!(polygon.style.color, palette::ENGINEERING);
        assert_eq!(polygon.style.fill_color, polygon.style.color);
        assert_eq!(marker.icon.color, polygon.style.color);
    }

    #[test]
    fn dispatch_without_callback_is_ignored() {
        let slot = SelectionSlot::new();
        let project = Arc::new(Project::new("a", "A", ProjectStatus::Review, LatLng::new(0.0, 0.0)));
        assert!(!slot.dispatch(Arc::clone(&project)));
        slot.set(|_| {});
        assert!(slot.is_set());
        assert!(slot.dispatch(project));
    }
}
