// ── MapHost ──
//
// Owns the mapping engine instance and its root layer group for the whole
// mount lifetime. Composes the store subscription, view-mode controller,
// layer synchronizer and search controller, and forwards layer activations
// to the host application's selection callback.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::MapConfig;
use crate::engine::{ContainerHandle, EngineError, LayerGroupHandle, MapEngine, MapHandle};
use crate::error::CoreError;
use crate::model::{Project, ViewMode};
use crate::search::{SearchController, SearchService};
use crate::store::ProjectStore;
use crate::stream::ProjectStream;
use crate::style::{Legend, ViewModeController, legend};
use crate::sync::{LayerSynchronizer, MapLayerEntry, SelectionSlot, SyncReport};

// ── MapState ────────────────────────────────────────────────────────

/// Lifecycle state observable by the map area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    /// Not mounted yet; the map area shows a placeholder.
    Loading,
    Ready,
    /// No engine in this environment. The placeholder stays up.
    Unavailable,
    TornDown,
}

/// Result of [`MapHost::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    Mounted,
    AlreadyMounted,
    EngineUnavailable,
}

struct Mount {
    map: MapHandle,
    synchronizer: LayerSynchronizer,
}

// ── MapHost ─────────────────────────────────────────────────────────

/// Top-level map orchestrator.
///
/// The engine is injected at construction (`None` when the environment has
/// no mapping engine). Synchronization passes take `&mut self`, so two
/// passes can never interleave. Dropping the host tears the map down.
pub struct MapHost<E: MapEngine, S: SearchService> {
    engine: Option<E>,
    config: MapConfig,
    store: Arc<ProjectStore>,
    projects: ProjectStream,
    view_mode: Arc<ViewModeController>,
    mode_rx: watch::Receiver<ViewMode>,
    selection: SelectionSlot,
    search: SearchController<S>,
    mount: Option<Mount>,
    state: watch::Sender<MapState>,
    unavailable_reported: bool,
}

impl<E: MapEngine, S: SearchService> MapHost<E, S> {
    pub fn new(engine: Option<E>, store: Arc<ProjectStore>, search: S, config: MapConfig) -> Self {
        let projects = store.subscribe();
        let view_mode = Arc::new(ViewModeController::new(config.initial_view_mode));
        let mode_rx = view_mode.subscribe();
        let (state, _) = watch::channel(MapState::Loading);

        Self {
            engine,
            config,
            store,
            projects,
            view_mode,
            mode_rx,
            selection: SelectionSlot::new(),
            search: SearchController::new(search),
            mount: None,
            state,
            unavailable_reported: false,
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Mount the map into `container` and run the first synchronization pass.
    ///
    /// Repeated calls while mounted are no-ops. A missing engine is not an
    /// error: the state moves to [`MapState::Unavailable`] and the condition
    /// is logged once.
    pub fn initialize(&mut self, container: &ContainerHandle) -> Result<MountOutcome, CoreError> {
        if self.mount.is_some() {
            debug!(container = container.as_str(), "map already mounted");
            return Ok(MountOutcome::AlreadyMounted);
        }

        let Some(engine) = self.engine.as_mut() else {
            if !self.unavailable_reported {
                error!("mapping engine unavailable, map stays in placeholder state");
                self.unavailable_reported = true;
            }
            self.state.send_replace(MapState::Unavailable);
            return Ok(MountOutcome::EngineUnavailable);
        };

        let (map, group) = build_map(engine, container, &self.config)?;
        self.mount = Some(Mount {
            map,
            synchronizer: LayerSynchronizer::new(group),
        });
        self.state.send_replace(MapState::Ready);
        info!(
            container = container.as_str(),
            zoom = self.config.zoom,
            "map mounted"
        );

        self.synchronize_now()?;
        Ok(MountOutcome::Mounted)
    }

    /// Release the engine instance and every layer on it.
    ///
    /// Returns `true` only on the call that actually released the map;
    /// later calls are no-ops.
    pub fn teardown(&mut self) -> bool {
        let Some(mut mount) = self.mount.take() else {
            if *self.state.borrow() == MapState::Unavailable {
                self.search.reset();
                self.state.send_replace(MapState::TornDown);
            }
            return false;
        };

        if let Some(engine) = self.engine.as_mut() {
            if let Err(e) = mount.synchronizer.clear(engine) {
                warn!(error = %e, "clearing layers during teardown failed");
            }
            engine.dispose_map(mount.map);
        }
        self.search.reset();
        self.state.send_replace(MapState::TornDown);
        info!("map torn down");
        true
    }

    /// Register the callback invoked with the full project whenever a
    /// polygon or popup action is activated. Replaces any previous callback.
    pub fn on_select<F>(&self, callback: F)
    where
        F: Fn(Arc<Project>) + Send + Sync + 'static,
    {
        self.selection.set(callback);
    }

    // ── View mode ────────────────────────────────────────────────────

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode.current()
    }

    /// Shared controller, for flipping the mode from outside the host task.
    pub fn view_mode_controller(&self) -> Arc<ViewModeController> {
        Arc::clone(&self.view_mode)
    }

    /// Set the mode and, if it changed while mounted, run a pass.
    pub fn set_view_mode(&mut self, mode: ViewMode) -> Result<Option<SyncReport>, CoreError> {
        self.view_mode.set(mode);
        self.refresh()
    }

    pub fn toggle_view_mode(&mut self) -> Result<ViewMode, CoreError> {
        let mode = self.view_mode.toggle();
        self.refresh()?;
        Ok(mode)
    }

    pub fn legend(&self) -> Legend {
        legend(self.view_mode())
    }

    // ── Synchronization ──────────────────────────────────────────────

    /// Run a pass if the projects or the view mode changed since the last one.
    pub fn refresh(&mut self) -> Result<Option<SyncReport>, CoreError> {
        if self.mount.is_none() {
            return Ok(None);
        }
        let mode_changed = self.mode_rx.has_changed().unwrap_or(false);
        if !self.projects.has_changed() && !mode_changed {
            return Ok(None);
        }
        self.synchronize_now().map(Some)
    }

    /// Run a pass against the latest (projects, mode) pair.
    pub fn synchronize_now(&mut self) -> Result<SyncReport, CoreError> {
        let mount = self.mount.as_mut().ok_or(CoreError::NotMounted)?;
        let engine = self.engine.as_mut().ok_or(CoreError::EngineUnavailable)?;

        let projects = self.projects.mark_seen();
        let mode = *self.mode_rx.borrow_and_update();
        mount
            .synchronizer
            .synchronize(engine, &projects, mode, &self.selection)
    }

    /// Drive synchronization from store and view-mode changes until
    /// `cancel` fires, then tear down.
    pub async fn run(&mut self, cancel: CancellationToken) {
        loop {
            let trigger = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                Some(_) = self.projects.changed() => Some("projects"),
                Ok(()) = self.mode_rx.changed() => Some("view mode"),
            };
            let Some(trigger) = trigger else { break };

            if self.mount.is_none() {
                continue;
            }
            debug!(trigger, "change observed, synchronizing");
            if let Err(e) = self.synchronize_now() {
                warn!(error = %e, "synchronization pass failed");
            }
        }
        self.teardown();
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn state(&self) -> MapState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<MapState> {
        self.state.subscribe()
    }

    pub fn store(&self) -> &Arc<ProjectStore> {
        &self.store
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn search(&self) -> &SearchController<S> {
        &self.search
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub fn map_handle(&self) -> Option<MapHandle> {
        self.mount.as_ref().map(|m| m.map)
    }

    pub fn layer_group(&self) -> Option<LayerGroupHandle> {
        self.mount.as_ref().map(|m| m.synchronizer.group())
    }

    /// Entries from the latest synchronization pass.
    pub fn layer_entries(&self) -> &[MapLayerEntry] {
        match &self.mount {
            Some(mount) => mount.synchronizer.entries(),
            None => &[],
        }
    }
}

impl<E: MapEngine, S: SearchService> Drop for MapHost<E, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Create the map, base tiles, zoom control and root group. A partially
/// built map is disposed before the error is returned.
fn build_map<E: MapEngine>(
    engine: &mut E,
    container: &ContainerHandle,
    config: &MapConfig,
) -> Result<(MapHandle, LayerGroupHandle), EngineError> {
    let map = engine.create_map(container, &config.map_options())?;

    let attach = |engine: &mut E| -> Result<LayerGroupHandle, EngineError> {
        engine.add_tile_layer(map, &config.tile)?;
        engine.add_zoom_control(map, config.zoom_control)?;
        engine.create_layer_group(map)
    };

    match attach(engine) {
        Ok(group) => Ok((map, group)),
        Err(e) => {
            engine.dispose_map(map);
            Err(e)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::engine::{
        ActivationHandler, ControlPosition, HeadlessEngine, LayerHandle, MapOptions, MarkerIcon,
        PathStyle, Popup, TileLayer,
    };
    use crate::model::{LatLng, ProjectId, ProjectStatus};
    use crate::search::{SearchOutcome, SearchResult};
    use crate::seed;

    type NoSearch = Option<civicmap_api::SearchClient>;

    /// Collects formatted `tracing` output for assertions.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn host(engine: Option<HeadlessEngine>) -> MapHost<HeadlessEngine, NoSearch> {
        let store = Arc::new(ProjectStore::with_projects(seed::berlin_projects()));
        MapHost::new(engine, store, None, MapConfig::default())
    }

    fn container() -> ContainerHandle {
        ContainerHandle::new("map")
    }

    fn opacities(host: &MapHost<HeadlessEngine, NoSearch>) -> Vec<f64> {
        let engine = host.engine().unwrap();
        host.layer_entries()
            .iter()
            .filter_map(|e| e.polygon)
            .map(|h| engine.layer(h).unwrap().as_polygon().unwrap().style.fill_opacity)
            .collect()
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut host = host(Some(HeadlessEngine::new()));
        assert_eq!(host.initialize(&container()).unwrap(), MountOutcome::Mounted);
        assert_eq!(
            host.initialize(&container()).unwrap(),
            MountOutcome::AlreadyMounted
        );

        let engine = host.engine().unwrap();
        assert_eq!(engine.live_maps(), 1);
        let scene = engine.map(host.map_handle().unwrap()).unwrap();
        assert_eq!(scene.tile_layers.len(), 1);
        assert_eq!(scene.zoom_control, Some(ControlPosition::BottomRight));
        assert!(!scene.options.zoom_control);
        assert_eq!(host.state(), MapState::Ready);
    }

    #[test]
    fn first_pass_runs_on_mount() {
        let mut host = host(Some(HeadlessEngine::new()));
        host.initialize(&container()).unwrap();

        let group = host.layer_group().unwrap();
        let engine = host.engine().unwrap();
        assert_eq!(engine.polygon_count(group), 6);
        assert_eq!(engine.marker_count(group), 6);
    }

    #[test]
    fn missing_engine_degrades_to_placeholder() {
        let mut host = host(None);
        assert_eq!(
            host.initialize(&container()).unwrap(),
            MountOutcome::EngineUnavailable
        );
        assert_eq!(
            host.initialize(&container()).unwrap(),
            MountOutcome::EngineUnavailable
        );
        assert_eq!(host.state(), MapState::Unavailable);
        assert!(matches!(host.synchronize_now(), Err(CoreError::NotMounted)));
        assert!(host.layer_entries().is_empty());
    }

    #[test]
    fn engine_unavailable_is_reported_once() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut host = host(None);
            for _ in 0..3 {
                assert_eq!(
                    host.initialize(&container()).unwrap(),
                    MountOutcome::EngineUnavailable
                );
            }
        });

        assert_eq!(logs.text().matches("mapping engine unavailable").count(), 1);
    }

    #[test]
    fn teardown_twice_releases_once() {
        let mut host = host(Some(HeadlessEngine::new()));
        host.initialize(&container()).unwrap();

        assert!(host.teardown());
        assert!(!host.teardown());

        let engine = host.engine().unwrap();
        assert_eq!(engine.dispose_count(), 1);
        assert_eq!(engine.live_maps(), 0);
        assert_eq!(host.state(), MapState::TornDown);
    }

    #[test]
    fn remount_after_teardown_creates_fresh_map() {
        let mut host = host(Some(HeadlessEngine::new()));
        host.initialize(&container()).unwrap();
        let first = host.map_handle().unwrap();
        host.teardown();

        assert_eq!(host.initialize(&container()).unwrap(), MountOutcome::Mounted);
        assert_ne!(host.map_handle().unwrap(), first);
        assert_eq!(host.engine().unwrap().live_maps(), 1);
    }

    #[test]
    fn mode_round_trip_restores_opacity() {
        let mut host = host(Some(HeadlessEngine::new()));
        host.initialize(&container()).unwrap();
        let standard = opacities(&host);
        assert!(standard.iter().all(|o| (o - 0.4).abs() < f64::EPSILON));

        assert_eq!(host.toggle_view_mode().unwrap(), ViewMode::Structural);
        assert!(opacities(&host).iter().all(|o| (o - 0.1).abs() < f64::EPSILON));

        assert_eq!(host.toggle_view_mode().unwrap(), ViewMode::Standard);
        assert_eq!(opacities(&host), standard);
    }

    #[test]
    fn refresh_only_syncs_on_change() {
        let mut host = host(Some(HeadlessEngine::new()));
        host.initialize(&container()).unwrap();
        assert!(host.refresh().unwrap().is_none());
        assert!(host.set_view_mode(ViewMode::Standard).unwrap().is_none());

        host.store().upsert(Project::new(
            "7",
            "Tempelhof Annex",
            ProjectStatus::Planning,
            LatLng::new(52.47, 13.40),
        ));
        let report = host.refresh().unwrap().unwrap();
        assert_eq!(report.markers, 7);
        assert_eq!(report.skipped, vec![ProjectId::from("7")]);
    }

    #[test]
    fn polygon_click_forwards_project() {
        let mut host = host(Some(HeadlessEngine::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        host.on_select(move |p| sink.lock().unwrap().push(p.id.clone()));
        host.initialize(&container()).unwrap();

        let entry = host
            .layer_entries()
            .iter()
            .find(|e| e.project.id.as_str() == "4")
            .unwrap();
        host.engine().unwrap().click(entry.polygon.unwrap()).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![ProjectId::from("4")]);
    }

    // ── Search lifecycle ─────────────────────────────────────────────

    /// Answers immediately, except for "hang", which never resolves.
    struct Stalling;

    impl SearchService for Stalling {
        async fn search_locations(&self, query: &str) -> Result<Vec<SearchResult>, CoreError> {
            if query == "hang" {
                std::future::pending::<()>().await;
            }
            Ok(vec![SearchResult {
                title: query.into(),
                uri: "https://example.com".into(),
            }])
        }
    }

    #[tokio::test]
    async fn teardown_cancels_in_flight_search_and_clears_results() {
        let store = Arc::new(ProjectStore::with_projects(seed::berlin_projects()));
        let mut host = MapHost::new(
            Some(HeadlessEngine::new()),
            store,
            Stalling,
            MapConfig::default(),
        );
        host.initialize(&container()).unwrap();
        let search = host.search().clone();

        assert!(matches!(
            search.search("Kollwitzplatz").await,
            SearchOutcome::Completed { count: 1 }
        ));
        assert_eq!(search.results().len(), 1);

        let in_flight = tokio::spawn({
            let search = search.clone();
            async move { search.search("hang").await }
        });
        search
            .subscribe()
            .wait_for(|state| state.in_flight)
            .await
            .unwrap();

        assert!(host.teardown());

        assert!(matches!(in_flight.await.unwrap(), SearchOutcome::Cancelled));
        assert!(!search.is_loading());
        assert!(search.results().is_empty());
        assert_eq!(host.state(), MapState::TornDown);
    }

    // ── Drop & run loop ──────────────────────────────────────────────

    #[derive(Default, Clone)]
    struct Counters {
        disposed: Arc<AtomicUsize>,
        passes: Arc<AtomicUsize>,
    }

    struct CountingEngine {
        inner: HeadlessEngine,
        counters: Counters,
    }

    impl MapEngine for CountingEngine {
        fn create_map(
            &mut self,
            container: &ContainerHandle,
            options: &MapOptions,
        ) -> Result<MapHandle, EngineError> {
            self.inner.create_map(container, options)
        }

        fn add_tile_layer(
            &mut self,
            map: MapHandle,
            layer: &TileLayer,
        ) -> Result<LayerHandle, EngineError> {
            self.inner.add_tile_layer(map, layer)
        }

        fn add_zoom_control(
            &mut self,
            map: MapHandle,
            position: ControlPosition,
        ) -> Result<(), EngineError> {
            self.inner.add_zoom_control(map, position)
        }

        fn create_layer_group(&mut self, map: MapHandle) -> Result<LayerGroupHandle, EngineError> {
            self.inner.create_layer_group(map)
        }

        fn add_polygon(
            &mut self,
            group: LayerGroupHandle,
            vertices: &[LatLng],
            style: &PathStyle,
            on_click: ActivationHandler,
        ) -> Result<LayerHandle, EngineError> {
            self.inner.add_polygon(group, vertices, style, on_click)
        }

        fn add_marker(
            &mut self,
            group: LayerGroupHandle,
            point: LatLng,
            icon: &MarkerIcon,
            popup: Popup,
        ) -> Result<LayerHandle, EngineError> {
            self.inner.add_marker(group, point, icon, popup)
        }

        fn remove_all_layers(&mut self, group: LayerGroupHandle) -> Result<(), EngineError> {
            self.counters.passes.fetch_add(1, Ordering::SeqCst);
            self.inner.remove_all_layers(group)
        }

        fn dispose_map(&mut self, map: MapHandle) {
            self.counters.disposed.fetch_add(1, Ordering::SeqCst);
            self.inner.dispose_map(map);
        }
    }

    fn counting_host() -> (MapHost<CountingEngine, NoSearch>, Counters) {
        let counters = Counters::default();
        let engine = CountingEngine {
            inner: HeadlessEngine::new(),
            counters: counters.clone(),
        };
        let store = Arc::new(ProjectStore::with_projects(seed::berlin_projects()));
        let mut host = MapHost::new(Some(engine), store, None, MapConfig::default());
        host.initialize(&container()).unwrap();
        (host, counters)
    }

    #[test]
    fn drop_releases_mounted_map() {
        let (host, counters) = counting_host();
        drop(host);
        assert_eq!(counters.disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_after_teardown_does_not_release_again() {
        let (mut host, counters) = counting_host();
        host.teardown();
        drop(host);
        assert_eq!(counters.disposed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_syncs_on_changes_and_tears_down_on_cancel() {
        let (mut host, counters) = counting_host();
        let store = Arc::clone(host.store());
        let modes = host.view_mode_controller();
        let cancel = CancellationToken::new();
        assert_eq!(counters.passes.load(Ordering::SeqCst), 1);

        let driver = async {
            store.remove(&"6".into());
            wait_for_passes(&counters, 2).await;
            modes.toggle();
            wait_for_passes(&counters, 3).await;
            cancel.cancel();
        };
        tokio::join!(host.run(cancel.clone()), driver);

        // Teardown clears the group once more before disposal.
        assert_eq!(counters.passes.load(Ordering::SeqCst), 4);
        assert_eq!(counters.disposed.load(Ordering::SeqCst), 1);
        assert_eq!(host.state(), MapState::TornDown);
    }

    async fn wait_for_passes(counters: &Counters, expected: usize) {
        for _ in 0..100 {
            if counters.passes.load(Ordering::SeqCst) >= expected {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {expected} synchronization passes");
    }
}
