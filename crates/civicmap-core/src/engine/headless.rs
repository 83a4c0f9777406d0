// ── Headless engine ──
//
// In-memory scene graph implementing `MapEngine`. Used by the CLI to render
// maps as text and by tests to drive interaction events (polygon clicks,
// popup actions) without a browser.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, trace};

use super::{
    ActivationHandler, ContainerHandle, ControlPosition, EngineError, LayerGroupHandle,
    LayerHandle, MapEngine, MapHandle, MapOptions, MarkerIcon, PathStyle, Popup, TileLayer,
};
use crate::model::LatLng;

/// One live map in the scene graph.
#[derive(Debug)]
pub struct SceneMap {
    pub container: ContainerHandle,
    pub options: MapOptions,
    pub tile_layers: Vec<(LayerHandle, TileLayer)>,
    pub zoom_control: Option<ControlPosition>,
    pub groups: Vec<LayerGroupHandle>,
}

pub struct PolygonLayer {
    pub group: LayerGroupHandle,
    pub vertices: Vec<LatLng>,
    pub style: PathStyle,
    on_click: ActivationHandler,
}

pub struct MarkerLayer {
    pub group: LayerGroupHandle,
    pub point: LatLng,
    pub icon: MarkerIcon,
    pub popup: Popup,
}

/// A vector layer held by a layer group.
pub enum SceneLayer {
    Polygon(PolygonLayer),
    Marker(MarkerLayer),
}

impl SceneLayer {
    pub fn group(&self) -> LayerGroupHandle {
        match self {
            Self::Polygon(p) => p.group,
            Self::Marker(m) => m.group,
        }
    }

    pub fn as_polygon(&self) -> Option<&PolygonLayer> {
        match self {
            Self::Polygon(p) => Some(p),
            Self::Marker(_) => None,
        }
    }

    pub fn as_marker(&self) -> Option<&MarkerLayer> {
        match self {
            Self::Marker(m) => Some(m),
            Self::Polygon(_) => None,
        }
    }
}

#[derive(Debug)]
struct SceneGroup {
    map: MapHandle,
    layers: Vec<LayerHandle>,
}

/// Scene-graph backed [`MapEngine`].
#[derive(Default)]
pub struct HeadlessEngine {
    next_id: u64,
    maps: BTreeMap<MapHandle, SceneMap>,
    groups: BTreeMap<LayerGroupHandle, SceneGroup>,
    layers: BTreeMap<LayerHandle, SceneLayer>,
    disposed: usize,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Inspection ───────────────────────────────────────────────────

    pub fn map(&self, map: MapHandle) -> Option<&SceneMap> {
        self.maps.get(&map)
    }

    /// Number of maps created and not yet disposed.
    pub fn live_maps(&self) -> usize {
        self.maps.len()
    }

    /// Number of successful `dispose_map` calls.
    pub fn dispose_count(&self) -> usize {
        self.disposed
    }

    pub fn layer(&self, layer: LayerHandle) -> Option<&SceneLayer> {
        self.layers.get(&layer)
    }

    /// Layers of `group` in insertion (draw) order.
    pub fn group_layers(&self, group: LayerGroupHandle) -> Vec<(LayerHandle, &SceneLayer)> {
        self.groups
            .get(&group)
            .map(|g| {
                g.layers
                    .iter()
                    .filter_map(|h| self.layers.get(h).map(|l| (*h, l)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn polygon_count(&self, group: LayerGroupHandle) -> usize {
        self.group_layers(group)
            .iter()
            .filter(|(_, l)| l.as_polygon().is_some())
            .count()
    }

    pub fn marker_count(&self, group: LayerGroupHandle) -> usize {
        self.group_layers(group)
            .iter()
            .filter(|(_, l)| l.as_marker().is_some())
            .count()
    }

    // ── Interaction ──────────────────────────────────────────────────

    /// Simulate a click on a polygon layer.
    pub fn click(&self, layer: LayerHandle) -> Result<(), EngineError> {
        let handler = match self.layers.get(&layer) {
            Some(SceneLayer::Polygon(p)) => Arc::clone(&p.on_click),
            Some(SceneLayer::Marker(_)) => {
                return Err(EngineError::WrongLayerKind {
                    layer,
                    expected: "polygon",
                });
            }
            None => return Err(EngineError::UnknownLayer(layer)),
        };
        trace!(%layer, "polygon click");
        handler();
        Ok(())
    }

    /// Simulate activating the action trigger inside a marker's popup.
    pub fn activate_popup(&self, layer: LayerHandle) -> Result<(), EngineError> {
        let handler = match self.layers.get(&layer) {
            Some(SceneLayer::Marker(m)) => Arc::clone(&m.popup.on_action),
            Some(SceneLayer::Polygon(_)) => {
                return Err(EngineError::WrongLayerKind {
                    layer,
                    expected: "marker",
                });
            }
            None => return Err(EngineError::UnknownLayer(layer)),
        };
        trace!(%layer, "popup action");
        handler();
        Ok(())
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn push_layer(
        &mut self,
        group: LayerGroupHandle,
        layer: SceneLayer,
    ) -> Result<LayerHandle, EngineError> {
        if !self.groups.contains_key(&group) {
            return Err(EngineError::UnknownGroup(group));
        }
        let handle = LayerHandle::from_raw(self.next());
        self.layers.insert(handle, layer);
        if let Some(g) = self.groups.get_mut(&group) {
            g.layers.push(handle);
        }
        Ok(handle)
    }
}

impl MapEngine for HeadlessEngine {
    fn create_map(
        &mut self,
        container: &ContainerHandle,
        options: &MapOptions,
    ) -> Result<MapHandle, EngineError> {
        if self.maps.values().any(|m| &m.container == container) {
            return Err(EngineError::ContainerInUse(container.as_str().to_owned()));
        }
        let handle = MapHandle::from_raw(self.next());
        self.maps.insert(
            handle,
            SceneMap {
                container: container.clone(),
                options: options.clone(),
                tile_layers: Vec::new(),
                zoom_control: None,
                groups: Vec::new(),
            },
        );
        debug!(%handle, container = container.as_str(), "map created");
        Ok(handle)
    }

    fn add_tile_layer(
        &mut self,
        map: MapHandle,
        layer: &TileLayer,
    ) -> Result<LayerHandle, EngineError> {
        if !self.maps.contains_key(&map) {
            return Err(EngineError::UnknownMap(map));
        }
        let handle = LayerHandle::from_raw(self.next());
        if let Some(m) = self.maps.get_mut(&map) {
            m.tile_layers.push((handle, layer.clone()));
        }
        Ok(handle)
    }

    fn add_zoom_control(
        &mut self,
        map: MapHandle,
        position: ControlPosition,
    ) -> Result<(), EngineError> {
        let m = self.maps.get_mut(&map).ok_or(EngineError::UnknownMap(map))?;
        m.zoom_control = Some(position);
        Ok(())
    }

    fn create_layer_group(&mut self, map: MapHandle) -> Result<LayerGroupHandle, EngineError> {
        if !self.maps.contains_key(&map) {
            return Err(EngineError::UnknownMap(map));
        }
        let handle = LayerGroupHandle::from_raw(self.next());
        self.groups.insert(
            handle,
            SceneGroup {
                map,
                layers: Vec::new(),
            },
        );
        if let Some(m) = self.maps.get_mut(&map) {
            m.groups.push(handle);
        }
        Ok(handle)
    }

    fn add_polygon(
        &mut self,
        group: LayerGroupHandle,
        vertices: &[LatLng],
        style: &PathStyle,
        on_click: ActivationHandler,
    ) -> Result<LayerHandle, EngineError> {
        self.push_layer(
            group,
            SceneLayer::Polygon(PolygonLayer {
                group,
                vertices: vertices.to_vec(),
                style: *style,
                on_click,
            }),
        )
    }

    fn add_marker(
        &mut self,
        group: LayerGroupHandle,
        point: LatLng,
        icon: &MarkerIcon,
        popup: Popup,
    ) -> Result<LayerHandle, EngineError> {
        self.push_layer(
            group,
            SceneLayer::Marker(MarkerLayer {
                group,
                point,
                icon: icon.clone(),
                popup,
            }),
        )
    }

    fn remove_all_layers(&mut self, group: LayerGroupHandle) -> Result<(), EngineError> {
        let g = self
            .groups
            .get_mut(&group)
            .ok_or(EngineError::UnknownGroup(group))?;
        for handle in g.layers.drain(..) {
            self.layers.remove(&handle);
        }
        Ok(())
    }

    fn dispose_map(&mut self, map: MapHandle) {
        let Some(scene) = self.maps.remove(&map) else {
            debug!(%map, "dispose of unknown map ignored");
            return;
        };
        for group in scene.groups {
            if let Some(g) = self.groups.remove(&group) {
                debug_assert_eq!(g.map, map);
                for handle in g.layers {
                    self.layers.remove(&handle);
                }
            }
        }
        self.disposed += 1;
        debug!(%map, "map disposed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::engine::{PopupContent, POPUP_ACTION_LABEL};
    use crate::model::ProjectStatus;
    use crate::style::palette;

    fn options() -> MapOptions {
        MapOptions {
            center: LatLng::new(52.49, 13.36),
            zoom: 12,
            zoom_control: false,
            attribution_control: false,
        }
    }

    fn style() -> PathStyle {
        PathStyle {
            color: palette::ACTIVE,
            fill_color: palette::ACTIVE,
            fill_opacity: 0.4,
            weight: 2,
        }
    }

    fn noop() -> ActivationHandler {
        Arc::new(|| {})
    }

    fn mounted() -> (HeadlessEngine, MapHandle, LayerGroupHandle) {
        let mut engine = HeadlessEngine::new();
        let map = engine
            .create_map(&ContainerHandle::new("map"), &options())
            .unwrap();
        let group = engine.create_layer_group(map).unwrap();
        (engine, map, group)
    }

    #[test]
    fn second_map_on_same_container_is_rejected() {
        let (mut engine, _, _) = mounted();
        let err = engine
            .create_map(&ContainerHandle::new("map"), &options())
            .unwrap_err();
        assert!(matches!(err, EngineError::ContainerInUse(_)));
        assert_eq!(engine.live_maps(), 1);
    }

    #[test]
    fn remove_all_layers_empties_group() {
        let (mut engine, _, group) = mounted();
        let square = [
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 1.0),
            LatLng::new(1.0, 1.0),
        ];
        engine.add_polygon(group, &square, &style(), noop()).unwrap();
        engine.add_polygon(group, &square, &style(), noop()).unwrap();
        assert_eq!(engine.polygon_count(group), 2);

        engine.remove_all_layers(group).unwrap();
        assert!(engine.group_layers(group).is_empty());
    }

    #[test]
    fn click_runs_bound_handler() {
        let (mut engine, _, group) = mounted();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let layer = engine
            .add_polygon(
                group,
                &[LatLng::new(0.0, 0.0)],
                &style(),
                Arc::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        engine.click(layer).unwrap();
        engine.click(layer).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn popup_action_on_polygon_is_an_error() {
        let (mut engine, _, group) = mounted();
        let layer = engine
            .add_polygon(group, &[LatLng::new(0.0, 0.0)], &style(), noop())
            .unwrap();
        assert!(matches!(
            engine.activate_popup(layer),
            Err(EngineError::WrongLayerKind { expected: "marker", .. })
        ));
    }

    #[test]
    fn dispose_releases_everything_once() {
        let (mut engine, map, group) = mounted();
        let popup = Popup::new(
            PopupContent {
                title: "t".into(),
                status: ProjectStatus::Active,
                action_label: POPUP_ACTION_LABEL,
            },
            noop(),
        );
        let marker = engine
            .add_marker(group, LatLng::new(0.0, 0.0), &MarkerIcon::dot(palette::ACTIVE), popup)
            .unwrap();

        engine.dispose_map(map);
        engine.dispose_map(map);

        assert_eq!(engine.dispose_count(), 1);
        assert_eq!(engine.live_maps(), 0);
        assert!(engine.layer(marker).is_none());
        assert!(matches!(
            engine.remove_all_layers(group),
            Err(EngineError::UnknownGroup(_))
        ));
    }
}
