// ── Map configuration ──
//
// Runtime settings handed to `MapHost`. Built by the config crate from the
// TOML profile; the defaults reproduce the Berlin overview map.

use crate::engine::{ContainerHandle, ControlPosition, MapOptions, TileLayer};
use crate::model::{LatLng, ViewMode};

/// Initial map center (Berlin).
pub const DEFAULT_CENTER: LatLng = LatLng::new(52.49, 13.36);
pub const DEFAULT_ZOOM: u8 = 12;
pub const DEFAULT_CONTAINER: &str = "civicmap";

#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub center: LatLng,
    pub zoom: u8,
    pub tile: TileLayer,
    pub zoom_control: ControlPosition,
    pub initial_view_mode: ViewMode,
    pub container: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            tile: TileLayer::default(),
            zoom_control: ControlPosition::default(),
            initial_view_mode: ViewMode::default(),
            container: DEFAULT_CONTAINER.into(),
        }
    }
}

impl MapConfig {
    /// Engine options: built-in zoom and attribution controls are off, the
    /// host adds its own positioned zoom control.
    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            center: self.center,
            zoom: self.zoom,
            zoom_control: false,
            attribution_control: false,
        }
    }

    pub fn container_handle(&self) -> ContainerHandle {
        ContainerHandle::new(self.container.clone())
    }
}
