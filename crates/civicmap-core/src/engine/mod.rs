// ── Mapping engine capability ──
//
// The third-party mapping engine is consumed through this trait. The host
// receives an implementation at construction; nothing in the crate looks
// an engine up from ambient state. Interaction handlers are bound when the
// layer is created, never wired up afterwards.

mod headless;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::model::{LatLng, ProjectStatus};
use crate::style::{Color, LayerStyle};

pub use headless::{HeadlessEngine, MarkerLayer, PolygonLayer, SceneLayer, SceneMap};

// ── Handles ─────────────────────────────────────────────────────────

macro_rules! engine_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

engine_handle!(
    /// A live map instance.
    MapHandle
);
engine_handle!(
    /// A container for vector layers on one map.
    LayerGroupHandle
);
engine_handle!(
    /// A single rendered layer (tile, polygon or marker).
    LayerHandle
);

/// The host surface the map is mounted into (a DOM element id on the web).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle(String);

impl ContainerHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ── Map & tile options ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: u8,
    /// Built-in zoom buttons; disabled in favour of a positioned control.
    pub zoom_control: bool,
    pub attribution_control: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub subdomains: String,
    pub max_zoom: u8,
}

impl Default for TileLayer {
    /// CartoDB Voyager raster tiles.
    fn default() -> Self {
        Self {
            url_template: "https://{s}.basemaps.cartocdn.com/rastertiles/voyager/{z}/{x}/{y}{r}.png"
                .into(),
            attribution: "&copy; OpenStreetMap contributors &copy; CARTO".into(),
            subdomains: "abcd".into(),
            max_zoom: 20,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ControlPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

// ── Vector layer styling ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    pub color: Color,
    pub fill_color: Color,
    pub fill_opacity: f64,
    pub weight: u8,
}

impl From<LayerStyle> for PathStyle {
    fn from(style: LayerStyle) -> Self {
        Self {
            color: style.color,
            fill_color: style.color,
            fill_opacity: style.fill_opacity,
            weight: style.weight,
        }
    }
}

/// A round colored dot marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerIcon {
    pub class_name: &'static str,
    pub color: Color,
    pub size: (u16, u16),
    pub anchor: (u16, u16),
}

impl MarkerIcon {
    pub fn dot(color: Color) -> Self {
        Self {
            class_name: "custom-marker",
            color,
            size: (24, 24),
            anchor: (12, 12),
        }
    }
}

// ── Popups & handlers ───────────────────────────────────────────────

/// Callback fired by the engine on user activation.
pub type ActivationHandler = Arc<dyn Fn() + Send + Sync>;

pub const POPUP_ACTION_LABEL: &str = "Open Studio";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupContent {
    pub title: String,
    pub status: ProjectStatus,
    pub action_label: &'static str,
}

impl fmt::Display for PopupContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) [{}]", self.title, self.status, self.action_label)
    }
}

/// Popup bound to a marker. `on_action` fires when the action trigger is activated.
pub struct Popup {
    pub content: PopupContent,
    pub class_name: &'static str,
    pub close_button: bool,
    pub offset: (i16, i16),
    pub on_action: ActivationHandler,
}

impl Popup {
    pub fn new(content: PopupContent, on_action: ActivationHandler) -> Self {
        Self {
            content,
            class_name: "custom-popup",
            close_button: true,
            offset: (0, -10),
            on_action,
        }
    }
}

impl fmt::Debug for Popup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Popup")
            .field("content", &self.content)
            .field("class_name", &self.class_name)
            .field("close_button", &self.close_button)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("container '{0}' already hosts a map")]
    ContainerInUse(String),

    #[error("unknown map {0}")]
    UnknownMap(MapHandle),

    #[error("unknown layer group {0}")]
    UnknownGroup(LayerGroupHandle),

    #[error("unknown layer {0}")]
    UnknownLayer(LayerHandle),

    #[error("layer {layer} is not a {expected}")]
    WrongLayerKind {
        layer: LayerHandle,
        expected: &'static str,
    },

    #[error("engine backend error: {0}")]
    Backend(String),
}

// ── Capability trait ────────────────────────────────────────────────

/// Capability surface of a slippy-map engine.
///
/// Implementations own every object they hand out a handle for; callers
/// only ever hold the opaque handles.
pub trait MapEngine: Send {
    fn create_map(
        &mut self,
        container: &ContainerHandle,
        options: &MapOptions,
    ) -> Result<MapHandle, EngineError>;

    fn add_tile_layer(&mut self, map: MapHandle, layer: &TileLayer)
    -> Result<LayerHandle, EngineError>;

    fn add_zoom_control(
        &mut self,
        map: MapHandle,
        position: ControlPosition,
    ) -> Result<(), EngineError>;

    fn create_layer_group(&mut self, map: MapHandle) -> Result<LayerGroupHandle, EngineError>;

    /// Add a filled polygon. `on_click` fires on every click on the shape.
    fn add_polygon(
        &mut self,
        group: LayerGroupHandle,
        vertices: &[LatLng],
        style: &PathStyle,
        on_click: ActivationHandler,
    ) -> Result<LayerHandle, EngineError>;

    /// Add a marker with its popup already bound.
    fn add_marker(
        &mut self,
        group: LayerGroupHandle,
        point: LatLng,
        icon: &MarkerIcon,
        popup: Popup,
    ) -> Result<LayerHandle, EngineError>;

    fn remove_all_layers(&mut self, group: LayerGroupHandle) -> Result<(), EngineError>;

    /// Release the map and everything attached to it. Unknown handles are ignored.
    fn dispose_map(&mut self, map: MapHandle);
}
