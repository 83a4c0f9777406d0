// civicmap-core: Map synchronization between a project store and a slippy-map engine.

pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod model;
pub mod search;
pub mod seed;
pub mod store;
pub mod stream;
pub mod style;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::MapConfig;
pub use engine::{ContainerHandle, EngineError, HeadlessEngine, MapEngine};
pub use error::CoreError;
pub use host::{MapHost, MapState, MountOutcome};
pub use search::{SearchController, SearchOutcome, SearchResult, SearchService, SearchState};
pub use store::{ProjectSnapshot, ProjectStore};
pub use stream::ProjectStream;
pub use style::{Color, LayerStyle, Legend, ViewModeController};
pub use sync::{LayerSynchronizer, MapLayerEntry, SelectionSlot, SyncReport};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Boundary, GeometryError, LatLng, Project, ProjectId, ProjectStatus, Ring, ViewMode,
};
