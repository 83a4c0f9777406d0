// ── Domain model ──
//
// Canonical types consumed by the map subsystem. Projects are read-only
// here: the store owns them, the synchronizer only renders them.

pub mod geo;
pub mod project;
pub mod view_mode;

// ── Re-exports ──────────────────────────────────────────────────────

pub use geo::{Boundary, GeometryError, LatLng, Ring};
pub use project::{Project, ProjectId, ProjectStatus};
pub use view_mode::ViewMode;
