// ── Reactive project store ──
//
// Concurrent project storage with push-based change notification.

mod project_store;

pub use project_store::{ProjectSnapshot, ProjectStore};
