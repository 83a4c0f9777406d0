// ── Project store ──
//
// Owns the current project collection. O(1) lookups through `DashMap`,
// ordered snapshots broadcast through a `watch` channel. Snapshot order is
// insertion order, which is also the z-order the synchronizer draws in.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{Project, ProjectId};
use crate::stream::ProjectStream;

/// Ordered, immutable view of the store at one version.
pub type ProjectSnapshot = Arc<Vec<Arc<Project>>>;

/// Reactive store for the projects shown on the map.
///
/// Every mutation runs under the snapshot channel's write lock, bumps the
/// version counter and wakes all subscribers. Reads are lock-free clones of
/// the current snapshot.
pub struct ProjectStore {
    by_id: DashMap<ProjectId, Arc<Project>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full ordered snapshot, rebuilt on mutation.
    snapshot: watch::Sender<ProjectSnapshot>,
}

impl ProjectStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            version,
            snapshot,
        }
    }

    pub fn with_projects(projects: impl IntoIterator<Item = Project>) -> Self {
        let store = Self::new();
        store.replace_all(projects);
        store
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Replace the whole collection. Duplicate ids keep the first position
    /// and the last value.
    pub fn replace_all(&self, projects: impl IntoIterator<Item = Project>) {
        self.snapshot.send_modify(|snap| {
            let mut ordered: Vec<Arc<Project>> = Vec::new();
            self.by_id.clear();
            for project in projects {
                let project = Arc::new(project);
                if let Some(slot) = ordered.iter_mut().find(|p| p.id == project.id) {
                    *slot = Arc::clone(&project);
                } else {
                    ordered.push(Arc::clone(&project));
                }
                self.by_id.insert(project.id.clone(), project);
            }
            *snap = Arc::new(ordered);
        });
        self.bump_version();
    }

    /// Insert or update a project. Updates keep their z-order position.
    /// Returns `true` if the id was new.
    pub fn upsert(&self, project: Project) -> bool {
        let project = Arc::new(project);
        let mut is_new = false;

        self.snapshot.send_modify(|snap| {
            let mut ordered = snap.as_ref().clone();
            if let Some(slot) = ordered.iter_mut().find(|p| p.id == project.id) {
                *slot = Arc::clone(&project);
            } else {
                ordered.push(Arc::clone(&project));
                is_new = true;
            }
            self.by_id.insert(project.id.clone(), Arc::clone(&project));
            *snap = Arc::new(ordered);
        });
        self.bump_version();

        is_new
    }

    /// Remove a project by id. Subscribers are only notified if it existed.
    pub fn remove(&self, id: &ProjectId) -> Option<Arc<Project>> {
        let mut removed = None;

        self.snapshot.send_if_modified(|snap| {
            removed = self.by_id.remove(id).map(|(_, v)| v);
            if removed.is_none() {
                return false;
            }
            let ordered: Vec<Arc<Project>> =
                snap.iter().filter(|p| &p.id != id).cloned().collect();
            *snap = Arc::new(ordered);
            true
        });

        if removed.is_some() {
            self.bump_version();
        }
        removed
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn get(&self, id: &ProjectId) -> Option<Arc<Project>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Current ordered snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> ProjectSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self) -> ProjectStream {
        ProjectStream::new(self.snapshot.subscribe())
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}
