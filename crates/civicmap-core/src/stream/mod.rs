// ── Reactive project streams ──
//
// Subscription types for consuming project changes from the ProjectStore.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::ProjectSnapshot;

/// A subscription to the project collection.
///
/// Provides point-in-time snapshot access and change notification via
/// [`changed()`](Self::changed), [`take_changed()`](Self::take_changed) or
/// by converting into a `Stream`.
pub struct ProjectStream {
    current: ProjectSnapshot,
    receiver: watch::Receiver<ProjectSnapshot>,
}

impl ProjectStream {
    pub(crate) fn new(receiver: watch::Receiver<ProjectSnapshot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot seen most recently by this subscription.
    pub fn current(&self) -> &ProjectSnapshot {
        &self.current
    }

    /// The latest snapshot, without marking it as seen.
    pub fn latest(&self) -> ProjectSnapshot {
        self.receiver.borrow().clone()
    }

    /// Mark the latest snapshot as seen and return it.
    pub fn mark_seen(&mut self) -> ProjectSnapshot {
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        snap
    }

    /// Whether the store changed since the last seen snapshot.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Non-blocking: the new snapshot if the store changed since last seen.
    pub fn take_changed(&mut self) -> Option<ProjectSnapshot> {
        if self.has_changed() {
            Some(self.mark_seen())
        } else {
            None
        }
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<ProjectSnapshot> {
        self.receiver.changed().await.ok()?;
        Some(self.mark_seen())
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> ProjectWatchStream {
        ProjectWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current snapshot first, then one snapshot per change.
pub struct ProjectWatchStream {
    inner: WatchStream<ProjectSnapshot>,
}

impl Stream for ProjectWatchStream {
    type Item = ProjectSnapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures_util::StreamExt;

    use crate::model::{LatLng, Project, ProjectStatus};
    use crate::store::ProjectStore;

    fn project(id: &str) -> Project {
        Project::new(id, id, ProjectStatus::Review, LatLng::new(0.0, 0.0))
    }

    #[tokio::test]
    async fn changed_resolves_after_mutation() {
        let store = ProjectStore::new();
        let mut stream = store.subscribe();

        store.upsert(project("a"));
        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(stream.current().len(), 1);
    }

    #[tokio::test]
    async fn into_stream_yields_initial_then_updates() {
        let store = ProjectStore::with_projects([project("a")]);
        let mut stream = store.subscribe().into_stream();

        let first = stream.next().await.unwrap();
        assert_eq!(first.len(), 1);

        store.upsert(project("b"));
        let second = stream.next().await.unwrap();
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn latest_does_not_mark_seen() {
        let store = ProjectStore::new();
        let mut stream = store.subscribe();
        store.upsert(project("a"));

        assert_eq!(stream.latest().len(), 1);
        assert!(stream.current().is_empty());
        assert!(stream.take_changed().is_some());
    }
}
