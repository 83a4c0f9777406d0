// ── Location search ──
//
// `SearchController` runs text searches against a `SearchService` and keeps
// the latest result list in a `watch` channel for the results panel. Each
// call takes a generation number; a response that arrives after a newer
// search started (or after `reset`) is discarded instead of overwriting the
// newer state.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::CoreError;

// ── Service capability ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub uri: String,
}

impl From<civicmap_api::PlaceResponse> for SearchResult {
    fn from(place: civicmap_api::PlaceResponse) -> Self {
        Self {
            title: place.title,
            uri: place.uri,
        }
    }
}

/// External location search: query in, ordered results out.
pub trait SearchService: Send + Sync {
    fn search_locations(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<SearchResult>, CoreError>> + Send;
}

impl SearchService for civicmap_api::SearchClient {
    async fn search_locations(&self, query: &str) -> Result<Vec<SearchResult>, CoreError> {
        let places = civicmap_api::SearchClient::search_locations(self, query).await?;
        Ok(places.into_iter().map(SearchResult::from).collect())
    }
}

/// `None` means search is not configured; every call fails.
impl<S: SearchService> SearchService for Option<S> {
    async fn search_locations(&self, query: &str) -> Result<Vec<SearchResult>, CoreError> {
        match self {
            Some(service) => service.search_locations(query).await,
            None => Err(CoreError::SearchUnavailable),
        }
    }
}

impl<S: SearchService> SearchService for Arc<S> {
    fn search_locations(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<SearchResult>, CoreError>> + Send {
        self.as_ref().search_locations(query)
    }
}

// ── State ───────────────────────────────────────────────────────────

/// What the results panel renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub results: Arc<Vec<SearchResult>>,
    pub in_flight: bool,
    /// Message of the most recent failure, cleared by the next success.
    pub last_error: Option<String>,
}

/// How a single `search` call ended.
#[derive(Debug)]
pub enum SearchOutcome {
    /// Blank query; nothing was sent.
    Skipped,
    Completed { count: usize },
    /// Results were left untouched.
    Failed(CoreError),
    /// A newer search started before this one returned.
    Superseded,
    /// `reset` was called while this search was in flight.
    Cancelled,
}

// ── SearchController ────────────────────────────────────────────────

struct SearchInner<S> {
    service: S,
    state: watch::Sender<SearchState>,
    generation: AtomicU64,
    cancel: ArcSwap<CancellationToken>,
}

/// Cheaply cloneable handle; clones share state and generation.
pub struct SearchController<S> {
    inner: Arc<SearchInner<S>>,
}

impl<S> Clone for SearchController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SearchService> SearchController<S> {
    pub fn new(service: S) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            inner: Arc::new(SearchInner {
                service,
                state,
                generation: AtomicU64::new(0),
                cancel: ArcSwap::from_pointee(CancellationToken::new()),
            }),
        }
    }

    /// Run one search. Blank queries return immediately without touching
    /// the service or the state.
    pub async fn search(&self, query: &str) -> SearchOutcome {
        let query = query.trim();
        if query.is_empty() {
            return SearchOutcome::Skipped;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = self.inner.cancel.load_full();
        self.inner.state.send_modify(|s| s.in_flight = true);
        debug!(query, generation, "search started");

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(query, generation, "search cancelled");
                return SearchOutcome::Cancelled;
            }
            result = self.inner.service.search_locations(query) => result,
        };

        if self.inner.generation.load(Ordering::SeqCst) != generation {
            debug!(query, generation, "stale search response discarded");
            return SearchOutcome::Superseded;
        }

        match result {
            Ok(results) => {
                let count = results.len();
                self.inner.state.send_modify(|s| {
                    s.results = Arc::new(results);
                    s.in_flight = false;
                    s.last_error = None;
                });
                debug!(query, count, "search completed");
                SearchOutcome::Completed { count }
            }
            Err(e) => {
                error!(query, error = %e, "location search failed");
                self.inner.state.send_modify(|s| {
                    s.in_flight = false;
                    s.last_error = Some(e.to_string());
                });
                SearchOutcome::Failed(e)
            }
        }
    }

    /// Cancel any in-flight search and clear results.
    pub fn reset(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        let previous = self
            .inner
            .cancel
            .swap(Arc::new(CancellationToken::new()));
        previous.cancel();
        self.inner.state.send_replace(SearchState::default());
    }

    pub fn state(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    pub fn results(&self) -> Arc<Vec<SearchResult>> {
        Arc::clone(&self.inner.state.borrow().results)
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().in_flight
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state.subscribe()
    }
}
