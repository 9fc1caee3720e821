//! Interactive search controller. Responses are applied only while their
//! generation is still current, checked under the state channel's lock.

use crate::config::ControllerConfig;
use crate::error::{ErrorKind, ServiceError};
use crate::history::{HistoryStore, RecentSearches};
use crate::service::{SearchOptions, SearchService};
use crate::types::ArticleSummary;
use futures::FutureExt;
use serde::Serialize;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerState {
    pub query: String,
    pub category: Option<String>,
    pub results: Vec<ArticleSummary>,
    pub categories: Vec<String>,
    pub total: usize,
    pub has_more: bool,
    pub is_searching: bool,
    pub error: Option<ErrorKind>,
    pub recent_searches: Vec<String>,
    pub suggestions: Vec<String>,
}

struct Inner<S> {
    service: S,
    config: ControllerConfig,
    state: watch::Sender<ControllerState>,
    search_generation: AtomicU64,
    suggestion_generation: AtomicU64,
}

pub struct SearchController<S: SearchService, H: HistoryStore> {
    inner: Arc<Inner<S>>,
    history: Mutex<RecentSearches<H>>,
    pending_search: Mutex<Option<JoinHandle<()>>>,
    pending_suggestions: Mutex<Option<JoinHandle<()>>>,
}

impl<S: SearchService, H: HistoryStore> SearchController<S, H> {
    pub fn new(service: S, history_store: H, config: ControllerConfig) -> Self {
        let history = RecentSearches::load(history_store, config.max_recent);
        let (state, _) = watch::channel(ControllerState {
            recent_searches: history.entries().to_vec(),
            ..Default::default()
        });
        Self {
            inner: Arc::new(Inner {
                service,
                config,
                state,
                search_generation: AtomicU64::new(0),
                suggestion_generation: AtomicU64::new(0),
            }),
            history: Mutex::new(history),
            pending_search: Mutex::new(None),
            pending_suggestions: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified after every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.inner.state.subscribe()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Records the new query immediately and restarts the debounce timer.
    pub fn set_query(&self, text: &str) {
        let mut generation = 0;
        let mut category = None;
        self.inner.state.send_modify(|s| {
            s.query = text.to_string();
            generation = self.inner.search_generation.fetch_add(1, Ordering::SeqCst) + 1;
            category = s.category.clone();
        });
        self.schedule_search(generation, text.to_string(), category);
        self.schedule_suggestions(text);
    }

    /// Changes the category filter; `None` or an empty string clears it.
    pub fn set_category(&self, category: Option<&str>) {
        let category = category.filter(|c| !c.is_empty()).map(String::from);
        let mut generation = 0;
        let mut query = String::new();
        self.inner.state.send_modify(|s| {
            s.category = category.clone();
            generation = self.inner.search_generation.fetch_add(1, Ordering::SeqCst) + 1;
            query = s.query.clone();
        });
        self.schedule_search(generation, query, category);
    }

    /// Records `term` in the recent-search history.
    pub fn commit(&self, term: &str) {
        let entries = {
            let mut history = lock(&self.history);
            if !history.add(term) {
                return;
            }
            history.entries().to_vec()
        };
        self.inner.state.send_modify(|s| s.recent_searches = entries);
    }

    pub fn clear_history(&self) {
        lock(&self.history).clear();
        self.inner.state.send_modify(|s| s.recent_searches.clear());
    }

    /// Resets query, results and suggestions, superseding any pending work.
    pub fn clear(&self) {
        abort_pending(&self.pending_search);
        abort_pending(&self.pending_suggestions);
        self.inner.state.send_modify(|s| {
            self.inner.search_generation.fetch_add(1, Ordering::SeqCst);
            self.inner.suggestion_generation.fetch_add(1, Ordering::SeqCst);
            s.query.clear();
            s.results.clear();
            s.categories.clear();
            s.total = 0;
            s.has_more = false;
            s.is_searching = false;
            s.error = None;
            s.suggestions.clear();
        });
    }

    fn schedule_search(&self, generation: u64, query: String, category: Option<String>) {
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.config.debounce).await;
            inner.fire_search(generation, query, category);
        });
        replace_pending(&self.pending_search, handle);
    }

    fn schedule_suggestions(&self, text: &str) {
        let mut generation = 0;
        let is_blank = text.trim().is_empty();
        self.inner.state.send_if_modified(|s| {
            generation = self.inner.suggestion_generation.fetch_add(1, Ordering::SeqCst) + 1;
            if is_blank && !s.suggestions.is_empty() {
                s.suggestions.clear();
                return true;
            }
            false
        });
        if is_blank {
            abort_pending(&self.pending_suggestions);
            return;
        }

        let inner = self.inner.clone();
        let text = text.trim().to_string();
        let handle = tokio::spawn(async move {
            if !inner.config.suggestion_debounce.is_zero() {
                tokio::time::sleep(inner.config.suggestion_debounce).await;
            }
            inner.run_suggestions(generation, text).await;
        });
        replace_pending(&self.pending_suggestions, handle);
    }
}

impl<S: SearchService, H: HistoryStore> Drop for SearchController<S, H> {
    fn drop(&mut self) {
        abort_pending(&self.pending_search);
        abort_pending(&self.pending_suggestions);
    }
}

impl<S: SearchService> Inner<S> {
    fn is_current(&self, generation: u64) -> bool {
        self.search_generation.load(Ordering::SeqCst) == generation
    }

    /// Debounce elapsed: either go back to idle or start the request.
    fn fire_search(self: Arc<Self>, generation: u64, query: String, category: Option<String>) {
        let trimmed = query.trim();
        let long_enough = trimmed.chars().count() >= self.config.min_query_length;
        let issued = self.state.send_if_modified(|s| {
            if !self.is_current(generation) {
                return false;
            }
            if long_enough {
                s.is_searching = true;
            } else {
                s.results.clear();
                s.total = 0;
                s.has_more = false;
                s.is_searching = false;
                s.error = None;
            }
            true
        });
        if !issued || !long_enough {
            return;
        }

        let options = SearchOptions {
            category,
            page: None,
            limit: self.config.page_size,
        };
        let text = trimmed.to_string();
        tokio::spawn(async move { self.run_search(generation, text, options).await });
    }

    async fn run_search(&self, generation: u64, query: String, options: SearchOptions) {
        debug!("Issuing search #{} for {:?}", generation, query);
        let outcome = call_guarded(self.config.request_timeout, || self.service.search(&query, &options))
            .await
            .map_err(|e| {
                warn!("Search for {:?} failed: {}", query, e);
                e.kind()
            });

        let applied = self.state.send_if_modified(|s| {
            if !self.is_current(generation) {
                return false;
            }
            s.is_searching = false;
            match outcome {
                Ok(page) => {
                    s.results = page.articles;
                    s.categories = page.categories;
                    s.total = page.total;
                    s.has_more = page.has_more;
                    s.error = None;
                }
                // Last good results stay visible next to the error.
                Err(kind) => s.error = Some(kind),
            }
            true
        });
        if !applied {
            debug!("Discarding stale response for search #{}", generation);
        }
    }

    async fn run_suggestions(&self, generation: u64, text: String) {
        let suggestions = match call_guarded(self.config.request_timeout, || self.service.suggestions(&text)).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!("Suggestions for {:?} failed: {}", text, e);
                return;
            }
        };
        self.state.send_if_modified(|s| {
            if self.suggestion_generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            s.suggestions = suggestions;
            true
        });
    }
}

#[derive(Debug, thiserror::Error)]
enum CallError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("service panicked")]
    Panicked,
}

impl CallError {
    fn kind(&self) -> ErrorKind {
        match self {
            CallError::Service(e) => e.kind(),
            CallError::Timeout(_) => ErrorKind::Timeout,
            CallError::Panicked => ErrorKind::Unknown,
        }
    }
}

// A service may panic while building its future as well as while it is
// polled; both count as a failed call.
async fn call_guarded<T, F>(limit: Duration, call: impl FnOnce() -> F) -> Result<T, CallError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    let request = std::panic::catch_unwind(AssertUnwindSafe(call)).map_err(|_| CallError::Panicked)?;
    match AssertUnwindSafe(tokio::time::timeout(limit, request)).catch_unwind().await {
        Ok(Ok(result)) => Ok(result?),
        Ok(Err(_)) => Err(CallError::Timeout(limit)),
        Err(_) => Err(CallError::Panicked),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn replace_pending(slot: &Mutex<Option<JoinHandle<()>>>, handle: JoinHandle<()>) {
    if let Some(previous) = lock(slot).replace(handle) {
        previous.abort();
    }
}

fn abort_pending(slot: &Mutex<Option<JoinHandle<()>>>) {
    if let Some(previous) = lock(slot).take() {
        previous.abort();
    }
}
