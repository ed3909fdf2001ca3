//! Debounced, cursor-paginated search over a [`PageSource`].

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use rxstorage_core::{Direction, Error, Identifiable, Page, PageRequest, PageSource};

use crate::config::SearchConfig;
use crate::state::ListState;

type StateOf<S> = ListState<<S as PageSource>::Item, <S as PageSource>::Filter>;
type IdOf<S> = <<S as PageSource>::Item as Identifiable>::Id;

/// What a load call did.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// The response was applied; `added` is the number of new items.
    Applied { added: usize },
    /// Preconditions were not met, so nothing was fetched.
    Skipped,
    /// A newer load or a cancel superseded this one; its response was dropped.
    Stale,
    /// The source reported cancellation; state was left as it was.
    Cancelled,
    /// The fetch failed; the error is also recorded in [`ListState::error`].
    Failed(Arc<Error>),
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied { .. })
    }
}

#[derive(Debug, Clone, Copy)]
enum LoadKind {
    Initial,
    More,
}

/// A searchable, paginated list.
///
/// Cheap to clone; clones drive the same state. All state changes are
/// published through a [`watch`] channel, see [`SearchController::subscribe`].
///
/// [`SearchController::set_query`] spawns its debounce timer, so it must be
/// called from within a Tokio runtime.
pub struct SearchController<S: PageSource> {
    inner: Arc<Inner<S>>,
}

struct Inner<S: PageSource> {
    source: S,
    config: SearchConfig,
    state: watch::Sender<StateOf<S>>,
    debounce: Mutex<Option<JoinHandle<()>>>,
}

impl<S: PageSource> Clone for SearchController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PageSource> SearchController<S> {
    pub fn new(source: S, config: SearchConfig) -> Self {
        Self::with_filter(source, config, S::Filter::default())
    }

    /// Start from `filter` instead of the default one. Nothing is fetched
    /// until the first load.
    pub fn with_filter(source: S, config: SearchConfig, filter: S::Filter) -> Self {
        let (state, _) = watch::channel(ListState {
            filter,
            ..ListState::default()
        });
        Self {
            inner: Arc::new(Inner {
                source,
                config,
                state,
                debounce: Mutex::new(None),
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> StateOf<S> {
        self.inner.state.borrow().clone()
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<StateOf<S>> {
        self.inner.state.subscribe()
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Record new query text and restart the debounce timer.
    ///
    /// When the timer fires, the query is dispatched unless it equals the
    /// query the current results were loaded for.
    pub fn set_query(&self, text: impl Into<String>) {
        let text = text.into();
        self.inner.state.send_if_modified(|s| {
            if s.query == text {
                false
            } else {
                s.query = text;
                true
            }
        });

        let controller = self.clone();
        let delay = self.inner.config.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            controller.dispatch_query().await;
        });

        if let Some(previous) = self.lock_debounce().replace(handle) {
            previous.abort();
        }
    }

    /// Record new query text and load it now, skipping the debounce.
    pub async fn submit_query(&self, text: impl Into<String>) -> LoadOutcome {
        if let Some(pending) = self.lock_debounce().take() {
            pending.abort();
        }
        let text = text.into();
        self.inner.state.send_if_modified(|s| {
            if s.query == text {
                false
            } else {
                s.query = text;
                true
            }
        });
        self.load_initial().await
    }

    /// Change the filter set. A changed filter reloads from the first page.
    pub async fn set_filter(&self, filter: S::Filter) -> LoadOutcome {
        let changed = self.inner.state.send_if_modified(|s| {
            if s.filter == filter {
                false
            } else {
                s.filter = filter;
                true
            }
        });

        if changed {
            self.load_initial().await
        } else {
            LoadOutcome::Skipped
        }
    }

    /// Fetch the first page for the current query and filter, replacing
    /// the result set.
    ///
    /// Overlapping calls are cancel-and-replace: only the most recent call's
    /// response is applied.
    #[instrument(skip(self))]
    pub async fn load_initial(&self) -> LoadOutcome {
        let limit = self.inner.config.page_limit;
        let mut begun = None;
        self.inner.state.send_modify(|s| {
            s.generation += 1;
            s.next_cursor = None;
            s.has_next_page = false;
            s.is_loading = true;
            s.is_loading_more = false;
            s.error = None;

            let request = PageRequest::first(s.filter.clone())
                .with_search(&s.query)
                .with_limit(limit);
            begun = Some((s.generation, s.query.clone(), request));
        });

        let Some((generation, query, request)) = begun else {
            return LoadOutcome::Skipped;
        };

        debug!(generation, search = ?request.search, "Loading first page");
        self.fetch(LoadKind::Initial, generation, Some(query), request)
            .await
    }

    /// Fetch the next page and append unseen items.
    ///
    /// Does nothing unless no load is in flight, a next page exists and a
    /// cursor is known.
    #[instrument(skip(self))]
    pub async fn load_more(&self) -> LoadOutcome {
        let limit = self.inner.config.page_limit;
        let mut begun = None;
        self.inner.state.send_if_modified(|s| {
            if s.is_busy() || !s.has_next_page {
                return false;
            }
            let Some(cursor) = s.next_cursor.clone() else {
                return false;
            };

            s.is_loading_more = true;
            s.error = None;

            let request = PageRequest::first(s.filter.clone())
                .with_search(s.active_query.as_deref().unwrap_or_default())
                .with_limit(limit)
                .after(cursor, Direction::Next);
            begun = Some((s.generation, request));
            true
        });

        let Some((generation, request)) = begun else {
            debug!("Nothing more to load");
            return LoadOutcome::Skipped;
        };

        debug!(generation, "Loading next page");
        self.fetch(LoadKind::More, generation, None, request).await
    }

    /// Whether displaying the item with `id` should trigger [`load_more`].
    ///
    /// True when the item is among the last `prefetch_threshold` items, a
    /// next page exists and nothing is loading.
    ///
    /// [`load_more`]: SearchController::load_more
    pub fn should_load_more(&self, id: &IdOf<S>) -> bool {
        let s = self.inner.state.borrow();
        if s.is_busy() || !s.has_next_page || s.next_cursor.is_none() {
            return false;
        }

        match s.items.iter().position(|item| item.id() == *id) {
            Some(index) => index + self.inner.config.prefetch_threshold >= s.items.len(),
            None => false,
        }
    }

    /// Abandon pending work: stop the debounce timer and discard the
    /// responses of any in-flight loads. Results already shown are kept.
    pub fn cancel(&self) {
        if let Some(pending) = self.lock_debounce().take() {
            pending.abort();
        }
        self.inner.state.send_modify(|s| {
            s.generation += 1;
            s.is_loading = false;
            s.is_loading_more = false;
        });
        debug!("List loads cancelled");
    }

    async fn dispatch_query(&self) -> LoadOutcome {
        let duplicate = {
            let s = self.inner.state.borrow();
            s.active_query.as_deref() == Some(s.query.as_str())
        };

        if duplicate {
            debug!("Query unchanged since last load, not dispatching");
            return LoadOutcome::Skipped;
        }

        self.load_initial().await
    }

    /// `query` is the text an initial load was issued for; it becomes the
    /// active query only once that load's results are shown.
    async fn fetch(
        &self,
        kind: LoadKind,
        generation: u64,
        query: Option<String>,
        request: PageRequest<S::Filter>,
    ) -> LoadOutcome {
        let mut guard = LoadingGuard {
            state: &self.inner.state,
            kind,
            generation,
            armed: true,
        };

        let result = self.inner.source.fetch_page(&request).await;
        guard.armed = false;

        self.apply(kind, generation, query, result)
    }

    fn apply(
        &self,
        kind: LoadKind,
        generation: u64,
        query: Option<String>,
        result: Result<Page<S::Item>, Error>,
    ) -> LoadOutcome {
        let mut outcome = LoadOutcome::Stale;

        self.inner.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }

            match kind {
                LoadKind::Initial => s.is_loading = false,
                LoadKind::More => s.is_loading_more = false,
            }

            outcome = match result {
                Ok(page) => {
                    let added = match kind {
                        LoadKind::Initial => s.replace_items(page.data),
                        LoadKind::More => s.append_unique(page.data),
                    };
                    s.next_cursor = page.pagination.next_cursor;
                    s.has_next_page = page.pagination.has_next_page;
                    if query.is_some() {
                        s.active_query = query;
                    }
                    LoadOutcome::Applied { added }
                }
                Err(err) if err.is_cancelled() => LoadOutcome::Cancelled,
                Err(err) => {
                    warn!(error = %err, "List load failed");
                    let err = Arc::new(err);
                    s.error = Some(Arc::clone(&err));
                    LoadOutcome::Failed(err)
                }
            };
            true
        });

        if matches!(outcome, LoadOutcome::Stale) {
            debug!(generation, "Discarding superseded response");
        }
        outcome
    }

    fn lock_debounce(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .debounce
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: PageSource> fmt::Debug for SearchController<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.inner.state.borrow();
        f.debug_struct("SearchController")
            .field("items", &s.items.len())
            .field("query", &s.query)
            .field("has_next_page", &s.has_next_page)
            .field("is_loading", &s.is_loading)
            .field("is_loading_more", &s.is_loading_more)
            .finish()
    }
}

/// Clears the loading flag if a load future is dropped before it finishes.
struct LoadingGuard<'a, T, F> {
    state: &'a watch::Sender<ListState<T, F>>,
    kind: LoadKind,
    generation: u64,
    armed: bool,
}

impl<T, F> Drop for LoadingGuard<'_, T, F> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let (kind, generation) = (self.kind, self.generation);
        self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            match kind {
                LoadKind::Initial => s.is_loading = false,
                LoadKind::More => s.is_loading_more = false,
            }
            true
        });
    }
}
