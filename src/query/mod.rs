//! Keyed cache of note listings.
//!
//! Each [`QueryKey`] maps to a [`QueryEntry`] holding the last result for that
//! page and search term. Observing a key starts a background fetch unless a
//! fresh entry exists or a fetch for the same key is already running; in the
//! latter case the observer shares the running fetch. Settled fetches are
//! announced on the channel returned by [`QueryCache::subscribe`].
//!
//! Results are always written to their own key. Callers decide what to show by
//! reading the key they currently care about, so a slow response for an old
//! key never replaces a newer one on screen.

mod key;

pub use key::*;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::client::{ClientError, NotesApi};
use crate::clock::Clock;
use crate::config::Config;
use crate::models::NotesPage;

pub type FetchResult = Result<NotesPage, Arc<ClientError>>;

type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of one cached listing.
#[derive(Debug, Clone, Default)]
pub struct QueryEntry {
    pub status: QueryStatus,
    /// Last successful page for this key. Kept across failed refetches.
    pub data: Option<NotesPage>,
    pub error: Option<Arc<ClientError>>,
    pub updated_at: Option<Instant>,
    /// Last time a caller asked for this key.
    pub observed_at: Option<Instant>,
    /// Set by invalidation; the next observation refetches.
    pub is_stale: bool,
    pub is_fetching: bool,
    /// Number of fetches started for this key.
    pub fetch_count: u32,
}

impl QueryEntry {
    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub per_page: u32,
    /// Extra attempts after a retryable failure.
    pub retry: u32,
    pub stale_time: Duration,
    /// Entries not observed for this long are dropped once no fetch is running for them.
    pub gc_time: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for QueryOptions {
    fn from(config: &Config) -> Self {
        Self {
            per_page: config.per_page,
            retry: config.retry,
            stale_time: config.stale_time(),
            gc_time: config.gc_time(),
        }
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, QueryEntry>,
    in_flight: HashMap<QueryKey, SharedFetch>,
    /// In-flight keys invalidated before they settled.
    invalidated_in_flight: HashSet<QueryKey>,
    events: Option<mpsc::UnboundedSender<QueryKey>>,
}

struct CacheInner {
    api: Arc<dyn NotesApi>,
    clock: Arc<dyn Clock>,
    options: QueryOptions,
    state: Mutex<CacheState>,
}

/// Shared handle to the listing cache. Clones refer to the same cache.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl QueryCache {
    pub fn new(api: Arc<dyn NotesApi>, clock: Arc<dyn Clock>, options: QueryOptions) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                api,
                clock,
                options,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.inner.options
    }

    /// Receive the key of every fetch as it settles. Replaces any earlier subscriber.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<QueryKey> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.state.lock().events = Some(tx);
        rx
    }

    /// Current entry for `key` without triggering a fetch.
    pub fn get(&self, key: &QueryKey) -> QueryEntry {
        self.inner
            .state
            .lock()
            .entries
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Current entry for `key`, starting a background fetch if it is not fresh.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn observe(&self, key: &QueryKey) -> QueryEntry {
        let (entry, started) = {
            let mut state = self.inner.state.lock();
            self.inner.touch(&mut state, key);
            let started = if self.needs_fetch(&state, key) {
                Some(self.start_fetch(&mut state, key))
            } else {
                None
            };
            (
                state.entries.get(key).cloned().unwrap_or_default(),
                started,
            )
        };

        if let Some(fetch) = started {
            tokio::spawn(fetch);
        }
        entry
    }

    /// Resolve `key`, attaching to a running fetch or reusing a fresh entry.
    pub async fn fetch(&self, key: &QueryKey) -> FetchResult {
        let (fetch, started) = {
            let mut state = self.inner.state.lock();
            self.inner.touch(&mut state, key);
            let fresh = state
                .entries
                .get(key)
                .filter(|entry| self.inner.is_fresh(entry))
                .and_then(|entry| entry.data.clone());

            if let Some(running) = state.in_flight.get(key) {
                (running.clone(), false)
            } else if let Some(data) = fresh {
                return Ok(data);
            } else {
                (self.start_fetch(&mut state, key), true)
            }
        };

        if started {
            tokio::spawn(fetch.clone());
        }
        fetch.await
    }

    /// Mark every entry matching `prefix` stale. Returns how many entries were marked.
    ///
    /// Fetches still running for a matching key settle as stale, so their
    /// result is shown but refetched on the next observation.
    pub fn invalidate(&self, prefix: &KeyPrefix) -> usize {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;

        let mut marked = 0;
        for (key, entry) in state.entries.iter_mut() {
            if prefix.matches(key) {
                entry.is_stale = true;
                marked += 1;
            }
        }
        let running: Vec<QueryKey> = state
            .in_flight
            .keys()
            .filter(|k| prefix.matches(k))
            .cloned()
            .collect();
        state.invalidated_in_flight.extend(running);

        tracing::debug!(?prefix, marked, "Invalidated note listings");
        marked
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner.state.lock().in_flight.contains_key(key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.state.lock().in_flight.len()
    }

    /// Number of cached listings, including ones still loading.
    pub fn entry_count(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    fn needs_fetch(&self, state: &CacheState, key: &QueryKey) -> bool {
        if state.in_flight.contains_key(key) {
            return false;
        }
        !state
            .entries
            .get(key)
            .is_some_and(|entry| self.inner.is_fresh(entry))
    }

    fn start_fetch(&self, state: &mut CacheState, key: &QueryKey) -> SharedFetch {
        let entry = state.entries.entry(key.clone()).or_default();
        if entry.data.is_none() || entry.is_error() {
            entry.status = QueryStatus::Loading;
        }
        entry.is_fetching = true;
        entry.fetch_count += 1;
        tracing::debug!(%key, attempt = entry.fetch_count, "Fetching note listing");

        let inner = Arc::clone(&self.inner);
        let fetch_key = key.clone();
        let fetch = async move {
            let result = inner.fetch_with_retry(&fetch_key).await.map_err(Arc::new);
            inner.record(&fetch_key, &result);
            result
        }
        .boxed()
        .shared();

        state.in_flight.insert(key.clone(), fetch.clone());
        fetch
    }
}

impl CacheInner {
    /// Record an observation of `key` and drop entries unobserved for `gc_time`.
    fn touch(&self, state: &mut CacheState, key: &QueryKey) {
        let now = self.clock.now();
        state.entries.entry(key.clone()).or_default().observed_at = Some(now);

        let gc_time = self.options.gc_time;
        let in_flight = &state.in_flight;
        let before = state.entries.len();
        state.entries.retain(|k, entry| {
            k == key
                || in_flight.contains_key(k)
                || entry
                    .observed_at
                    .is_some_and(|at| now.saturating_duration_since(at) < gc_time)
        });
        let evicted = before - state.entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Dropped unused note listings");
        }
    }

    fn is_fresh(&self, entry: &QueryEntry) -> bool {
        entry.is_success()
            && !entry.is_stale
            && entry.updated_at.is_some_and(|at| {
                self.clock.now().saturating_duration_since(at) < self.options.stale_time
            })
    }

    async fn fetch_with_retry(&self, key: &QueryKey) -> Result<NotesPage, ClientError> {
        let mut attempt = 0;
        loop {
            match self
                .api
                .list_notes(key.page, self.options.per_page, key.search_param())
                .await
            {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() && attempt < self.options.retry => {
                    attempt += 1;
                    tracing::warn!(%key, attempt, "Fetch failed, retrying: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn record(&self, key: &QueryKey, result: &FetchResult) {
        let now = self.clock.now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        state.in_flight.remove(key);
        let invalidated = state.invalidated_in_flight.remove(key);

        let entry = state.entries.entry(key.clone()).or_default();
        entry.is_fetching = false;
        entry.is_stale = invalidated;
        match result {
            Ok(page) => {
                tracing::debug!(%key, notes = page.notes.len(), "Note listing loaded");
                entry.status = QueryStatus::Success;
                entry.data = Some(page.clone());
                entry.error = None;
                entry.updated_at = Some(now);
            }
            Err(e) => {
                tracing::warn!(%key, "Note listing failed: {}", e);
                entry.status = QueryStatus::Error;
                entry.error = Some(Arc::clone(e));
            }
        }

        if let Some(tx) = &state.events {
            // Receiver may be gone during shutdown.
            let _ = tx.send(key.clone());
        }
    }
}
