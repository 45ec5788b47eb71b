//! Keyed query cache and request orchestration
//!
//! Each `QueryKey` maps to one entry holding the last known state
//! (`Idle -> Loading -> Ready | Error`, back to `Loading` on refetch), the
//! in-flight request if any, and when the data was last fetched.
//!
//! Rules:
//! - At most one live request per key. Concurrent consumers of a key join
//!   the request already in flight.
//! - A forced refetch or an invalidation while a request is in flight aborts
//!   that request and issues a new one; results are only applied when their
//!   request id still matches the entry, so a superseded response can never
//!   overwrite a newer one.
//! - A failed request keeps the previous data next to the error.
//! - Queries bound to an empty ticker/query never run and get no entry.
//! - Entries nobody watches are evicted once idle past their window.
//! - Predictions stay fresh for a configurable window; other reads are
//!   stale as soon as they land and refetch on the next subscription.
//!
//! Subscribers hold a `watch` receiver, so they always start from the
//! current state and observe every later transition.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::constants::{CACHE_GC_MIN_ENTRIES, CACHE_IDLE_EVICT_SECS};
use crate::error::{AppError, Result};
use crate::models::ClientConfig;
use crate::services::api_client::ResourceClient;
use crate::services::api_logging::{write_request_log, DataSource, RequestMetrics};
use crate::services::query_key::{Operation, QueryData, QueryFilter, QueryKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never requested, or disabled
    Idle,
    Loading,
    Ready,
    Error,
}

/// What a consumer sees for one query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub status: QueryStatus,
    /// Last successful payload; kept through later failures
    pub data: Option<QueryData>,
    /// Error of the most recent request, cleared by the next success
    pub error: Option<AppError>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            updated_at: None,
        }
    }
}

impl QueryState {
    pub fn is_idle(&self) -> bool {
        self.status == QueryStatus::Idle
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn is_ready(&self) -> bool {
        self.status == QueryStatus::Ready
    }

    /// Terminal for the current request
    pub fn is_settled(&self) -> bool {
        matches!(self.status, QueryStatus::Ready | QueryStatus::Error)
    }

    /// Data on success, error on failure
    pub fn into_result(self) -> Result<QueryData> {
        match self.status {
            QueryStatus::Ready => self
                .data
                .ok_or_else(|| AppError::Parse("ready query without data".to_string())),
            QueryStatus::Error => Err(self
                .error
                .unwrap_or_else(|| AppError::Network("query failed".to_string()))),
            QueryStatus::Idle | QueryStatus::Loading => {
                Err(AppError::NotSettled(format!("{:?}", self.status)))
            }
        }
    }
}

struct Inflight {
    id: u64,
    start_time: DateTime<Utc>,
    handle: JoinHandle<()>,
}

struct CacheEntry {
    tx: watch::Sender<QueryState>,
    inflight: Option<Inflight>,
    /// Time of the last successful fetch
    fetched_at: Option<Instant>,
    /// Last subscription or completed request
    touched_at: Instant,
    invalidated: bool,
}

impl CacheEntry {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(QueryState::default());
        Self {
            tx,
            inflight: None,
            fetched_at: None,
            touched_at: Instant::now(),
            invalidated: false,
        }
    }
}

struct Inner {
    client: Arc<dyn ResourceClient>,
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
    next_request_id: AtomicU64,
    prediction_stale_time: Duration,
}

/// Process-wide query cache; cheap to clone
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

fn disabled_error(key: &QueryKey) -> AppError {
    AppError::Validation(format!("query {} is disabled: empty ticker or query", key))
}

async fn wait_settled(rx: &mut watch::Receiver<QueryState>) -> Result<QueryState> {
    rx.wait_for(|s| s.is_settled())
        .await
        .map(|s| (*s).clone())
        .map_err(|_| AppError::Network("query cache closed".to_string()))
}

impl QueryCache {
    pub fn new(client: Arc<dyn ResourceClient>, config: &ClientConfig) -> Self {
        info!(
            "Initializing QueryCache with prediction_stale_time={}s",
            config.prediction_stale_time.as_secs()
        );

        Self {
            inner: Arc::new(Inner {
                client,
                entries: RwLock::new(HashMap::new()),
                next_request_id: AtomicU64::new(0),
                prediction_stale_time: config.prediction_stale_time,
            }),
        }
    }

    pub fn client(&self) -> Arc<dyn ResourceClient> {
        self.inner.client.clone()
    }

    /// How long a successful result is served without refetching
    pub fn stale_time(&self, key: &QueryKey) -> Duration {
        match key.operation() {
            Operation::Prediction => self.inner.prediction_stale_time,
            _ => Duration::ZERO,
        }
    }

    /// Snapshot of a key's state (`Idle` if never requested)
    pub async fn state(&self, key: &QueryKey) -> QueryState {
        let entries = self.inner.entries.read().await;
        entries
            .get(key)
            .map(|e| e.tx.borrow().clone())
            .unwrap_or_default()
    }

    /// Number of keys the cache holds
    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Subscribe to a key, starting a request unless one is in flight or
    /// the cached data is still fresh
    pub async fn subscribe(&self, key: QueryKey) -> QuerySubscription {
        let key = key.normalized();
        let (rx, _) = self.attach(&key, false).await;
        QuerySubscription {
            key,
            rx,
            cache: self.clone(),
        }
    }

    /// Resolve a key: fresh cache, join in-flight request, or fetch
    pub async fn fetch(&self, key: QueryKey) -> Result<QueryData> {
        let key = key.normalized();
        let start_time = Utc::now();
        let (mut rx, source) = self.attach(&key, false).await;
        let Some(source) = source else {
            return Err(disabled_error(&key));
        };

        let state = wait_settled(&mut rx).await?;
        if source != DataSource::Network {
            let mut metrics = RequestMetrics::new(&key, 0, source, start_time);
            metrics.complete();
            debug!("{}", metrics.log_line());
        }
        state.into_result()
    }

    /// Bypass freshness and re-issue the request, superseding any in flight
    ///
    /// On failure the previously cached data stays in place.
    pub async fn refetch(&self, key: QueryKey) -> Result<QueryData> {
        let key = key.normalized();
        let (mut rx, source) = self.attach(&key, true).await;
        if source.is_none() {
            return Err(disabled_error(&key));
        }
        wait_settled(&mut rx).await?.into_result()
    }

    /// Mark matching entries stale and refetch the ones that have subscribers
    ///
    /// Filters are applied in order, so requests are issued in declaration
    /// order. Returns the keys that were refetched.
    pub async fn invalidate(&self, filters: &[QueryFilter]) -> Vec<QueryKey> {
        let mut entries = self.inner.entries.write().await;
        let mut seen = HashSet::new();
        let mut refetched = Vec::new();

        for filter in filters {
            for (key, entry) in entries.iter_mut() {
                if !filter.matches(key) || !seen.insert(key.clone()) {
                    continue;
                }

                entry.invalidated = true;
                if key.is_enabled() && entry.tx.receiver_count() > 0 {
                    self.start_fetch(key, entry);
                    refetched.push(key.clone());
                }
            }
        }

        info!(
            "Invalidated {} entries ({} refetched)",
            seen.len(),
            refetched.len()
        );
        refetched
    }

    async fn attach(
        &self,
        key: &QueryKey,
        force: bool,
    ) -> (watch::Receiver<QueryState>, Option<DataSource>) {
        if !key.is_enabled() {
            debug!("Query {} is disabled, not fetching", key);
            let (_tx, rx) = watch::channel(QueryState::default());
            return (rx, None);
        }

        let mut entries = self.inner.entries.write().await;
        if entries.len() >= CACHE_GC_MIN_ENTRIES && !entries.contains_key(key) {
            self.evict_idle(&mut entries);
        }
        let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);
        entry.touched_at = Instant::now();

        let source = if force {
            self.start_fetch(key, entry);
            DataSource::Network
        } else if entry.inflight.is_some() {
            DataSource::InFlight
        } else if self.is_fresh(key, entry) {
            DataSource::Cache
        } else {
            self.start_fetch(key, entry);
            DataSource::Network
        };

        // subscribe last so the receiver starts at the state it was handed
        (entry.tx.subscribe(), Some(source))
    }

    /// Drop entries nobody watches, with no request in flight, untouched for
    /// the eviction window (or the freshness window, if longer)
    pub async fn evict_idle_entries(&self) -> usize {
        let mut entries = self.inner.entries.write().await;
        self.evict_idle(&mut entries)
    }

    fn evict_idle(&self, entries: &mut HashMap<QueryKey, CacheEntry>) -> usize {
        let before = entries.len();
        let idle_window = Duration::from_secs(CACHE_IDLE_EVICT_SECS);
        entries.retain(|key, entry| {
            entry.inflight.is_some()
                || entry.tx.receiver_count() > 0
                || entry.touched_at.elapsed() < self.stale_time(key).max(idle_window)
        });

        let evicted = before - entries.len();
        if evicted > 0 {
            debug!("Evicted {} idle cache entries, {} left", evicted, entries.len());
        }
        evicted
    }

    fn is_fresh(&self, key: &QueryKey, entry: &CacheEntry) -> bool {
        if entry.invalidated || entry.tx.borrow().status != QueryStatus::Ready {
            return false;
        }
        let stale_time = self.stale_time(key);
        entry
            .fetched_at
            .map_or(false, |at| at.elapsed() < stale_time)
    }

    fn start_fetch(&self, key: &QueryKey, entry: &mut CacheEntry) -> u64 {
        if let Some(previous) = entry.inflight.take() {
            previous.handle.abort();
            write_request_log(
                RequestMetrics::new(key, previous.id, DataSource::Network, previous.start_time)
                    .superseded(),
            );
        }

        let id = self.inner.next_request_id.fetch_add(1, Ordering::Relaxed) + 1;
        entry.tx.send_modify(|state| state.status = QueryStatus::Loading);

        let cache = self.clone();
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let client = cache.inner.client.clone();
            let result = task_key.execute(client.as_ref()).await;
            cache.complete(&task_key, id, result).await;
        });

        entry.inflight = Some(Inflight {
            id,
            start_time: Utc::now(),
            handle,
        });
        debug!("Issued request {} for {}", id, key);
        id
    }

    async fn complete(&self, key: &QueryKey, id: u64, result: Result<QueryData>) {
        let mut entries = self.inner.entries.write().await;
        let Some(entry) = entries.get_mut(key) else {
            return;
        };

        let start_time = match &entry.inflight {
            Some(inflight) if inflight.id == id => inflight.start_time,
            _ => {
                debug!("Discarding result of superseded request {} for {}", id, key);
                return;
            }
        };
        entry.inflight = None;

        let metrics = RequestMetrics::new(key, id, DataSource::Network, start_time);
        match result {
            Ok(data) => {
                entry.fetched_at = Some(Instant::now());
                entry.touched_at = Instant::now();
                entry.invalidated = false;
                entry.tx.send_modify(|state| {
                    state.status = QueryStatus::Ready;
                    state.data = Some(data);
                    state.error = None;
                    state.updated_at = Some(Utc::now());
                });
                write_request_log(metrics);
            }
            Err(err) => {
                let message = err.to_string();
                entry.tx.send_modify(|state| {
                    state.status = QueryStatus::Error;
                    state.error = Some(err);
                });
                write_request_log(metrics.fail(message));
            }
        }
    }
}

/// Live view of one key; dropping it unsubscribes
pub struct QuerySubscription {
    key: QueryKey,
    rx: watch::Receiver<QueryState>,
    cache: QueryCache,
}

impl QuerySubscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn state(&self) -> QueryState {
        self.rx.borrow().clone()
    }

    /// Wait for the next state transition; `None` once the cache is gone
    pub async fn changed(&mut self) -> Option<QueryState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until the current request settles; returns at once if it
    /// already has, or if the query is disabled
    pub async fn settled(&mut self) -> QueryState {
        if !self.key.is_enabled() {
            return self.state();
        }
        let settled = wait_settled(&mut self.rx).await;
        settled.unwrap_or_else(|_| self.state())
    }

    /// Force a new request for this key
    pub async fn refetch(&self) -> Result<QueryData> {
        self.cache.refetch(self.key.clone()).await
    }

    /// Deliver the current state, then every later one, to `on_state`
    ///
    /// Rapid transitions may be coalesced; the latest state is always
    /// delivered. Dropping the handle unsubscribes.
    pub fn spawn_listener<F>(mut self, mut on_state: F) -> ListenerHandle
    where
        F: FnMut(&QueryState) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let current = self.rx.borrow_and_update().clone();
            on_state(&current);
            while self.rx.changed().await.is_ok() {
                let state = self.rx.borrow_and_update().clone();
                on_state(&state);
            }
        });
        ListenerHandle { handle }
    }

    pub fn unsubscribe(self) {}
}

/// Background listener; aborted on drop
pub struct ListenerHandle {
    handle: JoinHandle<()>,
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
