use crate::services::query_cache::{QueryCache, QueryState, QuerySubscription};
use crate::services::query_key::QueryKey;

/// Follows whichever key a consumer currently cares about
///
/// Switching keys drops the old subscription, so a late result for the old
/// parameters can never show up as the observer's state.
pub struct QueryObserver {
    cache: QueryCache,
    current: Option<QuerySubscription>,
}

impl QueryObserver {
    pub fn new(cache: QueryCache) -> Self {
        Self {
            cache,
            current: None,
        }
    }

    /// Point the observer at `key` and return its state at once
    ///
    /// Re-observing the current key is a no-op.
    pub async fn observe(&mut self, key: QueryKey) -> QueryState {
        if let Some(sub) = &self.current {
            if sub.key() == &key {
                return sub.state();
            }
        }

        let sub = self.cache.subscribe(key).await;
        let state = sub.state();
        self.current = Some(sub);
        state
    }

    pub fn key(&self) -> Option<&QueryKey> {
        self.current.as_ref().map(|s| s.key())
    }

    /// State of the observed key, `Idle` when nothing is observed
    pub fn state(&self) -> QueryState {
        self.current
            .as_ref()
            .map(|s| s.state())
            .unwrap_or_default()
    }

    /// Wait for the observed key's current request to settle
    pub async fn settled(&mut self) -> QueryState {
        match self.current.as_mut() {
            Some(sub) => sub.settled().await,
            None => QueryState::default(),
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
