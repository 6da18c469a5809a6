use chrono::NaiveDate;
use core_types::{RawResponse, TickerSet};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Identifies one fetch: the sorted ticker tuple plus the date range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    tickers: Vec<String>,
    start: NaiveDate,
    end: NaiveDate,
}

impl CacheKey {
    pub fn new(tickers: &TickerSet, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            tickers: tickers.cache_key(),
            start,
            end,
        }
    }
}

/// Memoized provider responses.
///
/// Only successful fetches are stored. There is no eviction: entries live as
/// long as the cache, which is owned by a single session. Clones share the
/// same underlying map.
#[derive(Debug, Clone, Default)]
pub struct FetchCache {
    entries: Arc<RwLock<HashMap<CacheKey, Arc<RawResponse>>>>,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<RawResponse>> {
        let entries = self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(key).cloned()
    }

    /// Stores a response and returns the shared handle to it.
    pub fn insert(&self, key: CacheKey, response: RawResponse) -> Arc<RawResponse> {
        let response = Arc::new(response);
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(key, Arc::clone(&response));
        response
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
