//! In-memory TTL cache of raw provider series.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::{Interval, RawSeries, Symbol};

/// Default lifetime of a cached series.
pub const DEFAULT_TTL: Duration = Duration::from_secs(90);

/// Cache key. The symbol is already upper-cased by [`Symbol::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: Symbol,
    pub interval: Interval,
}

impl CacheKey {
    pub fn new(symbol: &Symbol, interval: Interval) -> Self {
        Self {
            symbol: symbol.clone(),
            interval,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    fetched_at: Instant,
    series: Arc<RawSeries>,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl CacheInner {
    /// Returns the entry if younger than the TTL; a stale entry is removed.
    fn get(&mut self, key: &CacheKey, now: Instant) -> Option<Arc<RawSeries>> {
        let entry = self.map.get(key)?;
        if now.saturating_duration_since(entry.fetched_at) < self.ttl {
            return Some(Arc::clone(&entry.series));
        }

        self.map.remove(key);
        None
    }

    fn put(&mut self, key: CacheKey, series: Arc<RawSeries>, now: Instant) {
        self.map.insert(
            key,
            CacheEntry {
                fetched_at: now,
                series,
            },
        );
    }
}

/// Thread-safe series cache shared by every in-flight request.
///
/// A single mutex guards the whole map. It is only held for the lookup or
/// insert itself, never while a fetch is running. Stale entries are evicted
/// on access; there is no background sweep.
#[derive(Debug, Clone)]
pub struct SeriesCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl Default for SeriesCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                map: HashMap::new(),
                ttl,
            })),
        }
    }

    pub fn get(&self, symbol: &Symbol, interval: Interval) -> Option<Arc<RawSeries>> {
        let key = CacheKey::new(symbol, interval);
        self.lock().get(&key, Instant::now())
    }

    pub fn put(&self, symbol: &Symbol, interval: Interval, series: Arc<RawSeries>) {
        let key = CacheKey::new(symbol, interval);
        self.lock().put(key, series, Instant::now());
    }

    /// Number of entries, stale ones included until they are next accessed.
    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().map.clear();
    }

    pub fn ttl(&self) -> Duration {
        self.lock().ttl
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // The map stays consistent even if a holder panicked mid-call.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
