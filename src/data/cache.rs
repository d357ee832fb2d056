//! Caching collaborators for return lookups.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use super::{ReturnSeries, ReturnSource};
use crate::error::Result;

/// Key/value cache with optional per-entry time-to-live.
pub trait Cache<K, V> {
    /// Cached value, if present and not expired.
    fn get(&self, key: &K) -> Option<V>;

    /// Store a value; `ttl = None` keeps it until removed.
    fn put(&self, key: K, value: V, ttl: Option<Duration>);

    /// Drop one entry.
    fn remove(&self, key: &K);

    /// Drop every entry.
    fn clear(&self);
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that found nothing usable
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0.0 before any lookup.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
}

#[derive(Debug)]
struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    stats: CacheStats,
}

/// Thread-safe in-process cache.
#[derive(Debug)]
pub struct MemoryCache<K, V> {
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> Default for MemoryCache<K, V> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            }),
        }
    }
}

impl<K, V> MemoryCache<K, V> {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the map consistent
    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current hit/miss counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    /// Number of stored entries, including entries that expired since the
    /// last insert.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// True if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.lock();
        let now = Instant::now();
        let expired = match inner.entries.get(key) {
            Some(entry) => entry.expires_at.is_some_and(|t| now >= t),
            None => {
                inner.stats.misses += 1;
                return None;
            }
        };
        if expired {
            inner.entries.remove(key);
            inner.stats.misses += 1;
            return None;
        }
        inner.stats.hits += 1;
        inner.entries.get(key).map(|e| e.value.clone())
    }

    /// Expired entries are purged on every insert so abandoned keys do not
    /// accumulate.
    fn put(&self, key: K, value: V, ttl: Option<Duration>) {
        let now = Instant::now();
        let expires_at = ttl.map(|d| now + d);
        let mut inner = self.lock();
        inner
            .entries
            .retain(|_, entry| entry.expires_at.map_or(true, |t| now < t));
        inner.entries.insert(key, Entry { value, expires_at });
    }

    fn remove(&self, key: &K) {
        self.lock().entries.remove(key);
    }

    fn clear(&self) {
        self.lock().entries.clear();
    }
}

/// Cache key for a windowed return lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReturnKey {
    /// Asset identifier
    pub asset_id: String,
    /// Window start, inclusive
    pub start: Option<NaiveDate>,
    /// Window end, inclusive
    pub end: Option<NaiveDate>,
}

/// [`ReturnSource`] decorator that memoizes lookups in a [`Cache`].
///
/// Errors are never cached.
#[derive(Debug)]
pub struct CachedReturnSource<S, C> {
    source: S,
    cache: C,
    ttl: Option<Duration>,
}

impl<S, C> CachedReturnSource<S, C>
where
    S: ReturnSource,
    C: Cache<ReturnKey, ReturnSeries>,
{
    /// Wrap `source`, storing entries without expiry.
    pub fn new(source: S, cache: C) -> Self {
        Self {
            source,
            cache,
            ttl: None,
        }
    }

    /// Expire cached entries after `ttl`.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The cache in use.
    pub fn cache(&self) -> &C {
        &self.cache
    }
}

impl<S, C> ReturnSource for CachedReturnSource<S, C>
where
    S: ReturnSource,
    C: Cache<ReturnKey, ReturnSeries>,
{
    fn get_returns(
        &self,
        asset_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ReturnSeries> {
        let key = ReturnKey {
            asset_id: asset_id.to_string(),
            start,
            end,
        };
        if let Some(hit) = self.cache.get(&key) {
            tracing::trace!(asset_id, "return cache hit");
            return Ok(hit);
        }
        let series = self.source.get_returns(asset_id, start, end)?;
        self.cache.put(key, series.clone(), self.ttl);
        Ok(series)
    }
}
