//! In-memory TTL cache of fetched series, keyed by ticker symbol.

use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::models::PriceSeries;

struct CacheEntry {
    series: PriceSeries,
    expires_at: Instant,
}

/// Thread-safe ticker → series cache with time-to-live expiration.
///
/// Expired entries are lazily evicted on the next `get` for that key.
pub struct SeriesCache {
    store: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    /// Returns the cached series for `symbol`, or `None` if missing or expired.
    pub fn get(&self, symbol: &str) -> Option<PriceSeries> {
        let entry = self.store.get(symbol)?;
        if Instant::now() >= entry.expires_at {
            drop(entry);
            self.store.remove(symbol);
            return None;
        }
        Some(entry.series.clone())
    }

    pub fn insert(&self, series: PriceSeries) {
        self.store.insert(
            series.symbol.clone(),
            CacheEntry {
                series,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(symbol: &str) -> PriceSeries {
        PriceSeries::new(symbol, Some("name".to_string()), vec![])
    }

    #[test]
    fn cache_insert_and_get() {
        let cache = SeriesCache::new(Duration::from_secs(60));
        cache.insert(series("7203.T"));
        assert_eq!(cache.get("7203.T"), Some(series("7203.T")));
    }

    #[test]
    fn cache_miss() {
        let cache = SeriesCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("6758.T"), None);
    }

    #[test]
    fn cache_expiration_evicts() {
        let cache = SeriesCache::new(Duration::from_millis(1));
        cache.insert(series("7203.T"));
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.get("7203.T"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_ttl_never_hits() {
        let cache = SeriesCache::new(Duration::ZERO);
        cache.insert(series("7203.T"));
        assert_eq!(cache.get("7203.T"), None);
    }

    #[test]
    fn cache_clear() {
        let cache = SeriesCache::new(Duration::from_secs(60));
        cache.insert(series("7203.T"));
        cache.insert(series("6758.T"));
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert_eq!(cache.get("7203.T"), None);
        assert_eq!(cache.get("6758.T"), None);
    }
}
