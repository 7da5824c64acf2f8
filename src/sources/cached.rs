use crate::cache::SeriesCache;
use crate::errors::Result;
use crate::models::PriceSeries;
use crate::sources::base::PriceSource;
use crate::ticker::Ticker;
use async_trait::async_trait;
use log::debug;
use std::time::Duration;

/// Wraps another source with a per-ticker TTL cache.
///
/// Only successful fetches are cached.
pub struct CachedSource<S> {
    inner: S,
    cache: SeriesCache,
}

impl<S: PriceSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            cache: SeriesCache::new(ttl),
        }
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: PriceSource + Send + Sync> PriceSource for CachedSource<S> {
    fn source_name(&self) -> &'static str {
        self.inner.source_name()
    }

    async fn fetch(&self, ticker: &Ticker) -> Result<PriceSeries> {
        if let Some(series) = self.cache.get(&ticker.symbol) {
            debug!("Cache hit for {}", ticker.symbol);
            return Ok(series);
        }

        let series = self.inner.fetch(ticker).await?;
        self.cache.insert(series.clone());
        Ok(series)
    }
}
