//! Cache store abstraction and hit/miss metrics

use crate::error::CacheResult;
use crate::key::CacheKey;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Hit and miss counters, per bucket and in total
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    pub hits: BTreeMap<String, u64>,
    pub misses: BTreeMap<String, u64>,
    pub total_hits: u64,
    pub total_misses: u64,
}

impl CacheMetrics {
    /// Share of lookups answered from the cache, 0 when nothing was looked up
    pub fn hit_ratio(&self) -> f64 {
        let total = self.total_hits + self.total_misses;
        if total == 0 {
            0.0
        } else {
            self.total_hits as f64 / total as f64
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
            && self.misses.is_empty()
            && self.total_hits == 0
            && self.total_misses == 0
    }
}

/// Key/value store with hit/miss accounting
///
/// Values are opaque serialized blobs. Each primitive is expected to be
/// atomic at the store; no ordering is provided across calls.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn put(&self, key: &CacheKey, value: &str, ttl: Duration) -> CacheResult<()>;

    async fn get(&self, key: &CacheKey) -> CacheResult<Option<String>>;

    async fn count_hit(&self, key: &CacheKey) -> CacheResult<()>;

    async fn count_miss(&self, key: &CacheKey) -> CacheResult<()>;

    async fn metrics(&self) -> CacheResult<CacheMetrics>;

    /// Zero every counter and forget every bucket name
    async fn reset(&self) -> CacheResult<()>;

    /// Store description for logs
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_ratio() {
        let mut metrics = CacheMetrics::default();
        assert_eq!(metrics.hit_ratio(), 0.0);
        assert!(metrics.is_empty());

        metrics.total_hits = 3;
        metrics.total_misses = 1;
        assert_eq!(metrics.hit_ratio(), 0.75);
        assert!(!metrics.is_empty());
    }
}
