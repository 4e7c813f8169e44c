//! In-process cache store
//!
//! Same semantics as the Redis store for single-process deployments and tests.
//! Expired values are dropped when read and swept on every write.

use crate::error::{CacheError, CacheResult};
use crate::key::CacheKey;
use crate::store::{CacheMetrics, CacheStore};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Default)]
struct Counters {
    buckets: BTreeSet<String>,
    counts: HashMap<String, u64>,
    total: u64,
}

impl Counters {
    fn record(&mut self, bucket: &str) {
        self.buckets.insert(bucket.to_string());
        *self.counts.entry(bucket.to_string()).or_insert(0) += 1;
        self.total += 1;
    }

    fn by_bucket(&self) -> std::collections::BTreeMap<String, u64> {
        self.buckets
            .iter()
            .map(|bucket| (bucket.clone(), self.counts.get(bucket).copied().unwrap_or(0)))
            .collect()
    }
}

/// Cache store living in the current process
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    values: DashMap<String, (String, Instant)>,
    hits: Mutex<Counters>,
    misses: Mutex<Counters>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values, expired ones included until the next write
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn put(&self, key: &CacheKey, value: &str, ttl: Duration) -> CacheResult<()> {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).ok_or_else(|| {
            CacheError::operation(format!(
                "TTL of {}s for {} is out of range",
                ttl.as_secs(),
                key.primary()
            ))
        })?;

        self.values.retain(|_, (_, expires)| *expires > now);
        self.values
            .insert(key.primary().to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn get(&self, key: &CacheKey) -> CacheResult<Option<String>> {
        if let Some(entry) = self.values.get(key.primary()) {
            let (value, expires_at) = entry.value();
            if Instant::now() < *expires_at {
                return Ok(Some(value.clone()));
            }
        }

        // Re-checked under the shard lock so a concurrent fresh write survives
        self.values
            .remove_if(key.primary(), |_, (_, expires_at)| Instant::now() >= *expires_at);
        Ok(None)
    }

    async fn count_hit(&self, key: &CacheKey) -> CacheResult<()> {
        self.hits.lock().record(key.bucket());
        Ok(())
    }

    async fn count_miss(&self, key: &CacheKey) -> CacheResult<()> {
        self.misses.lock().record(key.bucket());
        Ok(())
    }

    async fn metrics(&self) -> CacheResult<CacheMetrics> {
        let hits = self.hits.lock();
        let misses = self.misses.lock();
        Ok(CacheMetrics {
            hits: hits.by_bucket(),
            misses: misses.by_bucket(),
            total_hits: hits.total,
            total_misses: misses.total,
        })
    }

    async fn reset(&self) -> CacheResult<()> {
        *self.hits.lock() = Counters::default();
        *self.misses.lock() = Counters::default();
        info!("Reset in-memory cache metrics");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
