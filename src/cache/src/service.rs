//! Cache-aside decorator

use crate::error::{CacheError, CacheResult};
use crate::key::CacheKey;
use crate::memory::MemoryCacheStore;
use crate::redis_store::RedisCacheStore;
use crate::store::{CacheMetrics, CacheStore};
use serde::{de::DeserializeOwned, Serialize};
use slurmgate_shared::CacheConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Get, or compute and store, values in a [`CacheStore`]
///
/// No request coalescing: concurrent misses on one key each run `compute`
/// and each write the result, the last write wins.
#[derive(Clone)]
pub struct CachingService {
    store: Arc<dyn CacheStore>,
    enabled: bool,
}

impl CachingService {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            enabled: true,
        }
    }

    /// Service that always computes and never touches a store
    pub fn disabled() -> Self {
        Self {
            store: Arc::new(MemoryCacheStore::new()),
            enabled: false,
        }
    }

    /// Redis backed service when enabled in configuration, disabled otherwise
    pub async fn from_config(config: &CacheConfig) -> CacheResult<Self> {
        if !config.enabled {
            info!("Response cache disabled");
            return Ok(Self::disabled());
        }

        let store = RedisCacheStore::connect(config).await?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Return the cached value for `key`, or compute, store and return it
    ///
    /// Store failures surface as `E::from(CacheError)` and are never mistaken
    /// for a miss. Errors from `compute` are returned as is and nothing is
    /// stored or counted.
    pub async fn cached<T, E, F, Fut>(&self, key: &CacheKey, ttl: Duration, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.enabled {
            return compute().await;
        }

        if let Some(raw) = self.store.get(key).await? {
            let value = serde_json::from_str(&raw).map_err(CacheError::from)?;
            self.store.count_hit(key).await?;
            debug!("Cache hit for {}", key);
            return Ok(value);
        }

        let value = compute().await?;
        let raw = serde_json::to_string(&value).map_err(CacheError::from)?;
        self.store.put(key, &raw, ttl).await?;
        self.store.count_miss(key).await?;
        debug!("Cache miss for {}, stored for {}s", key, ttl.as_secs());
        Ok(value)
    }

    pub async fn metrics(&self) -> CacheResult<CacheMetrics> {
        self.store.metrics().await
    }

    pub async fn reset(&self) -> CacheResult<()> {
        info!("Resetting {} cache metrics", self.store.name());
        self.store.reset().await
    }
}

impl std::fmt::Debug for CachingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingService")
            .field("store", &self.store.name())
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_disabled_service_bypasses_store() {
        let service = CachingService::disabled();
        let key = CacheKey::new("jobs");
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Result<Vec<u32>, CacheError> = service
                .cached(&key, Duration::from_secs(60), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2])
                })
                .await;
            assert_eq!(value.unwrap(), vec![1, 2]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(service.metrics().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_compute_error_is_not_stored() {
        let store = Arc::new(MemoryCacheStore::new());
        let service = CachingService::new(store.clone());
        let key = CacheKey::new("nodes");

        let result: Result<u32, CacheError> = service
            .cached(&key, Duration::from_secs(60), || async {
                Err(CacheError::operation("backend down"))
            })
            .await;

        assert!(result.is_err());
        assert!(store.is_empty());
        assert!(service.metrics().await.unwrap().is_empty());
    }
}
