//! Response caching layer

use crate::client::SlurmrestdApi;
use crate::error::SlurmrestdResult;
use async_trait::async_trait;
use serde_json::Value;
use slurmgate_cache::{CacheKey, CacheMetrics, CachingService};
use slurmgate_shared::{CacheConfig, DiscoveredEndpoint, ResourceRequest};

/// Serves resources from the cache, asking the inner layer on misses
///
/// The ping probe and discovery always reach the inner layer.
pub struct SlurmrestdCached<A> {
    inner: A,
    cache: CachingService,
    config: CacheConfig,
}

impl<A: SlurmrestdApi> SlurmrestdCached<A> {
    pub fn new(inner: A, cache: CachingService, config: CacheConfig) -> Self {
        Self {
            inner,
            cache,
            config,
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub async fn metrics(&self) -> SlurmrestdResult<CacheMetrics> {
        Ok(self.cache.metrics().await?)
    }

    pub async fn reset_metrics(&self) -> SlurmrestdResult<()> {
        Ok(self.cache.reset().await?)
    }
}

#[async_trait]
impl<A: SlurmrestdApi> SlurmrestdApi for SlurmrestdCached<A> {
    async fn discover(&self) -> SlurmrestdResult<DiscoveredEndpoint> {
        self.inner.discover().await
    }

    async fn fetch(&self, request: &ResourceRequest) -> SlurmrestdResult<Value> {
        if !request.resource.is_cacheable() {
            return self.inner.fetch(request).await;
        }

        let key = CacheKey::for_request(request);
        let ttl = self.config.ttl_for(request.resource.name());
        self.cache
            .cached(&key, ttl, || self.inner.fetch(request))
            .await
    }
}
