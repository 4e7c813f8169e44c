//! Layer assembly from configuration

use crate::cached::SlurmrestdCached;
use crate::client::{Slurmrestd, SlurmrestdApi};
use crate::error::SlurmrestdResult;
use crate::filtered::SlurmrestdFiltered;
use slurmgate_cache::CachingService;
use slurmgate_shared::GatewayConfig;
use std::sync::Arc;
use tracing::info;

/// Stack the optional layers over a base client
///
/// Filtering is enabled by any configured allow-list, caching by an enabled
/// caching service. The cache sits outermost so cached values are filtered.
pub fn assemble(
    base: Slurmrestd,
    config: &GatewayConfig,
    cache: CachingService,
) -> Arc<dyn SlurmrestdApi> {
    let filters = &config.slurmrestd.filters;
    let filtering = !filters.resources.is_empty();
    let caching = cache.is_enabled();
    info!(filtering, caching, "Assembling slurmrestd client");

    match (filtering, caching) {
        (false, false) => Arc::new(base),
        (true, false) => Arc::new(SlurmrestdFiltered::new(base, filters.clone())),
        (false, true) => Arc::new(SlurmrestdCached::new(base, cache, config.cache.clone())),
        (true, true) => Arc::new(SlurmrestdCached::new(
            SlurmrestdFiltered::new(base, filters.clone()),
            cache,
            config.cache.clone(),
        )),
    }
}

/// Client for the configured slurmrestd, with the given caching service
pub fn build_client(
    config: &GatewayConfig,
    cache: CachingService,
) -> SlurmrestdResult<Arc<dyn SlurmrestdApi>> {
    let base = Slurmrestd::from_config(&config.slurmrestd)?;
    Ok(assemble(base, config, cache))
}

/// Client for the configured slurmrestd, connecting the configured cache
pub async fn connect_client(config: &GatewayConfig) -> SlurmrestdResult<Arc<dyn SlurmrestdApi>> {
    let cache = CachingService::from_config(&config.cache).await?;
    build_client(config, cache)
}
