//! Field filtering layer

use crate::client::SlurmrestdApi;
use crate::error::SlurmrestdResult;
use crate::filter::filter_fields;
use async_trait::async_trait;
use serde_json::Value;
use slurmgate_shared::{DiscoveredEndpoint, FilterConfig, ResourceRequest};

/// Projects every resource to its configured allow-list
///
/// Filters are written against the target schema, the inner layer having
/// already adapted the payloads.
pub struct SlurmrestdFiltered<A> {
    inner: A,
    filters: FilterConfig,
}

impl<A: SlurmrestdApi> SlurmrestdFiltered<A> {
    pub fn new(inner: A, filters: FilterConfig) -> Self {
        Self { inner, filters }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<A: SlurmrestdApi> SlurmrestdApi for SlurmrestdFiltered<A> {
    async fn discover(&self) -> SlurmrestdResult<DiscoveredEndpoint> {
        self.inner.discover().await
    }

    async fn fetch(&self, request: &ResourceRequest) -> SlurmrestdResult<Value> {
        let value = self.inner.fetch(request).await?;
        Ok(filter_fields(
            value,
            self.filters.allow_list(request.resource.name()),
        ))
    }
}
