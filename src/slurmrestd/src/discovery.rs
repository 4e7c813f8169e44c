//! API version negotiation

use crate::adapters::{build_chain, AdapterChain, AdapterRegistry};
use crate::error::{SlurmrestdError, SlurmrestdResult};
use crate::session::Backend;
use serde_json::Value;
use slurmgate_shared::{DiscoveredEndpoint, Resource, ResourceRequest, SupportedVersions};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Negotiated endpoint and the adapter chain built for it
#[derive(Debug, Clone)]
pub struct Negotiated {
    pub endpoint: DiscoveredEndpoint,
    pub chain: AdapterChain,
}

/// Probes the ping endpoint version after version and remembers the first answer
///
/// Concurrent first calls share one probe sequence. A failed sequence is not
/// remembered, the next call probes again.
#[derive(Debug)]
pub struct VersionDiscovery {
    probe_versions: SupportedVersions,
    supported: SupportedVersions,
    target: String,
    registry: AdapterRegistry,
    negotiated: OnceCell<Negotiated>,
}

impl VersionDiscovery {
    /// `probe_versions` are tried in order; chains are built within `supported`
    /// up to `target`
    pub fn new(
        probe_versions: SupportedVersions,
        supported: SupportedVersions,
        target: impl Into<String>,
        registry: AdapterRegistry,
    ) -> SlurmrestdResult<Self> {
        let target = target.into();
        if !supported.contains(&target) {
            return Err(SlurmrestdError::configuration(format!(
                "Target version {} is not in supported versions [{}]",
                target, supported
            )));
        }
        if let Some(version) = probe_versions
            .descending()
            .iter()
            .find(|version| !supported.contains(version))
        {
            return Err(SlurmrestdError::configuration(format!(
                "Probe version {} is not in supported versions [{}]",
                version, supported
            )));
        }

        Ok(Self {
            probe_versions,
            supported,
            target,
            registry,
            negotiated: OnceCell::new(),
        })
    }

    /// Negotiated state, probing the backend on first use
    pub async fn negotiate(&self, backend: &dyn Backend) -> SlurmrestdResult<&Negotiated> {
        self.negotiated
            .get_or_try_init(|| async {
                let endpoint = self.probe(backend).await?;
                let chain = build_chain(
                    &endpoint.api_version,
                    &self.target,
                    &self.supported,
                    &self.registry,
                )?;
                if !chain.is_empty() {
                    info!(
                        "Adapting slurmrestd API v{} responses to v{} through {} step(s)",
                        endpoint.api_version,
                        self.target,
                        chain.len()
                    );
                }
                Ok::<_, SlurmrestdError>(Negotiated { endpoint, chain })
            })
            .await
    }

    pub async fn discover(&self, backend: &dyn Backend) -> SlurmrestdResult<&DiscoveredEndpoint> {
        Ok(&self.negotiate(backend).await?.endpoint)
    }

    async fn probe(&self, backend: &dyn Backend) -> SlurmrestdResult<DiscoveredEndpoint> {
        for version in self.probe_versions.descending() {
            let query = ResourceRequest::new(Resource::Ping)
                .tolerate_not_found()
                .at_version(version);

            let outcome = backend
                .query(&query)
                .await
                .and_then(|meta| parse_ping(&meta, version));

            match outcome {
                Ok(endpoint) => {
                    info!("Discovered slurmrestd {}", endpoint);
                    return Ok(endpoint);
                }
                Err(err @ SlurmrestdError::NotFound { .. }) => {
                    debug!("slurmrestd API v{} not available: {}", version, err);
                }
                Err(err) if err.is_discovery_fallthrough() => {
                    warn!("slurmrestd API v{} rejected: {}", version, err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(SlurmrestdError::connection(format!(
            "Unable to discover API version. Tried versions: {}",
            self.probe_versions
        )))
    }
}

/// Cluster and release from the `meta` payload of a ping answer
fn parse_ping(meta: &Value, version: &str) -> SlurmrestdResult<DiscoveredEndpoint> {
    let slurm = meta.get("slurm");
    let field = |name: &str| {
        slurm
            .and_then(|slurm| slurm.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                SlurmrestdError::invalid_response(format!(
                    "Missing meta.slurm.{} in ping response of API v{}",
                    name, version
                ))
            })
    };

    Ok(DiscoveredEndpoint {
        cluster: field("cluster")?,
        release: field("release")?,
        api_version: version.to_string(),
    })
}
