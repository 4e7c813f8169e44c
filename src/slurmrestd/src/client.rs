//! slurmrestd resource accessors

use crate::adapters::AdapterRegistry;
use crate::discovery::VersionDiscovery;
use crate::error::{SlurmrestdError, SlurmrestdResult};
use crate::session::{Backend, Session};
use crate::transport;
use async_trait::async_trait;
use serde_json::Value;
use slurmgate_security::AuthenticationManager;
use slurmgate_shared::{DiscoveredEndpoint, Resource, ResourceRequest, SlurmrestdConfig};
use std::sync::Arc;
use tracing::debug;

/// Key of the live controller record in the job detail view
pub const LIVE_JOB_KEY: &str = "live";

/// slurmctld error number for a job id it does not know (ESLURM_INVALID_JOB_ID)
pub const INVALID_JOB_ID_ERROR: i64 = 2017;

/// Version independent access to slurmrestd resources
///
/// Layers implement [`discover`](Self::discover) and [`fetch`](Self::fetch);
/// the per-resource accessors go through `fetch` and so through every layer.
#[async_trait]
pub trait SlurmrestdApi: Send + Sync {
    /// Negotiated cluster, release and API version
    async fn discover(&self) -> SlurmrestdResult<DiscoveredEndpoint>;

    /// Payload of one resource, in the target schema
    async fn fetch(&self, request: &ResourceRequest) -> SlurmrestdResult<Value>;

    async fn ping(&self) -> SlurmrestdResult<Value> {
        self.fetch(&ResourceRequest::new(Resource::Ping)).await
    }

    async fn diag(&self) -> SlurmrestdResult<Value> {
        self.fetch(&ResourceRequest::new(Resource::Diag)).await
    }

    async fn jobs(&self) -> SlurmrestdResult<Value> {
        self.fetch(&ResourceRequest::new(Resource::Jobs)).await
    }

    /// Accounting record of a job with the live controller record, when the
    /// controller still knows the job, under [`LIVE_JOB_KEY`]
    async fn job(&self, job_id: u64) -> SlurmrestdResult<Value> {
        let mut job = self.acct_job(job_id).await?;

        let live = ResourceRequest::with_param(Resource::Job, job_id.to_string()).tolerate_not_found();
        match self.fetch(&live).await {
            Ok(record) => {
                if let Value::Object(fields) = &mut job {
                    fields.insert(LIVE_JOB_KEY.to_string(), record);
                }
            }
            Err(
                err @ (SlurmrestdError::NotFound { .. }
                | SlurmrestdError::Internal {
                    code: INVALID_JOB_ID_ERROR,
                    ..
                }),
            ) => {
                debug!("No live record for job {}: {}", job_id, err);
            }
            Err(err) => return Err(err),
        }

        Ok(job)
    }

    async fn nodes(&self) -> SlurmrestdResult<Value> {
        self.fetch(&ResourceRequest::new(Resource::Nodes)).await
    }

    async fn node(&self, name: &str) -> SlurmrestdResult<Value> {
        self.fetch(&ResourceRequest::with_param(Resource::Node, name)).await
    }

    async fn partitions(&self) -> SlurmrestdResult<Value> {
        self.fetch(&ResourceRequest::new(Resource::Partitions)).await
    }

    async fn reservations(&self) -> SlurmrestdResult<Value> {
        self.fetch(&ResourceRequest::new(Resource::Reservations)).await
    }

    async fn acct_job(&self, job_id: u64) -> SlurmrestdResult<Value> {
        self.fetch(&ResourceRequest::with_param(Resource::AcctJob, job_id.to_string()))
            .await
    }

    async fn qos(&self) -> SlurmrestdResult<Value> {
        self.fetch(&ResourceRequest::new(Resource::Qos)).await
    }

    async fn accounts(&self) -> SlurmrestdResult<Value> {
        self.fetch(&ResourceRequest::new(Resource::Accounts)).await
    }

    async fn users(&self) -> SlurmrestdResult<Value> {
        self.fetch(&ResourceRequest::new(Resource::Users)).await
    }

    async fn associations(&self) -> SlurmrestdResult<Value> {
        self.fetch(&ResourceRequest::new(Resource::Associations)).await
    }
}

/// Base layer: discovery, authenticated queries, validation and adaptation
pub struct Slurmrestd {
    backend: Arc<dyn Backend>,
    discovery: VersionDiscovery,
}

impl Slurmrestd {
    pub fn new(backend: Arc<dyn Backend>, discovery: VersionDiscovery) -> Self {
        Self { backend, discovery }
    }

    /// Client for the configured endpoint, credentials and versions
    ///
    /// With a version override only that version is probed.
    pub fn from_config(config: &SlurmrestdConfig) -> SlurmrestdResult<Self> {
        let transport = transport::connect(&config.uri, config.timeout())?;
        let auth = AuthenticationManager::from_config(&config.auth, transport.is_local())
            .map_err(|e| SlurmrestdError::configuration(e.to_string()))?;

        let probe_versions = match &config.version_override {
            Some(version) => config
                .versions
                .only(version)
                .map_err(|e| SlurmrestdError::configuration(e.to_string()))?,
            None => config.versions.clone(),
        };
        let discovery = VersionDiscovery::new(
            probe_versions,
            config.versions.clone(),
            config.target_version(),
            AdapterRegistry::default(),
        )?;

        debug!(
            "slurmrestd client for {} ({:?} authentication)",
            transport.endpoint(),
            auth.mode()
        );
        Ok(Self::new(Arc::new(Session::new(transport, auth)), discovery))
    }

    pub fn discovery(&self) -> &VersionDiscovery {
        &self.discovery
    }
}

#[async_trait]
impl SlurmrestdApi for Slurmrestd {
    async fn discover(&self) -> SlurmrestdResult<DiscoveredEndpoint> {
        Ok(self.discovery.discover(self.backend.as_ref()).await?.clone())
    }

    async fn fetch(&self, request: &ResourceRequest) -> SlurmrestdResult<Value> {
        if !request.is_addressable() {
            return Err(SlurmrestdError::not_found(format!(
                "No {} named {:?}",
                request.resource,
                request.param.as_deref().unwrap_or_default()
            )));
        }

        let negotiated = self.discovery.negotiate(self.backend.as_ref()).await?;
        let query = request.at_version(&negotiated.endpoint.api_version);

        let mut payload = self.backend.query(&query).await?;
        negotiated
            .chain
            .apply(query.component(), query.envelope_key(), &mut payload);

        if !request.resource.is_single_item() {
            return Ok(payload);
        }

        match payload {
            Value::Array(items) => items.into_iter().next().ok_or_else(|| {
                SlurmrestdError::not_found(format!("{} not found", query.url_path()))
            }),
            other => Err(SlurmrestdError::invalid_response(format!(
                "Expected a list under {} in {}, got {}",
                query.envelope_key(),
                query.url_path(),
                type_name(&other)
            ))),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
