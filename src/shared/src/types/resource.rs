//! slurmrestd resource addressing
//!
//! Every resource served by slurmrestd lives under a component namespace and a
//! version prefix: `/<component>/v<version>/<path>`. The JSON envelope carries
//! the payload under a resource specific key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Independent slurmrestd sub-APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// Live controller state (slurmctld)
    Slurm,
    /// Historical accounting (slurmdbd)
    Slurmdb,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Slurm => "slurm",
            Component::Slurmdb => "slurmdb",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resources known to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Ping,
    Diag,
    Jobs,
    Job,
    Nodes,
    Node,
    Partitions,
    Reservations,
    AcctJob,
    Qos,
    Accounts,
    Users,
    Associations,
}

impl Resource {
    pub const ALL: [Resource; 13] = [
        Resource::Ping,
        Resource::Diag,
        Resource::Jobs,
        Resource::Job,
        Resource::Nodes,
        Resource::Node,
        Resource::Partitions,
        Resource::Reservations,
        Resource::AcctJob,
        Resource::Qos,
        Resource::Accounts,
        Resource::Users,
        Resource::Associations,
    ];

    pub fn component(&self) -> Component {
        match self {
            Resource::AcctJob
            | Resource::Qos
            | Resource::Accounts
            | Resource::Users
            | Resource::Associations => Component::Slurmdb,
            _ => Component::Slurm,
        }
    }

    /// Name used for filter allow-lists, cache TTLs and counter buckets
    pub fn name(&self) -> &'static str {
        match self {
            Resource::Ping => "ping",
            Resource::Diag => "diag",
            Resource::Jobs => "jobs",
            Resource::Job => "job",
            Resource::Nodes => "nodes",
            Resource::Node => "node",
            Resource::Partitions => "partitions",
            Resource::Reservations => "reservations",
            Resource::AcctJob => "acct-job",
            Resource::Qos => "qos",
            Resource::Accounts => "accounts",
            Resource::Users => "users",
            Resource::Associations => "associations",
        }
    }

    /// Path below the version prefix, `{}` marks the parameter
    pub fn path_template(&self) -> &'static str {
        match self {
            Resource::Ping => "ping",
            Resource::Diag => "diag",
            Resource::Jobs => "jobs",
            Resource::Job | Resource::AcctJob => "job/{}",
            Resource::Nodes => "nodes",
            Resource::Node => "node/{}",
            Resource::Partitions => "partitions",
            Resource::Reservations => "reservations",
            Resource::Qos => "qos",
            Resource::Accounts => "accounts",
            Resource::Users => "users",
            Resource::Associations => "associations",
        }
    }

    /// Key holding the payload in the response envelope
    pub fn envelope_key(&self) -> &'static str {
        match self {
            Resource::Ping => "meta",
            Resource::Diag => "statistics",
            Resource::Jobs | Resource::Job | Resource::AcctJob => "jobs",
            Resource::Nodes | Resource::Node => "nodes",
            Resource::Partitions => "partitions",
            Resource::Reservations => "reservations",
            Resource::Qos => "qos",
            Resource::Accounts => "accounts",
            Resource::Users => "users",
            Resource::Associations => "associations",
        }
    }

    /// Single item lookups return the first element of the envelope list
    pub fn is_single_item(&self) -> bool {
        matches!(self, Resource::Job | Resource::Node | Resource::AcctJob)
    }

    pub fn is_parameterized(&self) -> bool {
        self.path_template().contains("{}")
    }

    /// Ping is the discovery probe and must always reach the backend
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, Resource::Ping)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.component(), self.name())
    }
}

/// Version independent request for one resource, as issued by callers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRequest {
    pub resource: Resource,
    pub param: Option<String>,
    pub ignore_notfound: bool,
}

impl ResourceRequest {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            param: None,
            ignore_notfound: false,
        }
    }

    pub fn with_param(resource: Resource, param: impl Into<String>) -> Self {
        Self {
            resource,
            param: Some(param.into()),
            ignore_notfound: false,
        }
    }

    /// Let a 404 reach response validation instead of failing early
    pub fn tolerate_not_found(mut self) -> Self {
        self.ignore_notfound = true;
        self
    }

    /// Whether the parameter can stand as one path segment
    ///
    /// Empty and dot segments would address another endpoint once the URL is
    /// normalized, whatever the encoding.
    pub fn is_addressable(&self) -> bool {
        !matches!(self.param.as_deref(), Some("" | "." | ".."))
    }

    /// Bind the request to a negotiated API version
    pub fn at_version(&self, version: &str) -> ResourceQuery {
        ResourceQuery {
            resource: self.resource,
            path: render_path(self.resource, self.param.as_deref()),
            version: version.to_string(),
            ignore_notfound: self.ignore_notfound,
        }
    }
}

/// One logical request to the backend at a concrete API version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceQuery {
    pub resource: Resource,
    pub path: String,
    pub version: String,
    pub ignore_notfound: bool,
}

impl ResourceQuery {
    pub fn component(&self) -> Component {
        self.resource.component()
    }

    pub fn envelope_key(&self) -> &'static str {
        self.resource.envelope_key()
    }

    /// Absolute request path, e.g. `/slurm/v0.0.42/job/42`
    pub fn url_path(&self) -> String {
        format!("/{}/v{}/{}", self.component(), self.version, self.path)
    }
}

fn render_path(resource: Resource, param: Option<&str>) -> String {
    let template = resource.path_template();
    match param {
        Some(param) => template.replacen("{}", &urlencoding::encode(param), 1),
        None => template.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_url_path_rendering() {
        let query = ResourceRequest::new(Resource::Jobs).at_version("0.0.42");
        assert_eq!(query.url_path(), "/slurm/v0.0.42/jobs");

        let query = ResourceRequest::with_param(Resource::AcctJob, "42").at_version("0.0.41");
        assert_eq!(query.url_path(), "/slurmdb/v0.0.41/job/42");
        assert_eq!(query.envelope_key(), "jobs");
    }

    #[test]
    fn test_param_is_encoded_as_one_segment() {
        let query = ResourceRequest::with_param(Resource::Node, "../../slurmdb/v0.0.43/users")
            .at_version("0.0.43");
        assert_eq!(
            query.url_path(),
            "/slurm/v0.0.43/node/..%2F..%2Fslurmdb%2Fv0.0.43%2Fusers"
        );

        let query = ResourceRequest::with_param(Resource::Node, "cn1?x#y").at_version("0.0.43");
        assert_eq!(query.url_path(), "/slurm/v0.0.43/node/cn1%3Fx%23y");
    }

    #[test]
    fn test_dot_segments_are_not_addressable() {
        assert!(ResourceRequest::new(Resource::Nodes).is_addressable());
        assert!(ResourceRequest::with_param(Resource::Node, "cn1").is_addressable());
        for param in ["", ".", ".."] {
            assert!(!ResourceRequest::with_param(Resource::Node, param).is_addressable());
        }
    }

    #[test]
    fn test_components() {
        assert_eq!(Resource::Qos.component(), Component::Slurmdb);
        assert_eq!(Resource::Nodes.component(), Component::Slurm);
        assert_eq!(Resource::Job.to_string(), "slurm/job");
        assert_eq!(Resource::AcctJob.to_string(), "slurmdb/acct-job");
    }

    #[test]
    fn test_single_item_resources_are_parameterized() {
        for resource in Resource::ALL {
            assert_eq!(resource.is_single_item(), resource.is_parameterized());
        }
    }

    #[test]
    fn test_tolerate_not_found_is_carried_to_query() {
        let query = ResourceRequest::with_param(Resource::Job, "7")
            .tolerate_not_found()
            .at_version("0.0.43");
        assert!(query.ignore_notfound);
        assert_eq!(query.path, "job/7");
    }
}
