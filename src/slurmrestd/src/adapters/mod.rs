//! Schema adapters
//!
//! An adapter carries the payloads of one API version forward by exactly one
//! version step. Chained from the negotiated version up to the target
//! version, they let the rest of the system read a single canonical schema.
//!
//! Adapters only add fields, and only when absent, so applying one twice is
//! the same as applying it once.

mod v0_0_41;
mod v0_0_42;

pub use v0_0_41::AdapterV0_0_41;
pub use v0_0_42::AdapterV0_0_42;

use crate::error::{SlurmrestdError, SlurmrestdResult};
use serde_json::{Map, Value};
use slurmgate_shared::{Component, SupportedVersions};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One version step, with a hook per (component, envelope key)
///
/// Every hook defaults to leaving the payload untouched.
pub trait Adapter: Send + Sync + fmt::Debug {
    /// Version this step starts from
    fn version(&self) -> &str;

    fn slurm_diag(&self, _payload: &mut Value) {}

    fn slurm_jobs(&self, _payload: &mut Value) {}

    fn slurm_nodes(&self, _payload: &mut Value) {}

    fn slurm_partitions(&self, _payload: &mut Value) {}

    fn slurm_reservations(&self, _payload: &mut Value) {}

    fn slurmdb_jobs(&self, _payload: &mut Value) {}

    fn slurmdb_qos(&self, _payload: &mut Value) {}

    fn slurmdb_accounts(&self, _payload: &mut Value) {}

    fn slurmdb_users(&self, _payload: &mut Value) {}

    fn slurmdb_associations(&self, _payload: &mut Value) {}

    /// Dispatch a payload to the hook registered for its component and key
    fn adapt(&self, component: Component, key: &str, payload: &mut Value) {
        match (component, key) {
            (Component::Slurm, "statistics") => self.slurm_diag(payload),
            (Component::Slurm, "jobs") => self.slurm_jobs(payload),
            (Component::Slurm, "nodes") => self.slurm_nodes(payload),
            (Component::Slurm, "partitions") => self.slurm_partitions(payload),
            (Component::Slurm, "reservations") => self.slurm_reservations(payload),
            (Component::Slurmdb, "jobs") => self.slurmdb_jobs(payload),
            (Component::Slurmdb, "qos") => self.slurmdb_qos(payload),
            (Component::Slurmdb, "accounts") => self.slurmdb_accounts(payload),
            (Component::Slurmdb, "users") => self.slurmdb_users(payload),
            (Component::Slurmdb, "associations") => self.slurmdb_associations(payload),
            _ => {}
        }
    }
}

/// Step with no schema change
#[derive(Debug, Clone)]
pub struct IdentityAdapter {
    version: String,
}

impl IdentityAdapter {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl Adapter for IdentityAdapter {
    fn version(&self) -> &str {
        &self.version
    }
}

/// Adapters by starting version
#[derive(Debug, Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    pub fn register(&mut self, adapter: Arc<dyn Adapter>) {
        self.adapters.insert(adapter.version().to_string(), adapter);
    }

    /// Adapter starting at `version`, identity when none is registered
    pub fn get(&self, version: &str) -> Arc<dyn Adapter> {
        self.adapters
            .get(version)
            .cloned()
            .unwrap_or_else(|| Arc::new(IdentityAdapter::new(version)))
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(AdapterV0_0_41));
        registry.register(Arc::new(AdapterV0_0_42));
        registry
    }
}

/// Ordered adapters from a negotiated version up to the target version
#[derive(Debug, Clone, Default)]
pub struct AdapterChain {
    steps: Vec<Arc<dyn Adapter>>,
}

impl AdapterChain {
    /// Apply every step in order, each one feeding the next
    pub fn apply(&self, component: Component, key: &str, payload: &mut Value) {
        for step in &self.steps {
            step.adapt(component, key, payload);
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Starting versions of the steps, in application order
    pub fn versions(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.version()).collect()
    }
}

/// Chain adapting payloads of `from` up to `to`
///
/// One step per version from `from` (inclusive) to `to` (exclusive) in
/// ascending order; empty when `from` is already at or past `to`.
pub fn build_chain(
    from: &str,
    to: &str,
    versions: &SupportedVersions,
    registry: &AdapterRegistry,
) -> SlurmrestdResult<AdapterChain> {
    let from_index = versions
        .ascending_index(from)
        .map_err(|e| SlurmrestdError::configuration(e.to_string()))?;
    let to_index = versions
        .ascending_index(to)
        .map_err(|e| SlurmrestdError::configuration(e.to_string()))?;

    if from_index >= to_index {
        return Ok(AdapterChain::default());
    }

    let ascending = versions.ascending();
    let steps = ascending[from_index..to_index]
        .iter()
        .map(|version| registry.get(version))
        .collect();
    Ok(AdapterChain { steps })
}

/// Run `f` on every record of a payload, a list of records or a single one
pub(crate) fn for_each_record<F>(payload: &mut Value, mut f: F)
where
    F: FnMut(&mut Map<String, Value>),
{
    match payload {
        Value::Array(items) => {
            for item in items.iter_mut() {
                if let Value::Object(record) = item {
                    f(record);
                }
            }
        }
        Value::Object(record) => f(record),
        _ => {}
    }
}

/// Insert `key` with `default` unless already present
pub(crate) fn default_field(record: &mut Map<String, Value>, key: &str, default: Value) {
    record.entry(key.to_string()).or_insert(default);
}
