//! 0.0.42 to 0.0.43

use super::{default_field, for_each_record, Adapter};
use serde_json::{json, Value};

/// Brings 0.0.42 payloads to the 0.0.43 schema
#[derive(Debug, Clone, Copy, Default)]
pub struct AdapterV0_0_42;

impl Adapter for AdapterV0_0_42 {
    fn version(&self) -> &str {
        "0.0.42"
    }

    fn slurm_reservations(&self, payload: &mut Value) {
        for_each_record(payload, |reservation| {
            default_field(
                reservation,
                "purge_completed",
                json!({"time": {"set": false, "infinite": false, "number": 0}}),
            );
        });
    }

    fn slurm_nodes(&self, payload: &mut Value) {
        for_each_record(payload, |node| default_field(node, "cert_flags", json!([])));
    }

    fn slurm_partitions(&self, payload: &mut Value) {
        for_each_record(payload, |partition| {
            default_field(partition, "topology", json!(""))
        });
    }

    fn slurmdb_associations(&self, payload: &mut Value) {
        for_each_record(payload, |association| {
            default_field(association, "comment", json!(""))
        });
    }
}
