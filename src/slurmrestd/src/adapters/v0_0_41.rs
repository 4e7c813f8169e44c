//! 0.0.41 to 0.0.42

use super::{default_field, for_each_record, Adapter};
use serde_json::{json, Map, Value};

/// Brings 0.0.41 payloads to the 0.0.42 schema
#[derive(Debug, Clone, Copy, Default)]
pub struct AdapterV0_0_41;

/// Expanded standard stream paths appeared in 0.0.42, filled from the raw paths
fn expand_streams(record: &mut Map<String, Value>, sources: [(&str, &str); 3]) {
    for (expanded, source) in sources {
        if record.contains_key(expanded) {
            continue;
        }
        let value = record.get(source).cloned().unwrap_or_else(|| json!(""));
        record.insert(expanded.to_string(), value);
    }
}

impl Adapter for AdapterV0_0_41 {
    fn version(&self) -> &str {
        "0.0.41"
    }

    fn slurm_jobs(&self, payload: &mut Value) {
        for_each_record(payload, |job| {
            expand_streams(
                job,
                [
                    ("stdin_expanded", "standard_input"),
                    ("stdout_expanded", "standard_output"),
                    ("stderr_expanded", "standard_error"),
                ],
            )
        });
    }

    fn slurmdb_jobs(&self, payload: &mut Value) {
        for_each_record(payload, |job| {
            expand_streams(
                job,
                [
                    ("stdin_expanded", "stdin"),
                    ("stdout_expanded", "stdout"),
                    ("stderr_expanded", "stderr"),
                ],
            )
        });
    }

    fn slurm_nodes(&self, payload: &mut Value) {
        for_each_record(payload, |node| {
            default_field(node, "gpu_spec", json!(""));
            default_field(node, "res_cores_per_gpu", json!(0));
        });
    }
}
