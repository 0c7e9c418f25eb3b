//! State poller: one list call mapped to instance snapshots.
//!
//! Parsing is lenient: a pod without status or conditions is simply not
//! ready, and entries without a name are skipped.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use kbench_core::{DeclaredInstance, Instance, ManagedResource, ReadyCondition};

use crate::control_plane::ControlPlane;
use crate::error::ClusterResult;

/// Read the current instances of `resource`. Never sleeps.
pub async fn snapshot<C: ControlPlane>(
    cp: &C,
    resource: &ManagedResource,
) -> ClusterResult<Vec<Instance>> {
    let list = cp
        .list_instances(&resource.namespace, &resource.selector)
        .await?;
    Ok(parse_instances(&list, epoch_millis()))
}

/// Map a pod list to instances observed at `observed_at_ms`.
pub fn parse_instances(list: &Value, observed_at_ms: u64) -> Vec<Instance> {
    items(list)
        .filter_map(|item| {
            let identity = item["metadata"]["name"].as_str()?.to_string();
            Some(Instance {
                identity,
                ready: ready_condition(item),
                terminating: !item["metadata"]["deletionTimestamp"].is_null(),
                observed_at_ms,
            })
        })
        .collect()
}

/// Collect the declared container resource requests of each pod.
pub fn declared_resources(list: &Value) -> Vec<DeclaredInstance> {
    items(list)
        .filter_map(|item| {
            let identity = item["metadata"]["name"].as_str()?.to_string();
            let mut declared = DeclaredInstance {
                identity,
                ..Default::default()
            };
            for container in item["spec"]["containers"].as_array().into_iter().flatten() {
                let requests = &container["resources"]["requests"];
                if let Some(cpu) = requests["cpu"].as_str() {
                    declared.cpu_requests.push(cpu.to_string());
                }
                if let Some(memory) = requests["memory"].as_str() {
                    declared.memory_requests.push(memory.to_string());
                }
            }
            Some(declared)
        })
        .collect()
}

fn items(list: &Value) -> impl Iterator<Item = &Value> {
    list["items"].as_array().into_iter().flatten()
}

fn ready_condition(item: &Value) -> ReadyCondition {
    let Some(conditions) = item["status"]["conditions"].as_array() else {
        return ReadyCondition::False;
    };
    conditions
        .iter()
        .find(|c| c["type"] == "Ready")
        .map(|c| match c["status"].as_str() {
            Some("True") => ReadyCondition::True,
            Some("False") => ReadyCondition::False,
            _ => ReadyCondition::Unknown,
        })
        .unwrap_or(ReadyCondition::Unknown)
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
