//! Scale controller: declarative replica-count changes.
//!
//! Only the replica field is touched, so repeating a patch is harmless.
//! Deployments are scaled through their `scale` subresource; SpinApps do
//! not expose one reliably, so their `spec.replicas` is patched directly.

use serde_json::{Value, json};
use tracing::info;

use kbench_core::{ManagedResource, ResourceKind};

use crate::control_plane::ControlPlane;
use crate::error::ClusterResult;

/// A replica patch shaped for one resource kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicaPatch {
    /// `<resource>/<name>` argument, e.g. `deployment/api`.
    pub target: String,
    pub namespace: String,
    pub subresource: Option<&'static str>,
    pub body: Value,
}

impl ReplicaPatch {
    pub fn for_kind(kind: ResourceKind, name: &str, namespace: &str, replicas: u32) -> Self {
        let (resource, subresource) = match kind {
            ResourceKind::Deployment => ("deployment", Some("scale")),
            ResourceKind::SpinApp => ("spinapp", None),
        };
        Self {
            target: format!("{resource}/{name}"),
            namespace: namespace.to_string(),
            subresource,
            body: json!({ "spec": { "replicas": replicas } }),
        }
    }

    pub fn for_resource(resource: &ManagedResource, replicas: u32) -> Self {
        Self::for_kind(resource.kind, &resource.name, &resource.namespace, replicas)
    }
}

/// Ask the control plane to run `replicas` instances of `resource`.
///
/// Returns as soon as the request is accepted; convergence is the
/// caller's business.
pub async fn set_replicas<C: ControlPlane>(
    cp: &C,
    resource: &ManagedResource,
    replicas: u32,
) -> ClusterResult<()> {
    let patch = ReplicaPatch::for_resource(resource, replicas);
    cp.patch_replicas(&patch).await?;
    info!(
        kind = %resource.kind,
        name = %resource.name,
        replicas,
        "replica count requested"
    );
    Ok(())
}
