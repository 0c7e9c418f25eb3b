//! The resource a trial acts on.

use std::time::Duration;

use kbench_cluster::{ClusterResult, ControlPlane, DeleteOptions};
use kbench_core::{Instance, ManagedResource};

/// Operations the driver performs on one managed resource.
#[allow(async_fn_in_trait)]
pub trait TrialTarget {
    /// One read of the current instances.
    async fn snapshot(&self) -> ClusterResult<Vec<Instance>>;

    async fn set_replicas(&self, replicas: u32) -> ClusterResult<()>;

    /// Delete one instance immediately, skipping graceful shutdown.
    async fn force_delete(&self, identity: &str) -> ClusterResult<()>;

    /// Wait until every instance reports Ready. `Ok(false)` on timeout.
    async fn wait_ready(&self, timeout: Duration) -> ClusterResult<bool>;
}

/// A detected resource reached through a control plane.
#[derive(Debug)]
pub struct ClusterTarget<'a, C> {
    cp: &'a C,
    resource: &'a ManagedResource,
}

impl<'a, C: ControlPlane> ClusterTarget<'a, C> {
    pub fn new(cp: &'a C, resource: &'a ManagedResource) -> Self {
        Self { cp, resource }
    }

    pub fn resource(&self) -> &ManagedResource {
        self.resource
    }
}

impl<C: ControlPlane> TrialTarget for ClusterTarget<'_, C> {
    async fn snapshot(&self) -> ClusterResult<Vec<Instance>> {
        kbench_cluster::snapshot(self.cp, self.resource).await
    }

    async fn set_replicas(&self, replicas: u32) -> ClusterResult<()> {
        kbench_cluster::set_replicas(self.cp, self.resource, replicas).await
    }

    async fn force_delete(&self, identity: &str) -> ClusterResult<()> {
        self.cp
            .delete_instance(&self.resource.namespace, identity, DeleteOptions::forced())
            .await
    }

    async fn wait_ready(&self, timeout: Duration) -> ClusterResult<bool> {
        self.cp
            .wait_condition(
                &self.resource.namespace,
                &self.resource.selector,
                "Ready",
                timeout,
            )
            .await
    }
}
