//! Resource-type detector.
//!
//! Asks once for the custom scalable resource. Any error from that query,
//! not just NotFound, falls through to the Deployment default.

use tracing::{info, warn};

use kbench_core::config::DetectConfig;
use kbench_core::{ManagedResource, ResourceKind};

use crate::control_plane::ControlPlane;

/// Identify which kind manages `name` and build its instance selector.
pub async fn detect<C: ControlPlane>(
    cp: &C,
    namespace: &str,
    name: &str,
    config: &DetectConfig,
) -> ManagedResource {
    let found = match cp
        .get_resource(&config.custom_resource, name, namespace)
        .await
    {
        Ok(found) => found.is_some(),
        Err(e) => {
            warn!(
                resource = %config.custom_resource,
                %name,
                error = %e,
                "custom resource query failed, assuming absent"
            );
            false
        }
    };

    let (kind, label) = if found {
        (ResourceKind::SpinApp, &config.custom_selector_label)
    } else {
        (ResourceKind::Deployment, &config.fallback_selector_label)
    };

    let resource = ManagedResource {
        kind,
        name: name.to_string(),
        namespace: namespace.to_string(),
        selector: format!("{label}={name}"),
    };
    info!(
        kind = %resource.kind,
        %namespace,
        %name,
        selector = %resource.selector,
        "managed resource detected"
    );
    resource
}
