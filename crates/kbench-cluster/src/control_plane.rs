//! Control-plane access.
//!
//! `ControlPlane` is the seam between trial logic and the orchestrator.
//! `Kubectl` implements it by spawning the `kubectl` binary and reading
//! its JSON output; tests implement it with canned responses.

use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ClusterError, ClusterResult};
use crate::scale::ReplicaPatch;

/// Options for deleting a single instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOptions {
    pub force: bool,
    pub grace_period_secs: u32,
}

impl DeleteOptions {
    /// Immediate removal: no graceful shutdown window.
    pub fn forced() -> Self {
        Self {
            force: true,
            grace_period_secs: 0,
        }
    }
}

/// Query and mutate operations the harness needs from the orchestrator.
#[allow(async_fn_in_trait)]
pub trait ControlPlane {
    /// Fetch one object. `Ok(None)` when it does not exist.
    async fn get_resource(
        &self,
        resource: &str,
        name: &str,
        namespace: &str,
    ) -> ClusterResult<Option<Value>>;

    /// List the instances matching `selector` as a raw JSON list.
    async fn list_instances(&self, namespace: &str, selector: &str) -> ClusterResult<Value>;

    /// Apply a replica-count patch. Returns once the API accepted it.
    async fn patch_replicas(&self, patch: &ReplicaPatch) -> ClusterResult<()>;

    async fn delete_instance(
        &self,
        namespace: &str,
        name: &str,
        options: DeleteOptions,
    ) -> ClusterResult<()>;

    /// Block until every instance matching `selector` meets `condition`.
    /// `Ok(false)` when the timeout elapsed first.
    async fn wait_condition(
        &self,
        namespace: &str,
        selector: &str,
        condition: &str,
        timeout: Duration,
    ) -> ClusterResult<bool>;
}

/// `ControlPlane` backed by the `kubectl` CLI.
#[derive(Debug, Clone)]
pub struct Kubectl {
    program: String,
}

impl Default for Kubectl {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

impl Kubectl {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Confirm the cluster answers and the namespace exists.
    pub async fn check_namespace(&self, namespace: &str) -> ClusterResult<()> {
        let args = vec![
            "get".to_string(),
            "namespace".to_string(),
            namespace.to_string(),
            "-o".to_string(),
            "name".to_string(),
        ];
        self.run(&args).await.map(|_| ())
    }

    /// Run kubectl with `args`, returning stdout on success.
    async fn run(&self, args: &[String]) -> ClusterResult<Vec<u8>> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!(%command, "running kubectl");

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ClusterError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ClusterError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

impl ControlPlane for Kubectl {
    async fn get_resource(
        &self,
        resource: &str,
        name: &str,
        namespace: &str,
    ) -> ClusterResult<Option<Value>> {
        match self.run(&get_args(resource, name, namespace)).await {
            Ok(stdout) => Ok(Some(serde_json::from_slice(&stdout)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_instances(&self, namespace: &str, selector: &str) -> ClusterResult<Value> {
        let stdout = self.run(&list_args(namespace, selector)).await?;
        Ok(serde_json::from_slice(&stdout)?)
    }

    async fn patch_replicas(&self, patch: &ReplicaPatch) -> ClusterResult<()> {
        self.run(&patch_args(patch)).await.map(|_| ())
    }

    async fn delete_instance(
        &self,
        namespace: &str,
        name: &str,
        options: DeleteOptions,
    ) -> ClusterResult<()> {
        self.run(&delete_args(namespace, name, options))
            .await
            .map(|_| ())
    }

    async fn wait_condition(
        &self,
        namespace: &str,
        selector: &str,
        condition: &str,
        timeout: Duration,
    ) -> ClusterResult<bool> {
        match self
            .run(&wait_args(namespace, selector, condition, timeout))
            .await
        {
            Ok(_) => Ok(true),
            Err(ClusterError::CommandFailed { stderr, .. }) if stderr.contains("timed out") => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

fn get_args(resource: &str, name: &str, namespace: &str) -> Vec<String> {
    ["get", resource, name, "-n", namespace, "-o", "json"]
        .iter()
        .map(|a| a.to_string())
        .collect()
}

fn list_args(namespace: &str, selector: &str) -> Vec<String> {
    vec![
        "get".to_string(),
        "pods".to_string(),
        "-n".to_string(),
        namespace.to_string(),
        "-l".to_string(),
        selector.to_string(),
        "-o".to_string(),
        "json".to_string(),
    ]
}

fn patch_args(patch: &ReplicaPatch) -> Vec<String> {
    let mut args = vec![
        "patch".to_string(),
        patch.target.clone(),
        "-n".to_string(),
        patch.namespace.clone(),
        "--type".to_string(),
        "merge".to_string(),
        "-p".to_string(),
        patch.body.to_string(),
    ];
    if let Some(sub) = patch.subresource {
        args.push(format!("--subresource={sub}"));
    }
    args
}

fn delete_args(namespace: &str, name: &str, options: DeleteOptions) -> Vec<String> {
    let mut args = vec![
        "delete".to_string(),
        "pod".to_string(),
        name.to_string(),
        "-n".to_string(),
        namespace.to_string(),
        format!("--grace-period={}", options.grace_period_secs),
        "--wait=false".to_string(),
    ];
    if options.force {
        args.push("--force".to_string());
    }
    args
}

fn wait_args(namespace: &str, selector: &str, condition: &str, timeout: Duration) -> Vec<String> {
    vec![
        "wait".to_string(),
        format!("--for=condition={condition}"),
        "pod".to_string(),
        "-l".to_string(),
        selector.to_string(),
        "-n".to_string(),
        namespace.to_string(),
        format!("--timeout={}s", timeout.as_secs().max(1)),
    ]
}
