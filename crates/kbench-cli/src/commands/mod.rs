pub mod availability;
pub mod cold_start;
pub mod compare;
pub mod footprint;

use std::path::Path;

use anyhow::Context;

use kbench_cluster::{Kubectl, detect};
use kbench_core::{BenchConfig, ManagedResource};
use kbench_stats::RunDirectory;

/// Confirm the namespace answers, then find what owns `service`.
///
/// Any failure here is a setup error and ends the run.
pub async fn connect(
    config: &BenchConfig,
    kubectl: &Kubectl,
    namespace: &str,
    service: &str,
) -> anyhow::Result<ManagedResource> {
    kubectl
        .check_namespace(namespace)
        .await
        .with_context(|| format!("cannot reach namespace {namespace} via {}", kubectl.program()))?;
    Ok(detect(kubectl, namespace, service, &config.detect).await)
}

/// Create this invocation's timestamped results directory.
pub fn run_directory(config: &BenchConfig) -> anyhow::Result<RunDirectory> {
    RunDirectory::create(Path::new(&config.output.results_dir), chrono::Local::now())
}
