use anyhow::Context;

use kbench_cluster::{ControlPlane, Kubectl, declared_resources};
use kbench_core::BenchConfig;
use kbench_stats::{format_footprint_report, measure_footprint, project_density};

pub async fn run(
    config: &BenchConfig,
    kubectl: &Kubectl,
    namespace: &str,
    services: &[String],
) -> anyhow::Result<()> {
    let mut rows = Vec::with_capacity(services.len());

    for service in services {
        let resource = super::connect(config, kubectl, namespace, service).await?;
        let list = kubectl
            .list_instances(&resource.namespace, &resource.selector)
            .await
            .with_context(|| format!("failed to list instances of {service}"))?;
        let declared = declared_resources(&list);
        if declared.is_empty() {
            println!("⚠️  {service}: no running instances, nothing declared");
        }

        let footprint = measure_footprint(&declared)
            .with_context(|| format!("bad resource request on {service}"))?;
        let density = project_density(&footprint, &config.footprint);
        rows.push((service.clone(), footprint, density));
    }

    let mut report = format!(
        "Node budget: {} m CPU, {} MiB memory\n\n",
        config.footprint.cpu_budget_millis, config.footprint.memory_budget_mib
    );
    report.push_str(&format_footprint_report(&rows));
    print!("{report}");

    let run_dir = super::run_directory(config)?;
    let path = run_dir.footprint_report();
    run_dir.write(&path, &report)?;
    println!("✓ Wrote {}", path.display());

    Ok(())
}
