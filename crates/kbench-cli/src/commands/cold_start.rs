use anyhow::Context;
use tracing::info;

use kbench_cluster::Kubectl;
use kbench_core::{BenchConfig, TransitionKind};
use kbench_stats::{format_trial_report, summarize};
use kbench_trial::{ClusterTarget, TokioClock, TrialDriver, TrialTiming};

pub async fn run(
    config: &BenchConfig,
    kubectl: &Kubectl,
    namespace: &str,
    service: &str,
    runs: u32,
) -> anyhow::Result<()> {
    let resource = super::connect(config, kubectl, namespace, service).await?;
    let run_dir = super::run_directory(config)?;

    println!(
        "Cold start: {} {}/{}, {runs} runs, polling every {} ms",
        resource.kind, namespace, service, config.poll.interval_ms
    );

    let driver = TrialDriver::new(
        ClusterTarget::new(kubectl, &resource),
        TokioClock::new(),
        TrialTiming::from_config(&config.poll),
    );
    let set = driver
        .run_series(TransitionKind::ColdStart, runs)
        .await
        .with_context(|| format!("cold-start run against {service} aborted"))?;

    let summary = summarize(set);
    let report = format_trial_report(service, &summary);
    println!();
    print!("{report}");

    let path = run_dir.cold_start_report(service);
    run_dir.write(&path, &report)?;
    info!(path = %path.display(), "cold-start summary written");
    println!("✓ Wrote {}", path.display());

    Ok(())
}
