use anyhow::Context;
use tracing::{info, warn};

use kbench_cluster::{Kubectl, Tunnel, TunnelSpec};
use kbench_core::{BenchConfig, TransitionKind, TrialSet};
use kbench_stats::{SampleSummary, format_trial_report, summarize, write_samples_csv};
use kbench_trial::{ClusterTarget, TokioClock, TrafficSampler, TrialDriver, TrialTiming};

pub async fn run(
    config: &BenchConfig,
    kubectl: &Kubectl,
    namespace: &str,
    service: &str,
    runs: u32,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let resource = super::connect(config, kubectl, namespace, service).await?;
    let run_dir = super::run_directory(config)?;

    let spec = TunnelSpec {
        namespace: namespace.to_string(),
        service: service.to_string(),
        local_port: port.unwrap_or(config.probe.local_port),
        remote_port: config.probe.service_port,
        health_path: config.probe.path.clone(),
    };

    println!(
        "Availability: {} {}/{}, {runs} runs, tunnel {}",
        resource.kind,
        namespace,
        service,
        spec.local_address()
    );

    let driver = TrialDriver::new(
        ClusterTarget::new(kubectl, &resource),
        TokioClock::new(),
        TrialTiming::from_config(&config.poll),
    );
    driver
        .prepare_availability()
        .await
        .with_context(|| format!("{service} never became ready"))?;

    let mut set = TrialSet::new(TransitionKind::Availability, runs);
    let mut traffic = SampleSummary::default();

    for index in 1..=runs {
        // port-forward pins a single pod, so each trial gets a fresh tunnel.
        // Only the first one proves connectivity; later ones may find no
        // serving pod after a timed-out trial.
        let tunnel = match open_tunnel(config, kubectl, &spec).await {
            Ok(tunnel) => Some(tunnel),
            Err(e) if index == 1 => {
                return Err(e).with_context(|| format!("tunnel to svc/{service}"));
            }
            Err(e) => {
                warn!(trial = index, error = %e, "tunnel unavailable, running trial without traffic");
                None
            }
        };

        let sampler = tunnel.as_ref().map(|tunnel| {
            TrafficSampler::start(
                tunnel.address().to_string(),
                spec.health_path.clone(),
                config.probe.sampler_interval(),
                config.probe.timeout(),
            )
        });
        let trial = driver.availability_trial(index).await;
        let rows = match sampler {
            Some(sampler) => sampler.stop().await,
            None => Vec::new(),
        };
        if let Some(tunnel) = tunnel {
            tunnel.close().await;
        }
        let trial = trial.with_context(|| format!("availability trial {index} aborted"))?;

        write_samples_csv(&run_dir.availability_csv(service, index), &rows)?;

        let observed = SampleSummary::from_samples(&rows);
        println!("  trial {index}: {} ({})", trial.outcome, observed.describe());
        traffic.merge(&observed);
        set.push(trial);

        if index < runs {
            driver.pause_between_trials().await;
        }
    }

    let summary = summarize(set);
    let mut report = format_trial_report(service, &summary);
    report.push_str(&format!("traffic: {}\n", traffic.describe()));
    println!();
    print!("{report}");

    let path = run_dir.availability_report(service);
    run_dir.write(&path, &report)?;
    info!(path = %path.display(), "availability summary written");
    println!("✓ Wrote {}", path.display());

    Ok(())
}

async fn open_tunnel(
    config: &BenchConfig,
    kubectl: &Kubectl,
    spec: &TunnelSpec,
) -> anyhow::Result<Tunnel> {
    Ok(Tunnel::open(
        kubectl,
        spec,
        config.probe.timeout(),
        config.probe.tunnel_ready_timeout(),
    )
    .await?)
}
