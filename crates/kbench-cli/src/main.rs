//! kbench — transition-timing benchmarks against a live cluster.
//!
//! # Usage
//!
//! ```text
//! kbench cold-start bench api-spin 10
//! kbench availability bench api-axum 5 8081
//! kbench footprint bench api-spin api-axum
//! kbench compare-load axum.json spin.json
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::warn;

use kbench_cluster::Kubectl;
use kbench_core::BenchConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "kbench",
    about = "Cold-start, recovery and footprint benchmarks for Kubernetes workloads",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to kbench.toml. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root directory for result files.
    #[arg(long, global = true)]
    results_dir: Option<PathBuf>,

    /// Poll interval in milliseconds (100-1000).
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    /// kubectl binary to invoke.
    #[arg(long, global = true)]
    kubectl: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Time scale 0 -> 1 until the first instance is ready.
    ColdStart {
        namespace: String,
        service: String,
        #[arg(default_value = "10")]
        runs: u32,
    },
    /// Time force-delete -> ready replacement, sampling traffic through a tunnel.
    Availability {
        namespace: String,
        service: String,
        #[arg(default_value = "5")]
        runs: u32,
        /// Local port for the port-forward tunnel.
        port: Option<u16>,
    },
    /// Project instance density from declared resource requests.
    Footprint {
        namespace: String,
        #[arg(required = true)]
        services: Vec<String>,
    },
    /// Compare two load-generator JSON summaries.
    CompareLoad {
        baseline: PathBuf,
        candidate: PathBuf,
    },
    /// Print the load-generator command for the configured profile.
    LoadArgs {
        /// Override the configured target URL.
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kbench=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, stopping run");
            anyhow::bail!("interrupted")
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let kubectl = cli
        .kubectl
        .as_deref()
        .map(Kubectl::new)
        .unwrap_or_default();

    match cli.command {
        Commands::ColdStart {
            namespace,
            service,
            runs,
        } => commands::cold_start::run(&config, &kubectl, &namespace, &service, runs).await,
        Commands::Availability {
            namespace,
            service,
            runs,
            port,
        } => {
            commands::availability::run(&config, &kubectl, &namespace, &service, runs, port).await
        }
        Commands::Footprint {
            namespace,
            services,
        } => commands::footprint::run(&config, &kubectl, &namespace, &services).await,
        Commands::CompareLoad {
            baseline,
            candidate,
        } => commands::compare::run(&config, &baseline, &candidate),
        Commands::LoadArgs { url } => commands::compare::print_load_args(&config, url),
    }
}

/// Read the config file, apply flag overrides, then validate the result.
fn load_config(cli: &Cli) -> anyhow::Result<BenchConfig> {
    let mut config = BenchConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.results_dir {
        config.output.results_dir = dir.display().to_string();
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.poll.interval_ms = interval_ms;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kbench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cold_start_runs_default_to_ten() {
        let cli = parse(&["cold-start", "bench", "api"]);
        match cli.command {
            Commands::ColdStart { runs, service, .. } => {
                assert_eq!(runs, 10);
                assert_eq!(service, "api");
            }
            _ => panic!("expected cold-start"),
        }
    }

    #[test]
    fn availability_takes_runs_and_port() {
        let cli = parse(&["availability", "bench", "api", "3", "9090"]);
        match cli.command {
            Commands::Availability { runs, port, .. } => {
                assert_eq!(runs, 3);
                assert_eq!(port, Some(9090));
            }
            _ => panic!("expected availability"),
        }
    }

    #[test]
    fn footprint_requires_a_service() {
        let err = Cli::try_parse_from(["kbench", "footprint", "bench"]);
        assert!(err.is_err());
    }

    #[test]
    fn flags_override_config() {
        let cli = parse(&[
            "--interval-ms",
            "250",
            "--results-dir",
            "/tmp/out",
            "cold-start",
            "bench",
            "api",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.poll.interval_ms, 250);
        assert_eq!(config.output.results_dir, "/tmp/out");
    }

    #[test]
    fn out_of_range_interval_is_a_setup_error() {
        let cli = parse(&["cold-start", "bench", "api", "--interval-ms", "50"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kbench.toml");
        std::fs::write(&path, "[poll]\ninterval_ms = 500\n\n[probe]\nlocal_port = 9000\n")
            .unwrap();

        let cli = parse(&["--config", path.to_str().unwrap(), "footprint", "bench", "api"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.poll.interval_ms, 500);
        assert_eq!(config.probe.local_port, 9000);
        assert_eq!(config.poll.max_polls, 600);
    }
}
