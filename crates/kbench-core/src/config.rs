//! kbench.toml configuration parser.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults the harness was tuned with.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub poll: PollConfig,
    pub detect: DetectConfig,
    pub probe: ProbeConfig,
    pub output: OutputConfig,
    pub footprint: FootprintConfig,
    pub load: LoadConfig,
}

/// Poll cadence and budgets for every waiting phase of a trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub max_polls: u32,
    pub drain_interval_ms: u64,
    pub drain_max_polls: u32,
    pub stabilize_interval_ms: u64,
    pub stabilize_max_polls: u32,
    /// Pause between consecutive trials.
    pub trial_gap_ms: u64,
    /// Readiness wait before an availability series.
    pub ready_wait_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            max_polls: 600,
            drain_interval_ms: 500,
            drain_max_polls: 120,
            stabilize_interval_ms: 500,
            stabilize_max_polls: 120,
            trial_gap_ms: 2000,
            ready_wait_secs: 120,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }

    pub fn stabilize_interval(&self) -> Duration {
        Duration::from_millis(self.stabilize_interval_ms)
    }

    pub fn trial_gap(&self) -> Duration {
        Duration::from_millis(self.trial_gap_ms)
    }

    pub fn ready_wait(&self) -> Duration {
        Duration::from_secs(self.ready_wait_secs)
    }
}

/// How the detector recognises the managed resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// Resource argument queried first, e.g. `spinapp`.
    pub custom_resource: String,
    pub custom_selector_label: String,
    pub fallback_selector_label: String,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            custom_resource: "spinapp".to_string(),
            custom_selector_label: "core.spinkube.dev/app-name".to_string(),
            fallback_selector_label: "app".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub path: String,
    pub timeout_ms: u64,
    pub tunnel_ready_timeout_ms: u64,
    /// Port of the Kubernetes Service the tunnel forwards to.
    pub service_port: u16,
    pub local_port: u16,
    pub sampler_interval_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            path: "/healthz".to_string(),
            timeout_ms: 2000,
            tunnel_ready_timeout_ms: 10_000,
            service_port: 80,
            local_port: 8080,
            sampler_interval_ms: 50,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn tunnel_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.tunnel_ready_timeout_ms)
    }

    pub fn sampler_interval(&self) -> Duration {
        Duration::from_millis(self.sampler_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub results_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: "results".to_string(),
        }
    }
}

/// Node budget used to project instance density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootprintConfig {
    pub cpu_budget_millis: u64,
    pub memory_budget_mib: u64,
}

impl Default for FootprintConfig {
    fn default() -> Self {
        Self {
            cpu_budget_millis: 4000,
            memory_budget_mib: 8192,
        }
    }
}

/// Settings handed to the external load generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub target_url: String,
    pub duration_secs: u64,
    pub concurrency: u32,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            target_url: "http://127.0.0.1:8080/".to_string(),
            duration_secs: 30,
            concurrency: 50,
        }
    }
}

impl BenchConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BenchConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject settings the measurement model cannot honour.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(100..=1000).contains(&self.poll.interval_ms) {
            anyhow::bail!(
                "poll.interval_ms must be within 100..=1000, got {}",
                self.poll.interval_ms
            );
        }
        if self.poll.max_polls == 0 {
            anyhow::bail!("poll.max_polls must be at least 1");
        }
        if self.poll.drain_max_polls == 0 || self.poll.stabilize_max_polls == 0 {
            anyhow::bail!("drain and stabilize poll budgets must be at least 1");
        }
        if self.probe.sampler_interval_ms == 0 {
            anyhow::bail!("probe.sampler_interval_ms must be positive");
        }
        if !self.probe.path.starts_with('/') {
            anyhow::bail!("probe.path must start with '/', got {:?}", self.probe.path);
        }
        Ok(())
    }
}
