//! Load-generator surface and summary comparison.
//!
//! Load is produced by an external tool (`oha`). This module only renders
//! its arguments and reads back its JSON summary.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use kbench_core::config::LoadConfig;

/// What to hit, for how long, and how hard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadProfile {
    pub target_url: String,
    pub duration_secs: u64,
    pub concurrency: u32,
}

impl From<&LoadConfig> for LoadProfile {
    fn from(config: &LoadConfig) -> Self {
        Self {
            target_url: config.target_url.clone(),
            duration_secs: config.duration_secs,
            concurrency: config.concurrency,
        }
    }
}

impl LoadProfile {
    /// Argument vector for `oha` producing a JSON summary on stdout.
    pub fn oha_args(&self) -> Vec<String> {
        vec![
            "-z".to_string(),
            format!("{}s", self.duration_secs),
            "-c".to_string(),
            self.concurrency.to_string(),
            "--no-tui".to_string(),
            "--output-format".to_string(),
            "json".to_string(),
            self.target_url.clone(),
        ]
    }
}

/// Rate and latency percentiles of one load run. Latencies in ms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadSummary {
    pub requests_per_sec: f64,
    pub success_rate: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p99_ms: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OhaReport {
    summary: OhaSummary,
    latency_percentiles: OhaPercentiles,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OhaSummary {
    requests_per_sec: f64,
    #[serde(default = "full_success")]
    success_rate: f64,
}

#[derive(Deserialize)]
struct OhaPercentiles {
    p50: Option<f64>,
    p90: Option<f64>,
    p99: Option<f64>,
}

fn full_success() -> f64 {
    1.0
}

impl LoadSummary {
    /// Parse an `oha` JSON report. Percentiles are reported in seconds.
    pub fn from_oha_json(json: &str) -> anyhow::Result<Self> {
        let report: OhaReport = serde_json::from_str(json).context("not an oha JSON report")?;
        let ms = |v: Option<f64>| v.unwrap_or(f64::NAN) * 1000.0;
        Ok(Self {
            requests_per_sec: report.summary.requests_per_sec,
            success_rate: report.summary.success_rate,
            p50_ms: ms(report.latency_percentiles.p50),
            p90_ms: ms(report.latency_percentiles.p90),
            p99_ms: ms(report.latency_percentiles.p99),
        })
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_oha_json(&content).with_context(|| format!("in {}", path.display()))
    }
}

/// Candidate relative to baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadComparison {
    pub baseline: LoadSummary,
    pub candidate: LoadSummary,
    /// Positive when the candidate serves more requests per second.
    pub rps_change_pct: f64,
    pub p50_delta_ms: f64,
    pub p90_delta_ms: f64,
    pub p99_delta_ms: f64,
}

impl LoadComparison {
    pub fn compare(baseline: LoadSummary, candidate: LoadSummary) -> Self {
        let rps_change_pct = if baseline.requests_per_sec > 0.0 {
            (candidate.requests_per_sec - baseline.requests_per_sec) / baseline.requests_per_sec
                * 100.0
        } else {
            f64::NAN
        };
        Self {
            baseline,
            candidate,
            rps_change_pct,
            p50_delta_ms: candidate.p50_ms - baseline.p50_ms,
            p90_delta_ms: candidate.p90_ms - baseline.p90_ms,
            p99_delta_ms: candidate.p99_ms - baseline.p99_ms,
        }
    }

    pub fn format(&self, baseline_label: &str, candidate_label: &str) -> String {
        let b = &self.baseline;
        let c = &self.candidate;
        let mut out = String::new();
        out.push_str(&format!(
            "{:<10} {:>14} {:>14} {:>12}\n",
            "metric", baseline_label, candidate_label, "delta"
        ));
        out.push_str(&format!(
            "{:<10} {:>14.1} {:>14.1} {:>11.1}%\n",
            "req/s", b.requests_per_sec, c.requests_per_sec, self.rps_change_pct
        ));
        for (name, bv, cv, delta) in [
            ("p50 ms", b.p50_ms, c.p50_ms, self.p50_delta_ms),
            ("p90 ms", b.p90_ms, c.p90_ms, self.p90_delta_ms),
            ("p99 ms", b.p99_ms, c.p99_ms, self.p99_delta_ms),
        ] {
            out.push_str(&format!("{name:<10} {bv:>14.2} {cv:>14.2} {delta:>+12.2}\n"));
        }
        out.push_str(&format!(
            "{:<10} {:>13.1}% {:>13.1}%\n",
            "success",
            b.success_rate * 100.0,
            c.success_rate * 100.0
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OHA: &str = r#"{
        "summary": {
            "successRate": 0.99,
            "total": 30.0,
            "requestsPerSec": 2000.0
        },
        "latencyPercentiles": {
            "p10": 0.001,
            "p50": 0.002,
            "p90": 0.005,
            "p99": 0.012
        }
    }"#;

    #[test]
    fn parses_oha_report_in_milliseconds() {
        let summary = LoadSummary::from_oha_json(OHA).unwrap();
        assert_eq!(summary.requests_per_sec, 2000.0);
        assert_eq!(summary.success_rate, 0.99);
        assert!((summary.p50_ms - 2.0).abs() < 1e-9);
        assert!((summary.p99_ms - 12.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_unrelated_json() {
        assert!(LoadSummary::from_oha_json(r#"{"hello": 1}"#).is_err());
    }

    #[test]
    fn comparison_reports_relative_rate_and_latency_deltas() {
        let baseline = LoadSummary::from_oha_json(OHA).unwrap();
        let candidate = LoadSummary {
            requests_per_sec: 2500.0,
            p50_ms: 1.5,
            ..baseline
        };
        let cmp = LoadComparison::compare(baseline, candidate);

        assert!((cmp.rps_change_pct - 25.0).abs() < 1e-9);
        assert!((cmp.p50_delta_ms + 0.5).abs() < 1e-9);
        assert_eq!(cmp.p99_delta_ms, 0.0);

        let text = cmp.format("axum", "spin");
        assert!(text.contains("axum"));
        assert!(text.contains("25.0%"));
    }

    #[test]
    fn profile_renders_oha_arguments() {
        let profile = LoadProfile::from(&LoadConfig::default());
        let args = profile.oha_args();
        assert_eq!(args[..4], ["-z", "30s", "-c", "50"]);
        assert_eq!(args.last().unwrap(), "http://127.0.0.1:8080/");
    }
}
