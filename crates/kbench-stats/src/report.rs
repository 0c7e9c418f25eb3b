//! Human-readable summaries and result files.

use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::debug;

use kbench_core::RequestSample;

use crate::aggregate::Summary;
use crate::footprint::{Constraint, Density, Footprint};

/// Render one trial set as a plain-text summary.
pub fn format_trial_report(service: &str, summary: &Summary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{} results for {service}", summary.kind.label());
    let _ = writeln!(out);
    for (i, outcome) in summary.outcomes.iter().enumerate() {
        let _ = writeln!(out, "  trial {}: {outcome}", i + 1);
    }
    let _ = writeln!(out);

    match &summary.stats {
        Some(stats) => {
            let _ = writeln!(
                out,
                "average: {:.1} ms over {} of {} trials",
                stats.mean_ms,
                summary.samples,
                summary.total()
            );
            let _ = writeln!(out, "median:  {:.1} ms", stats.median_ms);
            let _ = writeln!(out, "min:     {} ms", stats.min_ms);
            let _ = writeln!(out, "max:     {} ms", stats.max_ms);
        }
        None => {
            let _ = writeln!(
                out,
                "average: undefined (0 of {} trials completed)",
                summary.total()
            );
        }
    }

    let noun = if summary.timeouts == 1 { "timeout" } else { "timeouts" };
    let _ = writeln!(out, "{} {noun}", summary.timeouts);

    out
}

/// Client-side view of one availability trial's traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SampleSummary {
    pub total: usize,
    pub failed: usize,
    /// Span from the first to the last failed request, if any failed.
    pub error_window_ms: Option<u64>,
}

impl SampleSummary {
    pub fn from_samples(samples: &[RequestSample]) -> Self {
        let failures: Vec<u64> = samples
            .iter()
            .filter(|s| !s.is_success())
            .map(|s| s.timestamp_ms)
            .collect();
        let error_window_ms = match (failures.iter().min(), failures.iter().max()) {
            (Some(first), Some(last)) => Some(last - first),
            _ => None,
        };
        Self {
            total: samples.len(),
            failed: failures.len(),
            error_window_ms,
        }
    }

    /// Fold another trial's counts into this one. The window keeps the widest.
    pub fn merge(&mut self, other: &SampleSummary) {
        self.total += other.total;
        self.failed += other.failed;
        self.error_window_ms = match (self.error_window_ms, other.error_window_ms) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    pub fn describe(&self) -> String {
        match self.error_window_ms {
            Some(window) => format!(
                "{} requests, {} failed, error window {window} ms",
                self.total, self.failed
            ),
            None => format!("{} requests, {} failed", self.total, self.failed),
        }
    }
}

/// Write sampler rows as `timestamp_ms,status_code,latency_ms`.
pub fn write_samples_csv(path: &Path, rows: &[RequestSample]) -> anyhow::Result<()> {
    let mut file = fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut body = String::from("timestamp_ms,status_code,latency_ms\n");
    for row in rows {
        let _ = writeln!(
            body,
            "{},{},{:.3}",
            row.timestamp_ms, row.status_code, row.latency_ms
        );
    }
    file.write_all(body.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), rows = rows.len(), "wrote sample CSV");
    Ok(())
}

/// Render footprint and density for each measured service.
pub fn format_footprint_report(rows: &[(String, Footprint, Density)]) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:<24} {:>9} {:>12} {:>12} {:>10} {:>10}",
        "service", "instances", "avg cpu (m)", "avg mem MiB", "density", "bound by"
    );
    for (service, footprint, density) in rows {
        let count = density
            .binding
            .map(|n| n.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        let bound = match density.constraint {
            Some(Constraint::Cpu) => "cpu",
            Some(Constraint::Memory) => "memory",
            None => "-",
        };
        let _ = writeln!(
            out,
            "{service:<24} {:>9} {:>12.1} {:>12.1} {count:>10} {bound:>10}",
            footprint.instances, footprint.avg_cpu_millis, footprint.avg_memory_mib
        );
    }

    out
}

/// Timestamped directory holding every file of one invocation.
#[derive(Debug, Clone)]
pub struct RunDirectory {
    path: PathBuf,
}

impl RunDirectory {
    /// Create `<root>/<YYYYmmdd-HHMMSS>`.
    pub fn create(root: &Path, started: DateTime<Local>) -> anyhow::Result<Self> {
        let path = root.join(started.format("%Y%m%d-%H%M%S").to_string());
        fs::create_dir_all(&path)
            .with_context(|| format!("failed to create results directory {}", path.display()))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cold_start_report(&self, service: &str) -> PathBuf {
        self.path.join(format!("cold-start-{service}.txt"))
    }

    pub fn availability_report(&self, service: &str) -> PathBuf {
        self.path.join(format!("availability-{service}.txt"))
    }

    pub fn availability_csv(&self, service: &str, trial: u32) -> PathBuf {
        self.path.join(format!("availability-{service}-trial{trial}.csv"))
    }

    pub fn footprint_report(&self) -> PathBuf {
        self.path.join("footprint.txt")
    }

    pub fn load_comparison_report(&self) -> PathBuf {
        self.path.join("load-comparison.txt")
    }

    /// Write `text` to `path`, which should come from one of the helpers.
    pub fn write(&self, path: &Path, text: &str) -> anyhow::Result<()> {
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), "wrote report");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kbench_core::{TransitionKind, TrialOutcome};

    fn sample(timestamp_ms: u64, status_code: u16) -> RequestSample {
        RequestSample {
            timestamp_ms,
            status_code,
            latency_ms: 1.5,
        }
    }

    #[test]
    fn trial_report_lists_every_trial_and_timeouts() {
        let summary = Summary::from_outcomes(
            TransitionKind::ColdStart,
            vec![
                TrialOutcome::Completed { elapsed_ms: 120 },
                TrialOutcome::Completed { elapsed_ms: 140 },
                TrialOutcome::TimedOut,
                TrialOutcome::Completed { elapsed_ms: 160 },
            ],
        );
        let text = format_trial_report("api", &summary);

        assert!(text.starts_with("cold-start results for api"));
        assert!(text.contains("trial 1: 120 ms"));
        assert!(text.contains("trial 3: timeout"));
        assert!(text.contains("average: 140.0 ms over 3 of 4 trials"));
        assert!(text.contains("min:     120 ms"));
        assert!(text.contains("max:     160 ms"));
        assert!(text.contains("1 timeout\n"));
    }

    #[test]
    fn trial_report_without_samples_is_undefined() {
        let summary = Summary::from_outcomes(
            TransitionKind::Availability,
            vec![TrialOutcome::TimedOut, TrialOutcome::TimedOut],
        );
        let text = format_trial_report("api", &summary);
        assert!(text.contains("undefined"));
        assert!(text.contains("2 timeouts"));
        assert!(!text.contains("min:"));
    }

    #[test]
    fn sample_summary_measures_error_window() {
        let rows = [
            sample(1_000, 200),
            sample(1_050, 0),
            sample(1_100, 503),
            sample(1_150, 0),
            sample(1_200, 200),
        ];
        let summary = SampleSummary::from_samples(&rows);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.failed, 3);
        assert_eq!(summary.error_window_ms, Some(100));

        let clean = SampleSummary::from_samples(&[sample(1, 200)]);
        assert_eq!(clean.error_window_ms, None);
        assert_eq!(clean.describe(), "1 requests, 0 failed");
    }

    #[test]
    fn merged_summary_keeps_widest_window() {
        let mut total = SampleSummary::default();
        total.merge(&SampleSummary {
            total: 10,
            failed: 2,
            error_window_ms: Some(50),
        });
        total.merge(&SampleSummary {
            total: 8,
            failed: 0,
            error_window_ms: None,
        });
        assert_eq!(total.total, 18);
        assert_eq!(total.failed, 2);
        assert_eq!(total.error_window_ms, Some(50));
    }

    #[test]
    fn csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trial1.csv");
        write_samples_csv(&path, &[sample(1_000, 200), sample(1_050, 0)]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "timestamp_ms,status_code,latency_ms");
        assert_eq!(lines[1], "1000,200,1.500");
        assert_eq!(lines[2], "1050,0,1.500");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn run_directory_is_timestamped() {
        let root = tempfile::tempdir().unwrap();
        let started = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let run = RunDirectory::create(root.path(), started).unwrap();

        assert_eq!(run.path(), root.path().join("20240309-140507"));
        assert!(run.path().is_dir());
        assert_eq!(
            run.availability_csv("api", 2).file_name().unwrap(),
            "availability-api-trial2.csv"
        );

        let report = run.cold_start_report("api");
        run.write(&report, "hello\n").unwrap();
        assert_eq!(fs::read_to_string(report).unwrap(), "hello\n");
    }

    #[test]
    fn footprint_report_shows_binding_constraint() {
        let footprint = Footprint {
            instances: 2,
            total_cpu_millis: 200,
            total_memory_mib: 2048.0,
            avg_cpu_millis: 100.0,
            avg_memory_mib: 1024.0,
        };
        let density = Density {
            by_cpu: Some(40),
            by_memory: Some(8),
            binding: Some(8),
            constraint: Some(Constraint::Memory),
        };
        let text = format_footprint_report(&[("api".to_string(), footprint, density)]);
        let row = text.lines().nth(1).unwrap();
        assert!(row.starts_with("api"));
        assert!(row.contains("1024.0"));
        assert!(row.trim_end().ends_with("memory"));
    }
}
