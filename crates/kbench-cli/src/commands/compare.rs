use std::path::Path;

use kbench_core::BenchConfig;
use kbench_stats::{LoadComparison, LoadProfile, LoadSummary};

pub fn run(config: &BenchConfig, baseline: &Path, candidate: &Path) -> anyhow::Result<()> {
    let comparison = LoadComparison::compare(
        LoadSummary::from_file(baseline)?,
        LoadSummary::from_file(candidate)?,
    );
    let report = comparison.format(&label(baseline), &label(candidate));
    print!("{report}");

    let run_dir = super::run_directory(config)?;
    let path = run_dir.load_comparison_report();
    run_dir.write(&path, &report)?;
    println!("✓ Wrote {}", path.display());

    Ok(())
}

pub fn print_load_args(config: &BenchConfig, url: Option<String>) -> anyhow::Result<()> {
    let mut profile = LoadProfile::from(&config.load);
    if let Some(url) = url {
        profile.target_url = url;
    }
    println!("oha {}", profile.oha_args().join(" "));
    Ok(())
}

fn label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_file_stem() {
        assert_eq!(label(Path::new("results/axum-load.json")), "axum-load");
    }

    #[test]
    fn comparison_report_lands_in_run_directory() {
        let dir = tempfile::tempdir().unwrap();
        let report = r#"{"summary":{"requestsPerSec":100.0,"successRate":1.0},
            "latencyPercentiles":{"p50":0.01,"p90":0.02,"p99":0.05}}"#;
        let baseline = dir.path().join("axum.json");
        let candidate = dir.path().join("spin.json");
        std::fs::write(&baseline, report).unwrap();
        std::fs::write(&candidate, report).unwrap();

        let mut config = BenchConfig::default();
        config.output.results_dir = dir.path().join("out").display().to_string();
        run(&config, &baseline, &candidate).unwrap();

        let runs: Vec<_> = std::fs::read_dir(dir.path().join("out")).unwrap().collect();
        assert_eq!(runs.len(), 1);
        let run_path = runs[0].as_ref().unwrap().path();
        let text = std::fs::read_to_string(run_path.join("load-comparison.txt")).unwrap();
        assert!(text.contains("axum"));
        assert!(text.contains("spin"));
    }
}
