//! Result persistence and summaries.
//!
//! The results document is built in memory and persisted through a
//! temporary file in the output directory, so a failed write never leaves a
//! partial document behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use tempfile::NamedTempFile;

use super::aggregator::AggregateReport;
use super::types::*;

/// Name of the results document for a generation time in milliseconds
pub fn results_file_name(timestamp_millis: i64) -> String {
    format!("results-{}.json", timestamp_millis)
}

/// Serialize the aggregate to `<output_dir>/results-<unix-millis>.json`
pub fn write_results(result: &AggregateResult, output_dir: &Path) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(result)
        .context("Failed to serialize results to JSON")?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let output_path =
        output_dir.join(results_file_name(chrono::Utc::now().timestamp_millis()));

    let mut file = NamedTempFile::new_in(output_dir).with_context(|| {
        format!("Failed to create temporary file in {}", output_dir.display())
    })?;
    file.write_all(json.as_bytes())
        .and_then(|_| file.as_file().sync_all())
        .with_context(|| format!("Failed to write results to {}", output_path.display()))?;
    file.persist_noclobber(&output_path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to persist results to {}", output_path.display()))?;

    log::info!("Results saved in file: {}", output_path.display());
    Ok(output_path)
}

fn average(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// One summary line per configuration, averaged over its runs
pub fn configuration_lines(result: &AggregateResult) -> Vec<String> {
    result
        .iter()
        .map(|(key, runs)| {
            let mean = average(runs.iter().map(|r| r.fct_mean)).unwrap_or(0.0);
            let p99 = average(runs.iter().map(|r| r.fct_p99)).unwrap_or(0.0);
            let p999 = average(runs.iter().map(|r| r.fct_p999)).unwrap_or(0.0);
            format!(
                "{:<40} runs={:<4} fct_50={:.4}s fct_99={:.4}s fct_999={:.4}s",
                key.to_string(),
                runs.len(),
                mean,
                p99,
                p999
            )
        })
        .collect()
}

/// Human-readable summary of a batch
pub fn generate_text_summary(report: &AggregateReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("=".repeat(80));
    lines.push("                      FLOW COMPLETION TIME SUMMARY".to_string());
    lines.push("=".repeat(80));
    lines.push(format!("Documents read: {}", report.documents_read));
    lines.push(format!("Runs aggregated: {}", report.result.run_count()));
    lines.push(format!("Configurations: {}", report.result.len()));
    lines.push(String::new());

    lines.extend(configuration_lines(&report.result));

    if !report.empty_runs.is_empty() {
        lines.push(String::new());
        lines.push(format!("Runs without matched flows: {}", report.empty_runs.len()));
        for (path, key) in &report.empty_runs {
            lines.push(format!("  {} ({})", path.display(), key));
        }
    }

    if !report.failures.is_empty() {
        lines.push(String::new());
        lines.push(format!("Skipped documents: {}", report.failures.len()));
        for failure in &report.failures {
            lines.push(format!("  {}: {}", failure.path.display(), failure.error));
        }
    }

    lines.push("=".repeat(80));
    lines.join("\n")
}

/// Print a summary to stdout
pub fn print_summary(report: &AggregateReport) {
    println!("\n{}\n", generate_text_summary(report));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stats(source: &str, fct: f64) -> RunStatistics {
        RunStatistics {
            source: source.to_string(),
            fct_mean: fct,
            fct_p99: fct * 2.0,
            fct_p999: fct * 3.0,
            large: None,
            small: None,
            tx_packets_total: 10,
            rx_packets_total: 10,
            rx_bytes_total: 1000,
            lost_packets_total: 0,
            flow_count: 1,
            large_flow_count: 0,
            small_flow_count: 1,
            slowest_small_flow: None,
        }
    }

    fn key(mode: &str) -> ExperimentKey {
        ExperimentKey {
            mode: mode.to_string(),
            n_paths: 2,
            n_primary_flows: 4,
            n_backup_flows: 1,
        }
    }

    #[test]
    fn test_write_results_nested_document() {
        let dir = TempDir::new().unwrap();
        let mut result = AggregateResult::new();
        result.push(key("live-live"), stats("a-live-live-2-4-1.xml", 0.5));
        result.push(key("single"), stats("a-single-2-4-1.xml", 1.5));

        let path = write_results(&result, dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("results-") && name.ends_with(".json"));

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["live-live"]["2"]["4"]["1"][0]["fct_50"], 0.5);
        assert_eq!(value["single"]["2"]["4"]["1"][0]["fct_999"], 4.5);

        // Only the results document remains in the directory
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_configuration_lines_average_runs() {
        let mut result = AggregateResult::new();
        result.push(key("random"), stats("a-random-2-4-1.xml", 1.0));
        result.push(key("random"), stats("b-random-2-4-1.xml", 3.0));

        let lines = configuration_lines(&result);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("runs=2"));
        assert!(lines[0].contains("fct_50=2.0000s"));
    }

    #[test]
    fn test_text_summary_lists_empty_runs() {
        let report = AggregateReport {
            documents_read: 1,
            empty_runs: vec![(PathBuf::from("x-single-1-1-0.xml"), key("single"))],
            ..Default::default()
        };
        let text = generate_text_summary(&report);
        assert!(text.contains("Runs without matched flows: 1"));
        assert!(text.contains("x-single-1-1-0.xml"));
    }
}
