//! Parallel analysis of a directory of monitor documents.
//!
//! Every document is parsed, correlated and summarized independently on a
//! bounded rayon pool. Workers only return values; the calling thread folds
//! them into the [`AggregateResult`] afterwards.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use color_eyre::eyre::{bail, Context, Result};
use rayon::prelude::*;
use regex::Regex;

use super::correlation::correlate;
use super::error::{AnalysisError, ConfigDecodeError};
use super::flowmon_parser::parse_document;
use super::run_stats::summarize;
use super::types::*;
use crate::config::AnalysisConfig;

/// Match: "<prefix>-<mode>-<n_paths>-<n_primary_flows>-<n_backup_flows>.<ext>"
static FILE_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^-]+-(?P<mode>.+)-(?P<paths>\d+)-(?P<primary>\d+)-(?P<backup>\d+)\.[^.]+$")
        .expect("Invalid file name regex")
});

impl ExperimentKey {
    /// Decode the experiment configuration from a document file name
    pub fn from_file_name(file_name: &str) -> Result<Self, ConfigDecodeError> {
        let caps = FILE_NAME_PATTERN
            .captures(file_name)
            .ok_or_else(|| ConfigDecodeError::Pattern {
                file_name: file_name.to_string(),
            })?;

        let number = |group: &str, field: &'static str| -> Result<u32, ConfigDecodeError> {
            let value = &caps[group];
            value.parse().map_err(|_| ConfigDecodeError::InvalidNumber {
                file_name: file_name.to_string(),
                field,
                value: value.to_string(),
            })
        };

        Ok(Self {
            mode: caps["mode"].to_string(),
            n_paths: number("paths", "n_paths")?,
            n_primary_flows: number("primary", "n_primary_flows")?,
            n_backup_flows: number("backup", "n_backup_flows")?,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigDecodeError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ConfigDecodeError::NonUtf8 {
                path: path.to_path_buf(),
            })?;
        Self::from_file_name(file_name)
    }
}

/// What one document contributed
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub key: ExperimentKey,
    pub flow_count: usize,
    /// `None` when no flow pair was matched
    pub stats: Option<RunStatistics>,
}

/// A document left out of the aggregate
#[derive(Debug)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub error: AnalysisError,
}

/// Aggregate plus the per-document diagnostics of one batch
#[derive(Debug, Default)]
pub struct AggregateReport {
    pub result: AggregateResult,
    /// Documents parsed successfully, including empty runs
    pub documents_read: usize,
    pub failures: Vec<DocumentFailure>,
    /// Runs without any matched flow
    pub empty_runs: Vec<(PathBuf, ExperimentKey)>,
}

impl AggregateReport {
    fn fold(&mut self, path: PathBuf, outcome: Result<DocumentOutcome, AnalysisError>) {
        match outcome {
            Ok(outcome) => {
                self.documents_read += 1;
                match outcome.stats {
                    Some(stats) => self.result.push(outcome.key, stats),
                    None => {
                        log::warn!(
                            "{}: no matched flows among {}, run left out of the aggregate",
                            path.display(),
                            outcome.flow_count
                        );
                        self.empty_runs.push((path, outcome.key));
                    }
                }
            }
            Err(error) => {
                log::warn!("Skipping {}: {}", path.display(), error);
                self.failures.push(DocumentFailure { path, error });
            }
        }
    }
}

/// Parse, correlate and summarize one document
pub fn analyze_document(
    path: &Path,
    thresholds: &ClassThresholds,
) -> Result<DocumentOutcome, AnalysisError> {
    let key = ExperimentKey::from_path(path)?;
    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    log::info!("Reading {}", path.display());
    let run = parse_document(path)?;
    let correlation = correlate(&run, thresholds);
    log::debug!(
        "{}: {} pairs, {} receiver observations, {} incomplete, {} unmatched senders, {} unmatched receivers",
        source,
        correlation.pairs.len(),
        correlation.receiver_observations,
        correlation.incomplete_flows,
        correlation.unmatched_senders,
        correlation.unmatched_receivers
    );
    let stats = summarize(&source, &correlation);

    Ok(DocumentOutcome {
        key,
        flow_count: run.len(),
        stats,
    })
}

/// List the monitor documents of a directory, sorted by path
pub fn discover_documents(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read input directory {}", dir.display()))?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to list input directory {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == extension) {
            documents.push(path);
        }
    }
    documents.sort();

    if documents.is_empty() {
        bail!("No .{} documents found in {}", extension, dir.display());
    }

    Ok(documents)
}

/// Analyze documents in parallel and fold the results on the calling thread
pub fn aggregate(paths: &[PathBuf], config: &AnalysisConfig) -> Result<AggregateReport> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|i| format!("flowstats-{}", i))
        .build()
        .context("Failed to configure worker pool")?;

    log::info!(
        "Analyzing {} documents with {} workers",
        paths.len(),
        pool.current_num_threads()
    );

    let thresholds = config.thresholds();
    let outcomes: Vec<(PathBuf, Result<DocumentOutcome, AnalysisError>)> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| (path.clone(), analyze_document(path, &thresholds)))
            .collect()
    });

    let mut report = AggregateReport::default();
    for (path, outcome) in outcomes {
        report.fold(path, outcome);
    }
    report.result.sort_runs();

    log::info!(
        "Aggregated {} runs over {} configurations ({} skipped, {} empty)",
        report.result.run_count(),
        report.result.len(),
        report.failures.len(),
        report.empty_runs.len()
    );

    Ok(report)
}

/// Discover and aggregate every document of `dir`.
///
/// Fails when the directory holds no document or none could be read.
pub fn aggregate_directory(dir: &Path, config: &AnalysisConfig) -> Result<AggregateReport> {
    let documents = discover_documents(dir, config.extension())?;
    let report = aggregate(&documents, config)?;

    if report.documents_read == 0 {
        bail!(
            "None of the {} documents in {} could be read",
            documents.len(),
            dir.display()
        );
    }

    Ok(report)
}
