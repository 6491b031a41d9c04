//! # livelive-flowstats - Flow completion time analysis for SRv6 live-live runs
//!
//! This library turns ns-3 FlowMonitor documents from completed simulation
//! runs into flow completion time (FCT) statistics grouped by experiment
//! configuration.
//!
//! ## Overview
//!
//! The flow monitor records each direction of a request/response exchange
//! as a separate flow. The library pairs the two directions by reversed
//! five-tuple, keeps the receiver-side record that carries the completion
//! timing, and reduces every run to mean, p99 and p99.9 FCT plus packet and
//! byte totals. Runs of the same configuration (different seeds) are
//! collected together.
//!
//! ## Architecture
//!
//! - `analysis::types`: record model (five-tuples, flows, run statistics)
//! - `analysis::flowmon_parser`: streaming FlowMonitor XML reader
//! - `analysis::correlation`: reversed-tuple flow pairing and classification
//! - `analysis::run_stats`: per-run FCT statistics
//! - `analysis::aggregator`: file name decoding and parallel batch analysis
//! - `analysis::report`: results document and text summaries
//! - `config` / `config_loader`: analysis settings from YAML and CLI
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use livelive_flowstats::analysis;
//! use livelive_flowstats::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::default();
//! let report = analysis::aggregate_directory(Path::new("results/flow-monitor"), &config)?;
//! let output = analysis::write_results(&report.result, Path::new("."))?;
//! println!("Results written to {}", output.display());
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Input Naming
//!
//! Documents are named `<prefix>-<mode>-<n_paths>-<n_primary_flows>-<n_backup_flows>.xml`,
//! for example `seed3-live-live-3-5-2.xml`. The prefix usually carries the
//! seed; the mode may contain hyphens.
//!
//! ## Error Handling
//!
//! Per-document problems are typed (`ParseError`, `ConfigDecodeError`) and
//! only exclude that document. Batch-level failures are reported with
//! `color_eyre`.

pub mod analysis;
pub mod config;
pub mod config_loader;
