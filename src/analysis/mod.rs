//! Flow-monitor correlation and statistics for live-live simulation runs.
//!
//! Parses FlowMonitor documents, pairs request and response flows, and
//! aggregates per-run flow completion time statistics by experiment
//! configuration.

pub mod types;
pub mod error;
pub mod flowmon_parser;
pub mod correlation;
pub mod run_stats;
pub mod aggregator;
pub mod report;

pub use types::*;
pub use error::{AnalysisError, ConfigDecodeError, ParseError};
pub use flowmon_parser::{parse_document, FlowMonitorReader, MonitorRecord};
pub use correlation::{correlate, Correlation, CorrelatedFlowPair};
pub use run_stats::summarize;
pub use aggregator::{aggregate, aggregate_directory, analyze_document, discover_documents, AggregateReport};
pub use report::{generate_text_summary, print_summary, write_results};
