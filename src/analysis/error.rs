//! Per-document error types.
//!
//! These errors are recovered by the aggregator: the affected document is
//! logged and left out of the result. Batch-level failures use
//! `color_eyre` reports instead.

use std::path::PathBuf;

use super::types::FlowId;

/// Errors raised while reading one flow-monitor document
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed XML at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("<{element}> is missing required attribute '{field}'{}", flow_suffix(.flow_id))]
    MissingField {
        element: &'static str,
        field: &'static str,
        flow_id: Option<FlowId>,
    },

    #[error("<{element}> has invalid value '{value}' for '{field}'{}", flow_suffix(.flow_id))]
    InvalidField {
        element: &'static str,
        field: &'static str,
        value: String,
        flow_id: Option<FlowId>,
    },

    #[error("{record} record references unknown flow {flow_id}")]
    UnknownFlow {
        record: &'static str,
        flow_id: FlowId,
    },

    #[error("Flow {flow_id} has no classifier record")]
    MissingClassifier { flow_id: FlowId },

    #[error("Document ended inside flow {flow_id}")]
    Truncated { flow_id: FlowId },

    #[error("Document contains no FlowMonitor element")]
    NoMonitor,

    #[error("Document ended before the closing FlowMonitor tag")]
    UnclosedMonitor,

    #[error("Document contains more than one FlowMonitor element")]
    MultipleMonitors,
}

fn flow_suffix(flow_id: &Option<FlowId>) -> String {
    match flow_id {
        Some(id) => format!(" (flow {})", id),
        None => String::new(),
    }
}

/// A document name that does not follow
/// `<prefix>-<mode>-<n_paths>-<n_primary_flows>-<n_backup_flows>.<ext>`
#[derive(Debug, thiserror::Error)]
pub enum ConfigDecodeError {
    #[error("File name is not valid UTF-8: {path}")]
    NonUtf8 { path: PathBuf },

    #[error("File name '{file_name}' does not match <prefix>-<mode>-<n_paths>-<n_primary_flows>-<n_backup_flows>.<ext>")]
    Pattern { file_name: String },

    #[error("File name '{file_name}' has out-of-range {field} '{value}'")]
    InvalidNumber {
        file_name: String,
        field: &'static str,
        value: String,
    },
}

/// Why a document was left out of the aggregate
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    ConfigDecode(#[from] ConfigDecodeError),
}
