//! Core data types for flow-monitor analysis.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Simulation time in seconds
pub type SimTime = f64;

/// Flow identifier, unique within one run
pub type FlowId = u32;

/// Protocol numbers used in diagnostics
pub const PROTO_TCP: u8 = 6;
pub const PROTO_UDP: u8 = 17;

/// Identity of one direction of a flow.
///
/// Equality is field-wise; a tuple never matches its own reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FiveTuple {
    pub source_address: IpAddr,
    pub destination_address: IpAddr,
    pub source_port: u16,
    pub destination_port: u16,
    pub protocol: u8,
}

impl FiveTuple {
    /// The tuple of the opposite direction: addresses and ports swapped,
    /// protocol unchanged.
    pub fn reversed(&self) -> Self {
        Self {
            source_address: self.destination_address,
            destination_address: self.source_address,
            source_port: self.destination_port,
            destination_port: self.source_port,
            protocol: self.protocol,
        }
    }

    pub fn protocol_name(&self) -> String {
        match self.protocol {
            PROTO_TCP => "TCP".to_string(),
            PROTO_UDP => "UDP".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for FiveTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {})",
            self.source_address,
            self.destination_address,
            self.source_port,
            self.destination_port,
            self.protocol
        )
    }
}

/// One histogram bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub width: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

/// Partial view of a flow as seen by one probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeFlowStats {
    pub probe_id: u32,
    pub packets: u64,
    pub bytes: u64,
    /// Mean delay from the first probe, in seconds
    pub delay_from_first_probe: f64,
}

impl ProbeFlowStats {
    pub fn new(probe_id: u32, packets: u64, bytes: u64, delay_from_first_probe_sum: f64) -> Self {
        let delay_from_first_probe = if packets > 0 {
            delay_from_first_probe_sum / packets as f64
        } else {
            0.0
        };

        Self {
            probe_id,
            packets,
            bytes,
            delay_from_first_probe,
        }
    }
}

/// Core per-flow record from the `FlowStats` section of a monitor document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowStats {
    pub flow_id: FlowId,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub tx_packets: u64,
    pub rx_packets: u64,
    /// Fractional in some documents; stored as a rounded count
    pub lost_packets: u64,
    pub time_first_tx_packet: SimTime,
    pub time_last_tx_packet: SimTime,
    pub time_first_rx_packet: SimTime,
    pub time_last_rx_packet: SimTime,
    pub delay_sum: f64,
    pub jitter_sum: f64,
    pub times_forwarded: u64,
    pub delay_histogram: Option<Histogram>,
    pub flow_interruptions_histogram: Option<Histogram>,
    /// Traversed node ids, ordered by their recorded time
    pub nodes: Vec<u32>,
    /// Egress port ids, ordered by their recorded time
    pub paths: Vec<u32>,
}

impl FlowStats {
    pub fn tx_duration(&self) -> f64 {
        self.time_last_tx_packet - self.time_first_tx_packet
    }

    pub fn rx_duration(&self) -> f64 {
        self.time_last_rx_packet - self.time_first_rx_packet
    }

    /// Flow completion time; a non-positive duration counts as absent.
    pub fn fct(&self) -> Option<f64> {
        let fct = self.time_last_rx_packet - self.time_first_tx_packet;
        (fct > 0.0).then_some(fct)
    }

    /// Transmit bitrate in bit/s
    pub fn tx_bitrate(&self) -> Option<f64> {
        bitrate(self.tx_bytes, self.tx_duration())
    }

    /// Receive bitrate in bit/s
    pub fn rx_bitrate(&self) -> Option<f64> {
        bitrate(self.rx_bytes, self.rx_duration())
    }

    pub fn delay_mean(&self) -> Option<f64> {
        self.per_rx_packet(self.delay_sum)
    }

    pub fn packet_size_mean(&self) -> Option<f64> {
        self.per_rx_packet(self.rx_bytes as f64)
    }

    pub fn hop_count(&self) -> Option<f64> {
        self.per_rx_packet(self.times_forwarded as f64).map(|h| h + 1.0)
    }

    pub fn packet_loss_ratio(&self) -> Option<f64> {
        if self.rx_packets == 0 {
            return None;
        }
        let lost = self.lost_packets as f64;
        Some(lost / (self.rx_packets as f64 + lost))
    }

    fn per_rx_packet(&self, value: f64) -> Option<f64> {
        (self.rx_packets > 0).then(|| value / self.rx_packets as f64)
    }
}

fn bitrate(bytes: u64, duration: f64) -> Option<f64> {
    (duration > 0.0).then(|| bytes as f64 * 8.0 / duration)
}

/// A unidirectional flow with its classifier tuple and probe records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub stats: FlowStats,
    pub tuple: FiveTuple,
    /// Probe records in document order
    pub probe_stats_unsorted: Vec<ProbeFlowStats>,
}

impl Flow {
    pub fn flow_id(&self) -> FlowId {
        self.stats.flow_id
    }

    pub fn fct(&self) -> Option<f64> {
        self.stats.fct()
    }

    /// A flow is usable for correlation only when its completion time and
    /// both bitrates can be derived.
    pub fn is_complete(&self) -> bool {
        self.stats.fct().is_some()
            && self.stats.tx_bitrate().is_some()
            && self.stats.rx_bitrate().is_some()
    }
}

/// All flows of one simulation run, iterated in flow id order.
#[derive(Debug, Clone, Default)]
pub struct Run {
    pub flows: BTreeMap<FlowId, Flow>,
}

impl Run {
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

/// Size class of a matched flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowClass {
    Large,
    Small,
    Medium,
}

/// Byte thresholds separating large and small flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassThresholds {
    /// Flows sending strictly more than this are large
    pub large_min_bytes: u64,
    /// Flows sending strictly less than this are small
    pub small_max_bytes: u64,
}

impl Default for ClassThresholds {
    fn default() -> Self {
        Self {
            large_min_bytes: 10_000_000,
            small_max_bytes: 100_000,
        }
    }
}

impl ClassThresholds {
    pub fn classify(&self, tx_bytes: u64) -> FlowClass {
        if tx_bytes > self.large_min_bytes {
            FlowClass::Large
        } else if tx_bytes < self.small_max_bytes {
            FlowClass::Small
        } else {
            FlowClass::Medium
        }
    }
}

/// FCT summary for one flow class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FctSummary {
    pub count: usize,
    pub mean: f64,
    pub p99: f64,
    pub p999: f64,
    pub rx_bytes_total: u64,
}

/// Small flow with the largest completion time in a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlowestFlow {
    pub flow_id: FlowId,
    pub fct: f64,
}

/// Statistics of one run. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// File name of the source document
    pub source: String,
    #[serde(rename = "fct_50")]
    pub fct_mean: f64,
    #[serde(rename = "fct_99")]
    pub fct_p99: f64,
    #[serde(rename = "fct_999")]
    pub fct_p999: f64,
    pub large: Option<FctSummary>,
    pub small: Option<FctSummary>,
    pub tx_packets_total: u64,
    pub rx_packets_total: u64,
    pub rx_bytes_total: u64,
    pub lost_packets_total: u64,
    pub flow_count: usize,
    pub large_flow_count: usize,
    pub small_flow_count: usize,
    pub slowest_small_flow: Option<SlowestFlow>,
}

/// Experiment configuration decoded from a document name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExperimentKey {
    pub mode: String,
    pub n_paths: u32,
    pub n_primary_flows: u32,
    pub n_backup_flows: u32,
}

impl fmt::Display for ExperimentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} paths={} primary={} backup={}",
            self.mode, self.n_paths, self.n_primary_flows, self.n_backup_flows
        )
    }
}

/// Per-run statistics grouped by experiment configuration.
///
/// Serializes as `mode -> n_paths -> n_primary_flows -> n_backup_flows -> [runs]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResult {
    runs: BTreeMap<ExperimentKey, Vec<RunStatistics>>,
}

type Nested<'a> =
    BTreeMap<&'a str, BTreeMap<u32, BTreeMap<u32, BTreeMap<u32, &'a [RunStatistics]>>>>;

impl AggregateResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: ExperimentKey, stats: RunStatistics) {
        self.runs.entry(key).or_default().push(stats);
    }

    pub fn get(&self, key: &ExperimentKey) -> Option<&[RunStatistics]> {
        self.runs.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ExperimentKey, &[RunStatistics])> {
        self.runs.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &ExperimentKey> {
        self.runs.keys()
    }

    /// Number of configurations
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn run_count(&self) -> usize {
        self.runs.values().map(Vec::len).sum()
    }

    /// Order each configuration's runs by source document name.
    pub fn sort_runs(&mut self) {
        for runs in self.runs.values_mut() {
            runs.sort_by(|a, b| a.source.cmp(&b.source));
        }
    }

    fn nested(&self) -> Nested<'_> {
        let mut nested: Nested<'_> = BTreeMap::new();
        for (key, runs) in &self.runs {
            nested
                .entry(key.mode.as_str())
                .or_default()
                .entry(key.n_paths)
                .or_default()
                .entry(key.n_primary_flows)
                .or_default()
                .insert(key.n_backup_flows, runs.as_slice());
        }
        nested
    }
}

impl Serialize for AggregateResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nested = self.nested();
        let mut map = serializer.serialize_map(Some(nested.len()))?;
        for (mode, by_paths) in &nested {
            map.serialize_entry(mode, by_paths)?;
        }
        map.end()
    }
}
