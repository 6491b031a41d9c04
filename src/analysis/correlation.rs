//! Request/response flow correlation.
//!
//! The flow monitor records each direction of an exchange as its own flow.
//! A receiver-side observation (`tx_bytes == 0`) waits in a pending map under
//! its own tuple until the sender-side flow, whose reverse tuple equals it,
//! shows up later in the same run. The pending observation carries the
//! completion timing and is the one reported.

use std::collections::HashMap;

use super::types::*;

/// A sender-side flow and the receiver-side observation it matched
#[derive(Debug, Clone, Copy)]
pub struct CorrelatedFlowPair<'a> {
    pub sender: &'a Flow,
    /// Source of the pair's statistics
    pub matched: &'a Flow,
    pub class: FlowClass,
    pub fct: f64,
}

/// Counter totals over all matched flows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrelationTotals {
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub lost_packets: u64,
}

/// Result of one correlation pass over a run
#[derive(Debug, Clone, Default)]
pub struct Correlation<'a> {
    /// Pairs in encounter order
    pub pairs: Vec<CorrelatedFlowPair<'a>>,
    pub totals: CorrelationTotals,
    /// Receiver-side observations admitted to the pending map
    pub receiver_observations: usize,
    /// Flows without a derivable fct or bitrate
    pub incomplete_flows: usize,
    /// Sender-side flows that found no pending counterpart
    pub unmatched_senders: usize,
    /// Pending observations still unmatched at the end of the run
    pub unmatched_receivers: usize,
    pub slowest_small_flow: Option<SlowestFlow>,
}

impl<'a> Correlation<'a> {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Completion times of all matched flows, in encounter order
    pub fn fcts(&self) -> Vec<f64> {
        self.pairs.iter().map(|p| p.fct).collect()
    }

    pub fn class_fcts(&self, class: FlowClass) -> Vec<f64> {
        self.pairs
            .iter()
            .filter(|p| p.class == class)
            .map(|p| p.fct)
            .collect()
    }

    pub fn class_count(&self, class: FlowClass) -> usize {
        self.pairs.iter().filter(|p| p.class == class).count()
    }

    pub fn class_rx_bytes(&self, class: FlowClass) -> u64 {
        self.pairs
            .iter()
            .filter(|p| p.class == class)
            .map(|p| p.matched.stats.rx_bytes)
            .sum()
    }

    fn record(&mut self, sender: &'a Flow, matched: &'a Flow, fct: f64, thresholds: &ClassThresholds) {
        let stats = &matched.stats;
        let class = thresholds.classify(stats.tx_bytes);

        self.totals.tx_packets += stats.tx_packets;
        self.totals.rx_packets += stats.rx_packets;
        self.totals.rx_bytes += stats.rx_bytes;
        self.totals.lost_packets += stats.lost_packets;

        if class == FlowClass::Small
            && self.slowest_small_flow.map_or(true, |slowest| fct > slowest.fct)
        {
            self.slowest_small_flow = Some(SlowestFlow {
                flow_id: matched.flow_id(),
                fct,
            });
        }

        log_pair(matched, fct);

        self.pairs.push(CorrelatedFlowPair {
            sender,
            matched,
            class,
            fct,
        });
    }
}

fn fmt_scaled(value: Option<f64>, scale: f64, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.2} {}", v * scale, unit),
        None => "n/a".to_string(),
    }
}

fn log_pair(flow: &Flow, fct: f64) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }

    let t = &flow.tuple;
    let s = &flow.stats;
    log::debug!(
        "FlowID: {} ({} {}/{} --> {}/{}) tx={} rx={} delay={} loss={} \
         size={}B/{}pkts rx={}B/{}pkts lost={} fct={:.4}",
        flow.flow_id(),
        t.protocol_name(),
        t.source_address,
        t.source_port,
        t.destination_address,
        t.destination_port,
        fmt_scaled(s.tx_bitrate(), 1e-3, "kbit/s"),
        fmt_scaled(s.rx_bitrate(), 1e-3, "kbit/s"),
        fmt_scaled(s.delay_mean(), 1e3, "ms"),
        fmt_scaled(s.packet_loss_ratio(), 100.0, "%"),
        s.tx_bytes,
        s.tx_packets,
        s.rx_bytes,
        s.rx_packets,
        s.lost_packets,
        fct
    );
}

/// Pair the flows of one run in a single sequential pass over flow ids.
///
/// - An incomplete flow removes the pending entry under its reverse tuple.
/// - A sender-side flow (`tx_bytes > 0`) consumes the pending entry under its
///   reverse tuple, or is dropped when there is none.
/// - Any other flow becomes pending under its own tuple.
pub fn correlate<'a>(run: &'a Run, thresholds: &ClassThresholds) -> Correlation<'a> {
    let mut correlation = Correlation::default();
    let mut pending: HashMap<FiveTuple, &'a Flow> = HashMap::new();

    for flow in run.flows.values() {
        let reverse = flow.tuple.reversed();

        if !flow.is_complete() {
            correlation.incomplete_flows += 1;
            if pending.remove(&reverse).is_some() {
                log::trace!(
                    "Flow {} is incomplete, dropping pending {}",
                    flow.flow_id(),
                    reverse
                );
            }
            continue;
        }

        if flow.stats.tx_bytes > 0 {
            match pending.remove(&reverse) {
                Some(matched) => {
                    // Pending flows are complete, so fct is present
                    if let Some(fct) = matched.fct() {
                        correlation.record(flow, matched, fct, thresholds);
                    }
                }
                None => correlation.unmatched_senders += 1,
            }
            continue;
        }

        pending.insert(flow.tuple, flow);
        correlation.receiver_observations += 1;
    }

    correlation.unmatched_receivers = pending.len();
    correlation
}
