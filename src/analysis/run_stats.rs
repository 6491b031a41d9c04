//! Per-run flow completion time statistics.
//!
//! Percentiles use truncating-index nearest rank: the value at
//! `floor(len * numerator / denominator)` of the ascending sample, with no
//! interpolation.

use super::correlation::Correlation;
use super::types::*;

/// Sample index for a truncating nearest-rank percentile.
///
/// The index is clamped to `len - 1`. For `len >= 1` and
/// `numerator < denominator` the clamp never applies; it only guards
/// percentiles at or above 100.
pub fn percentile_index(len: usize, numerator: usize, denominator: usize) -> usize {
    debug_assert!(len > 0 && denominator > 0);
    (len * numerator / denominator).min(len.saturating_sub(1))
}

/// Percentile of an ascending sample, `None` when the sample is empty
pub fn truncating_percentile(sorted: &[f64], numerator: usize, denominator: usize) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    Some(sorted[percentile_index(sorted.len(), numerator, denominator)])
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values
}

/// Mean, p99 and p99.9 of a sample, `None` when it is empty
fn fct_moments(fcts: Vec<f64>) -> Option<(f64, f64, f64)> {
    let mean = mean(&fcts)?;
    let fcts = sorted(fcts);
    Some((
        mean,
        truncating_percentile(&fcts, 99, 100)?,
        truncating_percentile(&fcts, 999, 1000)?,
    ))
}

fn class_summary(correlation: &Correlation<'_>, class: FlowClass) -> Option<FctSummary> {
    let fcts = correlation.class_fcts(class);
    let count = fcts.len();
    let (mean, p99, p999) = fct_moments(fcts)?;
    Some(FctSummary {
        count,
        mean,
        p99,
        p999,
        rx_bytes_total: correlation.class_rx_bytes(class),
    })
}

/// Reduce a correlated run to its statistics.
///
/// Returns `None` when no flow pair was matched; such a run has no entry in
/// the aggregate.
pub fn summarize(source: &str, correlation: &Correlation<'_>) -> Option<RunStatistics> {
    let (fct_mean, fct_p99, fct_p999) = fct_moments(correlation.fcts())?;

    let stats = RunStatistics {
        source: source.to_string(),
        fct_mean,
        fct_p99,
        fct_p999,
        large: class_summary(correlation, FlowClass::Large),
        small: class_summary(correlation, FlowClass::Small),
        tx_packets_total: correlation.totals.tx_packets,
        rx_packets_total: correlation.totals.rx_packets,
        rx_bytes_total: correlation.totals.rx_bytes,
        lost_packets_total: correlation.totals.lost_packets,
        flow_count: correlation.pairs.len(),
        large_flow_count: correlation.class_count(FlowClass::Large),
        small_flow_count: correlation.class_count(FlowClass::Small),
        slowest_small_flow: correlation.slowest_small_flow,
    };

    log::info!(
        "{}: {} flows ({} large, {} small), avg FCT {:.4}s, p99 {:.4}s, p99.9 {:.4}s",
        source,
        stats.flow_count,
        stats.large_flow_count,
        stats.small_flow_count,
        stats.fct_mean,
        stats.fct_p99,
        stats.fct_p999
    );
    if let Some(slowest) = stats.slowest_small_flow {
        log::debug!("{}: slowest small flow {} ({:.4}s)", source, slowest.flow_id, slowest.fct);
    }

    Some(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::correlation::correlate;
    use crate::analysis::correlation::tests::{flow, run, tuple};

    #[test]
    fn test_percentile_boundary_ten_values() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(percentile_index(10, 99, 100), 9);
        assert_eq!(percentile_index(10, 999, 1000), 9);
        assert_eq!(truncating_percentile(&values, 99, 100), Some(10.0));
        assert_eq!(truncating_percentile(&values, 999, 1000), Some(10.0));
    }

    #[test]
    fn test_percentile_index_truncates() {
        assert_eq!(percentile_index(1, 99, 100), 0);
        assert_eq!(percentile_index(1, 999, 1000), 0);
        assert_eq!(percentile_index(200, 99, 100), 198);
        assert_eq!(percentile_index(1000, 999, 1000), 999);
        assert_eq!(percentile_index(1500, 999, 1000), 1498);
    }

    #[test]
    fn test_percentile_index_clamped() {
        assert_eq!(percentile_index(5, 1, 1), 4);
    }

    #[test]
    fn test_percentile_of_empty_sample() {
        assert_eq!(truncating_percentile(&[], 99, 100), None);
    }

    #[test]
    fn test_summarize_matched_flows() {
        let mut flows = Vec::new();
        for i in 0..10u16 {
            let t = tuple(1, 1, 1000 + i, 80);
            let fct = f64::from(10 - i);
            flows.push(flow(u32::from(i) + 1, t.reversed(), 0, Some(fct)));
            flows.push(flow(u32::from(i) + 100, t, 5000, Some(fct)));
        }
        let run = run(flows);
        let correlation = correlate(&run, &ClassThresholds::default());

        let stats = summarize("run-live-live-2-10-0.xml", &correlation).unwrap();
        assert_eq!(stats.flow_count, 10);
        assert_eq!(stats.fct_mean, 5.5);
        assert_eq!(stats.fct_p99, 10.0);
        assert_eq!(stats.fct_p999, 10.0);
        assert_eq!(stats.small_flow_count, 10);
        assert_eq!(stats.large_flow_count, 0);
        assert!(stats.large.is_none());
        let small = stats.small.unwrap();
        assert_eq!(small.count, 10);
        assert_eq!(small.p99, 10.0);
        assert_eq!(small.rx_bytes_total, 10_000);
        assert_eq!(stats.rx_packets_total, 90);
        assert_eq!(stats.lost_packets_total, 10);
        assert_eq!(stats.slowest_small_flow.unwrap().flow_id, 1);
    }

    #[test]
    fn test_empty_run_has_no_statistics() {
        let t = tuple(1, 1, 1000, 80);
        let run = run(vec![flow(1, t, 5000, Some(1.0))]);
        let correlation = correlate(&run, &ClassThresholds::default());
        assert!(summarize("run-single-1-1-0.xml", &correlation).is_none());
    }
}
