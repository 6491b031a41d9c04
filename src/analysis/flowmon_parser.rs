//! Streaming parser for ns-3 FlowMonitor documents.
//!
//! [`FlowMonitorReader`] walks the document with `quick-xml` start/end events
//! and yields one [`MonitorRecord`] per completed element. The event buffer
//! is cleared after every event, so only the record being built is held in
//! memory. [`parse_document`] drains the reader once and joins the three
//! record families by flow id.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::error::ParseError;
use super::types::*;

/// A completed record from one of the three sections of a monitor document
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorRecord {
    /// Core statistics from `FlowStats/Flow`
    Flow(FlowStats),
    /// Five-tuple from `Ipv4FlowClassifier/Flow` or `Ipv6FlowClassifier/Flow`
    Classifier { flow_id: FlowId, tuple: FiveTuple },
    /// One probe's view of a flow from `FlowProbes/FlowProbe/FlowStats`
    Probe { flow_id: FlowId, stats: ProbeFlowStats },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    FlowStats,
    Classifier,
    Probes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistogramSlot {
    Delay,
    Interruptions,
    Skipped,
}

/// A `FlowStats/Flow` element whose end tag has not been seen yet
struct FlowInProgress {
    stats: FlowStats,
    nodes: Vec<(i64, u32)>,
    paths: Vec<(i64, u32)>,
    histogram: Option<(HistogramSlot, Histogram)>,
}

impl FlowInProgress {
    fn new(stats: FlowStats) -> Self {
        Self {
            stats,
            nodes: Vec::new(),
            paths: Vec::new(),
            histogram: None,
        }
    }

    fn close_histogram(&mut self) {
        match self.histogram.take() {
            Some((HistogramSlot::Delay, hist)) => self.stats.delay_histogram = Some(hist),
            Some((HistogramSlot::Interruptions, hist)) => {
                self.stats.flow_interruptions_histogram = Some(hist)
            }
            Some((HistogramSlot::Skipped, _)) | None => {}
        }
    }

    fn finish(mut self) -> FlowStats {
        self.close_histogram();
        // Stable sorts: equal timestamps keep document order
        self.nodes.sort_by_key(|&(time, _)| time);
        self.paths.sort_by_key(|&(time, _)| time);
        self.stats.nodes = self.nodes.into_iter().map(|(_, id)| id).collect();
        self.stats.paths = self.paths.into_iter().map(|(_, port)| port).collect();
        self.stats
    }
}

/// Owned attributes of one element, with the flow id for error context
struct Attributes {
    element: &'static str,
    flow_id: Option<FlowId>,
    values: Vec<(String, String)>,
}

impl Attributes {
    fn read(e: &BytesStart<'_>, element: &'static str, position: u64) -> Result<Self, ParseError> {
        let mut values = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| ParseError::Xml {
                position,
                source: err.into(),
            })?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|source| ParseError::Xml { position, source })?
                .into_owned();
            values.push((key, value));
        }

        Ok(Self {
            element,
            flow_id: None,
            values,
        })
    }

    fn get(&self, field: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == field)
            .map(|(_, value)| value.as_str())
    }

    fn invalid(&self, field: &'static str, value: &str) -> ParseError {
        ParseError::InvalidField {
            element: self.element,
            field,
            value: value.to_string(),
            flow_id: self.flow_id,
        }
    }

    fn require_str(&self, field: &'static str) -> Result<&str, ParseError> {
        self.get(field).ok_or(ParseError::MissingField {
            element: self.element,
            field,
            flow_id: self.flow_id,
        })
    }

    fn required<T: FromStr>(&self, field: &'static str) -> Result<T, ParseError> {
        let value = self.require_str(field)?;
        value.trim().parse().map_err(|_| self.invalid(field, value))
    }

    fn optional<T: FromStr>(&self, field: &'static str) -> Result<Option<T>, ParseError> {
        match self.get(field) {
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| self.invalid(field, value)),
            None => Ok(None),
        }
    }

    fn required_time(&self, field: &'static str) -> Result<SimTime, ParseError> {
        let value = self.require_str(field)?;
        parse_time_ns(value).ok_or_else(|| self.invalid(field, value))
    }

    fn optional_time(&self, field: &'static str) -> Result<Option<SimTime>, ParseError> {
        match self.get(field) {
            Some(value) => parse_time_ns(value)
                .map(Some)
                .ok_or_else(|| self.invalid(field, value)),
            None => Ok(None),
        }
    }
}

/// Parse a FlowMonitor time value such as `+1.5e+09ns` into seconds.
pub fn parse_time_ns(value: &str) -> Option<SimTime> {
    let ns: f64 = value.trim().strip_suffix("ns")?.parse().ok()?;
    Some(ns * 1e-9)
}

fn read_flow_stats(attrs: &mut Attributes) -> Result<FlowStats, ParseError> {
    let flow_id = attrs.required("flowId")?;
    attrs.flow_id = Some(flow_id);

    let lost_packets: f64 = attrs.required("lostPackets")?;

    Ok(FlowStats {
        flow_id,
        rx_packets: attrs.required("rxPackets")?,
        tx_packets: attrs.required("txPackets")?,
        time_first_tx_packet: attrs.required_time("timeFirstTxPacket")?,
        time_last_rx_packet: attrs.required_time("timeLastRxPacket")?,
        time_first_rx_packet: attrs.required_time("timeFirstRxPacket")?,
        time_last_tx_packet: attrs.required_time("timeLastTxPacket")?,
        tx_bytes: attrs.required("txBytes")?,
        rx_bytes: attrs.required("rxBytes")?,
        lost_packets: lost_packets.max(0.0).round() as u64,
        delay_sum: attrs.optional_time("delaySum")?.unwrap_or(0.0),
        jitter_sum: attrs.optional_time("jitterSum")?.unwrap_or(0.0),
        times_forwarded: attrs.optional("timesForwarded")?.unwrap_or(0),
        ..Default::default()
    })
}

fn read_tuple(attrs: &mut Attributes) -> Result<(FlowId, FiveTuple), ParseError> {
    let flow_id = attrs.required("flowId")?;
    attrs.flow_id = Some(flow_id);

    let tuple = FiveTuple {
        source_address: attrs.required::<IpAddr>("sourceAddress")?,
        destination_address: attrs.required::<IpAddr>("destinationAddress")?,
        source_port: attrs.required("sourcePort")?,
        destination_port: attrs.required("destinationPort")?,
        protocol: attrs.required("protocol")?,
    };
    Ok((flow_id, tuple))
}

fn read_probe_stats(attrs: &mut Attributes, probe_id: u32) -> Result<(FlowId, ProbeFlowStats), ParseError> {
    let flow_id = attrs.required("flowId")?;
    attrs.flow_id = Some(flow_id);

    let stats = ProbeFlowStats::new(
        probe_id,
        attrs.required("packets")?,
        attrs.required("bytes")?,
        attrs.optional_time("delayFromFirstProbeSum")?.unwrap_or(0.0),
    );
    Ok((flow_id, stats))
}

fn read_bin(attrs: &Attributes) -> Result<HistogramBin, ParseError> {
    Ok(HistogramBin {
        start: attrs.required("start")?,
        width: attrs.required("width")?,
        count: attrs.required("count")?,
    })
}

/// Lazy, single-pass sequence of records from one monitor document.
///
/// Not restartable; re-open the document to read it again. Iteration stops
/// after the first error.
pub struct FlowMonitorReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    section: Section,
    probe_id: Option<u32>,
    current: Option<FlowInProgress>,
    monitors: usize,
    monitor_closed: bool,
    finished: bool,
}

impl FlowMonitorReader<BufReader<File>> {
    /// Open a monitor document on disk
    pub fn open(path: &Path) -> Result<Self, ParseError> {
        let file = File::open(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::with_capacity(64 * 1024, file)))
    }
}

impl<R: BufRead> FlowMonitorReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: Reader::from_reader(inner),
            buf: Vec::with_capacity(1024),
            section: Section::Outside,
            probe_id: None,
            current: None,
            monitors: 0,
            monitor_closed: false,
            finished: false,
        }
    }

    fn byte_position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    /// Read events until the next record completes or the document ends
    fn advance(&mut self, buf: &mut Vec<u8>) -> Result<Option<MonitorRecord>, ParseError> {
        loop {
            buf.clear();
            let event = self
                .reader
                .read_event_into(buf)
                .map_err(|source| ParseError::Xml {
                    position: self.reader.buffer_position() as u64,
                    source,
                })?;

            let record = match event {
                Event::Start(e) => self.on_element(&e, false)?,
                Event::Empty(e) => self.on_element(&e, true)?,
                Event::End(e) => self.on_end(e.name().as_ref()),
                Event::Eof => return self.on_eof(),
                _ => None,
            };

            if record.is_some() {
                return Ok(record);
            }
        }
    }

    fn on_element(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<Option<MonitorRecord>, ParseError> {
        let name = e.name();
        let name = name.as_ref();

        if name == b"FlowMonitor" {
            self.monitors += 1;
            if self.monitors > 1 {
                return Err(ParseError::MultipleMonitors);
            }
            self.monitor_closed = empty;
            return Ok(None);
        }

        match self.section {
            Section::Outside => {
                if !empty {
                    self.section = match name {
                        b"FlowStats" => Section::FlowStats,
                        b"Ipv4FlowClassifier" | b"Ipv6FlowClassifier" => Section::Classifier,
                        b"FlowProbes" => Section::Probes,
                        _ => Section::Outside,
                    };
                }
                Ok(None)
            }
            Section::FlowStats => self.on_flow_stats_element(e, name, empty),
            Section::Classifier => {
                if name != b"Flow" {
                    return Ok(None);
                }
                let mut attrs = Attributes::read(e, "Flow", self.byte_position())?;
                let (flow_id, tuple) = read_tuple(&mut attrs)?;
                Ok(Some(MonitorRecord::Classifier { flow_id, tuple }))
            }
            Section::Probes => match name {
                b"FlowProbe" => {
                    let attrs = Attributes::read(e, "FlowProbe", self.byte_position())?;
                    self.probe_id = Some(attrs.required("index")?);
                    Ok(None)
                }
                b"FlowStats" => {
                    let probe_id = self.probe_id.ok_or(ParseError::MissingField {
                        element: "FlowProbe",
                        field: "index",
                        flow_id: None,
                    })?;
                    let mut attrs = Attributes::read(e, "FlowStats", self.byte_position())?;
                    let (flow_id, stats) = read_probe_stats(&mut attrs, probe_id)?;
                    Ok(Some(MonitorRecord::Probe { flow_id, stats }))
                }
                _ => Ok(None),
            },
        }
    }

    fn on_flow_stats_element(
        &mut self,
        e: &BytesStart<'_>,
        name: &[u8],
        empty: bool,
    ) -> Result<Option<MonitorRecord>, ParseError> {
        let position = self.byte_position();

        let Some(current) = self.current.as_mut() else {
            if name != b"Flow" {
                return Ok(None);
            }
            let mut attrs = Attributes::read(e, "Flow", position)?;
            let stats = read_flow_stats(&mut attrs)?;
            if empty {
                return Ok(Some(MonitorRecord::Flow(stats)));
            }
            self.current = Some(FlowInProgress::new(stats));
            return Ok(None);
        };

        let flow_id = Some(current.stats.flow_id);
        match name {
            b"bin" => {
                if let Some((HistogramSlot::Delay | HistogramSlot::Interruptions, hist)) =
                    current.histogram.as_mut()
                {
                    let mut attrs = Attributes::read(e, "bin", position)?;
                    attrs.flow_id = flow_id;
                    hist.bins.push(read_bin(&attrs)?);
                }
            }
            b"node" => {
                let mut attrs = Attributes::read(e, "node", position)?;
                attrs.flow_id = flow_id;
                current.nodes.push((attrs.required("time")?, attrs.required("id")?));
            }
            b"path" => {
                let mut attrs = Attributes::read(e, "path", position)?;
                attrs.flow_id = flow_id;
                current.paths.push((attrs.required("time")?, attrs.required("port")?));
            }
            _ if name.ends_with(b"Histogram") => {
                let slot = match name {
                    b"delayHistogram" => HistogramSlot::Delay,
                    b"flowInterruptionsHistogram" => HistogramSlot::Interruptions,
                    _ => HistogramSlot::Skipped,
                };
                current.histogram = Some((slot, Histogram::default()));
                if empty {
                    current.close_histogram();
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn on_end(&mut self, name: &[u8]) -> Option<MonitorRecord> {
        if name == b"FlowMonitor" {
            self.monitor_closed = true;
            return None;
        }

        match (self.section, name) {
            (Section::FlowStats, b"Flow") => {
                let current = self.current.take()?;
                return Some(MonitorRecord::Flow(current.finish()));
            }
            (Section::FlowStats, _) if name.ends_with(b"Histogram") => {
                if let Some(current) = self.current.as_mut() {
                    current.close_histogram();
                }
            }
            (Section::FlowStats, b"FlowStats") => self.section = Section::Outside,
            (Section::Classifier, b"Ipv4FlowClassifier" | b"Ipv6FlowClassifier") => {
                self.section = Section::Outside
            }
            (Section::Probes, b"FlowProbe") => self.probe_id = None,
            (Section::Probes, b"FlowProbes") => self.section = Section::Outside,
            _ => {}
        }
        None
    }

    fn on_eof(&mut self) -> Result<Option<MonitorRecord>, ParseError> {
        if let Some(current) = &self.current {
            return Err(ParseError::Truncated {
                flow_id: current.stats.flow_id,
            });
        }
        if self.monitors == 0 {
            return Err(ParseError::NoMonitor);
        }
        if !self.monitor_closed {
            return Err(ParseError::UnclosedMonitor);
        }
        Ok(None)
    }
}

impl<R: BufRead> Iterator for FlowMonitorReader<R> {
    type Item = Result<MonitorRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut buf = std::mem::take(&mut self.buf);
        let result = self.advance(&mut buf);
        self.buf = buf;

        match result {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Join a record stream into a [`Run`].
///
/// Every classifier and probe record must reference a core flow record, and
/// every core flow record must have a classifier record.
pub fn collect_run<I>(records: I) -> Result<Run, ParseError>
where
    I: IntoIterator<Item = Result<MonitorRecord, ParseError>>,
{
    let mut core: BTreeMap<FlowId, FlowStats> = BTreeMap::new();
    let mut tuples: BTreeMap<FlowId, FiveTuple> = BTreeMap::new();
    let mut probes: BTreeMap<FlowId, Vec<ProbeFlowStats>> = BTreeMap::new();

    for record in records {
        match record? {
            MonitorRecord::Flow(stats) => {
                core.insert(stats.flow_id, stats);
            }
            MonitorRecord::Classifier { flow_id, tuple } => {
                tuples.insert(flow_id, tuple);
            }
            MonitorRecord::Probe { flow_id, stats } => {
                probes.entry(flow_id).or_default().push(stats);
            }
        }
    }

    if let Some(&flow_id) = tuples.keys().find(|id| !core.contains_key(id)) {
        return Err(ParseError::UnknownFlow {
            record: "classifier",
            flow_id,
        });
    }
    if let Some(&flow_id) = probes.keys().find(|id| !core.contains_key(id)) {
        return Err(ParseError::UnknownFlow {
            record: "probe",
            flow_id,
        });
    }

    let mut flows = BTreeMap::new();
    for (flow_id, stats) in core {
        let tuple = tuples
            .remove(&flow_id)
            .ok_or(ParseError::MissingClassifier { flow_id })?;
        let flow = Flow {
            stats,
            tuple,
            probe_stats_unsorted: probes.remove(&flow_id).unwrap_or_default(),
        };
        flows.insert(flow_id, flow);
    }

    Ok(Run { flows })
}

/// Parse one monitor document into a [`Run`]
pub fn parse_document(path: &Path) -> Result<Run, ParseError> {
    let reader = FlowMonitorReader::open(path)?;
    let run = collect_run(reader)?;
    log::debug!("Parsed {}: {} flows", path.display(), run.len());
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::Ipv4Addr;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"<?xml version="1.0" ?>
<FlowMonitor>
  <FlowStats>
    <Flow flowId="1" timeFirstTxPacket="+1e+09ns" timeFirstRxPacket="+1.001e+09ns" timeLastTxPacket="+1.5e+09ns" timeLastRxPacket="+1.502e+09ns" delaySum="+2e+06ns" jitterSum="+0ns" lastDelay="+1e+06ns" txBytes="5000" rxBytes="4000" txPackets="5" rxPackets="4" lostPackets="1" timesForwarded="8">
      <delayHistogram nBins="2">
        <bin index="0" start="0" width="0.001" count="3" />
        <bin index="1" start="0.001" width="0.001" count="1" />
      </delayHistogram>
      <jitterHistogram nBins="1">
        <bin index="0" start="0" width="0.001" count="4" />
      </jitterHistogram>
      <flowInterruptionsHistogram nBins="0" />
      <node id="3" time="200" />
      <node id="1" time="100" />
      <path port="2" time="150" />
      <path port="7" time="50" />
    </Flow>
    <Flow flowId="2" timeFirstTxPacket="+1.001e+09ns" timeFirstRxPacket="+1.002e+09ns" timeLastTxPacket="+1.4e+09ns" timeLastRxPacket="+1.401e+09ns" delaySum="+0ns" jitterSum="+0ns" lastDelay="+0ns" txBytes="0" rxBytes="120" txPackets="3" rxPackets="3" lostPackets="0" timesForwarded="3" />
  </FlowStats>
  <Ipv4FlowClassifier>
    <Flow flowId="1" sourceAddress="10.0.0.1" destinationAddress="10.0.1.1" protocol="6" sourcePort="49153" destinationPort="9">
      <Dscp value="0x0" packets="5" />
    </Flow>
    <Flow flowId="2" sourceAddress="10.0.1.1" destinationAddress="10.0.0.1" protocol="6" sourcePort="9" destinationPort="49153" />
  </Ipv4FlowClassifier>
  <Ipv6FlowClassifier>
  </Ipv6FlowClassifier>
  <FlowProbes>
    <FlowProbe index="0">
      <FlowStats flowId="1" packets="5" bytes="5000" delayFromFirstProbeSum="+0ns" />
    </FlowProbe>
    <FlowProbe index="1">
      <FlowStats flowId="1" packets="4" bytes="4000" delayFromFirstProbeSum="+4e+06ns" />
      <FlowStats flowId="2" packets="3" bytes="120" delayFromFirstProbeSum="+0ns" />
    </FlowProbe>
  </FlowProbes>
</FlowMonitor>
"#;

    fn parse_str(doc: &str) -> Result<Run, ParseError> {
        collect_run(FlowMonitorReader::new(doc.as_bytes()))
    }

    #[test]
    fn test_parse_time_ns() {
        assert!((parse_time_ns("+1e+09ns").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(parse_time_ns("-0ns"), Some(-0.0));
        assert!(parse_time_ns("1.5s").is_none());
        assert!(parse_time_ns("fastns").is_none());
    }

    #[test]
    fn test_reader_yields_records_in_document_order() {
        let records: Vec<MonitorRecord> = FlowMonitorReader::new(SAMPLE.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();

        let kinds: Vec<&str> = records
            .iter()
            .map(|r| match r {
                MonitorRecord::Flow(_) => "flow",
                MonitorRecord::Classifier { .. } => "classifier",
                MonitorRecord::Probe { .. } => "probe",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["flow", "flow", "classifier", "classifier", "probe", "probe", "probe"]
        );
    }

    #[test]
    fn test_parse_sample_document() {
        let run = parse_str(SAMPLE).unwrap();
        assert_eq!(run.len(), 2);

        let flow = &run.flows[&1];
        assert_eq!(flow.stats.tx_bytes, 5000);
        assert_eq!(flow.stats.rx_packets, 4);
        assert_eq!(flow.stats.lost_packets, 1);
        assert_eq!(flow.stats.times_forwarded, 8);
        assert!((flow.fct().unwrap() - 0.502).abs() < 1e-9);
        assert!((flow.stats.delay_mean().unwrap() - 0.0005).abs() < 1e-12);
        assert_eq!(flow.tuple.source_address, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(flow.tuple.destination_port, 9);
        assert_eq!(flow.tuple.protocol, PROTO_TCP);

        let delay = flow.stats.delay_histogram.as_ref().unwrap();
        assert_eq!(delay.bins.len(), 2);
        assert_eq!(delay.bins[1].count, 1);
        assert_eq!(
            flow.stats.flow_interruptions_histogram,
            Some(Histogram::default())
        );

        assert_eq!(flow.stats.nodes, vec![1, 3]);
        assert_eq!(flow.stats.paths, vec![7, 2]);

        assert_eq!(flow.probe_stats_unsorted.len(), 2);
        assert_eq!(flow.probe_stats_unsorted[1].probe_id, 1);
        assert!((flow.probe_stats_unsorted[1].delay_from_first_probe - 0.001).abs() < 1e-12);

        let reply = &run.flows[&2];
        assert_eq!(reply.tuple, flow.tuple.reversed());
        assert_eq!(reply.stats.tx_bytes, 0);
        assert!(reply.stats.delay_histogram.is_none());
    }

    #[test]
    fn test_missing_required_field_names_flow() {
        let doc = SAMPLE.replacen(r#"rxPackets="4" "#, "", 1);
        let err = parse_str(&doc).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MissingField {
                field: "rxPackets",
                flow_id: Some(1),
                ..
            }
        ));
    }

    #[test]
    fn test_time_without_unit_is_invalid() {
        let doc = SAMPLE.replacen(r#"timeLastRxPacket="+1.502e+09ns""#, r#"timeLastRxPacket="1.502""#, 1);
        let err = parse_str(&doc).unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidField {
                field: "timeLastRxPacket",
                flow_id: Some(1),
                ..
            }
        ));
    }

    #[test]
    fn test_classifier_for_unknown_flow() {
        let doc = SAMPLE.replacen(r#"<Flow flowId="2" sourceAddress"#, r#"<Flow flowId="9" sourceAddress"#, 1);
        let err = parse_str(&doc).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnknownFlow {
                record: "classifier",
                flow_id: 9
            }
        ));
    }

    #[test]
    fn test_probe_for_unknown_flow() {
        let doc = SAMPLE.replacen(r#"<FlowStats flowId="2" packets"#, r#"<FlowStats flowId="5" packets"#, 1);
        let err = parse_str(&doc).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnknownFlow {
                record: "probe",
                flow_id: 5
            }
        ));
    }

    #[test]
    fn test_flow_without_classifier() {
        let doc = SAMPLE.replacen(
            r#"<Flow flowId="2" sourceAddress="10.0.1.1" destinationAddress="10.0.0.1" protocol="6" sourcePort="9" destinationPort="49153" />"#,
            "",
            1,
        );
        let err = parse_str(&doc).unwrap_err();
        assert!(matches!(err, ParseError::MissingClassifier { flow_id: 2 }));
    }

    #[test]
    fn test_document_without_monitor() {
        let err = parse_str("<?xml version=\"1.0\" ?>\n<Other/>\n").unwrap_err();
        assert!(matches!(err, ParseError::NoMonitor));
    }

    #[test]
    fn test_document_with_two_monitors() {
        let doc = format!("<Results>{}{}</Results>", &SAMPLE[22..], &SAMPLE[22..]);
        let err = parse_str(&doc).unwrap_err();
        assert!(matches!(err, ParseError::MultipleMonitors));
    }

    #[test]
    fn test_document_cut_between_elements() {
        let cut = SAMPLE.rfind("    </FlowProbe>").unwrap();
        let err = parse_str(&SAMPLE[..cut]).unwrap_err();
        assert!(matches!(err, ParseError::UnclosedMonitor));

        let cut = SAMPLE.find("</FlowMonitor>").unwrap();
        assert!(matches!(
            parse_str(&SAMPLE[..cut]),
            Err(ParseError::UnclosedMonitor)
        ));
    }

    #[test]
    fn test_empty_monitor_element_is_closed() {
        let run = parse_str("<FlowMonitor/>").unwrap();
        assert!(run.is_empty());
    }

    #[test]
    fn test_reader_stops_after_error() {
        let doc = SAMPLE.replacen(r#"txBytes="5000""#, r#"txBytes="lots""#, 1);
        let mut reader = FlowMonitorReader::new(doc.as_bytes());
        assert!(matches!(reader.next(), Some(Err(ParseError::InvalidField { .. }))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_parse_document_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let run = parse_document(file.path()).unwrap();
        assert_eq!(run.len(), 2);
    }

    #[test]
    fn test_parse_missing_file() {
        let err = parse_document(Path::new("/nonexistent/flowmon.xml")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
