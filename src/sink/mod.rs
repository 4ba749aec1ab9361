//! Destinations for interpreted metrics.
//!
//! The collector only needs two operations from downstream: `publish` for
//! gauges and `publish_cumulative_counter` for monotonic counters. Rates and
//! deltas are the sink's business.

use crate::core::{JmxstatError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

/// Dimensions attached to a metric, taken from the bean metadata
pub type Dimensions = BTreeMap<String, String>;

/// How downstream should treat a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublishKind {
    /// Last value wins
    Gauge,
    /// Monotonic total; downstream derives rates from successive values
    CumulativeCounter,
}

impl PublishKind {
    /// Short label used in line output
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishKind::Gauge => "gauge",
            PublishKind::CumulativeCounter => "counter",
        }
    }
}

/// One interpreted value ready for publishing
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// Sanitized dotted name
    pub name: String,
    /// Value
    pub value: f64,
    /// Publication semantics
    pub kind: PublishKind,
    /// Side-channel dimensions
    pub dimensions: Dimensions,
}

impl Metric {
    /// Create a gauge
    pub fn gauge(name: impl Into<String>, value: f64, dimensions: Dimensions) -> Self {
        Self {
            name: name.into(),
            value,
            kind: PublishKind::Gauge,
            dimensions,
        }
    }

    /// Create a cumulative counter
    pub fn cumulative_counter(name: impl Into<String>, value: f64, dimensions: Dimensions) -> Self {
        Self {
            name: name.into(),
            value,
            kind: PublishKind::CumulativeCounter,
            dimensions,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.value, self.kind.as_str())?;
        if !self.dimensions.is_empty() {
            let dims: Vec<String> = self
                .dimensions
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, " {}", dims.join(","))?;
        }
        Ok(())
    }
}

/// Downstream publishing interface
pub trait MetricSink {
    /// Accept one metric
    fn emit(&mut self, metric: Metric) -> Result<()>;

    /// Publish a gauge
    fn publish(&mut self, name: &str, value: f64, dimensions: Dimensions) -> Result<()> {
        self.emit(Metric::gauge(name, value, dimensions))
    }

    /// Publish a cumulative counter
    fn publish_cumulative_counter(&mut self, name: &str, value: f64, dimensions: Dimensions) -> Result<()> {
        self.emit(Metric::cumulative_counter(name, value, dimensions))
    }

    /// Flush buffered output at the end of a poll cycle
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps every metric in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    metrics: Vec<Metric>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics received so far
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Latest value published under `name`
    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().rev().find(|m| m.name == name)
    }

    /// Take every metric received so far
    pub fn drain(&mut self) -> Vec<Metric> {
        std::mem::take(&mut self.metrics)
    }
}

impl MetricSink for MemorySink {
    fn emit(&mut self, metric: Metric) -> Result<()> {
        self.metrics.push(metric);
        Ok(())
    }
}

/// Writes one line per metric: `<name> <value> <gauge|counter>[ k=v,...]`
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<std::io::Stdout> {
    /// Sink printing to standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> MetricSink for WriterSink<W> {
    fn emit(&mut self, metric: Metric) -> Result<()> {
        writeln!(self.writer, "{}", metric)
            .map_err(|e| JmxstatError::sink(format!("Failed to write {}: {}", metric.name, e)))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_routes_kinds() {
        let mut sink = MemorySink::new();
        sink.publish("a.gauge", 1.5, Dimensions::new()).unwrap();
        sink.publish_cumulative_counter("a.count", 7.0, Dimensions::new())
            .unwrap();

        assert_eq!(sink.metrics().len(), 2);
        assert_eq!(sink.get("a.gauge").unwrap().kind, PublishKind::Gauge);
        assert_eq!(sink.get("a.count").unwrap().kind, PublishKind::CumulativeCounter);
        assert_eq!(sink.drain().len(), 2);
        assert!(sink.metrics().is_empty());
    }

    #[test]
    fn test_memory_sink_last_value_wins() {
        let mut sink = MemorySink::new();
        sink.publish("load", 1.0, Dimensions::new()).unwrap();
        sink.publish("load", 2.0, Dimensions::new()).unwrap();
        assert_eq!(sink.get("load").unwrap().value, 2.0);
    }

    #[test]
    fn test_writer_sink_lines() {
        let mut sink = WriterSink::new(Vec::new());
        let dims = Dimensions::from([
            ("keyspace".to_string(), "ks".to_string()),
            ("table".to_string(), "users".to_string()),
        ]);
        sink.publish("cassandra.db.Foo.Bar", 12.5, dims).unwrap();
        sink.publish_cumulative_counter("cassandra.db.Foo.Bar.count", 3.0, Dimensions::new())
            .unwrap();
        sink.flush().unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            output,
            "cassandra.db.Foo.Bar 12.5 gauge keyspace=ks,table=users\ncassandra.db.Foo.Bar.count 3 counter\n"
        );
    }
}
