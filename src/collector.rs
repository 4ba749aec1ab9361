//! One poll cycle: fetch beans, interpret them, publish the results.

use crate::bean::BeanInterpreter;
use crate::core::{CollectorSettings, Result, SharedSettings};
use crate::histogram::{HistogramEstimator, OffsetTable};
use crate::sink::{Metric, MetricSink, PublishKind};
use crate::source::BeanSource;
use std::sync::Arc;

/// Outcome of a poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Beans fetched
    pub beans: usize,
    /// Metrics accepted by the sink
    pub published: usize,
    /// Fetch, interpretation and publish failures
    pub failures: usize,
}

/// Drives poll cycles against the current settings snapshot
pub struct Collector {
    settings: SharedSettings,
    estimator: HistogramEstimator,
}

impl Collector {
    /// Create a collector; the offset table is built here, once
    pub fn new(settings: SharedSettings) -> Self {
        Self {
            settings,
            estimator: HistogramEstimator::new(OffsetTable::cassandra()),
        }
    }

    /// Handle to the settings snapshot, for a config watcher
    pub fn settings(&self) -> SharedSettings {
        Arc::clone(&self.settings)
    }

    /// Run one cycle.
    ///
    /// Only a failing `fetch` or `flush` aborts the cycle. Everything else is
    /// logged, counted and skipped so one bad bean cannot hide the others.
    pub fn poll<S, K>(&self, source: &mut S, sink: &mut K) -> Result<CycleReport>
    where
        S: BeanSource + ?Sized,
        K: MetricSink + ?Sized,
    {
        let settings: Arc<CollectorSettings> = self.settings.load_full();
        let interpreter = BeanInterpreter::new(&settings, &self.estimator);

        let batch = source.fetch()?;
        let mut report = CycleReport {
            beans: batch.beans.len(),
            ..CycleReport::default()
        };

        for error in &batch.failures {
            tracing::warn!(category = error.category(), "Bean fetch failed: {}", error);
        }
        report.failures += batch.failures.len();

        for bean in &batch.beans {
            let interpretation = interpreter.interpret(&bean.id, &bean.attributes);

            for failure in &interpretation.failures {
                tracing::warn!(
                    category = failure.error.category(),
                    "Skipping attribute {}: {}",
                    failure.path,
                    failure.error
                );
            }
            report.failures += interpretation.failures.len();

            for metric in interpretation.metrics {
                let name = metric.name.clone();
                match publish(sink, metric) {
                    Ok(()) => report.published += 1,
                    Err(e) => {
                        tracing::warn!("Failed to publish {}: {}", name, e);
                        report.failures += 1;
                    },
                }
            }
        }

        sink.flush()?;

        tracing::debug!(
            beans = report.beans,
            published = report.published,
            failures = report.failures,
            "Poll cycle complete"
        );
        Ok(report)
    }
}

fn publish<K: MetricSink + ?Sized>(sink: &mut K, metric: Metric) -> Result<()> {
    match metric.kind {
        PublishKind::Gauge => sink.publish(&metric.name, metric.value, metric.dimensions),
        PublishKind::CumulativeCounter => {
            sink.publish_cumulative_counter(&metric.name, metric.value, metric.dimensions)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::attributes_from_json;
    use crate::core::config::shared;
    use crate::core::{ConfigBuilder, JmxstatError};
    use crate::sink::{Dimensions, MemorySink};
    use crate::source::{Bean, StaticSource};
    use serde_json::json;

    fn bean(id: &str, attributes: serde_json::Value) -> Bean {
        Bean {
            id: id.to_string(),
            attributes: attributes_from_json(attributes.as_object().unwrap()),
        }
    }

    /// Rejects one metric name, accepts the rest
    struct PickySink {
        inner: MemorySink,
        reject: &'static str,
    }

    impl MetricSink for PickySink {
        fn emit(&mut self, metric: Metric) -> Result<()> {
            if metric.name == self.reject {
                return Err(JmxstatError::sink("rejected"));
            }
            self.inner.emit(metric)
        }
    }

    #[test]
    fn test_malformed_bean_does_not_abort_cycle() {
        let collector = Collector::new(shared(CollectorSettings::default()));
        let mut source = StaticSource::new(vec![
            bean("broken-bean-id", json!({"Value": 1})),
            bean("org.apache.cassandra.db:type=Caches", json!({"KeyCacheHits": 10, "Count": 3})),
        ]);
        let mut sink = MemorySink::new();

        let report = collector.poll(&mut source, &mut sink).unwrap();

        assert_eq!(
            report,
            CycleReport {
                beans: 2,
                published: 2,
                failures: 1
            }
        );
        assert_eq!(
            sink.get("org.apache.cassandra.db.Caches.count").unwrap().kind,
            PublishKind::CumulativeCounter
        );
        assert_eq!(sink.get("org.apache.cassandra.db.Caches.keycachehits").unwrap().value, 10.0);
    }

    #[test]
    fn test_sink_failure_is_isolated() {
        let collector = Collector::new(shared(CollectorSettings::default()));
        let mut source = StaticSource::new(vec![bean("ns:type=T", json!({"A": 1, "B": 2}))]);
        let mut sink = PickySink {
            inner: MemorySink::new(),
            reject: "ns.T.a",
        };

        let report = collector.poll(&mut source, &mut sink).unwrap();
        assert_eq!(report.published, 1);
        assert_eq!(report.failures, 1);
        assert!(sink.inner.get("ns.T.b").is_some());
    }

    #[test]
    fn test_settings_swap_applies_next_cycle() {
        let settings = shared(CollectorSettings::default());
        let collector = Collector::new(Arc::clone(&settings));
        let mut source = StaticSource::new(vec![bean("ns:type=T", json!({"Value": 1}))]);
        let mut sink = MemorySink::new();

        collector.poll(&mut source, &mut sink).unwrap();
        assert!(sink.get("ns.T").is_some());

        let updated = ConfigBuilder::new().prefix("cassandra").build().unwrap();
        settings.store(Arc::new(updated.settings().unwrap()));

        collector.poll(&mut source, &mut sink).unwrap();
        assert!(sink.get("cassandra.ns.T").is_some());
    }

    #[test]
    fn test_publish_routes_by_kind() {
        let mut sink = MemorySink::new();
        publish(&mut sink, Metric::cumulative_counter("c", 1.0, Dimensions::new())).unwrap();
        publish(&mut sink, Metric::gauge("g", 1.0, Dimensions::new())).unwrap();
        assert_eq!(sink.metrics()[0].kind, PublishKind::CumulativeCounter);
        assert_eq!(sink.metrics()[1].kind, PublishKind::Gauge);
    }
}
