//! Main application loop for jmxstat.

use crate::collector::{Collector, CycleReport};
use crate::core::config::shared;
use crate::core::{Config, ConfigOverrides, ConfigWatcher, Result};
use crate::sink::MetricSink;
use crate::source::FileSource;
use std::path::PathBuf;

/// Coordinates the bean source, the collector and the config watcher.
pub struct Application {
    /// Poll cycle driver
    collector: Collector,
    /// Jolokia documents read every cycle
    source: FileSource,
    /// Reloads settings when the config file changes
    watcher: Option<ConfigWatcher>,
    /// Application configuration
    config: Config,
}

impl Application {
    /// Create a new Application with the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        let settings = shared(config.settings()?);
        let collector = Collector::new(settings);
        let source = FileSource::new(config.source.inputs.clone());

        Ok(Self {
            collector,
            source,
            watcher: None,
            config,
        })
    }

    /// Reload collector settings whenever `path` changes. Poll interval and
    /// inputs keep their startup values.
    pub fn watch_config(mut self, path: PathBuf, overrides: ConfigOverrides) -> Self {
        self.watcher = Some(ConfigWatcher::new(path, overrides, self.collector.settings()));
        self
    }

    /// Run a single poll cycle.
    pub fn run_once<K: MetricSink + ?Sized>(&mut self, sink: &mut K) -> Result<CycleReport> {
        self.collector.poll(&mut self.source, sink)
    }

    /// Poll on the configured interval until ctrl-c.
    pub async fn run<K: MetricSink>(mut self, mut sink: K) -> Result<()> {
        tracing::info!(
            "Starting jmxstat: {} input(s) every {:?}",
            self.source.paths().len(),
            self.config.source.interval
        );

        let watcher_handle = self.watcher.take().map(|watcher| {
            tokio::spawn(async move {
                if let Err(e) = watcher.watch().await {
                    tracing::error!("Config watcher error: {}", e);
                }
            })
        });

        let mut ticker = tokio::time::interval(self.config.source.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_once(&mut sink) {
                        Ok(report) if report.failures > 0 => {
                            tracing::warn!(
                                "Published {} metrics from {} beans with {} failures",
                                report.published, report.beans, report.failures
                            );
                        },
                        Ok(report) => {
                            tracing::info!("Published {} metrics from {} beans", report.published, report.beans);
                        },
                        Err(e) => tracing::error!("Poll cycle failed: {}", e),
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Received shutdown signal, stopping...");
                    break;
                }
            }
        }

        if let Some(handle) = watcher_handle {
            handle.abort();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfigBuilder;
    use crate::sink::MemorySink;

    #[test]
    fn test_run_once_reads_inputs() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{"request": {"mbean": "org.apache.cassandra.net:type=FailureDetector"},
                "value": {"UpEndpointCount": 3, "DownEndpointCount": 0},
                "status": 200}"#,
        )
        .unwrap();

        let config = ConfigBuilder::new()
            .inputs(vec![file.path().to_path_buf()])
            .prefix("cassandra")
            .build()
            .unwrap();
        let mut app = Application::new(config).unwrap();
        let mut sink = MemorySink::new();

        let report = app.run_once(&mut sink).unwrap();
        assert_eq!(report.beans, 1);
        assert_eq!(report.published, 2);
        assert_eq!(
            sink.get("cassandra.org.apache.cassandra.net.FailureDetector.upendpointcount")
                .unwrap()
                .value,
            3.0
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.collector.percentiles = vec![101];
        assert!(Application::new(config).is_err());
    }
}
