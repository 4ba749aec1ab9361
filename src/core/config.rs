//! Configuration management for jmxstat.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Environment variable and CLI overrides (see `cli`)
//! - Validation and defaults
//! - Hot reload into an atomically swapped [`CollectorSettings`] snapshot

use crate::core::{JmxstatError, Result};
use arc_swap::ArcSwap;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default percentiles computed for every histogram attribute
pub const DEFAULT_PERCENTILES: [i64; 3] = [50, 95, 99];

/// Default pattern selecting histogram-shaped attributes
pub const DEFAULT_HISTOGRAM_REGEX: &str = ".*HistogramMicros$";

/// Complete configuration for jmxstat
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bean interpretation settings
    pub collector: CollectorConfig,
    /// Where beans are read from and how often
    pub source: SourceConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Debug mode
    #[serde(skip)]
    pub debug: bool,
}

/// Bean interpretation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Percentiles to compute for each histogram attribute. Accepts a YAML
    /// list or a comma separated string such as `"50,95,99"`.
    #[serde(deserialize_with = "deserialize_percentiles")]
    pub percentiles: Vec<i64>,
    /// Attribute paths matching this pattern are treated as histograms
    pub histogram_regex: String,
    /// Descend into nested attribute maps and bucket arrays
    pub nested: bool,
    /// Prepended to every scalar metric name
    pub prefix: Option<String>,
}

/// Bean source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Jolokia response documents read on every poll cycle
    pub inputs: Vec<PathBuf>,
    /// Poll interval
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            collector: CollectorConfig::default(),
            source: SourceConfig::default(),
            logging: LoggingConfig::default(),
            debug: false,
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            histogram_regex: DEFAULT_HISTOGRAM_REGEX.to_string(),
            nested: false,
            prefix: None,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            inputs: Vec::new(),
            interval: Duration::from_secs(10),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for &percentile in &self.collector.percentiles {
            if !(0..=100).contains(&percentile) {
                return Err(JmxstatError::InvalidPercentile(percentile));
            }
        }

        Regex::new(&self.collector.histogram_regex)?;

        if self.source.interval.is_zero() {
            return Err(JmxstatError::config("source.interval must be greater than 0"));
        }

        Ok(())
    }

    /// Compile the interpretation settings for this configuration
    pub fn settings(&self) -> Result<CollectorSettings> {
        self.validate()?;
        CollectorSettings::from_config(&self.collector)
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PercentileItem {
    Number(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PercentileList {
    List(Vec<PercentileItem>),
    Csv(String),
}

fn parse_percentile<E: serde::de::Error>(text: &str) -> std::result::Result<i64, E> {
    text.trim()
        .parse::<i64>()
        .map_err(|e| E::custom(format!("invalid percentile '{}': {}", text.trim(), e)))
}

fn deserialize_percentiles<'de, D>(deserializer: D) -> std::result::Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match PercentileList::deserialize(deserializer)? {
        PercentileList::List(items) => items
            .into_iter()
            .map(|item| match item {
                PercentileItem::Number(n) => Ok(n),
                PercentileItem::Text(text) => parse_percentile(&text),
            })
            .collect(),
        PercentileList::Csv(text) => text
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(parse_percentile)
            .collect(),
    }
}

/// Compiled, immutable view of [`CollectorConfig`] used by the interpreter.
///
/// A poll cycle loads one snapshot and uses it throughout, so a reload never
/// changes settings halfway through a bean.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    /// Percentiles in `0..=100`
    pub percentiles: Vec<u8>,
    /// Histogram pattern, anchored at the start of the attribute path
    pub histogram_pattern: Regex,
    /// Descend into nested maps and bucket arrays
    pub nested: bool,
    /// Optional metric name prefix
    pub prefix: Option<String>,
}

impl CollectorSettings {
    /// Validate and compile a collector configuration
    pub fn from_config(config: &CollectorConfig) -> Result<Self> {
        let percentiles = config
            .percentiles
            .iter()
            .map(|&p| u8::try_from(p).ok().filter(|p| *p <= 100).ok_or(JmxstatError::InvalidPercentile(p)))
            .collect::<Result<Vec<u8>>>()?;

        let histogram_pattern = Regex::new(&format!("^(?:{})", config.histogram_regex))?;

        Ok(Self {
            percentiles,
            histogram_pattern,
            nested: config.nested,
            prefix: config.prefix.clone().filter(|p| !p.is_empty()),
        })
    }

    /// Whether an attribute path should be interpreted as a histogram
    pub fn is_histogram(&self, path: &str) -> bool {
        self.histogram_pattern.is_match(path)
    }
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self::from_config(&CollectorConfig::default()).expect("Valid default collector config")
    }
}

/// Settings snapshot shared between the poll loop and the config watcher
pub type SharedSettings = Arc<ArcSwap<CollectorSettings>>;

/// Wrap settings for sharing with a [`ConfigWatcher`]
pub fn shared(settings: CollectorSettings) -> SharedSettings {
    Arc::new(ArcSwap::from_pointee(settings))
}

/// Values given on the command line that win over the config file, also
/// after a reload
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Metric name prefix
    pub prefix: Option<String>,
    /// Percentile list
    pub percentiles: Option<Vec<i64>>,
    /// Force nested traversal on
    pub nested: bool,
    /// Input documents
    pub inputs: Vec<PathBuf>,
    /// Poll interval
    pub interval: Option<Duration>,
    /// Debug mode
    pub debug: bool,
}

impl ConfigOverrides {
    /// Apply the overrides on top of a builder
    pub fn apply(&self, mut builder: ConfigBuilder) -> ConfigBuilder {
        if let Some(prefix) = &self.prefix {
            builder = builder.prefix(prefix.clone());
        }
        if let Some(percentiles) = &self.percentiles {
            builder = builder.percentiles(percentiles.clone());
        }
        if self.nested {
            builder = builder.nested(true);
        }
        if !self.inputs.is_empty() {
            builder = builder.inputs(self.inputs.clone());
        }
        if let Some(interval) = self.interval {
            builder = builder.interval(interval);
        }
        builder.debug(self.debug)
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)?;
        Ok(self)
    }

    /// Set percentiles
    pub fn percentiles(mut self, percentiles: Vec<i64>) -> Self {
        self.config.collector.percentiles = percentiles;
        self
    }

    /// Set the histogram pattern
    pub fn histogram_regex(mut self, pattern: impl Into<String>) -> Self {
        self.config.collector.histogram_regex = pattern.into();
        self
    }

    /// Enable nested traversal
    pub fn nested(mut self, nested: bool) -> Self {
        self.config.collector.nested = nested;
        self
    }

    /// Set metric name prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.collector.prefix = Some(prefix.into());
        self
    }

    /// Set input documents
    pub fn inputs(mut self, inputs: Vec<PathBuf>) -> Self {
        self.config.source.inputs = inputs;
        self
    }

    /// Set poll interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.source.interval = interval;
        self
    }

    /// Set debug mode
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Watch configuration file for changes
pub struct ConfigWatcher {
    path: PathBuf,
    overrides: ConfigOverrides,
    settings: SharedSettings,
}

impl ConfigWatcher {
    /// Create a new configuration watcher publishing into `settings`
    pub fn new(path: PathBuf, overrides: ConfigOverrides, settings: SharedSettings) -> Self {
        ConfigWatcher {
            path,
            overrides,
            settings,
        }
    }

    /// Get the snapshot handle updated by this watcher
    pub fn subscribe(&self) -> SharedSettings {
        Arc::clone(&self.settings)
    }

    /// Re-read the file and swap in new settings if they are valid
    pub async fn reload(&self) -> Result<()> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let builder = ConfigBuilder::new().from_yaml(&content)?;
        let config = self.overrides.apply(builder).build()?;
        self.settings.store(Arc::new(config.settings()?));
        Ok(())
    }

    /// Start watching for configuration changes
    pub async fn watch(self) -> Result<()> {
        use notify::{RecursiveMode, Watcher};

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        })
        .map_err(|e| JmxstatError::config(format!("Failed to create file watcher: {}", e)))?;

        watcher
            .watch(&self.path, RecursiveMode::NonRecursive)
            .map_err(|e| JmxstatError::config(format!("Failed to watch config file: {}", e)))?;

        tracing::info!("Watching configuration file: {:?}", self.path);

        while let Some(event) = rx.recv().await {
            if matches!(event.kind, notify::EventKind::Modify(_)) {
                tracing::info!("Configuration file changed, reloading...");

                match self.reload().await {
                    Ok(()) => tracing::info!("Configuration reloaded successfully"),
                    Err(e) => tracing::error!("Keeping previous configuration: {}", e),
                }
            }
        }

        Ok(())
    }
}
