//! Command-line interface for jmxstat.
//!
//! Point it at one or more Jolokia response documents and it prints one
//! metric per line on every poll cycle.

use crate::application::Application;
use crate::core::config::LogLevel;
use crate::core::{Config, ConfigBuilder, ConfigOverrides, JmxstatError, Result};
use crate::sink::WriterSink;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

fn parse_interval(text: &str) -> std::result::Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(text).map_err(|e| e.to_string())
}

/// Turn Cassandra JMX beans into dotted metrics and histogram percentiles
#[derive(Parser, Debug)]
#[command(name = "jmxstat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (default: ~/.config/jmxstat/config.yaml)
    #[arg(short, long, env = "JMXSTAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Jolokia response document read on every cycle (repeatable)
    #[arg(short, long = "input", env = "JMXSTAT_INPUTS", value_delimiter = ',')]
    pub inputs: Vec<PathBuf>,

    /// Prefix prepended to every metric name
    #[arg(long, env = "JMXSTAT_PREFIX")]
    pub prefix: Option<String>,

    /// Comma separated percentiles computed for each histogram
    #[arg(long, value_delimiter = ',')]
    pub percentiles: Option<Vec<i64>>,

    /// Descend into nested attributes and histogram bucket arrays
    #[arg(long, env = "JMXSTAT_NESTED")]
    pub nested: bool,

    /// Poll interval, e.g. "10s" or "1m"
    #[arg(long, value_parser = parse_interval)]
    pub interval: Option<Duration>,

    /// Run a single poll cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Do not reload settings when the config file changes
    #[arg(long)]
    pub no_watch: bool,

    /// Enable debug logging
    #[arg(short, long, env = "JMXSTAT_DEBUG")]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Values that win over the config file
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            prefix: self.prefix.clone(),
            percentiles: self.percentiles.clone(),
            nested: self.nested,
            inputs: self.inputs.clone(),
            interval: self.interval,
            debug: self.debug,
        }
    }

    /// Config file to use: the explicit one, or the default location if it
    /// exists
    fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config {
            return Some(path.clone());
        }

        dirs::config_dir()
            .map(|d| d.join("jmxstat").join("config.yaml"))
            .filter(|path| path.exists())
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest priority)
    ///
    /// Returns the config file actually read, if any.
    pub async fn load_config(&self) -> Result<(Config, Option<PathBuf>)> {
        let mut builder = ConfigBuilder::new();

        let config_path = self.config_path();
        if let Some(path) = &config_path {
            let content = tokio::fs::read_to_string(path).await.map_err(|e| {
                JmxstatError::config(format!("Failed to read config file {:?}: {}", path, e))
            })?;
            builder = builder.from_yaml(&content)?;
        }

        let config = self.overrides().apply(builder).build()?;
        Ok((config, config_path))
    }

    /// Initialize logging. Metrics go to stdout, so logs go to stderr.
    pub fn init_logging(&self, config: &Config) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let level = if self.debug {
            LogLevel::Debug.as_str().to_string()
        } else {
            std::env::var("JMXSTAT_LOG_LEVEL").unwrap_or_else(|_| config.logging.level.as_str().to_string())
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(self.debug)
            .compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| JmxstatError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

/// Execute the jmxstat application.
pub async fn execute(cli: Cli) -> Result<()> {
    let (config, config_path) = cli.load_config().await?;

    cli.init_logging(&config)?;
    if let Some(path) = &config_path {
        tracing::info!("Loaded configuration from: {:?}", path);
    }

    if cli.check_config {
        config.settings()?;
        println!("Configuration is valid!");
        println!("  Percentiles: {:?}", config.collector.percentiles);
        println!("  Histogram regex: {}", config.collector.histogram_regex);
        println!("  Nested: {}", config.collector.nested);
        println!("  Prefix: {}", config.collector.prefix.as_deref().unwrap_or("(none)"));
        println!("  Inputs: {:?}", config.source.inputs);
        println!("  Interval: {:?}", config.source.interval);
        return Ok(());
    }

    if config.source.inputs.is_empty() {
        return Err(JmxstatError::config(
            "no inputs configured: pass --input or set source.inputs",
        ));
    }

    let mut app = Application::new(config)?;
    if let Some(path) = config_path.filter(|_| !cli.no_watch) {
        app = app.watch_config(path, cli.overrides());
    }

    if cli.once {
        let report = app.run_once(&mut WriterSink::stdout())?;
        tracing::info!(
            "Published {} metrics from {} beans with {} failures",
            report.published,
            report.beans,
            report.failures
        );
        return Ok(());
    }

    app.run(WriterSink::stdout()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "jmxstat",
            "--input",
            "a.json,b.json",
            "--percentiles",
            "50,99",
            "--prefix",
            "cassandra",
            "--nested",
            "--interval",
            "30s",
            "--once",
        ])
        .unwrap();

        assert_eq!(cli.inputs, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
        assert_eq!(cli.percentiles, Some(vec![50, 99]));
        assert_eq!(cli.interval, Some(Duration::from_secs(30)));
        assert!(cli.nested);
        assert!(cli.once);
        assert!(!cli.debug);
    }

    #[test]
    fn test_overrides_applied_without_config_file() {
        let cli = Cli::try_parse_from(["jmxstat", "--prefix", "cassandra", "--percentiles", "75"]).unwrap();
        let config = cli.overrides().apply(ConfigBuilder::new()).build().unwrap();

        assert_eq!(config.collector.prefix.as_deref(), Some("cassandra"));
        assert_eq!(config.collector.percentiles, vec![75]);
        assert!(!config.collector.nested);
    }

    #[tokio::test]
    async fn test_load_explicit_config() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "collector:\n  nested: true\n  prefix: file\n").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = Cli::try_parse_from(["jmxstat", "--config", path.as_str(), "--prefix", "cli"]).unwrap();
        let (config, used) = cli.load_config().await.unwrap();

        assert_eq!(used.as_deref(), Some(file.path()));
        assert!(config.collector.nested);
        assert_eq!(config.collector.prefix.as_deref(), Some("cli"));
    }

    #[tokio::test]
    async fn test_missing_explicit_config_fails() {
        let cli = Cli::try_parse_from(["jmxstat", "--config", "/nonexistent/jmxstat.yaml"]).unwrap();
        assert!(cli.load_config().await.is_err());
    }
}
