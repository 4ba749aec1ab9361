use thiserror::Error;

#[derive(Error, Debug)]
pub enum JmxstatError {
    #[error("Malformed bean identifier '{0}': expected '<namespace>:<key>=<value>,...'")]
    MalformedBeanId(String),

    #[error("Malformed bean metadata '{meta}': item '{item}' is not a key=value pair")]
    MalformedMeta { meta: String, item: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Percentile must be between 0 and 100, got {0}")]
    InvalidPercentile(i64),

    #[error("Invalid histogram pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Offset table for {bucket_count} buckets overflows u64 (at most {max} buckets)")]
    OffsetOverflow { bucket_count: usize, max: usize },

    #[error("Jolokia agent returned status {status}: {message}")]
    Agent { status: u16, message: String },

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Parse error: {message}")]
    Parse { message: String },
}

/// Result type alias for jmxstat operations
pub type Result<T> = std::result::Result<T, JmxstatError>;

impl JmxstatError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Creates a new sink error
    pub fn sink<S: Into<String>>(msg: S) -> Self {
        Self::Sink(msg.into())
    }

    /// Creates a malformed metadata error for one `key=value` item
    pub fn malformed_meta<M: Into<String>, I: Into<String>>(meta: M, item: I) -> Self {
        Self::MalformedMeta {
            meta: meta.into(),
            item: item.into(),
        }
    }

    /// Returns the error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::MalformedBeanId(_) | Self::MalformedMeta { .. } => "bean",
            Self::Config(_) | Self::InvalidPercentile(_) | Self::Regex(_) | Self::OffsetOverflow { .. } => "config",
            Self::Agent { .. } => "agent",
            Self::Sink(_) => "sink",
            Self::Io(_) => "io",
            Self::Serialization(_) | Self::Yaml(_) | Self::Parse { .. } => "serialization",
        }
    }
}
