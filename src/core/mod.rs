//! Configuration and error types shared by every jmxstat component.

#![warn(missing_docs)]

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{
    CollectorConfig, CollectorSettings, Config, ConfigBuilder, ConfigOverrides, ConfigWatcher,
    SharedSettings,
};
pub use error::{JmxstatError, Result};
