//! jmxstat - Cassandra JMX metrics from Jolokia bean trees.
//!
//! jmxstat interprets the attribute trees that a Jolokia agent returns for
//! Cassandra MBeans. Scalar attributes become dotted metric names, `Count`
//! attributes become cumulative counters, and Cassandra's estimated latency
//! histograms are turned back into percentile gauges.
//!
//! # Architecture
//!
//! - `histogram`: bucket offsets and percentile estimation
//! - `bean`: value classification, bean id parsing, metric naming
//! - `source`: Jolokia response decoding and bean sources
//! - `sink`: metric publishing interface
//! - `collector`: one poll cycle with per-bean failure isolation
//! - `core`: configuration and errors
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```
//! use jmxstat_lib::bean::{attributes_from_json, BeanInterpreter};
//! use jmxstat_lib::core::ConfigBuilder;
//! use jmxstat_lib::histogram::HistogramEstimator;
//!
//! let settings = ConfigBuilder::new().prefix("cassandra").build()?.settings()?;
//! let estimator = HistogramEstimator::default();
//! let interpreter = BeanInterpreter::new(&settings, &estimator);
//!
//! let attributes = serde_json::json!({"Count": 42});
//! let result = interpreter.interpret(
//!     "org.apache.cassandra.metrics:type=ClientRequest,scope=Read,name=Latency",
//!     &attributes_from_json(attributes.as_object().unwrap()),
//! );
//! assert_eq!(result.metrics[0].name, "cassandra.org.apache.cassandra.metrics.Read.Latency.count");
//! # Ok::<(), jmxstat_lib::core::JmxstatError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod application;
pub mod bean;
pub mod cli;
pub mod collector;
pub mod core;
pub mod histogram;
pub mod sink;
pub mod source;

// Re-export core types for convenience
pub use crate::application::Application;
pub use crate::core::{Config, Result};
