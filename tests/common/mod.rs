//! Common test utilities and fixtures.

#![allow(dead_code)]

use jmxstat_lib::bean::{attributes_from_json, Attributes};
use jmxstat_lib::core::config::shared;
use jmxstat_lib::core::{CollectorSettings, ConfigBuilder};
use jmxstat_lib::collector::Collector;
use jmxstat_lib::source::Bean;
use std::path::PathBuf;

/// Path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Classify a JSON object literal as bean attributes.
pub fn attributes(value: serde_json::Value) -> Attributes {
    attributes_from_json(value.as_object().expect("attributes must be a JSON object"))
}

/// Build a bean from an id and a JSON object literal.
pub fn bean(id: &str, value: serde_json::Value) -> Bean {
    Bean {
        id: id.to_string(),
        attributes: attributes(value),
    }
}

/// Cassandra-style bucket array with `count` observations in each listed bucket.
pub fn buckets(filled: &[(usize, u64)]) -> serde_json::Value {
    let mut buckets = vec![0u64; 92];
    for &(index, count) in filled {
        buckets[index] = count;
    }
    serde_json::json!(buckets)
}

/// Compile settings from a builder.
pub fn settings(builder: ConfigBuilder) -> CollectorSettings {
    builder
        .build()
        .expect("valid test config")
        .settings()
        .expect("valid test settings")
}

/// Collector over settings compiled from a builder.
pub fn collector(builder: ConfigBuilder) -> Collector {
    Collector::new(shared(settings(builder)))
}
