//! Turns one bean's attribute tree into publishable metrics.

use super::meta::{split_bean_id, MetricMeta};
use super::name::{metric_name, percentile_name};
use super::value::{Attributes, BeanValue};
use crate::core::{CollectorSettings, JmxstatError, Result};
use crate::histogram::HistogramEstimator;
use crate::sink::{Dimensions, Metric};

/// An attribute that could not be interpreted
#[derive(Debug)]
pub struct AttributeFailure {
    /// `<bean id>.<attribute path>`
    pub path: String,
    /// What went wrong
    pub error: JmxstatError,
}

/// Result of interpreting one bean
#[derive(Debug, Default)]
pub struct Interpretation {
    /// Metrics to publish, in attribute order
    pub metrics: Vec<Metric>,
    /// Attributes that failed; the others are unaffected
    pub failures: Vec<AttributeFailure>,
}

impl Interpretation {
    /// True when nothing failed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Walks bean attributes with one settings snapshot and the shared estimator
pub struct BeanInterpreter<'a> {
    settings: &'a CollectorSettings,
    estimator: &'a HistogramEstimator,
}

impl<'a> BeanInterpreter<'a> {
    /// Create an interpreter
    pub fn new(settings: &'a CollectorSettings, estimator: &'a HistogramEstimator) -> Self {
        Self {
            settings,
            estimator,
        }
    }

    /// Interpret every attribute of the bean identified by `bean_id`
    pub fn interpret(&self, bean_id: &str, attributes: &Attributes) -> Interpretation {
        let mut interpretation = Interpretation::default();
        self.collect_bean(bean_id, attributes, &mut interpretation);
        interpretation
    }

    fn collect_bean(&self, prefix: &str, attributes: &Attributes, out: &mut Interpretation) {
        for (key, value) in attributes {
            match value {
                BeanValue::Scalar(number) => match self.parse_and_publish(prefix, key, *number) {
                    Ok(Some(metric)) => out.metrics.push(metric),
                    Ok(None) => {
                        tracing::debug!("Dropping {}.{}: name is empty after sanitizing", prefix, key);
                    },
                    Err(error) => out.failures.push(AttributeFailure {
                        path: format!("{}.{}", prefix, key),
                        error,
                    }),
                },
                BeanValue::Nested(inner) if self.settings.nested => {
                    self.collect_bean(&format!("{}.{}", prefix, key), inner, out);
                },
                BeanValue::BucketArray(buckets) if self.settings.nested => {
                    let path = format!("{}.{}", prefix, key);
                    out.metrics.extend(self.interpret_bean_with_list(&path, buckets));
                },
                BeanValue::Nested(_) | BeanValue::BucketArray(_) | BeanValue::Other => {},
            }
        }
    }

    /// Build the metric for scalar attribute `key` under `prefix`.
    ///
    /// `Ok(None)` means the name sanitized to nothing and the attribute is
    /// deliberately dropped.
    pub fn parse_and_publish(&self, prefix: &str, key: &str, value: f64) -> Result<Option<Metric>> {
        let (namespace, meta) = split_bean_id(prefix)?;
        let meta = MetricMeta::parse(meta)?;

        let Some(name) = metric_name(self.settings.prefix.as_deref(), namespace, &meta, key) else {
            return Ok(None);
        };

        let metric = if key.eq_ignore_ascii_case("count") {
            Metric::cumulative_counter(name, value, meta.dimensions)
        } else {
            Metric::gauge(name, value, meta.dimensions)
        };
        Ok(Some(metric))
    }

    /// Percentile gauges for a bucket array at `prefix`, or nothing when the
    /// path does not match the histogram pattern
    pub fn interpret_bean_with_list(&self, prefix: &str, buckets: &[f64]) -> Vec<Metric> {
        if !self.settings.is_histogram(prefix) {
            return Vec::new();
        }

        if !self.estimator.is_aligned(buckets) {
            tracing::warn!(
                "Histogram {} has {} buckets for {} offsets, clamping to the last offset",
                prefix,
                buckets.len(),
                self.estimator.offsets().len()
            );
        }

        let dimensions: Dimensions = MetricMeta::from_bean_id(prefix)
            .map(|meta| meta.dimensions)
            .unwrap_or_default();

        self.estimator
            .estimate_all(buckets, &self.settings.percentiles)
            .into_iter()
            .filter_map(|(percentile, value)| {
                percentile_name(prefix, percentile)
                    .map(|name| Metric::gauge(name, value, dimensions.clone()))
            })
            .collect()
    }
}
