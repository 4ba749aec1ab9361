//! Percentile estimation over bucketed latency histograms.
//!
//! Cassandra only exposes bucket counts, not samples, so a percentile can only
//! be approximated: find the bucket holding the requested rank and report half
//! of that bucket's width.

use super::offsets::OffsetTable;

/// Estimate the value at `percentile` for `buckets`, index-aligned with
/// `offsets`.
///
/// Returns 0 when the histogram holds no observations. Buckets beyond the
/// end of `offsets` are clamped to the last offset. If no bucket reaches the
/// target rank (percentile above 100, negative counts) the last bucket's
/// estimate is returned.
pub fn estimate(offsets: &OffsetTable, buckets: &[f64], percentile: u8) -> f64 {
    let total: f64 = buckets.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let target_rank = (total * (f64::from(percentile) / 100.0)).floor();

    let mut seen = 0.0;
    for (index, count) in buckets.iter().enumerate() {
        seen += count;
        if seen >= target_rank {
            return half_width(offsets, index);
        }
    }

    half_width(offsets, buckets.len().saturating_sub(1))
}

#[allow(clippy::cast_precision_loss)]
fn half_width(offsets: &OffsetTable, index: usize) -> f64 {
    (offsets.bucket_width(index) as f64 / 2.0).round()
}

/// Estimator bound to the offset table built once at startup
#[derive(Debug, Clone, Default)]
pub struct HistogramEstimator {
    offsets: OffsetTable,
}

impl HistogramEstimator {
    /// Create an estimator over `offsets`
    pub fn new(offsets: OffsetTable) -> Self {
        Self { offsets }
    }

    /// Estimate a single percentile
    pub fn estimate(&self, buckets: &[f64], percentile: u8) -> f64 {
        estimate(&self.offsets, buckets, percentile)
    }

    /// Estimate every percentile in `percentiles`, in order
    pub fn estimate_all(&self, buckets: &[f64], percentiles: &[u8]) -> Vec<(u8, f64)> {
        percentiles
            .iter()
            .map(|&p| (p, self.estimate(buckets, p)))
            .collect()
    }

    /// Whether `buckets` has one count per offset
    pub fn is_aligned(&self, buckets: &[f64]) -> bool {
        buckets.len() == self.offsets.len()
    }

    /// The offset table in use
    pub fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }
}
