//! Percentile reconstruction from Cassandra's estimated histograms.
//!
//! Cassandra publishes latency distributions as fixed arrays of bucket
//! counts. [`OffsetTable`] rebuilds the bucket boundaries and
//! [`HistogramEstimator`] turns counts back into approximate percentiles.

pub mod offsets;
pub mod percentile;

pub use offsets::{OffsetTable, CASSANDRA_BUCKET_COUNT, MAX_BUCKET_COUNT};
pub use percentile::{estimate, HistogramEstimator};
