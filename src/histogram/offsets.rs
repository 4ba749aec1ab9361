//! Bucket boundaries of Cassandra's estimated histograms.
//!
//! Each offset is the inclusive upper bound of a bucket: bucket `i` counts
//! observations in `(offsets[i - 1], offsets[i]]`. Offsets start at 1 and grow
//! by a factor of 1.2, rounded, never repeating a value. With the 91 buckets
//! Cassandra uses, the table ends at about 36 million. Offsets are `u64`, which
//! caps the table at [`MAX_BUCKET_COUNT`] buckets.

use crate::core::{JmxstatError, Result};

/// Bucket count of Cassandra's latency histograms
pub const CASSANDRA_BUCKET_COUNT: usize = 91;

/// Largest bucket count whose last offset still fits in a `u64`
pub const MAX_BUCKET_COUNT: usize = 238;

const GROWTH_FACTOR: f64 = 1.2;

/// Ordered, strictly increasing histogram bucket boundaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetTable {
    offsets: Vec<u64>,
}

impl OffsetTable {
    /// Build the table for `bucket_count` buckets; the result holds
    /// `bucket_count + 1` offsets, the first one being 1.
    ///
    /// Fails with [`JmxstatError::OffsetOverflow`] past [`MAX_BUCKET_COUNT`]
    /// buckets, where the next offset no longer fits in a `u64`.
    pub fn build(bucket_count: usize) -> Result<Self> {
        let overflow = || JmxstatError::OffsetOverflow {
            bucket_count,
            max: MAX_BUCKET_COUNT,
        };

        // u64::MAX rounds up to 2^64 as f64: anything at or above it would
        // saturate in the cast below
        #[allow(clippy::cast_precision_loss)]
        let ceiling = u64::MAX as f64;

        let mut offsets = Vec::with_capacity(bucket_count.min(MAX_BUCKET_COUNT) + 1);
        let mut last = 1u64;
        offsets.push(last);

        for _ in 0..bucket_count {
            #[allow(clippy::cast_precision_loss)]
            let scaled = (last as f64 * GROWTH_FACTOR).round();
            if scaled >= ceiling {
                return Err(overflow());
            }

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let mut next = scaled as u64;
            // Small values round back to themselves
            if next == last {
                next = next.checked_add(1).ok_or_else(overflow)?;
            }
            offsets.push(next);
            last = next;
        }

        Ok(Self { offsets })
    }

    /// Table matching Cassandra's histogram resolution
    pub fn cassandra() -> Self {
        Self::build(CASSANDRA_BUCKET_COUNT).expect("Cassandra bucket count is below MAX_BUCKET_COUNT")
    }

    /// Offset at `index`
    pub fn get(&self, index: usize) -> Option<u64> {
        self.offsets.get(index).copied()
    }

    /// Width of bucket `index`, i.e. `offsets[index] - offsets[index - 1]`.
    ///
    /// The first bucket spans `(0, offsets[0]]`. Indices past the end are
    /// clamped to the last bucket.
    pub fn bucket_width(&self, index: usize) -> u64 {
        let index = index.min(self.offsets.len() - 1);
        let upper = self.offsets[index];
        let lower = match index {
            0 => 0,
            i => self.offsets[i - 1],
        };
        upper - lower
    }

    /// All offsets in order
    pub fn as_slice(&self) -> &[u64] {
        &self.offsets
    }

    /// Number of offsets (bucket count + 1)
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Never true: the seed offset is always present
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

impl Default for OffsetTable {
    fn default() -> Self {
        Self::cassandra()
    }
}
