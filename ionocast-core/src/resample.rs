//! Bucket resampler: irregular provider samples onto the canonical grid.
//!
//! Pure function of its inputs — same series, same grid, same aggregation
//! always yields the same table. Buckets with no contributing samples stay
//! missing; the resampler never extrapolates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{GridSeries, RawSeries};
use crate::grid::CanonicalGrid;

/// Per-bucket aggregation.
///
/// Mean suits noisy continuous signals, median resists single-sensor spikes
/// (multi-station and solar-wind data), max is reserved for quantities where
/// peak behavior is itself the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    Mean,
    Median,
    Max,
}

impl Aggregation {
    fn apply(&self, bucket: &mut Vec<f64>) -> f64 {
        match self {
            Aggregation::Mean => bucket.iter().sum::<f64>() / bucket.len() as f64,
            Aggregation::Median => {
                bucket.sort_by(|a, b| a.partial_cmp(b).expect("finite sample values"));
                let n = bucket.len();
                if n % 2 == 1 {
                    bucket[n / 2]
                } else {
                    (bucket[n / 2 - 1] + bucket[n / 2]) / 2.0
                }
            }
            Aggregation::Max => bucket
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Aggregate every sample of `series` into its grid bucket.
///
/// Non-finite samples are dropped before aggregation so one bad reading
/// cannot poison a whole bucket.
pub fn resample(series: &RawSeries, grid: &CanonicalGrid, agg: Aggregation) -> GridSeries {
    let mut buckets: BTreeMap<DateTime<Utc>, Vec<f64>> = BTreeMap::new();
    for sample in &series.samples {
        if !sample.value.is_finite() {
            continue;
        }
        buckets
            .entry(grid.bucket_of(sample.at))
            .or_default()
            .push(sample.value);
    }

    let mut out = GridSeries::new(series.name.clone());
    for (bucket_ts, mut values) in buckets {
        out.insert(bucket_ts, agg.apply(&mut values));
    }
    out
}

/// Resample a set of series with one aggregation.
pub fn resample_all(
    series: &[RawSeries],
    grid: &CanonicalGrid,
    agg: Aggregation,
) -> Vec<GridSeries> {
    series.iter().map(|s| resample(s, grid, agg)).collect()
}
