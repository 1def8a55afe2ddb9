//! Canonical time grid.
//!
//! Every source is aligned to the same fixed-interval, epoch-aligned bucket
//! sequence before fusion, so tables can be joined by timestamp equality.
//! The grid is a value type: once constructed for a fetch window it never
//! changes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default bucket width of the pipeline: 30 minutes.
pub const DEFAULT_INTERVAL_MINUTES: i64 = 30;

/// A fixed-interval timestamp grid aligned to the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalGrid {
    interval_seconds: i64,
}

impl CanonicalGrid {
    /// Grid with the given bucket width. Panics on a non-positive interval,
    /// which is a programming error, not an input condition.
    pub fn with_interval(interval: Duration) -> Self {
        let secs = interval.num_seconds();
        assert!(secs > 0, "grid interval must be positive");
        Self {
            interval_seconds: secs,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::seconds(self.interval_seconds)
    }

    pub fn interval_seconds(&self) -> i64 {
        self.interval_seconds
    }

    /// Buckets per hour; zero when the interval exceeds an hour.
    pub fn buckets_per_hour(&self) -> usize {
        (3600 / self.interval_seconds) as usize
    }

    /// Floor a timestamp onto the grid (epoch-aligned).
    pub fn bucket_of(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let secs = at.timestamp().div_euclid(self.interval_seconds) * self.interval_seconds;
        DateTime::from_timestamp(secs, 0).expect("bucket timestamp in range")
    }

    /// The strictly increasing bucket sequence covering `[start, stop]`.
    pub fn span(&self, start: DateTime<Utc>, stop: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let mut out = Vec::new();
        if start > stop {
            return out;
        }
        let mut cursor = self.bucket_of(start);
        let stop_bucket = self.bucket_of(stop);
        while cursor <= stop_bucket {
            out.push(cursor);
            cursor += self.interval();
        }
        out
    }
}

impl Default for CanonicalGrid {
    fn default() -> Self {
        Self::with_interval(Duration::minutes(DEFAULT_INTERVAL_MINUTES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bucket_floors_to_half_hour() {
        let grid = CanonicalGrid::default();
        let at = Utc.with_ymd_and_hms(2024, 3, 20, 10, 44, 59).unwrap();
        assert_eq!(
            grid.bucket_of(at),
            Utc.with_ymd_and_hms(2024, 3, 20, 10, 30, 0).unwrap()
        );
        let exact = Utc.with_ymd_and_hms(2024, 3, 20, 10, 30, 0).unwrap();
        assert_eq!(grid.bucket_of(exact), exact);
    }

    #[test]
    fn bucket_floors_pre_epoch_times() {
        let grid = CanonicalGrid::default();
        let at = Utc.with_ymd_and_hms(1969, 12, 31, 23, 45, 0).unwrap();
        assert_eq!(
            grid.bucket_of(at),
            Utc.with_ymd_and_hms(1969, 12, 31, 23, 30, 0).unwrap()
        );
    }

    #[test]
    fn span_is_strictly_increasing_and_inclusive() {
        let grid = CanonicalGrid::default();
        let start = Utc.with_ymd_and_hms(2024, 3, 20, 10, 5, 0).unwrap();
        let stop = Utc.with_ymd_and_hms(2024, 3, 20, 11, 35, 0).unwrap();
        let span = grid.span(start, stop);
        assert_eq!(span.len(), 4); // 10:00, 10:30, 11:00, 11:30
        assert!(span.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(span[0], Utc.with_ymd_and_hms(2024, 3, 20, 10, 0, 0).unwrap());
        assert_eq!(
            *span.last().unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 20, 11, 30, 0).unwrap()
        );
    }

    #[test]
    fn buckets_per_hour_for_default_grid() {
        assert_eq!(CanonicalGrid::default().buckets_per_hour(), 2);
    }
}
