//! Fetch window — the UTC time span one pipeline run covers.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A UTC time window `[start, stop]` for one fetch/assembly run.
///
/// The pipeline itself never consults the wall clock; callers (the serving
/// layer) decide what "now" is and build the window from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
}

impl FetchWindow {
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>) -> Self {
        debug_assert!(start <= stop, "window start after stop");
        Self { start, stop }
    }

    /// Window covering the `hours` hours ending at `stop`.
    pub fn ending_at(stop: DateTime<Utc>, hours: i64) -> Self {
        Self {
            start: stop - Duration::hours(hours),
            stop,
        }
    }

    pub fn duration(&self) -> Duration {
        self.stop - self.start
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.stop
    }
}
