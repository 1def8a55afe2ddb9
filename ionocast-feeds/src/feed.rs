//! Feed identifiers, structured error types, and the adapter seam.
//!
//! `FeedSet` abstracts over the five upstream providers so the assembly
//! driver can run against the real HTTP client or against canned payloads
//! in tests. Errors here are all of the fatal, source-unavailable kind;
//! individually malformed records never become a `FeedError` — adapters
//! skip them and log.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use ionocast_core::domain::{FetchWindow, RawSeries};

/// Which upstream a sample or an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    TechTideActivity,
    TechTideIonosondes,
    GfzHp30,
    GfzF107,
    NoaaSolarWind,
    NoaaDst,
    FmiElectrojet,
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeedSource::TechTideActivity => "techtide hf-int activity",
            FeedSource::TechTideIonosondes => "techtide ionosondes",
            FeedSource::GfzHp30 => "gfz hp30",
            FeedSource::GfzF107 => "gfz f10.7",
            FeedSource::NoaaSolarWind => "noaa solar wind",
            FeedSource::NoaaDst => "noaa dst",
            FeedSource::FmiElectrojet => "fmi electrojet",
        };
        f.write_str(name)
    }
}

/// Fatal per-source failures. Any of these aborts the assembly for the
/// window — the pipeline never substitutes stale or default data.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("{feed}: upstream unreachable: {detail}")]
    Unreachable { feed: FeedSource, detail: String },

    #[error("{feed}: request timed out")]
    Timeout { feed: FeedSource },

    #[error("{feed}: upstream returned HTTP {status}")]
    Status { feed: FeedSource, status: u16 },

    #[error("{feed}: payload unreadable: {detail}")]
    Payload { feed: FeedSource, detail: String },
}

impl FeedError {
    pub fn source_id(&self) -> FeedSource {
        match self {
            FeedError::Unreachable { feed, .. }
            | FeedError::Timeout { feed }
            | FeedError::Status { feed, .. }
            | FeedError::Payload { feed, .. } => *feed,
        }
    }
}

/// The five provider fetch operations the assembly driver needs.
///
/// Implemented by [`crate::HttpFeeds`] over the real endpoints and by test
/// stubs over canned payloads. Fetches share no mutable state and may run
/// concurrently; retry policy belongs to the serving layer, not here.
pub trait FeedSet: Send + Sync {
    /// Adapter A: HF interferometry activity index (`hf`).
    fn activity_index(&self, window: &FetchWindow) -> Result<RawSeries, FeedError>;

    /// Adapter B: per-station ionosonde perturbation metrics, pivoted to
    /// one column per metric per allow-listed station.
    fn ionosonde_metrics(
        &self,
        window: &FetchWindow,
        stations: &[String],
    ) -> Result<Vec<RawSeries>, FeedError>;

    /// Adapter C, half-hourly product: geomagnetic Hp30 (`hp_30`).
    fn hp30(&self, window: &FetchWindow) -> Result<RawSeries, FeedError>;

    /// Adapter C, daily product: adjusted 10.7 cm radio flux (`f_107_adj`).
    fn f107(&self, window: &FetchWindow) -> Result<RawSeries, FeedError>;

    /// Adapter D: propagated solar wind (`rho`, `by`, `bz`, `speed`,
    /// derived `newell`), rows strictly before `cutoff`.
    fn solar_wind(&self, cutoff: DateTime<Utc>) -> Result<Vec<RawSeries>, FeedError>;

    /// Adapter D: ring-current index (`dst`), rows strictly before `cutoff`.
    fn dst(&self, cutoff: DateTime<Utc>) -> Result<RawSeries, FeedError>;

    /// Adapter E: IMAGE electrojet indices (`iu`, derived `ie`).
    fn electrojet(&self, window: &FetchWindow) -> Result<Vec<RawSeries>, FeedError>;
}
