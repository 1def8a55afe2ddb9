//! Ionocast Core — the fusion and feature-engineering engine behind the
//! LSTID forecasting service.
//!
//! This crate contains every transform between raw provider samples and the
//! single feature row handed to the trained classifier:
//! - Domain types (samples, raw series, grid series, fetch windows)
//! - Canonical 30-minute grid and the bucket resampler
//! - Feature derivation: causal EMAs, forward-fill with staleness tracking,
//!   solar zenith geometry
//! - Regime classifier (seeded k-means over log-differences)
//! - Fusion merger and the model input schema contract
//! - Importance-weighted availability scoring
//!
//! Everything here is pure and synchronous: no network, no wall clock, no
//! shared mutable state. Network adapters live in `ionocast-feeds`.

pub mod availability;
pub mod domain;
pub mod features;
pub mod fuse;
pub mod grid;
pub mod regime;
pub mod resample;
pub mod schema;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: pipeline types cross thread boundaries.
    ///
    /// Adapter fetches run on rayon workers and hand their results to the
    /// single-threaded transform chain, so everything they produce or consume
    /// must be Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Sample>();
        require_sync::<domain::Sample>();
        require_send::<domain::RawSeries>();
        require_sync::<domain::RawSeries>();
        require_send::<domain::GridSeries>();
        require_sync::<domain::GridSeries>();
        require_send::<domain::FetchWindow>();
        require_sync::<domain::FetchWindow>();

        require_send::<grid::CanonicalGrid>();
        require_sync::<grid::CanonicalGrid>();

        require_send::<fuse::Frame>();
        require_sync::<fuse::Frame>();
        require_send::<fuse::FeatureRow>();
        require_sync::<fuse::FeatureRow>();

        require_send::<availability::FeatureWeights>();
        require_sync::<availability::FeatureWeights>();
        require_send::<availability::AvailabilityScore>();
        require_sync::<availability::AvailabilityScore>();
    }
}
