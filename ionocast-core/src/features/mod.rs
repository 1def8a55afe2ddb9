//! Derived features over canonical-grid series.
//!
//! Three families: exponential moving averages (causal for anything that
//! feeds the live predictor, zero-phase only for offline analysis),
//! forward-fill of coarse-cadence columns with explicit staleness tracking,
//! and solar geometry.

pub mod ema;
pub mod fill;
pub mod solar;

pub use ema::{ema, ema_zero_phase, moving_average, span_for_hours};
pub use fill::forward_fill;
pub use solar::{solar_zenith_angle, GroundStation};
