//! Domain types shared across the pipeline.

pub mod series;
pub mod window;

pub use series::{GridSeries, RawSeries, Sample};
pub use window::FetchWindow;
