//! Exponential moving averages.
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2/(span+1).
//! Seed: the first present value. A missing bucket keeps the filter state and
//! stays missing in the output.
//!
//! The causal form at time t depends only on values at or before t. The
//! zero-phase form (forward pass, then backward pass over the reversed
//! output) removes lag at the cost of reading future values — it must never
//! run on a live inference path.

use crate::domain::GridSeries;
use crate::grid::CanonicalGrid;

/// Causal EMA over an optionally-gapped series.
pub fn ema(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    assert!(span >= 1, "EMA span must be >= 1");
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut state: Option<f64> = None;

    values
        .iter()
        .map(|v| match v {
            Some(x) => {
                let next = match state {
                    Some(prev) => alpha * x + (1.0 - alpha) * prev,
                    None => *x,
                };
                state = Some(next);
                Some(next)
            }
            None => None,
        })
        .collect()
}

/// Zero-phase EMA: forward pass, then EMA of the reversed output, reversed
/// back. Offline analysis only — output at t depends on values after t.
pub fn ema_zero_phase(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    let forward = ema(values, span);
    let mut reversed: Vec<Option<f64>> = forward.into_iter().rev().collect();
    reversed = ema(&reversed, span);
    reversed.into_iter().rev().collect()
}

/// EMA span (in buckets) for an `hours` horizon on the given grid.
pub fn span_for_hours(grid: &CanonicalGrid, hours: u32) -> usize {
    (hours as usize * grid.buckets_per_hour()).max(1)
}

/// Derive the `{base}_mav_{h}h` column: a causal EMA of `series` at the
/// `hours` horizon, evaluated over every grid bucket between the series'
/// first and last observation.
pub fn moving_average(series: &GridSeries, grid: &CanonicalGrid, hours: u32) -> GridSeries {
    let name = format!("{}_mav_{}h", series.name, hours);
    let mut out = GridSeries::new(name);

    let (Some(first), Some(last)) = (series.first_timestamp(), series.last_timestamp()) else {
        return out;
    };

    let buckets = grid.span(first, last);
    let values: Vec<Option<f64>> = buckets.iter().map(|&ts| series.value_at(ts)).collect();
    let smoothed = ema(&values, span_for_hours(grid, hours));

    for (ts, value) in buckets.into_iter().zip(smoothed) {
        if let Some(v) = value {
            out.insert(ts, v);
        }
    }
    out
}
