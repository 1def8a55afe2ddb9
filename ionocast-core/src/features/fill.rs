//! Forward-fill for coarse-cadence columns.
//!
//! Hourly and daily indices (dst, radio flux) are carried across intervening
//! canonical buckets until a new upstream value arrives. This staleness is
//! deliberate and must stay visible: every repeated bucket lands in the
//! series' `carried` set so downstream consumers can tell a repeated value
//! from a fresh observation.

use chrono::{DateTime, Utc};

use crate::domain::GridSeries;
use crate::grid::CanonicalGrid;

/// Carry the last observation of `series` forward across every grid bucket
/// up to `series.last_timestamp()` (or `until`, if later). Buckets before
/// the first observation stay missing — filling never invents history.
pub fn forward_fill(
    series: &GridSeries,
    grid: &CanonicalGrid,
    until: Option<DateTime<Utc>>,
) -> GridSeries {
    let mut out = GridSeries::new(series.name.clone());
    let (Some(first), Some(mut last)) = (series.first_timestamp(), series.last_timestamp())
    else {
        return out;
    };
    if let Some(until) = until {
        last = last.max(grid.bucket_of(until));
    }

    let mut held: Option<f64> = None;
    for ts in grid.span(first, last) {
        match series.value_at(ts) {
            Some(fresh) => {
                held = Some(fresh);
                out.insert(ts, fresh);
                if series.carried.contains(&ts) {
                    out.carried.insert(ts);
                }
            }
            None => {
                if let Some(value) = held {
                    out.insert(ts, value);
                    out.carried.insert(ts);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, h, m, 0).unwrap()
    }

    #[test]
    fn fills_gaps_and_records_carried() {
        let grid = CanonicalGrid::default();
        let mut s = GridSeries::new("dst");
        s.insert(at(10, 0), -12.0);
        s.insert(at(11, 30), -20.0);

        let filled = forward_fill(&s, &grid, None);
        assert_eq!(filled.value_at(at(10, 30)), Some(-12.0));
        assert_eq!(filled.value_at(at(11, 0)), Some(-12.0));
        assert_eq!(filled.value_at(at(11, 30)), Some(-20.0));
        assert!(filled.carried.contains(&at(10, 30)));
        assert!(filled.carried.contains(&at(11, 0)));
        assert!(!filled.carried.contains(&at(10, 0)));
        assert!(!filled.carried.contains(&at(11, 30)));
    }

    #[test]
    fn extends_to_until_bound() {
        let grid = CanonicalGrid::default();
        let mut s = GridSeries::new("f_107_adj");
        s.insert(at(0, 0), 150.2);

        let filled = forward_fill(&s, &grid, Some(at(1, 45)));
        assert_eq!(filled.value_at(at(1, 30)), Some(150.2));
        assert!(filled.carried.contains(&at(1, 30)));
    }

    #[test]
    fn never_fills_before_first_observation() {
        let grid = CanonicalGrid::default();
        let mut s = GridSeries::new("dst");
        s.insert(at(10, 0), -12.0);
        let filled = forward_fill(&s, &grid, None);
        assert_eq!(filled.value_at(at(9, 30)), None);
    }

    #[test]
    fn empty_series_stays_empty() {
        let grid = CanonicalGrid::default();
        let filled = forward_fill(&GridSeries::new("dst"), &grid, Some(at(10, 0)));
        assert!(filled.is_empty());
    }
}
