//! GFZ adapter: half-hourly Hp30 and daily adjusted F10.7 radio flux.
//!
//! Both products are whitespace-delimited text with `#` comment headers and
//! fixed zero-based column indices. The numeric sentinel `-1.0` marks values
//! not yet recorded — those are missing, never zero.

use chrono::{Duration, NaiveDate};

use ionocast_core::domain::{FetchWindow, RawSeries};

use crate::feed::{FeedError, FeedSource};

/// Sentinel GFZ writes for values that do not exist yet.
pub const NOT_YET_RECORDED: f64 = -1.0;

fn is_sentinel(value: f64) -> bool {
    (value - NOT_YET_RECORDED).abs() < 1e-9
}

fn date_from_fields(fields: &[&str]) -> Option<NaiveDate> {
    let year = fields.first()?.parse().ok()?;
    let month = fields.get(1)?.parse().ok()?;
    let day = fields.get(2)?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse the Hp30 nowcast table: columns 0..=2 date parts, column 3 decimal
/// hour, column 7 the half-hourly index.
pub fn parse_hp30(text: &str, window: &FetchWindow) -> Result<RawSeries, FeedError> {
    let feed = FeedSource::GfzHp30;
    let mut series = RawSeries::new("hp_30");
    let mut parsed = 0usize;
    let mut dropped = 0usize;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let row = date_from_fields(&fields).and_then(|date| {
            let hour: f64 = fields.get(3)?.parse().ok()?;
            let value: f64 = fields.get(7)?.parse().ok()?;
            let at = date.and_hms_opt(0, 0, 0)?.and_utc()
                + Duration::seconds((hour * 3600.0).round() as i64);
            Some((at, value))
        });
        match row {
            Some((at, value)) => {
                parsed += 1;
                if !is_sentinel(value) && window.contains(at) {
                    series.push(at, value);
                }
            }
            None => {
                dropped += 1;
                log::warn!("{feed}: dropping malformed row: {line:?}");
            }
        }
    }

    if parsed == 0 {
        return Err(FeedError::Payload {
            feed,
            detail: "no parseable data rows".to_string(),
        });
    }
    log::debug!("{feed}: kept {} of {parsed} rows, dropped {dropped}", series.len());
    Ok(series)
}

/// Parse the daily indices table, keeping only the adjusted F10.7 flux
/// (column 26). Daily cadence means history before the fetch window is
/// deliberately retained — the latest recorded value gets carried into the
/// feature row downstream.
pub fn parse_f107(text: &str, window: &FetchWindow) -> Result<RawSeries, FeedError> {
    let feed = FeedSource::GfzF107;
    let mut series = RawSeries::new("f_107_adj");
    let mut parsed = 0usize;
    let mut dropped = 0usize;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let row = date_from_fields(&fields).and_then(|date| {
            let value: f64 = fields.get(26)?.parse().ok()?;
            Some((date.and_hms_opt(0, 0, 0)?.and_utc(), value))
        });
        match row {
            Some((at, value)) => {
                parsed += 1;
                if !is_sentinel(value) && at <= window.stop {
                    series.push(at, value);
                }
            }
            None => {
                dropped += 1;
                log::warn!("{feed}: dropping malformed row: {line:?}");
            }
        }
    }

    if parsed == 0 {
        return Err(FeedError::Payload {
            feed,
            detail: "no parseable data rows".to_string(),
        });
    }
    log::debug!("{feed}: kept {} of {parsed} rows, dropped {dropped}", series.len());
    Ok(series)
}

/// Most recent recorded value of a daily series (samples may be unordered).
pub fn latest_value(series: &RawSeries) -> Option<f64> {
    series
        .samples
        .iter()
        .filter(|s| s.value.is_finite())
        .max_by_key(|s| s.at)
        .map(|s| s.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn window() -> FetchWindow {
        FetchWindow::new(
            Utc.with_ymd_and_hms(2024, 3, 20, 6, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn hp30_parses_decimal_hours_and_skips_sentinels() {
        let text = "\
# Hp30 nowcast
# YYYY MM DD hh.h hh._m days days_m Hp30 ap30 D
2024 03 20  6.0  6.25 8845 8845.125  1.667  6 0
2024 03 20  6.5  6.75 8845 8845.146  2.000  7 0
2024 03 20  7.0  7.25 8845 8845.167 -1.000 -1 0
";
        let series = parse_hp30(text, &window()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.samples[1].at,
            Utc.with_ymd_and_hms(2024, 3, 20, 6, 30, 0).unwrap()
        );
        assert_eq!(series.samples[1].value, 2.0);
    }

    #[test]
    fn hp30_outside_window_is_dropped() {
        let text = "2024 03 19  6.0 x x x  1.5 0\n2024 03 20  8.0 x x x  2.5 0\n";
        let series = parse_hp30(text, &window()).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.samples[0].value, 2.5);
    }

    #[test]
    fn hp30_all_comments_is_payload_error() {
        let err = parse_hp30("# nothing\n# here\n", &window()).unwrap_err();
        assert!(matches!(err, FeedError::Payload { .. }));
    }

    fn f107_row(date: &str, value: f64) -> String {
        // 26 filler columns before the flux value
        let filler = vec!["0"; 23].join(" ");
        format!("{date} {filler} {value}\n")
    }

    #[test]
    fn f107_reads_column_26_and_keeps_history() {
        let mut text = String::from("# daily indices\n");
        text += &f107_row("2024 03 18", 151.8);
        text += &f107_row("2024 03 19", 150.3);
        text += &f107_row("2024 03 20", NOT_YET_RECORDED);

        let series = parse_f107(&text, &window()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(latest_value(&series), Some(150.3));
    }

    #[test]
    fn f107_rows_after_stop_are_dropped() {
        let mut text = String::new();
        text += &f107_row("2024 03 19", 150.3);
        text += &f107_row("2024 03 21", 149.0);
        let series = parse_f107(&text, &window()).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(latest_value(&series), Some(150.3));
    }
}
