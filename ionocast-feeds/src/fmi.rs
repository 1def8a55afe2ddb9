//! FMI IMAGE adapter: upper and lower auroral electrojet indices.
//!
//! Whitespace-delimited realtime text with `%` comment lines. The feed
//! reports the `iu` and `il` sub-indices; the electrojet indicator the
//! model consumes is their difference, `ie = iu − il`.

use chrono::NaiveDate;

use ionocast_core::domain::{FetchWindow, RawSeries};

use crate::feed::{FeedError, FeedSource};

/// Parse the realtime IU/IL table into `iu` and the derived `ie` series.
pub fn parse_electrojet(text: &str, window: &FetchWindow) -> Result<Vec<RawSeries>, FeedError> {
    let feed = FeedSource::FmiElectrojet;
    let mut iu = RawSeries::new("iu");
    let mut ie = RawSeries::new("ie");
    let mut parsed = 0usize;
    let mut dropped = 0usize;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let row = (|| {
            let year = fields.first()?.parse().ok()?;
            let month = fields.get(1)?.parse().ok()?;
            let day = fields.get(2)?.parse().ok()?;
            let hour = fields.get(3)?.parse().ok()?;
            let minute = fields.get(4)?.parse().ok()?;
            let second = fields.get(5)?.parse().ok()?;
            let iu_value: f64 = fields.get(6)?.parse().ok()?;
            let il_value: f64 = fields.get(7)?.parse().ok()?;
            let at = NaiveDate::from_ymd_opt(year, month, day)?
                .and_hms_opt(hour, minute, second)?
                .and_utc();
            Some((at, iu_value, il_value))
        })();

        match row {
            Some((at, iu_value, il_value)) => {
                parsed += 1;
                if window.contains(at) {
                    iu.push(at, iu_value);
                    ie.push(at, iu_value - il_value);
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
    log::debug!("{feed}: kept {} of {parsed} rows, dropped {dropped}", iu.len());
    Ok(vec![iu, ie])
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
    fn ie_is_the_difference_of_sub_indices() {
        let text = "\
% IMAGE realtime electrojet indicators
% year month day hour min sec IU IL
2024 03 20 11 30 00 120.5 -80.5
2024 03 20 11 40 00 118.0 -75.0
";
        let series = parse_electrojet(text, &window()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "iu");
        assert_eq!(series[1].name, "ie");
        assert_eq!(series[0].samples[0].value, 120.5);
        assert_eq!(series[1].samples[0].value, 201.0);
        assert_eq!(
            series[1].samples[0].at,
            Utc.with_ymd_and_hms(2024, 3, 20, 11, 30, 0).unwrap()
        );
    }

    #[test]
    fn rows_outside_window_are_dropped() {
        let text = "2024 03 19 11 30 00 120.5 -80.5\n2024 03 20 11 30 00 100.0 -50.0\n";
        let series = parse_electrojet(text, &window()).unwrap();
        assert_eq!(series[0].len(), 1);
        assert_eq!(series[1].samples[0].value, 150.0);
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let text = "\
2024 03 20 11 30 00 120.5 -80.5
2024 03 20 11 40 00 oops -75.0
";
        let series = parse_electrojet(text, &window()).unwrap();
        assert_eq!(series[0].len(), 1);
    }

    #[test]
    fn comment_only_payload_is_fatal() {
        let err = parse_electrojet("% nothing here\n", &window()).unwrap_err();
        assert!(matches!(err, FeedError::Payload { .. }));
    }
}
