//! NOAA SWPC adapter: propagated solar wind and the Kyoto Dst ring-current
//! index.
//!
//! Both endpoints serve a JSON array whose row 0 is itself the header row;
//! every other cell is a string (or null) and must be coerced to numeric.
//! The solar-wind rows carry forward-propagated arrival times, so only rows
//! strictly before the requested cutoff may enter the pipeline.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use ionocast_core::domain::{RawSeries, Sample};

use crate::feed::{FeedError, FeedSource};

/// Newell coupling: energy-transfer proxy from field components and wind
/// speed, `v^(4/3) · (by² + bz²)^(1/3) · sin(atan(|by/bz|)/2)^(8/3)`,
/// rounded to one decimal.
pub fn newell_coupling(by: f64, bz: f64, speed: f64) -> f64 {
    let clock = (by / bz).abs().atan();
    let raw = speed.powf(4.0 / 3.0)
        * (by * by + bz * bz).powf(1.0 / 3.0)
        * (clock / 2.0).sin().powf(8.0 / 3.0);
    (raw * 10.0).round() / 10.0
}

/// Decode a header-row JSON table into (header, data rows).
fn parse_table(feed: FeedSource, text: &str) -> Result<(Vec<String>, Vec<Vec<Value>>), FeedError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(text).map_err(|e| FeedError::Payload {
        feed,
        detail: format!("not a JSON table: {e}"),
    })?;
    let mut rows = rows.into_iter();
    let header = rows.next().ok_or_else(|| FeedError::Payload {
        feed,
        detail: "empty table".to_string(),
    })?;
    let header: Vec<String> = header
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect::<Option<_>>()
        .ok_or_else(|| FeedError::Payload {
            feed,
            detail: "non-string header row".to_string(),
        })?;
    Ok((header, rows.collect()))
}

fn column(
    feed: FeedSource,
    header: &[String],
    name: &str,
) -> Result<usize, FeedError> {
    header
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| FeedError::Payload {
            feed,
            detail: format!("missing column '{name}'"),
        })
}

fn numeric(cell: Option<&Value>) -> Option<f64> {
    match cell? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn timestamp(cell: Option<&Value>) -> Option<DateTime<Utc>> {
    let s = cell?.as_str()?;
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Some(t.and_utc());
        }
    }
    None
}

/// Parse the propagated solar-wind table into `rho`, `by`, `bz`, `speed`
/// and the derived `newell` series, keeping rows strictly before `cutoff`.
pub fn parse_solar_wind(text: &str, cutoff: DateTime<Utc>) -> Result<Vec<RawSeries>, FeedError> {
    let feed = FeedSource::NoaaSolarWind;
    let (header, rows) = parse_table(feed, text)?;

    let time_idx = column(feed, &header, "propagated_time_tag")?;
    let rho_idx = column(feed, &header, "density")?;
    let by_idx = column(feed, &header, "by")?;
    let bz_idx = column(feed, &header, "bz")?;
    let speed_idx = column(feed, &header, "speed")?;

    let mut rho = RawSeries::new("rho");
    let mut by = RawSeries::new("by");
    let mut bz = RawSeries::new("bz");
    let mut speed = RawSeries::new("speed");
    let mut newell = RawSeries::new("newell");
    let mut dropped = 0usize;

    for row in &rows {
        let Some(at) = timestamp(row.get(time_idx)) else {
            dropped += 1;
            log::warn!("{feed}: dropping row with bad time tag");
            continue;
        };
        if at >= cutoff {
            continue;
        }

        let by_v = numeric(row.get(by_idx));
        let bz_v = numeric(row.get(bz_idx));
        let speed_v = numeric(row.get(speed_idx));

        if let Some(v) = numeric(row.get(rho_idx)) {
            rho.push(at, v);
        }
        if let Some(v) = by_v {
            by.push(at, v);
        }
        if let Some(v) = bz_v {
            bz.push(at, v);
        }
        if let Some(v) = speed_v {
            speed.push(at, v);
        }
        if let (Some(by_v), Some(bz_v), Some(speed_v)) = (by_v, bz_v, speed_v) {
            newell
                .samples
                .push(Sample::new(at, newell_coupling(by_v, bz_v, speed_v)));
        }
    }

    if dropped > 0 {
        log::debug!("{feed}: dropped {dropped} rows");
    }
    Ok(vec![rho, by, bz, speed, newell])
}

/// Parse the Kyoto Dst table, keeping rows strictly before `cutoff`.
pub fn parse_dst(text: &str, cutoff: DateTime<Utc>) -> Result<RawSeries, FeedError> {
    let feed = FeedSource::NoaaDst;
    let (header, rows) = parse_table(feed, text)?;

    let time_idx = column(feed, &header, "time_tag")?;
    let dst_idx = column(feed, &header, "dst")?;

    let mut series = RawSeries::new("dst");
    let mut dropped = 0usize;
    for row in &rows {
        let Some(at) = timestamp(row.get(time_idx)) else {
            dropped += 1;
            log::warn!("{feed}: dropping row with bad time tag");
            continue;
        };
        if at >= cutoff {
            continue;
        }
        if let Some(v) = numeric(row.get(dst_idx)) {
            series.push(at, v);
        }
    }

    if dropped > 0 {
        log::debug!("{feed}: dropped {dropped} rows");
    }
    Ok(series)
}
