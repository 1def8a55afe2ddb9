//! TechTIDE adapters: HF-INT activity index and per-station ionosonde
//! perturbation metrics.
//!
//! Both products arrive as a ZIP of fixed-format text reports. Reports that
//! do not match the expected layout are dropped, not fatal — upstream
//! regularly ships truncated or half-written files and the pipeline must
//! shrug those off.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};

use ionocast_core::domain::{RawSeries, Sample};

use crate::archive::text_entries;
use crate::feed::{FeedError, FeedSource};

/// Archive entry prefix of HF-INT activity reports.
pub const ACTIVITY_REPORT_PREFIX: &str = "TechTIDE_hficond_";
/// Archive entry prefix of ionosonde metric reports.
pub const IONOSONDE_REPORT_PREFIX: &str = "TechTIDE_hfi_";

/// Metric label in the report header → model column stem.
const IONOSONDE_METRICS: &[(&str, &str)] = &[
    ("SPCONT", "spectral_contribution"),
    ("VEL", "velocity"),
    ("AZI", "azimuth"),
];

/// Parse an HF-INT activity archive into the `hf` series.
///
/// Each report's first line carries a compact `YYYYMMDDHHMM` stamp and an
/// `ActivityIndex=<value>` tag; a report missing either is skipped.
pub fn parse_activity_archive(bytes: &[u8]) -> Result<RawSeries, FeedError> {
    let feed = FeedSource::TechTideActivity;
    let mut series = RawSeries::new("hf");
    let mut dropped = 0usize;

    for report in text_entries(feed, bytes, ACTIVITY_REPORT_PREFIX)? {
        let first_line = report.lines().next().unwrap_or("");
        match parse_activity_header(first_line) {
            Some(sample) => series.samples.push(sample),
            None => {
                dropped += 1;
                log::warn!("{feed}: dropping malformed report header: {first_line:?}");
            }
        }
    }

    log::debug!(
        "{feed}: kept {} reports, dropped {dropped}",
        series.len()
    );
    Ok(series)
}

fn parse_activity_header(line: &str) -> Option<Sample> {
    let at = find_compact_timestamp(line)?;
    let value = labelled_value(line, "ActivityIndex=")?;
    Some(Sample::new(at, value))
}

/// First run of at least 12 ASCII digits, read as `YYYYMMDDHHMM`.
fn find_compact_timestamp(line: &str) -> Option<DateTime<Utc>> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start >= 12 {
                return parse_compact_timestamp(&line[start..start + 12]);
            }
        } else {
            i += 1;
        }
    }
    None
}

pub(crate) fn parse_compact_timestamp(digits: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M")
        .ok()
        .map(|t| t.and_utc())
}

/// Numeric value following `label` (possibly space-padded).
fn labelled_value(line: &str, label: &str) -> Option<f64> {
    let rest = &line[line.find(label)? + label.len()..];
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Parse an ionosonde metrics archive, pivoted to one series per metric per
/// allow-listed station.
///
/// Report layout: a title line, a whitespace-delimited header row naming the
/// columns (`STA`, `DATE&TIME`, `SPCONT`, `VEL`, `AZI`, …), then data rows.
/// Station codes are normalized to their first two letters, lowercased.
/// Every requested station/metric column exists in the output even when no
/// row survived — an empty column is degraded data, not a schema hole.
pub fn parse_ionosonde_archive(
    bytes: &[u8],
    stations: &[String],
) -> Result<Vec<RawSeries>, FeedError> {
    let feed = FeedSource::TechTideIonosondes;

    let mut columns: BTreeMap<String, RawSeries> = BTreeMap::new();
    for station in stations {
        for (_, stem) in IONOSONDE_METRICS {
            let name = format!("{stem}_{}", station_code(station));
            columns.insert(name.clone(), RawSeries::new(name));
        }
    }

    let mut dropped = 0usize;
    for report in text_entries(feed, bytes, IONOSONDE_REPORT_PREFIX)? {
        let mut lines = report.lines();
        let _title = lines.next();
        let Some(header) = lines.next() else {
            dropped += 1;
            log::warn!("{feed}: dropping report without a header row");
            continue;
        };

        let cols: Vec<&str> = header.split_whitespace().collect();
        let position = |name: &str| cols.iter().position(|c| *c == name);
        let (Some(sta_idx), Some(time_idx)) = (position("STA"), position("DATE&TIME")) else {
            dropped += 1;
            log::warn!("{feed}: dropping report with unrecognized header: {header:?}");
            continue;
        };
        let metric_idx: Vec<(usize, &str)> = IONOSONDE_METRICS
            .iter()
            .filter_map(|&(label, stem)| position(label).map(|i| (i, stem)))
            .collect();

        for row in lines {
            let fields: Vec<&str> = row.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            let Some(station) = fields.get(sta_idx).copied() else {
                dropped += 1;
                continue;
            };
            if !stations.iter().any(|s| s == station) {
                continue;
            }
            let at = fields
                .get(time_idx)
                .and_then(|t| parse_compact_timestamp(t));
            let Some(at) = at else {
                dropped += 1;
                log::warn!("{feed}: dropping row with bad timestamp: {row:?}");
                continue;
            };

            let code = station_code(station);
            for &(idx, stem) in &metric_idx {
                let Some(value) = fields.get(idx).and_then(|v| v.parse::<f64>().ok()) else {
                    continue;
                };
                columns
                    .entry(format!("{stem}_{code}"))
                    .or_insert_with(|| RawSeries::new(format!("{stem}_{code}")))
                    .push(at, value);
            }
        }
    }

    if dropped > 0 {
        log::debug!("{feed}: dropped {dropped} malformed rows/reports");
    }
    Ok(columns.into_values().collect())
}

/// `JR055` → `jr`: first two letters, lowercased.
fn station_code(station: &str) -> String {
    station.chars().take(2).flat_map(char::to_lowercase).collect()
}
