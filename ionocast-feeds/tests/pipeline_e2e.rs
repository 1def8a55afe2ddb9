//! End-to-end pipeline test over canned provider payloads.
//!
//! A 6-hour window with realistic fixed-content payloads for all five
//! adapters; the activity archive deliberately contains two malformed
//! report files. The pipeline must produce exactly one feature row at the
//! latest canonical timestamp, with the malformed reports excluded and no
//! error raised.

use std::io::{Cursor, Write};

use chrono::{DateTime, Duration, TimeZone, Utc};
use zip::write::SimpleFileOptions;

use ionocast_core::availability::FeatureWeights;
use ionocast_core::domain::{FetchWindow, RawSeries};
use ionocast_core::fuse::FeatureValue;
use ionocast_core::schema::MODEL_SCHEMA;
use ionocast_feeds::noaa::newell_coupling;
use ionocast_feeds::{assemble, fmi, gfz, noaa, techtide};
use ionocast_feeds::{AssembleError, FeedError, FeedSet, FeedSource, PipelineConfig};

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 20, h, m, 0).unwrap()
}

fn window() -> FetchWindow {
    FetchWindow::new(at(6, 0), at(12, 0))
}

const STATIONS: [&str; 6] = ["AT138", "FF051", "JR055", "PQ052", "RO041", "VT139"];

// ── Canned payloads ──────────────────────────────────────────────────

fn activity_zip() -> Vec<u8> {
    let opts = SimpleFileOptions::default();
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));

    let mut t = at(6, 0);
    while t < at(12, 0) {
        let stamp = t.format("%Y%m%d%H%M").to_string();
        let value = if t >= at(11, 30) { 2.5 } else { 2.0 };
        writer
            .start_file(format!("TechTIDE_hficond_{stamp}.txt"), opts)
            .unwrap();
        writer
            .write_all(
                format!("HF-INT EU {stamp} ActivityIndex= {value:.2}\nreport body\n").as_bytes(),
            )
            .unwrap();
        t += Duration::minutes(10);
    }

    // Two malformed reports: one with no usable header at all, one with a
    // timestamp but no activity tag.
    writer
        .start_file("TechTIDE_hficond_broken1.txt", opts)
        .unwrap();
    writer.write_all(b"HF-INT EU report torn mid-write\n").unwrap();
    writer
        .start_file("TechTIDE_hficond_broken2.txt", opts)
        .unwrap();
    writer.write_all(b"HF-INT EU 202403201145\n").unwrap();

    writer.finish().unwrap().into_inner()
}

fn ionosonde_zip() -> Vec<u8> {
    let opts = SimpleFileOptions::default();
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));

    let mut t = at(6, 0);
    while t <= at(11, 30) {
        let stamp = t.format("%Y%m%d%H%M").to_string();
        let mut report = String::from("TechTIDE HF-INT ionosonde characteristics\n");
        report += "STA    DATE&TIME     SPCONT  VEL     AZI\n";
        for station in STATIONS {
            report += &format!("{station}  {stamp}  40.0  150.0  10.0\n");
        }
        writer
            .start_file(format!("TechTIDE_hfi_{stamp}.txt"), opts)
            .unwrap();
        writer.write_all(report.as_bytes()).unwrap();
        t += Duration::minutes(30);
    }

    writer.finish().unwrap().into_inner()
}

fn hp30_text() -> String {
    let mut text = String::from("# Hp30 nowcast\n# YYYY MM DD hh.h ...\n");
    for i in 0..12 {
        let hour = 6.0 + 0.5 * i as f64;
        text += &format!("2024 03 20 {hour:.1} 0 0 0 2.000 0\n");
    }
    text
}

fn f107_text() -> String {
    let filler = vec!["0"; 23].join(" ");
    let mut text = String::from("# daily Kp/Ap/F10.7 nowcast\n");
    text += &format!("2024 03 18 {filler} 151.8\n");
    text += &format!("2024 03 19 {filler} 150.3\n");
    text += &format!("2024 03 20 {filler} -1.0\n");
    text
}

fn solar_wind_json() -> String {
    let mut rows = vec![
        r#"["propagated_time_tag","speed","density","temperature","by","bz"]"#.to_string(),
    ];
    let mut t = at(6, 0);
    while t < at(12, 0) {
        rows.push(format!(
            r#"["{}","450.0","4.1","90000","3.0","-4.0"]"#,
            t.format("%Y-%m-%d %H:%M:%S%.3f")
        ));
        t += Duration::minutes(10);
    }
    // Forward-propagated arrival after the cutoff: must be excluded.
    rows.push(format!(
        r#"["{}","470.0","3.9","90000","2.0","-5.0"]"#,
        at(12, 10).format("%Y-%m-%d %H:%M:%S%.3f")
    ));
    format!("[{}]", rows.join(","))
}

fn dst_json() -> String {
    let mut rows = vec![r#"["time_tag","dst"]"#.to_string()];
    for hour in 6..=11 {
        let value = if hour == 11 { -18.0 } else { -15.0 };
        rows.push(format!(
            r#"["2024-03-20 {hour:02}:00:00","{value}"]"#
        ));
    }
    format!("[{}]", rows.join(","))
}

fn fmi_text() -> String {
    let mut text = String::from("% IMAGE realtime electrojet indicators\n% y m d h min s IU IL\n");
    let mut t = at(6, 0);
    while t < at(12, 0) {
        let minutes = (t - at(6, 0)).num_minutes() as f64;
        let (iu, il) = if t >= at(11, 30) {
            (130.0, -20.0)
        } else {
            (100.0 + 0.1 * minutes, -50.0)
        };
        text += &format!("{} {iu:.1} {il:.1}\n", t.format("%Y %m %d %H %M %S"));
        t += Duration::minutes(10);
    }
    text
}

// ── Stub feeds routed through the real parsers ───────────────────────

struct StubFeeds {
    activity: Vec<u8>,
    ionosondes: Vec<u8>,
    hp30: String,
    f107: String,
    solar_wind: String,
    dst: String,
    electrojet: String,
    fail_hp30: bool,
}

impl Default for StubFeeds {
    fn default() -> Self {
        Self {
            activity: activity_zip(),
            ionosondes: ionosonde_zip(),
            hp30: hp30_text(),
            f107: f107_text(),
            solar_wind: solar_wind_json(),
            dst: dst_json(),
            electrojet: fmi_text(),
            fail_hp30: false,
        }
    }
}

impl FeedSet for StubFeeds {
    fn activity_index(&self, _window: &FetchWindow) -> Result<RawSeries, FeedError> {
        techtide::parse_activity_archive(&self.activity)
    }

    fn ionosonde_metrics(
        &self,
        _window: &FetchWindow,
        stations: &[String],
    ) -> Result<Vec<RawSeries>, FeedError> {
        techtide::parse_ionosonde_archive(&self.ionosondes, stations)
    }

    fn hp30(&self, window: &FetchWindow) -> Result<RawSeries, FeedError> {
        if self.fail_hp30 {
            return Err(FeedError::Status {
                feed: FeedSource::GfzHp30,
                status: 503,
            });
        }
        gfz::parse_hp30(&self.hp30, window)
    }

    fn f107(&self, window: &FetchWindow) -> Result<RawSeries, FeedError> {
        gfz::parse_f107(&self.f107, window)
    }

    fn solar_wind(&self, cutoff: DateTime<Utc>) -> Result<Vec<RawSeries>, FeedError> {
        noaa::parse_solar_wind(&self.solar_wind, cutoff)
    }

    fn dst(&self, cutoff: DateTime<Utc>) -> Result<RawSeries, FeedError> {
        noaa::parse_dst(&self.dst, cutoff)
    }

    fn electrojet(&self, window: &FetchWindow) -> Result<Vec<RawSeries>, FeedError> {
        fmi::parse_electrojet(&self.electrojet, window)
    }
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn pipeline_produces_one_schema_exact_row() -> anyhow::Result<()> {
    let feeds = StubFeeds::default();
    let weights = FeatureWeights::builtin();
    let cfg = PipelineConfig::default();

    let assembly = assemble(&feeds, &window(), &weights, &cfg)?;
    let row = &assembly.row;

    // The most recent canonical timestamp any source reached.
    assert_eq!(row.at, at(11, 30));

    // Key set is exactly the model schema, in order.
    let names: Vec<&str> = row.iter().map(|(n, _)| n).collect();
    let expected: Vec<&str> = MODEL_SCHEMA.iter().map(|f| f.name).collect();
    assert_eq!(names, expected);

    // The two malformed activity reports were dropped, not fatal, and the
    // surviving 11:30 reports average cleanly.
    assert_eq!(row.get("hf"), Some(FeatureValue::Float(2.5)));

    // Electrojet: ie = iu − il at the last bucket.
    assert_eq!(row.get("iu_fix"), Some(FeatureValue::Float(130.0)));
    assert_eq!(row.get("ie_fix"), Some(FeatureValue::Float(150.0)));

    // Variation labels exist and are small-integer categories.
    for name in ["ie_variation", "iu_variation"] {
        match row.get(name) {
            Some(FeatureValue::Category(label)) => assert!((0..3).contains(&label)),
            other => panic!("{name}: expected a category, got {other:?}"),
        }
    }

    // Solar wind medians and the derived coupling proxy.
    assert_eq!(row.get("speed"), Some(FeatureValue::Float(450.0)));
    assert_eq!(row.get("bz"), Some(FeatureValue::Float(-4.0)));
    assert_eq!(row.get("rho"), Some(FeatureValue::Float(4.1)));
    assert_eq!(
        row.get("newell"),
        Some(FeatureValue::Float(newell_coupling(3.0, -4.0, 450.0)))
    );

    // Hourly/daily sources are carried forward, and say so.
    assert_eq!(row.get("dst"), Some(FeatureValue::Float(-18.0)));
    assert!(row.carried.contains("dst"));
    assert_eq!(row.get("f_107_adj"), Some(FeatureValue::Float(150.3)));
    assert!(row.carried.contains("f_107_adj"));

    assert_eq!(row.get("hp_30"), Some(FeatureValue::Float(2.0)));

    // Solar geometry is always defined.
    match row.get("solar_zenith_angle") {
        Some(FeatureValue::Float(z)) => assert!((0.0..=180.0).contains(&z)),
        other => panic!("solar_zenith_angle: expected a float, got {other:?}"),
    }

    // Station metrics survived the pivot.
    assert_eq!(
        row.get("spectral_contribution_jr"),
        Some(FeatureValue::Float(40.0))
    );
    assert_eq!(row.get("velocity_vt"), Some(FeatureValue::Float(150.0)));

    // Every feature present: full availability, no alert.
    assert_eq!(row.missing_count(), 0);
    assert!((assembly.availability.score - weights.total()).abs() < 1e-9);
    assert!(!assembly.availability.alert);

    Ok(())
}

#[test]
fn dead_source_aborts_the_run() {
    let feeds = StubFeeds {
        fail_hp30: true,
        ..StubFeeds::default()
    };
    let weights = FeatureWeights::builtin();
    let cfg = PipelineConfig::default();

    let err = assemble(&feeds, &window(), &weights, &cfg).unwrap_err();
    match err {
        AssembleError::Feed(feed_err) => {
            assert_eq!(feed_err.source_id(), FeedSource::GfzHp30);
        }
        other => panic!("expected a feed error, got {other:?}"),
    }
}

#[test]
fn thin_source_degrades_instead_of_failing() -> anyhow::Result<()> {
    // An empty (but well-formed) activity archive: the hf columns exist but
    // hold nothing, so the row assembles with missing values and a lower
    // availability score.
    let empty_zip = zip::ZipWriter::new(Cursor::new(Vec::new()))
        .finish()
        .unwrap()
        .into_inner();
    let feeds = StubFeeds {
        activity: empty_zip,
        ..StubFeeds::default()
    };
    let weights = FeatureWeights::builtin();
    let cfg = PipelineConfig::default();

    let assembly = assemble(&feeds, &window(), &weights, &cfg)?;
    let row = &assembly.row;

    assert_eq!(row.get("hf"), Some(FeatureValue::Missing));
    assert_eq!(row.get("hf_mav_2h"), Some(FeatureValue::Missing));
    assert_eq!(row.len(), MODEL_SCHEMA.len());
    assert!(assembly.availability.score < weights.total());

    Ok(())
}
