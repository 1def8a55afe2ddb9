//! Real-time assembly: fetch all sources in parallel, run the transform
//! chain, emit one schema-exact feature row with its availability score.
//!
//! Downstream of the parallel fetches everything is pure and synchronous;
//! the only process-wide state is the read-only `FeatureWeights` table the
//! caller loaded at startup.

use thiserror::Error;

use ionocast_core::availability::{AvailabilityScore, FeatureWeights};
use ionocast_core::domain::{FetchWindow, GridSeries};
use ionocast_core::features::{forward_fill, moving_average, solar_zenith_angle, GroundStation};
use ionocast_core::fuse::{FeatureRow, Frame, FuseError};
use ionocast_core::grid::CanonicalGrid;
use ionocast_core::regime::classify;
use ionocast_core::resample::{resample, resample_all, Aggregation};
use ionocast_core::schema::MODEL_SCHEMA;

use crate::feed::{FeedError, FeedSet};
use crate::gfz::latest_value;

/// Tunables of one assembly run. Built in code — there is no config-file
/// layer below the serving boundary.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub grid: CanonicalGrid,
    /// Ionosonde allow-list; defaults to the six stations the model was
    /// trained with.
    pub stations: Vec<String>,
    /// EMA horizons (hours) derived from the activity index.
    pub hf_horizons: Vec<u32>,
    /// EMA horizons (hours) derived from each electrojet index.
    pub electrojet_horizons: Vec<u32>,
    /// EMA span (buckets) for regime smoothing.
    pub regime_window: usize,
    pub regime_categories: usize,
    pub site: GroundStation,
    pub availability_top_n: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            grid: CanonicalGrid::default(),
            stations: ["AT138", "FF051", "JR055", "PQ052", "RO041", "VT139"]
                .map(String::from)
                .to_vec(),
            hf_horizons: vec![2],
            electrojet_horizons: vec![3, 12],
            regime_window: 12,
            regime_categories: 3,
            site: GroundStation::reference(),
            availability_top_n: 10,
        }
    }
}

/// One assembled feature row plus its weighted completeness.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub row: FeatureRow,
    pub availability: AvailabilityScore,
}

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Fuse(#[from] FuseError),
}

/// Fetch, transform, fuse and score one feature row for `window`.
///
/// All five upstream fetches run concurrently; any fetch failure aborts the
/// run — the pipeline never substitutes stale or default data for a dead
/// source. A source that answered with *thin* data degrades the availability
/// score instead.
pub fn assemble(
    feeds: &dyn FeedSet,
    window: &FetchWindow,
    weights: &FeatureWeights,
    cfg: &PipelineConfig,
) -> Result<Assembly, AssembleError> {
    let ((hf_raw, iono_raw), ((hp30_raw, f107_raw), ((wind_raw, dst_raw), ej_raw))) = rayon::join(
        || {
            rayon::join(
                || feeds.activity_index(window),
                || feeds.ionosonde_metrics(window, &cfg.stations),
            )
        },
        || {
            rayon::join(
                || rayon::join(|| feeds.hp30(window), || feeds.f107(window)),
                || {
                    rayon::join(
                        || {
                            rayon::join(
                                || feeds.solar_wind(window.stop),
                                || feeds.dst(window.stop),
                            )
                        },
                        || feeds.electrojet(window),
                    )
                },
            )
        },
    );
    let (hf_raw, iono_raw) = (hf_raw?, iono_raw?);
    let (hp30_raw, f107_raw) = (hp30_raw?, f107_raw?);
    let (wind_raw, dst_raw, ej_raw) = (wind_raw?, dst_raw?, ej_raw?);

    let grid = &cfg.grid;
    let mut frame = Frame::new();

    // HF-INT activity: noisy continuous signal, mean-aggregated, plus its
    // causal moving averages.
    let hf = resample(&hf_raw, grid, Aggregation::Mean).rounded(2);
    for &hours in &cfg.hf_horizons {
        frame.join(moving_average(&hf, grid, hours))?;
    }
    frame.join(hf)?;

    // Ionosonde metrics: median per station column against single-sensor
    // spikes.
    for series in resample_all(&iono_raw, grid, Aggregation::Median) {
        frame.join(series.rounded(2))?;
    }

    // Geomagnetic Hp30: already half-hourly upstream, the resample is a
    // grid alignment.
    frame.join(resample(&hp30_raw, grid, Aggregation::Mean))?;

    // Solar wind and the derived coupling proxy.
    for series in resample_all(&wind_raw, grid, Aggregation::Median) {
        frame.join(series)?;
    }

    // Ring current: hourly cadence, carried across intervening buckets.
    let dst = resample(&dst_raw, grid, Aggregation::Median);
    frame.join(forward_fill(&dst, grid, None))?;

    // Electrojet indices: medians, moving averages, and causal variation
    // labels.
    for series in resample_all(&ej_raw, grid, Aggregation::Median) {
        let series = series.rounded(2);
        for &hours in &cfg.electrojet_horizons {
            frame.join(moving_average(&series, grid, hours))?;
        }
        frame.join(variation_labels(&series, cfg))?;
        frame.join(series)?;
    }
    frame.rename("ie", "ie_fix")?;
    frame.rename("iu", "iu_fix")?;

    // Daily radio flux: broadcast the latest recorded value across the
    // fused index — repeated data by construction.
    frame.insert_broadcast_column("f_107_adj", latest_value(&f107_raw))?;

    // Solar geometry, defined (and fresh) at every timestamp.
    let site = cfg.site;
    frame.insert_computed_column("solar_zenith_angle", |ts| {
        (solar_zenith_angle(ts, &site) * 10.0).round() / 10.0
    })?;

    // Extend the hourly ring current over the full fused index.
    frame.forward_fill_column("dst");

    let row = frame.cast_latest(MODEL_SCHEMA)?;
    let availability = weights.score(&row, cfg.availability_top_n);
    log::info!(
        "assembled feature row at {}: {}/{} features present, availability {:.2}/{:.2}{}",
        row.at,
        row.len() - row.missing_count(),
        row.len(),
        availability.score,
        availability.threshold,
        if availability.alert { " (degraded)" } else { "" },
    );

    Ok(Assembly { row, availability })
}

/// Causal regime labels for one electrojet column, realigned to the grid.
///
/// A series too thin to cluster degrades to an empty column (flagged by the
/// availability scorer) rather than failing the run.
fn variation_labels(series: &GridSeries, cfg: &PipelineConfig) -> GridSeries {
    let name = format!("{}_variation", series.name);
    let mut out = GridSeries::new(name.clone());

    let values = series.values_in_order();
    match classify(&values, cfg.regime_window, cfg.regime_categories, true) {
        Ok(regimes) => {
            for ((&ts, _), label) in series.points.iter().zip(regimes.labels_aligned()) {
                out.insert(ts, label as f64);
            }
        }
        Err(e) => log::warn!("{name}: degraded to missing: {e}"),
    }
    out
}
