//! Regime classifier: discrete rate-of-change categories for an index.
//!
//! Smooth → log-difference → seeded k-means → relabel by ascending cluster
//! center. Label 0 is always the most negative (falling) regime and labels
//! increase with the rate of change; the clustering library's internal label
//! order never leaks into the output.
//!
//! The fixed seed is a correctness requirement, not a convenience: regime
//! labels must reproduce exactly across runs for the same input.

use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::features::ema::{ema, ema_zero_phase};

/// Seed for the k-means fit. Part of the classifier contract — changing it
/// changes every historical label.
pub const REGIME_SEED: u64 = 42;

#[derive(Debug, Error)]
pub enum RegimeError {
    #[error("series too short to classify: {len} points for {categories} categories")]
    TooShort { len: usize, categories: usize },

    #[error("clustering failed: {0}")]
    Clustering(String),
}

/// Smoothed series plus one label per first-difference.
#[derive(Debug, Clone)]
pub struct Regimes {
    pub smoothed: Vec<f64>,
    /// `labels.len() == smoothed.len() - 1`; labels are ordered by cluster
    /// center, 0 = most negative rate of change.
    pub labels: Vec<usize>,
}

impl Regimes {
    /// Labels realigned to the input length by prepending a neutral 0 —
    /// the convention used when the labels become a grid column.
    pub fn labels_aligned(&self) -> Vec<i64> {
        std::iter::once(0)
            .chain(self.labels.iter().map(|&l| l as i64))
            .collect()
    }
}

/// Classify the rate-of-change regime of `values`.
///
/// `window` is the EMA span in buckets. With `causal` set the smoothing uses
/// only past values and is safe for live inference; without it a zero-phase
/// (forward-backward) filter is applied, which reads future values and is
/// restricted to offline analysis.
pub fn classify(
    values: &[f64],
    window: usize,
    n_categories: usize,
    causal: bool,
) -> Result<Regimes, RegimeError> {
    if values.len() < n_categories + 1 {
        return Err(RegimeError::TooShort {
            len: values.len(),
            categories: n_categories,
        });
    }

    let wrapped: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    let smoothed: Vec<f64> = if causal {
        ema(&wrapped, window)
    } else {
        ema_zero_phase(&wrapped, window)
    }
    .into_iter()
    .map(|v| v.expect("dense input yields dense output"))
    .collect();

    // Log-differences, shifting up first when any value is negative so the
    // logarithm stays defined.
    let min = smoothed.iter().copied().fold(f64::INFINITY, f64::min);
    let offset = if min < 0.0 { min.abs() } else { 0.0 };
    let diffs: Vec<f64> = smoothed
        .windows(2)
        .map(|w| (w[1] + offset).ln_1p() - (w[0] + offset).ln_1p())
        .collect();

    let labels = cluster_ordered(&diffs, n_categories)?;
    Ok(Regimes { smoothed, labels })
}

/// Seeded 1-D k-means over `diffs`, relabeled so cluster centers ascend.
fn cluster_ordered(diffs: &[f64], n_categories: usize) -> Result<Vec<usize>, RegimeError> {
    let records = Array2::from_shape_vec((diffs.len(), 1), diffs.to_vec())
        .expect("shape matches input length");
    let dataset = DatasetBase::from(records);

    let rng = StdRng::seed_from_u64(REGIME_SEED);
    let model = KMeans::params_with_rng(n_categories, rng)
        .max_n_iterations(300)
        .fit(&dataset)
        .map_err(|e| RegimeError::Clustering(e.to_string()))?;

    let assigned = model.predict(dataset.records());

    // Rank clusters by center so label 0 is the most negative regime.
    let centroids = model.centroids();
    let mut order: Vec<usize> = (0..n_categories).collect();
    order.sort_by(|&a, &b| {
        centroids[[a, 0]]
            .partial_cmp(&centroids[[b, 0]])
            .expect("finite cluster centers")
    });
    let mut rank = vec![0usize; n_categories];
    for (new_label, &old_label) in order.iter().enumerate() {
        rank[old_label] = new_label;
    }

    Ok(assigned.iter().map(|&l| rank[l]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Index path with two sharp falls, a flat stretch, and two sharp rises.
    fn three_regime_series() -> Vec<f64> {
        vec![
            100.0, 80.0, 64.0, 64.0, 64.0, 64.0, 64.0, 80.0, 100.0,
        ]
    }

    #[test]
    fn labels_cover_one_fewer_than_input() {
        let values = three_regime_series();
        let regimes = classify(&values, 1, 3, true).unwrap();
        assert_eq!(regimes.labels.len(), values.len() - 1);
        assert_eq!(regimes.labels_aligned().len(), values.len());
        assert_eq!(regimes.labels_aligned()[0], 0);
    }

    #[test]
    fn label_order_tracks_rate_of_change() {
        // window = 1 keeps the smoothing an identity so the diffs cluster
        // cleanly into fall / flat / rise.
        let regimes = classify(&three_regime_series(), 1, 3, true).unwrap();
        assert_eq!(regimes.labels[0], 0, "sharp fall must be label 0");
        assert_eq!(regimes.labels[1], 0);
        assert_eq!(regimes.labels[3], 1, "flat stretch must sit between");
        let last = *regimes.labels.last().unwrap();
        assert_eq!(last, 2, "sharp rise must be the top label");
    }

    #[test]
    fn mean_diff_is_monotone_in_label() {
        let values = three_regime_series();
        let regimes = classify(&values, 1, 3, true).unwrap();
        let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

        let mut by_label: Vec<Vec<f64>> = vec![Vec::new(); 3];
        for (d, &l) in diffs.iter().zip(&regimes.labels) {
            by_label[l].push(*d);
        }
        let means: Vec<f64> = by_label
            .iter()
            .filter(|v| !v.is_empty())
            .map(|v| v.iter().sum::<f64>() / v.len() as f64)
            .collect();
        assert!(means.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn reproducible_across_runs() {
        let values: Vec<f64> = (0..48)
            .map(|i| 60.0 + 40.0 * (i as f64 * 0.41).sin())
            .collect();
        let a = classify(&values, 6, 3, true).unwrap();
        let b = classify(&values, 6, 3, true).unwrap();
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.smoothed, b.smoothed);
    }

    #[test]
    fn handles_negative_series_via_offset() {
        let values = vec![-40.0, -60.0, -80.0, -80.0, -80.0, -60.0, -40.0];
        let regimes = classify(&values, 1, 3, true).unwrap();
        assert_eq!(regimes.labels.len(), values.len() - 1);
        assert!(regimes.smoothed.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn causal_smoothing_is_truncation_invariant() {
        let values: Vec<f64> = (0..48)
            .map(|i| 60.0 + 40.0 * (i as f64 * 0.41).sin())
            .collect();
        let full = classify(&values, 6, 3, true).unwrap();
        let cut = classify(&values[..24], 6, 3, true).unwrap();
        for i in 0..24 {
            assert!((full.smoothed[i] - cut.smoothed[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_phase_smoothing_depends_on_future() {
        let values: Vec<f64> = (0..48)
            .map(|i| 60.0 + 40.0 * (i as f64 * 0.41).sin())
            .collect();
        let full = classify(&values, 6, 3, false).unwrap();
        let cut = classify(&values[..24], 6, 3, false).unwrap();
        let differs = (0..24).any(|i| (full.smoothed[i] - cut.smoothed[i]).abs() > 1e-9);
        assert!(differs);
    }

    #[test]
    fn too_short_input_is_an_error() {
        let err = classify(&[1.0, 2.0], 1, 3, true).unwrap_err();
        assert!(matches!(err, RegimeError::TooShort { .. }));
    }
}
