//! Importance-weighted availability scoring.
//!
//! A naive completeness percentage treats every feature alike; this scorer
//! does not. The score of a row is the summed importance weight of its
//! non-missing features, and the alert threshold is pegged to the weight of
//! the few features the model actually leans on — losing an influential
//! input hurts far more than losing a marginal one.

use std::io::Read;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fuse::FeatureRow;

/// Fraction of the top-N cumulative weight a row must reach to avoid the
/// degraded-confidence alert.
const THRESHOLD_FRACTION: f64 = 0.8;

#[derive(Debug, Error)]
pub enum WeightsError {
    #[error("weights table unreadable: {0}")]
    Csv(#[from] csv::Error),

    #[error("feature '{feature}' has invalid weight {weight}")]
    InvalidWeight { feature: String, weight: f64 },
}

/// Per-feature importance weights from the trained model.
///
/// Loaded once at process start through an explicit constructor and never
/// mutated afterwards — safe for unsynchronized concurrent reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeights {
    /// Descending by weight; ties break on name so ordering is total.
    weights: Vec<(String, f64)>,
}

#[derive(Debug, Deserialize)]
struct WeightRecord {
    feature: String,
    weight: f64,
}

impl FeatureWeights {
    /// Build from raw pairs; weights must be finite and non-negative.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (String, f64)>,
    ) -> Result<Self, WeightsError> {
        let mut weights: Vec<(String, f64)> = Vec::new();
        for (feature, weight) in pairs {
            if !weight.is_finite() || weight < 0.0 {
                return Err(WeightsError::InvalidWeight { feature, weight });
            }
            weights.push((feature, weight));
        }
        weights.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .expect("finite weights")
                .then_with(|| a.0.cmp(&b.0))
        });
        Ok(Self { weights })
    }

    /// Load a `feature,weight` CSV table.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, WeightsError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut pairs = Vec::new();
        for record in rdr.deserialize() {
            let record: WeightRecord = record?;
            pairs.push((record.feature, record.weight));
        }
        Self::from_pairs(pairs)
    }

    /// The importance table exported from the trained classifier.
    pub fn builtin() -> Self {
        Self::from_csv_reader(include_str!("../assets/feature_importance.csv").as_bytes())
            .expect("embedded weights table is well-formed")
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.weights
            .iter()
            .find(|(name, _)| name == feature)
            .map(|(_, w)| *w)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().map(|(_, w)| w).sum()
    }

    /// Cumulative weight of the `n` most important features.
    pub fn top_n_weight(&self, n: usize) -> f64 {
        self.weights.iter().take(n).map(|(_, w)| w).sum()
    }

    /// Alert threshold for a given `top_n`: 4/5 of the top-N cumulative
    /// weight, so a row holding only the heaviest features barely clears it.
    pub fn threshold(&self, top_n: usize) -> f64 {
        THRESHOLD_FRACTION * self.top_n_weight(top_n)
    }

    /// Weighted completeness of `row`. Features without a weight entry
    /// contribute nothing.
    pub fn score(&self, row: &FeatureRow, top_n: usize) -> AvailabilityScore {
        let score: f64 = row
            .iter()
            .filter(|(_, value)| !value.is_missing())
            .filter_map(|(name, _)| self.get(name))
            .sum();
        let threshold = self.threshold(top_n);
        AvailabilityScore {
            score,
            threshold,
            alert: score < threshold,
        }
    }
}

/// Weighted completeness of one feature row. Not persisted — recomputed per
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityScore {
    pub score: f64,
    pub threshold: f64,
    pub alert: bool,
}
