//! Series types: raw provider samples and grid-aligned columns.
//!
//! A `RawSeries` is whatever one adapter produced for one physical quantity:
//! timestamps may repeat, may be unordered, and follow no fixed cadence.
//! A `GridSeries` is the same quantity after resampling: every key sits on
//! the canonical grid and a missing bucket is simply an absent key — never
//! a fabricated number.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped measurement from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub at: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(at: DateTime<Utc>, value: f64) -> Self {
        Self { at, value }
    }
}

/// An irregular, provider-native series of one quantity.
///
/// Owned by its adapter until handed to the resampler; units and sign
/// conventions are already normalized by the time a `RawSeries` exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    pub name: String,
    pub samples: Vec<Sample>,
}

impl RawSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            samples: Vec::new(),
        }
    }

    pub fn with_samples(name: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            name: name.into(),
            samples,
        }
    }

    pub fn push(&mut self, at: DateTime<Utc>, value: f64) {
        self.samples.push(Sample::new(at, value));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// One named column aligned to the canonical grid.
///
/// `points` holds only observed buckets; `carried` marks the subset whose
/// value was forward-filled from an earlier bucket rather than freshly
/// observed, so the availability layer can tell repeated from fresh data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSeries {
    pub name: String,
    pub points: BTreeMap<DateTime<Utc>, f64>,
    pub carried: BTreeSet<DateTime<Utc>>,
}

impl GridSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: BTreeMap::new(),
            carried: BTreeSet::new(),
        }
    }

    pub fn insert(&mut self, at: DateTime<Utc>, value: f64) {
        self.points.insert(at, value);
    }

    pub fn value_at(&self, at: DateTime<Utc>) -> Option<f64> {
        self.points.get(&at).copied()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.keys().next().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Observed values in timestamp order (missing buckets skipped).
    pub fn values_in_order(&self) -> Vec<f64> {
        self.points.values().copied().collect()
    }

    /// Round every value to `digits` decimal places.
    pub fn rounded(mut self, digits: u32) -> Self {
        let scale = 10f64.powi(digits as i32);
        for value in self.points.values_mut() {
            *value = (*value * scale).round() / scale;
        }
        self
    }

    /// Rename the series, consuming it. Used to map provider names onto the
    /// model schema (`ie` → `ie_fix`).
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
