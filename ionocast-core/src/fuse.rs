//! Fusion merger: outer-join per-source columns, select the most recent
//! timestamp, cast to the model schema.
//!
//! The frame is a plain union-of-timestamps structure; a timestamp present
//! in any column is present in the frame, and a column simply lacks a key
//! where its source had nothing. Name collisions are an error — callers
//! resolve them with explicit renames, never by overwrite.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::GridSeries;
use crate::schema::{FieldType, SchemaError, SchemaField};

#[derive(Debug, Error)]
pub enum FuseError {
    #[error("duplicate column '{column}' — resolve the collision with an explicit rename")]
    DuplicateColumn { column: String },

    #[error("cannot rename unknown column '{column}'")]
    UnknownColumn { column: String },

    #[error("no source contributed any timestamp — nothing to select")]
    NoData,

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// A merged, column-ordered view over every source's grid series.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    columns: Vec<GridSeries>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, preserving insertion order. Duplicate names are fatal.
    pub fn join(&mut self, series: GridSeries) -> Result<(), FuseError> {
        if self.columns.iter().any(|c| c.name == series.name) {
            return Err(FuseError::DuplicateColumn {
                column: series.name,
            });
        }
        self.columns.push(series);
        Ok(())
    }

    /// Rename a column; the target name must be free.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), FuseError> {
        if self.columns.iter().any(|c| c.name == to) {
            return Err(FuseError::DuplicateColumn {
                column: to.to_string(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == from) {
            Some(column) => {
                column.name = to.to_string();
                Ok(())
            }
            None => Err(FuseError::UnknownColumn {
                column: from.to_string(),
            }),
        }
    }

    pub fn column(&self, name: &str) -> Option<&GridSeries> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Union of every column's timestamps.
    pub fn timestamps(&self) -> BTreeSet<DateTime<Utc>> {
        let mut out = BTreeSet::new();
        for column in &self.columns {
            out.extend(column.points.keys().copied());
        }
        out
    }

    /// The most recent timestamp any source contributed.
    pub fn latest(&self) -> Option<DateTime<Utc>> {
        self.timestamps().into_iter().next_back()
    }

    /// Forward-fill one column across the frame's union timestamps,
    /// recording every repeated bucket as carried. No-op for unknown or
    /// empty columns.
    pub fn forward_fill_column(&mut self, name: &str) {
        let stamps = self.timestamps();
        let Some(column) = self.columns.iter_mut().find(|c| c.name == name) else {
            return;
        };
        let mut held: Option<f64> = None;
        for &ts in &stamps {
            match column.points.get(&ts) {
                Some(&fresh) => held = Some(fresh),
                None => {
                    if let Some(value) = held {
                        column.points.insert(ts, value);
                        column.carried.insert(ts);
                    }
                }
            }
        }
    }

    /// Insert a column holding `value` at every frame timestamp. The value
    /// is by construction a repeat of older data, so every bucket is marked
    /// carried.
    pub fn insert_broadcast_column(
        &mut self,
        name: impl Into<String>,
        value: Option<f64>,
    ) -> Result<(), FuseError> {
        let mut series = GridSeries::new(name);
        if let Some(value) = value {
            for ts in self.timestamps() {
                series.insert(ts, value);
                series.carried.insert(ts);
            }
        }
        self.join(series)
    }

    /// Insert a column computed per-timestamp (solar geometry).
    pub fn insert_computed_column(
        &mut self,
        name: impl Into<String>,
        compute: impl Fn(DateTime<Utc>) -> f64,
    ) -> Result<(), FuseError> {
        let mut series = GridSeries::new(name);
        for ts in self.timestamps() {
            series.insert(ts, compute(ts));
        }
        self.join(series)
    }

    /// Select the most recent timestamp and cast the frame to `schema`.
    ///
    /// The resulting row's key set is exactly the schema: extra columns are
    /// dropped, a column absent from every source is a schema violation, a
    /// column merely lacking a value at the selected timestamp yields
    /// `Missing` for the availability layer to weigh.
    pub fn cast_latest(&self, schema: &[SchemaField]) -> Result<FeatureRow, FuseError> {
        let at = self.latest().ok_or(FuseError::NoData)?;

        let extra: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| !schema.iter().any(|f| f.name == c.name))
            .map(|c| c.name.as_str())
            .collect();
        if !extra.is_empty() {
            log::debug!("dropping columns outside the model schema: {extra:?}");
        }

        let mut values = Vec::with_capacity(schema.len());
        let mut carried = BTreeSet::new();
        for field in schema {
            let column = self
                .column(field.name)
                .ok_or(SchemaError::MissingColumn { column: field.name })?;

            let value = match column.points.get(&at) {
                None => FeatureValue::Missing,
                Some(&v) => match field.dtype {
                    FieldType::Float => FeatureValue::Float(v),
                    FieldType::Category => {
                        if v.fract() != 0.0 {
                            return Err(SchemaError::NotCategorical {
                                column: field.name,
                                value: v,
                            }
                            .into());
                        }
                        FeatureValue::Category(v as i64)
                    }
                },
            };
            if column.carried.contains(&at) {
                carried.insert(field.name.to_string());
            }
            values.push((field.name.to_string(), value));
        }

        Ok(FeatureRow {
            at,
            values,
            carried,
        })
    }
}

/// A single model input value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FeatureValue {
    Float(f64),
    Category(i64),
    Missing,
}

impl FeatureValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FeatureValue::Missing)
    }
}

/// One fused feature row — the unit of work handed to the classifier.
///
/// `values` is ordered exactly like the schema the row was cast against;
/// `carried` names the features whose value at `at` was forward-filled
/// rather than freshly observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub at: DateTime<Utc>,
    values: Vec<(String, FeatureValue)>,
    pub carried: BTreeSet<String>,
}

impl FeatureRow {
    /// Build a row directly. Pipeline code obtains rows from
    /// [`Frame::cast_latest`]; this constructor exists for consumers that
    /// synthesize rows (fixtures, serving-layer replay).
    pub fn from_values(at: DateTime<Utc>, values: Vec<(String, FeatureValue)>) -> Self {
        Self {
            at,
            values,
            carried: BTreeSet::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|(_, v)| v.is_missing()).count()
    }

    /// Ordered name→value map for the serving layer.
    pub fn as_map(&self) -> BTreeMap<&str, FeatureValue> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v)).collect()
    }

    /// JSON object view (name → value, missing → null) for the serving
    /// layer's response body.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.values {
            let json = match value {
                FeatureValue::Float(x) => serde_json::json!(x),
                FeatureValue::Category(c) => serde_json::json!(c),
                FeatureValue::Missing => serde_json::Value::Null,
            };
            map.insert(name.clone(), json);
        }
        serde_json::Value::Object(map)
    }
}
