//! Model input schema — the boundary between the fusion merger and the
//! trained classifier.
//!
//! The classifier was trained against exactly these 36 named, typed fields
//! in exactly this order. Fusion output is cast to this contract once;
//! anything that does not fit is a schema violation, never a silent
//! coercion.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Expected type of a model input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// Continuous measurement.
    Float,
    /// Small-integer categorical flag (regime/variation labels).
    Category,
}

/// A single field of the model input schema.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaField {
    pub name: &'static str,
    pub dtype: FieldType,
}

const fn float(name: &'static str) -> SchemaField {
    SchemaField {
        name,
        dtype: FieldType::Float,
    }
}

const fn category(name: &'static str) -> SchemaField {
    SchemaField {
        name,
        dtype: FieldType::Category,
    }
}

/// The classifier's declared input schema.
///
/// Field order matters: the serving layer hands the row to the model
/// positionally. Station-suffixed fields cover the six ionosondes the model
/// was trained with (Athens, Fairford, Juliusruh, Průhonice, Rome, San Vito).
pub const MODEL_SCHEMA: &[SchemaField] = &[
    float("ie_fix"),
    category("ie_variation"),
    float("ie_mav_3h"),
    float("ie_mav_12h"),
    float("iu_fix"),
    category("iu_variation"),
    float("iu_mav_3h"),
    float("iu_mav_12h"),
    float("hf"),
    float("hf_mav_2h"),
    float("f_107_adj"),
    float("hp_30"),
    float("dst"),
    float("solar_zenith_angle"),
    float("newell"),
    float("bz"),
    float("speed"),
    float("rho"),
    float("spectral_contribution_at"),
    float("spectral_contribution_ff"),
    float("spectral_contribution_jr"),
    float("spectral_contribution_pq"),
    float("spectral_contribution_ro"),
    float("spectral_contribution_vt"),
    float("azimuth_at"),
    float("azimuth_ff"),
    float("azimuth_jr"),
    float("azimuth_pq"),
    float("azimuth_ro"),
    float("azimuth_vt"),
    float("velocity_at"),
    float("velocity_ff"),
    float("velocity_jr"),
    float("velocity_pq"),
    float("velocity_ro"),
    float("velocity_vt"),
];

/// Look a field up by name.
pub fn field(name: &str) -> Option<&'static SchemaField> {
    MODEL_SCHEMA.iter().find(|f| f.name == name)
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("required column '{column}' is absent from every source")]
    MissingColumn { column: &'static str },

    #[error("column '{column}' carries non-integral value {value} but is declared categorical")]
    NotCategorical { column: &'static str, value: f64 },
}
