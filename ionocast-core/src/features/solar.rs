//! Solar geometry: zenith angle at a fixed ground station.
//!
//! NOAA solar-calculator equations (Meeus). Accurate to well under a tenth
//! of a degree over the satellite era, which is far below the sensitivity of
//! the classifier; the live pipeline rounds to one decimal anyway. Defined
//! for every timestamp — there is no missing-data case here.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Observation site the zenith angle is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundStation {
    /// Decimal degrees, positive north.
    pub latitude: f64,
    /// Decimal degrees, positive east.
    pub longitude: f64,
    /// Metres above sea level.
    pub altitude: f64,
}

impl GroundStation {
    /// The mid-European reference site the model was trained against.
    pub fn reference() -> Self {
        Self {
            latitude: 50.110_656,
            longitude: 8.682_526,
            altitude: 350_000.0,
        }
    }
}

/// Solar zenith angle in degrees at `at` for `station`.
///
/// Geometric zenith (no refraction correction): the trained model saw the
/// same convention.
pub fn solar_zenith_angle(at: DateTime<Utc>, station: &GroundStation) -> f64 {
    let jd = at.timestamp() as f64 / 86_400.0 + 2_440_587.5;
    let jc = (jd - 2_451_545.0) / 36_525.0;

    // Geometric mean longitude and anomaly of the sun (degrees)
    let gml = (280.46646 + jc * (36_000.76983 + jc * 0.000_303_2)).rem_euclid(360.0);
    let gma = 357.52911 + jc * (35_999.05029 - 0.000_153_7 * jc);
    let ecc = 0.016_708_634 - jc * (0.000_042_037 + 0.000_000_126_7 * jc);

    let center = (gma.to_radians()).sin() * (1.914602 - jc * (0.004817 + 0.000014 * jc))
        + (2.0 * gma.to_radians()).sin() * (0.019993 - 0.000101 * jc)
        + (3.0 * gma.to_radians()).sin() * 0.000289;
    let true_long = gml + center;
    let apparent_long = true_long - 0.00569 - 0.00478 * (125.04 - 1934.136 * jc).to_radians().sin();

    let mean_obliq = 23.0
        + (26.0 + (21.448 - jc * (46.815 + jc * (0.00059 - jc * 0.001813))) / 60.0) / 60.0;
    let obliq = mean_obliq + 0.00256 * (125.04 - 1934.136 * jc).to_radians().cos();

    let declination = (obliq.to_radians().sin() * apparent_long.to_radians().sin()).asin();

    // Equation of time, minutes
    let var_y = (obliq / 2.0).to_radians().tan().powi(2);
    let eqtime = 4.0
        * (var_y * (2.0 * gml.to_radians()).sin() - 2.0 * ecc * gma.to_radians().sin()
            + 4.0 * ecc * var_y * gma.to_radians().sin() * (2.0 * gml.to_radians()).cos()
            - 0.5 * var_y * var_y * (4.0 * gml.to_radians()).sin()
            - 1.25 * ecc * ecc * (2.0 * gma.to_radians()).sin())
        .to_degrees();

    let minutes = f64::from(at.hour()) * 60.0
        + f64::from(at.minute())
        + f64::from(at.second()) / 60.0;
    let true_solar_minutes = (minutes + eqtime + 4.0 * station.longitude).rem_euclid(1440.0);
    let hour_angle = if true_solar_minutes / 4.0 < 0.0 {
        true_solar_minutes / 4.0 + 180.0
    } else {
        true_solar_minutes / 4.0 - 180.0
    };

    let lat = station.latitude.to_radians();
    let cos_zenith = lat.sin() * declination.sin()
        + lat.cos() * declination.cos() * hour_angle.to_radians().cos();
    cos_zenith.clamp(-1.0, 1.0).acos().to_degrees()
}
