use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Mean Earth radius, not the WGS-84 semi-major axis. The GEO/LEO/MEO
/// tolerances below are tuned against this value.
const EARTH_MEAN_RADIUS_KM: f64 = 6371.0;

const HEO_MIN_ECCENTRICITY: f64 = 0.25;
const LEO_MAX_ALTITUDE_KM: f64 = 2000.0;

const GEO_ALTITUDE_KM: f64 = 35786.0;
const GEO_PERIOD_MIN: f64 = 1436.0;
const GEO_ALTITUDE_TOLERANCE_KM: f64 = 500.0;
const GEO_PERIOD_TOLERANCE_MIN: f64 = 30.0;
const GEO_INCLINATION_TOLERANCE_DEG: f64 = 5.0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrbitalRegime {
    Leo,
    Meo,
    Geo,
    Heo,
    Unknown,
}

/// Catalog orbit summary. Absent values are carried as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrbitalParameters {
    pub apogee_km: f64,
    pub perigee_km: f64,
    pub period_min: f64,
    pub inclination_deg: f64,
}

impl OrbitalParameters {
    pub fn regime(&self) -> OrbitalRegime {
        classify(
            self.apogee_km,
            self.perigee_km,
            self.period_min,
            self.inclination_deg,
        )
    }
}

/// Coarse regime from catalog apogee/perigee altitudes (km), period (minutes)
/// and inclination (degrees). First matching rule wins.
pub fn classify(
    apogee_km: f64,
    perigee_km: f64,
    period_min: f64,
    inclination_deg: f64,
) -> OrbitalRegime {
    // Also catches NaN.
    if !(apogee_km > 0.0 && perigee_km > 0.0 && period_min > 0.0) {
        return OrbitalRegime::Unknown;
    }

    let re = EARTH_MEAN_RADIUS_KM;
    let avg_altitude = ((apogee_km + re) + (perigee_km + re)) / 2.0 - re;
    let eccentricity = (apogee_km - perigee_km) / (apogee_km + perigee_km + 2.0 * re);

    // Shape before altitude: an elliptical orbit can average into the LEO band.
    if eccentricity > HEO_MIN_ECCENTRICITY {
        return OrbitalRegime::Heo;
    }

    if (avg_altitude - GEO_ALTITUDE_KM).abs() < GEO_ALTITUDE_TOLERANCE_KM
        && (period_min - GEO_PERIOD_MIN).abs() < GEO_PERIOD_TOLERANCE_MIN
        && inclination_deg.abs() < GEO_INCLINATION_TOLERANCE_DEG
    {
        return OrbitalRegime::Geo;
    }

    if avg_altitude < LEO_MAX_ALTITUDE_KM {
        OrbitalRegime::Leo
    } else if avg_altitude < GEO_ALTITUDE_KM {
        OrbitalRegime::Meo
    } else {
        // Drifting or transfer objects at or above the belt.
        OrbitalRegime::Geo
    }
}
