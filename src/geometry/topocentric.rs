use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::GeometryError;
use super::observer::ObserverLocation;

/// Earth-fixed position (km) and velocity (km/s) of an object at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub timestamp: DateTime<Utc>,
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
}

/// Where an object appears from an observer at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObservationAngles {
    pub timestamp: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    /// Negative while approaching.
    pub range_rate_km_s: f64,
}

impl ObservationAngles {
    pub fn is_visible(&self, min_elevation_deg: f64) -> bool {
        self.elevation_deg >= min_elevation_deg
    }
}

/// Position of the object in the observer's East-North-Up frame, in km.
pub fn to_topocentric(state: &StateVector, observer: &ObserverLocation) -> (f64, f64, f64) {
    let obs = observer.position_ecef_km();
    let dr = [
        state.position_km[0] - obs[0],
        state.position_km[1] - obs[1],
        state.position_km[2] - obs[2],
    ];
    let [east, north, up] = observer.rotate_to_enu(dr);
    (east, north, up)
}

pub fn observe(
    state: &StateVector,
    observer: &ObserverLocation,
) -> Result<ObservationAngles, GeometryError> {
    let (east, north, up) = to_topocentric(state, observer);

    let range_km = (east * east + north * north + up * up).sqrt();
    if range_km == 0.0 {
        return Err(GeometryError::DegenerateGeometry);
    }

    Ok(ObservationAngles {
        timestamp: state.timestamp,
        azimuth_deg: azimuth_deg(east, north),
        elevation_deg: (up / range_km).clamp(-1.0, 1.0).asin().to_degrees(),
        range_km,
        range_rate_km_s: range_rate(state, observer, [east, north, up], range_km),
    })
}

// Azimuth at zenith is undefined; pin it to north. The explicit check also
// keeps atan2(0, -0) from reporting 180.
fn azimuth_deg(east: f64, north: f64) -> f64 {
    if east == 0.0 && north == 0.0 {
        return 0.0;
    }
    let mut az = east.atan2(north).to_degrees();
    if az < 0.0 {
        az += 360.0;
    }
    if az >= 360.0 {
        az -= 360.0;
    }
    az
}

fn range_rate(
    state: &StateVector,
    observer: &ObserverLocation,
    enu: [f64; 3],
    range_km: f64,
) -> f64 {
    // Velocity is frame-relative, so rotate without translating.
    let v = observer.rotate_to_enu(state.velocity_km_s);
    (enu[0] * v[0] + enu[1] * v[1] + enu[2] * v[2]) / range_km
}
