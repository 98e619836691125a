use chrono::{DateTime, Duration, Utc};
use sgp4::{Constants, Elements};

use crate::geometry::{observe, ObservationAngles, ObserverLocation, StateVector};
use crate::predict::error::PredictError;

pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;

/// Source of Earth-fixed state vectors for one tracked object.
pub trait Propagate {
    fn propagate(&self, timestamp: DateTime<Utc>) -> Result<StateVector, PredictError>;
}

/// SGP4 propagation of a single element set, rotated from TEME into ECEF.
pub struct Sgp4Propagator {
    elements: Elements,
    constants: Constants,
}

impl Sgp4Propagator {
    pub fn from_elements(elements: Elements) -> Result<Self, sgp4::ElementsError> {
        let constants = Constants::from_elements(&elements)?;
        Ok(Self {
            elements,
            constants,
        })
    }
}

impl Propagate for Sgp4Propagator {
    fn propagate(&self, timestamp: DateTime<Utc>) -> Result<StateVector, PredictError> {
        let naive = timestamp.naive_utc();
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&naive)
            .map_err(|e| PredictError::Propagation(e.to_string()))?;

        let prediction = self.constants.propagate(minutes)?;

        let sidereal =
            sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&naive));

        Ok(StateVector {
            timestamp,
            position_km: teme_to_ecef_position(prediction.position, sidereal),
            velocity_km_s: teme_to_ecef_velocity(
                prediction.position,
                prediction.velocity,
                sidereal,
            ),
        })
    }
}

/// Propagates and observes one instant. Errors are returned, never swallowed.
pub fn observe_at<P: Propagate + ?Sized>(
    propagator: &P,
    observer: &ObserverLocation,
    timestamp: DateTime<Utc>,
) -> Result<ObservationAngles, PredictError> {
    let state = propagator.propagate(timestamp)?;
    Ok(observe(&state, observer)?)
}

/// Upper bound on the number of instants one window may produce.
pub const MAX_SAMPLES: i128 = 1_000_000;

/// Instants from `start` to `end` inclusive, `step` apart.
pub fn sample_times(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
) -> Result<Vec<DateTime<Utc>>, PredictError> {
    if step <= Duration::zero() {
        return Err(PredictError::InvalidWindow(format!(
            "step must be positive, got {}s",
            step.num_seconds()
        )));
    }
    if end < start {
        return Err(PredictError::InvalidWindow(
            "end time must be after start time".into(),
        ));
    }

    let count = total_nanos(end - start) / total_nanos(step) + 1;
    if count > MAX_SAMPLES {
        return Err(PredictError::InvalidWindow(format!(
            "{} samples requested, at most {} allowed; use a longer step or a shorter window",
            count, MAX_SAMPLES
        )));
    }

    let mut times = Vec::with_capacity(count as usize);
    let mut cursor = Some(start);
    while let Some(t) = cursor.filter(|t| *t <= end) {
        times.push(t);
        cursor = t.checked_add_signed(step);
    }
    Ok(times)
}

fn total_nanos(d: Duration) -> i128 {
    i128::from(d.num_seconds()) * 1_000_000_000 + i128::from(d.subsec_nanos())
}

#[derive(Debug, Clone, Default)]
pub struct ObservationSeries {
    pub samples: Vec<ObservationAngles>,
    /// Instants that could not be propagated or observed.
    pub skipped: usize,
}

/// Time-ordered observations over a window. A failing instant is logged and
/// left out; it does not abort the series.
pub fn observation_series<P: Propagate + ?Sized>(
    propagator: &P,
    observer: &ObserverLocation,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
) -> Result<ObservationSeries, PredictError> {
    let mut series = ObservationSeries::default();

    for timestamp in sample_times(start, end, step)? {
        match observe_at(propagator, observer, timestamp) {
            Ok(angles) => series.samples.push(angles),
            Err(e) => {
                log::warn!("Skipping sample at {}: {}", timestamp, e);
                series.skipped += 1;
            }
        }
    }

    Ok(series)
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let (sin_gmst, cos_gmst) = gmst.sin_cos();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let (sin_gmst, cos_gmst) = gmst.sin_cos();
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = [
        vel_teme[0] * cos_gmst + vel_teme[1] * sin_gmst,
        -vel_teme[0] * sin_gmst + vel_teme[1] * cos_gmst,
        vel_teme[2],
    ];
    // Remove the frame rotation: v_ecef = R v_teme - ω × r_ecef
    [
        rotated[0] + EARTH_ROTATION_RAD_S * pos[1],
        rotated[1] - EARTH_ROTATION_RAD_S * pos[0],
        rotated[2],
    ]
}
