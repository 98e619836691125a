use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::geometry::ObservationAngles;

/// A maximal run of consecutive samples at or above the elevation threshold.
///
/// Never empty. The first and last samples approximate rise and set to within
/// one sampling step; they are not exact horizon crossings.
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    samples: Vec<ObservationAngles>,
}

#[allow(clippy::len_without_is_empty)]
impl Pass {
    pub(crate) fn from_samples(samples: Vec<ObservationAngles>) -> Option<Self> {
        if samples.is_empty() {
            None
        } else {
            Some(Self { samples })
        }
    }

    pub fn samples(&self) -> &[ObservationAngles] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn first(&self) -> &ObservationAngles {
        &self.samples[0]
    }

    pub fn last(&self) -> &ObservationAngles {
        &self.samples[self.samples.len() - 1]
    }

    /// Highest sample; the earliest one wins a tie.
    pub fn culmination(&self) -> &ObservationAngles {
        self.samples().iter().fold(self.first(), |best, s| {
            if s.elevation_deg > best.elevation_deg {
                s
            } else {
                best
            }
        })
    }

    pub fn duration(&self) -> chrono::Duration {
        self.last().timestamp - self.first().timestamp
    }

    pub fn summary(&self, satellite: &str, norad_id: u32) -> PassSummary {
        let tca = self.culmination();
        PassSummary {
            satellite: satellite.to_string(),
            norad_id,
            aos: self.first().timestamp,
            los: self.last().timestamp,
            tca: tca.timestamp,
            max_elevation_deg: round2(tca.elevation_deg),
            aos_azimuth_deg: round2(self.first().azimuth_deg),
            los_azimuth_deg: round2(self.last().azimuth_deg),
            duration_seconds: self.duration().num_seconds(),
            sample_count: self.len(),
        }
    }
}

/// Report row for one predicted pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    pub satellite: String,
    pub norad_id: u32,
    pub aos: DateTime<Utc>,
    pub los: DateTime<Utc>,
    pub tca: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub aos_azimuth_deg: f64,
    pub los_azimuth_deg: f64,
    pub duration_seconds: i64,
    pub sample_count: usize,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
