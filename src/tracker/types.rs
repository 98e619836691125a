use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::geometry::ObservationAngles;
use crate::predict::Pass;

/// What one follow tick produced.
#[derive(Debug)]
pub enum TrackEvent {
    Sample {
        angles: ObservationAngles,
        visible: bool,
    },
    /// First sample of a new pass.
    Rise(ObservationAngles),
    /// A pass closed because the object dropped below the threshold.
    Set(Pass),
    /// The tick could not be propagated; the open pass, if any, stays open.
    Skipped {
        timestamp: DateTime<Utc>,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct FollowOptions {
    pub tick: std::time::Duration,
    pub min_elevation_deg: f64,
    /// Stop after this many ticks. `None` runs until stopped.
    pub max_ticks: Option<u64>,
}

#[derive(Debug, Default, Serialize)]
pub struct FollowSummary {
    pub ticks: u64,
    pub skipped: u64,
    pub completed_passes: usize,
    /// True when the session ended with the object still above the threshold.
    pub ended_visible: bool,
}
