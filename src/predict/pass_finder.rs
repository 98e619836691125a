use chrono::{DateTime, Duration, Utc};

use crate::geometry::{ObservationAngles, ObserverLocation};
use crate::predict::error::PredictError;
use crate::predict::propagation::{observation_series, Propagate};
use crate::predict::types::Pass;

#[derive(Debug, Clone, Default)]
enum ScanState {
    #[default]
    Idle,
    Accumulating(Vec<ObservationAngles>),
}

/// Groups time-ordered samples into passes above a minimum elevation.
///
/// Samples can be pushed one at a time, so the same machine serves both a
/// batch scan and a live loop that produces one observation per tick.
#[derive(Debug, Clone)]
pub struct PassScanner {
    min_elevation_deg: f64,
    state: ScanState,
}

impl PassScanner {
    pub fn new(min_elevation_deg: f64) -> Self {
        Self {
            min_elevation_deg,
            state: ScanState::Idle,
        }
    }

    pub fn is_accumulating(&self) -> bool {
        matches!(self.state, ScanState::Accumulating(_))
    }

    /// Feeds one sample. Returns the pass that this sample closed, if any.
    pub fn push(&mut self, sample: ObservationAngles) -> Option<Pass> {
        let visible = sample.is_visible(self.min_elevation_deg);
        match (std::mem::take(&mut self.state), visible) {
            (ScanState::Idle, false) => None,
            (ScanState::Idle, true) => {
                self.state = ScanState::Accumulating(vec![sample]);
                None
            }
            (ScanState::Accumulating(mut samples), true) => {
                samples.push(sample);
                self.state = ScanState::Accumulating(samples);
                None
            }
            (ScanState::Accumulating(samples), false) => Pass::from_samples(samples),
        }
    }

    /// Ends the scan, emitting a pass still open when the window ran out.
    pub fn finish(self) -> Option<Pass> {
        match self.state {
            ScanState::Idle => None,
            ScanState::Accumulating(samples) => Pass::from_samples(samples),
        }
    }
}

/// Splits a time-ordered sample sequence into maximal visible runs.
/// Input order is kept; nothing is re-sorted.
pub fn find_passes<I>(samples: I, min_elevation_deg: f64) -> Vec<Pass>
where
    I: IntoIterator<Item = ObservationAngles>,
{
    let mut scanner = PassScanner::new(min_elevation_deg);
    let mut passes: Vec<Pass> = samples
        .into_iter()
        .filter_map(|sample| scanner.push(sample))
        .collect();
    passes.extend(scanner.finish());
    passes
}

/// Samples one object over `[start, end]` and returns its passes.
pub fn predict_passes<P: Propagate + ?Sized>(
    propagator: &P,
    observer: &ObserverLocation,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
    min_elevation_deg: f64,
) -> Result<Vec<Pass>, PredictError> {
    let series = observation_series(propagator, observer, start, end, step)?;
    if series.skipped > 0 {
        log::debug!(
            "{} of {} samples skipped",
            series.skipped,
            series.skipped + series.samples.len()
        );
    }
    Ok(find_passes(series.samples, min_elevation_deg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::propagation::tests::{iss, Scripted};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 5, 0, 0, 0).unwrap()
    }

    fn samples(elevations: &[f64]) -> Vec<ObservationAngles> {
        elevations
            .iter()
            .enumerate()
            .map(|(i, &el)| ObservationAngles {
                timestamp: t0() + Duration::seconds(i as i64 * 30),
                azimuth_deg: i as f64,
                elevation_deg: el,
                range_km: 1000.0,
                range_rate_km_s: 0.0,
            })
            .collect()
    }

    fn elevations(pass: &Pass) -> Vec<f64> {
        pass.samples().iter().map(|s| s.elevation_deg).collect()
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(find_passes(Vec::new(), 10.0).is_empty());
    }

    #[test]
    fn all_below_yields_nothing() {
        assert!(find_passes(samples(&[-10.0, 0.0, 9.99, 5.0]), 10.0).is_empty());
    }

    #[test]
    fn all_above_yields_one_pass() {
        let input = samples(&[10.0, 20.0, 80.0, 15.0]);
        let passes = find_passes(input.clone(), 10.0);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].samples(), input.as_slice());
    }

    #[test]
    fn runs_are_split_at_sub_threshold_samples() {
        let passes = find_passes(
            samples(&[5.0, 12.0, 40.0, 11.0, 3.0, -4.0, 15.0, 2.0, 30.0, 31.0]),
            10.0,
        );
        assert_eq!(passes.len(), 3);
        assert_eq!(elevations(&passes[0]), vec![12.0, 40.0, 11.0]);
        assert_eq!(elevations(&passes[1]), vec![15.0]);
        // Still visible when the window ends.
        assert_eq!(elevations(&passes[2]), vec![30.0, 31.0]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let passes = find_passes(samples(&[9.0, 10.0, 9.0]), 10.0);
        assert_eq!(passes.len(), 1);
        assert_eq!(elevations(&passes[0]), vec![10.0]);
    }

    #[test]
    fn concatenated_passes_equal_visible_subsequence() {
        let profile: Vec<f64> = (0..200)
            .map(|i| 40.0 * (i as f64 * 0.11).sin() + 8.0 * (i as f64 * 0.7).cos())
            .collect();
        let input = samples(&profile);
        let threshold = 12.5;

        let passes = find_passes(input.clone(), threshold);
        let flattened: Vec<ObservationAngles> = passes
            .iter()
            .flat_map(|p| p.samples().iter().copied())
            .collect();
        let expected: Vec<ObservationAngles> = input
            .iter()
            .copied()
            .filter(|s| s.elevation_deg >= threshold)
            .collect();
        assert_eq!(flattened, expected);

        let runs = profile
            .iter()
            .enumerate()
            .filter(|&(i, &el)| el >= threshold && (i == 0 || profile[i - 1] < threshold))
            .count();
        assert_eq!(passes.len(), runs);
        assert!(passes.iter().all(|p| p.len() > 0));
    }

    #[test]
    fn streaming_matches_batch() {
        let input = samples(&[1.0, 11.0, 22.0, 3.0, 14.0, 15.0]);
        let batch = find_passes(input.clone(), 10.0);

        let mut scanner = PassScanner::new(10.0);
        let mut streamed = Vec::new();
        for sample in input {
            let was_open = scanner.is_accumulating();
            if let Some(pass) = scanner.push(sample) {
                assert!(was_open);
                assert!(!scanner.is_accumulating());
                streamed.push(pass);
            }
        }
        assert!(scanner.is_accumulating());
        let tail = scanner.finish().unwrap();
        assert_eq!(tail.len(), 2);
        streamed.push(tail);
        assert_eq!(streamed, batch);
    }

    #[test]
    fn pass_summary_reports_culmination() {
        let passes = find_passes(samples(&[0.0, 12.0, 55.5, 55.5, 20.0, 1.0]), 10.0);
        let summary = passes[0].summary("TEST SAT", 99999);
        assert_eq!(summary.aos, t0() + Duration::seconds(30));
        assert_eq!(summary.los, t0() + Duration::seconds(120));
        assert_eq!(summary.tca, t0() + Duration::seconds(60));
        assert_eq!(summary.max_elevation_deg, 55.5);
        assert_eq!(summary.aos_azimuth_deg, 1.0);
        assert_eq!(summary.los_azimuth_deg, 4.0);
        assert_eq!(summary.duration_seconds, 90);
        assert_eq!(summary.sample_count, 4);
    }

    #[test]
    fn failed_sample_does_not_split_a_pass() {
        let start = t0();
        let step = Duration::seconds(10);
        let scripted = Scripted {
            start,
            step,
            elevations: vec![-3.0, 15.0, 25.0, 35.0, 25.0, 15.0, -3.0],
            failing: vec![3],
            observer: ObserverLocation::default(),
        };
        let passes = predict_passes(
            &scripted,
            &scripted.observer,
            start,
            start + Duration::seconds(60),
            step,
            10.0,
        )
        .unwrap();
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].len(), 4);
    }

    #[test]
    fn iss_passes_over_a_day_are_plausible() {
        let observer = ObserverLocation::new(48.8566, 2.3522, 35.0);
        let start = Utc.with_ymd_and_hms(2025, 10, 5, 12, 0, 0).unwrap();
        let passes = predict_passes(
            &iss(),
            &observer,
            start,
            start + Duration::days(1),
            Duration::seconds(30),
            10.0,
        )
        .unwrap();

        assert!(!passes.is_empty());
        for pass in &passes {
            assert!(pass.samples().iter().all(|s| s.elevation_deg >= 10.0));
            // Low-orbit passes above 10 degrees last minutes, not hours.
            assert!(pass.duration() < Duration::minutes(15));
        }
        assert!(passes
            .windows(2)
            .all(|w| w[0].last().timestamp < w[1].first().timestamp));
    }
}
