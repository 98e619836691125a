use chrono::Utc;
use tokio::sync::oneshot;
use tokio::time::{interval, MissedTickBehavior};

use crate::geometry::ObserverLocation;
use crate::predict::{observe_at, PassScanner, PredictError, Propagate};

use super::types::{FollowOptions, FollowSummary, TrackEvent};

/// Observes one object once per tick until stopped or `max_ticks` is reached.
///
/// Each observation goes through a `PassScanner` held across ticks, so rises
/// and sets are reported as they happen. A zero tick is rejected up front.
pub async fn follow<P, F>(
    propagator: &P,
    observer: ObserverLocation,
    options: FollowOptions,
    mut stop_rx: oneshot::Receiver<()>,
    mut on_event: F,
) -> Result<FollowSummary, PredictError>
where
    P: Propagate + ?Sized,
    F: FnMut(&TrackEvent),
{
    if options.tick.is_zero() {
        return Err(PredictError::InvalidWindow(
            "follow interval must be positive".into(),
        ));
    }

    let mut scanner = PassScanner::new(options.min_elevation_deg);
    let mut summary = FollowSummary::default();

    let mut ticker = interval(options.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if options.max_ticks.is_some_and(|max| summary.ticks >= max) {
            break;
        }

        let should_stop = tokio::select! {
            _ = ticker.tick() => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            log::info!("Follow stopped after {} ticks", summary.ticks);
            break;
        }
        summary.ticks += 1;

        let now = Utc::now();
        let angles = match observe_at(propagator, &observer, now) {
            Ok(angles) => angles,
            Err(e) => {
                log::warn!("Skipping tick at {}: {}", now, e);
                summary.skipped += 1;
                on_event(&TrackEvent::Skipped {
                    timestamp: now,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let was_open = scanner.is_accumulating();
        let closed = scanner.push(angles);

        on_event(&TrackEvent::Sample {
            angles,
            visible: scanner.is_accumulating(),
        });
        if !was_open && scanner.is_accumulating() {
            on_event(&TrackEvent::Rise(angles));
        }
        if let Some(pass) = closed {
            summary.completed_passes += 1;
            on_event(&TrackEvent::Set(pass));
        }
    }

    summary.ended_visible = scanner.is_accumulating();
    Ok(summary)
}
