//! Background feed polling.
//!
//! A dedicated thread queries the feed on a fixed interval and publishes a
//! fresh [`TrackerSnapshot`] after every successful poll. Failed polls are
//! logged and leave the previous snapshot in place; the loop simply waits for
//! the next interval.

use super::feed::{parse_feed, FeedError, FeedSource};
use super::types::{FeedStatus, TrackerSnapshot};
use crate::geo::RobinsonProjection;
use crate::sync::{CancelToken, Snapshot};
use chrono::Utc;
use eframe::egui;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use web_time::Instant;

/// Granularity at which the poll wait checks for cancellation.
const SLEEP_INCREMENT: Duration = Duration::from_millis(250);

/// Fetches, parses and projects one feed response, then publishes it.
///
/// Returns the number of objects published. On error nothing is published.
pub fn poll_once(
    source: &dyn FeedSource,
    projection: &RobinsonProjection,
    published: &Snapshot<TrackerSnapshot>,
) -> Result<usize, FeedError> {
    let body = source.fetch()?;
    let objects = parse_feed(&body, Utc::now())?;
    let positions = objects
        .iter()
        .map(|o| projection.project_coord(o.position))
        .collect();

    let count = objects.len();
    let generation = published.load().generation + 1;
    published.publish(TrackerSnapshot {
        objects,
        positions,
        refreshed_at: Instant::now(),
        generation,
    });

    Ok(count)
}

/// Polls a feed source on a fixed interval until cancelled.
pub struct FeedPoller {
    source: Box<dyn FeedSource>,
    projection: RobinsonProjection,
    published: Arc<Snapshot<TrackerSnapshot>>,
    status: Arc<Snapshot<FeedStatus>>,
    interval: Duration,
}

impl FeedPoller {
    pub fn new(
        source: Box<dyn FeedSource>,
        projection: RobinsonProjection,
        published: Arc<Snapshot<TrackerSnapshot>>,
        status: Arc<Snapshot<FeedStatus>>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            projection,
            published,
            status,
            interval,
        }
    }

    /// Runs the poll loop on the current thread.
    pub fn run(self, cancel: CancelToken, mut on_update: impl FnMut()) {
        log::info!("Feed poller started (interval {:?})", self.interval);

        while !cancel.is_cancelled() {
            let started = Instant::now();
            match poll_once(self.source.as_ref(), &self.projection, &self.published) {
                Ok(count) => {
                    let highest = self
                        .published
                        .load()
                        .objects
                        .iter()
                        .map(|o| o.altitude)
                        .fold(0.0_f64, f64::max);
                    log::debug!(
                        "Fetched {} tracked flights in {:.0}ms (highest at {:.0})",
                        count,
                        started.elapsed().as_secs_f64() * 1000.0,
                        highest
                    );
                    self.status.publish(FeedStatus::Ok { count });
                }
                Err(e) => {
                    log::warn!("Failed to fetch tracked flights: {}", e);
                    self.status.publish(FeedStatus::Error(e.to_string()));
                }
            }
            on_update();

            if !interruptible_sleep(&cancel, self.interval) {
                break;
            }
        }

        log::info!("Feed poller stopped");
    }

    /// Starts the poll loop on its own thread, repainting `ctx` after each cycle.
    pub fn spawn(self, ctx: egui::Context, cancel: CancelToken) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("feed-poll".into())
            .spawn(move || self.run(cancel, || ctx.request_repaint()))
    }
}

/// Sleeps in increments, checking the cancel flag.
/// Returns false if cancellation was requested.
fn interruptible_sleep(cancel: &CancelToken, total: Duration) -> bool {
    let mut remaining = total;

    while !remaining.is_zero() {
        if cancel.is_cancelled() {
            return false;
        }
        let step = SLEEP_INCREMENT.min(remaining);
        thread::sleep(step);
        remaining = remaining.saturating_sub(step);
    }

    !cancel.is_cancelled()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;
    use std::sync::Mutex;

    /// Returns queued bodies in order, then repeats the last one.
    struct ScriptedSource {
        bodies: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(bodies: &[&str]) -> Self {
            let mut bodies: Vec<String> = bodies.iter().map(|b| b.to_string()).collect();
            bodies.reverse();
            Self {
                bodies: Mutex::new(bodies),
            }
        }
    }

    impl FeedSource for ScriptedSource {
        fn fetch(&self) -> Result<String, FeedError> {
            let mut bodies = self.bodies.lock().unwrap();
            if bodies.len() > 1 {
                Ok(bodies.pop().unwrap())
            } else {
                Ok(bodies[0].clone())
            }
        }
    }

    struct FailingSource;

    impl FeedSource for FailingSource {
        fn fetch(&self) -> Result<String, FeedError> {
            Err(FeedError::Status {
                url: "https://feed.example/".to_string(),
                status: 503,
            })
        }
    }

    const GOOD: &str = r#"{ "a": ["UAL123", 0.0, 0.0, 270, 35000] }"#;
    const NO_ALTITUDE: &str = r#"{ "a": ["UAL123", 10.0, 20.0, 270] }"#;

    fn projection() -> RobinsonProjection {
        RobinsonProjection::new(20450.0, 10350.0, DVec2::ZERO)
    }

    #[test]
    fn test_poll_publishes_projected_positions() {
        let published = Snapshot::<TrackerSnapshot>::default();
        let source = ScriptedSource::new(&[GOOD]);

        let count = poll_once(&source, &projection(), &published).unwrap();
        assert_eq!(count, 1);

        let snapshot = published.load();
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.objects.len(), 1);
        assert_eq!(snapshot.positions[0], projection().project_to_screen(0.0, 0.0));
        assert_eq!(snapshot.objects[0].label, "UAL123");
    }

    #[test]
    fn test_missing_altitude_keeps_previous_snapshot() {
        let published = Snapshot::<TrackerSnapshot>::default();
        let source = ScriptedSource::new(&[GOOD, NO_ALTITUDE]);

        poll_once(&source, &projection(), &published).unwrap();
        let before = published.load();

        let err = poll_once(&source, &projection(), &published).unwrap_err();
        assert!(matches!(err, FeedError::MissingField { index: 4, .. }));

        let after = published.load();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.generation, 1);
    }

    #[test]
    fn test_http_error_keeps_previous_snapshot() {
        let published = Snapshot::<TrackerSnapshot>::default();
        let before = published.load();

        assert!(poll_once(&FailingSource, &projection(), &published).is_err());
        assert!(Arc::ptr_eq(&before, &published.load()));
    }

    #[test]
    fn test_poller_keeps_running_after_errors() {
        let published = Arc::new(Snapshot::<TrackerSnapshot>::default());
        let status = Arc::new(Snapshot::<FeedStatus>::default());
        let poller = FeedPoller::new(
            Box::new(FailingSource),
            projection(),
            published.clone(),
            status.clone(),
            Duration::from_millis(1),
        );

        let cancel = CancelToken::new();
        let cycles = Arc::new(Mutex::new(0));
        let counter = cycles.clone();
        let stopper = cancel.clone();
        poller.run(cancel, move || {
            let mut n = counter.lock().unwrap();
            *n += 1;
            if *n == 3 {
                stopper.cancel();
            }
        });

        assert_eq!(*cycles.lock().unwrap(), 3);
        assert_eq!(published.load().generation, 0);
        assert!(matches!(*status.load(), FeedStatus::Error(_)));
    }

    #[test]
    fn test_spawned_poller_stops_on_cancel() {
        let published = Arc::new(Snapshot::<TrackerSnapshot>::default());
        let status = Arc::new(Snapshot::<FeedStatus>::default());
        let poller = FeedPoller::new(
            Box::new(ScriptedSource::new(&[GOOD])),
            projection(),
            published.clone(),
            status.clone(),
            Duration::from_millis(5),
        );

        let cancel = CancelToken::new();
        let handle = poller
            .spawn(egui::Context::default(), cancel.clone())
            .unwrap();

        while published.load().generation < 2 {
            thread::sleep(Duration::from_millis(1));
        }
        cancel.cancel();
        handle.join().unwrap();

        assert_eq!(*status.load(), FeedStatus::Ok { count: 1 });
    }

    #[test]
    fn test_interruptible_sleep_returns_early() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let started = std::time::Instant::now();
        assert!(!interruptible_sleep(&cancel, Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
