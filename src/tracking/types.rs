//! Types shared between the feed poller and the canvas.

use chrono::{DateTime, Utc};
use geo_types::Coord;
use glam::DVec2;
use std::time::Duration;
use web_time::Instant;

/// A tracked object reported by the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingObject {
    /// Feed label (flight callsign)
    pub label: String,
    /// Geographic position (x = longitude, y = latitude)
    pub position: Coord<f64>,
    /// Altitude as reported by the feed
    pub altitude: f64,
    /// Wall-clock time of the poll that produced this record
    pub updated_at: DateTime<Utc>,
}

/// Everything one successful poll produced, published as a single value.
///
/// `positions[i]` is the projected map position of `objects[i]`.
#[derive(Debug, Clone)]
pub struct TrackerSnapshot {
    pub objects: Vec<MovingObject>,
    pub positions: Vec<DVec2>,
    /// When this snapshot was published
    pub refreshed_at: Instant,
    /// Incremented on every publish (0 = nothing fetched yet)
    pub generation: u64,
}

impl Default for TrackerSnapshot {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            positions: Vec::new(),
            refreshed_at: Instant::now(),
            generation: 0,
        }
    }
}

impl TrackerSnapshot {
    /// Time elapsed since this snapshot was published.
    pub fn staleness(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.refreshed_at)
    }

    /// Iterates objects together with their projected positions.
    pub fn iter(&self) -> impl Iterator<Item = (&MovingObject, DVec2)> {
        self.objects.iter().zip(self.positions.iter().copied())
    }
}

/// Outcome of the most recent poll, for the status bar.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FeedStatus {
    /// No feed configured or no poll has finished yet
    #[default]
    Idle,
    /// Last poll succeeded with this many objects
    Ok { count: usize },
    /// Last poll failed; the previous snapshot is still shown
    Error(String),
}

impl FeedStatus {
    pub fn label(&self) -> String {
        match self {
            FeedStatus::Idle => "Feed idle".to_string(),
            FeedStatus::Ok { count } => format!("Tracking {} flights", count),
            FeedStatus::Error(msg) => format!("Feed error: {}", msg),
        }
    }
}
