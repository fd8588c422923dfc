//! Static labelled points drawn with the map info overlay.

use super::RobinsonProjection;
use geo_types::Coord;
use glam::DVec2;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestPointError {
    #[error("malformed test point JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk record layout.
#[derive(Debug, Deserialize)]
struct TestPointRecord {
    #[serde(rename = "Label")]
    label: String,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
}

/// A labelled point, projected once at load.
#[derive(Debug, Clone, PartialEq)]
pub struct TestPoint {
    pub label: String,
    /// Geographic position (x = longitude, y = latitude)
    pub position: Coord<f64>,
    /// Projected map position
    pub screen: DVec2,
}

/// Parses a JSON array of `{ "Label", "Latitude", "Longitude" }` records.
///
/// Entries that are not well-formed records are skipped with a warning; only a
/// document that is not a JSON array fails the load.
pub fn load_test_points(
    json: &str,
    projection: &RobinsonProjection,
) -> Result<Vec<TestPoint>, TestPointError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let total = entries.len();

    let points: Vec<TestPoint> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<TestPointRecord>(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Skipping test point {}: {}", index, e);
                None
            }
        })
        .map(|r| {
            let position = Coord {
                x: r.longitude,
                y: r.latitude,
            };
            let point = TestPoint {
                screen: projection.project_coord(position),
                label: r.label,
                position,
            };
            log::debug!("Test point {} at {:?}", point.label, point.position);
            point
        })
        .collect();

    log::info!("Loaded {} of {} test points", points.len(), total);
    Ok(points)
}
