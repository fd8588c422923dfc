//! Application state management.
//!
//! State owned by the UI thread. Data produced by background threads (shape
//! polygons, tracker snapshots) lives behind snapshots instead.

mod camera;
mod settings;

pub use camera::Camera;
pub use settings::{GlobeSettings, FEED_URL_ENV};

use glam::DVec2;

/// Root application state.
#[derive(Debug, Default)]
pub struct AppState {
    /// Pan/zoom view of the map canvas
    pub camera: Camera,

    /// Draw the graticule and test points
    pub show_map_info: bool,

    /// Show the cursor coordinate read-out (while Ctrl is held)
    pub show_cursor_coords: bool,

    /// Cursor position relative to the canvas, when hovered
    pub cursor: Option<DVec2>,

    /// Application status message displayed in top bar
    pub status_message: String,
}

impl AppState {
    pub fn new(settings: &GlobeSettings) -> Self {
        Self {
            camera: Camera::new(settings.camera),
            status_message: "Ready".to_string(),
            ..Default::default()
        }
    }
}
