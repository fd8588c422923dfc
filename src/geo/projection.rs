//! Map projection and coordinate transformation.
//!
//! Converts geographic coordinates (lat/lon) into the world plane using the
//! Robinson pseudo-cylindrical projection, approximated from its published
//! coefficient table by linear interpolation between 5 degree bands.

use geo_types::Coord;
use glam::DVec2;

/// Robinson X scale coefficients, one per 5 degree band from 0 to 90.
const X_SCALE: [f64; 19] = [
    0.8487, 0.84751182, 0.84479598, 0.840213, 0.83359314, 0.8257851, 0.814752, 0.80006949,
    0.78216192, 0.76060494, 0.73658673, 0.7086645, 0.67777182, 0.64475739, 0.60987582,
    0.57134484, 0.52729731, 0.48562614, 0.45167814,
];

/// Robinson Y scale coefficients, one per 5 degree band from 0 to 90.
const Y_SCALE: [f64; 19] = [
    0.0, 0.0838426, 0.1676852, 0.2515278, 0.3353704, 0.419213, 0.5030556, 0.5868982, 0.67182264,
    0.75336633, 0.83518048, 0.91537187, 0.99339958, 1.06872269, 1.14066505, 1.20841528,
    1.27035062, 1.31998003, 1.3523,
];

/// Width in degrees of one coefficient band.
const BAND_DEG: f64 = 5.0;

/// Ratio between the map width and the projected equator length.
const EQUATOR_RATIO: f64 = 2.666269758;

/// Default vertical bias applied by [`RobinsonProjection::project_to_screen`].
pub const DEFAULT_SCREEN_BIAS_Y: f64 = 750.0;

/// Robinson projection onto a map of fixed pixel dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct RobinsonProjection {
    map_width: f64,
    map_height: f64,
    earth_radius: f64,
    offset: DVec2,
    screen_bias_y: f64,
}

impl RobinsonProjection {
    /// Creates a projection for a map of the given size.
    ///
    /// `offset` is added to every world coordinate.
    pub fn new(map_width: f64, map_height: f64, offset: DVec2) -> Self {
        Self {
            map_width,
            map_height,
            earth_radius: map_width / EQUATOR_RATIO / 2.0,
            offset,
            screen_bias_y: DEFAULT_SCREEN_BIAS_Y,
        }
    }

    pub fn with_screen_bias(mut self, screen_bias_y: f64) -> Self {
        self.screen_bias_y = screen_bias_y;
        self
    }

    pub fn earth_radius(&self) -> f64 {
        self.earth_radius
    }

    /// Projects (lat, lng) in degrees into world-plane coordinates.
    ///
    /// Latitude is clamped to [-90, 90]. With a zero offset the result is
    /// mirrored exactly: `project_to_world(-lat, -lng) == -project_to_world(lat, lng)`.
    pub fn project_to_world(&self, lat: f64, lng: f64) -> DVec2 {
        let lat = lat.clamp(-90.0, 90.0);
        let (x_scale, y_scale) = interpolate_coefficients(lat.abs());

        let y_sign = if lat < 0.0 { -1.0 } else { 1.0 };
        let x = x_scale * lng.to_radians() * self.earth_radius + self.offset.x;
        let y = y_scale * y_sign * self.earth_radius + self.offset.y;

        DVec2::new(x, y)
    }

    /// Projects (lat, lng) into map pixel space, ready to draw without a camera.
    ///
    /// The origin moves to the top-left of the map and Y grows downward.
    pub fn project_to_screen(&self, lat: f64, lng: f64) -> DVec2 {
        let world = self.project_to_world(lat, lng);
        DVec2::new(
            world.x + self.map_width / 2.0,
            self.map_height / 2.0 - world.y + self.screen_bias_y,
        )
    }

    /// Projects a geographic coordinate (x = longitude, y = latitude) into map pixel space.
    pub fn project_coord(&self, coord: Coord<f64>) -> DVec2 {
        self.project_to_screen(coord.y, coord.x)
    }

    /// Builds the reference grid of projected points.
    ///
    /// Latitudes run from -90 to 90 and longitudes from -180 to 180 inclusive.
    pub fn graticule(&self, lat_step: f64, lng_step: f64) -> Vec<DVec2> {
        if !(lat_step > 0.0 && lng_step > 0.0) {
            return Vec::new();
        }

        let lat_count = (180.0 / lat_step).floor() as usize + 1;
        let lng_count = (360.0 / lng_step).floor() as usize + 1;

        let mut points = Vec::with_capacity(lat_count * lng_count);
        for i in 0..lat_count {
            let lat = -90.0 + i as f64 * lat_step;
            for j in 0..lng_count {
                let lng = -180.0 + j as f64 * lng_step;
                points.push(self.project_to_screen(lat, lng));
            }
        }
        points
    }
}

/// Interpolates the (X, Y) scale coefficients for an absolute latitude in [0, 90].
fn interpolate_coefficients(abs_lat: f64) -> (f64, f64) {
    // Band `low` covers (low*5, low*5 + 5]; zero belongs to band 0.
    let low = if abs_lat == 0.0 {
        0
    } else {
        ((abs_lat / BAND_DEG).ceil() as usize).saturating_sub(1)
    };
    let low = low.min(X_SCALE.len() - 2);
    let high = low + 1;

    let ratio = (abs_lat - low as f64 * BAND_DEG) / BAND_DEG;

    let x = (X_SCALE[high] - X_SCALE[low]) * ratio + X_SCALE[low];
    let y = (Y_SCALE[high] - Y_SCALE[low]) * ratio + Y_SCALE[low];
    (x, y)
}
