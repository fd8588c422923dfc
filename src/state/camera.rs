//! Camera state for the map canvas (pan focus and zoom).

use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};

/// Tunables for camera input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// World distance moved per screen pixel dragged, at zoom 1.
    pub drag_sensitivity: f64,
    /// Zoom factor applied per scroll notch.
    pub zoom_step: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            drag_sensitivity: 1.5,
            zoom_step: 1.025,
            min_zoom: 0.1,
            max_zoom: 10.0,
        }
    }
}

impl CameraConfig {
    /// Replaces unusable values (non-positive, non-finite or inverted zoom bounds) with defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let positive = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };

        let mut config = Self {
            drag_sensitivity: positive(self.drag_sensitivity, defaults.drag_sensitivity),
            zoom_step: positive(self.zoom_step, defaults.zoom_step),
            min_zoom: positive(self.min_zoom, defaults.min_zoom),
            max_zoom: positive(self.max_zoom, defaults.max_zoom),
        };
        if config.min_zoom > config.max_zoom {
            log::warn!(
                "Ignoring inverted zoom bounds [{}, {}]",
                config.min_zoom,
                config.max_zoom
            );
            config.min_zoom = defaults.min_zoom;
            config.max_zoom = defaults.max_zoom;
        }
        config
    }
}

/// Pan/zoom view onto the world plane.
///
/// Zoom is always applied around the viewport centre; zooming does not keep
/// the point under the cursor fixed.
#[derive(Debug, Clone)]
pub struct Camera {
    config: CameraConfig,
    /// World position the view is panned to.
    focus: DVec2,
    /// Current zoom scalar (1.0 = 100%).
    zoom: f64,
    /// Focus recorded when the current drag started.
    drag_start: Option<DVec2>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

impl Camera {
    pub fn new(config: CameraConfig) -> Self {
        let config = config.sanitized();
        Self {
            zoom: 1.0_f64.clamp(config.min_zoom, config.max_zoom),
            config,
            focus: DVec2::ZERO,
            drag_start: None,
        }
    }

    pub fn focus(&self) -> DVec2 {
        self.focus
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// World-to-screen transform for a viewport of the given size.
    pub fn transform(&self, viewport: DVec2) -> DAffine2 {
        let center = viewport / 2.0;
        DAffine2::from_translation(center)
            * DAffine2::from_scale(DVec2::splat(self.zoom))
            * DAffine2::from_translation(-self.focus)
            * DAffine2::from_translation(-center)
    }

    pub fn screen_to_world(&self, screen: DVec2, viewport: DVec2) -> DVec2 {
        self.transform(viewport).inverse().transform_point2(screen)
    }

    /// Records the focus at the start of a drag.
    pub fn begin_drag(&mut self) {
        self.drag_start = Some(self.focus);
    }

    /// Pans by the total screen-space distance dragged since [`Camera::begin_drag`].
    pub fn drag(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        let start = *self.drag_start.get_or_insert(self.focus);
        let delta = DVec2::new(dx, dy) / self.zoom * self.config.drag_sensitivity;
        self.focus = start - delta;
    }

    pub fn end_drag(&mut self) {
        self.drag_start = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    /// Zooms in (positive) or out (negative) by whole notches, then clamps.
    pub fn zoom_by(&mut self, notches: i32) {
        let zoom = self.zoom * self.config.zoom_step.powi(notches);
        if !zoom.is_nan() {
            self.zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        }
    }

    /// Returns to 100% zoom, or the nearest configured bound.
    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0_f64.clamp(self.config.min_zoom, self.config.max_zoom);
    }

    /// Resets zoom and returns the focus to the world origin.
    pub fn reset(&mut self) {
        self.reset_zoom();
        self.focus = DVec2::ZERO;
        self.drag_start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: DVec2 = DVec2::new(800.0, 600.0);

    fn assert_close(a: DVec2, b: DVec2) {
        assert!((a - b).length() < 1e-9, "{a} != {b}");
    }

    fn world_to_screen(camera: &Camera, world: DVec2) -> DVec2 {
        camera.transform(VIEWPORT).transform_point2(world)
    }

    #[test]
    fn test_identity_at_default() {
        let camera = Camera::default();
        let p = DVec2::new(123.0, -45.0);
        assert_close(world_to_screen(&camera, p), p);
    }

    #[test]
    fn test_transform_composition() {
        let mut camera = Camera::default();
        camera.zoom_by(10);
        camera.begin_drag();
        camera.drag(-30.0, 15.0);
        camera.end_drag();

        let zoom = camera.zoom();
        let focus = camera.focus();
        let center = VIEWPORT / 2.0;
        let world = DVec2::new(250.0, 75.0);

        let expected = center + (world - focus - center) * zoom;
        assert_close(world_to_screen(&camera, world), expected);
        assert_close(camera.screen_to_world(expected, VIEWPORT), world);
    }

    #[test]
    fn test_zoom_in_notches() {
        for n in [1, 5, 40, 93, 94, 200] {
            let mut camera = Camera::default();
            for _ in 0..n {
                camera.zoom_by(1);
            }
            let expected = 1.025f64.powi(n).min(10.0);
            assert!((camera.zoom() - expected).abs() < 1e-9, "n = {n}");
        }
    }

    #[test]
    fn test_zoom_out_notches() {
        for n in [1, 5, 40, 93, 94, 200] {
            let mut camera = Camera::default();
            camera.zoom_by(-n);
            let expected = 1.025f64.powi(-n).max(0.1);
            assert!((camera.zoom() - expected).abs() < 1e-9, "n = {n}");
        }
    }

    #[test]
    fn test_zoom_is_centre_anchored() {
        let mut camera = Camera::default();
        let center = VIEWPORT / 2.0;
        camera.zoom_by(20);
        assert_close(world_to_screen(&camera, center), center);
    }

    #[test]
    fn test_drag_scales_with_zoom_and_sensitivity() {
        let mut camera = Camera::default();
        camera.begin_drag();
        camera.drag(10.0, -20.0);
        assert_close(camera.focus(), DVec2::new(-15.0, 30.0));

        // Drag deltas are totals since the drag started, not increments.
        camera.drag(20.0, 0.0);
        assert_close(camera.focus(), DVec2::new(-30.0, 0.0));
        camera.end_drag();

        camera.zoom_by(-200);
        camera.begin_drag();
        camera.drag(1.0, 0.0);
        assert_close(camera.focus(), DVec2::new(-30.0 - 15.0, 0.0));
    }

    #[test]
    fn test_invalid_input_is_ignored() {
        let mut camera = Camera::default();
        camera.drag(f64::NAN, 1.0);
        camera.drag(1.0, f64::INFINITY);
        assert_eq!(camera.focus(), DVec2::ZERO);

        camera.zoom_by(i32::MAX);
        assert_eq!(camera.zoom(), 10.0);
        camera.zoom_by(i32::MIN);
        assert_eq!(camera.zoom(), 0.1);
    }

    #[test]
    fn test_config_is_sanitized() {
        let camera = Camera::new(CameraConfig {
            drag_sensitivity: -1.0,
            zoom_step: f64::NAN,
            min_zoom: 20.0,
            max_zoom: 5.0,
        });
        assert_eq!(camera.config, CameraConfig::default());
    }

    #[test]
    fn test_reset() {
        let mut camera = Camera::default();
        camera.zoom_by(3);
        camera.drag(5.0, 5.0);
        camera.reset();
        assert_eq!(camera.zoom(), 1.0);
        assert_eq!(camera.focus(), DVec2::ZERO);
        assert!(!camera.is_dragging());
    }

    #[test]
    fn test_initial_and_reset_zoom_respect_bounds() {
        let config = CameraConfig {
            min_zoom: 2.0,
            max_zoom: 8.0,
            ..CameraConfig::default()
        };
        let mut camera = Camera::new(config);
        assert_eq!(camera.zoom(), 2.0);

        camera.zoom_by(10);
        assert!(camera.zoom() > 2.0);
        camera.reset_zoom();
        assert_eq!(camera.zoom(), 2.0);

        camera.zoom_by(10);
        camera.reset();
        assert_eq!(camera.zoom(), 2.0);

        let mut zoomed_out = Camera::new(CameraConfig {
            min_zoom: 0.1,
            max_zoom: 0.5,
            ..CameraConfig::default()
        });
        assert_eq!(zoomed_out.zoom(), 0.5);
        zoomed_out.zoom_by(-3);
        zoomed_out.reset_zoom();
        assert_eq!(zoomed_out.zoom(), 0.5);
    }
}
