//! Builds the per-frame draw list.
//!
//! Composition is pure: it reads the camera, the latest published shape
//! polygons and tracker snapshot, and produces screen-space items relative to
//! the viewport's top-left corner. Painting is left to [`super::renderer`].

use super::shape::MapShape;
use super::test_points::TestPoint;
use crate::state::Camera;
use crate::tracking::TrackerSnapshot;
use glam::{DAffine2, DVec2};
use std::sync::Arc;
use web_time::Instant;

/// Stroke width of shape outlines, in world units.
pub const OUTLINE_WIDTH: f64 = 5.0;
/// Half extent of graticule markers, in world units.
const REFERENCE_HALF_SIZE: f64 = 10.0;
/// Half extent of test point markers, in world units.
const TEST_POINT_HALF_SIZE: f64 = 5.0;
/// Half extent of moving-object markers, in world units.
const OBJECT_HALF_SIZE: f64 = 2.0;
/// Items whose bounds lie further than this outside the viewport are culled (pixels).
const CULL_MARGIN: f64 = 64.0;

/// What a marker represents; the renderer picks colours from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Reference,
    TestPoint,
    MovingObject,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawItem {
    /// Closed outline of a shape.
    Outline { points: Vec<DVec2> },
    /// A shape with a single revealed point.
    Dot { center: DVec2 },
    Marker {
        kind: MarkerKind,
        center: DVec2,
        half_size: f64,
        label: Option<String>,
    },
}

/// Everything one frame paints, in paint order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub items: Vec<DrawItem>,
    /// Heads-up lines, top to bottom.
    pub hud: Vec<String>,
    /// Cursor read-out and where to draw it.
    pub cursor_label: Option<(DVec2, String)>,
    /// Camera zoom, used to scale stroke widths and text.
    pub scale: f64,
}

/// Inputs for one frame.
pub struct OverlayInput<'a> {
    pub camera: &'a Camera,
    pub viewport: DVec2,
    pub shapes: &'a [Arc<MapShape>],
    pub graticule: &'a [DVec2],
    pub test_points: &'a [TestPoint],
    pub tracker: &'a TrackerSnapshot,
    pub now: Instant,
    pub show_map_info: bool,
    /// Cursor position within the viewport, when the read-out is requested.
    pub cursor: Option<DVec2>,
}

pub fn compose(input: &OverlayInput<'_>) -> DrawList {
    let transform = input.camera.transform(input.viewport);
    let zoom = input.camera.zoom();
    let visible = Bounds::viewport(input.viewport);
    let mut items = Vec::new();

    for shape in input.shapes {
        // Cheap Arc clone of whatever the scheduler last published.
        let polygon = shape.polygon();
        if polygon.is_empty() {
            continue;
        }
        match polygon.len() {
            1 => {
                let center = transform.transform_point2(polygon.points()[0].as_dvec2());
                if visible.contains(center) {
                    items.push(DrawItem::Dot { center });
                }
            }
            _ => {
                let points: Vec<DVec2> = polygon
                    .world_points()
                    .map(|p| transform.transform_point2(p))
                    .collect();
                if visible.intersects(&Bounds::of(&points)) {
                    items.push(DrawItem::Outline { points });
                }
            }
        }
    }

    if input.show_map_info {
        for &point in input.graticule {
            push_marker(
                &mut items,
                &transform,
                &visible,
                MarkerKind::Reference,
                point,
                REFERENCE_HALF_SIZE * zoom,
                None,
            );
        }
        for test_point in input.test_points {
            push_marker(
                &mut items,
                &transform,
                &visible,
                MarkerKind::TestPoint,
                test_point.screen,
                TEST_POINT_HALF_SIZE * zoom,
                Some(test_point.label.clone()),
            );
        }
    }

    for (object, position) in input.tracker.iter() {
        push_marker(
            &mut items,
            &transform,
            &visible,
            MarkerKind::MovingObject,
            position,
            OBJECT_HALF_SIZE * zoom,
            Some(object.label.to_uppercase()),
        );
    }

    let focus = input.camera.focus();
    let staleness = input.tracker.staleness(input.now);
    let hud = vec![
        format!("World X: {:.0}", focus.x),
        format!("World Y: {:.0}", focus.y),
        format!("Zoom Scalar: {:.2} (Reset: press =)", zoom),
        format!("Tracked flights: {}", input.tracker.objects.len()),
        format!("Flights last updated: {}ms ago", staleness.as_millis()),
        format!(
            "Showing map overlay: {} (Toggle: press \\)",
            input.show_map_info
        ),
    ];

    let cursor_label = input.cursor.map(|screen| {
        let world = input.camera.screen_to_world(screen, input.viewport);
        (
            screen,
            format!(
                "({:.0}, {:.0}) world ({:.0}, {:.0})",
                screen.x, screen.y, world.x, world.y
            ),
        )
    });

    DrawList {
        items,
        hud,
        cursor_label,
        scale: zoom,
    }
}

fn push_marker(
    items: &mut Vec<DrawItem>,
    transform: &DAffine2,
    visible: &Bounds,
    kind: MarkerKind,
    world: DVec2,
    half_size: f64,
    label: Option<String>,
) {
    let center = transform.transform_point2(world);
    if visible.contains(center) {
        items.push(DrawItem::Marker {
            kind,
            center,
            half_size,
            label,
        });
    }
}

/// Axis-aligned screen bounds used for culling.
struct Bounds {
    min: DVec2,
    max: DVec2,
}

impl Bounds {
    fn viewport(size: DVec2) -> Self {
        Self {
            min: DVec2::splat(-CULL_MARGIN),
            max: size + DVec2::splat(CULL_MARGIN),
        }
    }

    fn of(points: &[DVec2]) -> Self {
        points.iter().fold(
            Self {
                min: DVec2::splat(f64::INFINITY),
                max: DVec2::splat(f64::NEG_INFINITY),
            },
            |b, &p| Self {
                min: b.min.min(p),
                max: b.max.max(p),
            },
        )
    }

    fn contains(&self, p: DVec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    fn intersects(&self, other: &Bounds) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::shape::parse_shape;
    use crate::tracking::MovingObject;
    use chrono::Utc;
    use geo_types::Coord;
    use std::time::Duration;

    const VIEWPORT: DVec2 = DVec2::new(800.0, 600.0);

    struct Fixture {
        camera: Camera,
        shapes: Vec<Arc<MapShape>>,
        graticule: Vec<DVec2>,
        test_points: Vec<TestPoint>,
        tracker: TrackerSnapshot,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                camera: Camera::default(),
                shapes: Vec::new(),
                graticule: Vec::new(),
                test_points: Vec::new(),
                tracker: TrackerSnapshot::default(),
            }
        }

        fn compose(&self, show_map_info: bool, cursor: Option<DVec2>) -> DrawList {
            compose(&OverlayInput {
                camera: &self.camera,
                viewport: VIEWPORT,
                shapes: &self.shapes,
                graticule: &self.graticule,
                test_points: &self.test_points,
                tracker: &self.tracker,
                now: self.tracker.refreshed_at + Duration::from_millis(250),
                show_map_info,
                cursor,
            })
        }
    }

    fn shape(record: &str) -> Arc<MapShape> {
        Arc::new(parse_shape(record).unwrap().unwrap())
    }

    fn object(label: &str) -> MovingObject {
        MovingObject {
            label: label.to_string(),
            position: Coord { x: 0.0, y: 0.0 },
            altitude: 30000.0,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_unrevealed_shapes_emit_nothing() {
        let mut fixture = Fixture::new();
        fixture.shapes.push(shape("R 10 10 1 0 0 1"));

        let list = fixture.compose(false, None);
        assert!(list.items.is_empty());
    }

    #[test]
    fn test_partial_shapes_emit_dot_then_outline() {
        let mut fixture = Fixture::new();
        let square = shape("R 10 10 1 0 0 1 -1 0");
        fixture.shapes.push(square.clone());

        square.request_new_vertex();
        square.publish(crate::geo::shape::Polygon::new(
            square.full_polygon().points()[..1].to_vec(),
        ));
        let list = fixture.compose(false, None);
        assert_eq!(
            list.items,
            vec![DrawItem::Dot {
                center: DVec2::new(100.0, 100.0)
            }]
        );

        square.reveal_all();
        square.publish(square.full_polygon());
        let list = fixture.compose(false, None);
        match &list.items[..] {
            [DrawItem::Outline { points }] => assert_eq!(points.len(), 5),
            other => panic!("expected one outline, got {:?}", other),
        }
    }

    #[test]
    fn test_offscreen_items_are_culled() {
        let mut fixture = Fixture::new();
        let far = shape("A 5000 5000 1 0 0 1");
        far.reveal_all();
        far.publish(far.full_polygon());
        fixture.shapes.push(far);
        fixture.graticule = vec![DVec2::new(50.0, 50.0), DVec2::new(-9000.0, 0.0)];

        let list = fixture.compose(true, None);
        assert_eq!(list.items.len(), 1);
        assert!(matches!(
            list.items[0],
            DrawItem::Marker {
                kind: MarkerKind::Reference,
                ..
            }
        ));
    }

    #[test]
    fn test_reference_layer_follows_toggle() {
        let mut fixture = Fixture::new();
        fixture.graticule = vec![DVec2::new(100.0, 100.0)];
        fixture.test_points.push(TestPoint {
            label: "Origin".to_string(),
            position: Coord { x: 0.0, y: 0.0 },
            screen: DVec2::new(200.0, 200.0),
        });

        assert!(fixture.compose(false, None).items.is_empty());

        let list = fixture.compose(true, None);
        assert_eq!(list.items.len(), 2);
        assert_eq!(
            list.items[1],
            DrawItem::Marker {
                kind: MarkerKind::TestPoint,
                center: DVec2::new(200.0, 200.0),
                half_size: TEST_POINT_HALF_SIZE,
                label: Some("Origin".to_string()),
            }
        );
        assert!(list.hud[5].contains("true"));
    }

    #[test]
    fn test_objects_use_upper_case_labels() {
        let mut fixture = Fixture::new();
        fixture.tracker = TrackerSnapshot {
            objects: vec![object("ual123"), object("dlh400")],
            positions: vec![DVec2::new(10.0, 20.0), DVec2::new(30.0, 40.0)],
            refreshed_at: Instant::now(),
            generation: 1,
        };

        let list = fixture.compose(false, None);
        let labels: Vec<_> = list
            .items
            .iter()
            .filter_map(|item| match item {
                DrawItem::Marker {
                    kind: MarkerKind::MovingObject,
                    label,
                    ..
                } => label.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(labels, ["UAL123", "DLH400"]);
        assert_eq!(list.hud[3], "Tracked flights: 2");
        assert_eq!(list.hud[4], "Flights last updated: 250ms ago");
    }

    #[test]
    fn test_markers_scale_with_zoom() {
        let mut fixture = Fixture::new();
        fixture.graticule = vec![VIEWPORT / 2.0];
        fixture.camera.zoom_by(-28);

        let list = fixture.compose(true, None);
        let zoom = fixture.camera.zoom();
        assert_eq!(list.scale, zoom);
        match &list.items[0] {
            DrawItem::Marker { half_size, .. } => {
                assert!((half_size - REFERENCE_HALF_SIZE * zoom).abs() < 1e-9)
            }
            other => panic!("expected marker, got {:?}", other),
        }
    }

    #[test]
    fn test_hud_and_cursor_readout() {
        let mut fixture = Fixture::new();
        fixture.camera.begin_drag();
        fixture.camera.drag(-10.0, 20.0);

        let list = fixture.compose(false, Some(DVec2::new(400.0, 300.0)));
        assert_eq!(list.hud[0], "World X: 15");
        assert_eq!(list.hud[1], "World Y: -30");
        assert_eq!(list.hud[2], "Zoom Scalar: 1.00 (Reset: press =)");
        assert_eq!(list.hud[5], "Showing map overlay: false (Toggle: press \\)");

        let (at, text) = list.cursor_label.unwrap();
        assert_eq!(at, DVec2::new(400.0, 300.0));
        assert_eq!(text, "(400, 300) world (415, 270)");

        assert!(fixture.compose(false, None).cursor_label.is_none());
    }
}
