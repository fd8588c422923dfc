#![warn(clippy::all)]

//! Flight Globe - an interactive world map with live flight markers.
//!
//! Country outlines are rebuilt from a compact vector file and drawn on a
//! Robinson projection that can be panned and zoomed. A background poller
//! overlays tracked flights from a JSON feed.

mod geo;
mod state;
mod sync;
mod tracking;
mod ui;

use anyhow::Context as _;
use eframe::egui;
use geo::{MapShape, RobinsonProjection, ShapeRevealScheduler, TestPoint};
use glam::DVec2;
use state::{AppState, GlobeSettings};
use std::path::Path;
use std::sync::Arc;
use sync::{CancelToken, Snapshot};
use tracking::{FeedPoller, FeedStatus, HttpFeedSource, TrackerSnapshot};

// Embedded fallbacks used when no path is configured
static WORLD_MAP: &str = include_str!("../assets/world.txt");
static TEST_POINTS: &str = include_str!("../assets/test_points.json");

/// Graticule spacing in degrees (latitude, longitude).
const GRATICULE_STEP: (f64, f64) = (10.0, 20.0);

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let settings = GlobeSettings::load();
    let resources = MapResources::load(&settings)?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([400.0, 300.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Flight Globe",
        native_options,
        Box::new(|cc| Ok(Box::new(GlobeApp::new(cc, settings, resources)?))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}

/// Everything loaded once at startup.
struct MapResources {
    projection: RobinsonProjection,
    shapes: Vec<Arc<MapShape>>,
    graticule: Vec<DVec2>,
    test_points: Vec<TestPoint>,
}

impl MapResources {
    fn load(settings: &GlobeSettings) -> anyhow::Result<Self> {
        let projection = RobinsonProjection::new(
            settings.map_width,
            settings.map_height,
            DVec2::new(settings.offset_x, settings.offset_y),
        )
        .with_screen_bias(settings.screen_bias_y);

        let map_text = read_or_embedded(settings.map_path.as_deref(), WORLD_MAP)?;
        let shapes: Vec<Arc<MapShape>> = geo::parse_map_file(&map_text)
            .context("failed to parse world map")?
            .into_iter()
            .map(Arc::new)
            .collect();

        if !settings.progressive_reveal {
            for shape in &shapes {
                shape.reveal_all();
            }
        }
        log::info!(
            "Loaded {} map shapes ({} vertices, earth radius {:.1})",
            shapes.len(),
            shapes.iter().map(|s| s.vertex_count()).sum::<usize>(),
            projection.earth_radius()
        );

        let test_points = read_or_embedded(settings.test_points_path.as_deref(), TEST_POINTS)
            .and_then(|json| Ok(geo::load_test_points(&json, &projection)?))
            .unwrap_or_else(|e| {
                log::warn!("Failed to load test points: {:#}", e);
                Vec::new()
            });

        let graticule = projection.graticule(GRATICULE_STEP.0, GRATICULE_STEP.1);

        Ok(Self {
            projection,
            shapes,
            graticule,
            test_points,
        })
    }
}

fn read_or_embedded(path: Option<&Path>, embedded: &str) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => Ok(embedded.to_string()),
    }
}

/// Main application state and UI coordinator.
pub struct GlobeApp {
    /// UI-owned state (camera, toggles, cursor)
    state: AppState,

    /// Map outlines; polygons are published by the reveal scheduler
    shapes: Vec<Arc<MapShape>>,

    /// Projected reference grid
    graticule: Vec<DVec2>,

    /// Static labelled points
    test_points: Vec<TestPoint>,

    /// Latest tracked flights, published by the feed poller
    tracker: Arc<Snapshot<TrackerSnapshot>>,

    /// Outcome of the most recent poll
    feed_status: Arc<Snapshot<FeedStatus>>,

    /// Stops both background threads
    cancel: CancelToken,
}

impl GlobeApp {
    /// Creates the app and starts its background threads.
    fn new(
        cc: &eframe::CreationContext<'_>,
        settings: GlobeSettings,
        resources: MapResources,
    ) -> anyhow::Result<Self> {
        let cancel = CancelToken::new();
        let tracker = Arc::new(Snapshot::<TrackerSnapshot>::default());
        let feed_status = Arc::new(Snapshot::<FeedStatus>::default());

        ShapeRevealScheduler::new(resources.shapes.clone())
            .spawn(cc.egui_ctx.clone(), cancel.clone(), settings.reveal_idle())
            .context("failed to start shape reveal thread")?;

        match &settings.feed_url {
            Some(url) => match HttpFeedSource::new(url.as_str()) {
                Ok(source) => {
                    log::info!("Polling flight feed every {:?}", settings.poll_interval());
                    FeedPoller::new(
                        Box::new(source),
                        resources.projection.clone(),
                        tracker.clone(),
                        feed_status.clone(),
                        settings.poll_interval(),
                    )
                    .spawn(cc.egui_ctx.clone(), cancel.clone())
                    .context("failed to start feed thread")?;
                }
                Err(e) => {
                    log::error!("Flight feed disabled: {}", e);
                    feed_status.publish(FeedStatus::Error(e.to_string()));
                }
            },
            None => log::info!(
                "No flight feed configured (set ${} to enable)",
                state::FEED_URL_ENV
            ),
        }

        Ok(Self {
            state: AppState::new(&settings),
            shapes: resources.shapes,
            graticule: resources.graticule,
            test_points: resources.test_points,
            tracker,
            feed_status,
            cancel,
        })
    }
}

impl eframe::App for GlobeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let tracker = self.tracker.load();
        let feed_status = self.feed_status.load();

        ui::render_top_bar(ctx, &self.state, &self.shapes, &feed_status, &tracker);
        ui::render_canvas(
            ctx,
            &mut self.state,
            &ui::CanvasLayers {
                shapes: &self.shapes,
                graticule: &self.graticule,
                test_points: &self.test_points,
                tracker: &tracker,
            },
        );
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("Shutting down background threads");
        self.cancel.cancel();
    }
}
