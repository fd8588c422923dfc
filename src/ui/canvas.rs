//! Central canvas UI: the map, its overlays and pan/zoom input.

use crate::geo::{compose, render_draw_list, MapShape, OverlayInput, TestPoint};
use crate::state::AppState;
use crate::tracking::TrackerSnapshot;
use eframe::egui::{self, Color32, Key, PointerButton, Rect, Sense};
use glam::DVec2;
use std::sync::Arc;
use std::time::Duration;
use web_time::Instant;

/// How often the canvas refreshes on its own so the staleness read-out ticks.
const HUD_REFRESH: Duration = Duration::from_millis(250);

/// Data drawn on the canvas besides the state it owns.
pub struct CanvasLayers<'a> {
    pub shapes: &'a [Arc<MapShape>],
    pub graticule: &'a [DVec2],
    pub test_points: &'a [TestPoint],
    pub tracker: &'a TrackerSnapshot,
}

/// Keyboard commands understood by the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CanvasCommand {
    /// Request one more vertex on every shape
    RevealNext,
    ResetZoom,
    ToggleMapInfo,
}

pub fn render_canvas(ctx: &egui::Context, state: &mut AppState, layers: &CanvasLayers<'_>) {
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE.fill(Color32::BLACK))
        .show(ctx, |ui| {
            let available_size = ui.available_size();
            let (response, painter) = ui.allocate_painter(available_size, Sense::click_and_drag());
            let rect = response.rect;

            handle_canvas_interaction(&response, rect, state, layers.shapes);

            let viewport = DVec2::new(rect.width() as f64, rect.height() as f64);
            let cursor = state.cursor.filter(|_| state.show_cursor_coords);
            let list = compose(&OverlayInput {
                camera: &state.camera,
                viewport,
                shapes: layers.shapes,
                graticule: layers.graticule,
                test_points: layers.test_points,
                tracker: layers.tracker,
                now: Instant::now(),
                show_map_info: state.show_map_info,
                cursor,
            });
            render_draw_list(&painter, rect, &list);
        });

    ctx.request_repaint_after(HUD_REFRESH);
}

fn handle_canvas_interaction(
    response: &egui::Response,
    rect: Rect,
    state: &mut AppState,
    shapes: &[Arc<MapShape>],
) {
    let ctx = &response.ctx;

    // Panning: deltas are measured from where the button went down.
    if response.drag_started_by(PointerButton::Primary) {
        state.camera.begin_drag();
    }
    if response.dragged_by(PointerButton::Primary) {
        let origin = ctx.input(|i| i.pointer.press_origin());
        if let (Some(origin), Some(pos)) = (origin, response.interact_pointer_pos()) {
            let total = pos - origin;
            state.camera.drag(total.x as f64, total.y as f64);
        }
    }
    if response.drag_stopped_by(PointerButton::Primary) {
        state.camera.end_drag();
    }
    if state.camera.is_dragging() {
        ctx.set_cursor_icon(egui::CursorIcon::Grabbing);
    }

    if response.hovered() {
        let scroll = ctx.input(|i| i.raw_scroll_delta.y);
        let notches = scroll_notches(scroll);
        if notches != 0 {
            state.camera.zoom_by(notches);
        }
    }

    if response.double_clicked() {
        state.camera.reset();
    }

    state.cursor = response
        .hover_pos()
        .map(|p| DVec2::new((p.x - rect.min.x) as f64, (p.y - rect.min.y) as f64));

    let (commands, ctrl) = ctx.input(|i| {
        let mut commands = Vec::new();
        if i.key_pressed(Key::Enter) {
            commands.push(CanvasCommand::RevealNext);
        }
        if i.key_pressed(Key::Equals) {
            commands.push(CanvasCommand::ResetZoom);
        }
        if i.key_pressed(Key::Backslash) {
            commands.push(CanvasCommand::ToggleMapInfo);
        }
        (commands, i.modifiers.ctrl)
    });

    state.show_cursor_coords = ctrl;
    for command in commands {
        apply_command(state, shapes, command);
    }
}

/// One zoom notch per scroll event, in the direction of the scroll.
fn scroll_notches(delta_y: f32) -> i32 {
    if delta_y > 0.0 {
        1
    } else if delta_y < 0.0 {
        -1
    } else {
        0
    }
}

fn apply_command(state: &mut AppState, shapes: &[Arc<MapShape>], command: CanvasCommand) {
    match command {
        CanvasCommand::RevealNext => {
            for shape in shapes {
                shape.request_new_vertex();
            }
            log::debug!("Requested a new vertex on {} shapes", shapes.len());
        }
        CanvasCommand::ResetZoom => state.camera.reset_zoom(),
        CanvasCommand::ToggleMapInfo => state.show_map_info = !state.show_map_info,
    }
}
