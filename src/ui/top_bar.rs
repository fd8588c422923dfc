//! Top bar UI: app title, reveal progress, and feed status.

use crate::geo::MapShape;
use crate::state::AppState;
use crate::tracking::{FeedStatus, TrackerSnapshot};
use eframe::egui::{self, Color32, RichText};
use std::sync::Arc;

pub fn render_top_bar(
    ctx: &egui::Context,
    state: &AppState,
    shapes: &[Arc<MapShape>],
    feed_status: &FeedStatus,
    tracker: &TrackerSnapshot,
) {
    egui::TopBottomPanel::top("top_bar")
        .exact_height(36.0)
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                ui.label(
                    RichText::new("Flight Globe")
                        .strong()
                        .size(16.0)
                        .color(Color32::WHITE),
                );

                ui.separator();

                ui.label(
                    RichText::new(reveal_label(shapes))
                        .size(12.0)
                        .color(Color32::GRAY),
                );

                ui.separator();

                let feed_color = match feed_status {
                    FeedStatus::Error(_) => Color32::from_rgb(255, 120, 100),
                    _ => Color32::GRAY,
                };
                ui.label(
                    RichText::new(feed_status.label())
                        .size(12.0)
                        .color(feed_color),
                );
                if let Some(polled) = last_poll_label(tracker) {
                    ui.label(RichText::new(polled).size(12.0).color(Color32::GRAY));
                }

                ui.separator();

                ui.label(
                    RichText::new(&state.status_message)
                        .size(13.0)
                        .color(Color32::GRAY),
                );
            });
        });
}

fn reveal_label(shapes: &[Arc<MapShape>]) -> String {
    if !shapes.is_empty() && shapes.iter().all(|s| s.is_fully_revealed()) {
        return format!("Outlines: {} shapes complete", shapes.len());
    }
    let (revealed, total) = reveal_progress(shapes);
    format!("Outlines: {}/{} points", revealed, total)
}

/// Wall-clock time of the poll that produced the current markers.
fn last_poll_label(tracker: &TrackerSnapshot) -> Option<String> {
    tracker
        .objects
        .first()
        .map(|o| format!("at {} UTC", o.updated_at.format("%H:%M:%S")))
}

/// Total revealed and revealable points across all shapes.
fn reveal_progress(shapes: &[Arc<MapShape>]) -> (usize, usize) {
    shapes.iter().fold((0, 0), |(revealed, total), shape| {
        (
            revealed + shape.revealed_count(),
            total + shape.max_reveal(),
        )
    })
}
