//! Draw list rendering.
//!
//! Paints a composed [`DrawList`] onto the egui canvas.

use super::overlay::{DrawItem, DrawList, MarkerKind, OUTLINE_WIDTH};
use eframe::egui::{self, Align2, Color32, FontId, Painter, Pos2, Rect, Stroke, Vec2};
use glam::DVec2;

const OUTLINE_COLOR: Color32 = Color32::from_rgb(255, 175, 175);
const REFERENCE_COLOR: Color32 = Color32::from_rgb(0, 0, 255);
const OBJECT_COLOR: Color32 = Color32::from_rgb(255, 0, 0);
const HUD_COLOR: Color32 = Color32::WHITE;
const CURSOR_COLOR: Color32 = Color32::GREEN;

/// Object label size in world units.
const OBJECT_FONT_SIZE: f64 = 6.0;
/// Test point label size in world units.
const LABEL_FONT_SIZE: f64 = 10.0;
/// Labels smaller than this are not drawn (pixels).
const MIN_LABEL_SIZE: f32 = 4.0;

const HUD_FONT_SIZE: f32 = 14.0;
const HUD_LINE_HEIGHT: f32 = 15.0;

/// Paints `list` into `rect`. Item positions are relative to `rect.min`.
pub fn render_draw_list(painter: &Painter, rect: Rect, list: &DrawList) {
    let to_pos = |p: DVec2| rect.min + Vec2::new(p.x as f32, p.y as f32);
    let scale = list.scale as f32;

    for item in &list.items {
        match item {
            DrawItem::Outline { points } => {
                let stroke = Stroke::new((OUTLINE_WIDTH as f32 * scale).max(1.0), OUTLINE_COLOR);
                let screen: Vec<Pos2> = points.iter().map(|p| to_pos(*p)).collect();
                render_closed_line(painter, &screen, stroke);
            }
            DrawItem::Dot { center } => {
                let radius = (OUTLINE_WIDTH as f32 * scale / 2.0).max(1.0);
                painter.circle_filled(to_pos(*center), radius, OUTLINE_COLOR);
            }
            DrawItem::Marker {
                kind,
                center,
                half_size,
                label,
            } => render_marker(
                painter,
                *kind,
                to_pos(*center),
                *half_size as f32,
                label.as_deref(),
                scale,
            ),
        }
    }

    render_hud(painter, rect, list);
}

/// Draws the segments of a closed ring, skipping sub-pixel ones.
fn render_closed_line(painter: &Painter, points: &[Pos2], stroke: Stroke) {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return;
    };

    let closing = [last, first];
    for window in points.windows(2).chain(std::iter::once(&closing[..])) {
        if let [p1, p2] = window {
            if p1.distance_sq(*p2) > 0.25 {
                painter.line_segment([*p1, *p2], stroke);
            }
        }
    }
}

fn render_marker(
    painter: &Painter,
    kind: MarkerKind,
    center: Pos2,
    half_size: f32,
    label: Option<&str>,
    scale: f32,
) {
    let half = half_size.max(1.0);
    let marker = Rect::from_center_size(center, Vec2::splat(half * 2.0));

    match kind {
        MarkerKind::Reference => {
            painter.rect_filled(marker, 0.0, REFERENCE_COLOR);
        }
        MarkerKind::TestPoint => {
            painter.rect_stroke(
                marker,
                0.0,
                Stroke::new(1.0, REFERENCE_COLOR),
                egui::StrokeKind::Middle,
            );
            if let Some(text) = label {
                let size = LABEL_FONT_SIZE as f32 * scale;
                if size >= MIN_LABEL_SIZE {
                    painter.text(
                        center + Vec2::splat(half * 2.0),
                        Align2::LEFT_BOTTOM,
                        text,
                        FontId::proportional(size),
                        REFERENCE_COLOR,
                    );
                }
            }
        }
        MarkerKind::MovingObject => {
            painter.rect_filled(marker, 0.0, OBJECT_COLOR);
            if let Some(text) = label {
                let size = OBJECT_FONT_SIZE as f32 * scale;
                if size >= MIN_LABEL_SIZE {
                    painter.text(
                        center + Vec2::new(0.0, half * 4.0),
                        Align2::CENTER_BOTTOM,
                        text,
                        FontId::monospace(size),
                        OBJECT_COLOR,
                    );
                }
            }
        }
    }
}

fn render_hud(painter: &Painter, rect: Rect, list: &DrawList) {
    for (i, line) in list.hud.iter().enumerate() {
        painter.text(
            rect.min + Vec2::new(5.0, 5.0 + i as f32 * HUD_LINE_HEIGHT),
            Align2::LEFT_TOP,
            line,
            FontId::monospace(HUD_FONT_SIZE),
            HUD_COLOR,
        );
    }

    if let Some((at, text)) = &list.cursor_label {
        painter.text(
            rect.min + Vec2::new(at.x as f32, at.y as f32),
            Align2::LEFT_BOTTOM,
            text,
            FontId::monospace(HUD_FONT_SIZE),
            CURSOR_COLOR,
        );
    }
}
