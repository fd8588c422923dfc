//! Progressive shape reveal.
//!
//! Shapes can be revealed vertex by vertex (useful to inspect how an outline
//! is built) while the canvas keeps drawing whatever has been generated so
//! far. The scheduler is the only writer of each shape's polygon; every time
//! a shape grows it publishes a fresh polygon instead of touching the one a
//! reader may hold.

use super::shape::{scale_floor, Encoding, MapShape, Polygon};
use crate::sync::CancelToken;
use eframe::egui;
use glam::IVec2;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Scheduler-side progress for one shape.
#[derive(Debug, Clone)]
struct RevealCursor {
    /// Last emitted fixed-point position (the scaled origin before the first vertex).
    cursor: IVec2,
    /// Points emitted so far, in encoded order.
    points: Vec<IVec2>,
}

impl RevealCursor {
    fn new(shape: &MapShape) -> Self {
        Self {
            cursor: scale_floor(shape.origin()),
            points: Vec::new(),
        }
    }

    /// Extends the point list up to `target` points. Returns true if anything was added.
    fn advance(&mut self, shape: &MapShape, target: usize) -> bool {
        let target = target.min(shape.max_reveal());
        let before = self.points.len();

        while self.points.len() < target {
            let idx = self.points.len();
            let point = match shape.vertices().get(idx) {
                Some(vertex) => {
                    self.cursor = shape.encoding().step(self.cursor, shape.origin(), *vertex);
                    self.cursor
                }
                // Only relative shapes reach past the last vertex: close the ring.
                None => {
                    debug_assert_eq!(shape.encoding(), Encoding::Relative);
                    scale_floor(shape.origin())
                }
            };
            self.points.push(point);
        }

        self.points.len() > before
    }
}

/// Advances every shape's revealed polygon toward its requested target.
pub struct ShapeRevealScheduler {
    shapes: Vec<Arc<MapShape>>,
    cursors: Vec<RevealCursor>,
}

impl ShapeRevealScheduler {
    pub fn new(shapes: Vec<Arc<MapShape>>) -> Self {
        let cursors = shapes.iter().map(|s| RevealCursor::new(s)).collect();
        Self { shapes, cursors }
    }

    /// Runs one pass over all shapes. Returns the number of polygons published.
    pub fn step(&mut self) -> usize {
        let mut published = 0;

        for (shape, progress) in self.shapes.iter().zip(self.cursors.iter_mut()) {
            let target = shape.target_count();
            if progress.points.len() >= target {
                continue;
            }

            if progress.advance(shape, target) {
                if progress.points.len() == shape.max_reveal() {
                    debug_assert_eq!(
                        progress.points.as_slice(),
                        shape.full_polygon().points(),
                        "incremental reveal diverged from the full outline"
                    );
                }
                shape.publish(Polygon::new(progress.points.clone()));
                published += 1;
            }
        }

        published
    }

    /// Runs until `cancel` is set, sleeping `idle` whenever a pass publishes nothing.
    pub fn run(mut self, cancel: CancelToken, idle: Duration, mut on_publish: impl FnMut(usize)) {
        log::info!(
            "Shape reveal scheduler started for {} shapes",
            self.shapes.len()
        );

        while !cancel.is_cancelled() {
            let published = self.step();
            if published > 0 {
                on_publish(published);
            } else {
                thread::sleep(idle);
            }
        }

        log::info!("Shape reveal scheduler stopped");
    }

    /// Starts the scheduler on its own thread, repainting `ctx` after each publish.
    pub fn spawn(
        self,
        ctx: egui::Context,
        cancel: CancelToken,
        idle: Duration,
    ) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("shape-reveal".into())
            .spawn(move || {
                self.run(cancel, idle, |published| {
                    log::trace!("Published {} shape polygon(s)", published);
                    ctx.request_repaint();
                })
            })
    }
}
