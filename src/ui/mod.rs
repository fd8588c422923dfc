//! UI modules for the Flight Globe application.
//!
//! The UI is split into two panels:
//! - Top bar: Title, reveal progress and feed status
//! - Central canvas: The map with its overlays

mod canvas;
mod top_bar;

pub use canvas::{render_canvas, CanvasLayers};
pub use top_bar::render_top_bar;
