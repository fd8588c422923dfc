//! Map geometry: projection, shape outlines and the per-frame overlay.
//!
//! Everything here is UI-independent except [`render_draw_list`], which
//! paints a composed [`DrawList`] with egui.

mod overlay;
mod projection;
mod renderer;
mod reveal;
mod shape;
mod test_points;

pub use overlay::{compose, OverlayInput};
pub use projection::{RobinsonProjection, DEFAULT_SCREEN_BIAS_Y};
pub use renderer::render_draw_list;
pub use reveal::ShapeRevealScheduler;
pub use shape::{parse_map_file, MapShape};
pub use test_points::{load_test_points, TestPoint};
