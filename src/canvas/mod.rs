pub mod export;
pub mod surface;

pub use export::{download_filename, save_png};
pub use surface::{DrawingSurface, Point, ToolKind, ToolState, MAX_BRUSH_WIDTH, MIN_BRUSH_WIDTH};
