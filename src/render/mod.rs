//! Software rasterization of strokes onto layered surfaces.

mod stroke;
mod surface;

pub use stroke::{effective_width, render_stroke, spray_bursts, tool_paint, Glow, ToolPaint};
pub use surface::Surface;
