mod frame;
mod layer;
mod null_renderer;
mod primitives;
mod surface;
mod text;

pub use frame::{DrawItem, GradientDef, RenderFrame};
pub use layer::CanvasLayerKind;
pub use null_renderer::NullRenderer;
pub use primitives::{
    ArcPrimitive, CirclePrimitive, Color, Fill, LinePrimitive, PolylinePrimitive, Primitive,
    RectPrimitive, TextHAlign, TextPrimitive,
};
pub use surface::{Surface, SurfaceItem, primitive_bounds, text_bounds};
pub use text::{HeuristicTextMeasurer, TextMeasurer, TextSize};

use crate::error::ChartResult;

/// Contract implemented by any rendering backend.
///
/// Backends receive a fully materialized, deterministic `RenderFrame` so
/// drawing code remains isolated from layout and interaction logic.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()>;
}

#[cfg(feature = "cairo-backend")]
mod cairo_backend;
#[cfg(feature = "cairo-backend")]
pub use cairo_backend::{CairoContextRenderer, CairoRenderStats, CairoRenderer, PangoTextMeasurer};
