use cairo::{Context, Format, ImageSurface, LinearGradient};
use pango::FontDescription;
use std::f64::consts::{FRAC_PI_2, TAU};

use crate::error::{ChartError, ChartResult};
use crate::render::{
    ArcPrimitive, Color, Fill, Primitive, RectPrimitive, RenderFrame, Renderer, TextHAlign,
    TextMeasurer, TextPrimitive, TextSize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CairoRenderStats {
    pub shapes_drawn: usize,
    pub texts_drawn: usize,
}

/// Renderers that can paint into an external Cairo context (for example a
/// GTK `DrawingArea` callback).
pub trait CairoContextRenderer {
    fn render_on_cairo_context(
        &mut self,
        context: &Context,
        frame: &RenderFrame,
    ) -> ChartResult<()>;
}

/// Cairo + Pango renderer painting frames onto an image surface.
#[derive(Debug)]
pub struct CairoRenderer {
    surface: ImageSurface,
    clear_color: Color,
    font_family: String,
    last_stats: CairoRenderStats,
}

impl CairoRenderer {
    pub fn new(width: i32, height: i32) -> ChartResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(ChartError::InvalidViewport {
                width: width.max(0) as u32,
                height: height.max(0) as u32,
            });
        }

        let surface = ImageSurface::create(Format::ARgb32, width, height)
            .map_err(|err| map_backend_error("failed to create cairo surface", err))?;
        Ok(Self {
            surface,
            clear_color: Color::WHITE,
            font_family: "Sans".to_owned(),
            last_stats: CairoRenderStats::default(),
        })
    }

    #[must_use]
    pub fn with_font_family(mut self, font_family: impl Into<String>) -> Self {
        self.font_family = font_family.into();
        self
    }

    #[must_use]
    pub fn surface(&self) -> &ImageSurface {
        &self.surface
    }

    pub fn set_clear_color(&mut self, color: Color) -> ChartResult<()> {
        color.validate()?;
        self.clear_color = color;
        Ok(())
    }

    #[must_use]
    pub fn last_stats(&self) -> CairoRenderStats {
        self.last_stats
    }

    fn render_with_context(&mut self, context: &Context, frame: &RenderFrame) -> ChartResult<()> {
        frame.validate()?;

        apply_color(context, self.clear_color);
        context
            .paint()
            .map_err(|err| map_backend_error("failed to clear surface", err))?;

        let mut stats = CairoRenderStats::default();
        for item in frame.painting_order() {
            match &item.primitive {
                Primitive::Line(line) => {
                    apply_color(context, line.color);
                    context.set_line_width(line.stroke_width);
                    context.move_to(line.x1, line.y1);
                    context.line_to(line.x2, line.y2);
                    stroke(context)?;
                }
                Primitive::Rect(rect) => draw_rect(context, frame, rect)?,
                Primitive::Polyline(line) => {
                    let mut points = line.points.iter();
                    if let Some(&(x, y)) = points.next() {
                        context.move_to(x, y);
                        for &(x, y) in points {
                            context.line_to(x, y);
                        }
                        apply_color(context, line.color);
                        context.set_line_width(line.stroke_width);
                        stroke(context)?;
                    }
                }
                Primitive::Circle(circle) => {
                    context.new_sub_path();
                    context.arc(circle.cx, circle.cy, circle.radius, 0.0, TAU);
                    apply_color(context, faded(circle.fill, circle.opacity));
                    fill(context)?;
                }
                Primitive::Arc(arc) => draw_arc(context, *arc)?,
                Primitive::Text(text) => {
                    draw_text(context, &self.font_family, text)?;
                    stats.texts_drawn += 1;
                    continue;
                }
            }
            stats.shapes_drawn += 1;
        }

        self.last_stats = stats;
        Ok(())
    }
}

impl Renderer for CairoRenderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()> {
        let context = Context::new(&self.surface)
            .map_err(|err| map_backend_error("failed to create cairo context", err))?;
        self.render_with_context(&context, frame)
    }
}

impl CairoContextRenderer for CairoRenderer {
    fn render_on_cairo_context(
        &mut self,
        context: &Context,
        frame: &RenderFrame,
    ) -> ChartResult<()> {
        self.render_with_context(context, frame)
    }
}

/// Text measurer backed by Pango layouts.
#[derive(Debug)]
pub struct PangoTextMeasurer {
    context: pango::Context,
}

impl PangoTextMeasurer {
    #[must_use]
    pub fn new() -> Self {
        let font_map = pangocairo::FontMap::default();
        Self {
            context: pango::prelude::FontMapExt::create_context(&font_map),
        }
    }
}

impl Default for PangoTextMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasurer for PangoTextMeasurer {
    fn measure(&self, text: &str, font_family: &str, font_size_px: f64) -> TextSize {
        let layout = pango::Layout::new(&self.context);
        let font = FontDescription::from_string(&format!("{font_family} {font_size_px}px"));
        layout.set_font_description(Some(&font));
        layout.set_text(text);
        let (width, height) = layout.pixel_size();
        TextSize::new(f64::from(width), f64::from(height))
    }
}

fn draw_rect(context: &Context, frame: &RenderFrame, rect: &RectPrimitive) -> ChartResult<()> {
    context.rectangle(rect.x, rect.y, rect.width, rect.height);
    match &rect.fill {
        Fill::Gradient { id, fallback } => match frame.gradient(id) {
            Some(def) => {
                let gradient =
                    LinearGradient::new(rect.x, rect.y, rect.x, rect.y + rect.height.max(1.0));
                for (offset, color) in &def.stops {
                    let color = faded(*color, rect.opacity);
                    gradient.add_color_stop_rgba(
                        *offset,
                        color.red,
                        color.green,
                        color.blue,
                        color.alpha,
                    );
                }
                context
                    .set_source(&gradient)
                    .map_err(|err| map_backend_error("failed to set gradient source", err))?;
            }
            None => apply_color(context, faded(*fallback, rect.opacity)),
        },
        Fill::Solid(color) => apply_color(context, faded(*color, rect.opacity)),
    }
    if rect.border_width > 0.0 {
        context
            .fill_preserve()
            .map_err(|err| map_backend_error("failed to fill rectangle", err))?;
        apply_color(context, rect.border_color);
        context.set_line_width(rect.border_width);
        stroke(context)
    } else {
        fill(context)
    }
}

fn draw_arc(context: &Context, arc: ArcPrimitive) -> ChartResult<()> {
    let start = arc.start_angle - FRAC_PI_2;
    let end = arc.end_angle - FRAC_PI_2;
    context.new_sub_path();
    context.arc(arc.cx, arc.cy, arc.outer_radius, start, end);
    if arc.inner_radius > 0.0 {
        context.arc_negative(arc.cx, arc.cy, arc.inner_radius, end, start);
    } else {
        context.line_to(arc.cx, arc.cy);
    }
    context.close_path();
    apply_color(context, arc.fill);
    fill(context)
}

fn draw_text(context: &Context, font_family: &str, text: &TextPrimitive) -> ChartResult<()> {
    let layout = pangocairo::functions::create_layout(context);
    let font = FontDescription::from_string(&format!("{font_family} {}px", text.font_size_px));
    layout.set_font_description(Some(&font));
    layout.set_text(&text.text);

    let (width, height) = layout.pixel_size();
    let dx = match text.h_align {
        TextHAlign::Left => 0.0,
        TextHAlign::Center => -f64::from(width) / 2.0,
        TextHAlign::Right => -f64::from(width),
    };

    context
        .save()
        .map_err(|err| map_backend_error("failed to save context", err))?;
    context.translate(text.x, text.y);
    context.rotate(text.rotation_deg.to_radians());
    apply_color(context, text.color);
    context.move_to(dx, -f64::from(height) / 2.0);
    pangocairo::functions::show_layout(context, &layout);
    context
        .restore()
        .map_err(|err| map_backend_error("failed to restore context", err))
}

fn faded(color: Color, opacity: f64) -> Color {
    color.with_alpha(color.alpha * opacity)
}

fn apply_color(context: &Context, color: Color) {
    context.set_source_rgba(color.red, color.green, color.blue, color.alpha);
}

fn fill(context: &Context) -> ChartResult<()> {
    context
        .fill()
        .map_err(|err| map_backend_error("failed to fill path", err))
}

fn stroke(context: &Context) -> ChartResult<()> {
    context
        .stroke()
        .map_err(|err| map_backend_error("failed to stroke path", err))
}

fn map_backend_error(prefix: &str, err: cairo::Error) -> ChartError {
    ChartError::InvalidData(format!("{prefix}: {err}"))
}
