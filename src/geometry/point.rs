use super::{
    Channels, Geometry, GeometryKind, GeometryOptions, Prepared, RenderContext, StyleOptions,
    cartesian_x_scale, cartesian_y_scale, geometry_builders,
};
use crate::core::{BucketStrategy, Datum, LinearScale, PlotScale, PreparedPoint, Scale};
use crate::error::ChartResult;
use crate::interaction::{HitShape, HitTarget};
use crate::layout::{LabelPalette, fit_labels, label_colour};
use crate::render::{CanvasLayerKind, CirclePrimitive, LinePrimitive, TextHAlign, TextPrimitive};

const MIN_HIT_RADIUS_PX: f64 = 4.0;
const SPAN_WIDTH_PX: f64 = 2.0;
const MIN_AUTO_OPACITY: f64 = 0.5;
const MAX_AUTO_OPACITY: f64 = 0.9;
/// Divisor turning plot diagonal per point into an opacity.
const DENSITY_FACTOR: f64 = 15.0;

/// Opacity tuned to point density: sparse plots stay near opaque, dense
/// ones fade so overlaps stay readable.
#[must_use]
pub fn density_opacity(diagonal: f64, count: usize) -> f64 {
    if count == 0 {
        return MAX_AUTO_OPACITY;
    }
    (diagonal / count as f64 / DENSITY_FACTOR).clamp(MIN_AUTO_OPACITY, MAX_AUTO_OPACITY)
}

/// Scatter of circles, optionally sized by the `size` channel.
///
/// Rows carrying `x2` also draw a horizontal span from `x` to `x2`.
#[derive(Debug, Clone, Default)]
pub struct PointGeometry {
    options: GeometryOptions,
    channels: Channels,
}

geometry_builders!(PointGeometry);

impl PointGeometry {
    const KIND: GeometryKind = GeometryKind::Point;
    const CARTESIAN: bool = true;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_size_range(mut self, min: f64, max: f64) -> Self {
        self.options.size_range = (min, max);
        self
    }

    fn strategy(
        &self,
        _x_scale: Scale,
        _points: &[PreparedPoint],
    ) -> ChartResult<Option<BucketStrategy>> {
        Ok(None)
    }

    fn position_scale(
        &self,
        prepared: &Prepared,
        range: (f64, f64),
        padding: f64,
    ) -> ChartResult<PlotScale> {
        cartesian_x_scale(prepared, range, padding)
    }

    fn value_scale(&self, prepared: &[&Prepared], range: (f64, f64)) -> ChartResult<LinearScale> {
        cartesian_y_scale(prepared, range, false)
    }

    /// Maps the size channel onto the radius range; unsized points use the
    /// lower bound, never smaller than the default marker.
    fn radius_scale(&self, prepared: &Prepared) -> ChartResult<Option<LinearScale>> {
        let sizes: Vec<f64> = prepared.points.iter().filter_map(|p| p.size).collect();
        if sizes.is_empty() {
            return Ok(None);
        }
        LinearScale::from_values(sizes, false, self.options.size_range).map(Some)
    }

    fn radius(&self, scale: Option<LinearScale>, size: Option<f64>) -> f64 {
        let (min, max) = self.options.size_range;
        match (scale, size) {
            (Some(scale), Some(size)) => scale.map(size).clamp(min, max),
            _ => min.max(3.0).min(max),
        }
    }

    fn draw(&self, ctx: &mut RenderContext<'_, '_>, prepared: &Prepared) -> ChartResult<()> {
        let x = ctx.position_scale()?.clone();
        let y = ctx.value_scale(self.options.use_y2_axis)?;
        let radius_scale = self.radius_scale(prepared)?;
        let shapes = ctx.shape_group();
        let labels = ctx.label_group();
        let font_size = ctx.style.font_size;
        let diagonal = ctx.width().hypot(ctx.height());
        let opacity = ctx
            .style
            .opacity
            .unwrap_or_else(|| density_opacity(diagonal, prepared.points.len()));
        let palette = LabelPalette::default();

        for point in &prepared.points {
            let (Some(cx), Some(value)) = (x.center(&point.x), point.y) else {
                continue;
            };
            let cy = y.map(value);
            let radius = self.radius(radius_scale, point.size);
            let color = ctx.colours.colour(&point.colour);
            let series = point.colour.label();
            let position = point.index.to_string();
            let key = ctx.element_key("point", &[&series, &position]);
            if let Some(end) = point.x2.as_ref().and_then(|x2| x.center(x2)) {
                let span_key = ctx.element_key("span", &[&series, &position]);
                let span_color = color.with_alpha(color.alpha * opacity);
                ctx.surface.push(
                    span_key,
                    shapes.as_str(),
                    CanvasLayerKind::Series,
                    LinePrimitive::new(cx, cy, end, cy, SPAN_WIDTH_PX, span_color),
                );
            }
            ctx.surface.push(
                key.clone(),
                shapes.as_str(),
                CanvasLayerKind::Series,
                CirclePrimitive {
                    cx,
                    cy,
                    radius,
                    fill: color,
                    opacity,
                },
            );
            let payload = ctx.payload(point, Datum::Number(value));
            ctx.surface.add_hit_target(HitTarget::Element {
                key,
                shape: HitShape::Circle {
                    cx,
                    cy,
                    radius: radius.max(MIN_HIT_RADIUS_PX),
                },
                payload,
            });

            if ctx.style.show_labels {
                let text = ctx.formatters.label.format(&Datum::Number(value));
                if text.is_empty() {
                    continue;
                }
                let label_key = ctx.element_key("label", &[&series, &position]);
                ctx.surface.push(
                    label_key,
                    labels.as_str(),
                    CanvasLayerKind::Labels,
                    TextPrimitive::new(
                        text.as_str(),
                        cx,
                        cy - radius - font_size / 2.0,
                        font_size,
                        label_colour(&text, color, false, palette),
                        TextHAlign::Center,
                    ),
                );
            }
        }

        if ctx.style.show_labels && !prepared.points.is_empty() {
            let available = match &x {
                PlotScale::Band(band) => band.step(),
                PlotScale::Linear(_) => ctx.width() / prepared.points.len() as f64,
            };
            let prefix = ctx.label_prefix();
            fit_labels(ctx.surface, &prefix, available, font_size);
        }
        Ok(())
    }
}
