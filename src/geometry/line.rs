use super::{
    Channels, Geometry, GeometryKind, GeometryOptions, Prepared, RenderContext, StyleOptions,
    cartesian_x_scale, cartesian_y_scale, geometry_builders,
};
use crate::core::{BucketStrategy, Datum, LinearScale, PlotRect, PlotScale, PreparedPoint, Scale};
use crate::error::ChartResult;
use crate::interaction::{HitShape, HitTarget, TrackPoint};
use crate::layout::{LabelPalette, fit_labels, label_colour};
use crate::render::{
    CanvasLayerKind, CirclePrimitive, PolylinePrimitive, TextHAlign, TextPrimitive,
};

const MARKER_RADIUS_PX: f64 = 3.0;
const HIT_RADIUS_PX: f64 = 8.0;
const LABEL_OFFSET_PX: f64 = 4.0;

/// One connected line per colour series, with a marker on every point.
#[derive(Debug, Clone, Default)]
pub struct LineGeometry {
    options: GeometryOptions,
    channels: Channels,
}

geometry_builders!(LineGeometry);

impl LineGeometry {
    const KIND: GeometryKind = GeometryKind::Line;
    const CARTESIAN: bool = true;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
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

    fn draw(&self, ctx: &mut RenderContext<'_, '_>, prepared: &Prepared) -> ChartResult<()> {
        let x = ctx.position_scale()?.clone();
        let y = ctx.value_scale(self.options.use_y2_axis)?;
        // a continuous primary line resolves hover by nearest x
        let tracking = ctx.is_primary && matches!(x, PlotScale::Linear(_));
        let shapes = ctx.shape_group();
        let labels = ctx.label_group();
        let font_size = ctx.style.font_size;
        let stroke_width = ctx.style.stroke_width;
        let opacity = ctx.style.opacity.unwrap_or(1.0);
        let palette = LabelPalette::default();

        let mut track = Vec::new();
        let mut placed_count = 0usize;
        for (colour, points) in &prepared.groups {
            let mut placed: Vec<(f64, f64, &PreparedPoint)> = points
                .iter()
                .filter_map(|p| Some((x.center(&p.x)?, y.map(p.y?), p)))
                .collect();
            placed.sort_by(|a, b| a.0.total_cmp(&b.0));
            placed_count = placed_count.max(placed.len());

            let color = ctx.colours.colour(colour);
            let series = colour.label();
            if placed.len() >= 2 {
                let key = ctx.element_key("line", &[&series]);
                ctx.surface.push(
                    key,
                    shapes.as_str(),
                    CanvasLayerKind::Series,
                    PolylinePrimitive {
                        points: placed.iter().map(|(px, py, _)| (*px, *py)).collect(),
                        stroke_width,
                        color: color.with_alpha(color.alpha * opacity),
                    },
                );
            }

            for &(px, py, point) in &placed {
                let x_label = point.x.key().label();
                let row = point.index.to_string();
                let key = ctx.element_key("point", &[&series, &x_label, &row]);
                ctx.surface.push(
                    key.clone(),
                    shapes.as_str(),
                    CanvasLayerKind::Series,
                    CirclePrimitive {
                        cx: px,
                        cy: py,
                        radius: MARKER_RADIUS_PX,
                        fill: color,
                        opacity,
                    },
                );
                let value = point.y.map_or(Datum::Missing, Datum::Number);
                let payload = ctx.payload(point, value.clone());
                if tracking {
                    track.push(TrackPoint {
                        x: px,
                        y: py,
                        key,
                        payload,
                    });
                } else {
                    ctx.surface.add_hit_target(HitTarget::Element {
                        key,
                        shape: HitShape::Circle {
                            cx: px,
                            cy: py,
                            radius: HIT_RADIUS_PX,
                        },
                        payload,
                    });
                }

                if ctx.style.show_labels {
                    let text = ctx.formatters.label.format(&value);
                    if text.is_empty() {
                        continue;
                    }
                    let label_key = ctx.element_key("label", &[&series, &x_label, &row]);
                    ctx.surface.push(
                        label_key,
                        labels.as_str(),
                        CanvasLayerKind::Labels,
                        TextPrimitive::new(
                            text.as_str(),
                            px,
                            py - LABEL_OFFSET_PX - font_size / 2.0,
                            font_size,
                            label_colour(&text, color, false, palette),
                            TextHAlign::Center,
                        ),
                    );
                }
            }
        }

        if !track.is_empty() {
            ctx.surface.add_hit_target(HitTarget::Tracking {
                area: PlotRect::new(0.0, 0.0, ctx.width(), ctx.height()),
                points: track,
            });
        }
        if ctx.style.show_labels && placed_count > 0 {
            let available = match &x {
                PlotScale::Band(band) => band.step(),
                PlotScale::Linear(_) => ctx.width() / placed_count as f64,
            };
            let prefix = ctx.label_prefix();
            fit_labels(ctx.surface, &prefix, available, font_size);
        }
        Ok(())
    }
}
