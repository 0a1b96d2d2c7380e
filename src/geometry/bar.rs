use indexmap::IndexMap;
use serde_json::json;

use super::{
    Channels, Geometry, GeometryKind, GeometryOptions, Prepared, RenderContext, StyleOptions,
    cartesian_x_scale, cartesian_y_scale, geometry_builders, gradient_id,
};
use crate::core::{
    BucketRow, BucketStrategy, Datum, DatumKey, LinearScale, PlotRect, PlotScale, PreparedPoint,
    Scale,
};
use crate::error::ChartResult;
use crate::interaction::{HitPayload, HitShape, HitTarget};
use crate::layout::{LabelPalette, fit_labels, label_colour};
use crate::render::{
    CanvasLayerKind, Color, Fill, GradientDef, RectPrimitive, TextHAlign, TextPrimitive,
};

const LABEL_OFFSET_PX: f64 = 4.0;
/// Share of the slot a bar takes when the x axis is linear.
const LINEAR_BAR_FILL: f64 = 0.8;

/// Vertical bars over bucketed x values.
///
/// Colour series sit side by side within a bucket, or on top of each
/// other when stacked. Rows carrying `y2` are drawn as floating ranges.
#[derive(Debug, Clone, Default)]
pub struct BarGeometry {
    options: GeometryOptions,
    channels: Channels,
}

geometry_builders!(BarGeometry);

impl BarGeometry {
    const KIND: GeometryKind = GeometryKind::Bar;
    const CARTESIAN: bool = true;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_stacked(mut self, stacked: bool) -> Self {
        self.options.stacked = stacked;
        self
    }

    #[must_use]
    pub fn with_gradient(mut self, gradient: bool) -> Self {
        self.options.gradient = gradient;
        self
    }

    fn strategy(
        &self,
        x_scale: Scale,
        points: &[PreparedPoint],
    ) -> ChartResult<Option<BucketStrategy>> {
        if points.is_empty() {
            return Ok(None);
        }
        let xs: Vec<Datum> = points.iter().map(|p| p.x.clone()).collect();
        x_scale.buckets(&xs).map(Some)
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
        if !self.options.stacked {
            return cartesian_y_scale(prepared, range, true);
        }
        let mut totals: IndexMap<(usize, &DatumKey), f64> = IndexMap::new();
        let mut extents = Vec::new();
        for (facet, p) in prepared.iter().enumerate() {
            for row in &p.buckets {
                if row.ranged {
                    extents.extend([row.start, row.value]);
                } else {
                    *totals.entry((facet, &row.bucket)).or_default() += row.value;
                }
            }
        }
        extents.extend(totals.into_values());
        let ticks = super::tick_count(range);
        Ok(LinearScale::from_values(extents, true, range)?.nice(ticks))
    }

    /// Left edge, width, and value interval of one consolidated row.
    fn bar_extent(
        &self,
        row: &BucketRow,
        x: &PlotScale,
        plot_width: f64,
        slots: &[DatumKey],
        buckets: usize,
        stack: &mut IndexMap<DatumKey, f64>,
    ) -> Option<(f64, f64, f64, f64)> {
        let (band_x, bandwidth) = match x {
            PlotScale::Band(_) => (x.position(&row.bucket.to_datum())?, x.bandwidth()),
            PlotScale::Linear(_) => {
                let width = plot_width / buckets.max(1) as f64 * LINEAR_BAR_FILL;
                (x.center(&row.bucket.to_datum())? - width / 2.0, width)
            }
        };
        if self.options.stacked && !row.ranged {
            let base = stack.entry(row.bucket.clone()).or_insert(0.0);
            let start = *base;
            *base += row.value;
            return Some((band_x, bandwidth, start, *base));
        }
        let slot = slots.iter().position(|k| k == &row.colour).unwrap_or(0);
        let width = bandwidth / slots.len().max(1) as f64;
        Some((band_x + slot as f64 * width, width, row.start, row.value))
    }

    fn fill(&self, ctx: &mut RenderContext<'_, '_>, colour: &DatumKey, base: Color) -> Fill {
        if !self.options.gradient {
            return Fill::Solid(base);
        }
        let id = gradient_id(ctx.key, colour);
        ctx.surface.add_gradient(GradientDef {
            id: id.clone(),
            stops: vec![(0.0, base), (1.0, base.lerp(Color::WHITE, 0.45))],
        });
        Fill::Gradient { id, fallback: base }
    }

    fn payload(ctx: &RenderContext<'_, '_>, row: &BucketRow, prepared: &Prepared) -> HitPayload {
        let member = prepared
            .groups
            .get(&row.bucket)
            .and_then(|points| points.iter().find(|p| p.colour == row.colour));
        let data_point = match member {
            Some(point) if row.count == 1 => point.row.clone(),
            _ => json!({
                "bucket": row.bucket.label(),
                "colour": row.colour.label(),
                "value": row.value,
                "count": row.count,
            }),
        };
        HitPayload {
            data_point,
            series: row.colour.label(),
            series_index: ctx.colours.index_of(&row.colour).unwrap_or(0),
            value: Datum::Number(row.value),
            geometry: ctx.key.to_owned(),
        }
    }

    fn draw(&self, ctx: &mut RenderContext<'_, '_>, prepared: &Prepared) -> ChartResult<()> {
        let x = ctx.position_scale()?.clone();
        let y = ctx.value_scale(self.options.use_y2_axis)?;
        let slots = prepared.colour_domain();
        let shapes = ctx.shape_group();
        let labels = ctx.label_group();
        let font_size = ctx.style.font_size;
        let opacity = ctx.style.opacity.unwrap_or(1.0);
        let palette = LabelPalette::default();
        let plot_width = ctx.width();
        let (d0, d1) = y.domain();
        let zero = y.map(0.0_f64.clamp(d0.min(d1), d0.max(d1)));

        let mut stack = IndexMap::new();
        let mut narrowest = f64::INFINITY;
        for row in &prepared.buckets {
            let Some((bar_x, bar_width, start, end)) = self.bar_extent(
                row,
                &x,
                plot_width,
                &slots,
                prepared.groups.len(),
                &mut stack,
            ) else {
                continue;
            };
            let (y_start, y_end) = (y.map(start), y.map(end));
            let top = y_start.min(y_end);
            let height = (y_start - y_end).abs();
            let base_y = if row.ranged || self.options.stacked { y_start } else { zero };

            let colour = ctx.colours.colour(&row.colour);
            let fill = self.fill(ctx, &row.colour, colour);
            let bucket = row.bucket.label();
            let series = row.colour.label();
            let key = ctx.element_key("bar", &[&bucket, &series]);
            let rect = RectPrimitive::new(bar_x, top, bar_width, height, fill.clone())
                .with_opacity(opacity);
            let enter = RectPrimitive::new(bar_x, base_y, bar_width, 0.0, fill).with_opacity(opacity);
            ctx.surface.push_entering(
                key.clone(),
                shapes.as_str(),
                CanvasLayerKind::Series,
                rect,
                enter,
            );
            let payload = Self::payload(ctx, row, prepared);
            ctx.surface.add_hit_target(HitTarget::Element {
                key,
                shape: HitShape::Rect(PlotRect::new(bar_x, top, bar_width, height)),
                payload,
            });

            if !ctx.style.show_labels {
                continue;
            }
            narrowest = narrowest.min(bar_width);
            let text = ctx.formatters.label.format(&Datum::Number(row.value));
            if text.is_empty() {
                continue;
            }
            let inside = self.options.stacked || row.ranged;
            let label_y = if inside {
                top + height / 2.0
            } else if end >= start {
                top - LABEL_OFFSET_PX - font_size / 2.0
            } else {
                top + height + LABEL_OFFSET_PX + font_size / 2.0
            };
            let color = label_colour(&text, colour, inside, palette);
            let label_key = ctx.element_key("label", &[&bucket, &series]);
            ctx.surface.push(
                label_key,
                labels.as_str(),
                CanvasLayerKind::Labels,
                TextPrimitive::new(
                    text,
                    bar_x + bar_width / 2.0,
                    label_y,
                    font_size,
                    color,
                    TextHAlign::Center,
                ),
            );
        }

        if ctx.style.show_labels && narrowest.is_finite() {
            let prefix = ctx.label_prefix();
            fit_labels(ctx.surface, &prefix, narrowest, font_size);
        }
        Ok(())
    }
}
