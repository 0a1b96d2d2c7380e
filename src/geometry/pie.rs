use std::f64::consts::TAU;

use tracing::debug;

use super::{
    Channels, Geometry, GeometryKind, GeometryOptions, Prepared, RenderContext, StyleOptions,
    geometry_builders, unsupported,
};
use crate::core::format::format_percent;
use crate::core::{BucketStrategy, Datum, DatumKey, LinearScale, PlotScale, PreparedPoint, Scale};
use crate::error::ChartResult;
use crate::interaction::{HitPayload, HitShape, HitTarget};
use crate::layout::{LabelPalette, label_colour};
use crate::render::{
    ArcPrimitive, CanvasLayerKind, Color, LinePrimitive, TextHAlign, TextPrimitive,
};

/// Room kept around the pie for outside labels, in font sizes.
const OUTSIDE_LABEL_EMS: f64 = 3.0;
const LEADER_EMS: f64 = 0.8;
const LABEL_GAP_PX: f64 = 4.0;

/// One slice of the pie, angles in radians clockwise from 12 o'clock.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub colour: DatumKey,
    pub value: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

/// Sums the positive values of each colour series and spreads them over a
/// full turn in first-seen order.
#[must_use]
pub fn slices(prepared: &Prepared) -> (Vec<Slice>, f64) {
    let totals: Vec<(DatumKey, f64)> = prepared
        .groups
        .iter()
        .map(|(colour, points)| {
            let sum = points
                .iter()
                .filter_map(|p| p.y)
                .filter(|v| v.is_finite() && *v > 0.0)
                .sum();
            (colour.clone(), sum)
        })
        .collect();
    let total: f64 = totals.iter().map(|(_, v)| v).sum();
    if total <= 0.0 {
        return (Vec::new(), 0.0);
    }
    let mut angle = 0.0;
    let slices = totals
        .into_iter()
        .filter(|(_, value)| *value > 0.0)
        .map(|(colour, value)| {
            let start_angle = angle;
            angle += value / total * TAU;
            Slice {
                colour,
                value,
                start_angle,
                end_angle: angle,
            }
        })
        .collect();
    (slices, total)
}

/// Pie or donut of each colour series' share of the total.
///
/// The only non-cartesian geometry: it never supplies axis scales.
#[derive(Debug, Clone, Default)]
pub struct PieGeometry {
    options: GeometryOptions,
    channels: Channels,
}

geometry_builders!(PieGeometry);

impl PieGeometry {
    const KIND: GeometryKind = GeometryKind::Pie;
    const CARTESIAN: bool = false;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails fast unless `ratio` lies in `[0, 1)`.
    pub fn with_inner_radius_ratio(mut self, ratio: f64) -> ChartResult<Self> {
        let options = GeometryOptions {
            inner_radius_ratio: ratio,
            ..self.options.clone()
        };
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    #[must_use]
    pub fn with_label_percent(mut self, enabled: bool) -> Self {
        self.options.label_percent = enabled;
        self
    }

    #[must_use]
    pub fn with_outside_labels(mut self, enabled: bool) -> Self {
        self.options.outside_labels = enabled;
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
        _prepared: &Prepared,
        _range: (f64, f64),
        _padding: f64,
    ) -> ChartResult<PlotScale> {
        Err(unsupported(Self::KIND, "x_scale"))
    }

    fn value_scale(&self, _prepared: &[&Prepared], _range: (f64, f64)) -> ChartResult<LinearScale> {
        Err(unsupported(Self::KIND, "y_scale"))
    }

    fn label_text(&self, ctx: &RenderContext<'_, '_>, value: f64, total: f64) -> String {
        if self.options.label_percent {
            format_percent(value / total)
        } else {
            ctx.formatters.label.format(&Datum::Number(value))
        }
    }

    fn draw(&self, ctx: &mut RenderContext<'_, '_>, prepared: &Prepared) -> ChartResult<()> {
        let (slices, total) = slices(prepared);
        if slices.is_empty() {
            debug!(geometry = ctx.key, "pie has no positive values to draw");
            return Ok(());
        }
        let font_size = ctx.style.font_size;
        let shapes = ctx.shape_group();
        let labels = ctx.label_group();
        let palette = LabelPalette::default();
        let (cx, cy) = (ctx.width() / 2.0, ctx.height() / 2.0);
        let reserve = if self.options.outside_labels {
            font_size * OUTSIDE_LABEL_EMS
        } else {
            0.0
        };
        let outer = (ctx.width().min(ctx.height()) / 2.0 - reserve).max(0.0);
        let inner = outer * self.options.inner_radius_ratio;

        for slice in &slices {
            let colour = ctx.colours.colour(&slice.colour);
            let series = slice.colour.label();
            let arc = ArcPrimitive {
                cx,
                cy,
                inner_radius: inner,
                outer_radius: outer,
                start_angle: slice.start_angle,
                end_angle: slice.end_angle,
                fill: colour,
            };
            let key = ctx.element_key("slice", &[&series]);
            ctx.surface
                .push(key.clone(), shapes.as_str(), CanvasLayerKind::Series, arc);

            let data_point = prepared
                .groups
                .get(&slice.colour)
                .and_then(|points| points.first())
                .map(|p| p.row.clone())
                .unwrap_or_default();
            ctx.surface.add_hit_target(HitTarget::Element {
                key,
                shape: HitShape::Sector {
                    cx,
                    cy,
                    inner_radius: inner,
                    outer_radius: outer,
                    start_angle: slice.start_angle,
                    end_angle: slice.end_angle,
                },
                payload: HitPayload {
                    data_point,
                    series: series.clone(),
                    series_index: ctx.colours.index_of(&slice.colour).unwrap_or(0),
                    value: Datum::Number(slice.value),
                    geometry: ctx.key.to_owned(),
                },
            });

            if !ctx.style.show_labels {
                continue;
            }
            let text = self.label_text(ctx, slice.value, total);
            if text.is_empty() {
                continue;
            }
            if self.options.outside_labels {
                self.outside_label(ctx, &labels, &series, arc, text, font_size);
            } else {
                let radius = (inner + outer) / 2.0;
                // the label must fit along the slice's arc at mid radius
                let arc_length = (slice.end_angle - slice.start_angle) * radius;
                if ctx.surface.measure_text(&text, font_size).width > arc_length {
                    continue;
                }
                let (x, y) = arc.point_at(radius);
                let color = label_colour(&text, colour, true, palette);
                let label_key = ctx.element_key("label", &[&series]);
                ctx.surface.push(
                    label_key,
                    labels.as_str(),
                    CanvasLayerKind::Labels,
                    TextPrimitive::new(text, x, y, font_size, color, TextHAlign::Center),
                );
            }
        }
        Ok(())
    }

    fn outside_label(
        &self,
        ctx: &mut RenderContext<'_, '_>,
        group: &str,
        series: &str,
        arc: ArcPrimitive,
        text: String,
        font_size: f64,
    ) {
        let outer = arc.outer_radius;
        let elbow = outer + font_size * LEADER_EMS;
        let (x1, y1) = arc.point_at(outer);
        let (x2, y2) = arc.point_at(elbow);
        let right_side = x2 >= arc.cx;
        let (text_x, align) = if right_side {
            (x2 + LABEL_GAP_PX, TextHAlign::Left)
        } else {
            (x2 - LABEL_GAP_PX, TextHAlign::Right)
        };
        let leader = ctx.element_key("leader", &[series]);
        ctx.surface.push(
            leader,
            group,
            CanvasLayerKind::Labels,
            LinePrimitive::new(x1, y1, x2, y2, 1.0, arc.fill),
        );
        let label_key = ctx.element_key("label", &[series]);
        let color = label_colour(&text, Color::WHITE, false, LabelPalette::default());
        ctx.surface.push(
            label_key,
            group,
            CanvasLayerKind::Labels,
            TextPrimitive::new(text, text_x, y2, font_size, color, align),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::TAU;

    use indexmap::IndexMap;
    use serde_json::json;

    use super::{PieGeometry, slices};
    use crate::core::{DatumKey, Encoding, Scale, accessor, prepare_points};
    use crate::geometry::{
        ColourScale, Geometry, Prepared, RenderContext, ResolvedFormatters, StyleOptions,
    };
    use crate::render::{CanvasLayerKind, HeuristicTextMeasurer, Surface};

    fn prepared(rows: &[serde_json::Value]) -> Prepared {
        let encoding = Encoding {
            x: accessor::field("c").expect("x"),
            y: accessor::field("y").expect("y"),
            x2: None,
            y2: None,
            colour: Some(accessor::field("c").expect("c")),
            size: None,
        };
        let indexed: Vec<_> = rows.iter().enumerate().collect();
        let points =
            prepare_points(&indexed, &encoding, Scale::Discrete, &DatumKey::Missing).expect("points");
        PieGeometry::new().prepare(points, Scale::Discrete, None).expect("prepare")
    }

    fn render(pie: &PieGeometry, prepared: &Prepared) -> Surface<'static> {
        let mut style = StyleOptions::resolve(&StyleOptions::default(), &StyleOptions::default())
            .expect("style");
        style.show_labels = true;
        let colours = ColourScale::new(prepared.colour_domain(), style.palette.clone(), IndexMap::new())
            .expect("colours");
        let formatters = ResolvedFormatters::default();
        let mut surface = Surface::new(&HeuristicTextMeasurer, "sans", 200.0, 200.0);
        let mut ctx = RenderContext {
            surface: &mut surface,
            key: "pie-0",
            facet: 0,
            x: None,
            y: None,
            y2: None,
            colours: &colours,
            formatters: &formatters,
            style: &style,
            is_primary: false,
        };
        pie.render(&mut ctx, prepared).expect("render");
        surface
    }

    #[test]
    fn slices_cover_a_full_turn_in_first_seen_order() {
        let prepared = prepared(&[
            json!({"c": "b", "y": 1}),
            json!({"c": "a", "y": 3}),
            json!({"c": "b", "y": 0}),
        ]);
        let (slices, total) = slices(&prepared);
        assert_eq!(total, 4.0);
        assert_eq!(slices[0].colour, DatumKey::Text("b".into()));
        assert!((slices[0].end_angle - TAU / 4.0).abs() < 1e-9);
        assert!((slices[1].end_angle - TAU).abs() < 1e-9);
    }

    #[test]
    fn pie_has_no_axis_scales() {
        let pie = PieGeometry::new();
        let prepared = prepared(&[json!({"c": "a", "y": 1})]);
        let err = pie
            .x_scale(&prepared, (0.0, 1.0), 0.1)
            .expect_err("pie x scale");
        assert!(err.is_configuration());
        assert!(pie.y_scale(&[&prepared], (0.0, 1.0)).is_err());
        assert!(!pie.is_cartesian());
    }

    #[test]
    fn narrow_slices_hide_inside_labels() {
        let pie = PieGeometry::new().with_label_percent(true);
        let prepared = prepared(&[json!({"c": "big", "y": 999}), json!({"c": "tiny", "y": 1})]);
        let surface = render(&pie, &prepared);
        let texts: Vec<_> = surface
            .items()
            .iter()
            .filter_map(|e| e.item.primitive.as_text())
            .map(|t| t.text.clone())
            .collect();
        assert_eq!(texts, vec!["99.9%".to_owned()]);
    }

    #[test]
    fn outside_labels_get_leader_lines() {
        let pie = PieGeometry::new().with_outside_labels(true);
        let prepared = prepared(&[json!({"c": "a", "y": 1}), json!({"c": "b", "y": 1})]);
        let surface = render(&pie, &prepared);
        let leaders = surface
            .items()
            .iter()
            .filter(|e| e.item.layer == CanvasLayerKind::Labels && e.item.primitive.as_text().is_none())
            .count();
        assert_eq!(leaders, 2);
    }

    #[test]
    fn donut_ratio_is_validated() {
        assert!(PieGeometry::new().with_inner_radius_ratio(1.0).is_err());
        assert!(PieGeometry::new().with_inner_radius_ratio(0.5).is_ok());
    }
}
