use tracing::{debug, trace};

use crate::animation::TransitionSpec;
use crate::core::{
    DatumKey, LinearScale, PlotRect, PlotScale, PreparedPoint, Row, Viewport, colour_domain,
    prepare_points,
};
use crate::error::{ChartError, ChartResult};
use crate::geometry::{
    Channels, ColourScale, Geometry, Prepared, RenderContext, ResolvedFormatters, ResolvedStyle,
    StyleOptions, gradient_id, label_group, shape_group,
};
use crate::interaction::HitTarget;
use crate::layout::{
    AxisOutcome, AxisPosition, AxisSpec, FACET_GAP_PX, LegendEntry, LegendLayout, Margins,
    draw_axis, draw_legend, facet_bands, legend_domain, measure_axis, partition_facets,
};
use crate::render::{
    CanvasLayerKind, Color, Fill, GradientDef, RectPrimitive, Renderer, Surface, SurfaceItem,
    TextHAlign, TextMeasurer, TextPrimitive,
};

use super::Chart;
use super::chart::GeometrySlot;

const LEGEND_GAP_PX: f64 = 8.0;
const FACET_HEADER_EMS: f64 = 1.6;
const Y_AXIS_KEY: &str = "y-axis";
const Y2_AXIS_KEY: &str = "y2-axis";

/// One small-multiple panel.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetCell {
    pub key: DatumKey,
    /// Plot area in chart pixels.
    pub rect: PlotRect,
    pub x_scale: Option<PlotScale>,
}

/// Outcome of the layout passes of one render.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub viewport: Viewport,
    pub margins: Margins,
    pub legend: Option<LegendLayout>,
    pub legend_entries: Vec<LegendEntry>,
    pub cells: Vec<FacetCell>,
    pub y_scale: Option<LinearScale>,
    pub y2_scale: Option<LinearScale>,
    pub x_axes: Vec<AxisOutcome>,
    /// Geometry supplying the shared axis domains.
    pub representative: Option<String>,
    /// Geometry keys in draw order.
    pub draw_order: Vec<String>,
}

impl ChartLayout {
    /// Categories on the x axis of `facet`; empty for linear axes.
    #[must_use]
    pub fn x_domain(&self, facet: usize) -> Vec<DatumKey> {
        match self.cells.get(facet).and_then(|cell| cell.x_scale.as_ref()) {
            Some(PlotScale::Band(band)) => band.domain(),
            _ => Vec::new(),
        }
    }
}

/// Transition groups animated for one geometry in one facet.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct GroupPlan {
    pub(super) shape_group: String,
    pub(super) label_group: String,
    pub(super) spec: TransitionSpec,
}

pub(super) struct Composition {
    pub(super) items: Vec<SurfaceItem>,
    pub(super) gradients: Vec<GradientDef>,
    pub(super) hit_targets: Vec<HitTarget>,
    pub(super) groups: Vec<GroupPlan>,
    pub(super) layout: ChartLayout,
}

/// Per-render state of one geometry: resolved configuration plus its
/// prepared data split by facet.
struct GeometryPlan<'c> {
    slot: &'c GeometrySlot,
    style: ResolvedStyle,
    formatters: ResolvedFormatters,
    colour_domain: Vec<DatumKey>,
    prepared: Vec<Prepared>,
}

impl GeometryPlan<'_> {
    fn geometry(&self) -> &dyn Geometry {
        self.slot.geometry.as_ref()
    }

    fn key(&self) -> &str {
        &self.slot.key
    }

    fn prepared_refs(&self) -> Vec<&Prepared> {
        self.prepared.iter().collect()
    }
}

fn plan_geometry<'c, R: Renderer>(
    chart: &Chart<R>,
    slot: &'c GeometrySlot,
    rows: &[Row],
    facet_of: &[usize],
    facet_count: usize,
) -> ChartResult<GeometryPlan<'c>> {
    let geometry = slot.geometry.as_ref();
    let style = StyleOptions::resolve(&geometry.options().style, &chart.options.style)?;
    let encoding = Channels::encoding(geometry.channels(), &chart.channels)?;
    let formatters = Channels::formatters(geometry.channels(), &chart.channels);

    let indexed: Vec<(usize, &Row)> = rows.iter().enumerate().collect();
    let default_colour = DatumKey::Text(slot.key.clone());
    let points = prepare_points(&indexed, &encoding, style.x_scale, &default_colour)?;
    let colours = colour_domain(&points);
    // boundaries come from the full dataset, before the facet split
    let strategy = geometry.bucket_strategy(style.x_scale, &points)?;

    let mut per_facet: Vec<Vec<PreparedPoint>> = vec![Vec::new(); facet_count];
    for point in points {
        if let Some(bucket) = facet_of.get(point.index).and_then(|f| per_facet.get_mut(*f)) {
            bucket.push(point);
        }
    }
    let prepared = per_facet
        .into_iter()
        .map(|points| geometry.prepare(points, style.x_scale, strategy))
        .collect::<ChartResult<Vec<_>>>()?;
    trace!(
        key = %slot.key,
        kind = geometry.kind().name(),
        strategy = ?strategy,
        series = colours.len(),
        "geometry prepared"
    );

    Ok(GeometryPlan {
        slot,
        style,
        formatters,
        colour_domain: colours,
        prepared,
    })
}

/// Legend entries in legend order; bars that produced a gradient lend it
/// to their swatch.
fn legend_entries(
    keys: &[DatumKey],
    plans: &[GeometryPlan<'_>],
    colour_scales: &[ColourScale],
    gradients: &[GradientDef],
) -> Vec<LegendEntry> {
    keys.iter()
        .map(|key| {
            let owner = plans
                .iter()
                .enumerate()
                .find(|(_, plan)| plan.style.show_legend && plan.colour_domain.contains(key));
            let fill = match owner {
                Some((index, plan)) => {
                    let base = colour_scales[index].colour(key);
                    let id = gradient_id(plan.key(), key);
                    if gradients.iter().any(|g| g.id == id) {
                        Fill::Gradient { id, fallback: base }
                    } else {
                        Fill::Solid(base)
                    }
                }
                None => Fill::Solid(Color::BLACK),
            };
            LegendEntry {
                key: key.clone(),
                label: key.label(),
                fill,
            }
        })
        .collect()
}

/// Runs the whole composition sequence over `rows`.
///
/// Geometries are prepared and coloured, the legend is sized, axes are
/// measured offscreen to size the margins, then geometries, axes and the
/// legend are drawn for real.
pub(super) fn compose<R: Renderer>(chart: &Chart<R>, rows: &[Row]) -> ChartResult<Composition> {
    let options = &chart.options;
    let viewport = options.viewport;
    if !viewport.is_valid() {
        return Err(ChartError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }
    let (width, height) = (f64::from(viewport.width), f64::from(viewport.height));
    let measurer: &dyn TextMeasurer = chart.measurer.as_ref();
    let family = options.font_family.as_str();
    let chart_style = StyleOptions::resolve(&StyleOptions::default(), &options.style)?;
    let font_size = chart_style.font_size;

    let facets = partition_facets(rows, chart.facet.as_ref());
    let mut facet_of = vec![0usize; rows.len()];
    for (facet, members) in facets.values().enumerate() {
        for &row in members {
            facet_of[row] = facet;
        }
    }

    let mut order: Vec<&GeometrySlot> = chart.geometries.iter().collect();
    order.sort_by_key(|slot| slot.geometry.priority());
    let plans = order
        .into_iter()
        .map(|slot| plan_geometry(chart, slot, rows, &facet_of, facets.len()))
        .collect::<ChartResult<Vec<_>>>()?;

    let representative = plans.iter().position(|p| p.geometry().is_cartesian());
    let secondary = plans
        .iter()
        .position(|p| p.geometry().is_cartesian() && p.geometry().options().use_y2_axis);
    let rep = representative.map(|index| &plans[index]);

    let shared_domain = legend_domain(plans.iter().map(|p| p.colour_domain.as_slice()));
    let colour_scales = plans
        .iter()
        .map(|p| {
            ColourScale::new(
                shared_domain.iter().cloned(),
                p.style.palette.clone(),
                p.style.overrides.clone(),
            )
        })
        .collect::<ChartResult<Vec<_>>>()?;

    // legend is sized before the margins are final
    let legend_keys = legend_domain(
        plans
            .iter()
            .filter(|p| p.style.show_legend)
            .map(|p| p.colour_domain.as_slice()),
    );
    let pad = options.padding;
    let legend_width = (width - pad.left - pad.right).max(0.0);
    let legend = (!legend_keys.is_empty()).then(|| {
        let entries = legend_entries(&legend_keys, &plans, &colour_scales, &[]);
        LegendLayout::measure(&entries, legend_width, font_size, measurer, family)
    });
    let legend_height = legend.map_or(0.0, |l| l.height() + LEGEND_GAP_PX);
    let header_height = if facets.len() > 1 {
        font_size * FACET_HEADER_EMS
    } else {
        0.0
    };

    let mut margins = Margins {
        top: pad.top + legend_height + header_height,
        ..pad
    };

    // offscreen pass: measure axes drawn against placeholder extents
    if let Some(rep) = rep {
        let placeholder = margins.inner(width, height);
        let refs = rep.prepared_refs();
        let y = rep.geometry().y_scale(&refs, (placeholder.height, 0.0))?;
        let y_plot = PlotScale::Linear(y);
        let left = measure_axis(
            measurer,
            family,
            &AxisSpec {
                position: AxisPosition::Left,
                scale: &y_plot,
                formatter: &rep.formatters.y,
                font_size,
                length: placeholder.height,
                grid_length: None,
                color: options.axis_color,
                key: Y_AXIS_KEY,
            },
        );
        margins.left += (-left.x).max(0.0);

        if let Some(secondary) = secondary.map(|index| &plans[index]) {
            let y2 = secondary
                .geometry()
                .y_scale(&secondary.prepared_refs(), (placeholder.height, 0.0))?;
            let y2_plot = PlotScale::Linear(y2);
            let right = measure_axis(
                measurer,
                family,
                &AxisSpec {
                    position: AxisPosition::Right,
                    scale: &y2_plot,
                    formatter: &secondary.formatters.y,
                    font_size,
                    length: placeholder.height,
                    grid_length: None,
                    color: options.axis_color,
                    key: Y2_AXIS_KEY,
                },
            );
            margins.right += right.right().max(0.0);
        }

        let inner_width = margins.inner(width, height).width;
        let mut bottom: f64 = 0.0;
        for (facet, (_, band_width)) in facet_bands(facets.len(), inner_width, FACET_GAP_PX)
            .into_iter()
            .enumerate()
        {
            let x = rep
                .geometry()
                .x_scale(&rep.prepared[facet], (0.0, band_width), rep.style.padding)?;
            let key = format!("{facet}:x-axis");
            let rect = measure_axis(
                measurer,
                family,
                &AxisSpec {
                    position: AxisPosition::Bottom,
                    scale: &x,
                    formatter: &rep.formatters.x,
                    font_size,
                    length: band_width,
                    grid_length: None,
                    color: options.axis_color,
                    key: &key,
                },
            );
            bottom = bottom.max(rect.bottom());
        }
        margins.bottom += bottom;
    }

    let plot = margins.inner(width, height);
    if plot.width <= 0.0 || plot.height <= 0.0 {
        return Err(ChartError::DegenerateInput(format!(
            "margins leave no room for the plot ({}x{} chart)",
            viewport.width, viewport.height
        )));
    }
    debug!(
        top = margins.top,
        right = margins.right,
        bottom = margins.bottom,
        left = margins.left,
        facets = facets.len(),
        "margins measured"
    );

    let y_scale = rep
        .map(|r| r.geometry().y_scale(&r.prepared_refs(), (plot.height, 0.0)))
        .transpose()?;
    let y2_scale = secondary
        .map(|index| &plans[index])
        .map(|s| s.geometry().y_scale(&s.prepared_refs(), (plot.height, 0.0)))
        .transpose()?;

    let mut root = Surface::new(measurer, family, width, height);
    if let Some(background) = options.background {
        root.push(
            "background",
            "frame",
            CanvasLayerKind::Background,
            RectPrimitive::new(0.0, 0.0, width, height, background),
        );
    }

    let bands = facet_bands(facets.len(), plot.width, FACET_GAP_PX);
    let last_facet = facets.len().saturating_sub(1);
    let mut groups = Vec::new();
    let mut cells = Vec::with_capacity(facets.len());
    let mut x_axes = Vec::new();
    for (facet, (facet_key, _)) in facets.iter().enumerate() {
        let (band_x, band_width) = bands[facet];
        let cell_rect = PlotRect::new(plot.x + band_x, plot.y, band_width, plot.height);
        let x_scale = rep
            .map(|r| {
                r.geometry()
                    .x_scale(&r.prepared[facet], (0.0, band_width), r.style.padding)
            })
            .transpose()?;

        if options.axis_box {
            root.push(
                format!("{facet}:axis-box"),
                "frame",
                CanvasLayerKind::Axis,
                RectPrimitive::outline(cell_rect, 1.0, options.axis_color),
            );
        }
        if facets.len() > 1 {
            root.push(
                format!("{facet}:header"),
                "frame",
                CanvasLayerKind::Axis,
                TextPrimitive::new(
                    facet_key.label(),
                    cell_rect.x + band_width / 2.0,
                    plot.y - header_height / 2.0,
                    font_size,
                    options.text_color,
                    TextHAlign::Center,
                ),
            );
        }

        let mut cell = root.child(cell_rect.x, cell_rect.y, band_width, plot.height);
        for (index, plan) in plans.iter().enumerate() {
            let cartesian = plan.geometry().is_cartesian();
            let mut ctx = RenderContext {
                surface: &mut cell,
                key: plan.key(),
                facet,
                x: x_scale.as_ref().filter(|_| cartesian),
                y: y_scale.as_ref().filter(|_| cartesian),
                y2: y2_scale.as_ref().filter(|_| cartesian),
                colours: &colour_scales[index],
                formatters: &plan.formatters,
                style: &plan.style,
                is_primary: representative == Some(index),
            };
            plan.geometry().render(&mut ctx, &plan.prepared[facet])?;
            trace!(key = plan.key(), facet, "geometry rendered");

            let spec = if plan.style.no_animation {
                TransitionSpec::instant()
            } else {
                plan.geometry().options().transition
            };
            groups.push(GroupPlan {
                shape_group: shape_group(facet, plan.key()),
                label_group: label_group(facet, plan.key()),
                spec,
            });
        }
        root.absorb(cell);

        if let (Some(rep), Some(x)) = (rep, x_scale.as_ref()) {
            let key = format!("{facet}:x-axis");
            let mut axis = root.child(cell_rect.x, cell_rect.bottom(), band_width, 0.0);
            let outcome = draw_axis(
                &mut axis,
                &AxisSpec {
                    position: AxisPosition::Bottom,
                    scale: x,
                    formatter: &rep.formatters.x,
                    font_size,
                    length: band_width,
                    grid_length: None,
                    color: options.axis_color,
                    key: &key,
                },
            );
            root.absorb(axis);
            x_axes.push(outcome);

            if facet == 0
                && let Some(y) = y_scale
            {
                let y_plot = PlotScale::Linear(y);
                let mut axis = root.child(cell_rect.x, cell_rect.y, 0.0, plot.height);
                draw_axis(
                    &mut axis,
                    &AxisSpec {
                        position: AxisPosition::Left,
                        scale: &y_plot,
                        formatter: &rep.formatters.y,
                        font_size,
                        length: plot.height,
                        grid_length: Some(band_width),
                        color: options.axis_color,
                        key: Y_AXIS_KEY,
                    },
                );
                root.absorb(axis);
            }
            if facet == last_facet
                && let (Some(y2), Some(secondary)) = (y2_scale, secondary.map(|i| &plans[i]))
            {
                let y2_plot = PlotScale::Linear(y2);
                let mut axis = root.child(cell_rect.right(), cell_rect.y, 0.0, plot.height);
                draw_axis(
                    &mut axis,
                    &AxisSpec {
                        position: AxisPosition::Right,
                        scale: &y2_plot,
                        formatter: &secondary.formatters.y,
                        font_size,
                        length: plot.height,
                        grid_length: None,
                        color: options.axis_color,
                        key: Y2_AXIS_KEY,
                    },
                );
                root.absorb(axis);
            }
        }

        cells.push(FacetCell {
            key: facet_key.clone(),
            rect: cell_rect,
            x_scale,
        });
    }

    // re-laid now that geometries may have produced gradients
    let mut entries = Vec::new();
    if let Some(layout) = legend {
        entries = legend_entries(&legend_keys, &plans, &colour_scales, root.gradients());
        let mut surface = root.child(pad.left, pad.top, legend_width, layout.height());
        draw_legend(&mut surface, &entries, layout, options.text_color);
        root.absorb(surface);
    }

    let layout = ChartLayout {
        viewport,
        margins,
        legend,
        legend_entries: entries,
        cells,
        y_scale,
        y2_scale,
        x_axes,
        representative: rep.map(|r| r.key().to_owned()),
        draw_order: plans.iter().map(|p| p.key().to_owned()).collect(),
    };
    let (items, gradients, hit_targets) = root.into_parts();
    debug!(
        items = items.len(),
        hit_targets = hit_targets.len(),
        geometries = plans.len(),
        "composition finished"
    );
    Ok(Composition {
        items,
        gradients,
        hit_targets,
        groups,
        layout,
    })
}
