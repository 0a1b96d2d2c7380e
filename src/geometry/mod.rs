//! Renderable chart types sharing one set of scales and colours.

mod bar;
mod colour;
mod line;
mod options;
mod pie;
mod point;

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::core::{
    BandScale, BucketRow, BucketStrategy, Datum, DatumKey, LinearScale, PlotScale, PreparedPoint,
    Scale, group_by_key,
};
use crate::error::{ChartError, ChartResult};
use crate::interaction::HitPayload;
use crate::render::Surface;

pub use bar::BarGeometry;
pub use colour::ColourScale;
pub use line::LineGeometry;
pub use options::{
    Channels, DEFAULT_BAND_PADDING, DEFAULT_FONT_SIZE_PX, DEFAULT_PALETTE, DEFAULT_STROKE_WIDTH,
    GeometryOptions, ResolvedFormatters, ResolvedStyle, StyleOptions, resolve,
};
pub use pie::{PieGeometry, Slice, slices};
pub use point::{PointGeometry, density_opacity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Bar,
    Line,
    Point,
    Pie,
}

impl GeometryKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Point => "point",
            Self::Pie => "pie",
        }
    }

    /// Built-in draw priority; lower values paint first.
    #[must_use]
    pub fn default_priority(self) -> i32 {
        match self {
            Self::Bar | Self::Pie => 1,
            Self::Line => 2,
            Self::Point => 3,
        }
    }
}

/// Per-facet data of one geometry, rebuilt on every render.
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    pub x_scale: Scale,
    pub points: Vec<PreparedPoint>,
    /// Points grouped by their key: colour series, or buckets once bucketed.
    pub groups: IndexMap<DatumKey, Vec<PreparedPoint>>,
    pub strategy: Option<BucketStrategy>,
    pub buckets: Vec<BucketRow>,
}

impl Prepared {
    /// Groups points by colour series.
    #[must_use]
    pub fn by_colour(points: Vec<PreparedPoint>, x_scale: Scale) -> Self {
        Self {
            x_scale,
            groups: group_by_key(points.clone()),
            points,
            strategy: None,
            buckets: Vec::new(),
        }
    }

    /// Groups points into buckets, then consolidates each bucket per colour.
    pub fn bucketed(
        points: Vec<PreparedPoint>,
        x_scale: Scale,
        strategy: BucketStrategy,
    ) -> ChartResult<Self> {
        let groups = strategy.group(points.clone())?;
        let buckets = strategy.consolidate_buckets(&groups);
        Ok(Self {
            x_scale,
            points,
            groups,
            strategy: Some(strategy),
            buckets,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Categories of the x axis.
    ///
    /// Bucket keys in bucket order once bucketed, otherwise distinct x
    /// values in first-seen order (sorted for time scales).
    #[must_use]
    pub fn x_domain(&self) -> Vec<DatumKey> {
        if self.strategy.is_some() {
            return self.groups.keys().cloned().collect();
        }
        let mut keys: IndexSet<DatumKey> = self.points.iter().map(|p| p.x.key()).collect();
        keys.extend(self.points.iter().filter_map(|p| p.x2.as_ref().map(Datum::key)));
        if self.x_scale == Scale::Time {
            keys.sort();
        }
        keys.into_iter().collect()
    }

    /// Every x extent value, including range ends.
    #[must_use]
    pub fn x_values(&self) -> Vec<f64> {
        self.points
            .iter()
            .flat_map(|p| [p.x.as_f64(), p.x2.as_ref().and_then(Datum::as_f64)])
            .flatten()
            .collect()
    }

    /// Every y extent value, including range starts.
    #[must_use]
    pub fn y_values(&self) -> Vec<f64> {
        if !self.buckets.is_empty() {
            return self
                .buckets
                .iter()
                .flat_map(|b| [b.value, b.start])
                .collect();
        }
        self.points
            .iter()
            .flat_map(|p| [p.y, p.y2])
            .flatten()
            .collect()
    }

    /// Distinct colour keys in first-seen order.
    #[must_use]
    pub fn colour_domain(&self) -> Vec<DatumKey> {
        crate::core::colour_domain(&self.points)
    }
}

/// Everything a geometry needs to draw one facet cell.
pub struct RenderContext<'s, 'm> {
    /// Plot area of the facet cell; local origin is its top-left corner.
    pub surface: &'s mut Surface<'m>,
    pub key: &'s str,
    pub facet: usize,
    pub x: Option<&'s PlotScale>,
    pub y: Option<&'s LinearScale>,
    pub y2: Option<&'s LinearScale>,
    pub colours: &'s ColourScale,
    pub formatters: &'s ResolvedFormatters,
    pub style: &'s ResolvedStyle,
    /// Whether this geometry supplied the shared axis domains.
    pub is_primary: bool,
}

impl RenderContext<'_, '_> {
    #[must_use]
    pub fn width(&self) -> f64 {
        self.surface.width()
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.surface.height()
    }

    #[must_use]
    pub fn shape_group(&self) -> String {
        shape_group(self.facet, self.key)
    }

    #[must_use]
    pub fn label_group(&self) -> String {
        label_group(self.facet, self.key)
    }

    /// Element key `<facet>:<geometry>/<kind>/<parts...>`.
    #[must_use]
    pub fn element_key(&self, kind: &str, parts: &[&str]) -> String {
        let mut key = format!("{}/{kind}", element_prefix(self.facet, self.key));
        for part in parts {
            key.push('/');
            key.push_str(part);
        }
        key
    }

    /// Prefix shared by every data label of this geometry in this facet.
    #[must_use]
    pub fn label_prefix(&self) -> String {
        format!("{}/label/", element_prefix(self.facet, self.key))
    }

    pub fn value_scale(&self, use_y2: bool) -> ChartResult<LinearScale> {
        let scale = if use_y2 { self.y2.or(self.y) } else { self.y };
        scale.copied().ok_or_else(|| {
            ChartError::Configuration(format!("geometry `{}` needs a value scale", self.key))
        })
    }

    pub fn position_scale(&self) -> ChartResult<&PlotScale> {
        self.x.ok_or_else(|| {
            ChartError::Configuration(format!("geometry `{}` needs a position scale", self.key))
        })
    }

    #[must_use]
    pub fn payload(&self, point: &PreparedPoint, value: Datum) -> HitPayload {
        HitPayload {
            data_point: point.row.clone(),
            series: point.colour.label(),
            series_index: self.colours.index_of(&point.colour).unwrap_or(0),
            value,
            geometry: self.key.to_owned(),
        }
    }
}

#[must_use]
pub fn element_prefix(facet: usize, key: &str) -> String {
    format!("{facet}:{key}")
}

/// Transition group animating a geometry's shapes in one facet.
#[must_use]
pub fn shape_group(facet: usize, key: &str) -> String {
    format!("{facet}:{key}:shapes")
}

/// Group of a geometry's data labels; revealed when its shapes finish.
#[must_use]
pub fn label_group(facet: usize, key: &str) -> String {
    format!("{facet}:{key}:labels")
}

#[must_use]
pub fn gradient_id(key: &str, colour: &DatumKey) -> String {
    format!("{key}/gradient/{}", colour.label())
}

/// Contract shared by all chart types.
///
/// Configuration is retained across renders; prepared data and scales are
/// rebuilt by the chart on every call.
pub trait Geometry: fmt::Debug {
    fn kind(&self) -> GeometryKind;
    fn options(&self) -> &GeometryOptions;
    fn options_mut(&mut self) -> &mut GeometryOptions;
    fn channels(&self) -> &Channels;
    fn channels_mut(&mut self) -> &mut Channels;

    fn priority(&self) -> i32 {
        self.options()
            .priority
            .unwrap_or_else(|| self.kind().default_priority())
    }

    /// Whether the geometry is drawn against x/y axes.
    fn is_cartesian(&self) -> bool {
        true
    }

    /// Strategy built from the full dataset of this render, if the
    /// geometry buckets its values.
    fn bucket_strategy(
        &self,
        _x_scale: Scale,
        _points: &[PreparedPoint],
    ) -> ChartResult<Option<BucketStrategy>> {
        Ok(None)
    }

    fn prepare(
        &self,
        points: Vec<PreparedPoint>,
        x_scale: Scale,
        strategy: Option<BucketStrategy>,
    ) -> ChartResult<Prepared> {
        match strategy {
            Some(strategy) => Prepared::bucketed(points, x_scale, strategy),
            None => Ok(Prepared::by_colour(points, x_scale)),
        }
    }

    /// Position scale over this facet's data.
    fn x_scale(
        &self,
        _prepared: &Prepared,
        _range: (f64, f64),
        _padding: f64,
    ) -> ChartResult<PlotScale> {
        Err(unsupported(self.kind(), "x_scale"))
    }

    /// Value scale over the data of every facet.
    fn y_scale(&self, _prepared: &[&Prepared], _range: (f64, f64)) -> ChartResult<LinearScale> {
        Err(unsupported(self.kind(), "y_scale"))
    }

    fn render(&self, ctx: &mut RenderContext<'_, '_>, prepared: &Prepared) -> ChartResult<()>;
}

#[must_use]
pub fn unsupported(kind: GeometryKind, operation: &'static str) -> ChartError {
    ChartError::Unsupported {
        geometry: kind.name(),
        operation,
    }
}

/// Band scale over the categories, or a linear scale for unbucketed
/// continuous x.
pub fn cartesian_x_scale(
    prepared: &Prepared,
    range: (f64, f64),
    padding: f64,
) -> ChartResult<PlotScale> {
    if prepared.strategy.is_none() && prepared.x_scale.is_continuous() {
        let ticks = tick_count(range);
        return Ok(PlotScale::Linear(
            LinearScale::from_values(prepared.x_values(), false, range)?.nice(ticks),
        ));
    }
    Ok(PlotScale::Band(
        BandScale::new(prepared.x_domain(), range).with_padding(padding, padding),
    ))
}

/// Nice linear value scale over every facet's y values.
pub fn cartesian_y_scale(
    prepared: &[&Prepared],
    range: (f64, f64),
    include_zero: bool,
) -> ChartResult<LinearScale> {
    let values = prepared.iter().flat_map(|p| p.y_values());
    Ok(LinearScale::from_values(values, include_zero, range)?.nice(tick_count(range)))
}

fn tick_count(range: (f64, f64)) -> usize {
    (((range.1 - range.0).abs() / crate::layout::axis::VALUE_AXIS_TARGET_SPACING_PX).floor()
        as usize)
        .clamp(2, 10)
}

/// Shared builder methods for every geometry type.
macro_rules! geometry_builders {
    ($ty:ty) => {
        impl $ty {
            #[must_use]
            pub fn with_name(mut self, name: impl Into<String>) -> Self {
                self.options.name = Some(name.into());
                self
            }

            #[must_use]
            pub fn with_priority(mut self, priority: i32) -> Self {
                self.options.priority = Some(priority);
                self
            }

            #[must_use]
            pub fn with_x(mut self, accessor: $crate::core::Accessor) -> Self {
                self.channels.x = Some(accessor);
                self
            }

            #[must_use]
            pub fn with_y(mut self, accessor: $crate::core::Accessor) -> Self {
                self.channels.y = Some(accessor);
                self
            }

            #[must_use]
            pub fn with_x2(mut self, accessor: $crate::core::Accessor) -> Self {
                self.channels.x2 = Some(accessor);
                self
            }

            #[must_use]
            pub fn with_y2(mut self, accessor: $crate::core::Accessor) -> Self {
                self.channels.y2 = Some(accessor);
                self
            }

            #[must_use]
            pub fn with_colour(mut self, accessor: $crate::core::Accessor) -> Self {
                self.channels.colour = Some(accessor);
                self
            }

            #[must_use]
            pub fn with_size(mut self, accessor: $crate::core::Accessor) -> Self {
                self.channels.size = Some(accessor);
                self
            }

            #[must_use]
            pub fn with_format_x(mut self, formatter: $crate::core::Formatter) -> Self {
                self.channels.format_x = Some(formatter);
                self
            }

            #[must_use]
            pub fn with_format_y(mut self, formatter: $crate::core::Formatter) -> Self {
                self.channels.format_y = Some(formatter);
                self
            }

            #[must_use]
            pub fn with_format_label(mut self, formatter: $crate::core::Formatter) -> Self {
                self.channels.format_label = Some(formatter);
                self
            }

            #[must_use]
            pub fn with_x_scale(mut self, scale: $crate::core::Scale) -> Self {
                self.options.style.x_scale = Some(scale);
                self
            }

            #[must_use]
            pub fn with_show_labels(mut self, show: bool) -> Self {
                self.options.style.show_labels = Some(show);
                self
            }

            #[must_use]
            pub fn with_show_legend(mut self, show: bool) -> Self {
                self.options.style.show_legend = Some(show);
                self
            }

            #[must_use]
            pub fn with_no_animation(mut self, disabled: bool) -> Self {
                self.options.style.no_animation = Some(disabled);
                self
            }

            #[must_use]
            pub fn with_font_size(mut self, font_size: f64) -> Self {
                self.options.style.font_size = Some(font_size);
                self
            }

            #[must_use]
            pub fn with_opacity(mut self, opacity: f64) -> Self {
                self.options.style.opacity = Some(opacity);
                self
            }

            #[must_use]
            pub fn with_stroke_width(mut self, width: f64) -> Self {
                self.options.style.stroke_width = Some(width);
                self
            }

            #[must_use]
            pub fn with_padding(mut self, padding: f64) -> Self {
                self.options.style.padding = Some(padding);
                self
            }

            #[must_use]
            pub fn with_use_y2_axis(mut self, enabled: bool) -> Self {
                self.options.use_y2_axis = enabled;
                self
            }

            #[must_use]
            pub fn with_transition(mut self, spec: $crate::animation::TransitionSpec) -> Self {
                self.options.transition = spec;
                self
            }

            /// Fails fast on an empty colour range or invalid hex colours.
            pub fn with_colours(
                mut self,
                colours: Vec<String>,
            ) -> $crate::error::ChartResult<Self> {
                let style = StyleOptions {
                    colours: Some(colours),
                    ..StyleOptions::default()
                };
                style.validate()?;
                self.options.style.colours = style.colours;
                Ok(self)
            }

            pub fn with_colour_overrides(
                mut self,
                overrides: indexmap::IndexMap<String, String>,
            ) -> $crate::error::ChartResult<Self> {
                let style = StyleOptions {
                    colour_overrides: Some(overrides),
                    ..StyleOptions::default()
                };
                style.validate()?;
                self.options.style.colour_overrides = style.colour_overrides;
                Ok(self)
            }

            /// Replaces the whole option set after validating it.
            pub fn with_options(
                mut self,
                options: GeometryOptions,
            ) -> $crate::error::ChartResult<Self> {
                options.validate()?;
                self.options = options;
                Ok(self)
            }
        }

        impl Geometry for $ty {
            fn kind(&self) -> GeometryKind {
                Self::KIND
            }

            fn options(&self) -> &GeometryOptions {
                &self.options
            }

            fn options_mut(&mut self) -> &mut GeometryOptions {
                &mut self.options
            }

            fn channels(&self) -> &Channels {
                &self.channels
            }

            fn channels_mut(&mut self) -> &mut Channels {
                &mut self.channels
            }

            fn is_cartesian(&self) -> bool {
                Self::CARTESIAN
            }

            fn bucket_strategy(
                &self,
                x_scale: $crate::core::Scale,
                points: &[$crate::core::PreparedPoint],
            ) -> $crate::error::ChartResult<Option<$crate::core::BucketStrategy>> {
                self.strategy(x_scale, points)
            }

            fn x_scale(
                &self,
                prepared: &Prepared,
                range: (f64, f64),
                padding: f64,
            ) -> $crate::error::ChartResult<$crate::core::PlotScale> {
                self.position_scale(prepared, range, padding)
            }

            fn y_scale(
                &self,
                prepared: &[&Prepared],
                range: (f64, f64),
            ) -> $crate::error::ChartResult<$crate::core::LinearScale> {
                self.value_scale(prepared, range)
            }

            fn render(
                &self,
                ctx: &mut RenderContext<'_, '_>,
                prepared: &Prepared,
            ) -> $crate::error::ChartResult<()> {
                self.draw(ctx, prepared)
            }
        }
    };
}

pub(crate) use geometry_builders;
