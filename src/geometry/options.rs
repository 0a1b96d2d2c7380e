use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::animation::TransitionSpec;
use crate::core::{Accessor, Encoding, Formatter, Scale, accessor};
use crate::error::{ChartError, ChartResult};
use crate::render::Color;

/// Category10-style palette used when no colour range is configured.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

pub const DEFAULT_FONT_SIZE_PX: f64 = 12.0;
pub const DEFAULT_BAND_PADDING: f64 = 0.1;
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// Picks the geometry value, then the chart value, then the built-in.
#[must_use]
pub fn resolve<T: Clone>(geometry: Option<&T>, chart: Option<&T>, builtin: T) -> T {
    geometry.or(chart).cloned().unwrap_or(builtin)
}

/// Options that exist at both chart and geometry level.
///
/// Every field is optional; an unset geometry value falls back to the
/// chart value, which falls back to the built-in default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOptions {
    pub x_scale: Option<Scale>,
    pub font_size: Option<f64>,
    pub padding: Option<f64>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
    pub show_labels: Option<bool>,
    pub show_legend: Option<bool>,
    pub no_animation: Option<bool>,
    /// Colour range as hex strings.
    pub colours: Option<Vec<String>>,
    /// Individual colour per series label, applied before the range.
    pub colour_overrides: Option<IndexMap<String, String>>,
}

/// Concrete style after the fallback chain has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub x_scale: Scale,
    pub font_size: f64,
    pub padding: f64,
    pub stroke_width: f64,
    /// `None` lets the geometry pick (e.g. density-tuned point opacity).
    pub opacity: Option<f64>,
    pub show_labels: bool,
    pub show_legend: bool,
    pub no_animation: bool,
    pub palette: Vec<Color>,
    pub overrides: IndexMap<String, Color>,
}

impl StyleOptions {
    pub fn validate(&self) -> ChartResult<()> {
        if let Some(colours) = &self.colours {
            parse_palette(colours)?;
        }
        if let Some(overrides) = &self.colour_overrides {
            for hex in overrides.values() {
                Color::from_hex(hex)?;
            }
        }
        if let Some(size) = self.font_size
            && (!size.is_finite() || size <= 0.0)
        {
            return Err(ChartError::Configuration(
                "font size must be finite and > 0".to_owned(),
            ));
        }
        if let Some(padding) = self.padding
            && (!padding.is_finite() || !(0.0..1.0).contains(&padding))
        {
            return Err(ChartError::Configuration(
                "padding must be in [0, 1)".to_owned(),
            ));
        }
        if let Some(width) = self.stroke_width
            && (!width.is_finite() || width <= 0.0)
        {
            return Err(ChartError::Configuration(
                "stroke width must be finite and > 0".to_owned(),
            ));
        }
        if let Some(opacity) = self.opacity
            && (!opacity.is_finite() || !(0.0..=1.0).contains(&opacity))
        {
            return Err(ChartError::Configuration(
                "opacity must be in [0, 1]".to_owned(),
            ));
        }
        Ok(())
    }

    /// Applies geometry → chart → built-in fallback.
    ///
    /// Colour override maps are merged with the geometry's entries winning.
    pub fn resolve(geometry: &Self, chart: &Self) -> ChartResult<ResolvedStyle> {
        geometry.validate()?;
        chart.validate()?;

        let palette = match geometry.colours.as_ref().or(chart.colours.as_ref()) {
            Some(colours) => parse_palette(colours)?,
            None => parse_palette(&DEFAULT_PALETTE.map(str::to_owned))?,
        };
        let mut overrides = IndexMap::new();
        for map in [&chart.colour_overrides, &geometry.colour_overrides]
            .into_iter()
            .flatten()
        {
            for (label, hex) in map {
                overrides.insert(label.clone(), Color::from_hex(hex)?);
            }
        }

        Ok(ResolvedStyle {
            x_scale: resolve(geometry.x_scale.as_ref(), chart.x_scale.as_ref(), Scale::Discrete),
            font_size: resolve(
                geometry.font_size.as_ref(),
                chart.font_size.as_ref(),
                DEFAULT_FONT_SIZE_PX,
            ),
            padding: resolve(
                geometry.padding.as_ref(),
                chart.padding.as_ref(),
                DEFAULT_BAND_PADDING,
            ),
            stroke_width: resolve(
                geometry.stroke_width.as_ref(),
                chart.stroke_width.as_ref(),
                DEFAULT_STROKE_WIDTH,
            ),
            opacity: geometry.opacity.or(chart.opacity),
            show_labels: resolve(geometry.show_labels.as_ref(), chart.show_labels.as_ref(), false),
            show_legend: resolve(geometry.show_legend.as_ref(), chart.show_legend.as_ref(), true),
            no_animation: resolve(
                geometry.no_animation.as_ref(),
                chart.no_animation.as_ref(),
                false,
            ),
            palette,
            overrides,
        })
    }
}

fn parse_palette(colours: &[String]) -> ChartResult<Vec<Color>> {
    if colours.is_empty() {
        return Err(ChartError::Configuration(
            "colour range must contain at least one colour".to_owned(),
        ));
    }
    colours.iter().map(|hex| Color::from_hex(hex)).collect()
}

/// Accessor and formatter slots. Unset slots inherit from the chart.
#[derive(Debug, Clone, Default)]
pub struct Channels {
    pub x: Option<Accessor>,
    pub y: Option<Accessor>,
    pub x2: Option<Accessor>,
    pub y2: Option<Accessor>,
    pub colour: Option<Accessor>,
    pub size: Option<Accessor>,
    pub format_x: Option<Formatter>,
    pub format_y: Option<Formatter>,
    pub format_label: Option<Formatter>,
}

/// Formatters after fallback.
#[derive(Debug, Clone, Default)]
pub struct ResolvedFormatters {
    pub x: Formatter,
    pub y: Formatter,
    pub label: Formatter,
}

impl Channels {
    /// Resolves the accessor set; `x` and `y` default to the `x`/`y` fields.
    pub fn encoding(geometry: &Self, chart: &Self) -> ChartResult<Encoding> {
        let pick = |g: &Option<Accessor>, c: &Option<Accessor>| g.as_ref().or(c.as_ref()).cloned();
        Ok(Encoding {
            x: match pick(&geometry.x, &chart.x) {
                Some(x) => x,
                None => accessor::field("x")?,
            },
            y: match pick(&geometry.y, &chart.y) {
                Some(y) => y,
                None => accessor::field("y")?,
            },
            x2: pick(&geometry.x2, &chart.x2),
            y2: pick(&geometry.y2, &chart.y2),
            colour: pick(&geometry.colour, &chart.colour),
            size: pick(&geometry.size, &chart.size),
        })
    }

    #[must_use]
    pub fn formatters(geometry: &Self, chart: &Self) -> ResolvedFormatters {
        let builtin = Formatter::default();
        ResolvedFormatters {
            x: resolve(geometry.format_x.as_ref(), chart.format_x.as_ref(), builtin.clone()),
            y: resolve(geometry.format_y.as_ref(), chart.format_y.as_ref(), builtin.clone()),
            label: resolve(
                geometry.format_label.as_ref(),
                chart.format_label.as_ref(),
                builtin,
            ),
        }
    }
}

/// Retained per-geometry configuration.
///
/// Flags that only make sense for one variant are ignored by the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryOptions {
    /// Stable identity; defaults to `<kind>-<index>`.
    pub name: Option<String>,
    pub priority: Option<i32>,
    pub style: StyleOptions,
    pub use_y2_axis: bool,
    pub transition: TransitionSpec,
    /// Bars: stack colour series instead of placing them side by side.
    pub stacked: bool,
    /// Bars: fill with a per-series vertical gradient.
    pub gradient: bool,
    /// Pie: 0 for a pie, up to < 1 for a donut.
    pub inner_radius_ratio: f64,
    /// Pie: label slices with their share of the total.
    pub label_percent: bool,
    /// Pie: place labels outside with leader lines.
    pub outside_labels: bool,
    /// Points: radius range of the size scale.
    pub size_range: (f64, f64),
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            name: None,
            priority: None,
            style: StyleOptions::default(),
            use_y2_axis: false,
            transition: TransitionSpec::default(),
            stacked: false,
            gradient: false,
            inner_radius_ratio: 0.0,
            label_percent: false,
            outside_labels: false,
            size_range: (2.0, 12.0),
        }
    }
}

impl GeometryOptions {
    pub fn validate(&self) -> ChartResult<()> {
        self.style.validate()?;
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(ChartError::Configuration(
                "geometry name must not be empty".to_owned(),
            ));
        }
        if !self.inner_radius_ratio.is_finite() || !(0.0..1.0).contains(&self.inner_radius_ratio) {
            return Err(ChartError::Configuration(
                "inner radius ratio must be in [0, 1)".to_owned(),
            ));
        }
        let (min, max) = self.size_range;
        if !min.is_finite() || !max.is_finite() || min < 0.0 || max < min {
            return Err(ChartError::Configuration(
                "size range must satisfy 0 <= min <= max".to_owned(),
            ));
        }
        if !self.transition.duration_ms.is_finite()
            || self.transition.duration_ms < 0.0
            || !self.transition.delay_ms.is_finite()
            || self.transition.delay_ms < 0.0
        {
            return Err(ChartError::Configuration(
                "transition duration and delay must be finite and >= 0".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::{StyleOptions, resolve};
    use crate::core::Scale;
    use crate::render::Color;

    #[test]
    fn geometry_value_beats_chart_value_beats_builtin() {
        assert_eq!(resolve(Some(&1), Some(&2), 3), 1);
        assert_eq!(resolve(None, Some(&2), 3), 2);
        assert_eq!(resolve::<i32>(None, None, 3), 3);
    }

    #[test]
    fn empty_colour_range_fails_fast() {
        let style = StyleOptions {
            colours: Some(Vec::new()),
            ..StyleOptions::default()
        };
        let err = style.validate().expect_err("empty range");
        assert!(err.is_configuration());
    }

    #[test]
    fn geometry_overrides_win_over_chart_overrides() {
        let chart = StyleOptions {
            colour_overrides: Some(IndexMap::from([
                ("a".to_owned(), "#000000".to_owned()),
                ("b".to_owned(), "#000000".to_owned()),
            ])),
            x_scale: Some(Scale::Time),
            ..StyleOptions::default()
        };
        let geometry = StyleOptions {
            colour_overrides: Some(IndexMap::from([("a".to_owned(), "#ffffff".to_owned())])),
            ..StyleOptions::default()
        };
        let resolved = StyleOptions::resolve(&geometry, &chart).expect("resolve");
        assert_eq!(resolved.overrides["a"], Color::WHITE);
        assert_eq!(resolved.overrides["b"], Color::BLACK);
        assert_eq!(resolved.x_scale, Scale::Time);
    }
}
