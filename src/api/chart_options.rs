use serde::{Deserialize, Serialize};

use crate::core::Viewport;
use crate::error::{ChartError, ChartResult};
use crate::geometry::StyleOptions;
use crate::layout::Margins;
use crate::render::Color;

/// Chart-level configuration.
///
/// Serializable so host applications can persist/load chart setup. Style
/// fields are the chart half of the geometry → chart → built-in fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub viewport: Viewport,
    pub style: StyleOptions,
    pub font_family: String,
    /// Space kept between the chart edge and axes/legend.
    pub padding: Margins,
    /// Draw a frame around each plot cell.
    pub axis_box: bool,
    pub text_color: Color,
    pub axis_color: Color,
    pub background: Option<Color>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(640, 400),
            style: StyleOptions::default(),
            font_family: "sans-serif".to_owned(),
            padding: Margins::uniform(10.0),
            axis_box: false,
            text_color: Color::rgb(0.2, 0.2, 0.2),
            axis_color: Color::rgb(0.4, 0.4, 0.4),
            background: None,
        }
    }
}

impl ChartOptions {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_axis_box(mut self, enabled: bool) -> Self {
        self.axis_box = enabled;
        self
    }

    #[must_use]
    pub fn with_padding(mut self, padding: Margins) -> Self {
        self.padding = padding;
        self
    }

    #[must_use]
    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    #[must_use]
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: StyleOptions) -> Self {
        self.style = style;
        self
    }

    pub fn validate(&self) -> ChartResult<()> {
        if !self.viewport.is_valid() {
            return Err(ChartError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }
        let Margins {
            top,
            right,
            bottom,
            left,
        } = self.padding;
        if [top, right, bottom, left]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(ChartError::Configuration(
                "chart padding must be finite and >= 0".to_owned(),
            ));
        }
        if self.font_family.trim().is_empty() {
            return Err(ChartError::Configuration(
                "font family must not be empty".to_owned(),
            ));
        }
        self.text_color.validate()?;
        self.axis_color.validate()?;
        if let Some(background) = self.background {
            background.validate()?;
        }
        self.style.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::ChartOptions;
    use crate::error::ChartError;
    use crate::geometry::StyleOptions;

    #[test]
    fn zero_sized_viewport_is_rejected() {
        let err = ChartOptions::new(0, 100).validate().expect_err("zero width");
        assert!(matches!(err, ChartError::InvalidViewport { width: 0, .. }));
    }

    #[test]
    fn style_errors_surface_as_configuration() {
        let options = ChartOptions::default().with_style(StyleOptions {
            colours: Some(Vec::new()),
            ..StyleOptions::default()
        });
        assert!(options.validate().expect_err("empty colours").is_configuration());
    }

    #[test]
    fn options_load_from_partial_json() {
        let options: ChartOptions =
            serde_json::from_str(r#"{"viewport":{"width":200,"height":100},"axis_box":true}"#)
                .expect("json");
        assert!(options.axis_box);
        assert_eq!(options.viewport.width, 200);
        assert_eq!(options.font_family, "sans-serif");
    }
}
