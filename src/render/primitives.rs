use serde::{Deserialize, Serialize};

use crate::core::PlotRect;
use crate::error::{ChartError, ChartResult};

/// RGBA color in normalized 0..=1 channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    #[must_use]
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> ChartResult<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let parse = |s: &str| {
            u8::from_str_radix(s, 16)
                .map(|v| f64::from(v) / 255.0)
                .map_err(|_| ChartError::Configuration(format!("invalid hex color `{hex}`")))
        };
        if !digits.is_ascii() {
            return Err(ChartError::Configuration(format!(
                "invalid hex color `{hex}`"
            )));
        }
        match digits.len() {
            3 => {
                let expand = |i: usize| parse(&digits[i..=i].repeat(2));
                Ok(Self::rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            6 | 8 => {
                let alpha = if digits.len() == 8 {
                    parse(&digits[6..8])?
                } else {
                    1.0
                };
                Ok(Self::rgba(
                    parse(&digits[0..2])?,
                    parse(&digits[2..4])?,
                    parse(&digits[4..6])?,
                    alpha,
                ))
            }
            _ => Err(ChartError::Configuration(format!(
                "invalid hex color `{hex}`"
            ))),
        }
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        let byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            byte(self.red),
            byte(self.green),
            byte(self.blue)
        )
    }

    #[must_use]
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    /// CIELAB perceptual lightness `L*` in `0..=100`.
    #[must_use]
    pub fn lightness(self) -> f64 {
        let linear = |c: f64| {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        let y = 0.2126 * linear(self.red) + 0.7152 * linear(self.green) + 0.0722 * linear(self.blue);
        let f = if y > 216.0 / 24389.0 {
            y.cbrt()
        } else {
            (24389.0 / 27.0 * y + 16.0) / 116.0
        };
        116.0 * f - 16.0
    }

    /// Channel-wise interpolation, `t` in `0..=1`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Self::rgba(
            mix(self.red, other.red),
            mix(self.green, other.green),
            mix(self.blue, other.blue),
            mix(self.alpha, other.alpha),
        )
    }

    pub fn validate(self) -> ChartResult<()> {
        for (channel, value) in [
            ("red", self.red),
            ("green", self.green),
            ("blue", self.blue),
            ("alpha", self.alpha),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ChartError::InvalidData(format!(
                    "color channel `{channel}` must be finite and in [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// Fill for closed shapes: a solid color or a frame-level gradient by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fill {
    Solid(Color),
    Gradient { id: String, fallback: Color },
}

impl Fill {
    /// Solid color, or the gradient's fallback color.
    #[must_use]
    pub fn base_color(&self) -> Color {
        match self {
            Self::Solid(color) => *color,
            Self::Gradient { fallback, .. } => *fallback,
        }
    }
}

impl From<Color> for Fill {
    fn from(value: Color) -> Self {
        Self::Solid(value)
    }
}

/// Draw command for one line segment in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinePrimitive {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub stroke_width: f64,
    pub color: Color,
}

impl LinePrimitive {
    #[must_use]
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64, stroke_width: f64, color: Color) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            stroke_width,
            color,
        }
    }

    pub fn validate(self) -> ChartResult<()> {
        finite("line", &[self.x1, self.y1, self.x2, self.y2])?;
        positive("line stroke width", self.stroke_width)?;
        self.color.validate()
    }
}

/// Axis-aligned rectangle, used for bars, swatches, frames and hit areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectPrimitive {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: Fill,
    pub border_width: f64,
    pub border_color: Color,
    pub opacity: f64,
}

impl RectPrimitive {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64, fill: impl Into<Fill>) -> Self {
        Self {
            x,
            y,
            width,
            height,
            fill: fill.into(),
            border_width: 0.0,
            border_color: Color::BLACK,
            opacity: 1.0,
        }
    }

    /// Unfilled frame with a visible border.
    #[must_use]
    pub fn outline(rect: PlotRect, border_width: f64, border_color: Color) -> Self {
        Self {
            border_width,
            border_color,
            ..Self::new(
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                Color::rgba(0.0, 0.0, 0.0, 0.0),
            )
        }
    }

    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    #[must_use]
    pub fn rect(&self) -> PlotRect {
        PlotRect::new(self.x, self.y, self.width, self.height)
    }

    pub fn validate(&self) -> ChartResult<()> {
        finite("rect", &[self.x, self.y, self.width, self.height])?;
        if self.width < 0.0 || self.height < 0.0 {
            return Err(ChartError::DegenerateInput(
                "rect size must be >= 0".to_owned(),
            ));
        }
        unit("rect opacity", self.opacity)?;
        if !self.border_width.is_finite() || self.border_width < 0.0 {
            return Err(ChartError::DegenerateInput(
                "rect border width must be finite and >= 0".to_owned(),
            ));
        }
        self.fill.base_color().validate()?;
        self.border_color.validate()
    }
}

/// Connected line through several points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolylinePrimitive {
    pub points: Vec<(f64, f64)>,
    pub stroke_width: f64,
    pub color: Color,
}

impl PolylinePrimitive {
    pub fn validate(&self) -> ChartResult<()> {
        for &(x, y) in &self.points {
            finite("polyline", &[x, y])?;
        }
        positive("polyline stroke width", self.stroke_width)?;
        self.color.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CirclePrimitive {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub fill: Color,
    pub opacity: f64,
}

impl CirclePrimitive {
    pub fn validate(self) -> ChartResult<()> {
        finite("circle", &[self.cx, self.cy, self.radius])?;
        if self.radius < 0.0 {
            return Err(ChartError::DegenerateInput(
                "circle radius must be >= 0".to_owned(),
            ));
        }
        unit("circle opacity", self.opacity)?;
        self.fill.validate()
    }
}

/// Annular sector; angles in radians, clockwise from 12 o'clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcPrimitive {
    pub cx: f64,
    pub cy: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub fill: Color,
}

impl ArcPrimitive {
    #[must_use]
    pub fn mid_angle(self) -> f64 {
        (self.start_angle + self.end_angle) / 2.0
    }

    /// Point at `radius` along the arc's mid angle.
    #[must_use]
    pub fn point_at(self, radius: f64) -> (f64, f64) {
        let angle = self.mid_angle();
        (self.cx + radius * angle.sin(), self.cy - radius * angle.cos())
    }

    pub fn validate(self) -> ChartResult<()> {
        finite(
            "arc",
            &[
                self.cx,
                self.cy,
                self.inner_radius,
                self.outer_radius,
                self.start_angle,
                self.end_angle,
            ],
        )?;
        if self.inner_radius < 0.0 || self.outer_radius < self.inner_radius {
            return Err(ChartError::DegenerateInput(
                "arc radii must satisfy 0 <= inner <= outer".to_owned(),
            ));
        }
        self.fill.validate()
    }
}

/// Horizontal text alignment relative to `TextPrimitive::x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextHAlign {
    Left,
    Center,
    Right,
}

/// Draw command for one label in pixel space.
///
/// `y` is the text's vertical centre; `rotation_deg` rotates around `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPrimitive {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size_px: f64,
    pub color: Color,
    pub h_align: TextHAlign,
    pub rotation_deg: f64,
}

impl TextPrimitive {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        x: f64,
        y: f64,
        font_size_px: f64,
        color: Color,
        h_align: TextHAlign,
    ) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            font_size_px,
            color,
            h_align,
            rotation_deg: 0.0,
        }
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation_deg: f64) -> Self {
        self.rotation_deg = rotation_deg;
        self
    }

    pub fn validate(&self) -> ChartResult<()> {
        if self.text.is_empty() {
            return Err(ChartError::InvalidData(
                "text primitive must not be empty".to_owned(),
            ));
        }
        finite("text", &[self.x, self.y, self.rotation_deg])?;
        positive("font size", self.font_size_px)?;
        self.color.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Line(LinePrimitive),
    Rect(RectPrimitive),
    Polyline(PolylinePrimitive),
    Circle(CirclePrimitive),
    Arc(ArcPrimitive),
    Text(TextPrimitive),
}

impl Primitive {
    pub fn validate(&self) -> ChartResult<()> {
        match self {
            Self::Line(p) => p.validate(),
            Self::Rect(p) => p.validate(),
            Self::Polyline(p) => p.validate(),
            Self::Circle(p) => p.validate(),
            Self::Arc(p) => p.validate(),
            Self::Text(p) => p.validate(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Line(_) => "line",
            Self::Rect(_) => "rect",
            Self::Polyline(_) => "polyline",
            Self::Circle(_) => "circle",
            Self::Arc(_) => "arc",
            Self::Text(_) => "text",
        }
    }

    #[must_use]
    pub fn as_rect(&self) -> Option<&RectPrimitive> {
        match self {
            Self::Rect(rect) => Some(rect),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&TextPrimitive> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_circle(&self) -> Option<&CirclePrimitive> {
        match self {
            Self::Circle(circle) => Some(circle),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_arc(&self) -> Option<&ArcPrimitive> {
        match self {
            Self::Arc(arc) => Some(arc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_line(&self) -> Option<&LinePrimitive> {
        match self {
            Self::Line(line) => Some(line),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_polyline(&self) -> Option<&PolylinePrimitive> {
        match self {
            Self::Polyline(line) => Some(line),
            _ => None,
        }
    }

    /// Shifts every coordinate by `(dx, dy)`.
    #[must_use]
    pub fn translated(mut self, dx: f64, dy: f64) -> Self {
        match &mut self {
            Self::Line(p) => {
                p.x1 += dx;
                p.x2 += dx;
                p.y1 += dy;
                p.y2 += dy;
            }
            Self::Rect(p) => {
                p.x += dx;
                p.y += dy;
            }
            Self::Polyline(p) => {
                for point in &mut p.points {
                    point.0 += dx;
                    point.1 += dy;
                }
            }
            Self::Circle(p) => {
                p.cx += dx;
                p.cy += dy;
            }
            Self::Arc(p) => {
                p.cx += dx;
                p.cy += dy;
            }
            Self::Text(p) => {
                p.x += dx;
                p.y += dy;
            }
        }
        self
    }
}

macro_rules! primitive_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(impl From<$ty> for Primitive {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        })*
    };
}

primitive_from!(
    Line(LinePrimitive),
    Rect(RectPrimitive),
    Polyline(PolylinePrimitive),
    Circle(CirclePrimitive),
    Arc(ArcPrimitive),
    Text(TextPrimitive),
);

fn finite(what: &str, values: &[f64]) -> ChartResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ChartError::DegenerateInput(format!(
            "{what} coordinates must be finite"
        )))
    }
}

fn positive(what: &str, value: f64) -> ChartResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ChartError::DegenerateInput(format!(
            "{what} must be finite and > 0"
        )))
    }
}

fn unit(what: &str, value: f64) -> ChartResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ChartError::DegenerateInput(format!(
            "{what} must be in [0, 1]"
        )))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{Color, LinePrimitive, Primitive};
    use crate::error::ChartError;

    #[test]
    fn hex_parsing_round_trips_through_to_hex() {
        let color = Color::from_hex("#1f77b4").expect("hex");
        assert_eq!(color.to_hex(), "#1f77b4");
        assert_eq!(Color::from_hex("#fff").expect("short"), Color::WHITE);
        assert!(Color::from_hex("blue").is_err());
    }

    #[test]
    fn lightness_spans_black_to_white() {
        assert_relative_eq!(Color::BLACK.lightness(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(Color::WHITE.lightness(), 100.0, epsilon = 1e-6);
        assert!(Color::from_hex("#1f77b4").expect("blue").lightness() < 60.0);
    }

    #[test]
    fn nan_coordinates_are_degenerate() {
        let line = Primitive::Line(LinePrimitive::new(0.0, f64::NAN, 1.0, 1.0, 1.0, Color::BLACK));
        assert!(matches!(
            line.validate(),
            Err(ChartError::DegenerateInput(_))
        ));
    }
}
