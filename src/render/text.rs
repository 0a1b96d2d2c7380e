use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextSize {
    pub width: f64,
    pub height: f64,
}

impl TextSize {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Axis-aligned footprint of the text rotated by `rotation_deg`.
    #[must_use]
    pub fn rotated(self, rotation_deg: f64) -> Self {
        let theta = rotation_deg.to_radians();
        let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
        Self::new(
            self.width * cos + self.height * sin,
            self.width * sin + self.height * cos,
        )
    }
}

/// Measures rendered text.
///
/// Layout code only ever asks this trait for text sizes, so a deterministic
/// implementation gives headless, reproducible layouts.
pub trait TextMeasurer {
    fn measure(&self, text: &str, font_family: &str, font_size_px: f64) -> TextSize;
}

/// Deterministic backend-independent estimate based on glyph classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTextMeasurer;

impl TextMeasurer for HeuristicTextMeasurer {
    fn measure(&self, text: &str, _font_family: &str, font_size_px: f64) -> TextSize {
        if text.is_empty() || !font_size_px.is_finite() || font_size_px <= 0.0 {
            return TextSize::default();
        }
        let units = text.chars().fold(0.0, |acc, ch| {
            acc + match ch {
                '0'..='9' => 0.62,
                '.' | ',' => 0.34,
                '-' | '+' | '%' => 0.42,
                ' ' => 0.33,
                _ => 0.58,
            }
        });
        TextSize::new(units * font_size_px, font_size_px)
    }
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for &T {
    fn measure(&self, text: &str, font_family: &str, font_size_px: f64) -> TextSize {
        (**self).measure(text, font_family, font_size_px)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{HeuristicTextMeasurer, TextMeasurer, TextSize};

    #[test]
    fn digits_are_wider_than_punctuation() {
        let m = HeuristicTextMeasurer;
        let digits = m.measure("12345", "sans", 12.0);
        assert_relative_eq!(digits.width, 37.2, epsilon = 1e-9);
        assert_relative_eq!(digits.height, 12.0);
        assert!(m.measure("...", "sans", 12.0).width < m.measure("000", "sans", 12.0).width);
    }

    #[test]
    fn quarter_turn_swaps_the_footprint() {
        let r = TextSize::new(40.0, 10.0).rotated(-90.0);
        assert_relative_eq!(r.width, 10.0, epsilon = 1e-9);
        assert_relative_eq!(r.height, 40.0, epsilon = 1e-9);
    }
}
