use tracing::warn;

use crate::core::format::is_zero_label;
use crate::render::{Color, Primitive, Surface};

/// Smallest font size a data label may shrink to.
pub const LABEL_FONT_FLOOR_PX: f64 = 8.0;
/// Labels may exceed the available space by this factor before shrinking.
pub const SHRINK_TOLERANCE: f64 = 1.05;
/// CIELAB lightness under which a fill counts as dark.
pub const DARK_FILL_LIGHTNESS: f64 = 60.0;

/// Outcome of the single-shot shrink-to-fit pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelFit {
    Keep,
    Shrink { font_size: f64 },
    Remove,
}

/// Decides one font size for a whole label set from its largest member.
#[must_use]
pub fn shrink_to_fit(largest: f64, available: f64, base_font_size: f64) -> LabelFit {
    if !largest.is_finite() || largest <= 0.0 {
        return LabelFit::Keep;
    }
    if !available.is_finite() || available <= 0.0 {
        return LabelFit::Remove;
    }
    if largest <= available * SHRINK_TOLERANCE {
        return LabelFit::Keep;
    }
    let font_size = base_font_size * (available / largest);
    if font_size < LABEL_FONT_FLOOR_PX {
        LabelFit::Remove
    } else {
        LabelFit::Shrink { font_size }
    }
}

/// Measures the labels under `prefix` on `surface` and shrinks or removes
/// them so the widest fits in `available` pixels.
pub fn fit_labels(
    surface: &mut Surface<'_>,
    prefix: &str,
    available: f64,
    base_font_size: f64,
) -> LabelFit {
    let measurer = surface.measurer();
    let family = surface.font_family().to_owned();
    let largest = surface
        .items()
        .iter()
        .filter(|entry| entry.item.key.starts_with(prefix))
        .filter_map(|entry| entry.item.primitive.as_text())
        .map(|text| measurer.measure(&text.text, &family, text.font_size_px).width)
        .fold(0.0, f64::max);

    let fit = shrink_to_fit(largest, available, base_font_size);
    match fit {
        LabelFit::Keep => {}
        LabelFit::Shrink { font_size } => {
            for item in surface.items_with_prefix_mut(prefix) {
                if let Primitive::Text(text) = &mut item.primitive {
                    text.font_size_px = font_size;
                }
            }
        }
        LabelFit::Remove => {
            let removed = surface.remove_with_prefix(prefix);
            warn!(
                prefix,
                removed,
                available,
                largest,
                "labels dropped: shrunk font would fall below the legibility floor"
            );
        }
    }
    fit
}

/// Colours used for data labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPalette {
    pub dark: Color,
    pub light: Color,
    pub muted: Color,
}

impl Default for LabelPalette {
    fn default() -> Self {
        Self {
            dark: Color::rgb(0.2, 0.2, 0.2),
            light: Color::WHITE,
            muted: Color::rgb(0.6, 0.6, 0.6),
        }
    }
}

/// Contrast-aware label colour.
///
/// Literal zero labels are always muted; labels drawn inside a dark fill
/// switch to the light colour.
#[must_use]
pub fn label_colour(text: &str, fill: Color, inside: bool, palette: LabelPalette) -> Color {
    if is_zero_label(text) {
        palette.muted
    } else if inside && fill.lightness() < DARK_FILL_LIGHTNESS {
        palette.light
    } else {
        palette.dark
    }
}

#[cfg(test)]
mod tests {
    use super::{LabelFit, LabelPalette, label_colour, shrink_to_fit};
    use crate::render::Color;

    #[test]
    fn labels_within_tolerance_are_kept() {
        assert_eq!(shrink_to_fit(10.4, 10.0, 12.0), LabelFit::Keep);
    }

    #[test]
    fn moderate_overflow_shrinks_once() {
        match shrink_to_fit(20.0, 15.0, 12.0) {
            LabelFit::Shrink { font_size } => assert!((font_size - 9.0).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn below_floor_removes_instead_of_shrinking() {
        assert_eq!(shrink_to_fit(37.2, 10.0, 12.0), LabelFit::Remove);
    }

    #[test]
    fn zero_labels_are_muted_and_dark_fills_invert() {
        let palette = LabelPalette::default();
        let navy = Color::rgb(0.0, 0.0, 0.4);
        assert_eq!(label_colour("0%", navy, true, palette), palette.muted);
        assert_eq!(label_colour("12", navy, true, palette), palette.light);
        assert_eq!(label_colour("12", navy, false, palette), palette.dark);
        assert_eq!(label_colour("12", Color::WHITE, true, palette), palette.dark);
    }
}
