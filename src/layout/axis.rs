use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{Datum, Formatter, PlotRect, PlotScale};
use crate::render::{
    CanvasLayerKind, Color, LinePrimitive, Surface, TextHAlign, TextMeasurer, TextPrimitive,
    TextSize,
};

pub const TICK_SIZE_PX: f64 = 6.0;
pub const TICK_LABEL_GAP_PX: f64 = 3.0;
pub const TILTED_ROTATION_DEG: f64 = -30.0;
pub const VERTICAL_ROTATION_DEG: f64 = -90.0;
/// Font scale applied when labels are turned vertical.
pub const VERTICAL_FONT_SCALE: f64 = 0.85;
/// Target spacing between value-axis ticks.
pub const VALUE_AXIS_TARGET_SPACING_PX: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisPosition {
    Bottom,
    Left,
    Right,
}

/// Step of the rotation fallback ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LabelRotation {
    Horizontal,
    Tilted,
    Vertical,
}

impl LabelRotation {
    #[must_use]
    pub fn degrees(self) -> f64 {
        match self {
            Self::Horizontal => 0.0,
            Self::Tilted => TILTED_ROTATION_DEG,
            Self::Vertical => VERTICAL_ROTATION_DEG,
        }
    }
}

/// Horizontal if the widest label fits, tilted if not, vertical once the
/// label is at least twice the available width.
#[must_use]
pub fn choose_rotation(widest: f64, available: f64) -> LabelRotation {
    if widest <= available {
        LabelRotation::Horizontal
    } else if widest >= 2.0 * available {
        LabelRotation::Vertical
    } else {
        LabelRotation::Tilted
    }
}

/// One candidate tick with its formatted label.
#[derive(Debug, Clone, PartialEq)]
pub struct TickLabel {
    pub value: Datum,
    pub position: f64,
    pub text: String,
}

/// Greedy, leftmost-anchored overlap removal.
///
/// Ticks are visited in position order and kept only when they sit at
/// least `footprint` pixels past the last kept tick. The result depends on
/// visiting order and is intentionally not a globally optimal packing.
#[must_use]
pub fn remove_overlapping_ticks(mut ticks: Vec<TickLabel>, footprint: f64) -> Vec<TickLabel> {
    ticks.sort_by(|a, b| a.position.total_cmp(&b.position));
    if ticks.len() <= 1 || !footprint.is_finite() || footprint <= 0.0 {
        return ticks;
    }
    let mut kept: Vec<TickLabel> = Vec::with_capacity(ticks.len());
    for tick in ticks {
        match kept.last() {
            Some(last) if tick.position < last.position + footprint => {
                trace!(text = %tick.text, "tick removed to avoid overlap");
            }
            _ => kept.push(tick),
        }
    }
    kept
}

/// Inputs for drawing one axis.
#[derive(Debug, Clone)]
pub struct AxisSpec<'a> {
    pub position: AxisPosition,
    pub scale: &'a PlotScale,
    pub formatter: &'a Formatter,
    pub font_size: f64,
    /// Length of the axis in pixels.
    pub length: f64,
    /// Draw grid lines of this length across the plot (value axes only).
    pub grid_length: Option<f64>,
    pub color: Color,
    pub key: &'a str,
}

/// What the axis ended up drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisOutcome {
    pub rotation: LabelRotation,
    pub font_size: f64,
    pub ticks: Vec<TickLabel>,
}

/// Candidate ticks of a scale formatted for display.
#[must_use]
pub fn tick_labels(scale: &PlotScale, formatter: &Formatter, length: f64) -> Vec<TickLabel> {
    let count = ((length / VALUE_AXIS_TARGET_SPACING_PX).floor() as usize).clamp(2, 10);
    let mut seen = HashSet::new();
    scale
        .ticks(count)
        .into_iter()
        .map(|(value, position)| TickLabel {
            text: formatter.format(&value),
            value,
            position,
        })
        // identical texts would share an element key
        .filter(|tick| !tick.text.is_empty() && seen.insert(tick.text.clone()))
        .collect()
}

/// Rotation, font size and per-label footprint for the bottom axis.
fn bottom_label_layout(
    ticks: &[TickLabel],
    scale: &PlotScale,
    length: f64,
    font_size: f64,
    measure: impl Fn(&str, f64) -> TextSize,
) -> (LabelRotation, f64, f64) {
    let available = match scale {
        PlotScale::Band(band) => band.step(),
        PlotScale::Linear(_) => length / ticks.len().max(1) as f64,
    };
    let widest = ticks
        .iter()
        .map(|t| measure(&t.text, font_size).width)
        .fold(0.0, f64::max);
    let rotation = choose_rotation(widest, available);
    let font_size = if rotation == LabelRotation::Vertical {
        font_size * VERTICAL_FONT_SCALE
    } else {
        font_size
    };
    let footprint = ticks
        .iter()
        .map(|t| measure(&t.text, font_size).rotated(rotation.degrees()).width)
        .fold(0.0, f64::max);
    (rotation, font_size, footprint)
}

/// Draws an axis onto `surface`, whose origin is the axis baseline start
/// (bottom-left corner of the plot for a bottom axis, top-left or top-right
/// for a vertical axis).
pub fn draw_axis(surface: &mut Surface<'_>, spec: &AxisSpec<'_>) -> AxisOutcome {
    let measurer: &dyn TextMeasurer = surface.measurer();
    let family = surface.font_family().to_owned();
    let measure = |text: &str, size: f64| measurer.measure(text, &family, size);
    let candidates = tick_labels(spec.scale, spec.formatter, spec.length);
    let group = format!("{}:axis", spec.key);

    let (rotation, font_size, footprint) = match spec.position {
        AxisPosition::Bottom => {
            bottom_label_layout(&candidates, spec.scale, spec.length, spec.font_size, measure)
        }
        AxisPosition::Left | AxisPosition::Right => {
            (LabelRotation::Horizontal, spec.font_size, measure("0", spec.font_size).height)
        }
    };
    let ticks = remove_overlapping_ticks(candidates, footprint);

    let domain_line = match spec.position {
        AxisPosition::Bottom => LinePrimitive::new(0.0, 0.0, spec.length, 0.0, 1.0, spec.color),
        AxisPosition::Left | AxisPosition::Right => {
            LinePrimitive::new(0.0, 0.0, 0.0, spec.length, 1.0, spec.color)
        }
    };
    surface.push(
        format!("{}/domain", spec.key),
        group.clone(),
        CanvasLayerKind::Axis,
        domain_line,
    );

    for tick in &ticks {
        let tick_key = format!("{}/tick/{}", spec.key, tick.text);
        let p = tick.position;
        let (line, label) = match spec.position {
            AxisPosition::Bottom => {
                let text_y = TICK_SIZE_PX + TICK_LABEL_GAP_PX;
                let label = match rotation {
                    LabelRotation::Horizontal => TextPrimitive::new(
                        tick.text.as_str(),
                        p,
                        text_y + font_size / 2.0,
                        font_size,
                        spec.color,
                        TextHAlign::Center,
                    ),
                    LabelRotation::Tilted | LabelRotation::Vertical => TextPrimitive::new(
                        tick.text.as_str(),
                        p,
                        text_y,
                        font_size,
                        spec.color,
                        TextHAlign::Right,
                    )
                    .with_rotation(rotation.degrees()),
                };
                (LinePrimitive::new(p, 0.0, p, TICK_SIZE_PX, 1.0, spec.color), label)
            }
            AxisPosition::Left => (
                LinePrimitive::new(-TICK_SIZE_PX, p, 0.0, p, 1.0, spec.color),
                TextPrimitive::new(
                    tick.text.as_str(),
                    -(TICK_SIZE_PX + TICK_LABEL_GAP_PX),
                    p,
                    font_size,
                    spec.color,
                    TextHAlign::Right,
                ),
            ),
            AxisPosition::Right => (
                LinePrimitive::new(0.0, p, TICK_SIZE_PX, p, 1.0, spec.color),
                TextPrimitive::new(
                    tick.text.as_str(),
                    TICK_SIZE_PX + TICK_LABEL_GAP_PX,
                    p,
                    font_size,
                    spec.color,
                    TextHAlign::Left,
                ),
            ),
        };
        surface.push(format!("{tick_key}/line"), group.clone(), CanvasLayerKind::Axis, line);
        surface.push(format!("{tick_key}/label"), group.clone(), CanvasLayerKind::Axis, label);

        if let Some(grid) = spec.grid_length {
            let x2 = if spec.position == AxisPosition::Right { -grid } else { grid };
            surface.push(
                format!("{tick_key}/grid"),
                group.clone(),
                CanvasLayerKind::Grid,
                LinePrimitive::new(0.0, p, x2, p, 1.0, spec.color.with_alpha(0.15)),
            );
        }
    }

    AxisOutcome {
        rotation,
        font_size,
        ticks,
    }
}

/// Offscreen measurement pass: draws the axis onto a detached surface and
/// returns its bounds relative to the axis origin.
#[must_use]
pub fn measure_axis(measurer: &dyn TextMeasurer, font_family: &str, spec: &AxisSpec<'_>) -> PlotRect {
    let mut scratch = Surface::offscreen(measurer, font_family, spec.length, spec.length);
    let spec = AxisSpec {
        grid_length: None,
        ..spec.clone()
    };
    draw_axis(&mut scratch, &spec);
    scratch.bounds().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{LabelRotation, TickLabel, choose_rotation, remove_overlapping_ticks};
    use crate::core::Datum;

    fn tick(position: f64) -> TickLabel {
        TickLabel {
            value: Datum::Number(position),
            position,
            text: format!("{position}"),
        }
    }

    #[test]
    fn rotation_ladder_steps() {
        assert_eq!(choose_rotation(30.0, 40.0), LabelRotation::Horizontal);
        assert_eq!(choose_rotation(50.0, 40.0), LabelRotation::Tilted);
        assert_eq!(choose_rotation(80.0, 40.0), LabelRotation::Vertical);
    }

    #[test]
    fn greedy_removal_favours_leftmost_ticks() {
        let kept = remove_overlapping_ticks(vec![tick(30.0), tick(0.0), tick(10.0), tick(25.0)], 20.0);
        let positions: Vec<f64> = kept.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0.0, 25.0]);
    }
}
