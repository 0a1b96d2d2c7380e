use indexmap::IndexSet;

use crate::core::DatumKey;
use crate::render::{
    CanvasLayerKind, Color, Fill, RectPrimitive, Surface, TextHAlign, TextMeasurer, TextPrimitive,
};

const SWATCH_GAP_PX: f64 = 6.0;
const COLUMN_GAP_PX: f64 = 16.0;
const ROW_HEIGHT_EM: f64 = 1.6;

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub key: DatumKey,
    pub label: String,
    pub fill: Fill,
}

/// Union of colour domains in first-seen order.
#[must_use]
pub fn legend_domain<'a>(domains: impl IntoIterator<Item = &'a [DatumKey]>) -> Vec<DatumKey> {
    let mut seen = IndexSet::new();
    for domain in domains {
        for key in domain {
            seen.insert(key.clone());
        }
    }
    seen.into_iter().collect()
}

/// Equal-width column grid filled row by row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendLayout {
    pub columns: usize,
    pub rows: usize,
    pub column_width: f64,
    pub row_height: f64,
    pub font_size: f64,
}

impl LegendLayout {
    /// Sizes the grid for `entries` within `width`.
    #[must_use]
    pub fn measure(
        entries: &[LegendEntry],
        width: f64,
        font_size: f64,
        measurer: &dyn TextMeasurer,
        font_family: &str,
    ) -> Self {
        let widest = entries
            .iter()
            .map(|e| measurer.measure(&e.label, font_family, font_size).width)
            .fold(0.0, f64::max);
        let column_width = font_size + SWATCH_GAP_PX + widest + COLUMN_GAP_PX;
        let columns = if entries.is_empty() {
            0
        } else {
            ((width / column_width).floor() as usize).clamp(1, entries.len())
        };
        let rows = if columns == 0 {
            0
        } else {
            entries.len().div_ceil(columns)
        };
        Self {
            columns,
            rows,
            column_width,
            row_height: font_size * ROW_HEIGHT_EM,
            font_size,
        }
    }

    #[must_use]
    pub fn height(self) -> f64 {
        self.rows as f64 * self.row_height
    }

    /// Top-left corner of entry `index`.
    #[must_use]
    pub fn position(self, index: usize) -> (f64, f64) {
        if self.columns == 0 {
            return (0.0, 0.0);
        }
        let column = index % self.columns;
        let row = index / self.columns;
        (column as f64 * self.column_width, row as f64 * self.row_height)
    }
}

/// Draws one swatch and label per entry at its grid position.
pub fn draw_legend(
    surface: &mut Surface<'_>,
    entries: &[LegendEntry],
    layout: LegendLayout,
    text_color: Color,
) {
    let swatch = layout.font_size;
    for (index, entry) in entries.iter().enumerate() {
        let (x, y) = layout.position(index);
        let key = format!("legend/{}", entry.key.label());
        let swatch_y = y + (layout.row_height - swatch) / 2.0;
        surface.push(
            format!("{key}/swatch"),
            "legend",
            CanvasLayerKind::Legend,
            RectPrimitive::new(x, swatch_y, swatch, swatch, entry.fill.clone()),
        );
        if !entry.label.is_empty() {
            surface.push(
                format!("{key}/label"),
                "legend",
                CanvasLayerKind::Legend,
                TextPrimitive::new(
                    entry.label.as_str(),
                    x + swatch + SWATCH_GAP_PX,
                    y + layout.row_height / 2.0,
                    layout.font_size,
                    text_color,
                    TextHAlign::Left,
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LegendEntry, LegendLayout, legend_domain};
    use crate::core::DatumKey;
    use crate::render::{Color, Fill, HeuristicTextMeasurer};

    fn entry(label: &str) -> LegendEntry {
        LegendEntry {
            key: DatumKey::Text(label.to_owned()),
            label: label.to_owned(),
            fill: Fill::Solid(Color::BLACK),
        }
    }

    #[test]
    fn domain_union_keeps_first_seen_order() {
        let a = [DatumKey::Text("x".into()), DatumKey::Text("y".into())];
        let b = [DatumKey::Text("z".into()), DatumKey::Text("x".into())];
        let union = legend_domain([&a[..], &b[..]]);
        assert_eq!(
            union,
            vec![
                DatumKey::Text("x".into()),
                DatumKey::Text("y".into()),
                DatumKey::Text("z".into())
            ]
        );
    }

    #[test]
    fn entries_wrap_into_rows() {
        let entries: Vec<_> = ["alpha", "beta", "gamma", "delta", "epsilon"]
            .into_iter()
            .map(entry)
            .collect();
        let layout = LegendLayout::measure(&entries, 200.0, 10.0, &HeuristicTextMeasurer, "sans");
        assert!(layout.columns >= 1 && layout.columns < entries.len());
        assert_eq!(layout.rows, entries.len().div_ceil(layout.columns));
        assert!((layout.height() - layout.rows as f64 * 16.0).abs() < 1e-9);
        let (x1, y1) = layout.position(1);
        assert!(x1 > 0.0 && y1 == 0.0);
    }
}
