use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{Accessor, DatumKey, PlotRect, Row};

pub const FACET_GAP_PX: f64 = 16.0;

/// Space reserved around the plot area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Area left inside `width × height` after the margins.
    #[must_use]
    pub fn inner(self, width: f64, height: f64) -> PlotRect {
        PlotRect::new(
            self.left,
            self.top,
            (width - self.left - self.right).max(0.0),
            (height - self.top - self.bottom).max(0.0),
        )
    }
}

/// Splits row positions by facet key, preserving first-seen facet order.
///
/// Without a facet accessor every row lands in one facet keyed `Missing`.
#[must_use]
pub fn partition_facets(rows: &[Row], facet: Option<&Accessor>) -> IndexMap<DatumKey, Vec<usize>> {
    let mut facets: IndexMap<DatumKey, Vec<usize>> = IndexMap::new();
    match facet {
        None => {
            facets.insert(DatumKey::Missing, (0..rows.len()).collect());
        }
        Some(accessor) => {
            for (index, row) in rows.iter().enumerate() {
                facets.entry(accessor.read(row).key()).or_default().push(index);
            }
        }
    }
    facets
}

/// Equal-width horizontal bands; a single facet spans the full width.
#[must_use]
pub fn facet_bands(count: usize, width: f64, gap: f64) -> Vec<(f64, f64)> {
    match count {
        0 => Vec::new(),
        1 => vec![(0.0, width)],
        n => {
            let band = ((width - gap * (n - 1) as f64) / n as f64).max(0.0);
            (0..n).map(|i| (i as f64 * (band + gap), band)).collect()
        }
    }
}
