use indexmap::IndexMap;
use tracing::trace;

use crate::core::{Accessor, Datum, DatumKey, Row, Scale};
use crate::error::{ChartError, ChartResult};

/// Fully resolved accessor set for one geometry.
///
/// Produced by the option resolver after the geometry → chart → built-in
/// fallback chain has been applied.
#[derive(Debug, Clone)]
pub struct Encoding {
    pub x: Accessor,
    pub y: Accessor,
    pub x2: Option<Accessor>,
    pub y2: Option<Accessor>,
    pub colour: Option<Accessor>,
    pub size: Option<Accessor>,
}

/// A row annotated with every derived coordinate a geometry needs.
///
/// Rebuilt on every render; nothing here survives between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPoint {
    /// Position of the source row in the chart's data.
    pub index: usize,
    pub row: Row,
    pub x: Datum,
    pub y: Option<f64>,
    pub x2: Option<Datum>,
    pub y2: Option<f64>,
    pub colour: DatumKey,
    pub size: Option<f64>,
    /// Grouping key: the colour key, or the bucket key once bucketed.
    pub key: DatumKey,
}

impl PreparedPoint {
    #[must_use]
    pub fn is_ranged(&self) -> bool {
        self.y2.is_some()
    }
}

/// Reads every accessor for the given rows and maps x through `x_scale`.
///
/// Rows whose x value is missing are skipped. `default_colour` is used as
/// the series key when no colour accessor is configured.
pub fn prepare_points(
    rows: &[(usize, &Row)],
    encoding: &Encoding,
    x_scale: Scale,
    default_colour: &DatumKey,
) -> ChartResult<Vec<PreparedPoint>> {
    let mut points = Vec::with_capacity(rows.len());
    for &(index, row) in rows {
        let x = x_scale.transform(&encoding.x.read(row))?;
        if x.is_missing() {
            trace!(index, "skipping row without x value");
            continue;
        }
        let y = numeric(&encoding.y.read(row), "y")?;
        let x2 = match &encoding.x2 {
            Some(accessor) => {
                let value = x_scale.transform(&accessor.read(row))?;
                (!value.is_missing()).then_some(value)
            }
            None => None,
        };
        let y2 = match &encoding.y2 {
            Some(accessor) => numeric(&accessor.read(row), "y2")?,
            None => None,
        };
        let colour = encoding
            .colour
            .as_ref()
            .map_or_else(|| default_colour.clone(), |accessor| accessor.read(row).key());
        let size = match &encoding.size {
            Some(accessor) => numeric(&accessor.read(row), "size")?,
            None => None,
        };

        points.push(PreparedPoint {
            index,
            row: row.clone(),
            x,
            y,
            x2,
            y2,
            key: colour.clone(),
            colour,
            size,
        });
    }
    Ok(points)
}

/// Groups points by their `key`, preserving first-seen key order.
#[must_use]
pub fn group_by_key(points: Vec<PreparedPoint>) -> IndexMap<DatumKey, Vec<PreparedPoint>> {
    let mut groups: IndexMap<DatumKey, Vec<PreparedPoint>> = IndexMap::new();
    for point in points {
        groups.entry(point.key.clone()).or_default().push(point);
    }
    groups
}

/// Distinct colour keys in first-seen order.
#[must_use]
pub fn colour_domain(points: &[PreparedPoint]) -> Vec<DatumKey> {
    let mut seen: IndexMap<DatumKey, ()> = IndexMap::new();
    for point in points {
        seen.entry(point.colour.clone()).or_insert(());
    }
    seen.into_keys().collect()
}

fn numeric(value: &Datum, channel: &str) -> ChartResult<Option<f64>> {
    if value.is_missing() {
        return Ok(None);
    }
    match value.as_f64() {
        Some(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(ChartError::InvalidData(format!(
            "{channel} channel expects a finite number, got `{value}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Encoding, colour_domain, group_by_key, prepare_points};
    use crate::core::{DatumKey, Scale, accessor};

    fn encoding() -> Encoding {
        Encoding {
            x: accessor::field("x").expect("x"),
            y: accessor::field("y").expect("y"),
            x2: None,
            y2: None,
            colour: Some(accessor::field("c").expect("c")),
            size: None,
        }
    }

    #[test]
    fn grouping_keeps_first_seen_order() {
        let rows = [
            json!({"x": "a", "y": 1, "c": "blue"}),
            json!({"x": "b", "y": 2, "c": "red"}),
            json!({"x": "c", "y": 3, "c": "blue"}),
        ];
        let indexed: Vec<_> = rows.iter().enumerate().collect();
        let points = prepare_points(
            &indexed,
            &encoding(),
            Scale::Discrete,
            &DatumKey::Text("s".into()),
        )
        .expect("prepare");

        assert_eq!(
            colour_domain(&points),
            vec![DatumKey::Text("blue".into()), DatumKey::Text("red".into())]
        );
        let groups = group_by_key(points);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn rows_without_x_are_skipped_and_bad_y_is_rejected() {
        let rows = [json!({"y": 1}), json!({"x": "a", "y": 2})];
        let indexed: Vec<_> = rows.iter().enumerate().collect();
        let points = prepare_points(
            &indexed,
            &encoding(),
            Scale::Discrete,
            &DatumKey::Text("s".into()),
        )
        .expect("prepare");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].index, 1);

        let bad = [json!({"x": "a", "y": "tall"})];
        let indexed: Vec<_> = bad.iter().enumerate().collect();
        assert!(
            prepare_points(
                &indexed,
                &encoding(),
                Scale::Discrete,
                &DatumKey::Text("s".into())
            )
            .is_err()
        );
    }
}
