use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Datum, DatumKey, PreparedPoint};
use crate::error::{ChartError, ChartResult};

/// Groups raw domain values into histogram-style buckets.
///
/// Built fresh from the complete dataset of one render so boundaries stay
/// fixed for the whole pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BucketStrategy {
    /// One bucket per distinct date.
    Time,
    /// One bucket per distinct value; consolidation sums the value channel.
    Discrete,
    /// Fixed-width numeric buckets; consolidation counts rows.
    Continuous { width: f64 },
}

/// One consolidated row: a single colour series inside one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRow {
    pub bucket: DatumKey,
    pub colour: DatumKey,
    /// Summed value, row count, or range end for ranged rows.
    pub value: f64,
    /// Range start for ranged rows, `0.0` otherwise.
    pub start: f64,
    pub ranged: bool,
    pub count: usize,
    /// Source row positions folded into this row.
    pub members: Vec<usize>,
}

impl BucketStrategy {
    /// Freedman–Diaconis strategy: `width = 2 · IQR · n^(-1/3)`.
    ///
    /// Fails with [`ChartError::DegenerateInput`] when the width is zero or
    /// not finite, which happens when the middle half of the values is
    /// constant.
    pub fn freedman_diaconis(values: &[f64]) -> ChartResult<Self> {
        let width = freedman_diaconis_width(values)?;
        debug!(width, samples = values.len(), "freedman-diaconis bucket width");
        Ok(Self::Continuous { width })
    }

    #[must_use]
    pub fn width(self) -> Option<f64> {
        match self {
            Self::Continuous { width } => Some(width),
            Self::Time | Self::Discrete => None,
        }
    }

    #[must_use]
    pub fn is_continuous(self) -> bool {
        matches!(self, Self::Continuous { .. })
    }

    /// Bucket key for one domain value.
    ///
    /// Continuous keys are `ceil(floor(v / w) · w + w)`; the other
    /// strategies key by the value itself.
    pub fn bucket(self, value: &Datum) -> ChartResult<DatumKey> {
        match self {
            Self::Time | Self::Discrete => Ok(value.key()),
            Self::Continuous { width } => {
                let v = value.as_f64().ok_or_else(|| {
                    ChartError::InvalidData(format!("cannot bucket non-numeric value `{value}`"))
                })?;
                let key = continuous_bucket_key(v, width)?;
                Ok(DatumKey::Number(OrderedFloat(key)))
            }
        }
    }

    /// Re-keys points by bucket and groups them.
    ///
    /// Discrete buckets keep first-seen order; time and continuous buckets
    /// are sorted ascending.
    pub fn group(
        self,
        points: Vec<PreparedPoint>,
    ) -> ChartResult<IndexMap<DatumKey, Vec<PreparedPoint>>> {
        let mut groups: IndexMap<DatumKey, Vec<PreparedPoint>> = IndexMap::new();
        for mut point in points {
            point.key = self.bucket(&point.x)?;
            groups.entry(point.key.clone()).or_default().push(point);
        }
        if !matches!(self, Self::Discrete) {
            groups.sort_keys();
        }
        Ok(groups)
    }

    /// Reduces every bucket to one row per colour series.
    ///
    /// Discrete and time buckets sum `y`, continuous buckets count rows.
    /// Ranged points (those carrying `y2`) reduce to the minimum start and
    /// maximum end instead. Colour order inside a bucket is first-seen.
    #[must_use]
    pub fn consolidate_buckets(
        self,
        groups: &IndexMap<DatumKey, Vec<PreparedPoint>>,
    ) -> Vec<BucketRow> {
        let mut out = Vec::new();
        for (bucket, points) in groups {
            let mut per_colour: IndexMap<&DatumKey, BucketRow> = IndexMap::new();
            for point in points {
                let row = per_colour.entry(&point.colour).or_insert_with(|| BucketRow {
                    bucket: bucket.clone(),
                    colour: point.colour.clone(),
                    value: 0.0,
                    start: 0.0,
                    ranged: false,
                    count: 0,
                    members: Vec::new(),
                });
                match (point.y, point.y2) {
                    (start, Some(end)) => {
                        let start = start.unwrap_or(0.0);
                        if row.ranged {
                            row.start = row.start.min(start);
                            row.value = row.value.max(end);
                        } else {
                            row.ranged = true;
                            row.start = start;
                            row.value = end;
                        }
                    }
                    (y, None) if !row.ranged => {
                        if self.is_continuous() {
                            row.value += 1.0;
                        } else {
                            row.value += y.unwrap_or(0.0);
                        }
                    }
                    (_, None) => {}
                }
                row.count += 1;
                row.members.push(point.index);
            }
            out.extend(per_colour.into_values());
        }
        out
    }
}

/// Interquartile range using linear interpolation between closest ranks.
#[must_use]
pub fn interquartile_range(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    percentile(&sorted, 0.75) - percentile(&sorted, 0.25)
}

pub fn freedman_diaconis_width(values: &[f64]) -> ChartResult<f64> {
    let finite = values.iter().filter(|v| v.is_finite()).count();
    if finite == 0 {
        return Err(ChartError::DegenerateInput(
            "cannot derive a bucket width from an empty value set".to_owned(),
        ));
    }
    let iqr = interquartile_range(values);
    let width = 2.0 * iqr * (finite as f64).powf(-1.0 / 3.0);
    if !width.is_finite() || width <= 0.0 {
        return Err(ChartError::DegenerateInput(format!(
            "freedman-diaconis width is {width} (interquartile range {iqr} over {finite} values)"
        )));
    }
    Ok(width)
}

fn continuous_bucket_key(value: f64, width: f64) -> ChartResult<f64> {
    if !width.is_finite() || width <= 0.0 {
        return Err(ChartError::DegenerateInput(format!(
            "bucket width must be finite and > 0, got {width}"
        )));
    }
    if !value.is_finite() {
        return Err(ChartError::DegenerateInput(format!(
            "cannot bucket non-finite value {value}"
        )));
    }
    Ok(((value / width).floor() * width + width).ceil())
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let index = p * (n - 1) as f64;
            let lower = index.floor() as usize;
            let upper = (index.ceil() as usize).min(n - 1);
            let frac = index - lower as f64;
            sorted[lower] * (1.0 - frac) + sorted[upper] * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{BucketStrategy, interquartile_range};
    use crate::core::{Datum, DatumKey};
    use crate::error::ChartError;

    #[test]
    fn quartiles_interpolate_between_ranks() {
        assert_relative_eq!(interquartile_range(&[1.0, 2.0, 2.0, 3.0, 100.0]), 1.0);
        assert_relative_eq!(interquartile_range(&[1.0, 2.0, 3.0, 4.0]), 1.5);
    }

    #[test]
    fn constant_values_are_degenerate() {
        let err = BucketStrategy::freedman_diaconis(&[4.0, 4.0, 4.0]).expect_err("zero width");
        assert!(matches!(err, ChartError::DegenerateInput(_)));
    }

    #[test]
    fn continuous_keys_are_upper_bucket_edges() {
        let strategy = BucketStrategy::Continuous { width: 10.0 };
        let key = strategy.bucket(&Datum::Number(12.0)).expect("key");
        assert_eq!(key, Datum::Number(20.0).key());
        let key = strategy.bucket(&Datum::Number(0.0)).expect("key");
        assert_eq!(key, Datum::Number(10.0).key());
    }

    #[test]
    fn discrete_keys_are_the_value() {
        let key = BucketStrategy::Discrete
            .bucket(&Datum::from("A"))
            .expect("key");
        assert_eq!(key, DatumKey::Text("A".into()));
    }
}
