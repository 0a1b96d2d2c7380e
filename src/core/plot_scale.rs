use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::core::{Datum, DatumKey};
use crate::error::{ChartError, ChartResult};

const DEFAULT_BAND_PADDING: f64 = 0.1;

/// Categorical scale splitting a pixel range into equal bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandScale {
    domain: IndexSet<DatumKey>,
    range: (f64, f64),
    padding_inner: f64,
    padding_outer: f64,
}

impl BandScale {
    #[must_use]
    pub fn new(domain: impl IntoIterator<Item = DatumKey>, range: (f64, f64)) -> Self {
        Self {
            domain: domain.into_iter().collect(),
            range,
            padding_inner: DEFAULT_BAND_PADDING,
            padding_outer: DEFAULT_BAND_PADDING,
        }
    }

    #[must_use]
    pub fn with_padding(mut self, inner: f64, outer: f64) -> Self {
        self.padding_inner = inner.clamp(0.0, 1.0);
        self.padding_outer = outer.max(0.0);
        self
    }

    #[must_use]
    pub fn with_range(mut self, range: (f64, f64)) -> Self {
        self.range = range;
        self
    }

    #[must_use]
    pub fn domain(&self) -> Vec<DatumKey> {
        self.domain.iter().cloned().collect()
    }

    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.domain.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domain.is_empty()
    }

    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        let n = self.domain.len() as f64;
        if n <= 0.0 {
            return 0.0;
        }
        let span = (self.range.1 - self.range.0).abs();
        let denom = n + self.padding_inner * (n - 1.0) + 2.0 * self.padding_outer;
        if denom <= 0.0 { 0.0 } else { span / denom }
    }

    /// Distance between the starts of two adjacent bands.
    #[must_use]
    pub fn step(&self) -> f64 {
        self.bandwidth() * (1.0 + self.padding_inner)
    }

    /// Left edge of the band for `key`.
    #[must_use]
    pub fn position(&self, key: &DatumKey) -> Option<f64> {
        let index = self.domain.get_index_of(key)?;
        let bw = self.bandwidth();
        let start = self.range.0.min(self.range.1);
        Some(start + bw * self.padding_outer + self.step() * index as f64)
    }

    /// Centre of the band for `key`.
    #[must_use]
    pub fn center(&self, key: &DatumKey) -> Option<f64> {
        self.position(key).map(|x| x + self.bandwidth() / 2.0)
    }
}

/// Numeric scale mapping a domain interval onto a pixel interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> ChartResult<Self> {
        if !domain.0.is_finite() || !domain.1.is_finite() {
            return Err(ChartError::DegenerateInput(
                "linear scale domain must be finite".to_owned(),
            ));
        }
        if !range.0.is_finite() || !range.1.is_finite() {
            return Err(ChartError::DegenerateInput(
                "linear scale range must be finite".to_owned(),
            ));
        }
        Ok(Self { domain, range })
    }

    /// Scale spanning `values`, optionally forced to include zero.
    ///
    /// A single repeated value is widened so the domain is never empty.
    pub fn from_values(
        values: impl IntoIterator<Item = f64>,
        include_zero: bool,
        range: (f64, f64),
    ) -> ChartResult<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values.into_iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
        }
        if min > max {
            (min, max) = (0.0, 1.0);
        }
        if include_zero {
            min = min.min(0.0);
            max = max.max(0.0);
        }
        if min == max {
            if min == 0.0 {
                max = 1.0;
            } else {
                let pad = min.abs() * 0.5;
                min -= pad;
                max += pad;
            }
        }
        Self::new((min, max), range)
    }

    /// Extends the domain outwards to round tick values.
    #[must_use]
    pub fn nice(mut self, tick_count: usize) -> Self {
        let ticks = nice_ticks(self.domain.0, self.domain.1, tick_count);
        if let (Some(first), Some(last)) = (ticks.first(), ticks.last())
            && first < last
        {
            self.domain = (*first, *last);
        }
        self
    }

    #[must_use]
    pub fn with_range(mut self, range: (f64, f64)) -> Self {
        self.range = range;
        self
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        self.domain
    }

    #[must_use]
    pub fn range(self) -> (f64, f64) {
        self.range
    }

    #[must_use]
    pub fn map(self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 {
            return r0;
        }
        r0 + (value - d0) / span * (r1 - r0)
    }

    #[must_use]
    pub fn invert(self, pixel: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = r1 - r0;
        if span == 0.0 {
            return d0;
        }
        d0 + (pixel - r0) / span * (d1 - d0)
    }

    #[must_use]
    pub fn ticks(self, count: usize) -> Vec<f64> {
        let (lo, hi) = (self.domain.0.min(self.domain.1), self.domain.0.max(self.domain.1));
        nice_ticks(lo, hi, count)
            .into_iter()
            .filter(|t| *t >= lo - 1e-9 && *t <= hi + 1e-9)
            .collect()
    }
}

/// Axis scale as seen by geometries and the axis layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlotScale {
    Band(BandScale),
    Linear(LinearScale),
}

impl PlotScale {
    /// Pixel position of a value: band start for band scales.
    #[must_use]
    pub fn position(&self, value: &Datum) -> Option<f64> {
        match self {
            Self::Band(band) => band.position(&value.key()),
            Self::Linear(linear) => value.as_f64().map(|v| linear.map(v)),
        }
    }

    /// Pixel position of the visual centre of a value.
    #[must_use]
    pub fn center(&self, value: &Datum) -> Option<f64> {
        match self {
            Self::Band(band) => band.center(&value.key()),
            Self::Linear(linear) => value.as_f64().map(|v| linear.map(v)),
        }
    }

    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        match self {
            Self::Band(band) => band.bandwidth(),
            Self::Linear(_) => 0.0,
        }
    }

    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        match self {
            Self::Band(band) => band.range(),
            Self::Linear(linear) => linear.range(),
        }
    }

    #[must_use]
    pub fn with_range(self, range: (f64, f64)) -> Self {
        match self {
            Self::Band(band) => Self::Band(band.with_range(range)),
            Self::Linear(linear) => Self::Linear(linear.with_range(range)),
        }
    }

    #[must_use]
    pub fn as_linear(&self) -> Option<LinearScale> {
        match self {
            Self::Linear(linear) => Some(*linear),
            Self::Band(_) => None,
        }
    }

    /// Tick values paired with their centre position in pixels.
    #[must_use]
    pub fn ticks(&self, count: usize) -> Vec<(Datum, f64)> {
        match self {
            Self::Band(band) => band
                .domain
                .iter()
                .filter_map(|key| band.center(key).map(|px| (key.to_datum(), px)))
                .collect(),
            Self::Linear(linear) => linear
                .ticks(count)
                .into_iter()
                .map(|v| (Datum::Number(v), linear.map(v)))
                .collect(),
        }
    }
}

/// Round tick values covering `[min, max]` with roughly `count` steps.
#[must_use]
pub fn nice_ticks(mut min: f64, mut max: f64, count: usize) -> Vec<f64> {
    if count == 0 || !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }
    if min == max {
        return vec![min];
    }
    if min > max {
        std::mem::swap(&mut min, &mut max);
    }
    let step = nice_step((max - min) / count as f64);
    if step == 0.0 {
        return vec![min, max];
    }
    let start = (min / step).floor() * step;
    let stop = (max / step).ceil() * step;
    let n = ((stop - start) / step).round().clamp(0.0, 10_000.0) as usize;
    (0..=n).map(|i| start + step * i as f64).collect()
}

fn nice_step(step: f64) -> f64 {
    if !step.is_finite() || step <= 0.0 {
        return 0.0;
    }
    let base = 10_f64.powf(step.log10().floor());
    let error = step / base;
    let nice = if error >= 7.5 {
        10.0
    } else if error >= 3.5 {
        5.0
    } else if error >= 1.5 {
        2.0
    } else {
        1.0
    };
    nice * base
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{BandScale, LinearScale, nice_ticks};
    use crate::core::DatumKey;

    #[test]
    fn nice_ticks_cover_the_domain() {
        assert_eq!(nice_ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        let ticks = nice_ticks(0.3, 9.2, 5);
        assert_relative_eq!(ticks[0], 0.0);
        assert_relative_eq!(*ticks.last().expect("last"), 10.0);
    }

    #[test]
    fn band_positions_follow_domain_order() {
        let band = BandScale::new(
            [DatumKey::Text("A".into()), DatumKey::Text("B".into())],
            (0.0, 230.0),
        );
        let a = band.position(&DatumKey::Text("A".into())).expect("a");
        let b = band.position(&DatumKey::Text("B".into())).expect("b");
        assert!(a < b);
        assert_relative_eq!(band.bandwidth(), 100.0);
        assert_relative_eq!(b - a, band.step());
    }

    #[test]
    fn linear_scale_maps_and_inverts() {
        let scale = LinearScale::from_values([5.0, 10.0], true, (100.0, 0.0))
            .expect("scale")
            .nice(5);
        assert_eq!(scale.domain(), (0.0, 10.0));
        assert_relative_eq!(scale.map(5.0), 50.0);
        assert_relative_eq!(scale.invert(25.0), 7.5);
    }
}
