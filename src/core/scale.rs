use serde::{Deserialize, Serialize};

use crate::core::{BucketStrategy, Datum};
use crate::error::{ChartError, ChartResult};

/// Stateless mapping from raw row values into the plot domain.
///
/// `Time` parses dates and is laid out as a discrete axis (one band per
/// distinct date); `Discrete` keeps values as categories; `Continuous`
/// requires numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    Time,
    #[default]
    Discrete,
    Continuous,
}

impl Scale {
    /// Maps a raw value into the scale's domain. Missing values stay missing.
    pub fn transform(self, raw: &Datum) -> ChartResult<Datum> {
        if raw.is_missing() {
            return Ok(Datum::Missing);
        }
        match self {
            Self::Time => Ok(Datum::Time(raw.to_time()?)),
            Self::Discrete => Ok(raw.clone()),
            Self::Continuous => raw.as_f64().map(Datum::Number).ok_or_else(|| {
                ChartError::InvalidData(format!(
                    "continuous scale expects numeric values, got `{raw}`"
                ))
            }),
        }
    }

    #[must_use]
    pub fn is_continuous(self) -> bool {
        matches!(self, Self::Continuous)
    }

    #[must_use]
    pub fn is_discrete(self) -> bool {
        !self.is_continuous()
    }

    /// Builds the bucket strategy for this scale from the full set of
    /// transformed values of the current render.
    pub fn buckets(self, values: &[Datum]) -> ChartResult<BucketStrategy> {
        match self {
            Self::Time => Ok(BucketStrategy::Time),
            Self::Discrete => Ok(BucketStrategy::Discrete),
            Self::Continuous => {
                let numbers: Vec<f64> = values.iter().filter_map(Datum::as_f64).collect();
                BucketStrategy::freedman_diaconis(&numbers)
            }
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Discrete => "discrete",
            Self::Continuous => "continuous",
        }
    }
}
