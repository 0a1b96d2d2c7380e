use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::Row;
use crate::error::{ChartError, ChartResult};

/// A single value read from a row by an accessor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Datum {
    Number(f64),
    Text(String),
    Time(DateTime<Utc>),
    #[default]
    Missing,
}

impl Datum {
    /// Converts a JSON value into a datum. Booleans become text, nested
    /// values are treated as missing.
    #[must_use]
    pub fn from_json(value: &Row) -> Self {
        match value {
            Row::Number(n) => n.as_f64().map_or(Self::Missing, Self::Number),
            Row::String(s) => Self::Text(s.clone()),
            Row::Bool(b) => Self::Text(b.to_string()),
            Row::Null | Row::Array(_) | Row::Object(_) => Self::Missing,
        }
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Numeric view of the datum. Times map to epoch milliseconds, numeric
    /// strings are parsed.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Time(t) => Some(t.timestamp_millis() as f64),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            Self::Missing => None,
        }
    }

    #[must_use]
    pub fn key(&self) -> DatumKey {
        match self {
            Self::Number(v) => DatumKey::Number(OrderedFloat(*v)),
            Self::Text(s) => DatumKey::Text(s.clone()),
            Self::Time(t) => DatumKey::Time(t.timestamp_millis()),
            Self::Missing => DatumKey::Missing,
        }
    }

    /// Parses the datum as a UTC timestamp.
    ///
    /// Accepts RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and numeric
    /// epoch milliseconds.
    pub fn to_time(&self) -> ChartResult<DateTime<Utc>> {
        match self {
            Self::Time(t) => Ok(*t),
            Self::Number(ms) => millis_to_time(*ms),
            Self::Text(s) => parse_time_text(s),
            Self::Missing => Err(ChartError::InvalidData(
                "missing value cannot be parsed as a time".to_owned(),
            )),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => f.write_str(&crate::core::format::format_number(*v)),
            Self::Text(s) => f.write_str(s),
            Self::Time(t) => write!(f, "{}", t.format("%Y-%m-%d")),
            Self::Missing => Ok(()),
        }
    }
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for Datum {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Time(value)
    }
}

/// Hashable, totally ordered identity of a [`Datum`].
///
/// Used for bucket keys, colour keys and facet keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DatumKey {
    Missing,
    Number(OrderedFloat<f64>),
    Time(i64),
    Text(String),
}

impl DatumKey {
    #[must_use]
    pub fn to_datum(&self) -> Datum {
        match self {
            Self::Missing => Datum::Missing,
            Self::Number(v) => Datum::Number(v.0),
            Self::Time(ms) => {
                DateTime::<Utc>::from_timestamp_millis(*ms).map_or(Datum::Missing, Datum::Time)
            }
            Self::Text(s) => Datum::Text(s.clone()),
        }
    }

    /// Label used for legends, series names and stable primitive keys.
    #[must_use]
    pub fn label(&self) -> String {
        self.to_datum().to_string()
    }
}

impl fmt::Display for DatumKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn millis_to_time(ms: f64) -> ChartResult<DateTime<Utc>> {
    if !ms.is_finite() {
        return Err(ChartError::InvalidData(
            "epoch milliseconds must be finite".to_owned(),
        ));
    }
    DateTime::<Utc>::from_timestamp_millis(ms.round() as i64).ok_or_else(|| {
        ChartError::InvalidData(format!("epoch milliseconds {ms} are out of range"))
    })
}

fn parse_time_text(text: &str) -> ChartResult<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Ok(t.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        && let Some(t) = d.and_hms_opt(0, 0, 0)
    {
        return Ok(t.and_utc());
    }
    if let Ok(ms) = text.parse::<f64>() {
        return millis_to_time(ms);
    }
    Err(ChartError::InvalidData(format!(
        "`{text}` is not a recognized date or time"
    )))
}

#[cfg(test)]
mod tests {
    use super::Datum;

    #[test]
    fn date_only_text_parses_to_midnight_utc() {
        let t = Datum::from("2024-03-05").to_time().expect("date");
        assert_eq!(t.format("%Y-%m-%dT%H:%M:%S").to_string(), "2024-03-05T00:00:00");
    }

    #[test]
    fn unparsable_text_is_invalid_data() {
        let err = Datum::from("yesterday").to_time().expect_err("must reject");
        assert!(format!("{err}").contains("yesterday"));
    }

    #[test]
    fn keys_order_numbers_numerically() {
        let a = Datum::Number(2.0).key();
        let b = Datum::Number(10.0).key();
        assert!(a < b);
    }
}
