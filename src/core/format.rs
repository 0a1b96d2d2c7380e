use chrono::{DateTime, Utc};

use crate::core::Datum;

/// Formats a number for axis ticks and value labels.
///
/// Integers are printed without decimals; other values keep up to two
/// decimals with trailing zeros trimmed.
#[must_use]
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "nan".to_owned();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{value:.0}");
    }
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_owned()
    } else {
        text.to_owned()
    }
}

/// Formats a fraction in `[0, 1]` as a percentage with one decimal.
#[must_use]
pub fn format_percent(fraction: f64) -> String {
    if !fraction.is_finite() {
        return "nan".to_owned();
    }
    format!("{:.1}%", fraction * 100.0)
}

#[must_use]
pub fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d").to_string()
}

/// Default formatter used when neither geometry nor chart supply one.
#[must_use]
pub fn format_datum(value: &Datum) -> String {
    match value {
        Datum::Number(v) => format_number(*v),
        Datum::Text(s) => s.clone(),
        Datum::Time(t) => format_time(*t),
        Datum::Missing => String::new(),
    }
}

/// Literal zero labels get a fixed muted colour regardless of background.
#[must_use]
pub fn is_zero_label(text: &str) -> bool {
    matches!(text.trim(), "0" | "0%" | "0.0%")
}
