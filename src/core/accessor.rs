use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{Datum, Row};
use crate::error::{ChartError, ChartResult};

pub type AccessorFn = dyn Fn(&Row) -> Datum + Send + Sync + 'static;
pub type FormatterFn = dyn Fn(&Datum) -> String + Send + Sync + 'static;

/// Reads one value out of an opaque row.
#[derive(Clone)]
pub struct Accessor(Arc<AccessorFn>);

impl Accessor {
    pub fn new(f: impl Fn(&Row) -> Datum + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[must_use]
    pub fn read(&self, row: &Row) -> Datum {
        (self.0)(row)
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Accessor(..)")
    }
}

/// Turns a value into display text for ticks and labels.
#[derive(Clone)]
pub struct Formatter(Arc<FormatterFn>);

impl Formatter {
    pub fn new(f: impl Fn(&Datum) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[must_use]
    pub fn format(&self, value: &Datum) -> String {
        (self.0)(value)
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(crate::core::format::format_datum)
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Formatter(..)")
    }
}

/// Accessor reading a top-level field of a JSON object row.
///
/// Fails fast on an empty field name.
pub fn field(name: impl Into<String>) -> ChartResult<Accessor> {
    let name = name.into();
    if name.trim().is_empty() {
        return Err(ChartError::Configuration(
            "accessor field name must not be empty".to_owned(),
        ));
    }
    Ok(Accessor::new(move |row| {
        row.get(name.as_str()).map_or(Datum::Missing, Datum::from_json)
    }))
}

/// Accessor returning the same value for every row.
#[must_use]
pub fn constant(value: impl Into<Datum>) -> Accessor {
    let value = value.into();
    Accessor::new(move |_| value.clone())
}

/// Serializable description of an accessor, used by declarative chart specs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessorSpec {
    Field(String),
    Constant(Datum),
}

impl AccessorSpec {
    pub fn build(&self) -> ChartResult<Accessor> {
        match self {
            Self::Field(name) => field(name.clone()),
            Self::Constant(value) => Ok(constant(value.clone())),
        }
    }
}
