//! Cell values: the closed set of raw cell shapes produced by the decoders and
//! the canonical scalar every cell is coerced into.
//!
//! [`coerce()`] never fails. Anything it cannot interpret degrades to `None`
//! or to trimmed text; nothing composite survives into a [`Value`].

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// Strings conventionally meaning "no data". Compared after trimming and
/// lower-casing; the empty string is handled by the trim.
pub const SENTINEL_VALUES: &[&str] = &[
    "undefined",
    "null",
    "nan",
    "n/a",
    "#n/a",
    "#value!",
    "#ref!",
    "#div/0!",
    "#num!",
    "#name?",
    "#null!",
];

const ISO_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Largest integer an f64 represents exactly; integral numbers below it are
/// serialized without a fractional part.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A cell as handed over by the decode boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
    /// A date cell whose serial value could not be mapped to a calendar date.
    InvalidDate,
    /// Concatenated runs of a rich-text cell.
    RichText(String),
    Formula {
        formula: String,
        result: Option<Box<RawCell>>,
    },
    Hyperlink(String),
    /// Fallback for cells the decoder could not classify, carrying their
    /// textual rendering.
    Unclassified(String),
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::Text(value.to_string())
    }
}

impl From<String> for RawCell {
    fn from(value: String) -> Self {
        RawCell::Text(value)
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

impl From<bool> for RawCell {
    fn from(value: bool) -> Self {
        RawCell::Bool(value)
    }
}

impl From<&Value> for RawCell {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => RawCell::Text(s.clone()),
            Value::Number(n) => RawCell::Number(*n),
            Value::Boolean(b) => RawCell::Bool(*b),
            Value::DateTime(dt) => RawCell::Date(*dt),
        }
    }
}

/// Canonical scalar held by a record. Absence (`null`) is modelled as
/// `Option::None` by the callers.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::DateTime(dt) => dt.format(ISO_DATETIME_FORMAT).to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::String(s) => s.trim().is_empty(),
            Value::Number(n) => !n.is_finite(),
            Value::Boolean(_) | Value::DateTime(_) => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::DateTime(_) => serializer.serialize_str(&self.as_display()),
        }
    }
}

/// Empty per the record invariant: absent, blank text, or a non-finite number.
/// Booleans and zero are never empty.
pub fn is_empty(value: Option<&Value>) -> bool {
    value.is_none_or(Value::is_empty)
}

pub fn is_sentinel(value: &str) -> bool {
    let lowered = value.trim().to_lowercase();
    lowered.is_empty() || SENTINEL_VALUES.contains(&lowered.as_str())
}

/// Coerce a raw cell into its canonical value.
pub fn coerce(raw: &RawCell) -> Option<Value> {
    match raw {
        RawCell::Empty | RawCell::InvalidDate => None,
        RawCell::Text(s)
        | RawCell::RichText(s)
        | RawCell::Hyperlink(s)
        | RawCell::Unclassified(s) => canonical_text(s),
        RawCell::Formula { result, .. } => result.as_deref().and_then(coerce),
        RawCell::Number(n) => n.is_finite().then_some(Value::Number(*n)),
        RawCell::Bool(b) => Some(Value::Boolean(*b)),
        RawCell::Date(dt) => Some(Value::DateTime(*dt)),
    }
}

fn canonical_text(value: &str) -> Option<Value> {
    if is_sentinel(value) {
        None
    } else {
        Some(Value::String(value.trim().to_string()))
    }
}
