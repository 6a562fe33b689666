//! Cell and property values
//!
//! [`CellValue`] is what the workbook codec hands over for a single cell.
//! [`Value`] is what a record field holds after coercion.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Calendar format used for key parts and date placeholders (dd-MM-yyyy)
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Date and time format used when a timestamp is rendered as text
pub const DATE_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

pub const BOOL_TRUE: &str = "true";
pub const BOOL_FALSE: &str = "false";

/// Marker for an intentionally empty field
pub const EMPTY_FIELD: &str = "/";

/// Marker for a value that is not assigned
pub const NOT_ASSIGNED: &str = "N/A";

/// Rendered in place of a missing range end
pub const RANGE_NO_END_SYMBOL: &str = "\u{221e}";

const DECIMAL_PLACES: usize = 10;

const DATE_TIME_PATTERNS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d-%m-%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_PATTERNS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Raw scalar read from a worksheet cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

/// Scalar kinds a column accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Text,
    Number,
    Bool,
    #[serde(alias = "date")]
    DateTime,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn kind(&self) -> Option<CellKind> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(_) => Some(CellKind::Text),
            CellValue::Number(_) => Some(CellKind::Number),
            CellValue::Bool(_) => Some(CellKind::Bool),
            CellValue::DateTime(_) => Some(CellKind::DateTime),
        }
    }

    /// Raw text as recorded in diagnostics, `None` for an empty cell
    pub fn raw_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Bool(b) => f.write_str(if *b { BOOL_TRUE } else { BOOL_FALSE }),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format(DATE_TIME_FORMAT)),
        }
    }
}

/// Declared type of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Text,
    Integer,
    Float,
    Decimal,
    Bool,
    #[serde(alias = "date")]
    DateTime,
}

impl ValueKind {
    /// Cell kinds that convert to this field kind without a cast
    pub fn natural_cell_kinds(self) -> Vec<CellKind> {
        match self {
            ValueKind::Text => vec![CellKind::Text],
            ValueKind::Integer | ValueKind::Float | ValueKind::Decimal => vec![CellKind::Number],
            ValueKind::Bool => vec![CellKind::Bool],
            ValueKind::DateTime => vec![CellKind::DateTime],
        }
    }

    /// Whether a value of this kind can be stored in a field of `target`
    pub fn assignable_to(self, target: ValueKind) -> bool {
        use ValueKind::*;
        self == target
            || matches!(
                (self, target),
                (Integer, Float) | (Integer, Decimal) | (Float, Decimal) | (Decimal, Float)
            )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Text => "text",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Decimal => "decimal",
            ValueKind::Bool => "bool",
            ValueKind::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// Typed field value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    /// Fixed-point semantics, canonicalised to ten fractional digits
    Decimal(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Text(_) => Some(ValueKind::Text),
            Value::Integer(_) => Some(ValueKind::Integer),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Decimal(_) => Some(ValueKind::Decimal),
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::DateTime(_) => Some(ValueKind::DateTime),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(n) | Value::Decimal(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Convert a raw cell to `kind` without any cast hook.
    ///
    /// Text is trimmed, numbers only become integers when they carry no
    /// fractional part. Returns `None` for incompatible pairs.
    pub fn from_cell(cell: &CellValue, kind: ValueKind) -> Option<Value> {
        match (cell, kind) {
            (CellValue::Empty, _) => Some(Value::Null),
            (CellValue::Text(s), ValueKind::Text) => Some(Value::Text(s.trim().to_string())),
            (CellValue::Number(n), ValueKind::Integer) => integral(*n).map(Value::Integer),
            (CellValue::Number(n), ValueKind::Float) => Some(Value::Float(*n)),
            (CellValue::Number(n), ValueKind::Decimal) => Some(Value::Decimal(*n)),
            (CellValue::Bool(b), ValueKind::Bool) => Some(Value::Bool(*b)),
            (CellValue::DateTime(dt), ValueKind::DateTime) => Some(Value::DateTime(*dt)),
            _ => None,
        }
    }

    /// Widen a value into a field of `kind`; `None` when not assignable
    pub fn coerce_to(&self, kind: ValueKind) -> Option<Value> {
        match (self, kind) {
            (Value::Null, _) => Some(Value::Null),
            (Value::Integer(i), ValueKind::Float) => Some(Value::Float(*i as f64)),
            (Value::Integer(i), ValueKind::Decimal) => Some(Value::Decimal(*i as f64)),
            (Value::Float(n), ValueKind::Decimal) => Some(Value::Decimal(*n)),
            (Value::Decimal(n), ValueKind::Float) => Some(Value::Float(*n)),
            (value, kind) if value.kind() == Some(kind) => Some(value.clone()),
            _ => None,
        }
    }

    /// Canonical string used as a composite key part
    pub fn key_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(s) => s.trim().to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(n) => n.to_string(),
            Value::Decimal(n) => format_decimal(*n),
            Value::Bool(b) => (if *b { BOOL_TRUE } else { BOOL_FALSE }).to_string(),
            Value::DateTime(dt) => dt.format(DATE_FORMAT).to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Decimal(n) => f.write_str(&format_decimal(*n)),
            Value::Bool(b) => f.write_str(if *b { BOOL_TRUE } else { BOOL_FALSE }),
            Value::DateTime(dt) => write!(f, "{}", dt.format(DATE_TIME_FORMAT)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(n) | Value::Decimal(n) => serializer.serialize_f64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::DateTime(dt) => {
                serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Empty text becomes an empty cell
impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// Render a decimal with up to ten fractional digits, trailing zeros trimmed
pub fn format_decimal(value: f64) -> String {
    let fixed = format!("{:.*}", DECIMAL_PLACES, value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Parse the date and timestamp spellings commonly found in sheets
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc());
    }

    DATE_TIME_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(input, pattern).ok())
        .or_else(|| {
            DATE_PATTERNS
                .iter()
                .find_map(|pattern| NaiveDate::parse_from_str(input, pattern).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_key_string_formats() {
        assert_eq!(Value::Decimal(1.5).key_string(), "1.5");
        assert_eq!(Value::Decimal(2.0).key_string(), "2");
        assert_eq!(Value::Decimal(0.12345678901).key_string(), "0.123456789");
        assert_eq!(Value::DateTime(date(2024, 1, 5)).key_string(), "05-01-2024");
        assert_eq!(Value::Bool(true).key_string(), "true");
        assert_eq!(Value::Text("  abc ".into()).key_string(), "abc");
        assert_eq!(Value::Null.key_string(), "");
    }

    #[test]
    fn test_from_cell_integer_requires_integral_number() {
        assert_eq!(
            Value::from_cell(&CellValue::Number(42.0), ValueKind::Integer),
            Some(Value::Integer(42))
        );
        assert_eq!(Value::from_cell(&CellValue::Number(4.2), ValueKind::Integer), None);
    }

    #[test]
    fn test_from_cell_trims_text() {
        assert_eq!(
            Value::from_cell(&CellValue::Text("  hi ".into()), ValueKind::Text),
            Some(Value::Text("hi".into()))
        );
        assert_eq!(Value::from_cell(&CellValue::Text("1".into()), ValueKind::Integer), None);
    }

    #[test]
    fn test_coerce_widens_numbers() {
        assert_eq!(Value::Integer(3).coerce_to(ValueKind::Decimal), Some(Value::Decimal(3.0)));
        assert_eq!(Value::Float(1.0).coerce_to(ValueKind::Integer), None);
        assert_eq!(Value::Text("x".into()).coerce_to(ValueKind::Bool), None);
    }

    #[test]
    fn test_parse_datetime_variants() {
        assert_eq!(parse_datetime("2024-03-01"), Some(date(2024, 3, 1)));
        assert_eq!(parse_datetime("01-03-2024"), Some(date(2024, 3, 1)));
        assert_eq!(parse_datetime("01.03.2024"), Some(date(2024, 3, 1)));
        assert!(parse_datetime("2024-03-01T10:30:00").is_some());
        assert_eq!(parse_datetime("not a date"), None);
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Number(42.0).to_string(), "42");
        assert_eq!(CellValue::Number(1.25).to_string(), "1.25");
        assert_eq!(CellValue::Bool(false).to_string(), "false");
        assert_eq!(CellValue::Empty.raw_text(), None);
    }
}
