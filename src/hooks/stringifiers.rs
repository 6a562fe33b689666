//! Built-in stringifiers for export

use super::{stringifier, StringifierFn};
use crate::value::Value;

/// Display form of the value; null renders empty only when allowed
pub fn from_string(allow_null: bool) -> StringifierFn {
    stringifier(move |value| match value {
        Value::Null if allow_null => Some(String::new()),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}

/// Dates rendered with a chrono format string; other kinds are rejected
pub fn date(format: impl Into<String>, allow_null: bool) -> StringifierFn {
    let format = format.into();
    stringifier(move |value| match value {
        Value::DateTime(dt) => Some(dt.format(&format).to_string()),
        Value::Null if allow_null => Some(String::new()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_from_string() {
        assert_eq!(from_string(false)(&Value::Integer(3)).as_deref(), Some("3"));
        assert_eq!(from_string(true)(&Value::Null).as_deref(), Some(""));
        assert_eq!(from_string(false)(&Value::Null), None);
    }

    #[test]
    fn test_date() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            date("%d.%m.%Y", false)(&Value::DateTime(dt)).as_deref(),
            Some("01.05.2024")
        );
        assert_eq!(date("%d.%m.%Y", false)(&Value::from("x")), None);
    }
}
