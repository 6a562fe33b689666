//! Built-in cast hooks
//!
//! Each function has the [`CastFn`](super::CastFn) signature and can be
//! attached with `hooks::cast(casts::to_date)`.

use super::formatters::{to_clean_string, to_numeric_string};
use super::{CastOutcome, HookContext};
use crate::messages::{placeholders, MessageBuilder, MessageTemplate};
use crate::value::{parse_datetime, CellValue, Value, EMPTY_FIELD, NOT_ASSIGNED};
use chrono::NaiveDateTime;

fn failure(template: &MessageTemplate, input: &CellValue) -> CastOutcome {
    CastOutcome::Failure(
        MessageBuilder::new(template).with(placeholders::CASTED_VALUE, input.to_string()),
    )
}

/// `/`, `N/A` and blank text count as "no value"
fn is_empty_marker(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed == EMPTY_FIELD || trimmed.eq_ignore_ascii_case(NOT_ASSIGNED)
}

pub fn to_date(input: &CellValue, ctx: &HookContext<'_>) -> CastOutcome {
    match input {
        CellValue::Empty => CastOutcome::Success(Value::Null),
        CellValue::DateTime(dt) => CastOutcome::Success(Value::DateTime(*dt)),
        CellValue::Text(text) => match parse_datetime(text) {
            Some(dt) => CastOutcome::Success(Value::DateTime(dt)),
            None if is_empty_marker(text) => CastOutcome::Success(Value::Null),
            None => failure(&ctx.templates.cast_date, input),
        },
        _ => failure(&ctx.templates.cast_date, input),
    }
}

/// Date with the time set to 00:00:00
pub fn to_min_hours_date(input: &CellValue, ctx: &HookContext<'_>) -> CastOutcome {
    with_time(to_date(input, ctx), |dt| dt.date().and_hms_opt(0, 0, 0))
}

/// Date with the time set to 23:59:59
pub fn to_max_hours_date(input: &CellValue, ctx: &HookContext<'_>) -> CastOutcome {
    with_time(to_date(input, ctx), |dt| dt.date().and_hms_opt(23, 59, 59))
}

fn with_time(
    outcome: CastOutcome,
    adjust: impl Fn(NaiveDateTime) -> Option<NaiveDateTime>,
) -> CastOutcome {
    match outcome {
        CastOutcome::Success(Value::DateTime(dt)) => match adjust(dt) {
            Some(adjusted) => CastOutcome::Success(Value::DateTime(adjusted)),
            None => CastOutcome::Invalid,
        },
        other => other,
    }
}

pub fn to_bool(input: &CellValue, ctx: &HookContext<'_>) -> CastOutcome {
    match input {
        CellValue::Empty => CastOutcome::Success(Value::Null),
        CellValue::Bool(b) => CastOutcome::Success(Value::Bool(*b)),
        CellValue::Number(n) => CastOutcome::Success(Value::Bool(n.trunc() != 0.0)),
        CellValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.eq_ignore_ascii_case("true") {
                return CastOutcome::Success(Value::Bool(true));
            }
            if trimmed.eq_ignore_ascii_case("false") {
                return CastOutcome::Success(Value::Bool(false));
            }
            if let Ok(n) = trimmed.parse::<f64>() {
                return CastOutcome::Success(Value::Bool(n.trunc() != 0.0));
            }
            match to_clean_string(trimmed).as_str() {
                "true" => CastOutcome::Success(Value::Bool(true)),
                "false" => CastOutcome::Success(Value::Bool(false)),
                _ => failure(&ctx.templates.cast_bool, input),
            }
        }
        CellValue::DateTime(_) => failure(&ctx.templates.cast_bool, input),
    }
}

/// Integer; numbers are truncated, text keeps its digits and leading sign
pub fn to_int(input: &CellValue, ctx: &HookContext<'_>) -> CastOutcome {
    match input {
        CellValue::Empty => CastOutcome::Success(Value::Null),
        CellValue::Number(n) if n.is_finite() => CastOutcome::Success(Value::Integer(n.trunc() as i64)),
        CellValue::Text(text) => match to_numeric_string(text, false).parse::<i64>() {
            Ok(parsed) => CastOutcome::Success(Value::Integer(parsed)),
            Err(_) if is_empty_marker(text) => CastOutcome::Success(Value::Null),
            Err(_) => failure(&ctx.templates.cast_generic, input),
        },
        _ => failure(&ctx.templates.cast_generic, input),
    }
}

pub fn to_decimal(input: &CellValue, ctx: &HookContext<'_>) -> CastOutcome {
    match input {
        CellValue::Empty => CastOutcome::Success(Value::Null),
        CellValue::Number(n) if n.is_finite() => CastOutcome::Success(Value::Decimal(*n)),
        CellValue::Text(text) => match to_numeric_string(text, true).parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => CastOutcome::Success(Value::Decimal(parsed)),
            _ if is_empty_marker(text) => CastOutcome::Success(Value::Null),
            _ => failure(&ctx.templates.cast_generic, input),
        },
        _ => failure(&ctx.templates.cast_generic, input),
    }
}

/// Text; `/` becomes the empty string, other scalars their display form
pub fn to_text(input: &CellValue, _ctx: &HookContext<'_>) -> CastOutcome {
    match input {
        CellValue::Text(text) if text.trim() == EMPTY_FIELD => {
            CastOutcome::Success(Value::Text(String::new()))
        }
        CellValue::Text(text) => CastOutcome::Success(Value::Text(text.trim().to_string())),
        other => CastOutcome::Success(Value::Text(other.to_string())),
    }
}

/// Text; `/` and `N/A` become null
pub fn to_nullable_text(input: &CellValue, _ctx: &HookContext<'_>) -> CastOutcome {
    match input {
        CellValue::Empty => CastOutcome::Success(Value::Null),
        CellValue::Text(text) if is_empty_marker(text) => CastOutcome::Success(Value::Null),
        CellValue::Text(text) => CastOutcome::Success(Value::Text(text.trim().to_string())),
        other => CastOutcome::Success(Value::Text(other.to_string())),
    }
}
