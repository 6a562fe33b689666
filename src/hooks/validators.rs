//! Built-in validator factories

use super::{validator, HookContext, Validation, ValidatorFn};
use crate::messages::{placeholders, MessageBuilder};
use crate::value::{format_decimal, Value, RANGE_NO_END_SYMBOL};

fn null_check(allow_null: bool, ctx: &HookContext<'_>) -> Validation {
    if allow_null {
        Validation::success()
    } else {
        Validation::failure(MessageBuilder::new(&ctx.templates.validation_null_not_allowed))
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Text(text) => text.trim().parse::<f64>().ok(),
        other => other.as_f64(),
    }
}

/// Value must be numeric (or numeric text) within `[min, max]`
pub fn numeric_range(min: f64, max: f64, allow_null: bool) -> ValidatorFn {
    validator(move |value, ctx| {
        if value.is_null() {
            return null_check(allow_null, ctx);
        }

        match numeric(value) {
            Some(n) if n >= min && n <= max => Validation::success(),
            _ => Validation::failure(
                MessageBuilder::new(&ctx.templates.validation_invalid_numeric_range)
                    .with(placeholders::CURRENT_VALUE, value.to_string())
                    .with(placeholders::MIN, min.to_string())
                    .with(placeholders::MAX, max.to_string()),
            ),
        }
    })
}

/// Text length (in characters) within the given bounds
pub fn string_length(
    min_length: Option<usize>,
    max_length: Option<usize>,
    allow_null: bool,
) -> ValidatorFn {
    validator(move |value, ctx| {
        if min_length.is_none() && max_length.is_none() {
            return Validation::success();
        }

        let text = match value {
            Value::Null => return null_check(allow_null, ctx),
            Value::Text(text) => text,
            other => {
                return Validation::failure(
                    MessageBuilder::new(&ctx.templates.validation_invalid_string_type)
                        .with(placeholders::CURRENT_VALUE, other.to_string()),
                )
            }
        };

        let length = text.chars().count();
        let too_short = min_length.is_some_and(|min| length < min);
        let too_long = max_length.is_some_and(|max| length > max);

        if too_short || too_long {
            let bound = |b: Option<usize>| {
                b.map(|n| n.to_string())
                    .unwrap_or_else(|| RANGE_NO_END_SYMBOL.to_string())
            };
            return Validation::failure(
                MessageBuilder::new(&ctx.templates.validation_invalid_string_length)
                    .with(placeholders::CURRENT_VALUE, text.clone())
                    .with(placeholders::MIN_LENGTH, bound(min_length))
                    .with(placeholders::MAX_LENGTH, bound(max_length)),
            );
        }

        Validation::success()
    })
}

/// At most `precision` significant digits, at most `scale` of them fractional
pub fn decimal_precision_scale(precision: usize, scale: usize, allow_null: bool) -> ValidatorFn {
    validator(move |value, ctx| {
        if value.is_null() {
            return null_check(allow_null, ctx);
        }

        let Some(number) = numeric(value) else {
            return Validation::failure(
                MessageBuilder::new(&ctx.templates.validation_invalid_decimal_type)
                    .with(placeholders::CURRENT_VALUE, value.to_string()),
            );
        };

        let rendered = format_decimal(number.abs());
        let (integer_part, fraction_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
        let integer_digits = integer_part.trim_start_matches('0').len();
        let fraction_digits = fraction_part.trim_end_matches('0').len();

        if integer_digits + fraction_digits > precision || fraction_digits > scale {
            return Validation::failure(
                MessageBuilder::new(&ctx.templates.validation_invalid_decimal_precision_scale)
                    .with(placeholders::CURRENT_VALUE, value.to_string())
                    .with(placeholders::PRECISION, precision.to_string())
                    .with(placeholders::SCALE, scale.to_string()),
            );
        }

        Validation::success()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageTemplates;

    #[test]
    fn test_numeric_range() {
        let templates = MessageTemplates::default();
        let ctx = HookContext::new(&templates);
        let check = numeric_range(0.0, 100.0, false);

        assert!(check(&Value::Integer(50), &ctx).valid);
        assert!(check(&Value::from("99.5"), &ctx).valid);

        let result = check(&Value::Float(150.0), &ctx);
        assert!(!result.valid);
        let message = result.message.unwrap();
        assert_eq!(message.placeholders().get("Max").map(String::as_str), Some("100"));
        assert_eq!(message.placeholders().get("CurrentValue").map(String::as_str), Some("150"));
    }

    #[test]
    fn test_null_handling() {
        let templates = MessageTemplates::default();
        let ctx = HookContext::new(&templates);

        assert!(numeric_range(0.0, 1.0, true)(&Value::Null, &ctx).valid);
        let rejected = numeric_range(0.0, 1.0, false)(&Value::Null, &ctx);
        assert_eq!(
            rejected.message.unwrap().key(),
            "messages.value_validation_message_null_not_allowed"
        );
    }

    #[test]
    fn test_string_length_uses_infinity_for_open_bound() {
        let templates = MessageTemplates::default();
        let ctx = HookContext::new(&templates);
        let check = string_length(Some(3), None, false);

        assert!(check(&Value::from("abcd"), &ctx).valid);
        let result = check(&Value::from("ab"), &ctx);
        assert!(!result.valid);
        assert_eq!(
            result.message.unwrap().placeholders().get("MaxLength").map(String::as_str),
            Some(RANGE_NO_END_SYMBOL)
        );
        assert!(!check(&Value::Integer(12345), &ctx).valid);
    }

    #[test]
    fn test_decimal_precision_scale() {
        let templates = MessageTemplates::default();
        let ctx = HookContext::new(&templates);
        let check = decimal_precision_scale(5, 2, false);

        assert!(check(&Value::Decimal(123.45), &ctx).valid);
        assert!(check(&Value::Decimal(-0.5), &ctx).valid);
        assert!(!check(&Value::Decimal(12345.6), &ctx).valid);
        assert!(!check(&Value::Decimal(1.234), &ctx).valid);
        assert!(!check(&Value::Bool(true), &ctx).valid);
    }
}
