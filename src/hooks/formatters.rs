//! String normalization helpers

use crate::value::{EMPTY_FIELD, NOT_ASSIGNED};

/// Lowercased alphanumerics only; used to match sheet and column names
pub fn to_clean_string(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Digits of `input`, with a leading minus sign kept.
///
/// With `allow_decimals` the last `.` or `,` becomes the decimal point and
/// every earlier separator is treated as a thousands separator.
pub fn to_numeric_string(input: &str, allow_decimals: bool) -> String {
    let negative = input.trim_start().starts_with('-');
    let digits_of = |s: &str| s.chars().filter(char::is_ascii_digit).collect::<String>();

    let body = if allow_decimals {
        match input.rfind(|c: char| c == '.' || c == ',') {
            Some(separator) => format!(
                "{}.{}",
                digits_of(&input[..separator]),
                digits_of(&input[separator + 1..])
            ),
            None => digits_of(input),
        }
    } else {
        digits_of(input)
    };

    if negative && body.chars().any(|c| c.is_ascii_digit()) {
        format!("-{body}")
    } else {
        body
    }
}

/// Digits of `input` left-padded to `total_length`.
///
/// Empty markers (`/`, `N/A`) and inputs without digits give `None`. With
/// `min_length_only` a value already long enough is returned unpadded.
pub fn to_padded_numeric_string(
    input: &str,
    total_length: usize,
    padding: char,
    min_length_only: bool,
) -> Option<String> {
    let trimmed = input.trim();
    if trimmed == EMPTY_FIELD || trimmed == NOT_ASSIGNED {
        return None;
    }

    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    if min_length_only && digits.len() >= total_length {
        return Some(digits);
    }

    let padding_len = total_length.saturating_sub(digits.len());
    let mut padded: String = std::iter::repeat(padding).take(padding_len).collect();
    padded.push_str(&digits);
    Some(padded)
}
