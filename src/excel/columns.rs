//! Column labels and sheet names

use crate::hooks::formatters::to_clean_string;
use regex::Regex;
use std::sync::OnceLock;

/// Longest sheet name a workbook accepts
pub const SHEET_NAME_MAX_CHARS: usize = 31;

/// Spreadsheet-style label of a 1-based column index (1 → `A`, 27 → `AA`).
///
/// Zero and negative indices give the empty label.
pub fn column_label(index: i64) -> String {
    if index <= 0 {
        return String::new();
    }

    let mut n = index;
    let mut label = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        label.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

/// 1-based column index of a label or a cell reference (`AB`, `ab12`)
pub fn column_index(reference: &str) -> Option<u32> {
    static LETTERS: OnceLock<Regex> = OnceLock::new();
    let re = LETTERS.get_or_init(|| Regex::new(r"^[A-Za-z]+").expect("valid regex"));

    let letters = re.find(reference.trim())?.as_str();
    letters.bytes().try_fold(0u32, |acc, b| {
        acc.checked_mul(26)?
            .checked_add(u32::from(b.to_ascii_uppercase() - b'A' + 1))
    })
}

/// Sheet name accepted by the writer: forbidden characters removed,
/// truncated to 31 characters, `Sheet` when nothing is left
pub fn clean_sheet_name(name: &str) -> String {
    static FORBIDDEN: OnceLock<Regex> = OnceLock::new();
    let re = FORBIDDEN.get_or_init(|| Regex::new(r"[\[\]:*?/\\]").expect("valid regex"));

    let cleaned: String = re
        .replace_all(name, "")
        .trim()
        .chars()
        .take(SHEET_NAME_MAX_CHARS)
        .collect();

    if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

/// Name used to match a declared sheet against the workbook's sheets
pub fn normalized_sheet_name(name: &str) -> String {
    let truncated: String = name.chars().take(SHEET_NAME_MAX_CHARS).collect();
    to_clean_string(&truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_label_boundaries() {
        assert_eq!(column_label(1), "A");
        assert_eq!(column_label(26), "Z");
        assert_eq!(column_label(27), "AA");
        assert_eq!(column_label(52), "AZ");
        assert_eq!(column_label(702), "ZZ");
        assert_eq!(column_label(703), "AAA");
        assert_eq!(column_label(0), "");
        assert_eq!(column_label(-4), "");
    }

    #[test]
    fn test_column_label_is_bijective() {
        for index in 1..=702u32 {
            let label = column_label(i64::from(index));
            assert_eq!(column_index(&label), Some(index), "label {label}");
        }
    }

    #[test]
    fn test_column_index_from_cell_reference() {
        assert_eq!(column_index("AB12"), Some(28));
        assert_eq!(column_index("c3"), Some(3));
        assert_eq!(column_index("12"), None);
    }

    #[test]
    fn test_clean_sheet_name() {
        assert_eq!(clean_sheet_name("Q1/Q2 [draft]"), "Q1Q2 draft");
        assert_eq!(clean_sheet_name("???"), "Sheet");
        assert_eq!(clean_sheet_name(&"x".repeat(40)).len(), SHEET_NAME_MAX_CHARS);
    }

    #[test]
    fn test_normalized_sheet_name() {
        assert_eq!(normalized_sheet_name("Price List"), "pricelist");
        assert_eq!(
            normalized_sheet_name("A very long worksheet name that overflows"),
            normalized_sheet_name("A very long worksheet name that")
        );
    }
}
