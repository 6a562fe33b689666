//! Header row resolution

use super::source::GridRow;
use crate::hooks::formatters::to_clean_string;
use crate::messages::{
    placeholders, ImportMessage, MessageBuilder, MessageFactory, MessageTemplates, Severity,
};
use crate::model::{CellData, ColumnMapping};
use std::collections::HashSet;

/// A header cell bound to a declared column mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBinding {
    /// 1-based column
    pub column: u32,
    /// Header text as written in the file
    pub header_text: String,
    /// Position of the mapping in the sheet's column list
    pub mapping: usize,
}

/// Shared state for diagnostics raised while processing one sheet
pub(crate) struct SheetScope<'a> {
    pub sheet_name: &'a str,
    pub factory: &'a MessageFactory,
    pub templates: &'a MessageTemplates,
}

/// Match header cells against the declared columns.
///
/// Matching mappings are marked found and get the literal header text;
/// unmatched header cells raise a wrong-column warning. Bindings come
/// back in declaration order.
pub(crate) fn resolve_headers(
    header: &GridRow,
    columns: &mut [(String, ColumnMapping)],
    scope: &SheetScope<'_>,
    messages: &mut HashSet<ImportMessage>,
) -> Vec<HeaderBinding> {
    let normalized: Vec<String> = columns.iter().map(|(key, _)| to_clean_string(key)).collect();
    let mut bindings: Vec<HeaderBinding> = Vec::new();

    for cell in &header.cells {
        if cell.value.is_empty() {
            continue;
        }

        let text = cell.value.to_string();
        let cleaned = to_clean_string(&text);
        if cleaned.is_empty() {
            continue;
        }

        match normalized.iter().position(|key| *key == cleaned) {
            Some(index) if bindings.iter().any(|b| b.mapping == index) => {
                tracing::warn!(
                    sheet = scope.sheet_name,
                    header = %text,
                    column = cell.column,
                    "header repeats an already bound column; ignored"
                );
            }
            Some(index) => {
                let mapping = &mut columns[index].1;
                mapping.found_in_file = true;
                mapping.original_header_name = text.clone();
                bindings.push(HeaderBinding {
                    column: cell.column,
                    header_text: text,
                    mapping: index,
                });
            }
            None => {
                let cell_data = CellData {
                    column_name: Some(text.clone()),
                    column_index: cell.column,
                    cell_value: Some(text.clone()),
                };
                messages.insert(scope.factory.create_with_severity(
                    MessageBuilder::new(&scope.templates.wrong_column_in_file)
                        .with(placeholders::COLUMN_NAME, text),
                    Some(scope.sheet_name),
                    Some(header.number),
                    Some(&cell_data),
                    Severity::Warning,
                ));
            }
        }
    }

    bindings.sort_by_key(|binding| binding.mapping);
    tracing::debug!(
        sheet = scope.sheet_name,
        bound = bindings.len(),
        declared = columns.len(),
        "header resolved"
    );
    bindings
}

/// One column-not-found message per declared column never seen in the header
pub(crate) fn report_missing_columns(
    columns: &[(String, ColumnMapping)],
    scope: &SheetScope<'_>,
    messages: &mut HashSet<ImportMessage>,
) {
    for (key, _) in columns.iter().filter(|(_, mapping)| !mapping.found_in_file) {
        messages.insert(scope.factory.create(
            MessageBuilder::new(&scope.templates.column_not_found)
                .with(placeholders::COLUMN_NAME, key.as_str()),
            Some(scope.sheet_name),
            None,
            None,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::source::GridCell;
    use crate::value::{CellValue, ValueKind};

    fn header(texts: &[&str]) -> GridRow {
        GridRow {
            number: 1,
            hidden: false,
            cells: texts
                .iter()
                .enumerate()
                .map(|(i, t)| GridCell {
                    column: i as u32 + 1,
                    value: CellValue::from(*t),
                })
                .collect(),
        }
    }

    fn columns() -> Vec<(String, ColumnMapping)> {
        vec![
            ("Code".to_string(), ColumnMapping::new("code", ValueKind::Text)),
            ("Start Date".to_string(), ColumnMapping::new("start", ValueKind::DateTime)),
        ]
    }

    #[test]
    fn test_headers_match_after_normalization() {
        let templates = MessageTemplates::default();
        let factory = MessageFactory::new("System");
        let scope = SheetScope {
            sheet_name: "Prices",
            factory: &factory,
            templates: &templates,
        };
        let mut columns = columns();
        let mut messages = HashSet::new();

        let bindings = resolve_headers(
            &header(&["START-DATE", "code "]),
            &mut columns,
            &scope,
            &mut messages,
        );

        assert!(messages.is_empty());
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].mapping, 0);
        assert_eq!(bindings[0].column, 2);
        assert_eq!(columns[1].1.original_header_name, "START-DATE");
        assert!(columns.iter().all(|(_, m)| m.found_in_file));
    }

    #[test]
    fn test_unknown_header_is_reported_once() {
        let templates = MessageTemplates::default();
        let factory = MessageFactory::new("System");
        let scope = SheetScope {
            sheet_name: "Prices",
            factory: &factory,
            templates: &templates,
        };
        let mut columns = columns();
        let mut messages = HashSet::new();

        resolve_headers(&header(&["Code", "Colour"]), &mut columns, &scope, &mut messages);
        report_missing_columns(&columns, &scope, &mut messages);

        let wrong: Vec<_> = messages
            .iter()
            .filter(|m| m.translation_key == templates.wrong_column_in_file.key())
            .collect();
        assert_eq!(wrong.len(), 1);
        assert_eq!(wrong[0].placeholder(placeholders::COLUMN_NAME), Some("Colour"));
        assert_eq!(wrong[0].column.as_deref(), Some("B"));

        let missing: Vec<_> = messages
            .iter()
            .filter(|m| m.translation_key == templates.column_not_found.key())
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].placeholder(placeholders::COLUMN_NAME), Some("Start Date"));
    }
}
