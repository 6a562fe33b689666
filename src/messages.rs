//! Diagnostic messages
//!
//! Messages are structured events, not rendered text: a translation key, a
//! severity, the location in the workbook and a set of named placeholders.
//! Rendering and localization are left to the caller.
//!
//! [`ImportMessage`] hashes structurally, so collecting messages in a
//! `HashSet` collapses repeated reports of the same condition.

use crate::config::TemplateKeys;
use crate::excel::columns::column_label;
use crate::model::CellData;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder names used by the built-in templates
pub mod placeholders {
    pub const SHEET_NAME: &str = "SheetName";
    pub const ROW_INDEX: &str = "RowIndex";
    pub const COLUMN_NAME: &str = "ColumnName";
    pub const CELL_VALUE: &str = "CellValue";
    pub const COLUMN: &str = "Column";
    pub const CASTED_VALUE: &str = "CastedValue";
    pub const CURRENT_VALUE: &str = "CurrentValue";
    pub const ITEM_INFORMATION: &str = "ItemInformation";
    pub const INDEX: &str = "Index";
    pub const START_DATE: &str = "StartDate";
    pub const END_DATE: &str = "EndDate";
    pub const MIN: &str = "Min";
    pub const MAX: &str = "Max";
    pub const MIN_LENGTH: &str = "MinLength";
    pub const MAX_LENGTH: &str = "MaxLength";
    pub const PRECISION: &str = "Precision";
    pub const SCALE: &str = "Scale";
}

use placeholders as ph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// Negative messages reject the row they were raised for
    pub fn is_negative(self) -> bool {
        matches!(self, Severity::Warning | Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// A translation key plus the placeholders a message of this kind must carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    key: String,
    required: Vec<&'static str>,
}

impl MessageTemplate {
    pub fn new(key: impl Into<String>, required: &[&'static str]) -> Self {
        Self {
            key: key.into(),
            required: required.to_vec(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn required_placeholders(&self) -> &[&'static str] {
        &self.required
    }
}

/// All templates used by the import pipeline, the hooks and the validators
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    pub no_worksheets_found: MessageTemplate,
    pub worksheet_not_found: MessageTemplate,
    pub header_not_found_at_index: MessageTemplate,
    pub cannot_delete_entity: MessageTemplate,
    pub duplicate_entry: MessageTemplate,
    pub invalid_date_range: MessageTemplate,
    pub date_range_overlaps_existing: MessageTemplate,
    pub cannot_modify_active_entity: MessageTemplate,
    pub cell_processing_error: MessageTemplate,
    pub required_field: MessageTemplate,
    pub no_accompanying_item_found: MessageTemplate,
    pub column_not_found: MessageTemplate,
    pub wrong_column_in_file: MessageTemplate,
    pub import_warning_no_data_imported: MessageTemplate,
    pub import_warning_some_data_not_imported: MessageTemplate,

    pub cast_generic: MessageTemplate,
    pub cast_date: MessageTemplate,
    pub cast_bool: MessageTemplate,

    pub validation_null_not_allowed: MessageTemplate,
    pub validation_invalid_numeric_range: MessageTemplate,
    pub validation_invalid_string_type: MessageTemplate,
    pub validation_invalid_string_length: MessageTemplate,
    pub validation_invalid_decimal_type: MessageTemplate,
    pub validation_invalid_decimal_precision_scale: MessageTemplate,
}

impl MessageTemplates {
    pub fn from_keys(keys: &TemplateKeys) -> Self {
        let t = MessageTemplate::new;
        Self {
            no_worksheets_found: t(&keys.no_worksheets_found, &[]),
            worksheet_not_found: t(&keys.worksheet_not_found, &[ph::SHEET_NAME]),
            header_not_found_at_index: t(&keys.header_not_found_at_index, &[ph::INDEX]),
            cannot_delete_entity: t(
                &keys.cannot_delete_entity,
                &[ph::INDEX, ph::ITEM_INFORMATION],
            ),
            duplicate_entry: t(&keys.duplicate_entry, &[]),
            invalid_date_range: t(&keys.invalid_date_range, &[ph::START_DATE, ph::END_DATE]),
            date_range_overlaps_existing: t(
                &keys.date_range_overlaps_existing,
                &[ph::START_DATE, ph::END_DATE],
            ),
            cannot_modify_active_entity: t(
                &keys.cannot_modify_active_entity,
                &[ph::ITEM_INFORMATION],
            ),
            cell_processing_error: t(&keys.cell_processing_error, &[]),
            required_field: t(&keys.required_field, &[ph::COLUMN_NAME]),
            no_accompanying_item_found: t(&keys.no_accompanying_item_found, &[ph::CURRENT_VALUE]),
            column_not_found: t(&keys.column_not_found, &[ph::COLUMN_NAME]),
            wrong_column_in_file: t(&keys.wrong_column_in_file, &[ph::COLUMN_NAME]),
            import_warning_no_data_imported: t(&keys.import_warning_no_data_imported, &[]),
            import_warning_some_data_not_imported: t(
                &keys.import_warning_some_data_not_imported,
                &[],
            ),
            cast_generic: t(&keys.cast_generic, &[ph::CASTED_VALUE]),
            cast_date: t(&keys.cast_date, &[ph::CASTED_VALUE]),
            cast_bool: t(&keys.cast_bool, &[ph::CASTED_VALUE]),
            validation_null_not_allowed: t(&keys.validation_null_not_allowed, &[]),
            validation_invalid_numeric_range: t(
                &keys.validation_invalid_numeric_range,
                &[ph::CURRENT_VALUE, ph::MIN, ph::MAX],
            ),
            validation_invalid_string_type: t(
                &keys.validation_invalid_string_type,
                &[ph::CURRENT_VALUE],
            ),
            validation_invalid_string_length: t(
                &keys.validation_invalid_string_length,
                &[ph::CURRENT_VALUE, ph::MIN_LENGTH, ph::MAX_LENGTH],
            ),
            validation_invalid_decimal_type: t(
                &keys.validation_invalid_decimal_type,
                &[ph::CURRENT_VALUE],
            ),
            validation_invalid_decimal_precision_scale: t(
                &keys.validation_invalid_decimal_precision_scale,
                &[ph::CURRENT_VALUE, ph::PRECISION, ph::SCALE],
            ),
        }
    }
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self::from_keys(&TemplateKeys::default())
    }
}

/// Collects placeholder values for one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBuilder {
    template: MessageTemplate,
    placeholders: BTreeMap<String, String>,
}

impl MessageBuilder {
    pub fn new(template: &MessageTemplate) -> Self {
        Self {
            template: template.clone(),
            placeholders: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.placeholders.insert(name.into(), value.into());
        self
    }

    pub fn key(&self) -> &str {
        self.template.key()
    }

    pub fn placeholders(&self) -> &BTreeMap<String, String> {
        &self.placeholders
    }

    /// Required placeholders of the template that were never supplied
    pub fn missing_placeholders(&self) -> Vec<&'static str> {
        self.template
            .required_placeholders()
            .iter()
            .copied()
            .filter(|name| !self.placeholders.contains_key(*name))
            .collect()
    }
}

/// One diagnostic raised while importing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImportMessage {
    pub translation_key: String,
    pub severity: Severity,
    pub sender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_value: Option<String>,
    /// Spreadsheet column label such as `AB`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub placeholders: BTreeMap<String, String>,
}

impl ImportMessage {
    pub fn placeholder(&self, name: &str) -> Option<&str> {
        self.placeholders.get(name).map(String::as_str)
    }
}

impl fmt::Display for ImportMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.translation_key)?;

        let mut location = Vec::new();
        if let Some(sheet) = &self.sheet_name {
            location.push(format!("sheet '{sheet}'"));
        }
        if let Some(row) = self.row_index {
            location.push(format!("row {row}"));
        }
        if let Some(column) = &self.column {
            location.push(format!("column {column}"));
        }
        if !location.is_empty() {
            write!(f, " ({})", location.join(", "))?;
        }

        let extra: Vec<String> = self
            .placeholders
            .iter()
            .filter(|(name, value)| !is_core_placeholder(name) && !value.is_empty())
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        if !extra.is_empty() {
            write!(f, " {{{}}}", extra.join(", "))?;
        }
        Ok(())
    }
}

fn is_core_placeholder(name: &str) -> bool {
    matches!(
        name,
        ph::SHEET_NAME | ph::ROW_INDEX | ph::COLUMN_NAME | ph::CELL_VALUE | ph::COLUMN
    )
}

/// Stamps sender and location onto built messages
#[derive(Debug, Clone)]
pub struct MessageFactory {
    sender: String,
}

impl MessageFactory {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }

    /// Create an error-level message
    pub fn create(
        &self,
        builder: MessageBuilder,
        sheet_name: Option<&str>,
        row_index: Option<usize>,
        cell: Option<&CellData>,
    ) -> ImportMessage {
        self.create_with_severity(builder, sheet_name, row_index, cell, Severity::Error)
    }

    pub fn create_with_severity(
        &self,
        builder: MessageBuilder,
        sheet_name: Option<&str>,
        row_index: Option<usize>,
        cell: Option<&CellData>,
        severity: Severity,
    ) -> ImportMessage {
        let missing = builder.missing_placeholders();
        if !missing.is_empty() {
            tracing::warn!(
                key = builder.key(),
                missing = ?missing,
                "message created without required placeholders"
            );
        }

        let column_name = cell.and_then(|c| c.column_name.clone());
        let cell_value = cell.and_then(|c| c.cell_value.clone());
        let column = cell
            .filter(|c| c.column_index > 0)
            .map(|c| column_label(i64::from(c.column_index)));

        let mut placeholders = builder.placeholders().clone();
        let core = [
            (ph::SHEET_NAME, sheet_name.map(str::to_string)),
            (ph::ROW_INDEX, row_index.map(|r| r.to_string())),
            (ph::COLUMN_NAME, column_name.clone()),
            (ph::CELL_VALUE, cell_value.clone()),
            (ph::COLUMN, column.clone()),
        ];
        for (name, value) in core {
            placeholders
                .entry(name.to_string())
                .or_insert_with(|| value.unwrap_or_default());
        }

        ImportMessage {
            translation_key: builder.key().to_string(),
            severity,
            sender: self.sender.clone(),
            sheet_name: sheet_name.map(str::to_string),
            row_index,
            column_name,
            cell_value,
            column,
            placeholders,
        }
    }
}
