//! Import/export options
//!
//! Options are plain serde structs so they can be loaded from a YAML file:
//!
//! ```yaml
//! default_sender: Importer
//! header_background_color: FF1F4E79
//! templates:
//!   duplicate_entry: messages.custom_duplicate
//! ```
//!
//! Every field is optional; missing fields keep their defaults.

use crate::error::TabellaResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Options shared by the importer, the exporter and the post-import validators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabellaOptions {
    /// Sender recorded on every diagnostic message.
    pub default_sender: String,

    /// Header row fill color for exported sheets (ARGB hex).
    pub header_background_color: String,

    /// Header row text color for exported sheets (ARGB hex).
    pub header_text_color: String,

    /// Translation keys for every diagnostic template.
    pub templates: TemplateKeys,
}

impl Default for TabellaOptions {
    fn default() -> Self {
        Self {
            default_sender: "System".to_string(),
            header_background_color: "FFF54900".to_string(),
            header_text_color: "FFFFFFFF".to_string(),
            templates: TemplateKeys::default(),
        }
    }
}

impl TabellaOptions {
    /// Load options from a YAML file
    pub fn load(path: &Path) -> TabellaResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse options from a YAML string. An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> TabellaResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Translation keys, one per message template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateKeys {
    // Import
    pub no_worksheets_found: String,
    pub worksheet_not_found: String,
    pub header_not_found_at_index: String,
    pub cannot_delete_entity: String,
    pub duplicate_entry: String,
    pub invalid_date_range: String,
    pub date_range_overlaps_existing: String,
    pub cannot_modify_active_entity: String,
    pub cell_processing_error: String,
    pub required_field: String,
    pub no_accompanying_item_found: String,
    pub column_not_found: String,
    pub wrong_column_in_file: String,
    pub import_warning_no_data_imported: String,
    pub import_warning_some_data_not_imported: String,

    // Casts
    pub cast_generic: String,
    pub cast_date: String,
    pub cast_bool: String,

    // Validators
    pub validation_null_not_allowed: String,
    pub validation_invalid_numeric_range: String,
    pub validation_invalid_string_type: String,
    pub validation_invalid_string_length: String,
    pub validation_invalid_decimal_type: String,
    pub validation_invalid_decimal_precision_scale: String,
}

impl Default for TemplateKeys {
    fn default() -> Self {
        let key = |suffix: &str| format!("messages.{suffix}");
        Self {
            no_worksheets_found: key("no_worksheets_found"),
            worksheet_not_found: key("worksheet_not_found"),
            header_not_found_at_index: key(
                "sheet_processing_message_header_row_not_found_at_index",
            ),
            cannot_delete_entity: key("sheet_processing_message_cannot_delete_entity"),
            duplicate_entry: key("sheet_processing_message_duplicate"),
            invalid_date_range: key("sheet_processing_message_invalid_date_range"),
            date_range_overlaps_existing: key(
                "sheet_processing_message_date_range_overlaps_existing",
            ),
            cannot_modify_active_entity: key(
                "sheet_processing_message_cannot_modify_active_entity",
            ),
            cell_processing_error: key("sheet_cell_processing_error"),
            required_field: key("sheet_processing_message_required_field"),
            no_accompanying_item_found: key(
                "sheet_processing_message_no_accompanying_item_found",
            ),
            column_not_found: key("sheet_processing_message_column_not_found"),
            wrong_column_in_file: key("sheet_processing_message_column_is_wrong"),
            import_warning_no_data_imported: key("import_info_message_no_data_imported"),
            import_warning_some_data_not_imported: key(
                "import_info_message_some_data_not_imported",
            ),
            cast_generic: key("cast_message_generic"),
            cast_date: key("cast_message_date"),
            cast_bool: key("cast_message_bool"),
            validation_null_not_allowed: key("value_validation_message_null_not_allowed"),
            validation_invalid_numeric_range: key(
                "value_validation_message_invalid_numeric_range",
            ),
            validation_invalid_string_type: key("value_validation_message_invalid_string_type"),
            validation_invalid_string_length: key(
                "value_validation_message_invalid_string_length",
            ),
            validation_invalid_decimal_type: key("value_validation_message_invalid_decimal_type"),
            validation_invalid_decimal_precision_scale: key(
                "value_validation_message_invalid_decimal_precision_scale",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = TabellaOptions::default();
        assert_eq!(options.default_sender, "System");
        assert_eq!(options.header_background_color, "FFF54900");
        assert_eq!(
            options.templates.duplicate_entry,
            "messages.sheet_processing_message_duplicate"
        );
        assert_eq!(
            options.templates.cell_processing_error,
            "messages.sheet_cell_processing_error"
        );
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
default_sender: Importer
templates:
  duplicate_entry: custom.duplicate
"#;
        let options = TabellaOptions::from_yaml(yaml).unwrap();
        assert_eq!(options.default_sender, "Importer");
        assert_eq!(options.header_text_color, "FFFFFFFF");
        assert_eq!(options.templates.duplicate_entry, "custom.duplicate");
        assert_eq!(options.templates.required_field, TemplateKeys::default().required_field);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(TabellaOptions::from_yaml("  \n").unwrap(), TabellaOptions::default());
    }
}
