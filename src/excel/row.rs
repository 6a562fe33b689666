//! Per-row cell coercion and acceptance

use super::header::{HeaderBinding, SheetScope};
use super::source::GridRow;
use crate::hooks::{CastOutcome, HookContext};
use crate::messages::{placeholders, ImportMessage, MessageBuilder};
use crate::model::{
    CellData, ColumnData, ColumnMapping, FieldSpec, ProcessedObject, Record, SheetMapping,
};
use crate::value::{CellValue, Value};
use std::collections::{BTreeMap, HashSet};

/// How a single cell ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct CellOutcome {
    valid: bool,
    required: bool,
    logged: bool,
}

/// Builds one record per data row of a sheet
pub(crate) struct RowProcessor<'a> {
    scope: &'a SheetScope<'a>,
    mapping: &'a SheetMapping,
    bindings: &'a [HeaderBinding],
    hooks: HookContext<'a>,
}

impl<'a> RowProcessor<'a> {
    pub fn new(
        scope: &'a SheetScope<'a>,
        mapping: &'a SheetMapping,
        bindings: &'a [HeaderBinding],
    ) -> Self {
        Self {
            scope,
            mapping,
            bindings,
            hooks: HookContext::new(scope.templates),
        }
    }

    /// Process one data row.
    ///
    /// Diagnostics are committed to `messages` only when the row carries a
    /// value in some mapped column. The row is accepted when it raised no
    /// negative diagnostic, produced column data, and either has a value or
    /// declares no required field.
    pub fn process(
        &self,
        row: &GridRow,
        messages: &mut HashSet<ImportMessage>,
    ) -> Option<ProcessedObject> {
        let mut record = self.mapping.entity.instantiate();
        let mut column_data = BTreeMap::new();
        let mut row_messages: HashSet<ImportMessage> = HashSet::new();
        let mut has_values = false;
        let mut has_required = false;

        for binding in self.bindings {
            let Some((_, column)) = self.mapping.columns.get(binding.mapping) else {
                continue;
            };

            let raw = row.cell(binding.column).cloned().unwrap_or_default();
            has_values |= !raw.is_empty();

            let cell = CellData {
                column_name: Some(binding.header_text.clone()),
                column_index: binding.column,
                cell_value: raw.raw_text(),
            };
            column_data.insert(
                column.target.name.clone(),
                ColumnData {
                    property_kind: column.target.kind,
                    target_property: column.target.name.clone(),
                    cell: cell.clone(),
                },
            );

            let outcome = self.coerce_cell(
                record.as_mut(),
                column,
                &raw,
                &cell,
                row.number,
                &mut row_messages,
            );
            has_required |= outcome.required;

            if !outcome.valid && !outcome.logged {
                row_messages.insert(self.scope.factory.create(
                    MessageBuilder::new(&self.scope.templates.cell_processing_error),
                    Some(self.scope.sheet_name),
                    Some(row.number),
                    Some(&cell),
                ));
            }
        }

        let rejected = row_messages.iter().any(|m| m.severity.is_negative());
        if has_values {
            messages.extend(row_messages);
        }

        if rejected || column_data.is_empty() || (!has_values && has_required) {
            tracing::debug!(
                sheet = self.scope.sheet_name,
                row = row.number,
                rejected,
                has_values,
                "row dropped"
            );
            return None;
        }

        Some(ProcessedObject {
            object: record,
            sheet_name: self.scope.sheet_name.to_string(),
            row_index: row.number,
            column_data,
        })
    }

    fn coerce_cell(
        &self,
        record: &mut dyn Record,
        column: &ColumnMapping,
        raw: &CellValue,
        cell: &CellData,
        row_number: usize,
        messages: &mut HashSet<ImportMessage>,
    ) -> CellOutcome {
        let mut outcome = CellOutcome {
            valid: true,
            ..CellOutcome::default()
        };

        let schema = self.mapping.entity.schema();
        let Some(field) = schema.find(&column.target.name) else {
            tracing::warn!(
                entity = self.mapping.entity.name(),
                property = %column.target.name,
                "mapped property does not exist; column skipped"
            );
            return outcome;
        };
        if !column.target.kind.assignable_to(field.kind) {
            tracing::warn!(
                entity = self.mapping.entity.name(),
                property = %column.target.name,
                mapped = %column.target.kind,
                declared = %field.kind,
                "mapped kind does not fit the property; column skipped"
            );
            return outcome;
        }

        outcome.required = field.required;

        if raw.is_empty() {
            if field.required {
                outcome.logged = true;
                messages.insert(self.message(
                    MessageBuilder::new(&self.scope.templates.required_field).with(
                        placeholders::COLUMN_NAME,
                        cell.column_name.clone().unwrap_or_default(),
                    ),
                    row_number,
                    cell,
                ));
            }
            return outcome;
        }

        let current = match &column.cast {
            Some(cast) => match cast(raw, &self.hooks) {
                CastOutcome::Success(value) => {
                    outcome.valid = assign_cast(record, field, &value);
                    Some(value)
                }
                CastOutcome::Failure(builder) => {
                    messages.insert(self.message(builder, row_number, cell));
                    outcome.valid = false;
                    outcome.logged = true;
                    None
                }
                CastOutcome::Invalid => {
                    outcome.valid = false;
                    None
                }
            },
            None => {
                let accepted = raw.kind().is_some_and(|kind| column.cell_kinds.contains(&kind));
                let converted = if accepted {
                    Value::from_cell(raw, column.target.kind).and_then(|v| v.coerce_to(field.kind))
                } else {
                    None
                };
                match converted {
                    Some(value) => match record.set(&field.name, value.clone()) {
                        Ok(()) => Some(value),
                        Err(e) => {
                            tracing::warn!(property = %field.name, error = %e, "assignment failed");
                            outcome.valid = false;
                            None
                        }
                    },
                    None => {
                        outcome.valid = false;
                        None
                    }
                }
            }
        };

        let Some(value) = current.filter(|_| outcome.valid) else {
            return outcome;
        };

        for validator in &column.validators {
            let validation = validator(&value, &self.hooks);
            if let Some(builder) = validation.message {
                messages.insert(self.message(builder, row_number, cell));
                outcome.logged = true;
            }
            if !validation.valid {
                outcome.valid = false;
                break;
            }
        }

        outcome
    }

    fn message(&self, builder: MessageBuilder, row: usize, cell: &CellData) -> ImportMessage {
        self.scope
            .factory
            .create(builder, Some(self.scope.sheet_name), Some(row), Some(cell))
    }
}

/// Store a cast result; a value that does not fit the field is kept only
/// for the validators
fn assign_cast(record: &mut dyn Record, field: &FieldSpec, value: &Value) -> bool {
    if value.is_null() {
        return true;
    }

    match value.coerce_to(field.kind) {
        Some(coerced) => match record.set(&field.name, coerced) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(property = %field.name, error = %e, "assignment failed");
                false
            }
        },
        None => {
            tracing::warn!(
                property = %field.name,
                declared = %field.kind,
                value = %value,
                "cast result does not fit the property; not assigned"
            );
            true
        }
    }
}
