//! Excel importer - worksheets → typed records

use super::columns::normalized_sheet_name;
use super::header::{report_missing_columns, resolve_headers, SheetScope};
use super::reader::CalamineWorkbook;
use super::row::RowProcessor;
use super::source::{GridRow, SheetGrid, SheetVisibility, WorkbookSource};
use crate::config::TabellaOptions;
use crate::error::{TabellaError, TabellaResult};
use crate::hooks::formatters::to_clean_string;
use crate::messages::{placeholders, MessageBuilder, MessageFactory, MessageTemplates};
use crate::model::{generate_keys, ImportResult, ProcessedObject, SheetMapping};
use crate::value::CellValue;
use std::collections::BTreeSet;
use std::io::{Read, Seek};

/// Runs sheet mappings against a workbook
pub struct ExcelImporter {
    templates: MessageTemplates,
    factory: MessageFactory,
}

impl ExcelImporter {
    pub fn new(options: &TabellaOptions) -> Self {
        Self {
            templates: MessageTemplates::from_keys(&options.templates),
            factory: MessageFactory::new(options.default_sender.clone()),
        }
    }

    pub fn templates(&self) -> &MessageTemplates {
        &self.templates
    }

    /// Import an xlsx stream.
    ///
    /// Returns `Ok(None)` when the container holds no worksheets.
    /// `header_row_index` is zero-based over the sheet's visible, non-blank
    /// rows.
    pub fn process_sheeted_file<R: Read + Seek>(
        &self,
        reader: R,
        mappings: &mut [(String, SheetMapping)],
        header_row_index: usize,
    ) -> TabellaResult<Option<ImportResult>> {
        let mut workbook = CalamineWorkbook::open(reader)?;
        if workbook.is_empty() {
            tracing::debug!("workbook has no worksheets");
            return Ok(None);
        }
        self.process_workbook(&mut workbook, mappings, header_row_index)
            .map(Some)
    }

    /// Import from any decoded workbook
    pub fn process_workbook<W: WorkbookSource>(
        &self,
        workbook: &mut W,
        mappings: &mut [(String, SheetMapping)],
        header_row_index: usize,
    ) -> TabellaResult<ImportResult> {
        for (sheet, mapping) in mappings.iter() {
            let properties = mapping.duplicate_targets();
            if !properties.is_empty() {
                return Err(TabellaError::DuplicatePropertyMapping {
                    sheet: sheet.clone(),
                    properties,
                });
            }
        }

        for (_, mapping) in mappings.iter_mut() {
            reset_found_flags(mapping);
        }

        let visible: Vec<String> = workbook
            .sheets()
            .into_iter()
            .filter(|sheet| sheet.visibility == SheetVisibility::Visible)
            .map(|sheet| sheet.name)
            .collect();

        let mut result = ImportResult::default();

        for (declared, mapping) in mappings.iter_mut() {
            let wanted = normalized_sheet_name(declared);
            let Some(actual) = visible
                .iter()
                .find(|name| normalized_sheet_name(name) == wanted)
            else {
                tracing::debug!(sheet = %declared, "no matching worksheet");
                continue;
            };

            mapping.found_in_file = true;
            mapping.original_sheet_name = actual.clone();
            tracing::debug!(sheet = %declared, worksheet = %actual, "worksheet matched");

            let grid = workbook.read_sheet(actual)?;
            let objects =
                self.process_sheet(actual, &grid, mapping, header_row_index, &mut result);
            result
                .processed
                .entry(mapping.entity.name().to_string())
                .or_default()
                .extend(objects);
        }

        self.report_missing_sheets(mappings, &mut result);
        Ok(result)
    }

    fn process_sheet(
        &self,
        sheet_name: &str,
        grid: &SheetGrid,
        mapping: &mut SheetMapping,
        header_row_index: usize,
        result: &mut ImportResult,
    ) -> Vec<ProcessedObject> {
        let scope = SheetScope {
            sheet_name,
            factory: &self.factory,
            templates: &self.templates,
        };

        let rows: Vec<GridRow> = grid
            .rows
            .iter()
            .filter(|row| !row.hidden)
            .map(|row| collect_cells(row, &grid.hidden_columns))
            .filter(|row| !row.cells.is_empty())
            .collect();

        let Some(header) = rows.get(header_row_index) else {
            result.messages.insert(self.factory.create(
                MessageBuilder::new(&self.templates.header_not_found_at_index)
                    .with(placeholders::INDEX, header_row_index.to_string()),
                Some(sheet_name),
                None,
                None,
            ));
            return Vec::new();
        };

        let bindings = resolve_headers(header, &mut mapping.columns, &scope, &mut result.messages);

        let mut accepted = Vec::new();
        {
            let processor = RowProcessor::new(&scope, mapping, &bindings);
            for row in &rows[header_row_index + 1..] {
                let Some(mut object) = processor.process(row, &mut result.messages) else {
                    continue;
                };

                let row_index = Some(object.row_index);
                generate_keys(object.object.as_mut(), mapping.entity.schema(), row_index);
                let identity = object.object.identity_mut();
                identity.sheet_name = Some(object.sheet_name.clone());
                identity.column_data = object.column_data.clone();
                accepted.push(object);
            }
        }

        report_missing_columns(&mapping.columns, &scope, &mut result.messages);
        tracing::debug!(sheet = sheet_name, accepted = accepted.len(), "sheet processed");
        accepted
    }

    fn report_missing_sheets(
        &self,
        mappings: &[(String, SheetMapping)],
        result: &mut ImportResult,
    ) {
        if mappings.iter().all(|(_, mapping)| !mapping.found_in_file) {
            result.messages.insert(self.factory.create(
                MessageBuilder::new(&self.templates.no_worksheets_found),
                None,
                None,
                None,
            ));
            return;
        }

        for (declared, _) in mappings.iter().filter(|(_, m)| !m.found_in_file) {
            result.messages.insert(self.factory.create(
                MessageBuilder::new(&self.templates.worksheet_not_found)
                    .with(placeholders::SHEET_NAME, declared.as_str()),
                Some(declared),
                None,
                None,
            ));
        }
    }
}

fn reset_found_flags(mapping: &mut SheetMapping) {
    mapping.found_in_file = false;
    mapping.original_sheet_name.clear();
    for (_, column) in mapping.columns.iter_mut() {
        column.found_in_file = false;
        column.original_header_name.clear();
    }
}

/// Cells of a row as the pipeline sees them: hidden columns dropped, text
/// without any letter or digit treated as empty
fn collect_cells(row: &GridRow, hidden_columns: &BTreeSet<u32>) -> GridRow {
    let cells = row
        .cells
        .iter()
        .filter(|cell| !hidden_columns.contains(&cell.column))
        .filter(|cell| match &cell.value {
            CellValue::Empty => false,
            CellValue::Text(text) => !to_clean_string(text).is_empty(),
            _ => true,
        })
        .cloned()
        .collect();

    GridRow {
        number: row.number,
        hidden: row.hidden,
        cells,
    }
}
