//! Excel exporter - records → worksheets

use super::columns::clean_sheet_name;
use crate::config::TabellaOptions;
use crate::error::{TabellaError, TabellaResult};
use crate::model::{EntityType, ExportResult, Record, SheetMapping};
use crate::value::Value;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDateTime, Timelike};
use rust_xlsxwriter::{Color, ExcelDateTime, Format, Workbook, Worksheet};
use std::io::Write;
use tokio::sync::watch;

/// Cancellation flag; `true` means stop
pub type CancelSignal = watch::Receiver<bool>;

/// Application items that convert themselves into a row model
pub trait ToImportModel: Send + Sync {
    fn to_import_model(&self) -> anyhow::Result<Box<dyn Record>>;
}

/// One entity handed to the exporter
pub enum ExportItem {
    /// Already shaped as a row model
    Model(Box<dyn Record>),
    /// Needs converting first
    Entity(Box<dyn ToImportModel>),
}

/// Supplies the entities of one sheet
#[async_trait]
pub trait EntitySource: Send + Sync {
    async fn fetch(
        &self,
        entity: &EntityType,
        cancel: &CancelSignal,
    ) -> anyhow::Result<Vec<ExportItem>>;
}

/// Writes sheet mappings and their entities to an xlsx stream
pub struct ExcelExporter {
    header_format: Format,
    date_format: Format,
}

const DATE_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

impl ExcelExporter {
    pub fn new(options: &TabellaOptions) -> Self {
        let header_format = Format::new()
            .set_bold()
            .set_font_color(argb_color(&options.header_text_color))
            .set_background_color(argb_color(&options.header_background_color));

        Self {
            header_format,
            date_format: Format::new().set_num_format(DATE_NUM_FORMAT),
        }
    }

    /// Export every mapping as one worksheet, in order.
    ///
    /// Per-entity problems become warnings. Fetch failures, cancellation and
    /// write failures make the result unsuccessful; nothing is returned as
    /// an error.
    pub async fn export_sheets<W: Write>(
        &self,
        out: &mut W,
        mappings: &[(String, SheetMapping)],
        source: &dyn EntitySource,
        cancel: &CancelSignal,
    ) -> ExportResult {
        let mut result = ExportResult::default();

        let written = self
            .write_workbook(out, mappings, source, cancel, &mut result)
            .await;
        if let Err(e) = written {
            tracing::warn!(error = %e, "export failed");
            result.is_success = false;
            result.warnings.push(e.to_string());
        }

        result
    }

    async fn write_workbook<W: Write>(
        &self,
        out: &mut W,
        mappings: &[(String, SheetMapping)],
        source: &dyn EntitySource,
        cancel: &CancelSignal,
        result: &mut ExportResult,
    ) -> TabellaResult<()> {
        let mut workbook = Workbook::new();

        for (sheet_name, mapping) in mappings {
            if *cancel.borrow() {
                return Err(TabellaError::Export("Export cancelled".to_string()));
            }

            let items = source.fetch(&mapping.entity, cancel).await.map_err(|e| {
                TabellaError::Export(format!(
                    "Failed to fetch entities for sheet '{}': {}",
                    sheet_name, e
                ))
            })?;

            let mut worksheet = Worksheet::new();
            worksheet
                .set_name(clean_sheet_name(sheet_name))
                .map_err(|e| TabellaError::Export(format!("Failed to set worksheet name: {}", e)))?;

            self.write_header(&mut worksheet, mapping)?;
            self.write_rows(&mut worksheet, sheet_name, mapping, items, result)?;
            worksheet.autofit();

            tracing::debug!(sheet = %sheet_name, "sheet exported");
            workbook.push_worksheet(worksheet);
        }

        let buffer = workbook
            .save_to_buffer()
            .map_err(|e| TabellaError::Export(format!("Failed to save workbook: {}", e)))?;
        out.write_all(&buffer)?;
        out.flush()?;
        Ok(())
    }

    /// Header-only workbook for each mapping
    pub fn write_template<W: Write>(
        &self,
        out: &mut W,
        mappings: &[(String, SheetMapping)],
    ) -> TabellaResult<()> {
        let mut workbook = Workbook::new();
        for (sheet_name, mapping) in mappings {
            let mut worksheet = Worksheet::new();
            worksheet
                .set_name(clean_sheet_name(sheet_name))
                .map_err(|e| TabellaError::Export(format!("Failed to set worksheet name: {}", e)))?;
            self.write_header(&mut worksheet, mapping)?;
            worksheet.autofit();
            workbook.push_worksheet(worksheet);
        }

        let buffer = workbook
            .save_to_buffer()
            .map_err(|e| TabellaError::Export(format!("Failed to save workbook: {}", e)))?;
        out.write_all(&buffer)?;
        out.flush()?;
        Ok(())
    }

    fn write_header(
        &self,
        worksheet: &mut Worksheet,
        mapping: &SheetMapping,
    ) -> TabellaResult<()> {
        for (col_idx, (key, column)) in mapping.columns.iter().enumerate() {
            let text = if column.original_header_name.trim().is_empty() {
                key.as_str()
            } else {
                column.original_header_name.as_str()
            };
            worksheet
                .write_string_with_format(0, col_idx as u16, text, &self.header_format)
                .map_err(|e| TabellaError::Export(format!("Failed to write header: {}", e)))?;
        }
        Ok(())
    }

    fn write_rows(
        &self,
        worksheet: &mut Worksheet,
        sheet_name: &str,
        mapping: &SheetMapping,
        items: Vec<ExportItem>,
        result: &mut ExportResult,
    ) -> TabellaResult<()> {
        let schema = mapping.entity.schema();

        for (offset, item) in items.into_iter().enumerate() {
            let row = offset as u32 + 1;

            let model = match item {
                ExportItem::Model(model) => model,
                ExportItem::Entity(entity) => match entity.to_import_model() {
                    Ok(model) => model,
                    Err(e) => {
                        let warning = format!(
                            "Conversion to import model failed for sheet '{}' on row {}: {}. Writing empty row.",
                            sheet_name,
                            row + 1,
                            e
                        );
                        tracing::warn!("{}", warning);
                        result.warnings.push(warning);
                        // row stays blank
                        continue;
                    }
                },
            };

            for (col_idx, (key, column)) in mapping.columns.iter().enumerate() {
                let col = col_idx as u16;
                let property = &column.target.name;

                if schema.find(property).is_none() {
                    let warning = format!(
                        "Property '{}' not found on import model '{}'.",
                        property,
                        mapping.entity.name()
                    );
                    tracing::warn!("{}", warning);
                    if !result.warnings.contains(&warning) {
                        result.warnings.push(warning);
                    }
                    self.write_text(worksheet, row, col, "")?;
                    continue;
                }

                let value = model.get(property);

                match &column.stringifier {
                    Some(stringify) => match stringify(&value) {
                        Some(text) => self.write_text(worksheet, row, col, &text)?,
                        None => {
                            let warning = format!(
                                "Stringifier failed for column '{}' (property '{}') on row {}. Writing empty cell.",
                                key,
                                property,
                                row + 1
                            );
                            tracing::warn!("{}", warning);
                            result.warnings.push(warning);
                            self.write_text(worksheet, row, col, "")?;
                        }
                    },
                    None => {
                        if let Some(reason) = self.write_value(worksheet, row, col, &value)? {
                            let warning = format!(
                                "Value of column '{}' (property '{}') on row {} cannot be written: {}. Writing empty cell.",
                                key,
                                property,
                                row + 1,
                                reason
                            );
                            tracing::warn!("{}", warning);
                            result.warnings.push(warning);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Write a typed cell. `Ok(Some(reason))` means the value has no cell
    /// representation and the cell was left empty.
    fn write_value(
        &self,
        worksheet: &mut Worksheet,
        row: u32,
        col: u16,
        value: &Value,
    ) -> TabellaResult<Option<String>> {
        let written = match value {
            Value::Null => return Ok(None),
            Value::Integer(i) => worksheet.write_number(row, col, *i as f64).map(|_| ()),
            Value::Float(n) | Value::Decimal(n) => {
                worksheet.write_number(row, col, *n).map(|_| ())
            }
            Value::Bool(b) => worksheet.write_boolean(row, col, *b).map(|_| ()),
            Value::DateTime(dt) => match excel_datetime(dt) {
                Some(excel_dt) => worksheet
                    .write_datetime_with_format(row, col, &excel_dt, &self.date_format)
                    .map(|_| ()),
                None => return Ok(Some(format!("date {} is outside the Excel date range", dt))),
            },
            Value::Text(s) => return self.write_text(worksheet, row, col, s).map(|_| None),
        };

        written
            .map(|_| None)
            .map_err(|e| TabellaError::Export(format!("Failed to write cell: {}", e)))
    }

    fn write_text(
        &self,
        worksheet: &mut Worksheet,
        row: u32,
        col: u16,
        text: &str,
    ) -> TabellaResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        worksheet
            .write_string(row, col, text)
            .map(|_| ())
            .map_err(|e| TabellaError::Export(format!("Failed to write cell: {}", e)))
    }
}

/// `None` outside the years 1900..=9999 a worksheet can hold
fn excel_datetime(dt: &NaiveDateTime) -> Option<ExcelDateTime> {
    let year = u16::try_from(dt.year()).ok()?;

    ExcelDateTime::from_ymd(year, dt.month() as u8, dt.day() as u8)
        .and_then(|date| date.and_hms(dt.hour() as u16, dt.minute() as u8, dt.second()))
        .ok()
}

/// `AARRGGBB` (or `RRGGBB`) hex to a writer colour; alpha is ignored
fn argb_color(hex: &str) -> Color {
    let hex = hex.trim().trim_start_matches('#');
    let rgb = if hex.is_ascii() && hex.len() > 6 {
        &hex[hex.len() - 6..]
    } else {
        hex
    };
    match u32::from_str_radix(rgb, 16) {
        Ok(value) => Color::RGB(value),
        Err(_) => {
            tracing::warn!(color = hex, "invalid header colour; using black");
            Color::Black
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_argb_color_drops_alpha() {
        assert!(matches!(argb_color("FFF54900"), Color::RGB(0xF54900)));
        assert!(matches!(argb_color("#FFFFFF"), Color::RGB(0xFFFFFF)));
        assert!(matches!(argb_color("zz"), Color::Black));
    }

    #[test]
    fn test_excel_datetime_accepts_calendar_dates() {
        let dt = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(13, 5, 9)
            .unwrap();
        assert!(excel_datetime(&dt).is_some());
    }

    #[test]
    fn test_excel_datetime_rejects_years_outside_excel_range() {
        let before = NaiveDate::from_ymd_opt(1850, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(excel_datetime(&before).is_none());
    }
}
