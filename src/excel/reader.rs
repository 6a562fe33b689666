//! xlsx decoding via calamine

use super::layout::PackageLayout;
use super::source::{GridCell, GridRow, SheetGrid, SheetInfo, SheetVisibility, WorkbookSource};
use crate::error::{TabellaError, TabellaResult};
use crate::value::{parse_datetime, CellValue};
use calamine::{Data, Reader, SheetVisible, Xlsx};
use std::io::{Cursor, Read};
use std::sync::Arc;

type Package = Cursor<Arc<[u8]>>;

/// [`WorkbookSource`] over an xlsx stream.
///
/// Cell data comes from calamine, row and column hidden flags from the
/// worksheet parts of the same package.
pub struct CalamineWorkbook {
    workbook: Xlsx<Package>,
    layout: PackageLayout<Package>,
}

impl CalamineWorkbook {
    pub fn open<R: Read>(mut reader: R) -> TabellaResult<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let bytes: Arc<[u8]> = bytes.into();

        let workbook = Xlsx::new(Cursor::new(Arc::clone(&bytes)))
            .map_err(|e| TabellaError::Workbook(format!("Failed to open workbook: {}", e)))?;
        let layout = PackageLayout::open(Cursor::new(bytes))?;
        Ok(Self { workbook, layout })
    }

    pub fn is_empty(&self) -> bool {
        self.workbook.sheet_names().is_empty()
    }
}

impl WorkbookSource for CalamineWorkbook {
    fn sheets(&self) -> Vec<SheetInfo> {
        self.workbook
            .sheets_metadata()
            .iter()
            .map(|sheet| SheetInfo {
                name: sheet.name.clone(),
                visibility: match sheet.visible {
                    SheetVisible::Visible => SheetVisibility::Visible,
                    SheetVisible::Hidden => SheetVisibility::Hidden,
                    SheetVisible::VeryHidden => SheetVisibility::VeryHidden,
                },
            })
            .collect()
    }

    fn read_sheet(&mut self, name: &str) -> TabellaResult<SheetGrid> {
        let range = self
            .workbook
            .worksheet_range(name)
            .map_err(|e| TabellaError::Workbook(format!("Failed to read sheet '{}': {}", name, e)))?;

        let Some((first_row, first_col)) = range.start() else {
            return Ok(SheetGrid::default());
        };
        let layout = self.layout.sheet(name)?;

        let mut rows = Vec::new();
        for (offset, row) in range.rows().enumerate() {
            let cells: Vec<GridCell> = row
                .iter()
                .enumerate()
                .map(|(col, data)| GridCell {
                    column: first_col + col as u32 + 1,
                    value: cell_value(data),
                })
                .filter(|cell| !cell.value.is_empty())
                .collect();

            if cells.is_empty() {
                continue;
            }

            let number = first_row as usize + offset + 1;
            rows.push(GridRow {
                number,
                hidden: layout.hidden_rows.contains(&number),
                cells,
            });
        }

        Ok(SheetGrid {
            rows,
            hidden_columns: layout.hidden_columns,
        })
    }
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::DateTime(naive),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match parse_datetime(s) {
            Some(naive) => CellValue::DateTime(naive),
            None => CellValue::Text(s.clone()),
        },
        other => CellValue::Text(other.to_string()),
    }
}
