//! Workbook codec boundary
//!
//! The import pipeline only sees sheets as grids of [`CellValue`]s. The
//! container format is handled by a [`WorkbookSource`] implementation:
//! [`CalamineWorkbook`](super::CalamineWorkbook) for xlsx files and
//! [`MemoryWorkbook`] for grids that are already decoded.

use crate::error::{TabellaError, TabellaResult};
use crate::value::CellValue;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetVisibility {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInfo {
    pub name: String,
    pub visibility: SheetVisibility,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    /// 1-based column
    pub column: u32,
    pub value: CellValue,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridRow {
    /// 1-based row number
    pub number: usize,
    pub hidden: bool,
    pub cells: Vec<GridCell>,
}

impl GridRow {
    pub fn cell(&self, column: u32) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|cell| cell.column == column)
            .map(|cell| &cell.value)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| cell.value.is_empty())
    }
}

/// Decoded worksheet content, rows in document order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetGrid {
    pub rows: Vec<GridRow>,
    pub hidden_columns: BTreeSet<u32>,
}

pub trait WorkbookSource {
    /// Sheets in workbook order
    fn sheets(&self) -> Vec<SheetInfo>;

    fn read_sheet(&mut self, name: &str) -> TabellaResult<SheetGrid>;
}

#[derive(Debug, Clone)]
struct MemorySheet {
    info: SheetInfo,
    grid: SheetGrid,
}

/// In-memory workbook
///
/// ```
/// use tabella::excel::MemoryWorkbook;
/// use tabella::value::CellValue;
///
/// let workbook = MemoryWorkbook::new()
///     .sheet("Orders")
///     .row(vec!["Code".into(), "Amount".into()])
///     .row(vec!["A-1".into(), CellValue::Number(3.0)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<MemorySheet>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new visible sheet; following calls add to it
    pub fn sheet(self, name: &str) -> Self {
        self.sheet_with_visibility(name, SheetVisibility::Visible)
    }

    pub fn hidden_sheet(self, name: &str) -> Self {
        self.sheet_with_visibility(name, SheetVisibility::Hidden)
    }

    fn sheet_with_visibility(mut self, name: &str, visibility: SheetVisibility) -> Self {
        self.sheets.push(MemorySheet {
            info: SheetInfo {
                name: name.to_string(),
                visibility,
            },
            grid: SheetGrid::default(),
        });
        self
    }

    /// Append a row starting at column A
    pub fn row(self, values: Vec<CellValue>) -> Self {
        self.push_row(values, false)
    }

    pub fn hidden_row(self, values: Vec<CellValue>) -> Self {
        self.push_row(values, true)
    }

    /// Mark a 1-based column of the current sheet as hidden
    pub fn hide_column(mut self, column: u32) -> Self {
        if let Some(sheet) = self.sheets.last_mut() {
            sheet.grid.hidden_columns.insert(column);
        }
        self
    }

    fn push_row(mut self, values: Vec<CellValue>, hidden: bool) -> Self {
        if self.sheets.is_empty() {
            self = self.sheet("Sheet1");
        }
        if let Some(sheet) = self.sheets.last_mut() {
            let number = sheet.grid.rows.len() + 1;
            let cells = values
                .into_iter()
                .enumerate()
                .map(|(i, value)| GridCell {
                    column: i as u32 + 1,
                    value,
                })
                .collect();
            sheet.grid.rows.push(GridRow {
                number,
                hidden,
                cells,
            });
        }
        self
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn sheets(&self) -> Vec<SheetInfo> {
        self.sheets.iter().map(|s| s.info.clone()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> TabellaResult<SheetGrid> {
        self.sheets
            .iter()
            .find(|s| s.info.name == name)
            .map(|s| s.grid.clone())
            .ok_or_else(|| TabellaError::Workbook(format!("Sheet '{}' does not exist", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_workbook_numbers_rows_and_columns() {
        let mut workbook = MemoryWorkbook::new()
            .sheet("Data")
            .row(vec!["a".into(), "b".into()])
            .hidden_row(vec!["c".into()])
            .hide_column(2);

        let grid = workbook.read_sheet("Data").unwrap();
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[1].number, 2);
        assert!(grid.rows[1].hidden);
        assert_eq!(grid.rows[0].cell(2), Some(&CellValue::Text("b".into())));
        assert!(grid.hidden_columns.contains(&2));
    }

    #[test]
    fn test_memory_workbook_missing_sheet() {
        let mut workbook = MemoryWorkbook::new().sheet("Data");
        assert!(matches!(
            workbook.read_sheet("Other"),
            Err(TabellaError::Workbook(_))
        ));
    }

    #[test]
    fn test_blank_row() {
        let row = GridRow {
            number: 1,
            hidden: false,
            cells: vec![GridCell {
                column: 1,
                value: CellValue::Empty,
            }],
        };
        assert!(row.is_blank());
    }
}
