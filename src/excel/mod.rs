//! Excel import/export
//!
//! This module provides both directions of the mapping layer:
//! - Import: workbook → header resolution → row processing → [`ImportResult`]
//! - Export: entities → header row + typed cells → xlsx stream
//!
//! [`ImportResult`]: crate::model::ImportResult

pub mod columns;
mod exporter;
mod header;
mod importer;
mod layout;
mod reader;
mod row;
mod source;

pub use columns::{clean_sheet_name, column_index, column_label};
pub use exporter::{CancelSignal, EntitySource, ExcelExporter, ExportItem, ToImportModel};
pub use header::HeaderBinding;
pub use importer::ExcelImporter;
pub use reader::CalamineWorkbook;
pub use source::{GridCell, GridRow, MemoryWorkbook, SheetGrid, SheetInfo, SheetVisibility, WorkbookSource};
