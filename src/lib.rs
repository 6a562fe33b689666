//! Tabella - declarative spreadsheet import/export
//!
//! This library maps worksheets onto strongly typed rows and back. Columns are
//! declared once per sheet; the importer resolves headers, coerces cells,
//! runs cast/validation hooks, derives composite keys and collects
//! diagnostics. The exporter writes the same mappings back out.
//!
//! # Features
//!
//! - Header resolution insensitive to case and punctuation
//! - Custom cast, validator and stringifier hooks per column
//! - Deterministic 128-bit composite keys for duplicate detection
//! - Date-range validity, overlap and containment checks
//! - YAML mapping files for schema-at-runtime imports
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::path::Path;
//! use tabella::dynamic::MappingFile;
//! use tabella::{ExcelImporter, TabellaOptions};
//!
//! let options = TabellaOptions::default();
//! let mut mappings = MappingFile::load(Path::new("prices.yaml"))?.sheet_mappings()?;
//!
//! let importer = ExcelImporter::new(&options);
//! let file = File::open("prices.xlsx")?;
//! if let Some(result) = importer.process_sheeted_file(file, &mut mappings, 0)? {
//!     for message in result.sorted_messages() {
//!         println!("{}", message);
//!     }
//! }
//! # Ok::<(), tabella::TabellaError>(())
//! ```

pub mod cli;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod excel;
pub mod hooks;
pub mod messages;
pub mod model;
pub mod validation;
pub mod value;

// Re-export commonly used types
pub use config::TabellaOptions;
pub use error::{TabellaError, TabellaResult};
pub use excel::{ExcelExporter, ExcelImporter, MemoryWorkbook, WorkbookSource};
pub use messages::{ImportMessage, Severity};
pub use model::{
    ColumnMapping, EntityType, FieldSpec, ImportResult, Model, Record, Schema, SheetMapping,
};
pub use validation::{DateRange, ImportValidator};
pub use value::{CellKind, CellValue, Value, ValueKind};
