//! Row-backed entities, mappings and results

pub mod keys;
pub mod mapping;
pub mod record;
pub mod results;

pub use keys::{generate_keys, RowIdentity};
pub use mapping::{ColumnMapping, PropertyRef, SheetMapping};
pub use record::{AsAny, EntityType, FieldSpec, KeyPart, Model, Record, Schema};
pub use results::{
    Action, CellData, ColumnData, ExportResult, ImportResult, PendingImport, PostProcessingResult,
    PostProcessingResults, ProcessedObject,
};
