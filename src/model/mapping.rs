//! Declarative sheet and column mappings

use crate::hooks::{CastFn, StringifierFn, ValidatorFn};
use crate::model::record::{EntityType, Model};
use crate::value::{CellKind, ValueKind};
use std::collections::BTreeMap;
use std::fmt;

/// Target field of a column: name and expected kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRef {
    pub name: String,
    pub kind: ValueKind,
}

/// How one logical column maps onto a record field
#[derive(Clone)]
pub struct ColumnMapping {
    /// Raw cell kinds accepted without a cast
    pub cell_kinds: Vec<CellKind>,
    pub target: PropertyRef,
    pub cast: Option<CastFn>,
    pub validators: Vec<ValidatorFn>,
    /// Used by the exporter instead of the native cell type
    pub stringifier: Option<StringifierFn>,
    pub found_in_file: bool,
    /// Header text as seen in the file
    pub original_header_name: String,
}

impl ColumnMapping {
    /// Mapping onto `property`, accepting the cell kinds natural for `kind`
    pub fn new(property: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            cell_kinds: kind.natural_cell_kinds(),
            target: PropertyRef {
                name: property.into(),
                kind,
            },
            cast: None,
            validators: Vec::new(),
            stringifier: None,
            found_in_file: false,
            original_header_name: String::new(),
        }
    }

    pub fn accepts(mut self, kinds: &[CellKind]) -> Self {
        self.cell_kinds = kinds.to_vec();
        self
    }

    pub fn with_cast(mut self, cast: CastFn) -> Self {
        self.cast = Some(cast);
        self
    }

    pub fn with_validator(mut self, validator: ValidatorFn) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn with_stringifier(mut self, stringifier: StringifierFn) -> Self {
        self.stringifier = Some(stringifier);
        self
    }
}

impl fmt::Debug for ColumnMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnMapping")
            .field("cell_kinds", &self.cell_kinds)
            .field("target", &self.target)
            .field("cast", &self.cast.is_some())
            .field("validators", &self.validators.len())
            .field("stringifier", &self.stringifier.is_some())
            .field("found_in_file", &self.found_in_file)
            .field("original_header_name", &self.original_header_name)
            .finish()
    }
}

/// One logical worksheet: entity type plus ordered column mappings
#[derive(Debug, Clone)]
pub struct SheetMapping {
    pub entity: EntityType,
    /// Declared column key → mapping, in declaration order
    pub columns: Vec<(String, ColumnMapping)>,
    pub found_in_file: bool,
    pub original_sheet_name: String,
}

impl SheetMapping {
    pub fn new(entity: EntityType) -> Self {
        Self {
            entity,
            columns: Vec::new(),
            found_in_file: false,
            original_sheet_name: String::new(),
        }
    }

    pub fn for_model<T: Model>() -> Self {
        Self::new(EntityType::of::<T>())
    }

    pub fn column(mut self, key: impl Into<String>, mapping: ColumnMapping) -> Self {
        self.columns.push((key.into(), mapping));
        self
    }

    pub fn column_mapping(&self, key: &str) -> Option<&ColumnMapping> {
        self.columns
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, mapping)| mapping)
    }

    /// Target properties bound by more than one column
    pub fn duplicate_targets(&self) -> Vec<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for (_, mapping) in &self.columns {
            *counts.entry(mapping.target.name.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| name.to_string())
            .collect()
    }
}
