//! Import/export results and post-processing buckets

use crate::messages::ImportMessage;
use crate::model::record::Record;
use crate::value::ValueKind;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Provenance of one cell: header text, 1-based column and raw text
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct CellData {
    pub column_name: Option<String>,
    pub column_index: u32,
    pub cell_value: Option<String>,
}

/// Per-property provenance recorded on a processed row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnData {
    pub property_kind: ValueKind,
    pub target_property: String,
    pub cell: CellData,
}

/// One accepted row
#[derive(Debug)]
pub struct ProcessedObject {
    pub object: Box<dyn Record>,
    pub sheet_name: String,
    /// 1-based row number in the sheet
    pub row_index: usize,
    /// Keyed by target property name
    pub column_data: BTreeMap<String, ColumnData>,
}

impl ProcessedObject {
    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    pub fn cell(&self, property: &str) -> Option<&CellData> {
        self.column_data.get(property).map(|data| &data.cell)
    }
}

/// Everything one import call produced
#[derive(Debug, Default)]
pub struct ImportResult {
    /// Accepted rows keyed by entity name
    pub processed: BTreeMap<String, Vec<ProcessedObject>>,
    pub messages: HashSet<ImportMessage>,
}

impl ImportResult {
    pub fn objects(&self, entity: &str) -> &[ProcessedObject] {
        self.processed.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_negative_messages(&self) -> bool {
        self.messages.iter().any(|m| m.severity.is_negative())
    }

    /// Messages in a stable order (sheet, row, column, key)
    pub fn sorted_messages(&self) -> Vec<&ImportMessage> {
        let mut messages: Vec<&ImportMessage> = self.messages.iter().collect();
        messages.sort_by(|a, b| {
            (&a.sheet_name, a.row_index, &a.column, &a.translation_key).cmp(&(
                &b.sheet_name,
                b.row_index,
                &b.column,
                &b.translation_key,
            ))
        });
        messages
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportResult {
    pub is_success: bool,
    pub warnings: Vec<String>,
}

impl Default for ExportResult {
    fn default() -> Self {
        Self {
            is_success: true,
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Action {
    Create,
    Update,
}

/// A row waiting for the caller's persistence decision
#[derive(Debug, Clone)]
pub struct PendingImport<A, M> {
    pub app_item: Option<A>,
    pub model: M,
    pub sheet_name: String,
    pub row_index: usize,
    pub action: Action,
}

/// Classification of imported rows against existing application items
#[derive(Debug, Clone)]
pub struct PostProcessingResult<A, M> {
    pub existing: Vec<(A, M)>,
    pub creating: Vec<(A, M)>,
    pub updating: Vec<(A, M)>,
    pub imported_models: Vec<M>,
    pub pending: Vec<PendingImport<A, M>>,
    combined: Vec<(A, M)>,
}

impl<A, M> Default for PostProcessingResult<A, M> {
    fn default() -> Self {
        Self {
            existing: Vec::new(),
            creating: Vec::new(),
            updating: Vec::new(),
            imported_models: Vec::new(),
            pending: Vec::new(),
            combined: Vec::new(),
        }
    }
}

impl<A: Clone, M: Record + Clone> PostProcessingResult<A, M> {
    /// Overlay `updating` onto `existing` by identity key (later entries
    /// win), then append `creating`.
    pub fn generate_combined(&mut self) {
        let mut combined: Vec<(A, M)> = Vec::new();
        let mut positions: HashMap<u128, usize> = HashMap::new();

        for entry in self.existing.iter().chain(self.updating.iter()) {
            match entry.1.identity().key {
                Some(key) => match positions.get(&key) {
                    Some(&index) => combined[index] = entry.clone(),
                    None => {
                        positions.insert(key, combined.len());
                        combined.push(entry.clone());
                    }
                },
                None => combined.push(entry.clone()),
            }
        }

        combined.extend(self.creating.iter().cloned());
        self.combined = combined;
    }

    pub fn combined(&self) -> &[(A, M)] {
        &self.combined
    }
}

/// Post-processing results of several entity types, keyed by type
#[derive(Default)]
pub struct PostProcessingResults {
    results: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PostProcessingResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<A, M>(&mut self, result: PostProcessingResult<A, M>)
    where
        A: Send + Sync + 'static,
        M: Send + Sync + 'static,
    {
        self.results
            .insert(TypeId::of::<PostProcessingResult<A, M>>(), Box::new(result));
    }

    pub fn get<A: 'static, M: 'static>(&self) -> Option<&PostProcessingResult<A, M>> {
        self.results
            .get(&TypeId::of::<PostProcessingResult<A, M>>())
            .and_then(|result| result.downcast_ref::<PostProcessingResult<A, M>>())
    }

    pub fn get_mut<A: 'static, M: 'static>(&mut self) -> Option<&mut PostProcessingResult<A, M>> {
        self.results
            .get_mut(&TypeId::of::<PostProcessingResult<A, M>>())
            .and_then(|result| result.downcast_mut::<PostProcessingResult<A, M>>())
    }
}
