//! Mappings declared in YAML instead of code
//!
//! A mapping file names each worksheet, the entity it produces and its
//! columns. Rows are held in a [`DynamicRecord`], a field map checked against
//! the schema built from the file.
//!
//! ```yaml
//! sheets:
//!   - name: Prices
//!     entity: Price
//!     columns:
//!       - header: Code
//!         property: code
//!         kind: text
//!         required: true
//!         key: true
//!       - header: Valid from
//!         property: valid_from
//!         kind: datetime
//!         cast: to_min_hours_date
//!         stringifier: { type: date, pattern: "%d.%m.%Y" }
//!       - header: Amount
//!         property: amount
//!         kind: decimal
//!         accepts: [number, text]
//!         cast: to_decimal
//!         validators:
//!           - { rule: numeric_range, min: 0, max: 1000 }
//! ```

use crate::error::{TabellaError, TabellaResult};
use crate::excel::{CancelSignal, EntitySource, ExportItem};
use crate::hooks::{self, casts, stringifiers, validators, CastFn, StringifierFn, ValidatorFn};
use crate::model::{
    ColumnMapping, EntityType, FieldSpec, ImportResult, Record, RowIdentity, Schema, SheetMapping,
};
use crate::value::{parse_datetime, CellKind, Value, ValueKind};
use async_trait::async_trait;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Record whose fields come from a runtime [`Schema`]
#[derive(Debug, Clone)]
pub struct DynamicRecord {
    schema: Arc<Schema>,
    values: BTreeMap<String, Value>,
    lookup_keys: BTreeMap<String, u128>,
    identity: RowIdentity,
}

impl DynamicRecord {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            values: BTreeMap::new(),
            lookup_keys: BTreeMap::new(),
            identity: RowIdentity::default(),
        }
    }

    /// Build a record from a JSON object; unknown properties are skipped
    pub fn from_json(schema: Arc<Schema>, row: &Map<String, JsonValue>) -> TabellaResult<Self> {
        let mut record = Self::new(schema);

        for (name, raw) in row {
            let Some(field) = record.schema.find(name) else {
                tracing::warn!(property = %name, "unknown property in data row; skipped");
                continue;
            };
            let value = json_to_value(raw, field.kind).ok_or_else(|| {
                let reason = format!("expected {} value, got {}", field.kind, raw);
                TabellaError::field(name.as_str(), reason)
            })?;
            let field_name = field.name.to_string();
            record.set(&field_name, value)?;
        }

        Ok(record)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Derived lookup key stored under `target`
    pub fn lookup_key(&self, target: &str) -> Option<u128> {
        self.lookup_keys.get(target).copied()
    }
}

impl Record for DynamicRecord {
    fn get(&self, field: &str) -> Value {
        self.schema
            .find(field)
            .and_then(|spec| self.values.get(spec.name.as_ref()))
            .cloned()
            .unwrap_or_default()
    }

    fn set(&mut self, field: &str, value: Value) -> TabellaResult<()> {
        let spec = self
            .schema
            .find(field)
            .ok_or_else(|| TabellaError::field(field, "no such property"))?;

        if value.is_null() {
            self.values.remove(spec.name.as_ref());
            return Ok(());
        }

        let coerced = value.coerce_to(spec.kind).ok_or_else(|| {
            TabellaError::field(field, format!("{} does not fit a {} property", value, spec.kind))
        })?;
        self.values.insert(spec.name.to_string(), coerced);
        Ok(())
    }

    fn identity(&self) -> &RowIdentity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut RowIdentity {
        &mut self.identity
    }

    fn set_lookup_key(&mut self, target: &str, key: Option<u128>) {
        match key {
            Some(key) => self.lookup_keys.insert(target.to_string(), key),
            None => self.lookup_keys.remove(target),
        };
    }
}

/// Serialises every schema field in declaration order; unset fields are null
impl Serialize for DynamicRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.schema.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for field in fields {
            map.serialize_entry(field.name.as_ref(), &self.get(&field.name))?;
        }
        map.end()
    }
}

impl EntityType {
    /// Entity whose instances are [`DynamicRecord`]s over `schema`
    pub fn dynamic(name: impl Into<String>, schema: Schema) -> Self {
        let shared = Arc::new(schema);
        let for_factory = Arc::clone(&shared);
        Self::from_shared(name, shared, move || {
            Box::new(DynamicRecord::new(Arc::clone(&for_factory)))
        })
    }
}

fn json_to_value(raw: &JsonValue, kind: ValueKind) -> Option<Value> {
    if raw.is_null() {
        return Some(Value::Null);
    }

    match kind {
        ValueKind::Text => match raw {
            JsonValue::String(s) => Some(Value::Text(s.clone())),
            JsonValue::Number(n) => Some(Value::Text(n.to_string())),
            JsonValue::Bool(b) => Some(Value::Text(b.to_string())),
            _ => None,
        },
        ValueKind::Integer => raw.as_i64().map(Value::Integer),
        ValueKind::Float => raw.as_f64().map(Value::Float),
        ValueKind::Decimal => raw.as_f64().map(Value::Decimal),
        ValueKind::Bool => raw.as_bool().map(Value::Bool),
        ValueKind::DateTime => raw.as_str().and_then(parse_datetime).map(Value::DateTime),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mapping file
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingFile {
    pub sheets: Vec<SheetSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetSpec {
    /// Worksheet name as declared; matched case- and punctuation-insensitively
    pub name: String,
    /// Entity name; defaults to the sheet name
    #[serde(default)]
    pub entity: Option<String>,
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnSpec {
    pub header: String,
    pub property: String,
    pub kind: ValueKind,
    #[serde(default)]
    pub required: bool,
    /// Cell kinds accepted without a cast; defaults to the kind's natural ones
    #[serde(default)]
    pub accepts: Option<Vec<CellKind>>,
    /// Part of the composite key, labelled with the header
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub exclude_from_lookup: bool,
    #[serde(default)]
    pub lookup_target: Option<String>,
    #[serde(default)]
    pub cast: Option<String>,
    #[serde(default)]
    pub validators: Vec<ValidatorSpec>,
    #[serde(default)]
    pub stringifier: Option<StringifierSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidatorSpec {
    NumericRange {
        min: f64,
        max: f64,
        #[serde(default)]
        allow_null: bool,
    },
    StringLength {
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
        #[serde(default)]
        allow_null: bool,
    },
    DecimalPrecisionScale {
        precision: usize,
        scale: usize,
        #[serde(default)]
        allow_null: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StringifierSpec {
    Text {
        #[serde(default)]
        allow_null: bool,
    },
    Date {
        pattern: String,
        #[serde(default)]
        allow_null: bool,
    },
}

impl MappingFile {
    pub fn load(path: &Path) -> TabellaResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> TabellaResult<Self> {
        let file: MappingFile = serde_yaml::from_str(content)?;
        if file.sheets.is_empty() {
            return Err(TabellaError::Mapping("mapping declares no sheets".to_string()));
        }
        Ok(file)
    }

    /// Sheet mappings in declaration order, hooks resolved by name
    pub fn sheet_mappings(&self) -> TabellaResult<Vec<(String, SheetMapping)>> {
        self.sheets
            .iter()
            .map(|sheet| Ok((sheet.name.clone(), sheet.to_mapping()?)))
            .collect()
    }
}

impl SheetSpec {
    fn schema(&self) -> Schema {
        let mut fields: Vec<FieldSpec> = Vec::new();
        for column in &self.columns {
            // a second column on the same property is rejected at import time
            if fields.iter().any(|f| f.name.eq_ignore_ascii_case(&column.property)) {
                continue;
            }

            let mut field = FieldSpec::new(column.property.clone(), column.kind);
            if column.required {
                field = field.required();
            }
            if column.key {
                field = if column.exclude_from_lookup {
                    field.key_part_excluded_from_lookup(column.header.clone())
                } else {
                    field.key_part(column.header.clone())
                };
            }
            if let Some(target) = &column.lookup_target {
                field = field.lookup_part(target.clone());
            }
            fields.push(field);
        }
        Schema::new(fields)
    }

    fn to_mapping(&self) -> TabellaResult<SheetMapping> {
        let entity_name = self.entity.clone().unwrap_or_else(|| self.name.clone());
        let mut mapping = SheetMapping::new(EntityType::dynamic(entity_name, self.schema()));

        for column in &self.columns {
            let mut target = ColumnMapping::new(column.property.clone(), column.kind);
            if let Some(kinds) = &column.accepts {
                target = target.accepts(kinds);
            }
            if let Some(name) = &column.cast {
                target = target.with_cast(cast_by_name(name)?);
            }
            for spec in &column.validators {
                target = target.with_validator(spec.build());
            }
            if let Some(spec) = &column.stringifier {
                target = target.with_stringifier(spec.build());
            }
            mapping = mapping.column(column.header.clone(), target);
        }

        Ok(mapping)
    }
}

impl ValidatorSpec {
    fn build(&self) -> ValidatorFn {
        match self {
            ValidatorSpec::NumericRange {
                min,
                max,
                allow_null,
            } => validators::numeric_range(*min, *max, *allow_null),
            ValidatorSpec::StringLength {
                min,
                max,
                allow_null,
            } => validators::string_length(*min, *max, *allow_null),
            ValidatorSpec::DecimalPrecisionScale {
                precision,
                scale,
                allow_null,
            } => validators::decimal_precision_scale(*precision, *scale, *allow_null),
        }
    }
}

impl StringifierSpec {
    fn build(&self) -> StringifierFn {
        match self {
            StringifierSpec::Text { allow_null } => stringifiers::from_string(*allow_null),
            StringifierSpec::Date {
                pattern,
                allow_null,
            } => stringifiers::date(pattern.clone(), *allow_null),
        }
    }
}

/// Built-in cast hook by name
pub fn cast_by_name(name: &str) -> TabellaResult<CastFn> {
    let cast = match name {
        "to_date" => hooks::cast(casts::to_date),
        "to_min_hours_date" => hooks::cast(casts::to_min_hours_date),
        "to_max_hours_date" => hooks::cast(casts::to_max_hours_date),
        "to_bool" => hooks::cast(casts::to_bool),
        "to_int" => hooks::cast(casts::to_int),
        "to_decimal" => hooks::cast(casts::to_decimal),
        "to_text" => hooks::cast(casts::to_text),
        "to_nullable_text" => hooks::cast(casts::to_nullable_text),
        other => return Err(TabellaError::Mapping(format!("unknown cast '{}'", other))),
    };
    Ok(cast)
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON rows
// ─────────────────────────────────────────────────────────────────────────────

/// Export source over JSON rows keyed by declared sheet name
///
/// ```json
/// { "Prices": [ { "code": "A-1", "amount": 12.5 } ] }
/// ```
#[derive(Debug, Default)]
pub struct DynamicSource {
    rows: BTreeMap<String, Vec<DynamicRecord>>,
}

impl DynamicSource {
    pub fn load(path: &Path, mappings: &[(String, SheetMapping)]) -> TabellaResult<Self> {
        let content = fs::read_to_string(path)?;
        let data: JsonValue = serde_json::from_str(&content)?;
        Self::from_json(&data, mappings)
    }

    pub fn from_json(data: &JsonValue, mappings: &[(String, SheetMapping)]) -> TabellaResult<Self> {
        let sheets = data
            .as_object()
            .ok_or_else(|| TabellaError::Mapping("data must be an object of sheets".to_string()))?;

        let mut rows = BTreeMap::new();
        for (sheet, mapping) in mappings {
            let Some(raw) = sheets.get(sheet) else {
                tracing::debug!(sheet = %sheet, "no data rows for sheet");
                continue;
            };
            let items = raw.as_array().ok_or_else(|| {
                TabellaError::Mapping(format!("rows of sheet '{}' must be an array", sheet))
            })?;

            let schema = mapping.entity.shared_schema();
            let records = items
                .iter()
                .map(|item| {
                    let object = item.as_object().ok_or_else(|| {
                        TabellaError::Mapping(format!("row of sheet '{}' must be an object", sheet))
                    })?;
                    DynamicRecord::from_json(Arc::clone(&schema), object)
                })
                .collect::<TabellaResult<Vec<_>>>()?;

            rows.entry(mapping.entity.name().to_string())
                .or_insert_with(Vec::new)
                .extend(records);
        }

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EntitySource for DynamicSource {
    async fn fetch(
        &self,
        entity: &EntityType,
        _cancel: &CancelSignal,
    ) -> anyhow::Result<Vec<ExportItem>> {
        let items = self
            .rows
            .get(entity.name())
            .map(|records| {
                records
                    .iter()
                    .map(|record| ExportItem::Model(Box::new(record.clone())))
                    .collect()
            })
            .unwrap_or_default();
        Ok(items)
    }
}

/// Accepted rows and messages of an import as JSON
pub fn import_report(result: &ImportResult, mappings: &[(String, SheetMapping)]) -> JsonValue {
    let mut entities = Map::new();

    for (_, mapping) in mappings {
        let name = mapping.entity.name();
        if entities.contains_key(name) {
            continue;
        }

        let rows: Vec<JsonValue> = result
            .objects(name)
            .iter()
            .map(|object| {
                let values: Map<String, JsonValue> = mapping
                    .entity
                    .schema()
                    .fields()
                    .iter()
                    .map(|field| {
                        let value = object.object.get(&field.name);
                        (field.name.to_string(), serde_json::to_value(value).unwrap_or_default())
                    })
                    .collect();

                json!({
                    "sheet": object.sheet_name,
                    "row": object.row_index,
                    "key": object.object.identity().key.map(|key| format!("{:032x}", key)),
                    "values": values,
                })
            })
            .collect();

        entities.insert(name.to_string(), JsonValue::Array(rows));
    }

    json!({
        "entities": entities,
        "messages": result.sorted_messages(),
    })
}
