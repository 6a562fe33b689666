//! Row model shared by the integration tests

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use tabella::excel::MemoryWorkbook;
use tabella::hooks::{self, casts};
use tabella::model::RowIdentity;
use tabella::{
    CellValue, ColumnMapping, FieldSpec, Model, Record, Schema, SheetMapping, TabellaError,
    TabellaResult, Value, ValueKind,
};

#[derive(Debug, Clone, Default)]
pub struct Price {
    pub code: Option<String>,
    pub region: Option<String>,
    pub amount: Option<f64>,
    pub valid_from: Option<NaiveDateTime>,
    pub valid_to: Option<NaiveDateTime>,
    pub identity: RowIdentity,
}

impl Record for Price {
    fn get(&self, field: &str) -> Value {
        match field {
            "code" => self.code.clone().into(),
            "region" => self.region.clone().into(),
            "amount" => self.amount.map(Value::Decimal).unwrap_or(Value::Null),
            "valid_from" => self.valid_from.into(),
            "valid_to" => self.valid_to.into(),
            _ => Value::Null,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> TabellaResult<()> {
        match (field, value) {
            ("code", Value::Text(s)) => self.code = Some(s),
            ("code", Value::Null) => self.code = None,
            ("region", Value::Text(s)) => self.region = Some(s),
            ("region", Value::Null) => self.region = None,
            ("amount", Value::Decimal(n)) | ("amount", Value::Float(n)) => self.amount = Some(n),
            ("amount", Value::Null) => self.amount = None,
            ("valid_from", Value::DateTime(dt)) => self.valid_from = Some(dt),
            ("valid_from", Value::Null) => self.valid_from = None,
            ("valid_to", Value::DateTime(dt)) => self.valid_to = Some(dt),
            ("valid_to", Value::Null) => self.valid_to = None,
            (field, value) => {
                return Err(TabellaError::field(field, format!("unsupported value {value:?}")))
            }
        }
        Ok(())
    }

    fn identity(&self) -> &RowIdentity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut RowIdentity {
        &mut self.identity
    }
}

impl Model for Price {
    const ENTITY: &'static str = "Price";

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::new("code", ValueKind::Text).required().key_part("Code"),
            FieldSpec::new("region", ValueKind::Text).key_part_excluded_from_lookup("Region"),
            FieldSpec::new("amount", ValueKind::Decimal),
            FieldSpec::new("valid_from", ValueKind::DateTime),
            FieldSpec::new("valid_to", ValueKind::DateTime),
        ])
    }
}

pub const HEADERS: [&str; 5] = ["Code", "Region", "Amount", "Valid from", "Valid to"];

pub fn price_mapping() -> SheetMapping {
    SheetMapping::for_model::<Price>()
        .column("Code", ColumnMapping::new("code", ValueKind::Text))
        .column("Region", ColumnMapping::new("region", ValueKind::Text))
        .column("Amount", ColumnMapping::new("amount", ValueKind::Decimal))
        .column(
            "Valid from",
            ColumnMapping::new("valid_from", ValueKind::DateTime)
                .with_cast(hooks::cast(casts::to_min_hours_date)),
        )
        .column(
            "Valid to",
            ColumnMapping::new("valid_to", ValueKind::DateTime)
                .with_cast(hooks::cast(casts::to_max_hours_date)),
        )
}

pub fn header_row() -> Vec<CellValue> {
    HEADERS.iter().map(|h| CellValue::from(*h)).collect()
}

pub fn price_row(code: &str, region: &str, amount: f64, from: &str, to: &str) -> Vec<CellValue> {
    vec![
        code.into(),
        region.into(),
        CellValue::Number(amount),
        from.into(),
        to.into(),
    ]
}

pub fn prices_workbook(rows: Vec<Vec<CellValue>>) -> MemoryWorkbook {
    rows.into_iter()
        .fold(MemoryWorkbook::new().sheet("Prices").row(header_row()), |wb, row| wb.row(row))
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}
