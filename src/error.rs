use thiserror::Error;

pub type TabellaResult<T> = Result<T, TabellaError>;

#[derive(Error, Debug)]
pub enum TabellaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Duplicate target property detected in column mappings of sheet '{sheet}': {}", .properties.join(", "))]
    DuplicatePropertyMapping {
        sheet: String,
        properties: Vec<String>,
    },

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Cannot assign field '{field}': {reason}")]
    Field { field: String, reason: String },
}

impl TabellaError {
    pub fn field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
