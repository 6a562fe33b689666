//! Error handling tests

use tabella::dynamic::MappingFile;
use tabella::TabellaError;

#[test]
fn test_duplicate_property_mapping_display() {
    let err = TabellaError::DuplicatePropertyMapping {
        sheet: "Prices".to_string(),
        properties: vec!["code".to_string(), "amount".to_string()],
    };
    assert_eq!(
        err.to_string(),
        "Duplicate target property detected in column mappings of sheet 'Prices': code, amount"
    );
}

#[test]
fn test_field_error_display() {
    let err = TabellaError::field("amount", "expected decimal value");
    assert_eq!(
        err.to_string(),
        "Cannot assign field 'amount': expected decimal value"
    );
}

#[test]
fn test_io_error_converts() {
    let err: TabellaError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(err.to_string().starts_with("IO error:"));
}

#[test]
fn test_yaml_error_converts() {
    let err = MappingFile::from_yaml("sheets: [").unwrap_err();
    assert!(matches!(err, TabellaError::Yaml(_)));
    assert!(err.to_string().starts_with("YAML parsing error:"));
}

#[test]
fn test_empty_mapping_is_a_mapping_error() {
    let err = MappingFile::from_yaml("sheets: []").unwrap_err();
    assert_eq!(err.to_string(), "Mapping error: mapping declares no sheets");
}

#[test]
fn test_unknown_column_option_is_rejected() {
    let yaml = "sheets:\n  - name: Prices\n    columns:\n      - { header: Code, property: code, kind: text, colour: red }\n";
    let err = MappingFile::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("colour"));
}
