//! Post-import validator tests

mod common;

use common::{day, price_mapping, price_row, prices_workbook, Price};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use tabella::messages::placeholders;
use tabella::model::{PostProcessingResult, PostProcessingResults, ProcessedObject};
use tabella::{DateRange, ExcelImporter, ImportMessage, ImportResult, ImportValidator, TabellaOptions};

fn import(rows: Vec<(&str, &str, &str, &str)>) -> ImportResult {
    let workbook_rows = rows
        .into_iter()
        .map(|(code, region, from, to)| price_row(code, region, 1.0, from, to))
        .collect();
    let mut workbook = prices_workbook(workbook_rows);
    let mut mappings = vec![("Prices".to_string(), price_mapping())];

    let result = ExcelImporter::new(&TabellaOptions::default())
        .process_workbook(&mut workbook, &mut mappings, 0)
        .unwrap();
    assert!(result.messages.is_empty(), "{:?}", result.messages);
    result
}

fn validator() -> ImportValidator {
    ImportValidator::new(&TabellaOptions::default())
}

fn price_range(price: &Price) -> DateRange {
    DateRange::new(price.valid_from.unwrap_or_default(), price.valid_to)
}

fn by_code(price: &Price) -> String {
    price.code.clone().unwrap_or_default()
}

fn overlaps(data: &[ProcessedObject], ignore_exact_match: bool) -> (bool, HashSet<ImportMessage>) {
    let mut messages = HashSet::new();
    let group: &dyn Fn(&Price) -> String = &by_code;
    let found = validator().validate_overlapping_date_ranges(
        data,
        &mut messages,
        Some(group),
        price_range,
        "valid_from",
        ignore_exact_match,
    );
    (found, messages)
}

fn rows_of(messages: &HashSet<ImportMessage>) -> Vec<usize> {
    let mut rows: Vec<usize> = messages.iter().filter_map(|m| m.row_index).collect();
    rows.sort_unstable();
    rows
}

// ═══════════════════════════════════════════════════════════════════════════
// DUPLICATES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_duplicate_keys_are_reported_after_first() {
    let result = import(vec![
        ("A-1", "North", "2024-01-01", ""),
        ("A-2", "North", "2024-01-01", ""),
        ("A-1", "North", "2024-06-01", ""),
    ]);

    let mut messages = HashSet::new();
    let found = validator().validate_duplicates(result.objects("Price"), &mut messages);

    assert!(found);
    assert_eq!(rows_of(&messages), vec![4]);
    let message = messages.iter().next().unwrap();
    assert_eq!(message.translation_key, "messages.sheet_processing_message_duplicate");
}

#[test]
fn test_distinct_keys_are_not_duplicates() {
    let result = import(vec![
        ("A-1", "North", "2024-01-01", ""),
        ("A-1", "South", "2024-01-01", ""),
    ]);

    let mut messages = HashSet::new();
    assert!(!validator().validate_duplicates(result.objects("Price"), &mut messages));
    assert!(messages.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// DATE RANGES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_end_before_start_is_reported() {
    let result = import(vec![("A-1", "North", "2024-02-01", "2024-01-01")]);
    let object = &result.objects("Price")[0];
    let price = object.downcast_ref::<Price>().unwrap();

    let mut messages = HashSet::new();
    let valid = validator().validate_date_range("valid_to", &price_range(price), object, &mut messages);

    assert!(!valid);
    let message = messages.iter().next().unwrap();
    assert_eq!(message.translation_key, "messages.sheet_processing_message_invalid_date_range");
    assert_eq!(message.placeholder(placeholders::START_DATE), Some("01-02-2024"));
    assert_eq!(message.placeholder(placeholders::END_DATE), Some("01-01-2024"));
    assert_eq!(message.column.as_deref(), Some("E"));
}

#[test]
fn test_open_range_is_valid() {
    let result = import(vec![("A-1", "North", "2024-02-01", "")]);
    let object = &result.objects("Price")[0];
    let price = object.downcast_ref::<Price>().unwrap();

    let mut messages = HashSet::new();
    assert!(validator().validate_date_range("valid_to", &price_range(price), object, &mut messages));
    assert!(messages.is_empty());
}

#[test]
fn test_overlapping_ranges_flag_the_later_row() {
    let result = import(vec![
        ("A-1", "North", "2024-01-15", "2024-02-15"),
        ("A-1", "South", "2024-01-01", "2024-01-31"),
    ]);

    let (found, messages) = overlaps(result.objects("Price"), false);
    assert!(found);
    assert_eq!(rows_of(&messages), vec![2]);

    let message = messages.iter().next().unwrap();
    assert_eq!(
        message.translation_key,
        "messages.sheet_processing_message_date_range_overlaps_existing"
    );
    assert_eq!(message.placeholder(placeholders::START_DATE), Some("15-01-2024"));
    assert_eq!(message.column.as_deref(), Some("D"));
}

#[test]
fn test_adjacent_ranges_do_not_overlap() {
    let result = import(vec![
        ("A-1", "North", "2024-01-01", "2024-01-10"),
        ("A-1", "South", "2024-01-11", "2024-01-20"),
    ]);

    let (found, messages) = overlaps(result.objects("Price"), false);
    assert!(!found);
    assert!(messages.is_empty());
}

#[test]
fn test_overlaps_only_within_a_group() {
    let result = import(vec![
        ("A-1", "North", "2024-01-01", ""),
        ("A-2", "North", "2024-01-01", ""),
    ]);

    let (found, _) = overlaps(result.objects("Price"), false);
    assert!(!found);
}

#[test]
fn test_exact_match_can_be_left_to_duplicate_check() {
    let result = import(vec![
        ("A-1", "North", "2024-01-01", "2024-12-31"),
        ("A-1", "South", "2024-01-01", "2024-12-31"),
    ]);

    let (found, messages) = overlaps(result.objects("Price"), true);
    assert!(!found);
    assert!(messages.is_empty());

    let (found, messages) = overlaps(result.objects("Price"), false);
    assert!(found);
    assert_eq!(rows_of(&messages), vec![3]);
}

#[test]
fn test_open_range_overlaps_later_start() {
    let result = import(vec![
        ("A-1", "North", "2024-01-01", ""),
        ("A-1", "South", "2030-01-01", "2030-02-01"),
    ]);

    let (found, messages) = overlaps(result.objects("Price"), false);
    assert!(found);
    assert_eq!(rows_of(&messages), vec![3]);
}

// ═══════════════════════════════════════════════════════════════════════════
// LOOKUPS AGAINST IMPORTED MODELS
// ═══════════════════════════════════════════════════════════════════════════

fn imported_models(result: &ImportResult) -> PostProcessingResult<(), Price> {
    let mut processed = PostProcessingResult::default();
    processed.imported_models = result
        .objects("Price")
        .iter()
        .map(|o| o.downcast_ref::<Price>().unwrap().clone())
        .collect();
    processed
}

#[test]
fn test_retrieve_items_in_range() {
    let result = import(vec![
        ("A-1", "North", "2024-01-01", "2024-12-31"),
        ("A-1", "South", "2025-01-01", ""),
        ("B-1", "North", "2024-01-01", "2024-12-31"),
    ]);
    let existing = imported_models(&result);
    let object = &result.objects("Price")[0];
    let lookup = object.object.identity().lookup_key.unwrap();

    let mut messages = HashSet::new();
    let wanted = DateRange::new(day(2024, 3, 1), Some(day(2024, 3, 31)));
    let found = validator().retrieve_items_in_range(
        lookup,
        Some(&wanted),
        "code",
        &existing,
        price_range,
        object,
        &mut messages,
    );
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].region.as_deref(), Some("North"));
    assert!(messages.is_empty());

    let all = validator().retrieve_items_in_range(
        lookup,
        None,
        "code",
        &existing,
        price_range,
        object,
        &mut messages,
    );
    assert_eq!(all.len(), 2);
}

#[test]
fn test_retrieve_items_without_match_reports() {
    let result = import(vec![("A-1", "North", "2024-01-01", "2024-12-31")]);
    let existing = imported_models(&result);
    let object = &result.objects("Price")[0];
    let lookup = object.object.identity().lookup_key.unwrap();

    let mut messages = HashSet::new();
    let wanted = DateRange::new(day(2023, 6, 1), None);
    let found = validator().retrieve_items_in_range(
        lookup,
        Some(&wanted),
        "code",
        &existing,
        price_range,
        object,
        &mut messages,
    );

    assert!(found.is_empty());
    let message = messages.iter().next().unwrap();
    assert_eq!(
        message.translation_key,
        "messages.sheet_processing_message_no_accompanying_item_found"
    );
    assert_eq!(message.placeholder(placeholders::CURRENT_VALUE), Some("code"));
}

#[test]
fn test_existing_entry_matches_by_key() {
    let result = import(vec![
        ("A-1", "North", "2024-01-01", ""),
        ("A-2", "North", "2024-01-01", ""),
    ]);
    let models = imported_models(&result).imported_models;
    let existing: Vec<(u32, Price)> = vec![(7, models[1].clone())];

    let validator = validator();
    let hit = validator.existing_entry(&models[1], &existing);
    assert_eq!(hit.map(|(id, _)| *id), Some(7));
    assert!(validator.existing_entry(&models[0], &existing).is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// POST-PROCESSING BUCKETS
// ═══════════════════════════════════════════════════════════════════════════

fn keyed(code: &str, key: u128) -> Price {
    let mut price = Price {
        code: Some(code.to_string()),
        ..Price::default()
    };
    price.identity.key = Some(key);
    price
}

#[test]
fn test_combined_overlays_updates_then_appends_creates() {
    let mut processed: PostProcessingResult<u32, Price> = PostProcessingResult::default();
    processed.existing = vec![(1, keyed("A", 10)), (2, keyed("B", 20))];
    processed.updating = vec![(3, keyed("B2", 20))];
    processed.creating = vec![(4, keyed("C", 30))];

    processed.generate_combined();

    let combined: Vec<(u32, Option<&str>)> = processed
        .combined()
        .iter()
        .map(|(id, price)| (*id, price.code.as_deref()))
        .collect();
    assert_eq!(combined, vec![(1, Some("A")), (3, Some("B2")), (4, Some("C"))]);
}

#[test]
fn test_results_registry_is_keyed_by_type() {
    let mut registry = PostProcessingResults::new();
    let mut prices: PostProcessingResult<u32, Price> = PostProcessingResult::default();
    prices.creating.push((1, keyed("A", 1)));
    registry.insert(prices);

    assert_eq!(registry.get::<u32, Price>().map(|r| r.creating.len()), Some(1));
    assert!(registry.get::<String, Price>().is_none());
}
