//! Composite identity keys
//!
//! Keys are the first 16 bytes of a SHA-256 digest over the `|`-joined
//! canonical key parts, folded little-endian into a `u128` (low half from
//! bytes 0..8, high half from bytes 8..16). No salt is involved, so equal
//! parts give equal keys across runs.

use crate::model::record::{Record, Schema};
use crate::model::results::ColumnData;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Identity data carried by every row-backed object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowIdentity {
    pub key: Option<u128>,
    /// Key over the parts not excluded from lookup
    pub lookup_key: Option<u128>,
    /// Headers of the key parts, `", "`-joined
    pub key_header_names: Option<String>,
    pub row_index: Option<usize>,
    pub sheet_name: Option<String>,
    pub column_data: BTreeMap<String, ColumnData>,
}

/// Deterministic 128-bit hash of the ordered key parts
pub fn hash_parts<S: AsRef<str>>(parts: &[S]) -> u128 {
    let joined = parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("|");

    let digest = Sha256::digest(joined.as_bytes());
    fold(&digest[..16])
}

/// 128 bits from the operating system's secure random source
pub fn random_key() -> u128 {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    fold(&bytes)
}

/// Key over `parts`; falls back to the row index, then to a random value
pub fn composite_key<S: AsRef<str>>(parts: &[S], row_index: Option<usize>) -> u128 {
    match (parts.is_empty(), row_index) {
        (false, _) => hash_parts(parts),
        (true, Some(row)) => hash_parts(&[format!("RowIndex:{row}")]),
        (true, None) => random_key(),
    }
}

/// Lookup variant; `None` when no part survives the filter
pub fn lookup_key<S: AsRef<str>>(parts: &[(S, bool)]) -> Option<u128> {
    let included: Vec<&str> = parts
        .iter()
        .filter(|(_, excluded)| !excluded)
        .map(|(part, _)| part.as_ref())
        .collect();

    if included.is_empty() {
        None
    } else {
        Some(hash_parts(&included))
    }
}

/// Populate key, lookup key, header names and row index of `record`.
///
/// Key parts are the schema's key fields in declaration order; a required
/// key field that is still empty is left out. Derived lookup keys are then
/// computed per target and handed to [`Record::set_lookup_key`].
pub fn generate_keys(record: &mut dyn Record, schema: &Schema, row_index: Option<usize>) {
    let mut parts = Vec::new();
    let mut headers = Vec::new();

    for (field, key_part) in schema.key_fields() {
        let formatted = record.get(&field.name).key_string();
        if field.required && formatted.is_empty() {
            continue;
        }
        parts.push((formatted, key_part.exclude_from_lookup));
        headers.push(key_part.header.to_string());
    }

    let key_values: Vec<&str> = parts.iter().map(|(part, _)| part.as_str()).collect();
    let key = composite_key(&key_values, row_index);
    let lookup = lookup_key(&parts);
    let header_names = if parts.is_empty() {
        None
    } else {
        Some(
            headers
                .iter()
                .filter(|header| !header.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        )
    };

    let identity = record.identity_mut();
    identity.key = Some(key);
    identity.lookup_key = lookup;
    identity.key_header_names = header_names;
    identity.row_index = row_index;

    let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for field in schema.fields() {
        for target in &field.lookup_targets {
            groups
                .entry(target.as_ref())
                .or_default()
                .push(record.get(&field.name).key_string());
        }
    }

    for (target, values) in groups {
        let derived = if values.is_empty() {
            random_key()
        } else {
            hash_parts(&values)
        };
        record.set_lookup_key(target, Some(derived));
    }
}

fn fold(bytes: &[u8]) -> u128 {
    let mut low = [0u8; 8];
    let mut high = [0u8; 8];
    low.copy_from_slice(&bytes[..8]);
    high.copy_from_slice(&bytes[8..16]);
    (u128::from(u64::from_le_bytes(high)) << 64) | u128::from(u64::from_le_bytes(low))
}
