//! Post-import validators
//!
//! These run over the [`ProcessedObject`]s of an [`ImportResult`] once the
//! whole file has been read: duplicate keys, date-range sanity, overlaps
//! within a group and lookups against already-imported models.
//!
//! [`ImportResult`]: crate::model::ImportResult

use crate::config::TabellaOptions;
use crate::messages::{
    placeholders, ImportMessage, MessageBuilder, MessageFactory, MessageTemplates,
};
use crate::model::{PostProcessingResult, ProcessedObject, Record};
use crate::value::{DATE_FORMAT, RANGE_NO_END_SYMBOL};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashSet};

/// A start date with an optional end; no end means open-ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    /// No end, or an end not before the start
    pub fn is_valid(&self) -> bool {
        self.end.map_or(true, |end| end >= self.start)
    }

    /// Whether `self` lies within `target`.
    ///
    /// A range without an end only needs its start inside the target.
    pub fn is_within(&self, target: &DateRange) -> bool {
        if self.start < target.start {
            return false;
        }
        let Some(target_end) = target.end else {
            return true;
        };
        match self.end {
            Some(end) => end <= target_end,
            None => self.start <= target_end,
        }
    }

    /// Half-open overlap test, a missing end counting as unbounded
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end_or_max() && other.start < self.end_or_max()
    }

    pub fn is_exact_match(&self, other: &DateRange) -> bool {
        self.start == other.start && self.end_or_max() == other.end_or_max()
    }

    fn end_or_max(&self) -> NaiveDateTime {
        self.end.unwrap_or(NaiveDateTime::MAX)
    }

    fn formatted_start(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    fn formatted_end(&self) -> String {
        self.end
            .map(|end| end.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| RANGE_NO_END_SYMBOL.to_string())
    }
}

/// Cross-row checks over imported objects
pub struct ImportValidator {
    templates: MessageTemplates,
    factory: MessageFactory,
}

impl ImportValidator {
    pub fn new(options: &TabellaOptions) -> Self {
        Self {
            templates: MessageTemplates::from_keys(&options.templates),
            factory: MessageFactory::new(options.default_sender.clone()),
        }
    }

    /// Flag every object whose key was already seen. Returns whether any
    /// duplicate was found.
    pub fn validate_duplicates(
        &self,
        data: &[ProcessedObject],
        messages: &mut HashSet<ImportMessage>,
    ) -> bool {
        let mut seen = HashSet::new();
        let mut has_duplicates = false;

        for object in data {
            let Some(key) = object.object.identity().key else {
                continue;
            };
            if seen.insert(key) {
                continue;
            }

            messages.insert(self.factory.create(
                MessageBuilder::new(&self.templates.duplicate_entry),
                Some(&object.sheet_name),
                Some(object.row_index),
                None,
            ));
            has_duplicates = true;
        }

        has_duplicates
    }

    /// Report an end date before the start date against `property`'s cell
    pub fn validate_date_range(
        &self,
        property: &str,
        range: &DateRange,
        object: &ProcessedObject,
        messages: &mut HashSet<ImportMessage>,
    ) -> bool {
        if range.is_valid() {
            return true;
        }

        messages.insert(self.factory.create(
            MessageBuilder::new(&self.templates.invalid_date_range)
                .with(placeholders::START_DATE, range.formatted_start())
                .with(placeholders::END_DATE, range.formatted_end()),
            Some(&object.sheet_name),
            Some(object.row_index),
            object.cell(property),
        ));
        false
    }

    /// Report ranges overlapping an earlier range of the same group.
    ///
    /// Objects that are not a `T` are skipped. Each group is ordered by start
    /// date (stable, so rows with equal starts keep file order) and every
    /// range is compared against all earlier ones. With `ignore_exact_match`
    /// an identical start and end is left to the duplicate check.
    pub fn validate_overlapping_date_ranges<T: Record>(
        &self,
        data: &[ProcessedObject],
        messages: &mut HashSet<ImportMessage>,
        group_key: Option<&dyn Fn(&T) -> String>,
        range_of: impl Fn(&T) -> DateRange,
        start_property: &str,
        ignore_exact_match: bool,
    ) -> bool {
        let mut groups: BTreeMap<String, Vec<(&ProcessedObject, DateRange)>> = BTreeMap::new();
        for object in data {
            let Some(model) = object.downcast_ref::<T>() else {
                continue;
            };
            let key = group_key.map(|select| select(model)).unwrap_or_default();
            groups.entry(key).or_default().push((object, range_of(model)));
        }

        let mut overlaps_exist = false;
        for (_, mut group) in groups {
            if group.len() < 2 {
                continue;
            }
            group.sort_by_key(|(_, range)| range.start);

            let mut accepted: Vec<DateRange> = Vec::with_capacity(group.len());
            for (object, range) in group {
                let overlapping = accepted.iter().any(|existing| {
                    let skipped = ignore_exact_match && range.is_exact_match(existing);
                    !skipped && range.overlaps(existing)
                });

                if overlapping {
                    messages.insert(self.factory.create(
                        MessageBuilder::new(&self.templates.date_range_overlaps_existing)
                            .with(placeholders::START_DATE, range.formatted_start())
                            .with(placeholders::END_DATE, range.formatted_end()),
                        Some(&object.sheet_name),
                        Some(object.row_index),
                        object.cell(start_property),
                    ));
                    overlaps_exist = true;
                }

                accepted.push(range);
            }
        }

        overlaps_exist
    }

    /// Imported models sharing `lookup_key` whose range contains `range`.
    ///
    /// `range: None` skips the containment test. An empty match raises a
    /// no-accompanying-item message against `property`; the caller decides
    /// whether that is fatal.
    #[allow(clippy::too_many_arguments)]
    pub fn retrieve_items_in_range<'r, A, M: Record>(
        &self,
        lookup_key: u128,
        range: Option<&DateRange>,
        property: &str,
        existing: &'r PostProcessingResult<A, M>,
        range_of: impl Fn(&M) -> DateRange,
        object: &ProcessedObject,
        messages: &mut HashSet<ImportMessage>,
    ) -> Vec<&'r M> {
        let matches: Vec<&M> = existing
            .imported_models
            .iter()
            .filter(|model| model.identity().lookup_key == Some(lookup_key))
            .filter(|model| range.map_or(true, |wanted| wanted.is_within(&range_of(model))))
            .collect();

        if matches.is_empty() {
            messages.insert(self.factory.create(
                MessageBuilder::new(&self.templates.no_accompanying_item_found)
                    .with(placeholders::CURRENT_VALUE, property),
                Some(&object.sheet_name),
                Some(object.row_index),
                object.cell(property),
            ));
        }

        matches
    }

    /// The existing entry whose model has the same key as `model`
    pub fn existing_entry<'e, A, M: Record>(
        &self,
        model: &M,
        existing: &'e [(A, M)],
    ) -> Option<&'e (A, M)> {
        let key = model.identity().key?;
        existing
            .iter()
            .find(|(_, candidate)| candidate.identity().key == Some(key))
    }
}
