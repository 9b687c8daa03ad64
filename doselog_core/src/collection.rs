//! In-memory collection of entries and the pure add/update/delete operations.
//!
//! Every operation takes `&self` and returns a new collection, so a failed
//! operation leaves the original untouched.

use crate::validation::{self, Limits};
use crate::{Entry, EntryChanges, Error, Result, Selector};
use serde::Serialize;

/// Entries in stored order
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EntryCollection {
    entries: Vec<Entry>,
}

impl EntryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap entries as-is, keeping their order
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    /// First entry matching the selector, in stored order
    pub fn find(&self, selector: &Selector) -> Option<&Entry> {
        self.entries.iter().find(|e| selector.matches(e))
    }

    fn position(&self, selector: &Selector) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| selector.matches(e))
            .ok_or_else(|| Error::NotFound(selector.to_string()))
    }

    /// Entries sorted ascending by date. Entries sharing a date keep stored order.
    pub fn chronological(&self) -> Vec<&Entry> {
        let mut view: Vec<&Entry> = self.entries.iter().collect();
        view.sort_by_key(|e| e.date);
        view
    }

    /// Entries sorted descending by date, for the raw table view
    pub fn table_view(&self) -> Vec<&Entry> {
        let mut view = self.chronological();
        view.reverse();
        view
    }

    /// Append a validated entry and re-sort by date ascending.
    ///
    /// Entries sharing a date are all retained.
    pub fn with_added(&self, entry: Entry, limits: &Limits) -> Result<Self> {
        validation::validate_entry(&entry, limits)?;

        let mut entries = self.entries.clone();
        entries.push(entry);
        entries.sort_by_key(|e| e.date);
        Ok(Self { entries })
    }

    /// Apply `changes` to the first entry matching `selector`
    pub fn with_updated(
        &self,
        selector: &Selector,
        changes: &EntryChanges,
        limits: &Limits,
    ) -> Result<Self> {
        validation::validate_changes(changes, limits)?;
        let idx = self.position(selector)?;

        let mut entries = self.entries.clone();
        changes.apply_to(&mut entries[idx]);
        validation::validate_entry(&entries[idx], limits)?;
        Ok(Self { entries })
    }

    /// Remove the first entry matching `selector`
    pub fn without(&self, selector: &Selector) -> Result<Self> {
        let idx = self.position(selector)?;

        let mut entries = self.entries.clone();
        entries.remove(idx);
        Ok(Self { entries })
    }
}

impl<'a> IntoIterator for &'a EntryCollection {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<Entry> for EntryCollection {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(date: &str, weight: f64, dose: f64) -> Entry {
        Entry::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            weight,
            dose,
        )
    }

    fn sample() -> EntryCollection {
        EntryCollection::from_entries(vec![
            entry("2024-01-01", 200.0, 2.0),
            entry("2024-01-08", 197.5, 4.0),
            entry("2024-01-15", 195.0, 4.0),
        ])
    }

    #[test]
    fn test_add_sorts_by_date() {
        let limits = Limits::default();
        let added = sample()
            .with_added(entry("2024-01-03", 199.0, 2.0), &limits)
            .unwrap();

        let dates: Vec<String> = added.iter().map(|e| e.date.to_string()).collect();
        assert_eq!(
            dates,
            vec!["2024-01-01", "2024-01-03", "2024-01-08", "2024-01-15"]
        );
    }

    #[test]
    fn test_add_keeps_duplicate_dates() {
        let limits = Limits::default();
        let added = sample()
            .with_added(entry("2024-01-08", 197.0, 4.0), &limits)
            .unwrap();
        assert_eq!(added.len(), 4);
        assert_eq!(added.iter().filter(|e| e.date.to_string() == "2024-01-08").count(), 2);
    }

    #[test]
    fn test_add_rejects_invalid_entry() {
        let original = sample();
        let before = original.clone();
        let bad = entry("2024-01-20", -5.0, 2.0);

        let err = original.with_added(bad, &Limits::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(original, before);
    }

    #[test]
    fn test_add_then_delete_restores_original() {
        let original = sample();
        let new_entry = entry("2024-01-10", 196.0, 4.0);
        let selector = Selector::from(&new_entry);

        let added = original.with_added(new_entry, &Limits::default()).unwrap();
        let removed = added.without(&selector).unwrap();
        assert_eq!(removed, original);
    }

    #[test]
    fn test_update_by_composite_hits_first_match() {
        let mut base = sample();
        base = base
            .with_added(entry("2024-01-08", 197.5, 4.0), &Limits::default())
            .unwrap();
        let first_id = base.entries()[1].id;
        let second_id = base.entries()[2].id;

        let selector = Selector::from_label("2024-01-08 | 197.5 lbs | 4.0mg").unwrap();
        let changes = EntryChanges {
            nausea: Some(6),
            ..Default::default()
        };
        let updated = base
            .with_updated(&selector, &changes, &Limits::default())
            .unwrap();

        let first = updated.find(&Selector::Id(first_id)).unwrap();
        let second = updated.find(&Selector::Id(second_id)).unwrap();
        assert_eq!(first.nausea, 6);
        assert_eq!(second.nausea, 0);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let original = sample();
        let selector = Selector::from_label("2023-12-25 | 210.0 lbs | 0.0mg").unwrap();
        let changes = EntryChanges {
            weight: Some(180.0),
            ..Default::default()
        };

        let err = original
            .with_updated(&selector, &changes, &Limits::default())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_update_rejects_out_of_range_change() {
        let original = sample();
        let selector = Selector::from(&original.entries()[0]);
        let changes = EntryChanges {
            fatigue: Some(11),
            ..Default::default()
        };
        let err = original
            .with_updated(&selector, &changes, &Limits::default())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(original.entries()[0].fatigue, 0);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let err = sample()
            .without(&Selector::Id(crate::EntryId::new()))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_table_view_is_descending() {
        let c = EntryCollection::from_entries(vec![
            entry("2024-01-08", 197.5, 4.0),
            entry("2024-01-01", 200.0, 2.0),
            entry("2024-01-15", 195.0, 4.0),
        ]);

        let chrono: Vec<f64> = c.chronological().iter().map(|e| e.weight).collect();
        assert_eq!(chrono, vec![200.0, 197.5, 195.0]);

        let table: Vec<f64> = c.table_view().iter().map(|e| e.weight).collect();
        assert_eq!(table, vec![195.0, 197.5, 200.0]);
    }
}
