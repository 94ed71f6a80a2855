//! The local entry collection

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use super::Entry;

/// How an upsert landed in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A record with the same (or previous) id was overwritten in place
    Replaced,
    /// No matching record existed; the entry was inserted at the head
    Inserted,
}

/// Ordered set of entries holding at most one record per id.
///
/// This is the state the reconciliation engine owns and writes back to the
/// local store as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryCollection {
    entries: Vec<Entry>,
}

impl EntryCollection {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a collection, keeping the first record seen for each id.
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut collection = Self::new();
        for entry in entries {
            if collection.contains(entry.id) {
                tracing::warn!(id = entry.id, "Dropping duplicate entry id from collection");
                continue;
            }
            collection.entries.push(entry.normalized());
        }
        collection
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<Entry> {
        self.entries
    }

    pub fn get(&self, id: i64) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    /// Insert or replace `entry`.
    ///
    /// When `previous_id` names a different record (the id changed because the
    /// server confirmed a provisional entry), that record is removed and the
    /// entry takes its place, unless a record already holds the new id, in
    /// which case that one is overwritten. Either way the collection never
    /// carries two records for one id.
    pub fn upsert(&mut self, entry: Entry, previous_id: Option<i64>) -> Upsert {
        let mut slot = None;
        if let Some(previous) = previous_id.filter(|previous| *previous != entry.id) {
            if let Some(index) = self.position(previous) {
                self.entries.remove(index);
                slot = Some(index);
            }
        }

        if let Some(index) = self.position(entry.id) {
            self.entries[index] = entry;
            return Upsert::Replaced;
        }

        match slot {
            Some(index) => {
                self.entries.insert(index, entry);
                Upsert::Replaced
            }
            None => {
                self.entries.insert(0, entry);
                Upsert::Inserted
            }
        }
    }

    /// Sort by id magnitude, largest first.
    ///
    /// Server ids and provisional ids both grow with the reading time, so this
    /// puts the newest readings first whatever their state.
    pub fn sort_newest_first(&mut self) {
        self.entries.sort_by_key(|entry| Reverse(entry.id.unsigned_abs()));
    }

    /// Ids of every entry not yet confirmed by the server.
    pub fn dirty_ids(&self) -> Vec<i64> {
        self.entries
            .iter()
            .filter(|entry| entry.dirty)
            .map(|entry| entry.id)
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.dirty).count()
    }
}

impl<'a> IntoIterator for &'a EntryCollection {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: i64, sensor1: &str) -> Entry {
        Entry::new("2024-01-01 10:00:00")
            .with_id(id)
            .with_sensors(sensor1, "5", "6")
    }

    fn ids(collection: &EntryCollection) -> Vec<i64> {
        collection.iter().map(|entry| entry.id).collect()
    }

    #[test]
    fn test_upsert_inserts_unknown_id_at_head() {
        let mut collection = EntryCollection::from_entries([entry(10, "1"), entry(9, "1")]);
        assert_eq!(collection.upsert(entry(5, "1"), None), Upsert::Inserted);
        assert_eq!(ids(&collection), vec![5, 10, 9]);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut collection = EntryCollection::from_entries([entry(10, "1"), entry(9, "1")]);
        assert_eq!(collection.upsert(entry(9, "2"), None), Upsert::Replaced);
        assert_eq!(ids(&collection), vec![10, 9]);
        assert_eq!(collection.get(9).unwrap().sensor_reading1, "2");
    }

    #[test]
    fn test_upsert_with_previous_id_leaves_no_duplicate() {
        let mut collection = EntryCollection::from_entries([entry(10, "1"), entry(-20, "1")]);
        assert_eq!(collection.upsert(entry(20, "2"), Some(-20)), Upsert::Replaced);
        assert_eq!(ids(&collection), vec![10, 20]);
        assert!(!collection.contains(-20));
    }

    #[test]
    fn test_upsert_with_previous_id_drops_stale_copy_of_new_id() {
        let mut collection =
            EntryCollection::from_entries([entry(20, "old"), entry(-20, "1"), entry(5, "1")]);
        collection.upsert(entry(20, "new"), Some(-20));
        assert_eq!(ids(&collection), vec![20, 5]);
        assert_eq!(collection.get(20).unwrap().sensor_reading1, "new");
    }

    #[test]
    fn test_sort_uses_id_magnitude() {
        let mut collection =
            EntryCollection::from_entries([entry(5, "1"), entry(-30, "1"), entry(20, "1")]);
        collection.sort_newest_first();
        assert_eq!(ids(&collection), vec![-30, 20, 5]);
    }

    #[test]
    fn test_from_entries_keeps_first_duplicate() {
        let collection = EntryCollection::from_entries([entry(7, "first"), entry(7, "second")]);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get(7).unwrap().sensor_reading1, "first");
    }

    #[test]
    fn test_dirty_tracking() {
        let collection = EntryCollection::from_entries([
            entry(1, "1").with_dirty(false),
            entry(-2, "1"),
            entry(3, "1"),
        ]);
        assert_eq!(collection.dirty_ids(), vec![-2, 3]);
        assert_eq!(collection.pending_count(), 2);
    }
}
