//! Label maps: standard field name to source locator.

use std::fmt;

use crate::fields::FULL_ADDR;
use crate::metadata::Locator;

/// Where a mapped field takes its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    /// Value is read from the record through a locator.
    Record(Locator),
    /// Value is the literal from the metadata `force` object.
    Forced,
}

impl FieldSource {
    pub fn locator(&self) -> Option<&Locator> {
        match self {
            FieldSource::Record(locator) => Some(locator),
            FieldSource::Forced => None,
        }
    }
}

impl fmt::Display for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSource::Record(locator) => locator.fmt(f),
            FieldSource::Forced => f.write_str("<forced>"),
        }
    }
}

/// A single label map entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    pub field: &'static str,
    pub source: FieldSource,
}

/// Ordered mapping from standard field names to their sources.
///
/// Entries follow the standard vocabulary order. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: Vec<LabelEntry>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, replacing any existing one for the same field.
    pub fn insert(&mut self, field: &'static str, source: FieldSource) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.field == field) {
            entry.source = source;
        } else {
            self.entries.push(LabelEntry { field, source });
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldSource> {
        self.entries
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| &entry.source)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Locator of the free-form address, when the dataset has one.
    pub fn full_address(&self) -> Option<&Locator> {
        self.get(FULL_ADDR).and_then(FieldSource::locator)
    }

    /// Every record locator in the map, in entry order.
    pub fn record_locators(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().flat_map(|entry| {
            entry
                .source
                .locator()
                .into_iter()
                .flat_map(Locator::paths)
                .map(move |path| (entry.field, path))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_replaces() {
        let mut map = LabelMap::new();
        map.insert("bus_name", FieldSource::Record("Name".into()));
        map.insert("country", FieldSource::Forced);
        map.insert("bus_name", FieldSource::Record("Legal Name".into()));

        let fields: Vec<_> = map.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["bus_name", "country"]);
        assert_eq!(
            map.get("bus_name"),
            Some(&FieldSource::Record("Legal Name".into()))
        );
    }

    #[test]
    fn test_record_locators_skip_forced() {
        let mut map = LabelMap::new();
        map.insert(
            "full_addr",
            FieldSource::Record(Locator::Many(vec!["Street".into(), "City".into()])),
        );
        map.insert("prov", FieldSource::Forced);

        let locators: Vec<_> = map.record_locators().collect();
        assert_eq!(
            locators,
            vec![("full_addr", "Street"), ("full_addr", "City")]
        );
        assert!(map.full_address().is_some());
    }
}
