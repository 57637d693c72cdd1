//! Flat key-value records.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An ordered sequence of records, one per repeating block of a document.
///
/// Records are not required to share the same keys.
pub type RecordSet = Vec<FlatRecord>;

/// A single flattened record: field name to nullable scalar value.
///
/// Keys are unique and iterate in insertion order, which mirrors document
/// order for records built by the flatteners.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord {
    fields: IndexMap<String, Option<String>>,
}

impl FlatRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, returning the previous value if the key was present.
    ///
    /// Overwriting keeps the key at its original position.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: Option<String>,
    ) -> Option<Option<String>> {
        self.fields.insert(key.into(), value)
    }

    /// Merges `other` into `self`. Colliding keys take the value from `other`.
    pub fn merge(&mut self, other: FlatRecord) {
        for (key, value) in other.fields {
            self.fields.insert(key, value);
        }
    }

    /// Returns the stored value for `key`, distinguishing a null field from a
    /// missing one.
    pub fn get(&self, key: &str) -> Option<&Option<String>> {
        self.fields.get(key)
    }

    /// Returns the non-null value for `key`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_deref())
    }

    /// Returns `true` if the record has a field named `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for FlatRecord {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        let mut record = FlatRecord::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl IntoIterator for FlatRecord {
    type Item = (String, Option<String>);
    type IntoIter = indexmap::map::IntoIter<String, Option<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
