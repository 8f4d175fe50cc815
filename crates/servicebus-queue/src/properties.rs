//! Case-insensitive user property map.
//!
//! User properties travel as individual HTTP headers, and header names are
//! case-insensitive, so lookups must be too. [`Properties`] keeps the casing
//! of the first key written for each entry as its display key.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

#[cfg(test)]
#[path = "properties_tests.rs"]
mod tests;

#[derive(Debug, Clone)]
struct PropertyEntry {
    key: String,
    value: String,
}

/// String-keyed map with case-insensitive keys.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    entries: HashMap<String, PropertyEntry>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value stored under `key`, ignoring case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&normalize(key))
            .map(|entry| entry.value.as_str())
    }

    /// Set `key` to `value`.
    ///
    /// If a key differing only by case already exists its value is replaced
    /// and its original casing is kept.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.entries.entry(normalize(&key)) {
            Entry::Occupied(mut occupied) => occupied.get_mut().value = value,
            Entry::Vacant(vacant) => {
                vacant.insert(PropertyEntry { key, value });
            }
        }
    }

    /// Remove `key`, ignoring case, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(&normalize(key)).map(|entry| entry.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in arbitrary order, using the stored
    /// casing of each key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|entry| (entry.key.as_str(), entry.value.as_str()))
    }
}

fn normalize(key: &str) -> String {
    key.to_ascii_lowercase()
}

impl PartialEq for Properties {
    /// Two maps are equal when they hold the same values under the same keys,
    /// compared case-insensitively.
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(normalized, entry)| {
                other
                    .entries
                    .get(normalized)
                    .is_some_and(|theirs| theirs.value == entry.value)
            })
    }
}

impl Eq for Properties {}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Self::new();
        properties.extend(iter);
        properties
    }
}

impl<K, V> Extend<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
