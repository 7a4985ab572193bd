use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::naming::field_key;

/// Free-form test metadata keyed by normalized field name.
///
/// Keys go through [`field_key`] on the way in and on lookup, so callers
/// can query with whatever spelling their configuration uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any existing value for the same field.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let key = field_key(key);
        if !key.is_empty() {
            self.0.insert(key, value.into());
        }
    }

    /// Look up a field by any alias spelling.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&field_key(key)).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(&field_key(key))
    }

    /// Copy every field from `lower` that is not already present.
    pub fn fill_from(&mut self, lower: &Self) {
        for (key, value) in &lower.0 {
            self.0
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(&field_key(key))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut meta = Self::new();
        for (key, value) in iter {
            meta.insert(key.as_ref(), value);
        }
        meta
    }
}
