//! Ordered multimap used for headers, form bodies and query strings.
//!
//! # Design
//! Entries are kept as one flat `Vec<(String, String)>` in insertion order.
//! Duplicate keys are meaningful (repeated form fields, repeated headers), so
//! inserting never overwrites. Distinct keys are reported in order of first
//! occurrence and each key's values in the order they were added.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// How two keys are compared by the `*_matching` operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMatch {
    /// Byte-for-byte equality.
    #[default]
    Exact,
    /// ASCII case-insensitive equality, as HTTP header names allow.
    IgnoreAsciiCase,
}

impl KeyMatch {
    pub fn matches(self, a: &str, b: &str) -> bool {
        match self {
            KeyMatch::Exact => a == b,
            KeyMatch::IgnoreAsciiCase => a.eq_ignore_ascii_case(b),
        }
    }
}

/// An insertion-ordered mapping from a key to one or more values.
///
/// Equality compares the full entry sequence, so two maps with the same keys
/// and per-key values differ if their keys are interleaved differently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Multimap {
    entries: Vec<(String, String)>,
}

impl Multimap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `(key, value)` entries, counting every duplicate.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append one value for `key`, keeping any values already present.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Append every entry of `other` in its order.
    pub fn put_all(&mut self, other: &Multimap) {
        self.entries.extend(other.entries.iter().cloned());
    }

    /// Values stored for `key`, in insertion order.
    pub fn get(&self, key: &str) -> Vec<&str> {
        self.get_matching(key, KeyMatch::Exact)
    }

    pub fn get_matching(&self, key: &str, how: KeyMatch) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| how.matches(k, key))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn get_first(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Distinct keys in order of first occurrence.
    pub fn keys(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(|k| seen.insert(*k))
            .collect()
    }

    /// All entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Remove every entry for `key`, returning the removed values.
    pub fn remove_all(&mut self, key: &str) -> Vec<String> {
        self.remove_all_matching(key, KeyMatch::Exact)
    }

    pub fn remove_all_matching(&mut self, key: &str, how: KeyMatch) -> Vec<String> {
        let mut removed = Vec::new();
        self.entries.retain(|(k, v)| {
            if how.matches(k, key) {
                removed.push(v.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Replace all values for `key` with `values`.
    ///
    /// The new values take the position of the first removed entry so the
    /// relative order of the other keys is unchanged. An absent key is
    /// appended at the end.
    pub fn replace_values<I, V>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.replace_values_matching(key, values, KeyMatch::Exact);
    }

    pub fn replace_values_matching<I, V>(&mut self, key: &str, values: I, how: KeyMatch)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let at = self
            .entries
            .iter()
            .position(|(k, _)| how.matches(k, key))
            .unwrap_or(self.entries.len());
        self.remove_all_matching(key, how);
        let replacement: Vec<(String, String)> = values
            .into_iter()
            .map(|v| (key.to_string(), v.into()))
            .collect();
        self.entries.splice(at..at, replacement);
    }
}

impl<K, V> FromIterator<(K, V)> for Multimap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<K, V> Extend<(K, V)> for Multimap
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.entries
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}
