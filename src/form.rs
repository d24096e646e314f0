//! Ordered multi-valued key mapping used for query strings, form bodies,
//! path parameters, header and cookie lookups.
//!
//! Keys keep the order in which they were first seen and every key keeps all
//! of its values in arrival order. Composite addressing (`key[n]`, `key[]`,
//! `key.Field`) scans this order, which makes the placement of unindexed
//! array elements deterministic for a given input.

use crate::convert::{Cookie, UploadedFile};
use std::collections::HashMap;

/// Ordered `key -> [values]` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    entries: Vec<(String, Vec<String>)>,
    /// key -> position in `entries`
    index: HashMap<String, usize>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an `application/x-www-form-urlencoded` string (a query string or
    /// a url-encoded body).
    pub fn parse(input: &str) -> Self {
        Self::parse_bytes(input.as_bytes())
    }

    pub fn parse_bytes(input: &[u8]) -> Self {
        let mut values = Self::new();
        for (k, v) in url::form_urlencoded::parse(input) {
            values.append(k.into_owned(), v.into_owned());
        }
        values
    }

    /// Add one value under `key`, after any values already present.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1.push(value),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, vec![value]));
            }
        }
    }

    /// Append every entry of `other`, keeping this mapping's values first.
    pub fn extend_from(&mut self, other: &FormValues) {
        for (k, vals) in &other.entries {
            for v in vals {
                self.append(k.as_str(), v.as_str());
            }
        }
    }

    /// All values stored under `key`.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.index
            .get(key)
            .map(|&pos| self.entries[pos].1.as_slice())
    }

    /// First value stored under `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Entries in first-seen key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Approximate decoded size in bytes.
    pub fn byte_size(&self) -> usize {
        self.entries
            .iter()
            .map(|(k, vals)| k.len() + vals.iter().map(String::len).sum::<usize>())
            .sum()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FormValues::new();
        for (k, v) in iter {
            values.append(k, v);
        }
        values
    }
}

/// Read-only view the converters pull raw values from.
///
/// One source serves one binding step: the merged ad-hoc key set, or the
/// values of a single declared position in schema binding.
#[derive(Debug, Clone, Copy)]
pub struct KeySource<'a> {
    values: &'a FormValues,
    files: &'a [UploadedFile],
    cookies: &'a [Cookie],
    max_array_index: usize,
}

impl<'a> KeySource<'a> {
    pub fn new(values: &'a FormValues, max_array_index: usize) -> Self {
        Self {
            values,
            files: &[],
            cookies: &[],
            max_array_index,
        }
    }

    #[must_use]
    pub fn with_files(mut self, files: &'a [UploadedFile]) -> Self {
        self.files = files;
        self
    }

    #[must_use]
    pub fn with_cookies(mut self, cookies: &'a [Cookie]) -> Self {
        self.cookies = cookies;
        self
    }

    /// Largest explicit `key[n]` index a converter may honour
    pub fn max_array_index(&self) -> usize {
        self.max_array_index
    }

    /// All raw values of `key`, empty when absent.
    pub fn values(&self, key: &str) -> &'a [String] {
        self.values.get(key).unwrap_or(&[])
    }

    pub fn first_value(&self, key: &str) -> Option<&'a str> {
        self.values.first(key)
    }

    /// Entries in first-seen order.
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, &'a [String])> {
        self.values.iter()
    }

    /// Uploaded files submitted under `key`, in arrival order.
    pub fn files(&self, key: &str) -> Vec<&'a UploadedFile> {
        self.files.iter().filter(|f| f.field_name == key).collect()
    }

    pub fn cookie(&self, name: &str) -> Option<&'a Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    /// True when any key addresses a sub-value of `key` (`key.x`, `key[x]`).
    pub fn has_children(&self, key: &str) -> bool {
        self.entries().any(|(k, _)| is_child_key(k, key))
    }

    /// Of the candidate keys, the one whose first appearance (exactly or as
    /// the parent of a deeper key) comes earliest.
    pub fn first_present<'c>(&self, candidates: &[&'c str]) -> Option<&'c str> {
        for (k, _) in self.entries() {
            for &candidate in candidates {
                if k == candidate || is_child_key(k, candidate) {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

/// `key.x`, `key[x]` and deeper forms are children of `key`.
fn is_child_key(candidate: &str, parent: &str) -> bool {
    candidate
        .strip_prefix(parent)
        .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
}
