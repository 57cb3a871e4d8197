//! Insertion-ordered relative -> absolute entry mapping.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A resolved `(relative, absolute)` path pair.
///
/// `relative` is always `/`-separated and computed against the resolver's
/// base directory. `absolute` is lexically normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub relative: String,
    pub absolute: PathBuf,
}

/// Ordered mapping of relative keys to absolute paths.
///
/// Keys are write-once: inserting an existing key leaves the original value
/// in place. Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct EntryMap {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl EntryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, relative: &str) -> bool {
        self.index.contains_key(relative)
    }

    pub fn get(&self, relative: &str) -> Option<&Path> {
        self.index
            .get(relative)
            .map(|&i| self.entries[i].absolute.as_path())
    }

    /// Insert a new key. Returns `false` and leaves the map untouched if the
    /// key is already present.
    pub fn insert(&mut self, relative: impl Into<String>, absolute: impl Into<PathBuf>) -> bool {
        let relative = relative.into();
        if self.index.contains_key(&relative) {
            return false;
        }
        self.index.insert(relative.clone(), self.entries.len());
        self.entries.push(Entry {
            relative,
            absolute: absolute.into(),
        });
        true
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, relative: &str) -> Option<PathBuf> {
        let pos = self.index.remove(relative)?;
        let removed = self.entries.remove(pos);
        for entry in &self.entries[pos..] {
            if let Some(i) = self.index.get_mut(&entry.relative) {
                *i -= 1;
            }
        }
        Some(removed.absolute)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.relative.as_str())
    }

    /// Merge another map in; keys already present keep their first value.
    pub fn extend(&mut self, other: EntryMap) {
        for entry in other {
            self.insert(entry.relative, entry.absolute);
        }
    }
}

impl PartialEq for EntryMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for EntryMap {}

impl IntoIterator for EntryMap {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntryMap {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
