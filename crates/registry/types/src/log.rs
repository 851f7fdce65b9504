//! Append-only log with a side existence set.
//!
//! Used for every growth-only enumeration in the registry (client lists,
//! validation lists, responder sets). Appends and membership checks are O(1);
//! entries keep their insertion index forever.

use std::collections::HashSet;
use std::hash::Hash;

#[derive(Clone, Debug)]
pub struct AppendLog<T: Eq + Hash> {
    entries: Vec<T>,
    present: HashSet<T>,
}

impl<T: Eq + Hash + Clone> AppendLog<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            present: HashSet::new(),
        }
    }

    /// Append `item` unless it is already present. Returns `true` if appended.
    pub fn insert(&mut self, item: T) -> bool {
        if self.present.contains(&item) {
            return false;
        }
        self.present.insert(item.clone());
        self.entries.push(item);
        true
    }

    pub fn contains(&self, item: &T) -> bool {
        self.present.contains(item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.entries.clone()
    }
}

impl<T: Eq + Hash + Clone> Default for AppendLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Eq + Hash + Clone> IntoIterator for &'a AppendLog<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
