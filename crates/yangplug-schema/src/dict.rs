//! Context-scoped interned string store.
//!
//! Every canonical value string and every schema name lives here exactly once.
//! Readers that only need an entry which is already present take a shared lock,
//! inserts serialize on the write lock.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;

/// A string owned by a [`Dictionary`].
///
/// Cloning shares the entry. Two strings from the same dictionary are equal iff
/// they point at the same entry.
#[derive(Clone)]
pub struct DictStr(Arc<str>);

impl DictStr {
    /// Returns the string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if both handles share one dictionary entry.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Deref for DictStr {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DictStr {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DictStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq for DictStr {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || *self.0 == *other.0
    }
}

impl Eq for DictStr {}

impl PartialEq<str> for DictStr {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for DictStr {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Hash for DictStr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must agree with `str`'s hash for `Borrow<str>` lookups.
        (*self.0).hash(state)
    }
}

impl fmt::Debug for DictStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for DictStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deduplicating string table.
#[derive(Default)]
pub struct Dictionary {
    table: RwLock<HashSet<DictStr>>,
}

impl Dictionary {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `value`, inserting a copy if absent.
    pub fn insert(&self, value: &str) -> DictStr {
        if let Some(found) = self.table.read().get(value) {
            return found.clone();
        }
        let mut table = self.table.write();
        if let Some(found) = table.get(value) {
            return found.clone();
        }
        let entry = DictStr(Arc::from(value));
        table.insert(entry.clone());
        entry
    }

    /// Like [`Dictionary::insert`], but consumes a string the caller no longer needs.
    pub fn insert_owned(&self, value: String) -> DictStr {
        if let Some(found) = self.table.read().get(value.as_str()) {
            return found.clone();
        }
        let mut table = self.table.write();
        if let Some(found) = table.get(value.as_str()) {
            return found.clone();
        }
        let entry = DictStr(Arc::from(value));
        table.insert(entry.clone());
        entry
    }

    /// Gives back one handle. The entry leaves the table once the table holds
    /// the last reference.
    pub fn release(&self, value: DictStr) {
        let mut table = self.table.write();
        let last = match table.get(value.as_str()) {
            // One count for the table, one for `value`.
            Some(entry) => DictStr::ptr_eq(entry, &value) && Arc::strong_count(&value.0) == 2,
            None => false,
        };
        if last {
            table.remove(value.as_str());
        }
    }

    /// Drops every entry no handle outside the table refers to anymore.
    pub fn purge_unused(&self) -> usize {
        let mut table = self.table.write();
        let before = table.len();
        table.retain(|entry| Arc::strong_count(&entry.0) > 1);
        before - table.len()
    }

    /// Returns true if `value` is interned.
    pub fn contains(&self, value: &str) -> bool {
        self.table.read().contains(value)
    }

    /// Returns the number of distinct entries.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Returns true if nothing is interned.
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("entries", &self.len())
            .finish()
    }
}
