use std::fmt::Debug;
use std::hash::Hash;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// A row type that can live in a [`Table`].
pub trait Record: Clone + Send + Sync + 'static {
    type Key: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    fn key(&self) -> Self::Key;
}

/// Generic keyed table shared by every entity in the store.
///
/// Reads hand out clones so no shard lock outlives the call; that keeps
/// cross-table operations free of lock-order hazards.
pub struct Table<T: Record> {
    rows: DashMap<T::Key, T>,
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }
}

impl<T: Record> Table<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, row: T) {
        self.rows.insert(row.key(), row);
    }

    /// Inserts only when the key is free. Hands the row back otherwise.
    pub fn insert_new(&self, row: T) -> Result<(), T> {
        match self.rows.entry(row.key()) {
            Entry::Occupied(_) => Err(row),
            Entry::Vacant(slot) => {
                slot.insert(row);
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &T::Key) -> Option<T> {
        self.rows.get(key).map(|row| row.value().clone())
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.rows.contains_key(key)
    }

    /// Applies `f` to the row in place and returns its result.
    pub fn update<R>(&self, key: &T::Key, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.rows.get_mut(key).map(|mut row| f(row.value_mut()))
    }

    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows
            .iter()
            .filter(|entry| pred(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn all(&self) -> Vec<T> {
        self.rows.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn keys_where(&self, pred: impl Fn(&T) -> bool) -> Vec<T::Key> {
        self.rows
            .iter()
            .filter(|entry| pred(entry.value()))
            .map(|entry| *entry.key())
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&T) -> bool) -> usize {
        self.rows.iter().filter(|entry| pred(entry.value())).count()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
