//! In-memory [`Store`] implementation and the swappable active-store handle.
//!
//! `RecordStore` is a plain `Vec` fixed at construction. `ActiveStore`
//! keeps an `Arc<RecordStore>` behind `std::sync::RwLock`; replacing it
//! only swaps the pointer, so a reader that already took a snapshot keeps
//! a complete, unchanged store.

use std::sync::{Arc, RwLock};

use crate::models::Record;

use super::Store;

/// The normalized, read-only records of one load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    records: Vec<Record>,
    schema: Vec<String>,
}

impl RecordStore {
    pub fn new(records: Vec<Record>, schema: Vec<String>) -> Self {
        Self { records, schema }
    }

    /// A store with no records, as before the first load.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl Store for RecordStore {
    fn all(&self) -> &[Record] {
        &self.records
    }

    fn schema(&self) -> &[String] {
        &self.schema
    }
}

/// The caller-owned reference to the store queries should currently use.
#[derive(Debug, Default)]
pub struct ActiveStore {
    current: RwLock<Arc<RecordStore>>,
}

impl ActiveStore {
    pub fn new(store: RecordStore) -> Self {
        Self {
            current: RwLock::new(Arc::new(store)),
        }
    }

    /// The store as of now. Later replacements do not affect it.
    pub fn snapshot(&self) -> Arc<RecordStore> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Swap in a fully built store, returning the one it replaces.
    pub fn replace(&self, store: RecordStore) -> Arc<RecordStore> {
        let next = Arc::new(store);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, next)
    }
}
