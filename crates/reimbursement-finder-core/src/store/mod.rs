//! Record storage for one data load.
//!
//! The [`Store`] trait is everything the match engine needs from a
//! collection of records. [`RecordStore`] is the in-memory implementation
//! produced by [`load`](crate::engine::load); [`ActiveStore`] lets a caller
//! swap in a freshly built store without disturbing searches that still
//! hold the previous one.
//!
//! Stores are never mutated after construction.

pub mod memory;

pub use memory::{ActiveStore, RecordStore};

use crate::models::Record;

/// Read-only view of the records of one load.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`all`](Store::all) | Every record, in insertion order |
/// | [`count`](Store::count) | Number of records |
/// | [`get`](Store::get) | One record by position |
/// | [`schema`](Store::schema) | Unified column names across sources |
pub trait Store: Send + Sync {
    fn all(&self) -> &[Record];

    fn schema(&self) -> &[String];

    fn count(&self) -> usize {
        self.all().len()
    }

    fn get(&self, index: usize) -> Option<&Record> {
        self.all().get(index)
    }

    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}
