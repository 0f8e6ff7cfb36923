//! # Reimbursement Finder Core
//!
//! The record normalization and fuzzy query engine behind Reimbursement
//! Finder: data models, schema normalization, searchable-text building,
//! the in-memory record store, the query interpreter, and the match engine.
//!
//! This crate performs no filesystem I/O. Callers hand it raw tables
//! (whatever parsed the source files) and get back a [`store::RecordStore`]
//! they own and pass into [`engine::search`].
//!
//! ```text
//! raw tables ─▶ normalize ─▶ searchable ─▶ RecordStore ◀─ search ◀─ query ◀─ "amount < 5000"
//! ```

pub mod engine;
pub mod error;
pub mod fuzz;
pub mod models;
pub mod normalize;
pub mod query;
pub mod search;
pub mod searchable;
pub mod store;

pub use engine::{load, search, LoadOutcome, SearchOutcome, SearchStatus, QUICK_QUERIES};
pub use models::{RawColumn, RawTable, Record, Scalar};
pub use search::{MatchMode, SearchOptions, SearchResult};
pub use store::{ActiveStore, RecordStore, Store};
