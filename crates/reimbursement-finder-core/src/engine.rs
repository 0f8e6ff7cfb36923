//! Entry points: build a store from raw tables, run one query against it.
//!
//! Both operations are synchronous and never fail outright. Loading turns
//! every problem into a warning string; searching reports empty input and
//! an empty store through [`SearchStatus`] rather than an error.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::QueryError;
use crate::models::RawTable;
use crate::normalize::normalize_tables;
use crate::query::interpret;
use crate::search::{execute, SearchOptions, SearchResult};
use crate::searchable::attach_searchable_text;
use crate::store::{RecordStore, Store};

/// Canned queries offered as one-click shortcuts.
pub const QUICK_QUERIES: &[&str] = &[
    "amount < 5000",
    "authorization required",
    "valid_after 01/05/2024",
    "sort:frequency",
];

/// Result of [`load`].
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub store: RecordStore,
    pub record_count: usize,
    /// Human-readable, one per skipped source or lossy column.
    pub warnings: Vec<String>,
}

/// Why a search returned what it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Ok,
    EmptyStore,
    EmptyQuery,
}

/// Result of [`search`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    /// Qualifying records before `limit` truncation.
    pub total_match_count: usize,
    pub status: SearchStatus,
}

impl SearchOutcome {
    fn empty(status: SearchStatus) -> Self {
        Self {
            results: Vec::new(),
            total_match_count: 0,
            status,
        }
    }
}

/// Normalize raw tables into a fresh store.
///
/// The tables may arrive in any order; records are always ordered by
/// source label, then row.
pub fn load(tables: Vec<RawTable>) -> LoadOutcome {
    let sources = tables.len();
    let mut normalized = normalize_tables(&tables);
    attach_searchable_text(&mut normalized.records);

    let record_count = normalized.records.len();
    let warnings: Vec<String> = normalized.warnings.iter().map(ToString::to_string).collect();
    info!(
        sources,
        records = record_count,
        warnings = warnings.len(),
        "load complete"
    );

    LoadOutcome {
        store: RecordStore::new(normalized.records, normalized.schema),
        record_count,
        warnings,
    }
}

/// Interpret `query` and run it against `store`.
///
/// An empty query is reported before an empty store.
pub fn search<S: Store + ?Sized>(store: &S, query: &str, opts: &SearchOptions) -> SearchOutcome {
    let intent = match interpret(query) {
        Ok(intent) => intent,
        Err(QueryError::EmptyQuery) => return SearchOutcome::empty(SearchStatus::EmptyQuery),
    };
    if store.is_empty() {
        return SearchOutcome::empty(SearchStatus::EmptyStore);
    }

    let (results, total_match_count) = execute(store, &intent, opts);
    debug!(
        %intent,
        total = total_match_count,
        returned = results.len(),
        "search complete"
    );
    SearchOutcome {
        results,
        total_match_count,
        status: SearchStatus::Ok,
    }
}
