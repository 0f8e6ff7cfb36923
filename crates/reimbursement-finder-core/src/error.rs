use thiserror::Error;

/// Faults raised while turning raw tables into records.
///
/// None of these abort a load. They are collected as warnings on
/// [`LoadOutcome`](crate::engine::LoadOutcome) and ingestion continues
/// with the remaining sources.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("source '{source_label}' is unreadable: {reason}")]
    SourceUnreadable { source_label: String, reason: String },
    #[error("no sources found")]
    NoSourcesFound,
    #[error("source '{source_label}': {count} value(s) in column '{column}' could not be parsed")]
    UnparseableValues {
        source_label: String,
        column: String,
        count: usize,
    },
}

/// Query strings that cannot be turned into a [`QueryIntent`](crate::query::QueryIntent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query is empty")]
    EmptyQuery,
}
