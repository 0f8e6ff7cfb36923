//! Match engine: executes a [`QueryIntent`] against a [`Store`].
//!
//! # Scoring
//!
//! | Intent | Qualifies when | Score |
//! |--------|----------------|-------|
//! | Free text, exact | a textual field contains the term (case-insensitive) | 100 |
//! | Free text, fuzzy | best per-field [`partial_ratio`] ≥ threshold | best per-field score |
//! | Comparison | the field is present and the predicate holds | 100 |
//! | Keyword | the derived attribute holds | 100 |
//! | Sort | always | 100, ordered by the sort key |
//!
//! Results are ordered by descending score; ties keep store order. The
//! total is counted before the limit is applied.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::fuzz::partial_ratio;
use crate::models::{CanonicalField, FieldValue, Record};
use crate::query::{CompareField, CompareOp, CompareValue, KeywordTag, QueryIntent, SortKey};
use crate::store::Store;

pub const PERFECT_SCORE: f64 = 100.0;

/// Free-text matching policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Exact,
    #[default]
    Fuzzy,
}

impl std::str::FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(MatchMode::Exact),
            "fuzzy" => Ok(MatchMode::Fuzzy),
            other => Err(format!(
                "Unknown match mode: '{}'. Use exact or fuzzy.",
                other
            )),
        }
    }
}

/// Tuning for a single search call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub mode: MatchMode,
    /// Minimum fuzzy score in `[0, 100]`. Ignored in exact mode.
    pub threshold: u8,
    /// Maximum number of results returned.
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            mode: MatchMode::Fuzzy,
            threshold: 60,
            limit: 10,
        }
    }
}

/// One qualifying record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Position of the record in [`Store::all`].
    pub record_index: usize,
    /// Relevance in `[0.0, 100.0]`.
    pub match_score: f64,
    /// Names of the fields that produced the match.
    pub matched_fields: BTreeSet<String>,
}

impl SearchResult {
    fn perfect(record_index: usize, fields: impl IntoIterator<Item = String>) -> Self {
        Self {
            record_index,
            match_score: PERFECT_SCORE,
            matched_fields: fields.into_iter().collect(),
        }
    }
}

/// Run an intent against a store, returning ranked results and the
/// number of qualifying records before `limit` truncation.
pub fn execute<S: Store + ?Sized>(
    store: &S,
    intent: &QueryIntent,
    opts: &SearchOptions,
) -> (Vec<SearchResult>, usize) {
    let records = store.all();

    let mut results: Vec<SearchResult> = match intent {
        QueryIntent::FreeText(term) => match opts.mode {
            MatchMode::Exact => exact_matches(records, term),
            MatchMode::Fuzzy => fuzzy_matches(records, term, opts.threshold.min(100)),
        },
        QueryIntent::Comparison { field, op, value } => records
            .iter()
            .enumerate()
            .filter(|(_, r)| comparison_holds(r, *field, *op, *value))
            .map(|(i, _)| {
                let name = match field {
                    CompareField::Amount => CanonicalField::Amount,
                    CompareField::Date => CanonicalField::Date,
                };
                SearchResult::perfect(i, [name.as_str().to_string()])
            })
            .collect(),
        QueryIntent::Keyword(tag) => records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| {
                let fields = keyword_fields(r, *tag);
                (!fields.is_empty()).then(|| SearchResult::perfect(i, fields))
            })
            .collect(),
        QueryIntent::Sort(key) => sorted_all(records, *key),
    };

    if !matches!(intent, QueryIntent::Sort(_)) {
        // Stable: equal scores keep store order.
        results.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(Ordering::Equal)
        });
    }

    let total = results.len();
    results.truncate(opts.limit);
    (results, total)
}

fn exact_matches(records: &[Record], term: &str) -> Vec<SearchResult> {
    let needle = term.to_lowercase();
    records
        .iter()
        .enumerate()
        .filter_map(|(i, record)| {
            let fields: Vec<String> = record
                .text_fields()
                .into_iter()
                .filter(|(_, value)| value.to_lowercase().contains(&needle))
                .map(|(name, _)| name.to_string())
                .collect();
            (!fields.is_empty()).then(|| SearchResult::perfect(i, fields))
        })
        .collect()
}

fn fuzzy_matches(records: &[Record], term: &str, threshold: u8) -> Vec<SearchResult> {
    let threshold = f64::from(threshold);
    records
        .iter()
        .enumerate()
        .filter_map(|(i, record)| {
            let scored: Vec<(&str, f64)> = record
                .text_fields()
                .into_iter()
                .map(|(name, value)| (name, partial_ratio(term, value)))
                .collect();
            let best = scored.iter().map(|(_, s)| *s).fold(0.0f64, f64::max);
            if best < threshold {
                return None;
            }
            Some(SearchResult {
                record_index: i,
                match_score: best,
                matched_fields: scored
                    .into_iter()
                    .filter(|(_, s)| *s >= threshold)
                    .map(|(name, _)| name.to_string())
                    .collect(),
            })
        })
        .collect()
}

fn comparison_holds(
    record: &Record,
    field: CompareField,
    op: CompareOp,
    value: CompareValue,
) -> bool {
    match (field, value) {
        (CompareField::Amount, CompareValue::Number(rhs)) => {
            record.amount.is_some_and(|lhs| op.holds(lhs, rhs))
        }
        (CompareField::Date, CompareValue::Date(rhs)) => {
            record.date.is_some_and(|lhs| op.holds(lhs, rhs))
        }
        _ => false,
    }
}

const TRUTHY: &[&str] = &["yes", "y", "true", "required", "x", "1", "ja", "oui"];

const NEGATIONS: &[&str] = &["no authori", "not required", "without authori", "not needed"];

fn is_truthy(value: &FieldValue) -> bool {
    match value {
        FieldValue::Text(s) => TRUTHY.contains(&s.trim().to_lowercase().as_str()),
        FieldValue::Number(n) => n.is_some_and(|n| n != 0.0),
        FieldValue::Date(_) => false,
    }
}

/// Fields supporting the derived attribute `tag`; empty when it does not hold.
fn keyword_fields(record: &Record, tag: KeywordTag) -> Vec<String> {
    match tag {
        KeywordTag::RequiresAuthorization => {
            let mut fields: Vec<String> = record
                .extra
                .iter()
                .filter(|f| {
                    let name = f.name.to_lowercase();
                    name.contains("authori") && is_truthy(&f.value)
                })
                .map(|f| f.name.clone())
                .collect();
            fields.extend(
                record
                    .text_fields()
                    .into_iter()
                    .filter(|(_, value)| {
                        let text = value.to_lowercase();
                        text.contains("authori") && !NEGATIONS.iter().any(|n| text.contains(n))
                    })
                    .map(|(name, _)| name.to_string()),
            );
            fields
        }
        KeywordTag::RequiresDocumentation => record
            .extra
            .iter()
            .filter(|f| f.name.to_lowercase().contains("documentation") && !f.value.is_empty())
            .map(|f| f.name.clone())
            .collect(),
    }
}

/// Every record, ordered by `key` descending; ties keep store order.
fn sorted_all(records: &[Record], key: SortKey) -> Vec<SearchResult> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    let field = match key {
        SortKey::Frequency => {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for r in records.iter().filter(|r| r.has_known_code()) {
                *counts.entry(r.code.as_str()).or_insert(0) += 1;
            }
            let frequency = |r: &Record| counts.get(r.code.as_str()).copied().unwrap_or(0);
            order.sort_by(|&a, &b| frequency(&records[b]).cmp(&frequency(&records[a])));
            CanonicalField::Code
        }
        SortKey::Amount => {
            order.sort_by(|&a, &b| match (records[a].amount, records[b].amount) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
            CanonicalField::Amount
        }
    };
    order
        .into_iter()
        .map(|i| SearchResult::perfect(i, [field.as_str().to_string()]))
        .collect()
}
