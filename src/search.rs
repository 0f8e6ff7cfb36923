//! The `rfind search` and `rfind quick` commands.
//!
//! Results print as a fixed-width table:
//!
//! ```text
//! PROCEDURE                        CODE               AMOUNT  SOURCE                    SCORE
//! Knee Replacement                 27447            12500.00  inpatient.csv            100.0
//!
//! Showing 1 of 1 matches
//! ```
//!
//! With `--json` the same outcome is written as one JSON object, records
//! inlined.

use anyhow::{bail, Result};
use reimbursement_finder_core::{
    search, MatchMode, Record, SearchOutcome, SearchStatus, Store, QUICK_QUERIES,
};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::Config;
use crate::ingest;

/// Command-line overrides for the `[search]` config section.
#[derive(Debug, Default, Clone)]
pub struct SearchArgs {
    pub mode: Option<MatchMode>,
    pub threshold: Option<u8>,
    pub limit: Option<usize>,
    pub json: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    query: &'a str,
    status: SearchStatus,
    total_match_count: usize,
    results: Vec<JsonHit<'a>>,
}

#[derive(Serialize)]
struct JsonHit<'a> {
    match_score: f64,
    matched_fields: &'a BTreeSet<String>,
    record: &'a Record,
}

const NO_DATA: &str = "No data loaded. Check [data].root in the config.";
const NO_QUERY: &str = "Enter a search term.";

pub fn run_search(config: &Config, query: &str, args: &SearchArgs) -> Result<()> {
    let mut opts = config.search.options();
    if let Some(mode) = args.mode {
        opts.mode = mode;
    }
    if let Some(threshold) = args.threshold {
        if threshold > 100 {
            bail!("--threshold must be in [0, 100]");
        }
        opts.threshold = threshold;
    }
    if let Some(limit) = args.limit {
        if limit < 1 {
            bail!("--limit must be >= 1");
        }
        opts.limit = limit;
    }

    let loaded = ingest::load_from_config(config)?;
    let store = loaded.store.as_ref();
    let outcome = search(store, query, &opts);

    if args.json {
        println!("{}", render_json(store, query, &outcome)?);
    } else {
        print!("{}", render_table(store, &outcome));
    }
    Ok(())
}

fn render_json(store: &dyn Store, query: &str, outcome: &SearchOutcome) -> Result<String> {
    let results = outcome
        .results
        .iter()
        .filter_map(|r| {
            store.get(r.record_index).map(|record| JsonHit {
                match_score: r.match_score,
                matched_fields: &r.matched_fields,
                record,
            })
        })
        .collect();
    let report = JsonReport {
        query,
        status: outcome.status,
        total_match_count: outcome.total_match_count,
        results,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Render a human-readable result table, or the status message.
pub fn render_table(store: &dyn Store, outcome: &SearchOutcome) -> String {
    match outcome.status {
        SearchStatus::EmptyStore => return format!("{}\n", NO_DATA),
        SearchStatus::EmptyQuery => return format!("{}\n", NO_QUERY),
        SearchStatus::Ok => {}
    }
    if outcome.results.is_empty() {
        return "No results.\n".to_string();
    }

    let mut out = format!(
        "{:<32} {:<12} {:>12}  {:<24} {:>6}\n",
        "PROCEDURE", "CODE", "AMOUNT", "SOURCE", "SCORE"
    );
    for result in &outcome.results {
        let Some(record) = store.get(result.record_index) else {
            continue;
        };
        out.push_str(&format!(
            "{:<32} {:<12} {:>12}  {:<24} {:>6.1}\n",
            fit(&record.procedure, 32),
            fit(&record.code, 12),
            format_amount(record.amount),
            fit(&record.source_label, 24),
            result.match_score
        ));
    }
    out.push_str(&format!(
        "\nShowing {} of {} matches\n",
        outcome.results.len(),
        outcome.total_match_count
    ));
    out
}

/// Truncate to `width` characters, marking the cut with `~`.
fn fit(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

pub fn format_amount(amount: Option<f64>) -> String {
    match amount {
        Some(n) => format!("{:.2}", n),
        None => "-".to_string(),
    }
}

/// Print the canned quick-query directives.
pub fn list_quick_queries() {
    println!("Quick queries (pass one to `rfind search`):");
    for (i, query) in QUICK_QUERIES.iter().enumerate() {
        println!("  {}. {}", i + 1, query);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reimbursement_finder_core::{load, RawTable, RecordStore, SearchOptions};

    fn store() -> RecordStore {
        load(vec![RawTable::new("inpatient.csv")
            .with_column("Procedure", ["Knee Replacement", "Total Hip Arthroplasty with Revision"])
            .with_column("Code", ["27447", "27134"])
            .with_column("Amount", [Some(12500.0), None])])
        .store
    }

    #[test]
    fn test_table_lists_matches_and_summary() {
        let store = store();
        let outcome = search(&store, "27", &SearchOptions::default());
        let table = render_table(&store, &outcome);
        assert!(table.starts_with("PROCEDURE"));
        assert!(table.contains("Knee Replacement"));
        assert!(table.contains("12500.00"));
        assert!(table.contains("Total Hip Arthroplasty with Rev~"));
        assert!(table.contains("Showing 2 of 2 matches"));
    }

    #[test]
    fn test_status_messages_are_distinct() {
        let store = store();
        let opts = SearchOptions::default();
        let empty = RecordStore::empty();
        assert_eq!(render_table(&empty, &search(&empty, "knee", &opts)), format!("{}\n", NO_DATA));
        assert_eq!(render_table(&store, &search(&store, " ", &opts)), format!("{}\n", NO_QUERY));
        let none = search(
            &store,
            "dialysis",
            &SearchOptions {
                mode: MatchMode::Exact,
                ..opts
            },
        );
        assert_eq!(render_table(&store, &none), "No results.\n");
    }

    #[test]
    fn test_json_inlines_records() {
        let store = store();
        let outcome = search(&store, "amount > 100", &SearchOptions::default());
        let json = render_json(&store, "amount > 100", &outcome).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["total_match_count"], 1);
        assert_eq!(value["results"][0]["record"]["code"], "27447");
        assert_eq!(value["results"][0]["matched_fields"][0], "amount");
    }

    #[test]
    fn test_fit_and_amount() {
        assert_eq!(fit("short", 10), "short");
        assert_eq!(fit("abcdefghij", 5), "abcd~");
        assert_eq!(format_amount(None), "-");
        assert_eq!(format_amount(Some(3200.0)), "3200.00");
    }
}
