//! Load statistics.
//!
//! A quick summary of what a load produced: record counts, code and amount
//! coverage, and a per-source breakdown. Used by `rfind stats` to confirm a
//! data directory is being read the way you expect.

use anyhow::Result;
use chrono::NaiveDate;
use reimbursement_finder_core::{Record, Store};
use std::collections::{BTreeMap, HashSet};

use crate::config::Config;
use crate::ingest;
use crate::search::format_amount;

/// Summary of one store.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadStats {
    pub records: usize,
    pub unique_codes: usize,
    pub sources: usize,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub missing_amounts: usize,
    pub earliest_date: Option<NaiveDate>,
    pub latest_date: Option<NaiveDate>,
    /// Record count per source label, label order.
    pub by_source: Vec<(String, usize)>,
}

pub fn compute(records: &[Record]) -> LoadStats {
    let unique_codes = records
        .iter()
        .filter(|r| r.has_known_code())
        .map(|r| r.code.as_str())
        .collect::<HashSet<_>>()
        .len();

    let amounts: Vec<f64> = records.iter().filter_map(|r| r.amount).collect();
    let dates: Vec<NaiveDate> = records.iter().filter_map(|r| r.date).collect();

    let mut by_source: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records {
        *by_source.entry(r.source_label.as_str()).or_insert(0) += 1;
    }

    LoadStats {
        records: records.len(),
        unique_codes,
        sources: by_source.len(),
        min_amount: amounts.iter().copied().reduce(f64::min),
        max_amount: amounts.iter().copied().reduce(f64::max),
        missing_amounts: records.len() - amounts.len(),
        earliest_date: dates.iter().min().copied(),
        latest_date: dates.iter().max().copied(),
        by_source: by_source
            .into_iter()
            .map(|(label, n)| (label.to_string(), n))
            .collect(),
    }
}

/// Run the stats command: load the data root and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let loaded = ingest::load_from_config(config)?;
    let stats = compute(loaded.store.all());

    println!("Reimbursement Finder - Load Stats");
    println!("=================================");
    println!();
    println!("  Data root:   {}", config.data.root.display());
    println!(
        "  Files:       {} read / {} found",
        loaded.reports.iter().filter(|r| r.is_ok()).count(),
        loaded.reports.len()
    );
    println!();
    println!("  Procedures:  {}", stats.records);
    println!("  Codes:       {} unique", stats.unique_codes);
    println!("  Sources:     {}", stats.sources);
    println!(
        "  Amounts:     {} .. {} ({} missing)",
        format_amount(stats.min_amount),
        format_amount(stats.max_amount),
        stats.missing_amounts
    );
    if let (Some(first), Some(last)) = (stats.earliest_date, stats.latest_date) {
        println!("  Dates:       {} .. {}", first, last);
    }

    if !stats.by_source.is_empty() {
        println!();
        println!("  By source:");
        println!("  {:<40} {:>8}", "SOURCE", "RECORDS");
        println!("  {}", "-".repeat(49));
        for (label, count) in &stats.by_source {
            println!("  {:<40} {:>8}", label, count);
        }
    }

    if !loaded.warnings.is_empty() {
        println!();
        println!("  Warnings:");
        for w in &loaded.warnings {
            println!("    - {}", w);
        }
    }

    println!();
    Ok(())
}
