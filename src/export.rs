//! Export the normalized records as JSON.
//!
//! Produces one document with the unified schema and every record, in
//! store order, so downstream tools do not need to repeat normalization.

use anyhow::{Context, Result};
use reimbursement_finder_core::{Record, Store};
use serde::Serialize;
use std::path::Path;

use crate::config::Config;
use crate::ingest;

#[derive(Serialize)]
struct ExportData<'a> {
    schema: &'a [String],
    record_count: usize,
    records: &'a [Record],
}

pub fn render_export(store: &dyn Store) -> Result<String> {
    let data = ExportData {
        schema: store.schema(),
        record_count: store.count(),
        records: store.all(),
    };
    Ok(serde_json::to_string_pretty(&data)?)
}

/// Export records as JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let loaded = ingest::load_from_config(config)?;
    let json = render_export(loaded.store.as_ref())?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Exported {} records to {}",
                loaded.record_count,
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reimbursement_finder_core::{load, RawTable};

    #[test]
    fn test_export_shape() {
        let store = load(vec![RawTable::new("t.csv")
            .with_column("Procedure", ["Appendectomy"])
            .with_column("CPT", ["44950"])
            .with_column("Amount", ["N/A"])
            .with_column("Notes", ["Laparoscopic"])])
        .store;
        let value: serde_json::Value =
            serde_json::from_str(&render_export(&store).unwrap()).unwrap();
        assert_eq!(
            value["schema"],
            serde_json::json!(["procedure", "code", "amount", "Notes", "source_label"])
        );
        assert_eq!(value["record_count"], 1);
        let record = &value["records"][0];
        assert_eq!(record["code"], "44950");
        assert!(record["amount"].is_null());
        assert_eq!(record["extra"][0]["name"], "Notes");
        assert_eq!(record["extra"][0]["value"], "Laparoscopic");
    }
}
