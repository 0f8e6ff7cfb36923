//! Load orchestration: filesystem scan, then normalization into a store.
//!
//! Every command that needs records goes through [`load_from_config`].
//! Warnings are logged where they arise, by the reader and the normalizer,
//! and are only collected here.

use anyhow::Result;
use reimbursement_finder_core::{load, LoadOutcome, RecordStore};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::connector_fs::{self, SourceReport};

/// A finished load together with what the reader saw.
pub struct Loaded {
    pub store: Arc<RecordStore>,
    pub record_count: usize,
    pub reports: Vec<SourceReport>,
    /// Reader warnings first, then normalizer warnings.
    pub warnings: Vec<String>,
}

/// Scan `[data].root` and build a fresh store from every readable source.
pub fn load_from_config(config: &Config) -> Result<Loaded> {
    let scan = connector_fs::scan_sources(config)?;
    let mut warnings: Vec<String> = scan.warnings.iter().map(ToString::to_string).collect();

    let LoadOutcome {
        store,
        record_count,
        warnings: load_warnings,
    } = load(scan.tables);
    warnings.extend(load_warnings);

    info!(
        root = %config.data.root.display(),
        sources = scan.reports.len(),
        records = record_count,
        "data loaded"
    );

    Ok(Loaded {
        store: Arc::new(store),
        record_count,
        reports: scan.reports,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reimbursement_finder_core::Store;
    use std::fs;
    use tempfile::TempDir;

    use crate::config::{DataConfig, LoggingConfig, SearchConfig};

    fn config_for(root: &std::path::Path) -> Config {
        Config {
            data: DataConfig {
                root: root.to_path_buf(),
                include_globs: vec!["**/*.csv".to_string()],
                exclude_globs: Vec::new(),
                follow_symlinks: false,
                delimiter: None,
            },
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_load_merges_sources() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("a.csv"),
            "Procedure,CPT,Price\nKnee Replacement,27447,\"12,500\"\n",
        )
        .unwrap();
        fs::write(
            tmp.path().join("b.csv"),
            "name;cpt_code;cost\nColonoscopy;45378;N/A\n",
        )
        .unwrap();

        let loaded = load_from_config(&config_for(tmp.path())).unwrap();
        assert_eq!(loaded.record_count, 2);
        assert_eq!(loaded.store.count(), 2);
        assert_eq!(loaded.store.all()[0].amount, Some(12500.0));
        assert_eq!(loaded.store.all()[1].code, "45378");
        assert_eq!(loaded.store.all()[1].amount, None);
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("b.csv"));
    }

    #[test]
    fn test_empty_root_loads_nothing() {
        let tmp = TempDir::new().unwrap();
        let loaded = load_from_config(&config_for(tmp.path())).unwrap();
        assert_eq!(loaded.record_count, 0);
        assert!(loaded.store.is_empty());
        assert_eq!(loaded.warnings, vec!["no sources found".to_string()]);
    }

    #[test]
    fn test_empty_file_is_reported_and_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("empty.csv"), "").unwrap();
        fs::write(tmp.path().join("ok.csv"), "Procedure\nBiopsy\n").unwrap();
        let loaded = load_from_config(&config_for(tmp.path())).unwrap();
        assert_eq!(loaded.record_count, 1);
        assert!(!loaded.reports[0].is_ok());
        assert!(loaded.reports[1].is_ok());
        assert!(loaded.warnings[0].contains("empty.csv"));
    }
}
