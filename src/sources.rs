//! The `rfind sources` command: one line per discovered file with its row
//! and column counts, or why it could not be read.

use anyhow::Result;

use crate::config::Config;
use crate::connector_fs;

pub fn list_sources(config: &Config) -> Result<()> {
    let scan = connector_fs::scan_sources(config)?;

    if scan.reports.is_empty() {
        println!(
            "No sources found under {} (include: {})",
            config.data.root.display(),
            config.data.include_globs.join(", ")
        );
        return Ok(());
    }

    println!("{:<40} {:>6} {:>8}  STATUS", "SOURCE", "ROWS", "COLUMNS");
    for report in &scan.reports {
        let status = match &report.error {
            None => "OK".to_string(),
            Some(reason) => format!("UNREADABLE ({})", reason),
        };
        println!(
            "{:<40} {:>6} {:>8}  {}",
            report.label, report.rows, report.columns, status
        );
    }

    Ok(())
}
