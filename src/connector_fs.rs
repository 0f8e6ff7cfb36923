//! Filesystem source discovery and CSV reading.
//!
//! Walks `[data].root`, keeps files matching the include globs and not the
//! exclude globs, and turns each into a [`RawTable`] labelled with its path
//! relative to the root. Files are returned sorted by that label.
//!
//! Decoding tries UTF-8 first and falls back to Windows-1252, which is what
//! spreadsheet exports usually are when they are not UTF-8. The delimiter
//! comes from config, from a `.tsv` extension, or is sniffed.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use reimbursement_finder_core::error::IngestError;
use reimbursement_finder_core::{RawColumn, RawTable, Scalar};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::Config;

/// A discovered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to `[data].root`, `/`-separated. Used as `source_label`.
    pub label: String,
    pub path: PathBuf,
}

/// What reading one source produced.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub label: String,
    pub rows: usize,
    pub columns: usize,
    /// `None` when the file was read, otherwise why it was skipped.
    pub error: Option<String>,
}

impl SourceReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// All readable tables plus one report per discovered file.
#[derive(Debug, Default)]
pub struct Scan {
    pub tables: Vec<RawTable>,
    pub reports: Vec<SourceReport>,
    /// `SourceUnreadable` faults for files that were skipped.
    pub warnings: Vec<IngestError>,
}

pub fn discover_sources(config: &Config) -> Result<Vec<SourceFile>> {
    let data = &config.data;
    let root = &data.root;
    if !root.exists() {
        bail!("Data root does not exist: {}", root.display());
    }

    let include_set = build_globset(&data.include_globs)?;

    let mut default_excludes = vec!["**/.git/**".to_string()];
    default_excludes.extend(data.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(data.follow_symlinks);
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let label = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&label) {
            continue;
        }
        if !include_set.is_match(&label) {
            continue;
        }

        files.push(SourceFile {
            label,
            path: path.to_path_buf(),
        });
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.label.cmp(&b.label));
    debug!(root = %root.display(), files = files.len(), "discovered sources");

    Ok(files)
}

/// Discover and read every source. Unreadable files are reported, not fatal.
pub fn scan_sources(config: &Config) -> Result<Scan> {
    let mut scan = Scan::default();

    for file in discover_sources(config)? {
        let delimiter = config.data.delimiter_byte();
        match read_table(&file.path, &file.label, delimiter) {
            Ok(table) => {
                scan.reports.push(SourceReport {
                    label: file.label.clone(),
                    rows: table.row_count().unwrap_or(0),
                    columns: table.columns.len(),
                    error: None,
                });
                scan.tables.push(table);
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                warn!(source = %file.label, %reason, "skipping unreadable source");
                scan.reports.push(SourceReport {
                    label: file.label.clone(),
                    rows: 0,
                    columns: 0,
                    error: Some(reason.clone()),
                });
                scan.warnings.push(IngestError::SourceUnreadable {
                    source_label: file.label,
                    reason,
                });
            }
        }
    }

    Ok(scan)
}

/// Read one delimited file into a column-oriented table.
///
/// Short rows are padded with empty cells; cells past the header width
/// are ignored.
pub fn read_table(path: &Path, label: &str, delimiter: Option<u8>) -> Result<RawTable> {
    let content = read_file_as_utf8(path)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let delimiter = delimiter.unwrap_or_else(|| {
        let is_tsv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv"));
        if is_tsv {
            b'\t'
        } else {
            sniff_delimiter(content)
        }
    });

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .clone();
    if headers.is_empty() {
        bail!("no header row");
    }

    let mut columns: Vec<RawColumn> = headers
        .iter()
        .map(|name| RawColumn {
            name: name.trim().to_string(),
            values: Vec::new(),
        })
        .collect();

    for (line, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Malformed row {}", line + 2))?;
        for (i, column) in columns.iter_mut().enumerate() {
            column.values.push(record.get(i).map(parse_cell).unwrap_or(Scalar::Empty));
        }
    }

    Ok(RawTable {
        source_label: label.to_string(),
        columns,
    })
}

/// A trimmed cell, kept as written.
///
/// Numbers and dates are left to the normalizer, which types each column by
/// its role. Billing codes like `250.00` or long numeric ids keep their
/// exact digits.
pub fn parse_cell(raw: &str) -> Scalar {
    let s = raw.trim();
    if s.is_empty() {
        Scalar::Empty
    } else {
        Scalar::Text(s.to_string())
    }
}

/// Detect the most likely field delimiter from the first lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line.
/// The one with the most consistent multi-field count wins; comma otherwise.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0usize;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let target = match counts.first() {
            Some(&n) if n > 1 => n,
            _ => continue,
        };
        let consistent = counts.iter().filter(|&&c| c == target).count();
        let score = consistent * target;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read a file as UTF-8, falling back to Windows-1252.
fn read_file_as_utf8(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            debug!(path = %path.display(), "decoded as windows-1252");
            Ok(decoded.into_owned())
        }
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reimbursement_finder_core::{MatchMode, SearchOptions, Store};
    use std::fs;
    use tempfile::TempDir;

    use crate::config::{DataConfig, LoggingConfig, SearchConfig};

    fn config_for(root: &Path) -> Config {
        Config {
            data: DataConfig {
                root: root.to_path_buf(),
                include_globs: vec!["**/*.csv".to_string(), "**/*.tsv".to_string()],
                exclude_globs: vec!["archive/**".to_string()],
                follow_symlinks: false,
                delimiter: None,
            },
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_parse_cell_keeps_literal_text() {
        assert_eq!(parse_cell(""), Scalar::Empty);
        assert_eq!(parse_cell("   "), Scalar::Empty);
        assert_eq!(parse_cell(" 12500 "), Scalar::from("12500"));
        assert_eq!(parse_cell("250.00"), Scalar::from("250.00"));
        assert_eq!(parse_cell("00123"), Scalar::from("00123"));
        assert_eq!(parse_cell("01/05/2024"), Scalar::from("01/05/2024"));
    }

    #[test]
    fn test_numeric_looking_codes_survive_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("codes.csv");
        fs::write(
            &path,
            "Procedure,Code,Amount
Diabetes review,250.00,120
Big,12345678901234567891,5
",
        )
        .unwrap();
        let table = read_table(&path, "codes.csv", None).unwrap();
        let store = reimbursement_finder_core::load(vec![table]).store;
        let codes: Vec<&str> = store.all().iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["250.00", "12345678901234567891"]);
        assert_eq!(store.all()[0].amount, Some(120.0));

        let opts = SearchOptions {
            mode: MatchMode::Exact,
            ..SearchOptions::default()
        };
        let outcome = reimbursement_finder_core::search(&store, "250.00", &opts);
        assert_eq!(outcome.total_match_count, 1);
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3\n"), b';');
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter("a,b\n1,2\n"), b',');
        assert_eq!(sniff_delimiter("single\n"), b',');
    }

    #[test]
    fn test_read_table_pads_short_rows() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("t.csv");
        fs::write(
            &path,
            "Procedure,Code,Amount\nKnee Replacement,KR-101,12500\nBiopsy,BX-1\n",
        )
        .unwrap();
        let table = read_table(&path, "t.csv", None).unwrap();
        assert_eq!(table.row_count(), Some(2));
        assert_eq!(table.columns[2].values[1], Scalar::Empty);
    }

    #[test]
    fn test_read_table_windows_1252_fallback() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("latin.csv");
        let mut bytes = b"Procedure;Amount\nD".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"bridement;450\n");
        fs::write(&path, bytes).unwrap();
        let table = read_table(&path, "latin.csv", None).unwrap();
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[0].values[0], Scalar::from("Débridement"));
    }

    #[test]
    fn test_read_table_strips_bom() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bom.csv");
        fs::write(&path, "\u{feff}CPT,Price\n27447,12500\n").unwrap();
        let table = read_table(&path, "bom.csv", None).unwrap();
        assert_eq!(table.columns[0].name, "CPT");
    }

    #[test]
    fn test_discover_sorts_and_excludes() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("zurich")).unwrap();
        fs::create_dir_all(root.join("archive")).unwrap();
        fs::write(root.join("zurich/tariffs.csv"), "a,b\n1,2\n").unwrap();
        fs::write(root.join("basel.tsv"), "a\tb\n1\t2\n").unwrap();
        fs::write(root.join("archive/old.csv"), "a,b\n1,2\n").unwrap();
        fs::write(root.join("notes.txt"), "ignored").unwrap();

        let files = discover_sources(&config_for(root)).unwrap();
        let labels: Vec<&str> = files.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["basel.tsv", "zurich/tariffs.csv"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let config = config_for(&tmp.path().join("missing"));
        assert!(scan_sources(&config).is_err());
    }
}
