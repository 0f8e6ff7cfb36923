//! TOML configuration for `rfind`.
//!
//! ```toml
//! [data]
//! root = "./data"
//! include_globs = ["**/*.csv", "**/*.tsv"]
//!
//! [search]
//! mode = "fuzzy"
//! threshold = 60
//! limit = 10
//!
//! [logging]
//! level = "warn"
//! ```
//!
//! Only `[data].root` is required.

use anyhow::{Context, Result};
use reimbursement_finder_core::{MatchMode, SearchOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Field delimiter for every source. Sniffed per file when unset.
    #[serde(default)]
    pub delimiter: Option<char>,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.csv".to_string(), "**/*.tsv".to_string()]
}

impl DataConfig {
    /// The configured delimiter as a byte, if any. Validated ASCII by [`load_config`].
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter.and_then(|c| u8::try_from(c).ok())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default)]
    pub mode: MatchMode,
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_threshold() -> u8 {
    60
}
fn default_limit() -> usize {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: MatchMode::default(),
            threshold: default_threshold(),
            limit: default_limit(),
        }
    }
}

impl SearchConfig {
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            mode: self.mode,
            threshold: self.threshold,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

const LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if let Some(d) = config.data.delimiter {
        if !d.is_ascii() || d.is_ascii_alphanumeric() || d == '"' {
            anyhow::bail!(
                "data.delimiter must be a single ASCII punctuation or whitespace character, got {:?}",
                d
            );
        }
    }

    if config.data.include_globs.is_empty() {
        anyhow::bail!("data.include_globs must not be empty");
    }

    if config.search.threshold > 100 {
        anyhow::bail!("search.threshold must be in [0, 100]");
    }

    if config.search.limit < 1 {
        anyhow::bail!("search.limit must be >= 1");
    }

    let level = config.logging.level.to_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        anyhow::bail!(
            "Unknown logging level: '{}'. Must be one of {}.",
            config.logging.level,
            LEVELS.join(", ")
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(body: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rfind.toml");
        fs::write(&path, body).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let (_tmp, path) = write_config("[data]\nroot = \"./data\"\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.data.include_globs, vec!["**/*.csv", "**/*.tsv"]);
        assert_eq!(config.data.delimiter, None);
        assert_eq!(config.search.mode, MatchMode::Fuzzy);
        assert_eq!(config.search.threshold, 60);
        assert_eq!(config.search.limit, 10);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_search_section_parses() {
        let (_tmp, path) = write_config(
            "[data]\nroot = \"/srv/tariffs\"\ndelimiter = \";\"\n\n[search]\nmode = \"exact\"\nthreshold = 85\nlimit = 3\n",
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.data.delimiter_byte(), Some(b';'));
        let opts = config.search.options();
        assert_eq!(opts.mode, MatchMode::Exact);
        assert_eq!(opts.threshold, 85);
        assert_eq!(opts.limit, 3);
    }

    #[test]
    fn test_threshold_over_100_rejected() {
        let (_tmp, path) = write_config("[data]\nroot = \".\"\n[search]\nthreshold = 150\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("search.threshold"));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let (_tmp, path) = write_config("[data]\nroot = \".\"\n[search]\nlimit = 0\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_bad_delimiter_rejected() {
        let (_tmp, path) = write_config("[data]\nroot = \".\"\ndelimiter = \"a\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_unknown_level_rejected() {
        let (_tmp, path) = write_config("[data]\nroot = \".\"\n[logging]\nlevel = \"loud\"\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = load_config(Path::new("/nonexistent/rfind.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
