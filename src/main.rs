//! # Reimbursement Finder CLI (`rfind`)
//!
//! ## Usage
//!
//! ```bash
//! rfind --config ./config/rfind.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rfind sources` | List discovered source files and whether they read |
//! | `rfind search "<query>"` | Search normalized records |
//! | `rfind stats` | Summarize what a load produced |
//! | `rfind export` | Write normalized records as JSON |
//! | `rfind quick` | List the quick-query directives |
//!
//! ## Examples
//!
//! ```bash
//! # Fuzzy name search
//! rfind search "knee replacment"
//!
//! # Comparison and keyword directives
//! rfind search "amount < 5000"
//! rfind search "authorization required" --mode exact
//!
//! # Machine-readable output
//! rfind search "sort:frequency" --limit 20 --json
//! ```

use clap::{Parser, Subcommand};
use reimbursement_finder::search::SearchArgs;
use reimbursement_finder::{config, export, search, sources, stats};
use reimbursement_finder_core::MatchMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Reimbursement Finder CLI: search hospital reimbursement tables with
/// inconsistent columns.
///
/// All commands except `quick` read a TOML configuration file. See
/// `config/rfind.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "rfind",
    about = "Reimbursement Finder: search hospital-procedure reimbursement records",
    version,
    long_about = "Reimbursement Finder loads every CSV/TSV export under a data directory, \
    maps their differing column names onto one schema, and answers free-text, fuzzy, \
    comparison, keyword, and sort queries over the merged records."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/rfind.toml`.
    #[arg(long, global = true, default_value = "./config/rfind.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// List discovered source files.
    ///
    /// Shows every file under `[data].root` that matches the include globs,
    /// with its row and column counts, or why it could not be read.
    Sources,

    /// Search normalized records.
    ///
    /// The query is one of: free text (`knee replacement`), an amount
    /// comparison (`amount < 5000`, `>12000`), a date directive
    /// (`valid_after 01/05/2024`), a keyword (`authorization required`),
    /// or a sort request (`sort:frequency`, `sort:amount`).
    Search {
        /// The search query string.
        query: String,

        /// Free-text matching: `exact` (substring) or `fuzzy` (similarity).
        /// Overrides `[search].mode`.
        #[arg(long)]
        mode: Option<MatchMode>,

        /// Minimum fuzzy score, 0-100. Overrides `[search].threshold`.
        #[arg(long)]
        threshold: Option<u8>,

        /// Maximum number of results to show. Overrides `[search].limit`.
        #[arg(long)]
        limit: Option<usize>,

        /// Print the outcome as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Summarize the loaded data.
    ///
    /// Record and code counts, amount range and coverage, and a
    /// per-source breakdown.
    Stats,

    /// Export normalized records as JSON.
    Export {
        /// Output file. Writes to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List the quick-query directives.
    Quick,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Quick = cli.command {
        init_logging("warn");
        search::list_quick_queries();
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    init_logging(&cfg.logging.level);

    match cli.command {
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Search {
            query,
            mode,
            threshold,
            limit,
            json,
        } => {
            let args = SearchArgs {
                mode,
                threshold,
                limit,
                json,
            };
            search::run_search(&cfg, &query, &args)?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref())?;
        }
        Commands::Quick => {
            // Handled above (before config loading)
        }
    }

    Ok(())
}
