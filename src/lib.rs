//! # Reimbursement Finder
//!
//! Find hospital-procedure reimbursement records by name, billing code,
//! amount, or attribute across a directory of CSV exports whose column
//! names and formats do not agree.
//!
//! The normalization and query engine lives in
//! [`reimbursement_finder_core`]. This crate is the thin layer around it:
//! configuration, source discovery and CSV reading, and the `rfind` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌─────────────┐
//! │ data root   │──▶│ connector_fs │──▶│ core::load  │
//! │ *.csv *.tsv │   │ RawTable[]   │   │ RecordStore │
//! └─────────────┘   └──────────────┘   └──────┬──────┘
//!                                             │
//!                                             ▼
//!                                     ┌──────────────┐
//!                                     │ core::search │◀── "amount < 5000"
//!                                     └──────┬───────┘
//!                                            ▼
//!                                     ┌──────────────┐
//!                                     │ rfind output │
//!                                     └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`connector_fs`] | Source discovery and CSV reading |
//! | [`ingest`] | Scan plus load into a store |
//! | [`search`] | `rfind search` / `rfind quick` output |
//! | [`stats`] | Load summary |
//! | [`sources`] | Source listing |
//! | [`export`] | JSON export |

pub mod config;
pub mod connector_fs;
pub mod export;
pub mod ingest;
pub mod search;
pub mod sources;
pub mod stats;
